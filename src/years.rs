// 📅 Per-year balances
// Walks the TAX-YEAR{i}-BR blocks and builds one YearBalance per tax year.

use crate::error::NormalizeError;
use crate::keys::{year_block_key, year_field_key, YearField, MAX_YEAR_SLOTS};
use crate::xml::{RawRecord, RawValue};
use serde::Serialize;
use thiserror::Error;

/// TIPS files miscellaneous charges under this year; it is never a stop marker
pub const MISC_PLACEHOLDER_YEAR: i32 = 2034;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearBalance {
    pub year: i32,
    pub principal: f64,
    pub interest: f64,
    pub penalty: f64,
    pub other: f64,
    pub total: f64,
    pub lien_num: Option<String>,
    pub solicitor: Option<String>,
    pub status: Option<String>,
}

// ============================================================================
// YEAR INFERENCE
// ============================================================================

/// Year suffix that is neither blank nor two ASCII digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not a two-digit year suffix")]
pub struct InvalidSuffix;

/// Full year from a two-digit suffix: below 50 is 20xx, otherwise 19xx.
///
/// Returns `Ok(None)` for a blank suffix and an error for anything that is
/// not exactly two ASCII digits. Suffixes are ambiguous past 2049; "50" reads
/// as 1950.
pub fn infer_full_year(suffix: &str) -> Result<Option<i32>, InvalidSuffix> {
    let suffix = suffix.trim();
    if suffix.is_empty() {
        return Ok(None);
    }

    let n = match suffix.as_bytes() {
        [tens @ b'0'..=b'9', ones @ b'0'..=b'9'] => i32::from(tens - b'0') * 10 + i32::from(ones - b'0'),
        _ => return Err(InvalidSuffix),
    };
    Ok(Some(if n < 50 { 2000 + n } else { 1900 + n }))
}

/// Upstream starts publishing next year's bill on Dec. 1, so current + 1 is allowed
pub fn is_beyond_horizon(year: i32, current_year: i32) -> bool {
    year > current_year + 1 && year != MISC_PLACEHOLDER_YEAR
}

// ============================================================================
// BLOCK WALK
// ============================================================================

/// Collect year balances from the `Output` record, in slot order.
///
/// Stops at the first slot that is missing, has a blank year suffix, or whose
/// year lies past `current_year + 1`.
pub fn collect_years(output: &RawRecord, current_year: i32) -> Result<Vec<YearBalance>, NormalizeError> {
    let mut years = Vec::new();

    for index in 1..=MAX_YEAR_SLOTS {
        let block_key = year_block_key(index);
        let block = match output.get(&block_key) {
            None | Some(RawValue::Null) => break,
            Some(RawValue::Node(block)) => block,
            Some(_) => return Err(NormalizeError::UnexpectedShape(block_key)),
        };

        let suffix_key = year_field_key(YearField::Suffix, index);
        let suffix = optional_text(block, &suffix_key)?.unwrap_or_default();
        let year = infer_full_year(suffix).map_err(|_| NormalizeError::InvalidYearSuffix {
            field: suffix_key.clone(),
            value: suffix.to_string(),
        })?;

        let year = match year {
            Some(year) if !is_beyond_horizon(year, current_year) => year,
            _ => break,
        };

        years.push(read_balance(block, index, year)?);
    }

    Ok(years)
}

fn read_balance(block: &RawRecord, index: u32, year: i32) -> Result<YearBalance, NormalizeError> {
    Ok(YearBalance {
        year,
        principal: amount(block, YearField::Principal, index)?,
        interest: amount(block, YearField::Interest, index)?,
        penalty: amount(block, YearField::Penalty, index)?,
        other: amount(block, YearField::Other, index)?,
        total: amount(block, YearField::Total, index)?,
        lien_num: owned_text(block, YearField::LienNumber, index)?,
        solicitor: owned_text(block, YearField::Attorney, index)?,
        status: owned_text(block, YearField::CaseStatus, index)?,
    })
}

fn amount(block: &RawRecord, field: YearField, index: u32) -> Result<f64, NormalizeError> {
    let key = year_field_key(field, index);
    let raw = optional_text(block, &key)?.ok_or_else(|| NormalizeError::MissingField(key.clone()))?;

    raw.trim().parse::<f64>().map_err(|_| NormalizeError::InvalidNumber {
        field: key,
        value: raw.to_string(),
    })
}

fn owned_text(block: &RawRecord, field: YearField, index: u32) -> Result<Option<String>, NormalizeError> {
    let key = year_field_key(field, index);
    if block.get(&key).is_none() {
        return Err(NormalizeError::MissingField(key));
    }
    Ok(optional_text(block, &key)?.map(str::to_string))
}

/// Text of a leaf field; `None` when the field is absent or empty
fn optional_text<'a>(record: &'a RawRecord, key: &str) -> Result<Option<&'a str>, NormalizeError> {
    match record.get(key) {
        None | Some(RawValue::Null) => Ok(None),
        Some(RawValue::Text(s)) => Ok(Some(s)),
        Some(_) => Err(NormalizeError::UnexpectedShape(key.to_string())),
    }
}
