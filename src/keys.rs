// 🔑 Upstream field names
// TIPS uses flat upper-kebab names ("PROPERTY-INFO", "S-PRINCIPAL-BAL-YEAR-01").
// Everything that builds or rewrites those names lives here.

use serde_json::{Map, Value};

/// Number of per-year slots the TIPS record can carry
pub const MAX_YEAR_SLOTS: u32 = 40;

// ============================================================================
// KEY BUILDER
// ============================================================================

/// Fields inside a `TAX-YEAR{i}-BR` block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearField {
    Suffix,
    Principal,
    Interest,
    Penalty,
    Other,
    Total,
    LienNumber,
    Attorney,
    CaseStatus,
}

impl YearField {
    /// Upstream prefix; the padded slot index is appended to it
    pub fn prefix(&self) -> &'static str {
        match self {
            YearField::Suffix => "S-TAX-YEAR-YEAR",
            YearField::Principal => "S-PRINCIPAL-BAL-YEAR",
            YearField::Interest => "S-INTEREST-BAL-YEAR",
            YearField::Penalty => "S-PENALTY-BAL-YEAR",
            YearField::Other => "S-OTHER-CHG-BAL-YEAR",
            YearField::Total => "S-TOTAL-BALANCE-YEAR",
            YearField::LienNumber => "LIEN-NUMBER-YEAR",
            YearField::Attorney => "ATTORNEY-YEAR",
            YearField::CaseStatus => "CASE-STATUS-YEAR",
        }
    }
}

/// Block key for slot `index`, e.g. `TAX-YEAR7-BR` (unpadded)
pub fn year_block_key(index: u32) -> String {
    format!("TAX-YEAR{}-BR", index)
}

/// Field key for slot `index`, e.g. `S-PRINCIPAL-BAL-YEAR-07` (two-digit pad)
pub fn year_field_key(field: YearField, index: u32) -> String {
    format!("{}-{:02}", field.prefix(), index)
}

// ============================================================================
// CASE CONVERSION
// ============================================================================

/// `PROPERTY-ADDRESS-LINE` → `propertyAddressLine`
///
/// The whole name is lower-cased and split on `-`. The first segment is kept
/// as-is and every later segment is title-cased: each letter that follows a
/// non-letter is upper-cased, so `LINE2A` becomes `Line2A`.
pub fn to_camel_case(upper_kebab: &str) -> String {
    let lowered = upper_kebab.to_lowercase();
    let mut segments = lowered.split('-');

    let mut out = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        out.push_str(&title_case(segment));
    }
    out
}

fn title_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut prev_is_letter = false;

    for c in segment.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Camel-case every key of a JSON object, descending into nested objects and arrays
pub fn camel_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(camel_case_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(camel_case_keys).collect()),
        other => other,
    }
}

/// Same as [`camel_case_keys`] for a bare map
pub fn camel_case_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(k, v)| (to_camel_case(&k), camel_case_keys(v)))
        .collect()
}
