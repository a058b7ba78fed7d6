// 🧹 Response Normalizer
// Reshapes the decoded TIPS document into the AccountResult contract.

use crate::error::NormalizeError;
use crate::keys::camel_case_map;
use crate::xml::{RawRecord, RawValue};
use crate::years::{collect_years, YearBalance};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

/// Date format used by every TIPS date field
pub const TIPS_DATE_FORMAT: &str = "%m/%d/%Y";

// ============================================================================
// CORE TYPES
// ============================================================================

/// Property metadata from `PROPERTY-INFO`.
///
/// `address` and `penaltyCalcDate` are typed; every other upstream field is
/// carried through with camel-cased keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    pub address: Value,
    pub penalty_calc_date: NaiveDate,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResult {
    pub account_num: String,
    pub property: PropertyInfo,
    pub last_payment_posted_date: NaiveDate,
    pub years: Vec<YearBalance>,
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Normalize a decoded TIPS document (the record holding `Output`)
pub fn normalize(document: &RawRecord, current_year: i32) -> Result<AccountResult, NormalizeError> {
    let output = node(document, "Output")?;

    let property = property_info(node(output, "PROPERTY-INFO")?)?;
    let years = collect_years(output, current_year)?;
    let last_payment_posted_date = parse_tips_date(
        "PAYMENTS-POSTED-THRU",
        required_text(output, "PAYMENTS-POSTED-THRU")?,
    )?;

    Ok(AccountResult {
        account_num: required_text(output, "BRT-NO")?.to_string(),
        property,
        last_payment_posted_date,
        years,
    })
}

fn property_info(raw: &RawRecord) -> Result<PropertyInfo, NormalizeError> {
    let mut fields = camel_case_map(raw.to_json_map());

    let address = fields
        .remove("propertyAddress")
        .ok_or_else(|| NormalizeError::MissingField("PROPERTY-INFO/PROPERTY-ADDRESS".to_string()))?;

    let penalty_calc_date = match fields.remove("penaltyCalcDate") {
        Some(Value::String(s)) => parse_tips_date("PROPERTY-INFO/PENALTY-CALC-DATE", &s)?,
        Some(Value::Null) | None => {
            return Err(NormalizeError::MissingField("PROPERTY-INFO/PENALTY-CALC-DATE".to_string()))
        }
        Some(_) => {
            return Err(NormalizeError::UnexpectedShape("PROPERTY-INFO/PENALTY-CALC-DATE".to_string()))
        }
    };

    // typed fields win over pass-through keys that camel-case to the same name
    fields.remove("address");

    Ok(PropertyInfo {
        address,
        penalty_calc_date,
        extra: fields,
    })
}

/// Parse a `MM/DD/YYYY` string; `field` names the upstream source for errors
pub fn parse_tips_date(field: &str, value: &str) -> Result<NaiveDate, NormalizeError> {
    NaiveDate::parse_from_str(value.trim(), TIPS_DATE_FORMAT).map_err(|_| NormalizeError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn node<'a>(record: &'a RawRecord, key: &str) -> Result<&'a RawRecord, NormalizeError> {
    match record.get(key) {
        Some(RawValue::Node(inner)) => Ok(inner),
        None | Some(RawValue::Null) => Err(NormalizeError::MissingField(key.to_string())),
        Some(_) => Err(NormalizeError::UnexpectedShape(key.to_string())),
    }
}

fn required_text<'a>(record: &'a RawRecord, key: &str) -> Result<&'a str, NormalizeError> {
    match record.get(key) {
        Some(RawValue::Text(s)) => Ok(s),
        None | Some(RawValue::Null) => Err(NormalizeError::MissingField(key.to_string())),
        Some(_) => Err(NormalizeError::UnexpectedShape(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn year_block(index: u32, suffix: &str) -> String {
        format!(
            r#"<TAX-YEAR{i}-BR>
                <S-TAX-YEAR-YEAR-{p:02}>{suffix}</S-TAX-YEAR-YEAR-{p:02}>
                <S-PRINCIPAL-BAL-YEAR-{p:02}>1000.00</S-PRINCIPAL-BAL-YEAR-{p:02}>
                <S-INTEREST-BAL-YEAR-{p:02}>25.50</S-INTEREST-BAL-YEAR-{p:02}>
                <S-PENALTY-BAL-YEAR-{p:02}>10.00</S-PENALTY-BAL-YEAR-{p:02}>
                <S-OTHER-CHG-BAL-YEAR-{p:02}>0.00</S-OTHER-CHG-BAL-YEAR-{p:02}>
                <S-TOTAL-BALANCE-YEAR-{p:02}>1035.50</S-TOTAL-BALANCE-YEAR-{p:02}>
                <LIEN-NUMBER-YEAR-{p:02}/>
                <ATTORNEY-YEAR-{p:02}>CITY SOLICITOR</ATTORNEY-YEAR-{p:02}>
                <CASE-STATUS-YEAR-{p:02}>OPEN</CASE-STATUS-YEAR-{p:02}>
            </TAX-YEAR{i}-BR>"#,
            i = index,
            p = index,
            suffix = suffix,
        )
    }

    fn fixture(posted_thru: &str, suffixes: &[&str]) -> String {
        let blocks: String = suffixes
            .iter()
            .enumerate()
            .map(|(i, s)| year_block(i as u32 + 1, s))
            .collect();

        format!(
            r#"<?xml version="1.0"?>
            <Output>
                <BRT-NO>883309050</BRT-NO>
                <PAYMENTS-POSTED-THRU>{posted_thru}</PAYMENTS-POSTED-THRU>
                <PROPERTY-INFO>
                    <PROPERTY-ADDRESS>1234 MARKET ST</PROPERTY-ADDRESS>
                    <PROPERTY-ADDRESS-LINE>UNIT 2</PROPERTY-ADDRESS-LINE>
                    <OWNER-NAME>DOE JANE</OWNER-NAME>
                    <PENALTY-CALC-DATE>05/31/2023</PENALTY-CALC-DATE>
                </PROPERTY-INFO>
                {blocks}
            </Output>"#
        )
    }

    #[test]
    fn test_normalize_three_years() {
        let doc = parse_document(&fixture("06/15/2023", &["20", "21", "22"])).unwrap();
        let result = normalize(&doc, 2023).unwrap();

        assert_eq!(result.account_num, "883309050");
        assert_eq!(result.last_payment_posted_date, NaiveDate::from_ymd_opt(2023, 6, 15).unwrap());
        assert_eq!(result.years.len(), 3);
        assert_eq!(
            result.years.iter().map(|y| y.year).collect::<Vec<_>>(),
            vec![2020, 2021, 2022]
        );
        assert_eq!(result.years[0].total, 1035.5);
        assert_eq!(result.years[0].lien_num, None);
        assert_eq!(result.years[0].solicitor.as_deref(), Some("CITY SOLICITOR"));
    }

    #[test]
    fn test_property_info_keys() {
        let doc = parse_document(&fixture("06/15/2023", &["22"])).unwrap();
        let property = normalize(&doc, 2023).unwrap().property;

        assert_eq!(property.address, "1234 MARKET ST");
        assert_eq!(property.penalty_calc_date, NaiveDate::from_ymd_opt(2023, 5, 31).unwrap());
        assert_eq!(property.extra["propertyAddressLine"], "UNIT 2");
        assert_eq!(property.extra["ownerName"], "DOE JANE");
        assert!(!property.extra.contains_key("propertyAddress"));
    }

    #[test]
    fn test_typed_property_fields_are_not_duplicated() {
        let xml = r#"<Output>
            <BRT-NO>883309050</BRT-NO>
            <PAYMENTS-POSTED-THRU>06/15/2023</PAYMENTS-POSTED-THRU>
            <PROPERTY-INFO>
                <PROPERTY-ADDRESS>1 MAIN</PROPERTY-ADDRESS>
                <ADDRESS>OTHER</ADDRESS>
                <PENALTY-CALC-DATE>05/31/2023</PENALTY-CALC-DATE>
            </PROPERTY-INFO>
        </Output>"#;
        let doc = parse_document(xml).unwrap();
        let property = normalize(&doc, 2023).unwrap().property;

        assert_eq!(property.address, "1 MAIN");
        assert!(!property.extra.contains_key("address"));

        let json = serde_json::to_string(&property).unwrap();
        assert_eq!(json.matches("\"address\"").count(), 1);
        assert!(json.contains("\"address\":\"1 MAIN\""));
        assert!(!json.contains("OTHER"));
    }

    #[test]
    fn test_serialized_shape() {
        let doc = parse_document(&fixture("06/15/2023", &["22"])).unwrap();
        let json = serde_json::to_value(normalize(&doc, 2023).unwrap()).unwrap();

        assert_eq!(json["accountNum"], "883309050");
        assert_eq!(json["lastPaymentPostedDate"], "2023-06-15");
        assert_eq!(json["property"]["address"], "1234 MARKET ST");
        assert_eq!(json["property"]["penaltyCalcDate"], "2023-05-31");
        assert_eq!(json["property"]["ownerName"], "DOE JANE");
        assert_eq!(json["years"][0]["principal"], 1000.0);
        assert_eq!(json["years"][0]["status"], "OPEN");
    }

    #[test]
    fn test_no_year_blocks() {
        let doc = parse_document(&fixture("01/02/2023", &[])).unwrap();
        let result = normalize(&doc, 2023).unwrap();
        assert!(result.years.is_empty());
    }

    #[test]
    fn test_malformed_posted_date_fails() {
        let doc = parse_document(&fixture("2023-06-15", &["22"])).unwrap();
        let err = normalize(&doc, 2023).unwrap_err();

        assert!(matches!(
            err,
            NormalizeError::InvalidDate { ref field, .. } if field == "PAYMENTS-POSTED-THRU"
        ));
    }

    #[test]
    fn test_parse_tips_date() {
        assert_eq!(
            parse_tips_date("X", "12/01/2019").unwrap(),
            NaiveDate::from_ymd_opt(2019, 12, 1).unwrap()
        );
        assert_eq!(
            parse_tips_date("X", " 1/2/2020 ").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()
        );
        assert!(parse_tips_date("X", "13/01/2019").is_err());
        assert!(parse_tips_date("X", "").is_err());
    }

    #[test]
    fn test_missing_output() {
        let doc = parse_document("<Response><BRT-NO>1</BRT-NO></Response>").unwrap();
        assert!(matches!(normalize(&doc, 2023), Err(NormalizeError::MissingField(ref f)) if f == "Output"));
    }

    #[test]
    fn test_missing_address() {
        let xml = r#"<Output>
            <BRT-NO>883309050</BRT-NO>
            <PAYMENTS-POSTED-THRU>06/15/2023</PAYMENTS-POSTED-THRU>
            <PROPERTY-INFO><PENALTY-CALC-DATE>05/31/2023</PENALTY-CALC-DATE></PROPERTY-INFO>
        </Output>"#;
        let doc = parse_document(xml).unwrap();

        assert!(matches!(normalize(&doc, 2023), Err(NormalizeError::MissingField(_))));
    }
}
