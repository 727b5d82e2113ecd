//! The two NIGO checks.
//!
//! `is_flagged_cell` drives cell highlighting; `is_listed_missing` drives the
//! notice email. They disagree on casing and on the four signature/date
//! fields, and both behaviours are kept as-is.

use serde_json::Value;

use crate::model::{Field, FieldMapping, is_truthy, render_value};

const FLAGGED_MARKERS: [&str; 3] = ["not found", "missing", "error"];
const LISTED_MARKERS: [&str; 3] = ["Not Found", "Missing", "Error"];
const AFFIRMATIVE: &str = "yes";

/// Notice order, which differs from ledger column order.
pub const NOTICE_ORDER: [Field; 12] = [
    Field::ClientName,
    Field::EffectiveDate,
    Field::ClientSignaturePage11,
    Field::ClientDatePage11,
    Field::AccountNumber,
    Field::AdvReceivedDate,
    Field::ClientSignaturePage14,
    Field::ClientDatePage14,
    Field::FeeAmount,
    Field::FeeType,
    Field::Discretion,
    Field::Wrap,
];

pub fn is_flagged_cell(field: Field, value: Option<&Value>) -> bool {
    let Some(value) = value.filter(|value| is_truthy(value)) else {
        return true;
    };

    let lowered = render_value(value).to_lowercase();
    if FLAGGED_MARKERS.contains(&lowered.as_str()) {
        return true;
    }

    // Date fields are held to "yes" as well.
    field.is_signature_or_date() && lowered != AFFIRMATIVE
}

pub fn is_listed_missing(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(value) if !is_truthy(value) => true,
        Some(Value::String(text)) => LISTED_MARKERS.contains(&text.as_str()),
        Some(_) => false,
    }
}

pub fn flagged_fields(mapping: &FieldMapping) -> Vec<Field> {
    Field::ALL
        .into_iter()
        .filter(|field| is_flagged_cell(*field, mapping.value(*field)))
        .collect()
}

pub fn missing_items(mapping: &FieldMapping) -> Vec<&'static str> {
    NOTICE_ORDER
        .into_iter()
        .filter(|field| is_listed_missing(mapping.value(*field)))
        .map(Field::notice_label)
        .collect()
}
