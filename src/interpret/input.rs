//! Typed validation of lead input against a question's field type.

use crate::flow::FieldType;
use crate::state::FieldValue;
use regex::Regex;
use std::sync::LazyLock;

use super::condition::coerce_number;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s()\-+]{8,20}$").unwrap());
static DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2}[/-]\d{2}[/-]\d{4}$").unwrap());

/// Validates raw lead input against `field_type` and converts it to the
/// canonical stored value.
///
/// Returns the rejection reason on failure; the caller turns that into a
/// retry prompt.
pub(super) fn validate(
    raw: &str,
    field_type: FieldType,
    options: &[String],
) -> Result<FieldValue, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty input".to_string());
    }

    match field_type {
        FieldType::Text => Ok(FieldValue::Text(trimmed.to_string())),
        FieldType::Number => coerce_number(trimmed)
            .map(FieldValue::Number)
            .ok_or_else(|| "not a number".to_string()),
        FieldType::Email => {
            if EMAIL.is_match(trimmed) {
                // Stored lowercased so later comparisons are stable.
                Ok(FieldValue::Text(trimmed.to_lowercase()))
            } else {
                Err("invalid email address".to_string())
            }
        }
        FieldType::Phone => {
            if PHONE.is_match(trimmed) {
                Ok(FieldValue::Text(normalize_phone(trimmed)))
            } else {
                Err("invalid phone number".to_string())
            }
        }
        FieldType::Date => {
            if DATE.is_match(trimmed) {
                Ok(FieldValue::Text(trimmed.to_string()))
            } else {
                Err("invalid date, expected DD/MM/YYYY".to_string())
            }
        }
        FieldType::Choice => {
            let lowered = trimmed.to_lowercase();
            options
                .iter()
                .find(|opt| opt.to_lowercase() == lowered)
                // The configured casing is canonical, not the lead's.
                .map(|opt| FieldValue::Text(opt.clone()))
                .ok_or_else(|| "not one of the offered options".to_string())
        }
        FieldType::Boolean => match trimmed.to_lowercase().as_str() {
            "sim" | "yes" | "true" | "1" | "s" | "y" => Ok(FieldValue::Bool(true)),
            "nao" | "não" | "no" | "false" | "0" | "n" => Ok(FieldValue::Bool(false)),
            _ => Err("expected a yes/no answer".to_string()),
        },
    }
}

/// Normalizes a phone number to E.164, assuming Brazil for bare local
/// numbers (10 or 11 digits).
pub(super) fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 | 11 => format!("+55{}", digits),
        12 | 13 if digits.starts_with("55") => format!("+{}", digits),
        _ => format!("+{}", digits),
    }
}
