//! Deterministic operator evaluation for condition nodes.
//!
//! Numeric operators compare numerically when both sides coerce to numbers
//! and fail closed to `false` otherwise; equality falls back to
//! case-insensitive string comparison. A missing data-bag key and an empty
//! string are treated identically by the emptiness checks.

use crate::flow::{Comparand, Operator};
use crate::state::FieldValue;

pub(super) fn evaluate(op: Operator, actual: Option<&FieldValue>, expected: &Comparand) -> bool {
    match op {
        Operator::Equals => safe_equals(actual, expected),
        Operator::NotEquals => !safe_equals(actual, expected),
        Operator::Contains => safe_contains(actual, expected),
        Operator::NotContains => !safe_contains(actual, expected),
        Operator::GreaterThan => safe_compare(actual, expected, |a, b| a > b),
        Operator::LessThan => safe_compare(actual, expected, |a, b| a < b),
        Operator::GreaterOrEqual => safe_compare(actual, expected, |a, b| a >= b),
        Operator::LessOrEqual => safe_compare(actual, expected, |a, b| a <= b),
        Operator::StartsWith => with_strings(actual, expected, |a, b| a.starts_with(&b)),
        Operator::EndsWith => with_strings(actual, expected, |a, b| a.ends_with(&b)),
        Operator::IsEmpty => is_empty(actual),
        Operator::IsNotEmpty | Operator::Exists => !is_empty(actual),
    }
}

fn is_empty(actual: Option<&FieldValue>) -> bool {
    match actual {
        None => true,
        Some(FieldValue::Text(t)) => t.trim().is_empty(),
        Some(_) => false,
    }
}

fn safe_equals(actual: Option<&FieldValue>, expected: &Comparand) -> bool {
    let Some(actual) = actual else {
        return matches!(expected, Comparand::Null);
    };
    if matches!(expected, Comparand::Null) {
        return false;
    }

    if let (FieldValue::Bool(a), Comparand::Bool(b)) = (actual, expected) {
        return a == b;
    }

    // Numeric comparison first, so "10" equals 10.0.
    if let (Some(a), Some(b)) = (value_as_number(actual), comparand_as_number(expected)) {
        return a == b;
    }

    normalize(&actual.to_string()) == normalize(&expected.to_string())
}

fn safe_contains(actual: Option<&FieldValue>, expected: &Comparand) -> bool {
    with_strings(actual, expected, |a, b| a.contains(&b))
}

fn safe_compare(
    actual: Option<&FieldValue>,
    expected: &Comparand,
    cmp: impl Fn(f64, f64) -> bool,
) -> bool {
    match (
        actual.and_then(value_as_number),
        comparand_as_number(expected),
    ) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn with_strings(
    actual: Option<&FieldValue>,
    expected: &Comparand,
    f: impl Fn(String, String) -> bool,
) -> bool {
    match actual {
        Some(value) => f(normalize(&value.to_string()), normalize(&expected.to_string())),
        None => false,
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn value_as_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(t) => coerce_number(t),
        FieldValue::Bool(_) => None,
    }
}

fn comparand_as_number(value: &Comparand) -> Option<f64> {
    match value {
        Comparand::Number(n) => Some(*n),
        Comparand::Text(t) => coerce_number(t),
        Comparand::Bool(_) | Comparand::Null => None,
    }
}

/// Lenient string-to-number coercion.
///
/// Strips currency symbols and whitespace and accepts both Brazilian
/// (`1.234,56`) and US (`1,234.56`) digit grouping.
pub(crate) fn coerce_number(raw: &str) -> Option<f64> {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, 'R' | '$' | '€' | '£' | '¥'))
        .collect();

    let has_comma = cleaned.contains(',');
    let has_dot = cleaned.contains('.');

    if has_comma && has_dot {
        let last_comma = cleaned.rfind(',').unwrap_or(0);
        let last_dot = cleaned.rfind('.').unwrap_or(0);
        if last_comma > last_dot {
            // Brazilian: dots group thousands, comma is the decimal mark.
            cleaned = cleaned.replace('.', "").replace(',', ".");
        } else {
            cleaned = cleaned.replace(',', "");
        }
    } else if has_comma {
        let parts: Vec<&str> = cleaned.split(',').collect();
        if parts.len() == 2 && parts[1].len() <= 2 {
            cleaned = cleaned.replace(',', ".");
        } else {
            cleaned = cleaned.replace(',', "");
        }
    } else if cleaned.matches('.').count() > 1 {
        cleaned = cleaned.replace('.', "");
    }

    cleaned.parse::<f64>().ok()
}
