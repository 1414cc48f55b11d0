//! `{field}` placeholder substitution against the data bag.
//!
//! String substitution only, never an expression language; this keeps the
//! attack surface and failure modes bounded.

use crate::state::DataBag;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::warn;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_.]+)\}").unwrap());

/// Resolves every `{field}` placeholder in `template` against `bag`.
///
/// A placeholder with no matching field substitutes an empty string and logs
/// a warning; messages should still send.
pub fn resolve(template: &str, bag: &DataBag) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let field = &caps[1];
            match bag.get(field) {
                Some(value) => value.to_string(),
                None => {
                    warn!(field, "unresolved template placeholder");
                    String::new()
                }
            }
        })
        .into_owned()
}
