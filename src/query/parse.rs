use crate::errors::ExportError;

use super::lookup::{Lookup, field_path_to_dotted, split_lookup_key};
use super::types::{Filter, LookupValue, MAX_IN_SET};

/// Parses a boolean query-string value the way form inputs send them.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Turns a raw string into the typed right-hand side for `lookup`.
///
/// # Errors
/// Returns `BadRequest` when the value cannot be used with the operator.
pub fn parse_lookup_value(key: &str, lookup: Lookup, raw: &str) -> Result<LookupValue, ExportError> {
    Ok(match lookup {
        Lookup::In => {
            let items: Vec<String> = raw.split(',').map(|s| s.trim().to_string()).collect();
            if items.len() > MAX_IN_SET {
                return Err(ExportError::BadRequest(format!(
                    "{key} accepts at most {MAX_IN_SET} values"
                )));
            }
            LookupValue::List(items)
        }
        Lookup::Range => {
            let bounds: Vec<&str> = raw.split(',').map(str::trim).collect();
            let [lo, hi] = bounds.as_slice() else {
                return Err(ExportError::BadRequest(format!(
                    "{key} expects two comma-separated values"
                )));
            };
            LookupValue::Range((*lo).to_string(), (*hi).to_string())
        }
        Lookup::IsNull => match parse_flag(raw) {
            Some(b) => LookupValue::Flag(b),
            None => {
                return Err(ExportError::BadRequest(format!(
                    "{key} expects true or false, got '{raw}'"
                )));
            }
        },
        #[cfg(feature = "regex")]
        Lookup::Regex | Lookup::IRegex => {
            let mut re = regex::RegexBuilder::new(raw);
            re.case_insensitive(lookup.is_case_insensitive());
            let re = re
                .build()
                .map_err(|e| ExportError::BadRequest(format!("{key} has an invalid pattern: {e}")))?;
            LookupValue::Pattern(re)
        }
        _ => LookupValue::Text(raw.to_string()),
    })
}

/// Builds a single lookup filter from a `field__operator` key and its raw value.
///
/// # Errors
/// `Misconfigured` when the operator is not a known lookup (it passed the
/// allow-list, so the allow-list is wrong); `BadRequest` for unusable values.
pub fn lookup_filter(key: &str, raw: &str) -> Result<Filter, ExportError> {
    let (path, op) = split_lookup_key(key);
    let lookup: Lookup = op.parse().map_err(|e| {
        ExportError::Misconfigured(format!("filter '{key}' is allowed but {e}"))
    })?;
    let value = parse_lookup_value(key, lookup, raw)?;
    Ok(Filter::Lookup { path: field_path_to_dotted(path), lookup, value })
}
