//! Allow-list validation of query-string filters.
//!
//! Every incoming key is split into a field path and a lookup operator; the
//! pair must appear in the model's [`FilterSpec`](crate::config::FilterSpec)
//! before any record is read.

use crate::config::ModelSettings;
use crate::errors::ExportError;
use crate::query::split_lookup_key;
use std::collections::BTreeMap;

/// Query keys consumed by the export view itself and never treated as filters.
pub const RESERVED_PARAMS: &[&str] = &["format"];

/// Validated `field__operator` keys and their raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFilters(BTreeMap<String, String>);

impl ActiveFilters {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Checks one query key against the model's allow-list.
///
/// # Errors
/// `BadRequest` naming the field when it may not be filtered, or listing the
/// permitted operators when the operator is not among them.
pub fn check_key(settings: &ModelSettings, key: &str) -> Result<(), ExportError> {
    let (field, op) = split_lookup_key(key);
    let Some(allowed) = settings.allowed_lookups(field) else {
        return Err(ExportError::BadRequest(format!("Filtering on {field} is not allowed")));
    };
    if !allowed.iter().any(|a| a == op) {
        return Err(ExportError::BadRequest(format!(
            "{key} may only be filtered using {}",
            allowed.join(" ")
        )));
    }
    Ok(())
}

/// Validates every non-reserved parameter and collects the active filters.
///
/// Stops at the first offending key. A repeated key keeps its last value.
///
/// # Errors
/// See [`check_key`].
pub fn validate_filters<'a, I>(settings: &ModelSettings, params: I) -> Result<ActiveFilters, ExportError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut active = BTreeMap::new();
    for (key, value) in params {
        if RESERVED_PARAMS.contains(&key) {
            continue;
        }
        if let Err(e) = check_key(settings, key) {
            log::debug!("filters: rejected key={key}: {e}");
            return Err(e);
        }
        active.insert(key.to_string(), value.to_string());
    }
    Ok(ActiveFilters(active))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ModelSettings {
        ModelSettings::default().allow("name", ["exact"]).allow("owner__name", ["exact", "iexact"])
    }

    #[test]
    fn bare_key_defaults_to_exact() {
        let active = validate_filters(&widget(), [("name", "foo")]).unwrap();
        assert_eq!(active.iter().collect::<Vec<_>>(), vec![("name", "foo")]);
    }

    #[test]
    fn unknown_field_names_the_field() {
        let err = validate_filters(&widget(), [("color__exact", "red")]).unwrap_err();
        assert_eq!(err.to_string(), "Filtering on color is not allowed");
    }

    #[test]
    fn disallowed_operator_lists_permitted_ones() {
        let err = validate_filters(&widget(), [("owner__name__icontains", "a")]).unwrap_err();
        assert_eq!(err.to_string(), "owner__name__icontains may only be filtered using exact iexact");
    }

    #[test]
    fn no_filter_spec_rejects_everything() {
        let none = ModelSettings::default();
        assert!(matches!(validate_filters(&none, [("name", "x")]), Err(ExportError::BadRequest(_))));
        assert!(validate_filters(&none, std::iter::empty()).unwrap().is_empty());
    }

    #[test]
    fn empty_filter_spec_behaves_like_none() {
        let mut empty = ModelSettings::default();
        empty.filters = Some(Default::default());
        assert!(matches!(validate_filters(&empty, [("name", "x")]), Err(ExportError::BadRequest(_))));
    }

    #[test]
    fn format_is_reserved() {
        let active = validate_filters(&widget(), [("name", "foo"), ("format", "csv")]).unwrap();
        assert_eq!(active.iter().collect::<Vec<_>>(), vec![("name", "foo")]);
    }

    #[test]
    fn last_value_wins() {
        let active = validate_filters(&widget(), [("name", "a"), ("name", "b")]).unwrap();
        assert_eq!(active.iter().collect::<Vec<_>>(), vec![("name", "b")]);
    }
}
