use crate::collection::Collection;
use crate::document::Document;
use crate::errors::ExportError;
use std::sync::Arc;

use super::eval::eval_filter;
use super::parse::lookup_filter;
use super::types::Filter;

/// A lazily evaluated, filterable view over one collection.
///
/// Building and narrowing a `QuerySet` never touches the records; only
/// [`QuerySet::fetch`] scans the collection.
#[derive(Clone)]
pub struct QuerySet {
    collection: Arc<Collection>,
    filter: Filter,
}

impl std::fmt::Debug for QuerySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("collection", &self.collection.name_str())
            .field("filter", &self.filter)
            .finish()
    }
}

impl QuerySet {
    /// Every record of the collection.
    pub fn all(collection: Arc<Collection>) -> Self {
        Self { collection, filter: Filter::True }
    }

    /// Narrows by a prepared filter tree.
    #[must_use]
    pub fn filter_by(self, filter: Filter) -> Self {
        Self { collection: self.collection, filter: self.filter.and(filter) }
    }

    /// Narrows by `field__operator` / raw value pairs, all of which must hold.
    ///
    /// # Errors
    /// See [`lookup_filter`]; nothing is fetched when this fails.
    pub fn filter<'a, I>(self, lookups: I) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let parts = lookups
            .into_iter()
            .map(|(k, v)| lookup_filter(k, v))
            .collect::<Result<Vec<_>, _>>()?;
        if parts.is_empty() {
            return Ok(self);
        }
        Ok(self.filter_by(Filter::And(parts)))
    }

    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    pub fn is_filtered(&self) -> bool {
        !self.filter.is_true()
    }

    /// Evaluates the query, returning matching records in insertion order.
    pub fn fetch(&self) -> Vec<Document> {
        let docs = if self.filter.is_true() {
            self.collection.get_all_documents()
        } else {
            self.collection.scan(|d| eval_filter(&d.data, &self.filter))
        };
        log::debug!(
            "queryset: collection={} filtered={} rows={}",
            self.collection.name_str(),
            self.is_filtered(),
            docs.len()
        );
        docs
    }

}
