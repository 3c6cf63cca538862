//! Tabular view over fetched records and its serializations.

mod format;
mod writers;

pub use format::{ExportFormat, MIME_TYPES, OCTET_STREAM, Serializer, mime_type};

use crate::document::{Document, field_union};
use crate::query::{field_path_to_dotted, get_path};
use bson::Bson;

/// Headers plus one row of cells per record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Bson>>,
}

impl Dataset {
    /// Builds a dataset from records.
    ///
    /// Without `headers`, columns are the union of the records' top-level
    /// fields in first-seen order. Header names may use `__` to reach into
    /// embedded documents. Missing cells are `Null`.
    pub fn from_documents(docs: &[Document], headers: Option<&[String]>) -> Self {
        let Some(headers) = headers else {
            return Self::with_columns(docs, field_union(docs));
        };
        let paths: Vec<String> = headers.iter().map(|h| field_path_to_dotted(h)).collect();
        let rows = docs
            .iter()
            .map(|d| {
                paths.iter().map(|p| get_path(&d.data, p).cloned().unwrap_or(Bson::Null)).collect()
            })
            .collect();
        Self { headers: headers.to_vec(), rows }
    }

    /// Builds a dataset over fixed top-level `columns`, which need not all
    /// occur in `docs`.
    pub fn with_columns(docs: &[Document], columns: Vec<String>) -> Self {
        let rows = docs
            .iter()
            .map(|d| columns.iter().map(|c| d.data.get(c).cloned().unwrap_or(Bson::Null)).collect())
            .collect();
        Self { headers: columns, rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Serializes the dataset in `format`.
    ///
    /// # Errors
    /// Propagates writer failures.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, crate::errors::ExportError> {
        (format.serializer())(self)
    }
}
