//! The export views: a plain export of a queryset, and the configuration-driven
//! generic export that validates query-string filters first.

use crate::collection::Collection;
use crate::config::ExportConfig;
use crate::dataset::{Dataset, ExportFormat};
use crate::engine::Engine;
use crate::errors::ExportError;
use crate::filters::validate_filters;
use crate::query::QuerySet;
use std::sync::Arc;

pub const DEFAULT_FORMAT: &str = "xls";
pub const DEFAULT_FILENAME: &str = "export";

/// Serialized export ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    /// `<stem>.<format>`
    pub filename: String,
    pub rows: usize,
}

impl ExportResponse {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

/// Inputs of [`export`].
///
/// Either `queryset` or `collection` must be set; with only a collection every
/// record is exported. Without `headers` the columns are every top-level field
/// of the collection, so they do not depend on which records matched.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub queryset: Option<QuerySet>,
    pub collection: Option<Arc<Collection>>,
    pub headers: Option<Vec<String>>,
    pub format: String,
    pub filename: String,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            queryset: None,
            collection: None,
            headers: None,
            format: DEFAULT_FORMAT.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
        }
    }
}

impl ExportRequest {
    pub fn for_queryset(queryset: QuerySet) -> Self {
        Self { queryset: Some(queryset), ..Self::default() }
    }

    pub fn for_collection(collection: Arc<Collection>) -> Self {
        Self { collection: Some(collection), ..Self::default() }
    }

    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn filename(mut self, stem: impl Into<String>) -> Self {
        self.filename = stem.into();
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: Vec<String>) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Serializes the requested records.
///
/// The format is checked before any record is read.
///
/// # Errors
/// `NotFound` for an unsupported format; `Misconfigured` when the request names
/// no record source; writer failures otherwise.
pub fn export(req: ExportRequest) -> Result<ExportResponse, ExportError> {
    let format: ExportFormat = req.format.parse()?;
    let queryset = match (req.queryset, req.collection) {
        (Some(qs), _) => qs,
        (None, Some(col)) => QuerySet::all(col),
        (None, None) => {
            return Err(ExportError::Misconfigured(
                "export needs a queryset or a collection".into(),
            ));
        }
    };
    let docs = queryset.fetch();
    let dataset = match req.headers.as_deref() {
        Some(headers) => Dataset::from_documents(&docs, Some(headers)),
        None => Dataset::with_columns(&docs, queryset.collection().field_names()),
    };
    let body = dataset.export(format)?;
    Ok(ExportResponse {
        body,
        content_type: format.mime_type(),
        filename: format!("{}.{}", req.filename, format.as_str()),
        rows: dataset.height(),
    })
}

/// Export view configured by an [`ExportConfig`] and backed by an [`Engine`].
#[derive(Clone)]
pub struct GenericExporter {
    config: Arc<ExportConfig>,
    engine: Arc<Engine>,
}

impl GenericExporter {
    pub fn new(config: Arc<ExportConfig>, engine: Arc<Engine>) -> Self {
        Self { config, engine }
    }

    /// Exports `model_name`, filtered by the allowed `params`.
    ///
    /// A `format` parameter overrides the configured default format.
    ///
    /// # Errors
    /// `NotFound` for an unconfigured model or unsupported format,
    /// `BadRequest` for a filter outside the allow-list, `Misconfigured` when a
    /// configured model has no registered collection.
    pub fn export<'a, I>(&self, model_name: &str, params: I) -> Result<ExportResponse, ExportError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let Some(settings) = self.config.model(model_name) else {
            return Err(ExportError::NotFound(format!("model {model_name} is not exported")));
        };
        let Some(collection) = self.engine.get_collection(model_name) else {
            log::error!("generic_export: model {model_name} is configured but not registered");
            return Err(ExportError::Misconfigured(format!(
                "Model {model_name} is in the export configuration but could not be loaded"
            )));
        };

        let params: Vec<(&str, &str)> = params.into_iter().collect();
        let active = validate_filters(settings, params.iter().copied())?;

        let mut qs = QuerySet::all(collection);
        if !active.is_empty() {
            qs = qs.filter(active.iter())?;
        }

        let format = params
            .iter()
            .rev()
            .find(|(k, _)| *k == "format")
            .map_or(self.config.export.default_format.as_str(), |(_, v)| *v);
        let req = ExportRequest::for_queryset(qs)
            .format(format)
            .filename(self.config.filename_for(model_name));
        let resp = export(req)?;
        log::info!(
            target: crate::logger::AUDIT_TARGET,
            "export model={} format={} filters={} rows={} bytes={}",
            model_name,
            format,
            active.len(),
            resp.rows,
            resp.body.len()
        );
        Ok(resp)
    }
}
