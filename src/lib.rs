//! Filtered tabular exports of in-memory record collections.
//!
//! A [`GenericExporter`] holds the per-model filter allow-list
//! ([`ExportConfig`]) and the collection registry ([`Engine`]). Each request
//! names a model, passes `field__lookup=value` filters and an optional
//! `format`, and receives the serialized rows as an attachment.

pub mod collection;
pub mod config;
pub mod dataset;
pub mod document;
pub mod engine;
pub mod errors;
pub mod filters;
pub mod fsutil;
pub mod import;
pub mod logger;
pub mod query;
pub mod server;
pub mod types;
pub mod views;

pub use collection::Collection;
pub use config::{ExportConfig, FilterSpec, ModelSettings};
pub use dataset::{Dataset, ExportFormat};
pub use document::Document;
pub use engine::Engine;
pub use errors::ExportError;
pub use filters::{ActiveFilters, validate_filters};
pub use query::{Filter, Lookup, QuerySet};
pub use views::{ExportRequest, ExportResponse, GenericExporter, export};

use std::sync::Arc;

/// Builds an engine seeded from every configured model `source`.
///
/// # Errors
/// `Misconfigured` when a source cannot be loaded.
pub fn engine_from_config(config: &ExportConfig) -> Result<Arc<Engine>, ExportError> {
    let engine = Engine::new();
    for (model, report) in import::load_sources(&engine, config)? {
        log::info!("seeded {model}: {} records ({} skipped)", report.inserted, report.skipped);
    }
    Ok(Arc::new(engine))
}
