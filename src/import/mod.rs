//! Seed import: loads CSV, NDJSON and JSON-array files into collections.

mod csv;
mod detect;
mod ndjson;
mod options;
mod pipeline;
mod util;

pub use detect::detect_format;
pub use options::{CsvOptions, ImportFormat, ImportOptions, ImportReport};
pub use pipeline::{import_file, import_from_reader, load_sources};
