use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::config::ExportConfig;
use crate::engine::Engine;
use crate::errors::ExportError;

use super::csv::import_csv;
use super::detect::detect_format;
use super::ndjson::{import_json_array, import_ndjson};
use super::options::{CsvOptions, ImportFormat, ImportOptions, ImportReport};

/// Import data from a file path into the target collection.
///
/// # Errors
/// Returns I/O errors on read failures and parse errors wrapped as `InvalidData`.
pub fn import_file<P: AsRef<Path>>(
    engine: &Engine,
    path: P,
    opts: &ImportOptions,
) -> io::Result<ImportReport> {
    log::info!("import: path={}, collection={}", path.as_ref().display(), opts.collection);
    let file = File::open(&path)?;
    let mut reader = BufReader::new(file);
    let format = match opts.format {
        ImportFormat::Auto => detect_format(&mut reader, path.as_ref())?,
        other => other,
    };
    let is_tsv = path.as_ref().extension().is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    if is_tsv && opts.csv.delimiter == b',' {
        let mut tsv = opts.clone();
        tsv.csv.delimiter = b'\t';
        return import_from_reader(engine, reader, format, &tsv);
    }
    import_from_reader(engine, reader, format, opts)
}

/// Import data from an arbitrary reader.
///
/// # Errors
/// Returns I/O errors on read failures and parse errors (`InvalidData`).
/// `Auto` is rejected as `InvalidInput` because a bare reader has no name to
/// sniff.
pub fn import_from_reader<R: Read>(
    engine: &Engine,
    reader: R,
    format: ImportFormat,
    opts: &ImportOptions,
) -> io::Result<ImportReport> {
    let collection = engine.create_collection(opts.collection.clone());
    let mut report = ImportReport::default();
    match format {
        ImportFormat::Ndjson => import_ndjson(&collection, reader, opts, &mut report)?,
        ImportFormat::JsonArray => import_json_array(&collection, reader, opts, &mut report)?,
        ImportFormat::Csv => import_csv(&collection, reader, opts, &mut report)?,
        ImportFormat::Auto => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "format must be resolved before reading",
            ));
        }
    }
    log::info!(
        "import: collection={} inserted={} skipped={}",
        opts.collection,
        report.inserted,
        report.skipped
    );
    Ok(report)
}

/// Seeds every configured model that names a `source` file. Each file is
/// loaded into a collection named after its model.
///
/// # Errors
/// `Misconfigured` naming the model when its source cannot be read or parsed.
pub fn load_sources(
    engine: &Engine,
    config: &ExportConfig,
) -> Result<Vec<(String, ImportReport)>, ExportError> {
    let mut loaded = Vec::new();
    for (name, settings) in &config.models {
        let Some(source) = settings.source.as_deref() else {
            continue;
        };
        let opts = ImportOptions {
            format: settings.format,
            collection: name.clone(),
            skip_errors: settings.skip_errors,
            csv: CsvOptions {
                has_headers: settings.has_headers,
                type_infer: settings.type_infer,
                ..CsvOptions::default()
            },
            ..ImportOptions::default()
        };
        let report = import_file(engine, source, &opts).map_err(|e| {
            ExportError::Misconfigured(format!(
                "model {name}: cannot load source {}: {e}",
                source.display()
            ))
        })?;
        loaded.push((name.clone(), report));
    }
    Ok(loaded)
}
