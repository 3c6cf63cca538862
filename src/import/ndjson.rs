use crate::collection::Collection;
use crate::document::Document;
use crate::query::from_json;
use bson::Bson;
use std::io::{self, BufRead, BufReader, Read};

use super::options::{ImportOptions, ImportReport};

fn to_document(v: &serde_json::Value) -> Option<Document> {
    match from_json(v) {
        Bson::Document(d) => Some(Document::new(d)),
        _ => None,
    }
}

pub fn import_json_array<R: Read>(
    collection: &Collection,
    reader: R,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> io::Result<()> {
    let val: serde_json::Value = serde_json::from_reader(BufReader::new(reader))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let arr = val
        .as_array()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "expected JSON array"))?;
    for (i, v) in arr.iter().enumerate() {
        match to_document(v) {
            Some(d) => {
                collection.insert_document(d);
                report.inserted += 1;
            }
            None if opts.skip_errors => {
                log::warn!("import json: skipping element {i}: not an object");
                report.skipped += 1;
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("element {i} is not an object"),
                ));
            }
        }
    }
    Ok(())
}

pub fn import_ndjson<R: Read>(
    collection: &Collection,
    reader: R,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line_no: usize = 0;
    let mut buf = String::with_capacity(8 * 1024);
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = serde_json::from_str::<serde_json::Value>(line)
            .map_err(|e| e.to_string())
            .and_then(|v| to_document(&v).ok_or_else(|| "not an object".to_string()));
        match parsed {
            Ok(d) => {
                collection.insert_document(d);
                report.inserted += 1;
                if let Some(n) = opts.progress_every
                    && n > 0
                    && line_no % n == 0
                {
                    log::info!("imported {} records (ndjson)", report.inserted);
                }
            }
            Err(e) => {
                if opts.skip_errors {
                    log::warn!("import ndjson: skipping line {line_no}: {e}");
                    report.skipped += 1;
                } else {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line {line_no}: {e}"),
                    ));
                }
            }
        }
    }
    Ok(())
}
