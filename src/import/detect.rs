//! Format detection heuristics for import.

use std::io::{self, BufRead};
use std::path::Path;

use super::ImportFormat;

pub fn detect_format<R: BufRead>(reader: &mut R, path: &Path) -> io::Result<ImportFormat> {
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        match ext.to_lowercase().as_str() {
            "jsonl" | "ndjson" => return Ok(ImportFormat::Ndjson),
            "json" => return Ok(ImportFormat::JsonArray),
            "csv" | "tsv" => return Ok(ImportFormat::Csv),
            _ => {}
        }
    }
    let buf = reader.fill_buf()?; // peek without consuming
    let s = String::from_utf8_lossy(&buf[..std::cmp::min(256, buf.len())]);
    let head = s.trim_start();
    if head.starts_with('[') {
        return Ok(ImportFormat::JsonArray);
    }
    if head.starts_with('{') {
        return Ok(ImportFormat::Ndjson);
    }
    Ok(ImportFormat::Csv)
}
