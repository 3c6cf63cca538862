use crate::collection::Collection;
use crate::document::Document;
use bson::Document as BsonDocument;
use std::io::{self, Read};

use super::options::{ImportOptions, ImportReport};
use super::util::field_to_bson;

pub fn import_csv<R: Read>(
    collection: &Collection,
    reader: R,
    opts: &ImportOptions,
    report: &mut ImportReport,
) -> io::Result<()> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(opts.csv.has_headers)
        .delimiter(opts.csv.delimiter)
        .from_reader(reader);
    let headers: Vec<String> = if opts.csv.has_headers {
        rdr.headers()
            .map(|h| h.iter().map(|s| s.trim().to_string()).collect())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
    } else {
        vec![]
    };
    let mut row_no: usize = 0;
    for rec in rdr.records() {
        row_no += 1;
        let rec = match rec {
            Ok(r) => r,
            Err(e) => {
                if opts.skip_errors {
                    log::warn!("import csv: skipping row {row_no}: {e}");
                    report.skipped += 1;
                    continue;
                }
                return Err(io::Error::new(io::ErrorKind::InvalidData, e));
            }
        };
        let mut map = BsonDocument::new();
        for (i, field) in rec.iter().enumerate() {
            let key = headers.get(i).cloned().unwrap_or_else(|| format!("field_{i}"));
            map.insert(key, field_to_bson(field, opts.csv.type_infer));
        }
        collection.insert_document(Document::new(map));
        report.inserted += 1;
        if let Some(n) = opts.progress_every
            && n > 0
            && row_no % n == 0
        {
            log::info!("imported {} records (csv)", report.inserted);
        }
    }
    Ok(())
}
