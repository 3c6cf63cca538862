use std::fmt;
use std::str::FromStr;

use super::Dataset;
use super::writers;
use crate::errors::ExportError;

/// Fallback content type for formats missing from [`MIME_TYPES`].
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Static format → MIME table. Supported formats absent here are served as
/// [`OCTET_STREAM`].
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("json", "application/json"),
];

/// Looks up the content type for a format name.
pub fn mime_type(format: &str) -> &'static str {
    MIME_TYPES.iter().find(|(f, _)| *f == format).map_or(OCTET_STREAM, |(_, m)| *m)
}

pub type Serializer = fn(&Dataset) -> Result<Vec<u8>, ExportError>;

/// Serializations the dataset layer knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
    Ndjson,
    Html,
    Xls,
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [Self; 7] =
        [Self::Csv, Self::Tsv, Self::Json, Self::Ndjson, Self::Html, Self::Xls, Self::Xlsx];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Html => "html",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        mime_type(self.as_str())
    }

    /// The serialization function for this format.
    pub fn serializer(self) -> Serializer {
        match self {
            Self::Csv => writers::write_csv,
            Self::Tsv => writers::write_tsv,
            Self::Json => writers::write_json,
            Self::Ndjson => writers::write_ndjson,
            Self::Html => writers::write_html,
            Self::Xls => writers::write_xls,
            Self::Xlsx => writers::write_xlsx,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    /// Names are matched exactly; `XLS` is not `xls`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ExportError::NotFound(format!("unsupported export format '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_exact() {
        assert_eq!("xls".parse::<ExportFormat>().unwrap(), ExportFormat::Xls);
        assert!(matches!("XLS".parse::<ExportFormat>(), Err(ExportError::NotFound(_))));
        assert!(matches!("pdf".parse::<ExportFormat>(), Err(ExportError::NotFound(_))));
    }

    #[test]
    fn mime_table_with_fallback() {
        assert_eq!(ExportFormat::Xls.mime_type(), "application/vnd.ms-excel");
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
        assert_eq!(ExportFormat::Tsv.mime_type(), OCTET_STREAM);
        assert_eq!(ExportFormat::Ndjson.mime_type(), OCTET_STREAM);
        assert_eq!(mime_type("anything"), OCTET_STREAM);
    }
}
