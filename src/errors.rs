use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Unknown model or unsupported export format.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filter field/operator outside the allow-list, or an unusable lookup value.
    #[error("{0}")]
    BadRequest(String),

    /// Deployment mistake: a configured model that cannot be resolved, an unknown
    /// lookup in the allow-list, a record source that cannot be loaded.
    #[error("Improperly configured: {0}")]
    Misconfigured(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XLSX: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::BadRequest(_) => 400,
            Self::Misconfigured(_)
            | Self::Io(_)
            | Self::Csv(_)
            | Self::Json(_)
            | Self::Xlsx(_)
            | Self::Config(_)
            | Self::Internal(_) => 500,
        }
    }

    /// True for failures caused by the request rather than the deployment.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::BadRequest(_))
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ExportError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ExportError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(ExportError::Misconfigured("x".into()).status_code(), 500);
        assert_eq!(ExportError::Internal("x".into()).status_code(), 500);
        assert!(ExportError::BadRequest("x".into()).is_client_error());
        assert!(!ExportError::Misconfigured("x".into()).is_client_error());
    }

    #[test]
    fn bad_request_displays_message_verbatim() {
        let e = ExportError::BadRequest("Filtering on name is not allowed".into());
        assert_eq!(e.to_string(), "Filtering on name is not allowed");
    }
}
