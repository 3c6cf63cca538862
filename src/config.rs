//! TOML configuration: server, logging, export defaults and the per-model
//! filter allow-list.
//!
//! Precedence when discovering a file: explicit path > `TABEX_CONFIG` >
//! `./tabex.toml` > built-in defaults. Individual `TABEX_*` variables then
//! override single settings.

use crate::dataset::ExportFormat;
use crate::errors::ExportError;
use crate::import::ImportFormat;
use crate::query::Lookup;
use crate::types::ModelName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Field path (`owner__name`) → permitted lookup operator names, in the order
/// they are reported back to clients.
pub type FilterSpec = BTreeMap<String, Vec<String>>;

pub const CONFIG_FILE_NAME: &str = "tabex.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8000".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub default_format: String,
    pub filename: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { default_format: "xls".to_string(), filename: "export".to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: Option<PathBuf>,
    pub level: Option<String>,
    pub retention: Option<usize>,
    /// log4rs YAML file; when set it replaces the programmatic setup.
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Seed file loaded into the model's collection at startup.
    pub source: Option<PathBuf>,
    /// Overrides the global filename stem.
    pub filename: Option<String>,
    /// Source format; `auto` detects it from the extension, then the content.
    pub format: ImportFormat,
    /// Infer numbers/booleans when importing CSV sources.
    pub type_infer: bool,
    /// CSV sources start with a header row.
    pub has_headers: bool,
    /// Skip and count malformed rows instead of failing the load.
    pub skip_errors: bool,
    /// `None` means no filtering is allowed at all.
    pub filters: Option<FilterSpec>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            source: None,
            filename: None,
            format: ImportFormat::Auto,
            type_infer: true,
            has_headers: true,
            skip_errors: true,
            filters: None,
        }
    }
}

impl ModelSettings {
    /// Permits `ops` on `field`.
    #[must_use]
    pub fn allow<I, S>(mut self, field: &str, ops: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters
            .get_or_insert_with(FilterSpec::new)
            .insert(field.to_string(), ops.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Allowed operators for `field`, if the field may be filtered at all.
    pub fn allowed_lookups(&self, field: &str) -> Option<&[String]> {
        self.filters.as_ref()?.get(field).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub server: ServerSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
    pub models: BTreeMap<ModelName, ModelSettings>,
}

impl ExportConfig {
    /// # Errors
    /// Returns `Config` when the text is not valid TOML for this schema.
    pub fn from_toml_str(s: &str) -> Result<Self, ExportError> {
        Ok(toml::from_str(s)?)
    }

    /// # Errors
    /// I/O or parse failure.
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| ExportError::Io(format!("{}: {e}", path.display())))?;
        let mut cfg = Self::from_toml_str(&s)?;
        cfg.resolve_relative_sources(path.parent());
        Ok(cfg)
    }

    /// Candidate config files in precedence order.
    pub fn find_config_paths(cli_cfg: Option<&Path>) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = vec![];
        if let Some(p) = cli_cfg {
            paths.push(p.to_path_buf());
        }
        if let Ok(p) = std::env::var("TABEX_CONFIG") {
            paths.push(PathBuf::from(p));
        }
        if let Ok(cur) = std::env::current_dir() {
            paths.push(cur.join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Loads the first existing candidate file (or defaults) and applies env
    /// overrides. Also returns the file that was loaded, `None` on defaults;
    /// nothing is logged here since the logger is configured from the result.
    ///
    /// An explicit `cli_cfg` that does not exist is an error rather than a silent fallback.
    ///
    /// # Errors
    /// I/O or parse failure of the chosen file.
    pub fn discover(
        cli_cfg: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ExportError> {
        if let Some(p) = cli_cfg
            && !p.exists()
        {
            return Err(ExportError::Io(format!("config file not found: {}", p.display())));
        }
        let source = Self::find_config_paths(cli_cfg).into_iter().find(|p| p.exists());
        let mut cfg = match &source {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        cfg.apply_env();
        Ok((cfg, source))
    }

    /// Applies `TABEX_BIND`, `TABEX_LOG_DIR`, `TABEX_LOG_LEVEL`, `TABEX_LOG_RETENTION`.
    pub fn apply_env(&mut self) {
        if let Ok(s) = std::env::var("TABEX_BIND") {
            self.server.bind = s;
        }
        if let Ok(s) = std::env::var("TABEX_LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(s));
        }
        if let Ok(s) = std::env::var("TABEX_LOG_LEVEL") {
            self.logging.level = Some(s);
        }
        if let Some(n) = std::env::var("TABEX_LOG_RETENTION").ok().and_then(|s| s.parse().ok()) {
            self.logging.retention = Some(n);
        }
    }

    fn resolve_relative_sources(&mut self, base: Option<&Path>) {
        let Some(base) = base else { return };
        for m in self.models.values_mut() {
            if let Some(src) = &m.source
                && src.is_relative()
            {
                m.source = Some(base.join(src));
            }
        }
    }

    #[must_use]
    pub fn with_model(mut self, name: &str, settings: ModelSettings) -> Self {
        self.models.insert(name.to_string(), settings);
        self
    }

    pub fn model(&self, name: &str) -> Option<&ModelSettings> {
        self.models.get(name)
    }

    /// Filename stem for `model`, falling back to the global default.
    pub fn filename_for(&self, model: &str) -> &str {
        self.model(model)
            .and_then(|m| m.filename.as_deref())
            .unwrap_or(&self.export.filename)
    }

    /// Checks the configuration for deployment mistakes.
    ///
    /// # Errors
    /// `Misconfigured` naming the first problem found.
    pub fn validate(&self) -> Result<(), ExportError> {
        self.export.default_format.parse::<ExportFormat>().map_err(|_| {
            ExportError::Misconfigured(format!(
                "export.default_format '{}' is not a supported format",
                self.export.default_format
            ))
        })?;
        check_stem("export.filename", &self.export.filename)?;
        for (name, m) in &self.models {
            if let Some(stem) = &m.filename {
                check_stem(&format!("models.\"{name}\".filename"), stem)?;
            }
            for (field, ops) in m.filters.iter().flatten() {
                if field.is_empty() {
                    return Err(ExportError::Misconfigured(format!(
                        "model {name} has an empty filter field"
                    )));
                }
                for op in ops {
                    op.parse::<Lookup>().map_err(|e| {
                        ExportError::Misconfigured(format!("model {name}, field {field}: {e}"))
                    })?;
                }
            }
        }
        Ok(())
    }
}

fn check_stem(what: &str, stem: &str) -> Result<(), ExportError> {
    let bad = stem.is_empty()
        || stem.chars().any(|c| c.is_control() || matches!(c, '"' | '/' | '\\' | ';'));
    if bad {
        return Err(ExportError::Misconfigured(format!("{what} '{stem}' is not a usable file name")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[server]
bind = "0.0.0.0:9000"

[export]
default_format = "csv"

[models."app.simple"]

[models."app.related"]
source = "related.ndjson"
filename = "related"
[models."app.related".filters]
simple__title = ["exact", "iexact"]
"#;

    #[test]
    fn parses_models_and_defaults() {
        let cfg = ExportConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
        assert_eq!(cfg.export.default_format, "csv");
        assert_eq!(cfg.export.filename, "export");
        assert!(cfg.model("app.simple").unwrap().filters.is_none());
        let related = cfg.model("app.related").unwrap();
        assert_eq!(
            related.allowed_lookups("simple__title").unwrap(),
            &["exact".to_string(), "iexact".to_string()]
        );
        assert_eq!(cfg.filename_for("app.related"), "related");
        assert_eq!(cfg.filename_for("app.simple"), "export");
        cfg.validate().unwrap();
    }

    #[test]
    fn load_resolves_sources_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = ExportConfig::load(&path).unwrap();
        assert_eq!(
            cfg.model("app.related").unwrap().source.as_deref(),
            Some(dir.path().join("related.ndjson").as_path())
        );
    }

    #[test]
    fn validate_rejects_unknown_lookups_and_formats() {
        let cfg = ExportConfig::default().with_model("m", ModelSettings::default().allow("name", ["like"]));
        assert!(matches!(cfg.validate(), Err(ExportError::Misconfigured(_))));

        let mut cfg = ExportConfig::default();
        cfg.export.default_format = "pdf".into();
        assert!(matches!(cfg.validate(), Err(ExportError::Misconfigured(_))));

        let mut cfg = ExportConfig::default();
        cfg.export.filename = "a\r\nb".into();
        assert!(matches!(cfg.validate(), Err(ExportError::Misconfigured(_))));
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(ExportConfig::from_toml_str("[models"), Err(ExportError::Config(_))));
    }

    #[test]
    fn discover_with_missing_explicit_path_fails() {
        let r = ExportConfig::discover(Some(Path::new("/definitely/not/here/tabex.toml")));
        assert!(matches!(r, Err(ExportError::Io(_))));
    }

    #[test]
    fn discover_reports_the_loaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[export]\nfilename = \"dump\"\n").unwrap();
        let (cfg, source) = ExportConfig::discover(Some(&path)).unwrap();
        assert_eq!(source.as_deref(), Some(path.as_path()));
        assert_eq!(cfg.export.filename, "dump");
    }
}
