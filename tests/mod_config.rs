use std::path::PathBuf;
use std::sync::Arc;
use tabex::{ExportConfig, GenericExporter, engine_from_config};

fn fixture_config() -> ExportConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tabex.toml");
    let cfg = ExportConfig::load(&path).unwrap();
    cfg.validate().unwrap();
    cfg
}

fn exporter() -> GenericExporter {
    let cfg = fixture_config();
    let engine = engine_from_config(&cfg).unwrap();
    GenericExporter::new(Arc::new(cfg), engine)
}

fn first_column(ex: &GenericExporter, model: &str, params: &[(&str, &str)]) -> Vec<String> {
    let resp = ex.export(model, params.iter().copied()).unwrap();
    let text = String::from_utf8(resp.body).unwrap();
    text.lines().skip(1).map(|l| l.split(',').next().unwrap_or("").to_string()).collect()
}

#[test]
fn sources_are_seeded_per_model() {
    let cfg = fixture_config();
    let engine = engine_from_config(&cfg).unwrap();
    assert_eq!(engine.list_collection_names(), vec!["app.owned", "app.simple", "app.widget"]);
    assert_eq!(engine.get_collection("app.widget").unwrap().len(), 4);
    assert_eq!(engine.get_collection("app.owned").unwrap().len(), 3);
}

#[test]
fn numeric_lookups_coerce_query_text() {
    let ex = exporter();
    assert_eq!(first_column(&ex, "app.widget", &[("qty__gte", "5")]), vec!["bar", "Foobar"]);
    assert_eq!(first_column(&ex, "app.widget", &[("qty__range", "3,7")]), vec!["foo", "bar"]);
    assert_eq!(first_column(&ex, "app.widget", &[("qty__isnull", "true")]), vec!["baz"]);
}

#[test]
fn filters_combine_as_conjunction() {
    let ex = exporter();
    assert_eq!(first_column(&ex, "app.widget", &[("name__icontains", "foo")]), vec!["foo", "Foobar"]);
    assert_eq!(
        first_column(&ex, "app.widget", &[("name__icontains", "foo"), ("qty__gte", "5")]),
        vec!["Foobar"]
    );
    assert_eq!(
        first_column(&ex, "app.widget", &[("color__in", "red,green")]),
        vec!["foo", "Foobar", "baz"]
    );
}

#[test]
fn nested_paths_and_model_filename() {
    let ex = exporter();
    let resp = ex.export("app.owned", [("owner__name__iexact", "ada")]).unwrap();
    assert_eq!(resp.filename, "owned.csv");
    assert_eq!(resp.rows, 1);
    assert_eq!(first_column(&ex, "app.owned", &[("owner__age__gt", "40")]), vec!["second"]);
}

#[test]
fn bad_lookup_values_are_client_errors() {
    let ex = exporter();
    let err = ex.export("app.widget", [("qty__range", "3")]).unwrap_err();
    assert_eq!(err.status_code(), 400);
    let err = ex.export("app.widget", [("qty__isnull", "maybe")]).unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn model_without_filter_table_rejects_filters() {
    let err = exporter().export("app.simple", [("name", "foo")]).unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn validate_flags_unknown_configured_lookup() {
    let cfg = ExportConfig::from_toml_str(
        r#"
[models."app.widget".filters]
name = ["exact", "sounds_like"]
"#,
    )
    .unwrap();
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("sounds_like"));
}

fn write_config(dir: &std::path::Path, toml: &str) -> ExportConfig {
    std::fs::write(dir.join("rows.txt"), "{\"n\":1}\n{broken\n{\"n\":2}\n").unwrap();
    std::fs::write(dir.join("plain.csv"), "1,x\n2,y\n").unwrap();
    let path = dir.join("tabex.toml");
    std::fs::write(&path, toml).unwrap();
    let cfg = ExportConfig::load(&path).unwrap();
    cfg.validate().unwrap();
    cfg
}

#[test]
fn import_settings_flow_from_model_tables() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(
        dir.path(),
        r#"
[models."app.rows"]
source = "rows.txt"
format = "ndjson"

[models."app.plain"]
source = "plain.csv"
has_headers = false
type_infer = false
"#,
    );
    let engine = tabex::Engine::new();
    let loaded = tabex::import::load_sources(&engine, &cfg).unwrap();
    let rows = loaded.iter().find(|(m, _)| m == "app.rows").unwrap();
    assert_eq!((rows.1.inserted, rows.1.skipped), (2, 1));
    let plain = engine.get_collection("app.plain").unwrap().get_all_documents();
    assert_eq!(plain[0].data.get_str("field_0").unwrap(), "1");
}

#[test]
fn strict_model_fails_the_load_on_a_bad_row() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(
        dir.path(),
        r#"
[models."app.rows"]
source = "rows.txt"
format = "ndjson"
skip_errors = false
"#,
    );
    let err = engine_from_config(&cfg).unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("app.rows"));
}

#[test]
fn unknown_source_format_is_a_config_error() {
    let err = ExportConfig::from_toml_str(
        r#"
[models."app.rows"]
format = "parquet"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, tabex::ExportError::Config(_)));
}
