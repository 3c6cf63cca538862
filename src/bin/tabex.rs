use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tabex::{ExportConfig, GenericExporter, engine_from_config, fsutil, logger, server};

#[derive(Parser, Debug)]
#[command(name = "tabex", version, about = "Filtered tabular exports over HTTP", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, global = true, help = "Path to a config file (TOML). Falls back to TABEX_CONFIG, then ./tabex.toml.")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Load model sources and serve GET /export/<model>/")]
    Serve {
        #[arg(long, help = "Listen address; overrides [server].bind and TABEX_BIND")]
        bind: Option<String>,
    },
    #[command(about = "Run one export offline and write it to a file")]
    Export {
        #[arg(help = "Model name as configured under [models]")]
        model: String,
        #[arg(long, help = "Output format; defaults to [export].default_format")]
        format: Option<String>,
        #[arg(long, help = "Output path; defaults to the export filename in the current directory")]
        out: Option<PathBuf>,
        #[arg(long = "filter", value_parser = parse_pair, help = "Filter as field__lookup=value; repeatable")]
        filters: Vec<(String, String)>,
    },
    #[command(name = "check-config", about = "Validate the configuration and load every source")]
    CheckConfig,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let (mut cfg, source) = ExportConfig::discover(cli.config.as_deref())?;
    if let Err(e) = logger::init_from_settings(&cfg.logging) {
        eprintln!("warning: logging disabled: {e}");
    }
    match &source {
        Some(p) => log::info!("config: loaded {}", p.display()),
        None => log::info!("config: no file found, using defaults"),
    }
    cfg.validate()?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(b) = bind {
                cfg.server.bind = b;
            }
            let engine = engine_from_config(&cfg)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(server::serve(Arc::new(cfg), engine))?;
        }
        Commands::Export { model, format, out, mut filters } => {
            if let Some(f) = format {
                filters.push(("format".to_string(), f));
            }
            let engine = engine_from_config(&cfg)?;
            let exporter = GenericExporter::new(Arc::new(cfg), engine);
            let resp = exporter.export(&model, filters.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
            let dest = out.unwrap_or_else(|| PathBuf::from(&resp.filename));
            fsutil::write_atomic(&dest, &resp.body)?;
            println!("wrote {} rows ({}) to {}", resp.rows, resp.content_type, dest.display());
        }
        Commands::CheckConfig => {
            let engine = engine_from_config(&cfg)?;
            for (name, settings) in &cfg.models {
                let rows = engine.get_collection(name).map(|c| c.len());
                let filters = settings.filters.as_ref().map_or(0, |f| f.len());
                match rows {
                    Some(n) => println!("{name}: {n} records, {filters} filterable fields"),
                    None => println!("{name}: no source, {filters} filterable fields (not servable)"),
                }
            }
            println!("configuration ok");
        }
    }
    Ok(())
}
