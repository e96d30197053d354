use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use geoplanilha::canvas::MapCanvas;
use geoplanilha::classify::classify;
use geoplanilha::config::AppConfig;
use geoplanilha::processing::{normalize, resolve_columns};
use geoplanilha::samples::{workbook_bytes, SampleKind};
use geoplanilha::store::MapStore;
use geoplanilha::{generate, load_sheet, RenderMode, RenderRequest, Theme};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a spreadsheet into an HTML map
    Render {
        input: PathBuf,
        /// tradicional, calor, circulos, coropletico or municipios
        #[arg(short, long, default_value = "tradicional")]
        mode: String,
        /// claro or escuro
        #[arg(short, long, default_value = "claro")]
        theme: String,
        /// Write here instead of the configured maps directory
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Show how a spreadsheet would be classified and cleaned
    Inspect { input: PathBuf },
    /// Serve the upload API
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Write an example spreadsheet (coordinates, states or municipalities)
    Sample { kind: String, output: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            mode,
            theme,
            output,
            config,
        } => {
            let app_config = AppConfig::load_or_default(&config)?;
            let request = RenderRequest::new(RenderMode::from_str(&mode), Theme::from_str(&theme));

            let boundaries = app_config.boundaries.source();
            let (map, html) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
                let sheet = load_sheet(&input)?;
                let map = generate(&sheet, request, &boundaries)?;
                let html = map.artifact.finalize()?;
                Ok((map, html))
            })
            .await??;

            if let Some(warning) = map.warning {
                warn!("{}", warning);
            }

            let path = match output {
                Some(path) => {
                    fs::write(&path, &html)
                        .with_context(|| format!("Failed to write map {:?}", path))?;
                    path
                }
                None => {
                    let store = MapStore::new(&app_config.output.maps_dir);
                    let name = store.save(map.effective_mode, request.theme, &html)?;
                    store.dir().join(name)
                }
            };

            println!(
                "{} map ({}) with {} {} records written to {}",
                map.effective_mode,
                request.theme.name(),
                map.record_count(),
                map.shape,
                path.display()
            );
        }
        Commands::Inspect { input } => {
            let sheet = load_sheet(&input)?;
            let shape = classify(sheet.headers());
            println!("Shape: {}", shape);

            let columns = resolve_columns(sheet.headers(), shape)?;
            for (field, column) in columns.fields() {
                println!("  {:<12} -> {}", field, column);
            }

            let dataset = normalize(&sheet)?;
            println!(
                "Records: {} of {} rows",
                dataset.records.len(),
                sheet.rows().len()
            );
            println!("Has quantity: {}", dataset.has_quantity);
        }
        Commands::Serve { config } => {
            info!("Serving with config: {:?}", config);
            let app_config = AppConfig::load_or_default(&config)?;
            geoplanilha::server::start_server(app_config).await?;
        }
        Commands::Sample { kind, output } => {
            let kind = SampleKind::from_str(&kind)
                .ok_or_else(|| anyhow!("unknown sample '{kind}'; use coordinates, states or municipalities"))?;
            let bytes = workbook_bytes(kind)?;
            fs::write(&output, bytes)
                .with_context(|| format!("Failed to write sample {:?}", output))?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}
