//! CLI Entry Point for odin-dashboard
//!
//! Provides command-line interface for:
//! - Running the dashboard against an odin-control server (or a mock fixture)
//! - Rendering one adapter page from a local metadata file
//! - Printing the effective configuration
//!
//! # Usage
//!
//! Run against a server, streaming patches as JSON lines on stdout:
//! ```bash
//! odin-dashboard run --config config/dashboard.toml --out page.html
//! ```
//!
//! Run against a fixture, no server needed:
//! ```bash
//! odin-dashboard run --mock demos/lpdpower.json
//! ```
//!
//! Document events are read from stdin, one JSON object per line:
//! ```text
//! {"adapter": "lpdpower", "kind": "click", "target": "component-7"}
//! {"kind": "input", "target": "component-9-input", "value": "3.5"}
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use odin_dashboard::config::DashboardConfig;
use odin_dashboard::dom::{Document, PatchDocument, UiEvent};
use odin_dashboard::transport::{HttpTransport, MockTransport, Transport};
use odin_dashboard::{logging, metadata, App, Tree, WidgetRegistry};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "odin-dashboard")]
#[command(about = "Metadata-driven dashboard for odin-control adapters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every adapter page and poll until Ctrl+C
    Run {
        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Serve adapters from a JSON fixture instead of a server
        #[arg(long)]
        mock: Option<PathBuf>,

        /// Write the assembled page HTML here after mounting
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Render one adapter page from a metadata file and print the HTML
    Render {
        /// Metadata JSON file
        #[arg(long)]
        metadata: PathBuf,

        /// Page title (defaults to the humanized file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// A document event read from stdin.
#[derive(Deserialize)]
struct InboundEvent {
    /// Target adapter; the current one when absent.
    adapter: Option<String>,
    #[serde(flatten)]
    event: UiEvent,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, mock, out } => run_dashboard(config, mock, out).await,
        Commands::Render { metadata, name } => render_page(&metadata, name),
        Commands::Config { config } => print_config(config),
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    let config = match path {
        Some(path) => DashboardConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DashboardConfig::load()?,
    };
    Ok(config)
}

async fn run_dashboard(
    config_path: Option<PathBuf>,
    mock: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;

    let mock = match &mock {
        Some(path) => Some(
            MockTransport::from_fixture(path)
                .with_context(|| format!("loading fixture {}", path.display()))?,
        ),
        None => None,
    };
    if let Some(mock) = &mock {
        if config.adapters.is_empty() {
            config.adapters = mock.adapter_names().await;
        }
    }

    config.validate()?;
    logging::init_from_config(&config)?;

    let transport: Arc<dyn Transport> = match mock {
        Some(mock) => Arc::new(mock),
        None => Arc::new(HttpTransport::from_config(&config)?),
    };

    eprintln!("🚀 {}", config.application.name);
    eprintln!("   Adapters: {}", config.adapters.join(", "));

    let mut app = App::from_config(transport, &config);
    let loaded = app.load(&config.adapters).await?;
    if loaded == 0 {
        bail!("No adapter metadata could be fetched");
    }

    if let Some(out) = &out {
        tokio::fs::write(out, app.page_html().await).await?;
        info!(path = %out.display(), "Page written");
    }

    app.start_polling();
    eprintln!("📡 Polling every {:?} - Press Ctrl+C to stop", app.poll_delay());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut flush = tokio::time::interval(config.poll_delay());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => handle_line(&app, &line).await,
                None => stdin_open = false,
            },
            _ = flush.tick() => {
                for patch in app.drain_patches().await {
                    println!("{}", serde_json::to_string(&patch)?);
                }
                if let Some(banner) = app.banner_text().await {
                    warn!(banner = %banner, "Error banner shown");
                }
            }
        }
    }

    app.stop().await;
    eprintln!("\n👋 Dashboard shutting down...");
    Ok(())
}

async fn handle_line(app: &App, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let inbound: InboundEvent = match serde_json::from_str(line) {
        Ok(inbound) => inbound,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed event line");
            return;
        }
    };
    let Some(adapter) = inbound.adapter.as_deref().or(app.current()) else {
        warn!("Event without adapter and no adapter is shown");
        return;
    };
    if let Err(e) = app.handle_event(adapter, &inbound.event).await {
        warn!(adapter, error = %e, "Event rejected");
    }
}

fn render_page(path: &Path, name: Option<String>) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let meta: serde_json::Value = serde_json::from_str(&text)?;
    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map_or_else(|| "Adapter".to_string(), |stem| metadata::humanize(&stem.to_string_lossy()))
    });

    let mut tree = Tree::build(&WidgetRegistry::standard(), &name, &meta);
    let mut document = PatchDocument::new();
    tree.mount(&mut document)?;
    if !document.contains(&tree.root().binding()) {
        bail!("Rendered page is missing its root element");
    }
    println!("{}", document.markup());
    Ok(())
}

fn print_config(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path.as_deref())?;
    print!("{}", toml::to_string_pretty(&config)?);
    if let Err(e) = config.validate() {
        eprintln!("⚠️  {e}");
    }
    Ok(())
}
