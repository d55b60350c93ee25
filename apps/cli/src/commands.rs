//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use screenlens_core::{AnalyzeOptions, Pipeline, ProgressReporter, normalize_image};
use screenlens_shared::{
    AnalysisResult, AppConfig, ScreenlensError, apply_env_overrides, init_config, load_config,
    load_config_from, validate_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// screenlens: read a screenshot, summarize it, and look up what it shows.
#[derive(Parser)]
#[command(
    name = "screenlens",
    version,
    about = "Screenshot OCR, English summaries and best-effort entity enrichment.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.screenlens/screenlens.toml.
    #[arg(long, global = true, env = "SCREENLENS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start the HTTP server (POST /analyze, GET /health).
    Serve {
        /// Bind address (overrides config).
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides config and PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze a local image file and print the JSON result.
    Analyze {
        /// Path to the image.
        path: PathBuf,

        /// Replace the default OCR/summary prompt.
        #[arg(long)]
        prompt: Option<String>,

        /// Skip entity extraction and provider lookups.
        #[arg(long)]
        no_enrich: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "screenlens=info,tower_http=info",
        1 => "screenlens=debug,tower_http=debug",
        _ => "screenlens=trace,tower_http=debug",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Serve { host, port } => cmd_serve(config_path, host, port).await,
        Command::Analyze {
            path,
            prompt,
            no_enrich,
        } => cmd_analyze(config_path, &path, prompt, !no_enrich).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config file, then apply env overrides and validate.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    info!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.vision.model,
        "starting server"
    );
    screenlens_server::serve(&config).await?;
    Ok(())
}

async fn cmd_analyze(
    config_path: Option<&Path>,
    path: &Path,
    prompt: Option<String>,
    enrich: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let pipeline = Pipeline::from_config(&config)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ScreenlensError::io(path, e))?;
    let filename = path.file_name().and_then(|n| n.to_str());
    let image = normalize_image(bytes, None, filename)?;

    info!(path = %path.display(), mime = %image.mime, enrich, "analyzing image");

    let options = AnalyzeOptions { prompt, enrich };
    let reporter = CliProgress::new();
    let result = pipeline
        .analyze_screenshot(&image, &options, &reporter)
        .await;
    if result.is_err() {
        reporter.spinner.finish_and_clear();
    }

    let json = serde_json::to_string_pretty(&result?)
        .map_err(|e| eyre!("failed to serialize result: {e}"))?;
    println!("{json}");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner on stderr; stdout stays clean for the JSON result.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &AnalysisResult) {
        self.spinner.finish_and_clear();
    }
}
