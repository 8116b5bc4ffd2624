use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stormwatch::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(
    name = "stormwatch",
    version,
    about = "Weather measurement analysis with severity-based alert fan-out",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format, overriding the configured one
    #[arg(long, global = true, value_parser = ["text", "json"])]
    log_format: Option<String>,

    /// TOML configuration file (environment variables are used otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server, alert bus consumer and optional weather poller
    Serve {
        /// Override the configured bind address
        #[arg(long)]
        bind: Option<String>,

        /// Poll the weather API regardless of configuration
        #[arg(long, default_value = "false")]
        poll: bool,
    },

    /// Run a JSON array of measurements through a local pipeline
    Analyze {
        /// Input file containing a JSON array of measurements
        #[arg(short, long)]
        input: PathBuf,

        /// Print alerts as JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Load and validate the configuration, then print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    // Command-line flags win over the [logging] section
    setup_tracing(&config.logging.with_overrides(cli.verbose, cli.log_format.as_deref()));

    tracing::info!("stormwatch starting");

    match cli.command {
        Commands::Serve { bind, poll } => commands::serve(config, bind, poll).await?,
        Commands::Analyze { input, json } => commands::analyze(config, &input, json).await?,
        Commands::CheckConfig => commands::check_config(&config)?,
    }

    Ok(())
}

fn setup_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_new(logging.filter_directive())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stormwatch=info,warn"));

    if logging.is_json() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
