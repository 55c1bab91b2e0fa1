use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use gl_processors::config::loader::load_or_default;
use gl_processors::lifecycle::startup::{self, StartupError};
use gl_processors::observability::logging;

#[derive(Parser)]
#[command(name = "gl-processors")]
#[command(about = "Broker and mock processors for the gateway message bus", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults plus environment overrides when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Fatal error");
            eprintln!("gl-processors: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = load_or_default(cli.config.as_deref())?;
    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.transport.bind_address(),
        processors = ?config.enabled_processors(),
        queue_group = %config.transport.queue_group,
        "gl-processors starting"
    );

    startup::run(config).await
}
