//! CLI for the Courier OpenCTI connector shell.
//!
//! Flow: resolve config (env > config.yml > defaults) -> platform client ->
//! harness loop. `check-config` stops after validation.

use clap::{Parser, Subcommand};
use courier_core::config::ConnectorConfig;
use courier_platform::OpenCtiClient;
use courier_runtime::{AuditSink, Harness, Heartbeat};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "courier", version, about = "OpenCTI connector runtime shell")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the connector loop.
    Run {
        /// Optional config.yml supplementing the environment.
        #[arg(short, long, env = "COURIER_CONFIG")]
        config: Option<PathBuf>,

        /// Run a single cycle and exit.
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Audit output: "ndjson" writes NDJSON to stdout,
        /// "ndjson:/path/to/file" appends to file.
        #[arg(long)]
        audit: Option<String>,
    },

    /// Resolve and validate the configuration, then print it with secrets
    /// redacted. Exits non-zero when a mandatory variable is missing.
    CheckConfig {
        #[arg(short, long, env = "COURIER_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            once,
            audit,
        } => {
            // 1. Resolve configuration before anything else; the log level
            //    fallback comes from it.
            let config = ConnectorConfig::load(config.as_deref())?;

            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                        |_| {
                            tracing_subscriber::EnvFilter::new(
                                config.connector.log_level.as_filter(),
                            )
                        },
                    ),
                )
                .init();

            tracing::info!(
                connector = %config.connector.name,
                id = %config.connector.id,
                scope = ?config.connector.scope,
                once,
                "starting courier"
            );

            // 2. Platform client (bearer auth, optional proxy).
            let client = OpenCtiClient::connect(&config.opencti, config.proxy.as_ref())?;

            // 3. Optional audit sink.
            let sink = match audit.as_deref() {
                None => None,
                Some("ndjson") => Some(AuditSink::new(
                    Box::new(std::io::stdout()) as Box<dyn Write + Send>
                )),
                Some(spec) => {
                    if let Some(path) = spec.strip_prefix("ndjson:") {
                        let file = std::fs::OpenOptions::new()
                            .create(true)
                            .append(true)
                            .open(path)?;
                        Some(AuditSink::new(Box::new(file) as Box<dyn Write + Send>))
                    } else {
                        return Err(format!(
                            "Unknown audit spec: {spec}. Use 'ndjson' or 'ndjson:/path'"
                        )
                        .into());
                    }
                }
            };

            // 4. Harness loop.
            let mut harness = Harness::new(config, Box::new(client), Box::new(Heartbeat));
            if let Some(sink) = sink {
                harness = harness.with_audit(sink);
            }
            harness.run(once).await?;
        }

        Commands::CheckConfig { config } => {
            let config = ConnectorConfig::load(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config.summary())?);
        }
    }

    Ok(())
}
