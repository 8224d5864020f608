mod cli;
mod commands;
mod error;
mod output;

use std::io;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use glassline_config::{Config, LogFormat, Logging, load_config};
use glassline_core::{Engine, FileStore};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;
    match command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "glassline", &mut io::stdout());
            Ok(())
        }

        // Config commands report load errors themselves
        Command::Config(args) => {
            let _guard = init_tracing(global.verbose, &Logging::default())?;
            commands::config_cmd::handle(&args, &global)
        }

        Command::Cache(args) => {
            let config = load_config(global.config.as_deref())?;
            let _guard = init_tracing(global.verbose, &config.logging)?;
            commands::cache::handle(&config, &args, &global).await
        }

        Command::Devices => {
            let config = load_config(global.config.as_deref())?;
            commands::devices::handle(&config, &global)
        }

        Command::Query(args) => {
            let config = load_config(global.config.as_deref())?;
            let _guard = init_tracing(global.verbose, &config.logging)?;
            let engine = build_engine(&config)?;
            commands::query::handle(&engine, &args, &global).await
        }

        Command::Batch(args) => {
            let config = load_config(global.config.as_deref())?;
            let _guard = init_tracing(global.verbose, &config.logging)?;
            let engine = build_engine(&config)?;
            commands::batch::handle(&engine, &args, &global).await
        }
    }
}

/// Build an engine whose cache lives in the configured results file, so
/// repeated invocations share hits within the TTL.
fn build_engine(config: &Config) -> Result<Engine, CliError> {
    let store = FileStore::new(config.cache.file());
    tracing::debug!(cache = %store.path().display(), "using results file");
    let engine = Engine::with_store(config.to_engine_config()?, Arc::new(store))?;
    tracing::debug!(devices = engine.registry().len(), "engine ready");
    Ok(engine)
}

/// Install the global subscriber: stderr in text or JSON, plus a daily
/// rolling file when a log directory is configured. `RUST_LOG` wins over
/// both `-v` and the configured level.
fn init_tracing(verbosity: u8, logging: &Logging) -> Result<Option<WorkerGuard>, CliError> {
    let level = match verbosity {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = match logging.format {
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
    };

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("glassline")
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| CliError::Logging {
                    reason: format!("{}: {e}", dir.display()),
                })?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}
