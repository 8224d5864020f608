//! Config subcommand handlers.

use serde::Serialize;

use glassline_config::{config_path, load_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Summary {
    path: String,
    devices: usize,
    credentials: usize,
    proxies: usize,
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = global.config.clone().unwrap_or_else(config_path);

    match args.command {
        ConfigCommand::Path => output::print_output(&path.display().to_string(), global.quiet),

        ConfigCommand::Check => {
            let cfg = load_config(global.config.as_deref())?;
            // Resolves every secret and cross-checks the registry.
            let engine = cfg.to_engine_config()?;
            let summary = Summary {
                path: path.display().to_string(),
                devices: engine.registry.len(),
                credentials: cfg.credentials.len(),
                proxies: cfg.proxies.len(),
            };
            let rendered = match global.output {
                OutputFormat::Json | OutputFormat::JsonCompact => {
                    serde_json::to_string_pretty(&summary)?
                }
                OutputFormat::Yaml => serde_yaml::to_string(&summary)?,
                OutputFormat::Table | OutputFormat::Plain => format!(
                    "Configuration OK: {}\n  devices:     {}\n  credentials: {}\n  proxies:     {}",
                    summary.path, summary.devices, summary.credentials, summary.proxies
                ),
            };
            output::print_output(&rendered, global.quiet)
        }

        ConfigCommand::Show => {
            let cfg = load_config(global.config.as_deref())?;
            output::print_output(&cfg.redacted().to_toml()?, global.quiet)
        }
    }
}
