//! `glassline cache` handlers.

use glassline_config::Config;

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(config: &Config, args: &CacheArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config.cache.file();
    match args.command {
        CacheCommand::Path => output::print_output(&path.display().to_string(), global.quiet),
        CacheCommand::Clear => {
            let engine = crate::build_engine(config)?;
            engine.clear_cache().await?;
            output::print_output(&format!("Cache cleared: {}", path.display()), global.quiet)
        }
    }
}
