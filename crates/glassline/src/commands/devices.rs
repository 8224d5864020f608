//! `glassline devices` handler.

use tabled::Tabled;

use glassline_config::Config;
use glassline_core::DeviceConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Transport")]
    transport: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Proxy")]
    proxy: String,
    #[tabled(rename = "Queries")]
    queries: String,
}

impl From<&DeviceConfig> for DeviceRow {
    fn from(d: &DeviceConfig) -> Self {
        Self {
            location: d.location.clone(),
            name: d.display_name.clone(),
            platform: d.platform.to_string(),
            transport: d.transport().to_string(),
            address: format!("{}:{}", d.address, d.port),
            proxy: d.proxy.clone().unwrap_or_else(|| "-".into()),
            queries: d
                .queries
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

pub fn handle(config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = config.device_configs();
    let rendered = output::render_list(
        global.output,
        &devices,
        |d| DeviceRow::from(d),
        |d| d.location.clone(),
    )?;
    output::print_output(&rendered, global.quiet)
}
