// ── Command and payload construction ──

use std::collections::HashMap;

use serde_json::json;

use crate::error::CoreError;
use crate::model::{Afi, DeviceConfig, Platform, QueryType, TransportClass};

/// What gets sent to a device.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single CLI command for the scrape transport.
    Command(String),
    /// Request body for the REST transport.
    Json(serde_json::Value),
}

/// Renders a query into the payload a device understands.
pub trait CommandBuilder: Send + Sync {
    fn build(
        &self,
        device: &DeviceConfig,
        transport: TransportClass,
        query_type: QueryType,
        target: &str,
    ) -> Result<Payload, CoreError>;
}

/// Per-platform template overrides, keyed by query type.
pub type CommandOverrides = HashMap<Platform, HashMap<QueryType, String>>;

/// Builds commands from built-in vendor templates, with per-platform
/// overrides. `{target}` in a template is replaced with the query target.
#[derive(Debug, Clone, Default)]
pub struct TemplateCommandBuilder {
    overrides: CommandOverrides,
}

impl TemplateCommandBuilder {
    pub fn new(overrides: CommandOverrides) -> Self {
        Self { overrides }
    }

    fn template(&self, platform: Platform, query_type: QueryType, afi: Afi) -> Option<&str> {
        self.overrides
            .get(&platform)
            .and_then(|per_type| per_type.get(&query_type))
            .map(String::as_str)
            .or_else(|| builtin(platform, query_type, afi))
    }
}

impl CommandBuilder for TemplateCommandBuilder {
    fn build(
        &self,
        device: &DeviceConfig,
        transport: TransportClass,
        query_type: QueryType,
        target: &str,
    ) -> Result<Payload, CoreError> {
        let afi = Afi::of_target(target);
        match transport {
            TransportClass::Rest => Ok(Payload::Json(json!({
                "query_type": query_type.to_string(),
                "afi": afi.to_string(),
                "target": target,
            }))),
            TransportClass::Scrape => {
                let template = self.template(device.platform, query_type, afi).ok_or_else(|| {
                    CoreError::Build {
                        platform: device.platform,
                        query_type,
                        message: "no command template".into(),
                    }
                })?;
                Ok(Payload::Command(template.replace("{target}", target)))
            }
        }
    }
}

/// Vendor command for a query; IPv6 targets get the IPv6 form where the
/// syntax differs, everything else uses the IPv4 (or family-neutral) form.
fn builtin(platform: Platform, query_type: QueryType, afi: Afi) -> Option<&'static str> {
    use QueryType::{BgpAspath, BgpCommunity, BgpRoute, Ping, Traceroute};

    let (v4, v6) = match (platform, query_type) {
        (Platform::CiscoIos, BgpRoute) => (
            "show bgp ipv4 unicast {target} | exclude pathid:|Epoch",
            "show bgp ipv6 unicast {target} | exclude pathid:|Epoch",
        ),
        (Platform::CiscoIos, BgpCommunity) => {
            ("show bgp all community {target} | exclude pathid:|Epoch", "")
        }
        (Platform::CiscoIos, BgpAspath) => (
            "show bgp all quote-regexp \"{target}\" | exclude pathid:|Epoch",
            "",
        ),
        (Platform::CiscoIos, Ping) => ("ping {target} repeat 5", "ping ipv6 {target} repeat 5"),
        (Platform::CiscoIos, Traceroute) => (
            "traceroute {target} timeout 1 probe 2",
            "traceroute ipv6 {target} timeout 1 probe 2",
        ),

        (Platform::CiscoXr, BgpRoute) => (
            "show bgp ipv4 unicast {target}",
            "show bgp ipv6 unicast {target}",
        ),
        (Platform::CiscoXr, BgpCommunity) => ("show bgp all unicast community {target}", ""),
        (Platform::CiscoXr, BgpAspath) => ("show bgp all unicast regexp {target}", ""),
        (Platform::CiscoXr, Ping) => ("ping ipv4 {target} count 5", "ping ipv6 {target} count 5"),
        (Platform::CiscoXr, Traceroute) => (
            "traceroute ipv4 {target} timeout 1 probe 2",
            "traceroute ipv6 {target} timeout 1 probe 2",
        ),

        (Platform::CiscoNxos, BgpRoute) => (
            "show bgp ipv4 unicast {target}",
            "show bgp ipv6 unicast {target}",
        ),
        (Platform::CiscoNxos, BgpCommunity) => ("show bgp ipv4 unicast community {target}", ""),
        (Platform::CiscoNxos, BgpAspath) => (
            "show bgp ipv4 unicast regexp \"{target}\"",
            "",
        ),
        (Platform::CiscoNxos, Ping) => ("ping {target} count 5", "ping6 {target} count 5"),
        (Platform::CiscoNxos, Traceroute) => ("traceroute {target}", "traceroute6 {target}"),

        (Platform::Arista, BgpRoute) => ("show ip bgp {target}", "show ipv6 bgp {target}"),
        (Platform::Arista, BgpCommunity) => ("show ip bgp community {target}", ""),
        (Platform::Arista, BgpAspath) => ("show ip bgp regexp {target}", ""),
        (Platform::Arista, Ping) => ("ping ip {target} repeat 5", "ping ipv6 {target} repeat 5"),
        (Platform::Arista, Traceroute) => ("traceroute ip {target}", "traceroute ipv6 {target}"),

        (Platform::Juniper, BgpRoute) => (
            "show route protocol bgp table inet.0 {target} detail",
            "show route protocol bgp table inet6.0 {target} detail",
        ),
        (Platform::Juniper, BgpCommunity) => {
            ("show route protocol bgp community {target} detail", "")
        }
        (Platform::Juniper, BgpAspath) => {
            ("show route protocol bgp aspath-regex \"{target}\"", "")
        }
        (Platform::Juniper, Ping) => ("ping inet {target} count 5", "ping inet6 {target} count 5"),
        (Platform::Juniper, Traceroute) => (
            "traceroute inet {target} wait 1",
            "traceroute inet6 {target} wait 1",
        ),

        (Platform::Huawei, BgpRoute) => (
            "display bgp routing-table {target}",
            "display bgp ipv6 routing-table {target}",
        ),
        (Platform::Huawei, BgpCommunity) => ("display bgp routing-table community {target}", ""),
        (Platform::Huawei, BgpAspath) => {
            ("display bgp routing-table regular-expression {target}", "")
        }
        (Platform::Huawei, Ping) => ("ping -c 5 {target}", "ping ipv6 -c 5 {target}"),
        (Platform::Huawei, Traceroute) => ("tracert {target}", "tracert ipv6 {target}"),

        (Platform::Frr | Platform::Bird, _) => return None,
    };

    match afi {
        Afi::Ipv6 if !v6.is_empty() => Some(v6),
        _ => Some(v4),
    }
}
