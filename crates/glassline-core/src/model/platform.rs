// ── Platform (NOS) types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How a device is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransportClass {
    /// Interactive SSH session.
    Scrape,
    /// HTTP request to a query agent.
    Rest,
}

/// Vendor network operating system of a device.
///
/// Unknown identifiers fail to parse, so unsupported platforms are rejected
/// when configuration is loaded rather than at dispatch time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Arista,
    CiscoIos,
    CiscoNxos,
    CiscoXr,
    Huawei,
    Juniper,
    Frr,
    Bird,
}

impl Platform {
    /// Path suffix of the query agent endpoint, for REST platforms.
    pub fn rest_path(self) -> Option<&'static str> {
        match self {
            Self::Frr => Some("frr"),
            Self::Bird => Some("bird"),
            _ => None,
        }
    }

    /// Marker that starts each address-family section in multi-family output.
    pub fn family_delimiter(self) -> Option<&'static str> {
        match self {
            Self::CiscoIos => Some("For address family: "),
            Self::CiscoXr => Some("Address Family: "),
            _ => None,
        }
    }
}
