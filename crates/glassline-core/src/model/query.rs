// ── Query domain types ──

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The fixed, pre-approved set of lookups a caller may request.
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
pub enum QueryType {
    #[strum(to_string = "bgp_route", serialize = "route")]
    #[serde(alias = "route")]
    BgpRoute,
    #[strum(to_string = "bgp_community", serialize = "community")]
    #[serde(alias = "community")]
    BgpCommunity,
    #[strum(to_string = "bgp_aspath", serialize = "as-path", serialize = "aspath")]
    #[serde(alias = "as-path", alias = "aspath")]
    BgpAspath,
    #[strum(to_string = "ping")]
    Ping,
    #[strum(to_string = "traceroute")]
    Traceroute,
}

impl QueryType {
    /// Query types whose output may interleave several address families.
    pub fn is_family_agnostic(self) -> bool {
        matches!(self, Self::BgpCommunity | Self::BgpAspath)
    }

    /// Query types whose target must be an IP address or prefix.
    pub fn targets_address(self) -> bool {
        matches!(self, Self::BgpRoute | Self::Ping | Self::Traceroute)
    }
}

/// Address family a target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Afi {
    Ipv4,
    Ipv6,
    /// Not an address (communities, AS path patterns).
    Dual,
}

impl Afi {
    /// Classify a target: a bare address or `address/len` prefix yields its
    /// family, anything else is [`Afi::Dual`].
    pub fn of_target(target: &str) -> Self {
        let address = target.split_once('/').map_or(target, |(addr, _)| addr);
        match address.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => Self::Ipv4,
            Ok(IpAddr::V6(_)) => Self::Ipv6,
            Err(_) => Self::Dual,
        }
    }
}

/// An accepted lookup request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    location: String,
    query_type: QueryType,
    target: String,
}

impl Query {
    /// Build a query; surrounding whitespace on the target is dropped so
    /// equivalent requests share a cache key.
    pub fn new(location: impl Into<String>, query_type: QueryType, target: impl AsRef<str>) -> Self {
        Self {
            location: location.into(),
            query_type,
            target: target.as_ref().trim().to_owned(),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn query_type_parses_canonical_and_short_names() {
        assert_eq!(QueryType::from_str("bgp_route").unwrap(), QueryType::BgpRoute);
        assert_eq!(QueryType::from_str("route").unwrap(), QueryType::BgpRoute);
        assert_eq!(QueryType::from_str("as-path").unwrap(), QueryType::BgpAspath);
        assert_eq!(QueryType::from_str("community").unwrap(), QueryType::BgpCommunity);
        assert!(QueryType::from_str("show run").is_err());
    }

    #[test]
    fn query_type_displays_canonical_name() {
        assert_eq!(QueryType::BgpAspath.to_string(), "bgp_aspath");
        assert_eq!(QueryType::Ping.to_string(), "ping");
    }

    #[test]
    fn only_community_and_aspath_are_family_agnostic() {
        assert!(QueryType::BgpCommunity.is_family_agnostic());
        assert!(QueryType::BgpAspath.is_family_agnostic());
        assert!(!QueryType::BgpRoute.is_family_agnostic());
        assert!(!QueryType::Ping.is_family_agnostic());
    }

    #[test]
    fn afi_classifies_targets() {
        assert_eq!(Afi::of_target("192.0.2.0/24"), Afi::Ipv4);
        assert_eq!(Afi::of_target("2001:db8::/32"), Afi::Ipv6);
        assert_eq!(Afi::of_target("2001:db8::1"), Afi::Ipv6);
        assert_eq!(Afi::of_target("65000:1"), Afi::Dual);
        assert_eq!(Afi::Ipv4.to_string(), "ipv4");
    }

    #[test]
    fn query_trims_target() {
        let q = Query::new("nyc1", QueryType::BgpRoute, "  192.0.2.0/24 \n");
        assert_eq!(q.target(), "192.0.2.0/24");
        assert_eq!(q, Query::new("nyc1", QueryType::BgpRoute, "192.0.2.0/24"));
    }
}
