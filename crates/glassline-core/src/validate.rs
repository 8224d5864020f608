// ── Target validation ──
//
// Runs before any transport is touched. A rejection carries a message that
// is safe to show to an untrusted caller.

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use thiserror::Error;

use crate::messages::{Messages, render};
use crate::model::{DeviceConfig, QueryType, status_code};

/// Longest AS path expression accepted.
const MAX_ASPATH_LEN: usize = 128;

/// Characters allowed in an AS path expression besides digits and whitespace.
const ASPATH_PUNCTUATION: &str = "^$_.*+?()[]|-";

const WELL_KNOWN_COMMUNITIES: &[&str] = &[
    "internet",
    "no-export",
    "no-advertise",
    "local-as",
    "no-export-subconfed",
];

/// Input refused by policy or syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Rejection {
    pub message: String,
    /// Terms a UI may highlight in the message.
    pub keywords: Vec<String>,
    pub status_code: u16,
}

/// Decides whether a target may be queried on a device.
pub trait Validator: Send + Sync {
    fn validate(
        &self,
        device: &DeviceConfig,
        query_type: QueryType,
        target: &str,
    ) -> Result<(), Rejection>;
}

/// Syntax and reachability checks for every built-in query type.
#[derive(Debug, Clone, Default)]
pub struct BasicValidator {
    messages: Messages,
}

impl BasicValidator {
    pub fn new(messages: Messages) -> Self {
        Self { messages }
    }

    fn reject(&self, template: &str, query_type: QueryType, target: &str, code: u16) -> Rejection {
        let qt = query_type.to_string();
        Rejection {
            message: render(template, &[("target", target), ("query_type", &qt)]),
            keywords: [target, qt.as_str()]
                .into_iter()
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect(),
            status_code: code,
        }
    }

    fn invalid(&self, query_type: QueryType, target: &str) -> Rejection {
        self.reject(
            &self.messages.invalid_target,
            query_type,
            target,
            status_code::INVALID,
        )
    }

    fn check_address(&self, query_type: QueryType, target: &str) -> Result<(), Rejection> {
        let allow_prefix = query_type == QueryType::BgpRoute;
        let address = parse_address(target, allow_prefix)
            .ok_or_else(|| self.invalid(query_type, target))?;
        if is_forbidden(address) {
            return Err(self.reject(
                &self.messages.not_allowed,
                query_type,
                target,
                status_code::NOT_ALLOWED,
            ));
        }
        Ok(())
    }
}

impl Validator for BasicValidator {
    fn validate(
        &self,
        device: &DeviceConfig,
        query_type: QueryType,
        target: &str,
    ) -> Result<(), Rejection> {
        let target = target.trim();
        if target.is_empty() {
            return Err(Rejection {
                message: self.messages.no_input.clone(),
                keywords: Vec::new(),
                status_code: status_code::INVALID,
            });
        }

        if !device.supports(query_type) {
            return Err(self.reject(
                &self.messages.not_enabled,
                query_type,
                target,
                status_code::NOT_ALLOWED,
            ));
        }

        if query_type.targets_address() {
            return self.check_address(query_type, target);
        }
        let well_formed = match query_type {
            QueryType::BgpCommunity => is_community(target),
            QueryType::BgpAspath => is_aspath(target),
            QueryType::BgpRoute | QueryType::Ping | QueryType::Traceroute => false,
        };
        if well_formed {
            Ok(())
        } else {
            Err(self.invalid(query_type, target))
        }
    }
}

/// Parse an address, or an `address/len` prefix when `allow_prefix` is set.
fn parse_address(target: &str, allow_prefix: bool) -> Option<IpAddr> {
    let (address, len) = match target.split_once('/') {
        Some((address, len)) if allow_prefix => (address, Some(len)),
        Some(_) => return None,
        None => (target, None),
    };
    let address: IpAddr = address.parse().ok()?;
    if let Some(len) = len {
        let len: u8 = parse_digits(len)?;
        let max = if address.is_ipv4() { 32 } else { 128 };
        if len > max {
            return None;
        }
    }
    Some(address)
}

fn is_forbidden(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => is_forbidden_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_forbidden_v4(v4),
            None => {
                v6.is_unspecified()
                    || v6.is_loopback()
                    || v6.is_multicast()
                    || v6.is_unicast_link_local()
            }
        },
    }
}

fn is_forbidden_v4(v4: Ipv4Addr) -> bool {
    v4.is_unspecified()
        || v4.is_loopback()
        || v4.is_multicast()
        || v4.is_link_local()
        || v4.is_broadcast()
}

/// Parse an unsigned decimal number. `str::parse` alone would accept a
/// leading `+`.
fn parse_digits<T: FromStr>(part: &str) -> Option<T> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Standard (`asn:value`, 16-bit parts), large (`a:b:c`, 32-bit parts) or
/// a well-known community name.
fn is_community(target: &str) -> bool {
    if WELL_KNOWN_COMMUNITIES.contains(&target.to_ascii_lowercase().as_str()) {
        return true;
    }
    let parts: Vec<&str> = target.split(':').collect();
    match parts.as_slice() {
        [asn, value] => {
            parse_digits::<u16>(asn).is_some() && parse_digits::<u16>(value).is_some()
        }
        [a, b, c] => [a, b, c].iter().all(|p| parse_digits::<u32>(p).is_some()),
        _ => false,
    }
}

fn is_aspath(target: &str) -> bool {
    target.len() <= MAX_ASPATH_LEN
        && target
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || ASPATH_PUNCTUATION.contains(c))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Platform;

    fn device(queries: &[QueryType]) -> DeviceConfig {
        DeviceConfig {
            location: "nyc1".into(),
            display_name: "New York".into(),
            address: "192.0.2.1".into(),
            port: 22,
            platform: Platform::CiscoIos,
            queries: queries.to_vec(),
            credential: "default".into(),
            proxy: None,
        }
    }

    fn all() -> DeviceConfig {
        device(&[
            QueryType::BgpRoute,
            QueryType::BgpCommunity,
            QueryType::BgpAspath,
            QueryType::Ping,
            QueryType::Traceroute,
        ])
    }

    fn check(query_type: QueryType, target: &str) -> Result<(), Rejection> {
        BasicValidator::default().validate(&all(), query_type, target)
    }

    #[test]
    fn empty_target_is_invalid() {
        let err = check(QueryType::BgpRoute, "   ").unwrap_err();
        assert_eq!(err.status_code, status_code::INVALID);
        assert_eq!(err.message, Messages::default().no_input);
    }

    #[test]
    fn disabled_query_type_is_not_allowed() {
        let err = BasicValidator::default()
            .validate(&device(&[QueryType::Ping]), QueryType::BgpRoute, "192.0.2.0/24")
            .unwrap_err();
        assert_eq!(err.status_code, status_code::NOT_ALLOWED);
        assert_eq!(err.message, "bgp_route is not enabled for this location.");
        assert!(err.keywords.contains(&"bgp_route".to_string()));
    }

    #[test]
    fn route_accepts_addresses_and_prefixes() {
        assert!(check(QueryType::BgpRoute, "198.51.100.0/24").is_ok());
        assert!(check(QueryType::BgpRoute, "2001:db8::/32").is_ok());
        assert!(check(QueryType::BgpRoute, "203.0.113.9").is_ok());
    }

    #[test]
    fn bad_prefix_length_is_invalid() {
        let err = check(QueryType::BgpRoute, "198.51.100.0/33").unwrap_err();
        assert_eq!(err.status_code, status_code::INVALID);
        assert!(check(QueryType::BgpRoute, "2001:db8::/129").is_err());
    }

    #[test]
    fn ping_refuses_prefixes() {
        let err = check(QueryType::Ping, "198.51.100.0/24").unwrap_err();
        assert_eq!(err.status_code, status_code::INVALID);
        assert!(check(QueryType::Traceroute, "2001:db8::1").is_ok());
    }

    #[test]
    fn local_addresses_are_not_allowed() {
        for target in [
            "127.0.0.1",
            "0.0.0.0",
            "224.0.0.5",
            "169.254.1.1",
            "::1",
            "fe80::1",
            "::ffff:127.0.0.1",
            "::ffff:224.0.0.5",
            "::ffff:0.0.0.0",
            "::ffff:169.254.1.1",
        ] {
            let err = check(QueryType::Ping, target).unwrap_err();
            assert_eq!(err.status_code, status_code::NOT_ALLOWED, "{target}");
            assert_eq!(err.message, format!("{target} is not allowed."));
        }
    }

    #[test]
    fn communities() {
        assert!(check(QueryType::BgpCommunity, "65000:1").is_ok());
        assert!(check(QueryType::BgpCommunity, "4200000000:1:2").is_ok());
        assert!(check(QueryType::BgpCommunity, "no-export").is_ok());
        assert!(check(QueryType::BgpCommunity, "70000:1").is_err());
        assert!(check(QueryType::BgpCommunity, "65000").is_err());
        assert!(check(QueryType::BgpCommunity, "show run").is_err());
    }

    #[test]
    fn mapped_public_addresses_are_allowed() {
        assert!(check(QueryType::Ping, "::ffff:198.51.100.7").is_ok());
    }

    #[test]
    fn signed_numbers_are_not_communities() {
        for target in ["+65000:+1", "65000:+1", "+1:2:3", "65000:", ":1", "-1:1"] {
            let err = check(QueryType::BgpCommunity, target).unwrap_err();
            assert_eq!(err.status_code, status_code::INVALID, "{target}");
        }
    }

    #[test]
    fn signed_prefix_length_is_invalid() {
        assert!(check(QueryType::BgpRoute, "198.51.100.0/+24").is_err());
        assert!(check(QueryType::BgpRoute, "198.51.100.0/").is_err());
    }

    #[test]
    fn aspath_allows_regex_characters_only() {
        assert!(check(QueryType::BgpAspath, "^65000_[0-9]+$").is_ok());
        assert!(check(QueryType::BgpAspath, ".* 174 .*").is_ok());
        let err = check(QueryType::BgpAspath, "65000; reload").unwrap_err();
        assert_eq!(err.status_code, status_code::INVALID);
        assert!(check(QueryType::BgpAspath, &"1".repeat(MAX_ASPATH_LEN + 1)).is_err());
    }
}
