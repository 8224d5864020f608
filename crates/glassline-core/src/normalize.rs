// ── Output normalization ──
//
// Community and AS path lookups on some platforms print one section per
// address family, plus a preamble and sometimes further families (VPNv4,
// L2VPN...). Only the first two sections, IPv4 then IPv6, are kept.

use crate::model::{Platform, QueryType};

/// Sections kept from multi-family output.
const MAX_SECTIONS: usize = 2;

/// Normalize raw device output. Identity for every platform without a
/// family delimiter and for every query type that targets an address.
///
/// When the delimiter never appears the output is returned unchanged.
pub fn normalize(platform: Platform, query_type: QueryType, raw: &str) -> String {
    if !query_type.is_family_agnostic() {
        return raw.to_owned();
    }
    let Some(delimiter) = platform.family_delimiter() else {
        return raw.to_owned();
    };

    let sections: Vec<String> = raw
        .split(delimiter)
        .skip(1)
        .take(MAX_SECTIONS)
        .map(|section| format!("{delimiter}{}", section.trim_end()))
        .collect();

    if sections.is_empty() {
        raw.to_owned()
    } else {
        sections.join("\n\n")
    }
}
