// ── Transport selection ──

use crate::model::{Platform, TransportClass};

/// Transport class a platform is reached over. Total over [`Platform`].
pub fn select(platform: Platform) -> TransportClass {
    match platform {
        Platform::Frr | Platform::Bird => TransportClass::Rest,
        Platform::Arista
        | Platform::CiscoIos
        | Platform::CiscoNxos
        | Platform::CiscoXr
        | Platform::Huawei
        | Platform::Juniper => TransportClass::Scrape,
    }
}
