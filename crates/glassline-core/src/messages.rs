// ── User-facing messages ──

use serde::{Deserialize, Serialize};

/// Text returned to callers. Internal detail never appears here; these
/// strings are the only thing an untrusted caller sees on failure.
///
/// `{target}` and `{query_type}` placeholders are substituted on render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Generic failure, used for every transport or build fault.
    pub general: String,
    pub no_input: String,
    pub invalid_target: String,
    pub not_allowed: String,
    pub not_enabled: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            general: "Something went wrong.".into(),
            no_input: "A target must be specified.".into(),
            invalid_target: "{target} is not a valid target for {query_type}.".into(),
            not_allowed: "{target} is not allowed.".into(),
            not_enabled: "{query_type} is not enabled for this location.".into(),
        }
    }
}

/// Substitute `{key}` placeholders in `template`.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_owned(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}
