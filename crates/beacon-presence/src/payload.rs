//! Wire payload construction.
//!
//! Pure projection from a [`PresenceRequest`] to the payload the transport
//! sends. All defaulting and prefixing rules live here so callers can also
//! run it as a cheap preview on every field edit.

use serde::{Deserialize, Serialize};

use crate::request::{PresenceRequest, DEFAULT_LARGE_IMAGE, DEFAULT_SMALL_IMAGE};

/// Wire-ready projection of a [`PresenceRequest`]. Derived by [`build`],
/// never hand-edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub details: Option<String>,
    pub state: Option<String>,
    pub large_image: String,
    pub small_image: String,
    pub large_text: Option<String>,
    pub small_text: Option<String>,
    /// Epoch seconds the activity started, when the request asked for one.
    pub start: Option<u64>,
}

/// Build the wire payload for a request. Deterministic given `now_epoch_secs`.
///
/// Image keys resolve explicit → placeholder → default constant. `details`
/// is only published when non-empty, with `activity_prefix` joined in front
/// (single space) when both are non-empty; a prefix alone is never published.
pub fn build(req: &PresenceRequest, now_epoch_secs: u64) -> PresencePayload {
    let details = req
        .details
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| {
            if req.activity_prefix.is_empty() {
                d.to_string()
            } else {
                format!("{} {d}", req.activity_prefix)
            }
        });

    PresencePayload {
        details,
        state: non_empty(req.state.as_deref()),
        large_image: resolve_image_key(
            req.large_image_key.as_deref(),
            &req.large_image_placeholder,
            DEFAULT_LARGE_IMAGE,
        ),
        small_image: resolve_image_key(
            req.small_image_key.as_deref(),
            &req.small_image_placeholder,
            DEFAULT_SMALL_IMAGE,
        ),
        large_text: non_empty(req.large_image_text.as_deref()),
        small_text: non_empty(req.small_image_text.as_deref()),
        start: req.show_start_timestamp.then_some(now_epoch_secs),
    }
}

/// Build with the current wall-clock time.
pub fn build_now(req: &PresenceRequest) -> PresencePayload {
    build(req, epoch_secs_now())
}

/// One-line human-readable summary of a request, for status displays.
///
/// Mirrors the payload's emptiness rules with "(no details)" / "(no state)"
/// stand-ins. When the request carries a timestamp, shows the recorded start
/// time if publishing already happened, else the current time (UTC clock).
pub fn summary(req: &PresenceRequest, start_epoch_secs: Option<u64>) -> String {
    let details = req
        .details
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("(no details)");
    let state = req
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("(no state)");

    let mut line = format!("{details} — {state}");
    if req.show_start_timestamp {
        let ts = start_epoch_secs.unwrap_or_else(epoch_secs_now);
        line.push_str(&format!(" • Started: {}", format_clock(ts)));
    }
    line
}

pub(crate) fn epoch_secs_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

fn resolve_image_key(explicit: Option<&str>, placeholder: &str, default: &str) -> String {
    match explicit.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => key.to_string(),
        None if !placeholder.trim().is_empty() => placeholder.trim().to_string(),
        None => default.to_string(),
    }
}

fn format_clock(epoch_secs: u64) -> String {
    let day = epoch_secs % 86_400;
    format!("{:02}:{:02}:{:02}", day / 3600, (day % 3600) / 60, day % 60)
}
