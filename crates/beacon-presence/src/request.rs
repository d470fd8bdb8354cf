use serde::{Deserialize, Serialize};

/// Image key published when a request supplies neither an explicit key nor a
/// placeholder for the large image slot.
pub const DEFAULT_LARGE_IMAGE: &str = "large_image_key";

/// Default image key for the small image slot.
pub const DEFAULT_SMALL_IMAGE: &str = "small_image_key";

/// What the user wants to publish. Owned by the caller; the session manager
/// reads it but never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRequest {
    /// Primary status line.
    pub details: Option<String>,
    /// Secondary status line.
    pub state: Option<String>,
    /// Text prepended to `details` (activity label or free-form custom text).
    /// Empty means no prefix.
    pub activity_prefix: String,
    pub large_image_key: Option<String>,
    pub large_image_text: Option<String>,
    pub small_image_key: Option<String>,
    pub small_image_text: Option<String>,
    /// Caller-declared fallback for the large image slot, tried before the
    /// hard-coded default when no explicit key is set.
    pub large_image_placeholder: String,
    /// Caller-declared fallback for the small image slot.
    pub small_image_placeholder: String,
    /// Attach a "started now" timestamp at publish time.
    pub show_start_timestamp: bool,
    /// Identifies the target application to the chat client. Must be
    /// non-empty before connect or publish is attempted.
    pub application_id: String,
}

impl PresenceRequest {
    /// Minimal request targeting the given application id.
    pub fn for_application(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            ..Self::default()
        }
    }
}
