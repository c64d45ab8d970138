use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::SiteId;

/// A named message crossing the host/client channel.
///
/// One direction, no acknowledgement expected; exists only for the
/// duration of a send. Serialized as a single JSON line on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Signal name (e.g., "navigate", "request-site")
    pub name: String,
    /// Positional payload values
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Message {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Payload of a correlated response forwarded to the host
/// (`request-site-response`, `enable-site-option-response`).
///
/// `site_id` always echoes the key of the originating request, even
/// when the observed response carried a different one; the mismatch is
/// reported through `error` instead of being dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub site_id: SiteId,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResponse {
    pub fn ok(site_id: SiteId, status: impl Into<String>) -> Self {
        Self {
            site_id,
            status: status.into(),
            error: None,
        }
    }

    pub fn err(site_id: SiteId, status: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            site_id,
            status: status.into(),
            error: Some(error.into()),
        }
    }
}

/// Completion payload raised on the internal surface once a store-side
/// operation finishes (site refresh, module activation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub site_id: SiteId,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Internal signal payload: the embedded editor failed to load for a
/// site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorFault {
    pub site_id: SiteId,
    /// Site origin URL
    pub origin: String,
    pub reason: String,
    pub editor_url: String,
    pub wp_admin_login_url: String,
}

/// Outbound payload of `cannot-use-editor`: the fault plus what the
/// current user is allowed to do about it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditorUnavailable {
    pub site_id: SiteId,
    pub reason: String,
    pub editor_url: String,
    pub wp_admin_login_url: String,
    pub origin: String,
    pub can_user_manage_options: bool,
}

/// Internal signal payload: a document should be handed to the host's
/// printer facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub title: String,
    pub contents: String,
}
