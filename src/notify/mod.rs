/// Bulk notification
///
/// Templated per-recipient email dispatch with durable outcome records.
/// One recipient's failure never prevents attempting the rest.

mod dispatch;

pub use dispatch::BulkNotifier;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One bulk-send recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// Bulk send request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBulkRequest {
    pub template_id: Uuid,
    pub recipients: Vec<Recipient>,
}

/// Resend request for previously failed records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendFailedRequest {
    pub record_ids: Vec<Uuid>,
}

/// Per-batch outcome counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub sent: usize,
    pub failed: usize,
    /// Records that were missing or not eligible for resend
    pub skipped: usize,
}

/// Substitute every `{{name}}` occurrence with the recipient's name
///
/// No other placeholders are supported; anything else, including malformed
/// braces, is left verbatim.
pub fn render_placeholder(text: &str, name: &str) -> String {
    text.replace("{{name}}", name)
}
