/// Email templates
///
/// Location-scoped templates whose subject/body carry a `{{name}}`
/// placeholder rendered per recipient at send time.

mod manager;

pub use manager::TemplateManager;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Template creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    pub subject: String,
    pub body: String,
    pub location_id: Uuid,
}
