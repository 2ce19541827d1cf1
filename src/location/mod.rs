/// Location (tenant) management

mod manager;

pub use manager::LocationManager;

use serde::{Deserialize, Serialize};

/// Location creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
}
