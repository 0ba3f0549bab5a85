//! Request and response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /export`
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub template: String,
    pub file_name: String,
    #[serde(default)]
    pub data: Value,
}

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
