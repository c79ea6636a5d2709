use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error envelope returned by every failing request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(message: String, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            message,
            errors,
        }
    }
}

/// Empty JSON object (`{}`) returned by operations with no payload
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EmptyResponse {}
