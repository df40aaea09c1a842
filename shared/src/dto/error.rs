//! # Error Response Body

use serde::{Deserialize, Serialize};

/// JSON body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// `true` when the same request may succeed if retried by the user.
    #[serde(default)]
    pub retryable: bool,
}
