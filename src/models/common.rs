use serde::{Deserialize, Serialize};

use crate::prompt::PromptMode;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub provider_configured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptResponse {
    pub prompt: String,
    pub mode: PromptMode,
}

/// JSON form of a relay request, used when the browser sends the image as a
/// data URI instead of a multipart file.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateJsonRequest {
    pub prompt: Option<String>,
    pub image: Option<String>,
}
