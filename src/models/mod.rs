use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Body the uploader POSTs to the bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Base64 payload without the `data:` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl AnalysisRequest {
    pub fn new(image: String, mime_type: impl Into<String>) -> Self {
        Self {
            image: Some(image),
            mime_type: Some(mime_type.into()),
        }
    }
}

/// Body the bridge answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Recipe {
        recipe: String,
        /// Formatted rendering of `recipe`, for the served upload page.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
    },
    Error {
        error: String,
    },
}

impl AnalysisResponse {
    pub fn error(message: impl Into<String>) -> Self {
        AnalysisResponse::Error {
            error: message.into(),
        }
    }
}

/// Build `data:<mime>;base64,<payload>`.
pub fn data_url(mime_type: &str, base64_payload: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_payload)
}
