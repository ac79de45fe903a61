use std::sync::Arc;

use crate::error::{RecipeError, Result};
use crate::formatter::format_recipe;
use crate::models::{AnalysisRequest, AnalysisResponse};
use crate::services::RecipeModel;

/// Status code and JSON body produced for one bridge request.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeReply {
    pub status: u16,
    pub body: AnalysisResponse,
}

impl BridgeReply {
    /// JSON error reply for `err`, with a generic message if it has none.
    pub fn from_error(err: &RecipeError) -> Self {
        let message = err.to_string();
        Self {
            status: err.status_code(),
            body: AnalysisResponse::error(if message.is_empty() {
                "Failed to analyze image".to_string()
            } else {
                message
            }),
        }
    }
}

/// Turns one uploader request into one model call.
pub struct AnalyzeHandler {
    model: Arc<dyn RecipeModel>,
}

impl AnalyzeHandler {
    pub fn new(model: Arc<dyn RecipeModel>) -> Self {
        Self { model }
    }

    /// Handle a raw request. Never fails: every error becomes a JSON reply.
    pub async fn handle(&self, method: &str, body: &str) -> BridgeReply {
        match self.analyze(method, body).await {
            Ok(recipe) => {
                let html = format_recipe(&recipe);
                BridgeReply {
                    status: 200,
                    body: AnalysisResponse::Recipe {
                        recipe,
                        html: Some(html),
                    },
                }
            }
            Err(err) => {
                if err.status_code() >= 500 {
                    log::error!("❌ Recipe analysis failed: {}", err);
                } else {
                    log::warn!("⚠️ Rejected analysis request: {}", err);
                }
                BridgeReply::from_error(&err)
            }
        }
    }

    async fn analyze(&self, method: &str, body: &str) -> Result<String> {
        if !method.eq_ignore_ascii_case("POST") {
            return Err(RecipeError::MethodNotAllowed);
        }

        let request: AnalysisRequest =
            serde_json::from_str(body).map_err(|e| RecipeError::InvalidBody(e.to_string()))?;

        let image = request
            .image
            .as_deref()
            .filter(|image| !image.is_empty())
            .ok_or(RecipeError::MissingImage)?;

        log::info!(
            "📸 Analysis request: {} base64 chars, mime type {:?}",
            image.len(),
            request.mime_type
        );

        self.model
            .generate_recipe(image, request.mime_type.as_deref())
            .await
    }
}
