use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::RecipeModel;
use crate::config::Config;
use crate::error::{RecipeError, Result};
use crate::models::{data_url, DEFAULT_MIME_TYPE};

pub const MODEL: &str = "gpt-4o-mini";
pub const MAX_TOKENS: u32 = 1500;

pub const RECIPE_PROMPT: &str = "Analyze this image of a dish and provide a detailed recipe. \
     Answer in Hebrew only. Include:\n\
     \n\
     1. The name of the dish\n\
     2. A brief history of the dish and where it comes from\n\
     3. A list of ingredients with measurements\n\
     4. Step-by-step cooking instructions\n\
     5. Estimated preparation and cooking time\n\
     6. Number of servings\n\
     \n\
     Format the response clearly with headers (using ##) for each section.";

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// OpenAI chat-completions client for recipe generation.
pub struct OpenAiVisionService {
    api_key: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl OpenAiVisionService {
    pub fn new(api_key: Option<String>, api_base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecipeError::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base: api_base.into(),
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_key.clone(), config.api_base.clone(), config.timeout)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn build_request(image_base64: &str, mime_type: Option<&str>) -> ChatRequest {
        let mime_type = mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);

        ChatRequest {
            model: MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        content_type: "text".to_string(),
                        text: RECIPE_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        content_type: "image_url".to_string(),
                        image_url: ImageData {
                            url: data_url(mime_type, image_base64),
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
        }
    }

    /// Map a non-success reply to its `error.message`, or a generic one.
    fn upstream_error(body: &str) -> RecipeError {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "OpenAI API error".to_string());
        RecipeError::Upstream(message)
    }

    fn extract_completion(body: &str) -> Result<String> {
        let response: ChatResponse =
            serde_json::from_str(body).map_err(|_| RecipeError::MalformedResponse)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or(RecipeError::NoCompletion)
    }
}

fn transport_error(e: reqwest::Error) -> RecipeError {
    if e.is_timeout() {
        RecipeError::Timeout
    } else {
        RecipeError::Connection
    }
}

#[async_trait::async_trait]
impl RecipeModel for OpenAiVisionService {
    async fn generate_recipe(&self, image_base64: &str, mime_type: Option<&str>) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            log::error!("❌ OPENAI_KEY is not set, refusing to call the model");
            RecipeError::NotConfigured
        })?;

        let request = Self::build_request(image_base64, mime_type);

        log::info!("🤖 Sending recipe request to OpenAI with model: {}", MODEL);
        log::debug!("📊 Image payload: {} base64 chars", image_base64.len());

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ OpenAI request failed: {}", e);
                transport_error(e)
            })?;

        let status = response.status();
        log::debug!("📥 OpenAI response status: {}", status);

        let body = response.text().await.map_err(transport_error)?;
        log::debug!("📄 Raw OpenAI response size: {} bytes", body.len());

        if !status.is_success() {
            let err = Self::upstream_error(&body);
            log::error!("❌ OpenAI API error ({}): {}", status, err);
            return Err(err);
        }

        let recipe = Self::extract_completion(&body)?;
        log::info!("✅ Recipe generated ({} chars)", recipe.chars().count());

        Ok(recipe)
    }
}
