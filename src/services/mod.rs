pub mod openai; // OpenAI chat completions (vision)

pub use openai::OpenAiVisionService;

use crate::error::Result;

/// Trait for recipe-generating models (OpenAI, or a stub in tests)
#[async_trait::async_trait]
pub trait RecipeModel: Send + Sync {
    /// Ask the model for a recipe of the pictured dish and return its completion text.
    async fn generate_recipe(&self, image_base64: &str, mime_type: Option<&str>) -> Result<String>;
}
