use crate::inference::{require_output, InferenceError, InferenceProvider};
use std::sync::Arc;
use tracing::debug;

/// Resolution requested for generated recipe pictures
pub const RECIPE_IMAGE_SIZE: &str = "1024x1024";

/// Generates a picture of a finished recipe
#[derive(Debug, Clone)]
pub struct ImageGenerator {
    inference: Arc<dyn InferenceProvider>,
    size: String,
}

impl ImageGenerator {
    pub fn new(inference: Arc<dyn InferenceProvider>, size: String) -> Self {
        Self { inference, size }
    }

    /// Returns the URL of the generated image; provider errors are not retried
    pub async fn process(&self, prompt: &str) -> Result<String, InferenceError> {
        debug!(size = %self.size, "Generating recipe image");
        let url = self.inference.generate_image(prompt, &self.size).await?;
        require_output("image generation", url)
    }
}
