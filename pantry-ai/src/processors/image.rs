//! Ingredient extraction from photos

use super::{untrusted_path, ProcessorError};
use crate::assets::TempAssetManager;
use crate::inference::{require_output, InferenceProvider};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Reads a temporary image and asks the vision model for its ingredients
#[derive(Debug, Clone)]
pub struct ImageReader {
    inference: Arc<dyn InferenceProvider>,
    assets: TempAssetManager,
    instructions: String,
}

impl ImageReader {
    pub fn new(inference: Arc<dyn InferenceProvider>, assets: TempAssetManager, instructions: String) -> Self {
        Self {
            inference,
            assets,
            instructions,
        }
    }

    /// Describe the image at `path`
    ///
    /// `subtype` is the declared image format (`jpeg`, `png`, ...). When
    /// absent the format is sniffed from the file, falling back to jpeg.
    pub async fn process(&self, path: &Path, subtype: Option<&str>) -> Result<String, ProcessorError> {
        if !self.assets.owns(path) {
            return Err(untrusted_path(path));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ProcessorError::Asset(format!("{}: {}", path.display(), e)))?;

        let subtype = subtype
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .or_else(|| sniff_image_subtype(&bytes).map(str::to_string))
            .unwrap_or_else(|| "jpeg".to_string());

        debug!(bytes = bytes.len(), subtype = %subtype, "Sending image to vision model");

        let data_uri = format!("data:image/{};base64,{}", subtype, STANDARD.encode(&bytes));
        let output = self
            .inference
            .describe_image(&self.instructions, &data_uri)
            .await?;

        Ok(require_output("image reader", output)?)
    }
}

/// Image subtype from magic bytes (`jpeg`, `png`, `webp`, ...)
pub fn sniff_image_subtype(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .and_then(|kind| kind.mime_type().strip_prefix("image/"))
}
