//! Modality processors
//!
//! Each processor turns one kind of raw input into text describing
//! ingredients, or (for [`ImageGenerator`]) a finished recipe description into
//! an image URL. Processors do not decide when they run: the orchestrator
//! offers them to the reasoning layer as tools.

mod generator;
mod image;
mod recipe;
mod text;
mod voice;

pub use generator::{ImageGenerator, RECIPE_IMAGE_SIZE};
pub use image::{sniff_image_subtype, ImageReader};
pub use recipe::{parse_steps, RecipeInstructions};
pub use text::TextPassthrough;
pub use voice::VoiceTranscriber;

use crate::inference::InferenceError;
use std::path::Path;
use thiserror::Error;

/// Processor failures
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Referenced temporary file is unknown or unreadable
    #[error("Temporary asset unavailable: {0}")]
    Asset(String),
}

fn untrusted_path(path: &Path) -> ProcessorError {
    ProcessorError::Asset(format!("{} is not a pantry temporary file", path.display()))
}
