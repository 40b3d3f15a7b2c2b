//! Agent instruction loading
//!
//! Instruction text for the reasoning layer and each inference-backed tool is
//! kept in markdown files under a configurable directory (`AGENT_ROUTES`).
//! All files are read once at startup; a missing file stops the service.

use pantry_common::{Error, Result};
use std::path::Path;
use tracing::info;

/// Orchestrator (reasoning layer) instructions
pub const ORCHESTRATOR_INSTRUCTIONS: &str = "orchestrator_instructions";
/// Image reader instructions
pub const IMAGE_READER_INSTRUCTIONS: &str = "image_reader_agent_instructions";
/// Transcription prompt bias
pub const VOICE_INSTRUCTIONS: &str = "voice_agent_instructions";
/// Step-by-step recipe instructions
pub const RECIPE_INSTRUCTIONS: &str = "recipe_agent_instructions";

/// Instruction text for every agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInstructions {
    pub orchestrator: String,
    pub image_reader: String,
    pub voice: String,
    pub recipe: String,
}

impl AgentInstructions {
    /// Load all instruction files from `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "Agent instruction directory not found: {}",
                dir.display()
            )));
        }

        let instructions = Self {
            orchestrator: load_instruction_file(dir, ORCHESTRATOR_INSTRUCTIONS)?,
            image_reader: load_instruction_file(dir, IMAGE_READER_INSTRUCTIONS)?,
            voice: load_instruction_file(dir, VOICE_INSTRUCTIONS)?,
            recipe: load_instruction_file(dir, RECIPE_INSTRUCTIONS)?,
        };

        info!("Loaded agent instructions from {}", dir.display());
        Ok(instructions)
    }
}

/// Read `{dir}/{name}.md`
pub fn load_instruction_file(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(format!("{}.md", name));
    if !path.exists() {
        return Err(Error::Config(format!(
            "Agent instructions file not found: {}",
            path.display()
        )));
    }
    Ok(std::fs::read_to_string(&path)?)
}
