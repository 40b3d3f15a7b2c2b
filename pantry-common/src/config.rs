//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! Everything here is read once at startup. Changing the TOML file requires a
//! restart.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default HTTP bind address for pantry-ai
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5730";

/// Default upper bound on reasoning turns per orchestration call
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 12;

/// Default maximum inbound request body (base64 images/audio are large)
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 25 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP listen address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory containing the agent instruction markdown files
    #[serde(default)]
    pub agent_instructions_dir: Option<PathBuf>,

    /// Directory where temporary image/audio files are materialized
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Maximum reasoning turns before an orchestration call is aborted
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    /// Allowed CORS origins for the web client
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Inference provider settings (OpenAI-compatible HTTP API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Model driving the reasoning layer and text extraction
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Model used to read ingredient photos
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Speech-to-text model
    #[serde(default = "default_voice_model")]
    pub voice_model: String,

    /// Image generation model
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Target resolution for generated recipe images
    #[serde(default = "default_image_size")]
    pub image_size: String,
}

/// Token validation settings (Supabase auth)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,

    #[serde(default)]
    pub supabase_key: Option<String>,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_database_path() -> PathBuf {
    // ~/.local/share/pantry/pantry.db on Linux
    dirs::data_local_dir()
        .map(|d| d.join("pantry"))
        .unwrap_or_else(|| PathBuf::from("./pantry_data"))
        .join("pantry.db")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("pantry")
}

fn default_max_tool_iterations() -> usize {
    DEFAULT_MAX_TOOL_ITERATIONS
}

fn default_max_request_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BYTES
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8000".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_text_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_vision_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_voice_model() -> String {
    "gpt-4o-mini-transcribe".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key: None,
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            voice_model: default_voice_model(),
            image_model: default_image_model(),
            image_size: default_image_size(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: default_database_path(),
            agent_instructions_dir: None,
            temp_dir: default_temp_dir(),
            max_tool_iterations: default_max_tool_iterations(),
            max_request_bytes: default_max_request_bytes(),
            cors_origins: default_cors_origins(),
            logging: LoggingConfig::default(),
            openai: OpenAiConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file
    ///
    /// An explicitly requested file must exist. When no path is given the
    /// user config file (`~/.config/pantry/pantry.toml`) is used if present,
    /// otherwise built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_file() {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("No config file found, using built-in defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        info!("Loaded TOML configuration from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PANTRY_BIND") {
            self.bind_address = v;
        }
        if let Some(v) = get("PANTRY_DATABASE") {
            self.database_path = PathBuf::from(v);
        }
        if let Some(v) = get("PANTRY_TEMP_DIR") {
            self.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = get("AGENT_ROUTES") {
            self.agent_instructions_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.openai.base_url = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.openai.text_model = v;
        }
        if let Some(v) = get("IMAGE_MODEL") {
            self.openai.vision_model = v;
        }
        if let Some(v) = get("VOICE_MODEL") {
            self.openai.voice_model = v;
        }
        if let Some(v) = get("IMAGE_GENERATION_MODEL") {
            self.openai.image_model = v;
        }
        if let Some(v) = get("SUPABASE_URL") {
            self.auth.supabase_url = Some(v);
        }
        if let Some(v) = get("SUPABASE_KEY") {
            self.auth.supabase_key = Some(v);
        }
    }

    /// Resolve the agent instruction directory or fail with a configuration error
    pub fn require_agent_instructions_dir(&self) -> Result<&Path> {
        self.agent_instructions_dir.as_deref().ok_or_else(|| {
            Error::Config(
                "Agent instruction directory not configured. Set AGENT_ROUTES or \
                 agent_instructions_dir in pantry.toml"
                    .to_string(),
            )
        })
    }

    /// Resolve the inference API key or fail with a configuration error
    pub fn require_openai_api_key(&self) -> Result<&str> {
        self.openai
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "OpenAI API key not configured. Set OPENAI_API_KEY or [openai] api_key"
                        .to_string(),
                )
            })
    }
}

/// Per-user config file location
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pantry").join("pantry.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1:5730");
        assert_eq!(config.max_tool_iterations, 12);
        assert_eq!(config.openai.image_size, "1024x1024");
        assert!(config.agent_instructions_dir.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            bind_address = "0.0.0.0:8000"

            [openai]
            text_model = "gpt-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert_eq!(config.openai.text_model, "gpt-test");
        assert_eq!(config.openai.voice_model, "gpt-4o-mini-transcribe");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_overrides_take_priority() {
        let mut config = TomlConfig::default();
        let env: HashMap<&str, &str> = [
            ("AGENT_ROUTES", "/srv/agents"),
            ("OPENAI_MODEL", "gpt-override"),
            ("VOICE_MODEL", "whisper-1"),
            ("PANTRY_BIND", ""),
        ]
        .into_iter()
        .collect();

        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.agent_instructions_dir, Some(PathBuf::from("/srv/agents")));
        assert_eq!(config.openai.text_model, "gpt-override");
        assert_eq!(config.openai.voice_model, "whisper-1");
        // Empty value leaves default alone
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
    }

    #[test]
    fn test_missing_required_settings() {
        let config = TomlConfig::default();
        assert!(matches!(
            config.require_agent_instructions_dir(),
            Err(Error::Config(_))
        ));
        assert!(matches!(config.require_openai_api_key(), Err(Error::Config(_))));
    }
}
