//! Speech to text for spoken ingredient lists

use super::{untrusted_path, ProcessorError};
use crate::assets::TempAssetManager;
use crate::inference::{require_output, InferenceProvider};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Transcribes a temporary audio file
///
/// The file is deleted as soon as its bytes are read, before the
/// transcription request is sent.
#[derive(Debug, Clone)]
pub struct VoiceTranscriber {
    inference: Arc<dyn InferenceProvider>,
    assets: TempAssetManager,
    prompt: String,
}

impl VoiceTranscriber {
    pub fn new(inference: Arc<dyn InferenceProvider>, assets: TempAssetManager, prompt: String) -> Self {
        Self {
            inference,
            assets,
            prompt,
        }
    }

    pub async fn process(&self, path: &Path) -> Result<String, ProcessorError> {
        if !self.assets.owns(path) {
            return Err(untrusted_path(path));
        }

        let audio = tokio::fs::read(path)
            .await
            .map_err(|e| ProcessorError::Asset(format!("{}: {}", path.display(), e)))?;

        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed audio file before transcription"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove audio file"),
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let transcript = self
            .inference
            .transcribe_audio(&self.prompt, audio, &file_name)
            .await?;

        Ok(require_output("voice transcription", transcript)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetKind;
    use crate::inference::{FakeCall, FakeInference, InferenceError};
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    #[tokio::test]
    async fn test_transcribes_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let assets = TempAssetManager::new(dir.path()).unwrap();
        let fake = Arc::new(FakeInference::new().with_transcript("two eggs"));
        let voice = VoiceTranscriber::new(fake.clone(), assets.clone(), "ingredients".to_string());

        let asset = assets.materialize(&STANDARD.encode(b"RIFFdata"), AssetKind::Audio).unwrap();
        let text = voice.process(asset.path()).await.unwrap();

        assert_eq!(text, "two eggs");
        assert!(!asset.path().exists());
        assert!(matches!(
            &fake.calls()[0],
            FakeCall::Audio { bytes: 8, prompt, .. } if prompt == "ingredients"
        ));

        // Orchestrator teardown still balances the counter
        asset.release();
        assert_eq!(assets.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_empty_transcript_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let assets = TempAssetManager::new(dir.path()).unwrap();
        let fake = Arc::new(FakeInference::new().with_transcript("   "));
        let voice = VoiceTranscriber::new(fake, assets.clone(), String::new());

        let asset = assets.materialize(&STANDARD.encode(b"RIFF"), AssetKind::Audio).unwrap();
        assert!(matches!(
            voice.process(asset.path()).await,
            Err(ProcessorError::Inference(InferenceError::EmptyOutput(_)))
        ));
    }
}
