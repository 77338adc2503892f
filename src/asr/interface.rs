use async_trait::async_trait;
use thiserror::Error;

/// Recognition failure modes the orchestrator must tell apart: audio the
/// service heard but could not understand is the caller's problem, a broken
/// service is ours.
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("could not understand the audio")]
    Unintelligible,

    #[error("{0}")]
    Service(String),
}

/// Speech-to-text over normalized WAV audio.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe mono 16-bit 16 kHz WAV using the given recognition locale
    /// (e.g. `"hi-IN"`, `"es"`).
    async fn recognize(&self, wav: &[u8], locale: &str) -> Result<String, RecognizeError>;
}
