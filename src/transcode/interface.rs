use async_trait::async_trait;
use thiserror::Error;

/// Opaque conversion failure. Callers only learn that the audio could not be
/// normalized; the cause goes to the logs.
#[derive(Debug, Error)]
#[error("audio conversion failed: {0}")]
pub struct TranscodeError(pub String);

/// Normalizes arbitrary container/codec audio into mono, 16-bit, 16 kHz WAV
/// for the speech recognizer.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    async fn transcode(&self, audio: &[u8]) -> Result<Vec<u8>, TranscodeError>;
}
