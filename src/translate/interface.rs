use async_trait::async_trait;
use thiserror::Error;

/// Translation failure carrying the upstream message. Always a server fault
/// from the caller's point of view.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TranslateError(pub String);

/// Text translation between two-letter language tags.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        src_lang: &str,
        dest_lang: &str,
    ) -> Result<String, TranslateError>;
}
