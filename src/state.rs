use std::sync::Arc;

use crate::asr::{GoogleSpeechClient, SpeechRecognizer};
use crate::config::Config;
use crate::transcode::{AudioTranscoder, SymphoniaTranscoder};
use crate::translate::{GoogleTranslateClient, Translator};

/// Shared handles for the request pipeline. Everything here is read-only, so
/// handlers are free to run concurrently.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub transcoder: Arc<dyn AudioTranscoder>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let api_key = std::env::var("GOOGLE_SPEECH_API_KEY")
            .ok()
            .or_else(|| config.speech.api_key.clone());

        let recognizer = Arc::new(GoogleSpeechClient::new(
            config.speech.base_url.clone(),
            api_key,
        ));
        let translator = Arc::new(GoogleTranslateClient::new(config.translate.base_url.clone()));

        Self {
            config,
            transcoder: Arc::new(SymphoniaTranscoder::new()),
            recognizer,
            translator,
        }
    }
}
