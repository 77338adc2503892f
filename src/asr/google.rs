use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::interface::{RecognizeError, SpeechRecognizer};

/// Client for the Google Cloud Speech-to-Text v1 REST API
/// (`POST /v1/speech:recognize`).
pub struct GoogleSpeechClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: String,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Debug, Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
}

#[derive(Debug, Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl GoogleSpeechClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    fn recognize_url(&self) -> String {
        let base = format!("{}/v1/speech:recognize", self.base_url.trim_end_matches('/'));
        match &self.api_key {
            Some(key) => format!("{}?key={}", base, key),
            None => base,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechClient {
    async fn recognize(&self, wav: &[u8], locale: &str) -> Result<String, RecognizeError> {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: 16_000,
                language_code: locale.to_string(),
            },
            audio: RecognitionAudio {
                content: BASE64.encode(wav),
            },
        };

        debug!(bytes = wav.len(), locale, "Sending recognition request");

        let response = self
            .client
            .post(self.recognize_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecognizeError::Service(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(RecognizeError::Service(format!(
                "recognition API returned {}: {}",
                status, message
            )));
        }

        let parsed: RecognizeResponse = serde_json::from_str(&body)
            .map_err(|e| RecognizeError::Service(format!("unreadable recognition response: {}", e)))?;

        // An empty result set is how the API reports audio it could not make
        // anything of.
        let transcript = parsed
            .results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .map(|alt| alt.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if transcript.is_empty() {
            return Err(RecognizeError::Unintelligible);
        }

        debug!(chars = transcript.len(), "Recognition succeeded");
        Ok(transcript)
    }
}
