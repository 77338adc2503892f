use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::interface::{TranslateError, Translator};

/// Client for the public Google Translate endpoint
/// (`GET /translate_a/single?client=gtx`). No API key required.
pub struct GoogleTranslateClient {
    client: Client,
    base_url: String,
}

impl GoogleTranslateClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate(
        &self,
        text: &str,
        src_lang: &str,
        dest_lang: &str,
    ) -> Result<String, TranslateError> {
        let url = format!("{}/translate_a/single", self.base_url.trim_end_matches('/'));

        debug!(src_lang, dest_lang, chars = text.len(), "Sending translation request");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", src_lang),
                ("tl", dest_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslateError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError(format!(
                "translation API returned {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslateError(format!("unreadable translation response: {}", e)))?;

        // The body is a nested array; the first element lists translated
        // segments as [translated, original, ...] pairs.
        let segments = body
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| TranslateError("unexpected translation response shape".to_string()))?;

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(|v| v.as_str()))
            .collect();

        if translated.is_empty() {
            return Err(TranslateError(
                "translation response contained no text".to_string(),
            ));
        }

        Ok(translated)
    }
}
