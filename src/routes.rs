use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::asr::{recognition_locale, RecognizeError};
use crate::error::ApiError;
use crate::normalize::{self, MAX_AUDIO_UPLOAD_BYTES};
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/test", get(test_echo).post(test_echo))
        .route("/translate-voice", post(translate_voice))
        .route("/translate-text", post(translate_text))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_UPLOAD_BYTES))
}

/// Success envelope shared by both translation endpoints.
#[derive(Debug, Serialize)]
pub struct TranslationResult {
    pub success: bool,
    pub original_text: String,
    pub translated_text: String,
    pub src_lang: String,
    pub dest_lang: String,
}

async fn home() -> &'static str {
    "Voice Translator Backend Running"
}

async fn test_echo(method: Method) -> Json<Value> {
    Json(json!({
        "message": "Test endpoint working",
        "method": method.as_str(),
    }))
}

/// Voice pipeline: normalize the request, transcode the audio, recognize,
/// translate. Fails fast at the first broken stage.
async fn translate_voice(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<TranslationResult>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("translate_voice", %request_id);

    async move {
        let request = normalize::translation_request(req).await?;
        info!(
            src_lang = %request.src_lang,
            dest_lang = %request.dest_lang,
            audio_bytes = request.audio.len(),
            "Normalized translation request"
        );

        let wav = state.transcoder.transcode(&request.audio).await.map_err(|e| {
            warn!("Audio conversion failed: {}", e);
            ApiError::ClientInput(
                "Unable to convert audio format. Please try recording again.".to_string(),
            )
        })?;

        let locale = recognition_locale(&request.src_lang);
        info!(locale, wav_bytes = wav.len(), "Audio normalized");

        let original_text =
            state
                .recognizer
                .recognize(&wav, locale)
                .await
                .map_err(|e| match e {
                    RecognizeError::Unintelligible => ApiError::ClientInput(
                        "Could not understand the audio. Please speak clearly and try again."
                            .to_string(),
                    ),
                    RecognizeError::Service(msg) => {
                        ApiError::Upstream(format!("Speech recognition service error: {}", msg))
                    }
                })?;
        info!(text = %original_text, "Recognized");

        let translated_text = state
            .translator
            .translate(&original_text, &request.src_lang, &request.dest_lang)
            .await
            .map_err(|e| ApiError::Upstream(format!("Translation error: {}", e)))?;
        info!(text = %translated_text, "Translated");

        Ok(Json(TranslationResult {
            success: true,
            original_text,
            translated_text,
            src_lang: request.src_lang,
            dest_lang: request.dest_lang,
        }))
    }
    .instrument(span)
    .await
}

#[derive(Debug, Deserialize)]
struct TranslateTextBody {
    #[serde(default)]
    text: String,
    #[serde(default = "default_src_lang")]
    src_lang: String,
    #[serde(default = "default_dest_lang")]
    dest_lang: String,
}

fn default_src_lang() -> String {
    "en".to_string()
}

fn default_dest_lang() -> String {
    "es".to_string()
}

/// Text-only path: skips straight to the translator.
async fn translate_text(
    State(state): State<AppState>,
    body: Option<Json<TranslateTextBody>>,
) -> Result<Json<TranslationResult>, ApiError> {
    let Json(body) =
        body.ok_or_else(|| ApiError::ClientInput("No JSON data received".to_string()))?;

    if body.text.is_empty() {
        return Err(ApiError::ClientInput("Text is required".to_string()));
    }

    let translated_text = state
        .translator
        .translate(&body.text, &body.src_lang, &body.dest_lang)
        .await
        .map_err(|e| ApiError::Upstream(format!("Translation error: {}", e)))?;

    Ok(Json(TranslationResult {
        success: true,
        original_text: body.text,
        translated_text,
        src_lang: body.src_lang,
        dest_lang: body.dest_lang,
    }))
}
