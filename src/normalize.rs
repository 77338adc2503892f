use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::ApiError;

/// Browser recordings can run long; the axum default of 2 MiB is too small
/// for a voice clip.
pub const MAX_AUDIO_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

const UNPARSEABLE: &str = "Unable to parse request data";

/// A fully validated translation request, whatever wire encoding it arrived in.
#[derive(Debug)]
pub struct TranslationRequest {
    pub src_lang: String,
    pub dest_lang: String,
    pub audio: Vec<u8>,
}

/// The wire encodings we accept, in dispatch priority.
enum RequestEncoding {
    Multipart,
    Json,
    Form,
}

/// Fields as extracted from the body, before validation. Absence is recorded
/// here so the validation pass can report the first violated rule in a fixed
/// order regardless of encoding.
#[derive(Default)]
struct RawFields {
    src_lang: Option<String>,
    dest_lang: Option<String>,
    audio: Option<Vec<u8>>,
}

/// Turn an arbitrary inbound request into a `TranslationRequest` or a
/// classified client error.
pub async fn translation_request(req: Request) -> Result<TranslationRequest, ApiError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    debug!(content_type = content_type.as_deref(), "Normalizing request");

    let fields = match detect_encoding(content_type.as_deref()) {
        RequestEncoding::Multipart => from_multipart(req).await?,
        RequestEncoding::Json => from_json(req).await?,
        RequestEncoding::Form => from_form(req).await?,
    };

    validate(fields)
}

fn detect_encoding(content_type: Option<&str>) -> RequestEncoding {
    match content_type {
        Some(ct) if ct.contains("multipart/form-data") => RequestEncoding::Multipart,
        Some(ct) if ct.contains("application/json") => RequestEncoding::Json,
        _ => RequestEncoding::Form,
    }
}

/// Strip an optional `data:<mime>;base64,` header and decode the rest.
pub fn decode_base64_payload(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match value.split_once(',') {
        Some((_, rest)) => rest,
        None => value,
    };
    BASE64.decode(payload.trim())
}

/// Form-field policy: a value that does not decode as base64 is carried
/// through as its raw bytes (after data-URI stripping). The JSON path does
/// NOT share this fallback.
fn decode_base64_lenient(value: &str) -> Vec<u8> {
    let payload = match value.split_once(',') {
        Some((_, rest)) => rest,
        None => value,
    };
    BASE64
        .decode(payload.trim())
        .unwrap_or_else(|_| payload.as_bytes().to_vec())
}

async fn from_multipart(req: Request) -> Result<RawFields, ApiError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|_| ApiError::ClientInput(UNPARSEABLE.to_string()))?;

    let mut fields = RawFields::default();
    while let Some(field) = next_part(&mut multipart).await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "src_lang" => fields.src_lang = Some(part_text(field).await?),
            "dest_lang" => fields.dest_lang = Some(part_text(field).await?),
            "audio_data" => {
                // An uploaded file part carries a filename; its bytes are the
                // payload verbatim. A plain text field is base64 (lenient).
                if field.file_name().is_some() {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|_| ApiError::ClientInput(UNPARSEABLE.to_string()))?;
                    debug!(bytes = bytes.len(), "Audio from file part");
                    fields.audio = Some(bytes.to_vec());
                } else {
                    let text = part_text(field).await?;
                    debug!("Audio from form field");
                    fields.audio = Some(decode_base64_lenient(&text));
                }
            }
            _ => {}
        }
    }
    Ok(fields)
}

async fn next_part(
    multipart: &mut Multipart,
) -> Result<Option<axum::extract::multipart::Field<'_>>, ApiError> {
    multipart
        .next_field()
        .await
        .map_err(|_| ApiError::ClientInput(UNPARSEABLE.to_string()))
}

async fn part_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|_| ApiError::ClientInput(UNPARSEABLE.to_string()))
}

#[derive(Deserialize)]
struct JsonBody {
    src_lang: Option<String>,
    dest_lang: Option<String>,
    audio_data: Option<String>,
}

async fn from_json(req: Request) -> Result<RawFields, ApiError> {
    let bytes = read_body(req).await?;
    let body: JsonBody = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::ClientInput(UNPARSEABLE.to_string()))?;

    // Unlike the form paths, a JSON audio_data that fails to decode is a
    // hard client error.
    let audio = match body.audio_data {
        Some(value) => Some(
            decode_base64_payload(&value)
                .map_err(|_| ApiError::ClientInput("Invalid base64 audio data".to_string()))?,
        ),
        None => None,
    };

    Ok(RawFields {
        src_lang: body.src_lang,
        dest_lang: body.dest_lang,
        audio,
    })
}

async fn from_form(req: Request) -> Result<RawFields, ApiError> {
    let bytes = read_body(req).await?;
    let pairs: HashMap<String, String> = serde_urlencoded::from_bytes(&bytes)
        .map_err(|_| ApiError::ClientInput(UNPARSEABLE.to_string()))?;
    if pairs.is_empty() {
        return Err(ApiError::ClientInput(UNPARSEABLE.to_string()));
    }

    Ok(RawFields {
        src_lang: pairs.get("src_lang").cloned(),
        dest_lang: pairs.get("dest_lang").cloned(),
        audio: pairs.get("audio_data").map(|v| decode_base64_lenient(v)),
    })
}

async fn read_body(req: Request) -> Result<Bytes, ApiError> {
    axum::body::to_bytes(req.into_body(), MAX_AUDIO_UPLOAD_BYTES)
        .await
        .map_err(|e| ApiError::Unexpected(anyhow::Error::new(e)))
}

/// First violated rule wins: src_lang, then dest_lang, then audio. Empty
/// values count as missing.
fn validate(fields: RawFields) -> Result<TranslationRequest, ApiError> {
    let src_lang = match fields.src_lang {
        Some(v) if !v.is_empty() => v,
        _ => return Err(ApiError::ClientInput("src_lang is required".to_string())),
    };
    let dest_lang = match fields.dest_lang {
        Some(v) if !v.is_empty() => v,
        _ => return Err(ApiError::ClientInput("dest_lang is required".to_string())),
    };
    let audio = match fields.audio {
        Some(v) if !v.is_empty() => v,
        _ => return Err(ApiError::ClientInput("audio_data is required".to_string())),
    };

    Ok(TranslationRequest {
        src_lang,
        dest_lang,
        audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn decodes_plain_base64() {
        assert_eq!(decode_base64_payload("SGVsbG8=").unwrap(), b"Hello");
    }

    #[test]
    fn data_uri_prefix_decodes_to_same_bytes() {
        let bare = decode_base64_payload("SGVsbG8=").unwrap();
        let prefixed = decode_base64_payload("data:audio/wav;base64,SGVsbG8=").unwrap();
        assert_eq!(bare, prefixed);
    }

    #[test]
    fn lenient_decode_falls_back_to_raw_bytes() {
        assert_eq!(decode_base64_lenient("!!!not base64!!!"), b"!!!not base64!!!");
    }

    #[test]
    fn lenient_fallback_uses_stripped_payload() {
        // The data-URI header is stripped before the fallback applies.
        assert_eq!(
            decode_base64_lenient("data:audio/webm;base64,!!!not base64!!!"),
            b"!!!not base64!!!"
        );
    }

    #[tokio::test]
    async fn json_fields_are_extracted() {
        let req = json_request(r#"{"src_lang":"en","dest_lang":"es","audio_data":"SGVsbG8="}"#);
        let parsed = translation_request(req).await.unwrap();
        assert_eq!(parsed.src_lang, "en");
        assert_eq!(parsed.dest_lang, "es");
        assert_eq!(parsed.audio, b"Hello");
    }

    #[tokio::test]
    async fn json_invalid_base64_is_a_hard_error() {
        let req = json_request(r#"{"src_lang":"en","dest_lang":"es","audio_data":"!!!"}"#);
        let err = translation_request(req).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::ClientInput(ref msg) if msg == "Invalid base64 audio data"
        ));
    }

    #[tokio::test]
    async fn json_garbage_body_is_unparseable() {
        let req = json_request("this is not json");
        let err = translation_request(req).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::ClientInput(ref msg) if msg == UNPARSEABLE
        ));
    }

    #[tokio::test]
    async fn missing_src_lang_reported_before_missing_audio() {
        let req = json_request(r#"{"dest_lang":"es"}"#);
        let err = translation_request(req).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::ClientInput(ref msg) if msg == "src_lang is required"
        ));
    }

    #[tokio::test]
    async fn missing_dest_lang_reported_before_missing_audio() {
        let req = json_request(r#"{"src_lang":"en"}"#);
        let err = translation_request(req).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::ClientInput(ref msg) if msg == "dest_lang is required"
        ));
    }

    #[tokio::test]
    async fn missing_audio_is_reported_last() {
        let req = json_request(r#"{"src_lang":"en","dest_lang":"es"}"#);
        let err = translation_request(req).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::ClientInput(ref msg) if msg == "audio_data is required"
        ));
    }

    #[tokio::test]
    async fn legacy_form_decodes_base64_field() {
        let req = form_request("src_lang=en&dest_lang=es&audio_data=SGVsbG8%3D");
        let parsed = translation_request(req).await.unwrap();
        assert_eq!(parsed.audio, b"Hello");
    }

    #[tokio::test]
    async fn legacy_form_falls_back_to_raw_bytes() {
        let req = form_request("src_lang=en&dest_lang=es&audio_data=%21%21%21");
        let parsed = translation_request(req).await.unwrap();
        assert_eq!(parsed.audio, b"!!!");
    }

    #[tokio::test]
    async fn empty_body_without_content_type_is_unparseable() {
        let req = Request::builder()
            .method("POST")
            .body(Body::empty())
            .unwrap();
        let err = translation_request(req).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::ClientInput(ref msg) if msg == UNPARSEABLE
        ));
    }
}
