use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_generation_timing;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,
    #[error("Image request failed: {0}")]
    Transport(String),
    #[error("Image request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("Image response could not be decoded: {0}")]
    Decode(String),
    #[error("No image returned for prompt (model: {0})")]
    Empty(String),
}

/// Encoded image bytes as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Provider-facing settings for one request. Temperature and seed are carried
/// for logging only; the image endpoint takes neither.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f64,
    pub seed: Option<i64>,
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        settings: GenerationSettings,
    ) -> Result<ImagePayload, GenerationError>;
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

/// Imagen over the Generative Language `:predict` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiImageClient {
    api_base: String,
    api_key: String,
    model: String,
    output_mime_type: String,
    aspect_ratio: String,
    timeout: Duration,
}

impl GeminiImageClient {
    pub fn from_config() -> Self {
        GeminiImageClient {
            api_base: CONFIG.gemini_api_base.clone(),
            api_key: CONFIG.gemini_api_key.clone(),
            model: CONFIG.gemini_image_model.clone(),
            output_mime_type: CONFIG.image_output_mime_type.clone(),
            aspect_ratio: CONFIG.image_aspect_ratio.clone(),
            timeout: Duration::from_secs(CONFIG.gemini_request_timeout_seconds),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn redact(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            return text.to_string();
        }
        text.replace(&self.api_key, "[redacted]")
    }

    fn endpoint(&self) -> Result<url::Url, GenerationError> {
        let raw = format!("{}/models/{}:predict", self.api_base, self.model);
        let mut url = url::Url::parse(&raw)
            .map_err(|err| GenerationError::Transport(format!("Invalid endpoint {raw}: {err}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    fn build_payload(&self, prompt: &str) -> Value {
        json!({
            "instances": [{ "prompt": prompt }],
            "parameters": {
                "sampleCount": 1,
                "outputMimeType": self.output_mime_type,
                "aspectRatio": self.aspect_ratio,
            }
        })
    }

    async fn request_image(&self, prompt: &str) -> Result<ImagePayload, GenerationError> {
        let url = self.endpoint()?;
        let response = get_http_client()
            .post(url)
            .timeout(self.timeout)
            .json(&self.build_payload(prompt))
            .send()
            .await
            .map_err(|err| {
                let err_text = self.redact(&err.to_string());
                warn!(
                    "Imagen request failed to send: {} (timeout={}, connect={})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect()
                );
                GenerationError::Transport(err_text)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Imagen API error: status={}, body={}", status, body_summary);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                detail: self.redact(&message.unwrap_or(body_summary)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| GenerationError::Transport(self.redact(&err.to_string())))?;
        extract_payload(&body, &self.model, &self.output_mime_type)
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    async fn generate_image(
        &self,
        prompt: &str,
        settings: GenerationSettings,
    ) -> Result<ImagePayload, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let metadata = json!({
            "prompt": truncate_for_log(prompt, 200),
            "temperature": settings.temperature,
            "seed": settings.seed,
        });
        log_generation_timing("imagen", &self.model, "predict", Some(metadata), || {
            self.request_image(prompt)
        })
        .await
    }
}

fn extract_payload(
    body: &str,
    model: &str,
    fallback_mime: &str,
) -> Result<ImagePayload, GenerationError> {
    let response: PredictResponse =
        serde_json::from_str(body).map_err(|err| GenerationError::Decode(err.to_string()))?;

    let prediction = response
        .predictions
        .unwrap_or_default()
        .into_iter()
        .find(|prediction| prediction.bytes_base64_encoded.is_some())
        .ok_or_else(|| GenerationError::Empty(model.to_string()))?;

    let encoded = prediction.bytes_base64_encoded.unwrap_or_default();
    let bytes = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|err| GenerationError::Decode(err.to_string()))?;
    if bytes.is_empty() {
        return Err(GenerationError::Empty(model.to_string()));
    }

    let mime_type = prediction
        .mime_type
        .filter(|value| value.starts_with("image/"))
        .or_else(|| infer::get(&bytes).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| fallback_mime.to_string());
    debug!(target: "explorer.imagen", model = model, mime_type = %mime_type, bytes = bytes.len());

    Ok(ImagePayload { mime_type, bytes })
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: &str) -> GeminiImageClient {
        GeminiImageClient {
            api_base: "https://example.test/v1beta".to_string(),
            api_key: api_key.to_string(),
            model: "imagen-test".to_string(),
            output_mime_type: "image/jpeg".to_string(),
            aspect_ratio: "1:1".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn payload_requests_a_single_square_image() {
        let payload = client("k").build_payload("a cat, Style: Cyberpunk");
        assert_eq!(payload["instances"][0]["prompt"], "a cat, Style: Cyberpunk");
        assert_eq!(payload["parameters"]["sampleCount"], 1);
        assert_eq!(payload["parameters"]["outputMimeType"], "image/jpeg");
        assert_eq!(payload["parameters"]["aspectRatio"], "1:1");
        assert!(payload["parameters"].get("temperature").is_none());
        assert!(payload["parameters"].get("seed").is_none());
    }

    #[test]
    fn endpoint_carries_model_and_key() {
        let url = client("secret").endpoint().unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/v1beta/models/imagen-test:predict?key=secret"
        );
    }

    #[test]
    fn redacts_api_key_from_messages() {
        let redacted = client("secret").redact("GET ...?key=secret failed");
        assert_eq!(redacted, "GET ...?key=[redacted] failed");
    }

    #[test]
    fn extracts_first_prediction() {
        let body = json!({
            "predictions": [
                { "bytesBase64Encoded": general_purpose::STANDARD.encode([1u8, 2, 3]), "mimeType": "image/png" }
            ]
        })
        .to_string();

        let payload = extract_payload(&body, "imagen-test", "image/jpeg").unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.bytes, vec![1, 2, 3]);
        assert_eq!(payload.to_data_uri(), "data:image/png;base64,AQID");
    }

    #[test]
    fn falls_back_to_configured_mime_type() {
        let body = json!({
            "predictions": [{ "bytesBase64Encoded": general_purpose::STANDARD.encode([9u8, 9, 9]) }]
        })
        .to_string();

        let payload = extract_payload(&body, "imagen-test", "image/jpeg").unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
    }

    #[test]
    fn empty_predictions_are_an_error() {
        let err = extract_payload(r#"{"predictions":[]}"#, "imagen-test", "image/jpeg")
            .unwrap_err();
        assert!(matches!(err, GenerationError::Empty(model) if model == "imagen-test"));

        let err = extract_payload("{}", "imagen-test", "image/jpeg").unwrap_err();
        assert!(matches!(err, GenerationError::Empty(_)));
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let body = r#"{"predictions":[{"bytesBase64Encoded":"***"}]}"#;
        let err = extract_payload(body, "imagen-test", "image/jpeg").unwrap_err();
        assert!(matches!(err, GenerationError::Decode(_)));
    }

    #[test]
    fn error_body_prefers_api_message() {
        let (message, _) =
            summarize_error_body(r#"{"error":{"code":429,"message":"Resource exhausted"}}"#);
        assert_eq!(message.as_deref(), Some("Resource exhausted"));

        let (message, summary) = summarize_error_body("   ");
        assert!(message.is_none());
        assert_eq!(summary, "empty response body");
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_network() {
        let settings = GenerationSettings {
            temperature: 0.5,
            seed: None,
        };
        let err = client("").generate_image("a cat", settings).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey));
    }
}
