//! Gemini REST Client
//!
//! [`CompletionClient`] implementation over the Google Generative Language API:
//! - `{base}/models/{model}:generateContent` for single-shot and chat calls
//! - `{base}/models/{model}:streamGenerateContent?alt=sse` for streaming
//!
//! Key differences from OpenAI-style APIs:
//! - API key travels in the `x-goog-api-key` header
//! - Conversation turns use roles `user` / `model` with typed `parts`
//! - SSE events are `data: {...}` lines without `event:` prefix
//! - Text lives in `candidates[0].content.parts[*].text`

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::sse::SseBuffer;
use super::{
    ChatStream, ChatTurn, CompletionClient, CompletionRequest, ErrorCategory, ErrorClassifier,
    InlineImage, LlmError, Preamble, StreamEvent,
};
use crate::config::{AiConfig, SafetySetting};
use crate::constants::{ai, network};
use crate::types::{HubError, Result};

/// Gemini client with secure API key handling
pub struct GeminiClient {
    /// Never exposed in logs or debug output. Absent keys fail per request.
    api_key: Option<SecretString>,
    api_base: String,
    default_model: String,
    temperature: f32,
    max_output_tokens: u32,
    chat_max_output_tokens: u32,
    stream_max_output_tokens: u32,
    request_timeout: Duration,
    safety: Vec<SafetySetting>,
    http: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                std::env::var(ai::API_KEY_ENV)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
            .map(SecretString::from);
        if api_key.is_none() {
            debug!("No Gemini API key configured");
        }

        // No client-wide timeout: streamed replies may outlive it.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(network::CONNECTION_TIMEOUT_SECS))
            .build()
            .map_err(|e| HubError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            default_model: config.model_smart.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            chat_max_output_tokens: config.chat_max_output_tokens,
            stream_max_output_tokens: config.stream_max_output_tokens,
            request_timeout: Duration::from_secs(config.timeout_secs),
            safety: config.safety.clone(),
            http,
        })
    }

    fn resolve_model<'a>(&'a self, model: &'a str) -> &'a str {
        if model.trim().is_empty() {
            &self.default_model
        } else {
            model
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, model, method)
    }

    fn body(
        &self,
        contents: Vec<Content>,
        generation_config: GenerationConfig,
        grounding: bool,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents,
            generation_config,
            safety_settings: self.safety.clone(),
            tools: if grounding {
                vec![serde_json::json!({ "googleSearch": {} })]
            } else {
                Vec::new()
            },
        }
    }

    fn post(&self, url: &str, body: &GenerateContentRequest) -> Result<reqwest::RequestBuilder> {
        let key = self.api_key.as_ref().ok_or_else(|| {
            LlmError::new(
                ErrorCategory::Auth,
                format!(
                    "Gemini API key not found. Set {} or ai.api_key in config",
                    ai::API_KEY_ENV
                ),
            )
        })?;
        Ok(self
            .http
            .post(url)
            .header("x-goog-api-key", key.expose_secret())
            .header("Content-Type", "application/json")
            .json(body))
    }

    /// Send a non-streaming request and extract the reply text
    async fn generate(&self, model: &str, body: &GenerateContentRequest) -> Result<String> {
        let start = Instant::now();
        let url = self.endpoint(model, "generateContent");

        let response = self
            .post(&url, body)?
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| transport_error(&e, model))?;
        let response = check_status(response, model).await?;

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::new(
                ErrorCategory::Unknown,
                format!("Failed to parse Gemini response: {}", e),
            )
            .model(model)
        })?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini usage: {} prompt / {} output tokens in {}ms",
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0),
                start.elapsed().as_millis()
            );
        }

        match parsed.into_text() {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Err(LlmError::new(ErrorCategory::Unknown, "Gemini returned no text")
                .model(model)
                .into()),
            Err(e) => Err(e.model(model).into()),
        }
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let model = self.resolve_model(&request.model);
        info!(
            "Generating with Gemini (model: {}, grounding: {}, images: {})",
            model,
            request.grounding,
            request.images.len()
        );

        let mut parts = vec![Part::text(&request.prompt)];
        parts.extend(request.images.iter().map(Part::image));

        let generation_config = GenerationConfig {
            max_output_tokens: request.max_output_tokens.unwrap_or(self.max_output_tokens),
            temperature: request.temperature.unwrap_or(self.temperature),
            response_mime_type: request.response_mime_type.clone(),
            response_schema: request.response_schema.clone(),
        };

        let body = self.body(
            vec![Content::new("user", parts)],
            generation_config,
            request.grounding,
        );
        self.generate(model, &body).await
    }

    async fn chat(
        &self,
        history: &[ChatTurn],
        new_turn: &str,
        preamble: &Preamble,
    ) -> Result<String> {
        let model = self.default_model.as_str();
        let mut turns = preamble.seed(history);
        turns.push(ChatTurn::user(new_turn));
        debug!("Gemini chat with {} turns (model: {})", turns.len(), model);

        let generation_config = GenerationConfig {
            max_output_tokens: self.chat_max_output_tokens,
            temperature: self.temperature,
            response_mime_type: None,
            response_schema: None,
        };
        let body = self.body(
            turns.iter().map(Content::from).collect(),
            generation_config,
            false,
        );
        self.generate(model, &body).await
    }

    fn stream_chat(&self, history: &[ChatTurn], message: ChatTurn, model: &str) -> ChatStream {
        let model = self.resolve_model(model).to_string();
        let mut turns = Preamble::assistant().seed(history);
        turns.push(message);
        info!("Streaming Gemini chat (model: {}, turns: {})", model, turns.len());

        let generation_config = GenerationConfig {
            max_output_tokens: self.stream_max_output_tokens,
            temperature: self.temperature,
            response_mime_type: None,
            response_schema: None,
        };
        let body = self.body(
            turns.iter().map(Content::from).collect(),
            generation_config,
            false,
        );
        let url = self.endpoint(&model, "streamGenerateContent?alt=sse");
        let request = match self.post(&url, &body) {
            Ok(request) => request,
            Err(e) => {
                let message = e.to_string();
                return Box::pin(futures::stream::once(async move { StreamEvent::Error(message) }));
            }
        };

        Box::pin(async_stream::stream! {
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Gemini stream connect failed: {}", e);
                    yield StreamEvent::Error(transport_error(&e, &model).to_string());
                    return;
                }
            };
            let response = match check_status(response, &model).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Gemini stream rejected: {}", e);
                    yield StreamEvent::Error(e.to_string());
                    return;
                }
            };

            let chunks = futures::stream::unfold(Some(response), |state| async move {
                let mut response = state?;
                match response.chunk().await {
                    Ok(Some(bytes)) => Some((Ok(bytes.to_vec()), Some(response))),
                    Ok(None) => None,
                    Err(e) => Some((Err(format!("Stream interrupted: {}", e)), None)),
                }
            });

            let events = decode_stream(chunks);
            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                yield event;
            }
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Turn raw SSE byte chunks into stream events.
///
/// Emits one `Text` per non-empty chunk. The first transport or payload error
/// is emitted as `Error` and ends the stream.
pub(super) fn decode_stream<S>(chunks: S) -> impl Stream<Item = StreamEvent>
where
    S: Stream<Item = std::result::Result<Vec<u8>, String>>,
{
    async_stream::stream! {
        let mut sse = SseBuffer::default();
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(message) => {
                    yield StreamEvent::Error(message);
                    return;
                }
            };
            for data in sse.push(&bytes) {
                match chunk_text(&data) {
                    Ok(Some(text)) => yield StreamEvent::Text(text),
                    Ok(None) => {}
                    Err(message) => {
                        yield StreamEvent::Error(message);
                        return;
                    }
                }
            }
        }

        if let Some(data) = sse.finish() {
            match chunk_text(&data) {
                Ok(Some(text)) => yield StreamEvent::Text(text),
                Ok(None) => {}
                Err(message) => yield StreamEvent::Error(message),
            }
        }
    }
}

fn chunk_text(data: &str) -> std::result::Result<Option<String>, String> {
    let parsed: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| format!("Malformed stream chunk: {}", e))?;
    parsed.into_text().map_err(|e| e.to_string())
}

fn transport_error(err: &reqwest::Error, model: &str) -> LlmError {
    let message = format!("Gemini request failed: {}", err);
    let classified = if err.is_timeout() || err.is_connect() {
        LlmError::new(ErrorCategory::Network, message)
    } else {
        ErrorClassifier::classify(&message)
    };
    classified.model(model)
}

async fn check_status(
    response: reqwest::Response,
    model: &str,
) -> std::result::Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = api_error_message(&body);
    warn!("Gemini API error ({}): {}", status, message);
    Err(ErrorClassifier::classify_http_status(status.as_u16(), &message).model(model))
}

/// Pull `error.message` out of a Gemini error body, or fall back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(500).collect())
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn new(role: &str, parts: Vec<Part>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts,
        }
    }
}

impl From<&ChatTurn> for Content {
    fn from(turn: &ChatTurn) -> Self {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = &turn.image {
            parts.push(Part::image(image));
        }
        if !turn.content.is_empty() || parts.is_empty() {
            parts.push(Part::text(&turn.content));
        }
        Content::new(turn.role.as_str(), parts)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineImage>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    fn image(image: &InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(image.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

const BLOCKING_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

impl GenerateContentResponse {
    /// Concatenated text of the first candidate. `Ok(None)` when the payload
    /// carries no text (e.g. a usage-only final chunk).
    fn into_text(self) -> std::result::Result<Option<String>, LlmError> {
        if let Some(error) = self.error {
            return Err(ErrorClassifier::classify(&error.message));
        }

        let candidate = self.candidates.into_iter().next();
        let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
        let text: String = candidate
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default();

        if !text.is_empty() {
            return Ok(Some(text));
        }

        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::new(
                ErrorCategory::PolicyBlock,
                format!("Prompt blocked: {}", reason),
            ));
        }
        if let Some(reason) = finish_reason
            && BLOCKING_FINISH_REASONS.contains(&reason.as_str())
        {
            return Err(LlmError::new(
                ErrorCategory::PolicyBlock,
                format!("Response blocked: {}", reason),
            ));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiConfig;

    fn test_client() -> GeminiClient {
        let config = AiConfig {
            api_key: Some("test-key".into()),
            api_base: "https://example.test/v1beta/".into(),
            ..Default::default()
        };
        GeminiClient::new(&config).unwrap()
    }

    fn sse(data: &str) -> Vec<u8> {
        format!("data: {}\n\n", data).into_bytes()
    }

    fn text_chunk(text: &str) -> String {
        serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_missing_key_fails_per_request() {
        let mut client = test_client();
        client.api_key = None;

        let err = client
            .complete(&CompletionRequest::new("hi", "gemini-test"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HubError::ModelUnavailable(ref e) if e.category == ErrorCategory::Auth
        ));

        let events: Vec<_> = client
            .stream_chat(&[], ChatTurn::user("hi"), "gemini-test")
            .collect()
            .await;
        assert!(matches!(events.as_slice(), [StreamEvent::Error(_)]));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", test_client());
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_endpoint() {
        let client = test_client();
        assert_eq!(
            client.endpoint("gemini-x", "generateContent"),
            "https://example.test/v1beta/models/gemini-x:generateContent"
        );
        assert_eq!(client.resolve_model(""), client.default_model);
        assert_eq!(client.resolve_model("other"), "other");
    }

    #[test]
    fn test_request_body_shape() {
        let client = test_client();
        let turn =
            ChatTurn::user("what is this?").with_image(InlineImage::new("image/png", "AAAA"));
        let body = client.body(
            vec![Content::from(&turn)],
            GenerationConfig {
                max_output_tokens: 4096,
                temperature: 0.4,
                response_mime_type: Some("application/json".into()),
                response_schema: None,
            },
            true,
        );
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "what is this?");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert!(json["generationConfig"].get("responseSchema").is_none());
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(json["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert!(json["tools"][0].get("googleSearch").is_some());
    }

    #[test]
    fn test_body_without_grounding_omits_tools() {
        let client = test_client();
        let body = client.body(
            vec![Content::new("user", vec![Part::text("hi")])],
            GenerationConfig {
                max_output_tokens: 10,
                temperature: 0.7,
                response_mime_type: None,
                response_schema: None,
            },
            false,
        );
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_into_text_concatenates_parts() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().unwrap().as_deref(), Some("Hello, world"));
    }

    #[test]
    fn test_into_text_blocked() {
        let parsed: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let err = parsed.into_text().unwrap_err();
        assert_eq!(err.category, ErrorCategory::PolicyBlock);

        let parsed: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(parsed.into_text().is_err());
    }

    #[test]
    fn test_usage_only_chunk_has_no_text() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":5}}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().unwrap(), None);
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(api_error_message(body), "Quota exceeded");
        assert_eq!(api_error_message("plain failure"), "plain failure");
    }

    #[tokio::test]
    async fn test_stream_failure_after_two_chunks() {
        let chunks = futures::stream::iter(vec![
            Ok(sse(&text_chunk("first "))),
            Ok(sse(&text_chunk("second"))),
            Err("Stream interrupted: connection reset".to_string()),
            Ok(sse(&text_chunk("never seen"))),
        ]);

        let events: Vec<StreamEvent> = decode_stream(chunks).collect().await;

        assert_eq!(
            events,
            vec![
                StreamEvent::Text("first ".into()),
                StreamEvent::Text("second".into()),
                StreamEvent::Error("Stream interrupted: connection reset".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_error_payload_ends_stream() {
        let chunks = futures::stream::iter(vec![
            Ok(sse(&text_chunk("partial"))),
            Ok(sse(r#"{"error":{"message":"Internal error, service unavailable"}}"#)),
            Ok(sse(&text_chunk("after"))),
        ]);

        let events: Vec<StreamEvent> = decode_stream(chunks).collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Text("partial".into()));
        assert!(matches!(&events[1], StreamEvent::Error(m) if m.contains("unavailable")));
    }

    #[tokio::test]
    async fn test_stream_skips_usage_chunks_and_flushes_tail() {
        let mut tail = sse(&text_chunk("tail"));
        tail.truncate(tail.len() - 2);
        let chunks = futures::stream::iter(vec![
            Ok(sse(r#"{"usageMetadata":{"promptTokenCount":3}}"#)),
            Ok(tail),
        ]);

        let events: Vec<StreamEvent> = decode_stream(chunks).collect().await;
        assert_eq!(events, vec![StreamEvent::Text("tail".into())]);
    }
}
