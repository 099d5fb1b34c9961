//! Backend HTTP client.
//!
//! Speaks the chat-completions wire format over `reqwest`, in both
//! streaming SSE and one-shot modes, and fetches the backend's model
//! listing for the catalog.  This is the production [`ChatBackend`]; the
//! orchestrator itself never touches HTTP.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use manifold_policy::{CatalogModel, ModelCapabilities, ProviderDescriptor};

use crate::config::BackendConfig;
use crate::error::{GatewayError, Result};
use crate::sse::{self, SseFrame};
use crate::turn::{ChatBackend, DeltaStream};
use crate::types::{ChatDelta, ChatMessage, ChatRequest, Role};

/// How long to wait for a TCP/TLS connection.  The overall turn budget is
/// the orchestrator's deadline, not a client-level timeout.
const CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Backend client
// ---------------------------------------------------------------------------

/// An HTTP client for one configured backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: BackendConfig,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a client for the given backend.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { config, http })
    }

    /// The backend configuration this client was built from.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Reject model ids this backend cannot route.
    ///
    /// Backends with a provider-qualified namespace require `vendor/model`
    /// ids; anything else would 404 downstream, so it is surfaced as a
    /// config error before the turn starts.
    fn validate_model_id(&self, model: &str) -> Result<()> {
        if self.config.qualified_model_ids && !model.contains('/') {
            return Err(GatewayError::Config {
                reason: format!(
                    "model id `{model}` must be qualified as `vendor/model` for backend `{}`",
                    self.config.id
                ),
            });
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if !self.config.api_key.is_empty() {
            let auth = format!("Bearer {}", self.config.api_key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth).map_err(|e| GatewayError::Config {
                    reason: format!("invalid api key for backend `{}`: {e}", self.config.id),
                })?,
            );
        }

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Build the JSON body for a chat-completions request.
    fn build_request_body(&self, request: &ChatRequest, stream: bool) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": messages_to_wire(&request.messages),
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = request.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(presence_penalty) = request.presence_penalty {
            body["presence_penalty"] = json!(presence_penalty);
        }
        if let Some(frequency_penalty) = request.frequency_penalty {
            body["frequency_penalty"] = json!(frequency_penalty);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if stream {
            body["stream"] = json!(true);
        }

        body
    }

    async fn post_chat(&self, body: &Value) -> Result<reqwest::Response> {
        let url = self.endpoint("chat/completions");

        tracing::debug!(
            url = %url,
            model = %body["model"],
            backend = %self.config.id,
            "dispatching chat request"
        );

        let resp = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await?;
        Ok(resp)
    }

    /// Fetch the backend's model listing and map it into catalog entries.
    ///
    /// Only text-output models are kept; image and video input modalities
    /// become capability flags.
    pub async fn list_models(&self) -> Result<Vec<CatalogModel>> {
        let url = self.endpoint("models");

        let resp = self
            .http
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Transport {
                status: status.as_u16(),
                body: text,
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| GatewayError::Parse {
            reason: format!("invalid JSON in model listing: {e}"),
        })?;

        let models = models_from_listing(&v, &self.config.descriptor());
        tracing::debug!(
            backend = %self.config.id,
            count = models.len(),
            "fetched model listing"
        );
        Ok(models)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn open_stream(&self, request: &ChatRequest) -> Result<Box<dyn DeltaStream>> {
        self.validate_model_id(&request.model)?;

        let body = self.build_request_body(request, true);
        let resp = self.post_chat(&body).await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Box::new(HttpDeltaStream {
            response: resp,
            line_buffer: String::new(),
            done: false,
        }))
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        self.validate_model_id(&request.model)?;

        let body = self.build_request_body(request, false);
        let resp = self.post_chat(&body).await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Transport {
                status: status.as_u16(),
                body: text,
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| GatewayError::Parse {
            reason: format!("invalid JSON response: {e}"),
        })?;

        Ok(extract_answer(&v))
    }
}

// ---------------------------------------------------------------------------
// Streaming exchange
// ---------------------------------------------------------------------------

/// One open SSE exchange.  Splits the byte stream into lines and decodes
/// them; dropping it closes the connection.
struct HttpDeltaStream {
    response: reqwest::Response,
    line_buffer: String,
    done: bool,
}

#[async_trait]
impl DeltaStream for HttpDeltaStream {
    async fn next_delta(&mut self) -> Result<Option<ChatDelta>> {
        loop {
            if self.done {
                return Ok(None);
            }

            // Drain complete lines already buffered.
            while let Some(newline) = self.line_buffer.find('\n') {
                let line: String = self.line_buffer.drain(..=newline).collect();
                match sse::decode_line(&line)? {
                    Some(SseFrame::Done) => {
                        self.done = true;
                        return Ok(None);
                    }
                    Some(SseFrame::Delta(delta)) => return Ok(Some(delta)),
                    None => {}
                }
            }

            match self.response.chunk().await {
                Ok(Some(chunk)) => {
                    let text =
                        std::str::from_utf8(&chunk).map_err(|e| GatewayError::Stream {
                            reason: format!("invalid UTF-8 in stream: {e}"),
                        })?;
                    self.line_buffer.push_str(text);
                }
                // Transport end without a [DONE] sentinel; treat as a
                // normal end of stream.
                Ok(None) => return Ok(None),
                Err(e) => {
                    return Err(GatewayError::Stream {
                        reason: format!("stream read error: {e}"),
                    });
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format conversion (free functions)
// ---------------------------------------------------------------------------

/// Convert conversation messages to the chat-completions wire format.
///
/// Tool calls ride on assistant messages under `tool_calls`; tool results
/// use `role: "tool"` with a `tool_call_id`.
fn messages_to_wire(messages: &[ChatMessage]) -> Vec<Value> {
    let mut wire: Vec<Value> = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System => wire.push(json!({
                "role": "system",
                "content": msg.content,
            })),
            Role::User => wire.push(json!({
                "role": "user",
                "content": msg.content,
            })),
            Role::Assistant => {
                if msg.tool_calls.is_empty() {
                    wire.push(json!({
                        "role": "assistant",
                        "content": msg.content,
                    }));
                } else {
                    let tool_calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": tc.id,
                                "type": "function",
                                "function": {
                                    "name": tc.name,
                                    "arguments": tc.arguments,
                                }
                            })
                        })
                        .collect();

                    let mut m = json!({
                        "role": "assistant",
                        "tool_calls": tool_calls,
                    });
                    if !msg.content.is_empty() {
                        m["content"] = json!(msg.content);
                    }
                    wire.push(m);
                }
            }
            Role::Tool => wire.push(json!({
                "role": "tool",
                "tool_call_id": msg.tool_call_id,
                "content": msg.content,
            })),
        }
    }

    wire
}

/// Extract the single answer text from a non-streaming response body.
fn extract_answer(v: &Value) -> String {
    v["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_owned()
}

/// Map a model-listing response into catalog entries for one provider.
fn models_from_listing(v: &Value, provider: &ProviderDescriptor) -> Vec<CatalogModel> {
    let Some(data) = v["data"].as_array() else {
        return Vec::new();
    };

    let mut seq = 0;
    data.iter()
        .filter(|m| {
            let arch = &m["architecture"];
            let text_output = arch["output_modalities"]
                .as_array()
                .is_some_and(|mods| mods.iter().any(|x| x.as_str() == Some("text")));
            text_output || arch["modality"].as_str() == Some("text->text")
        })
        .map(|m| {
            let inputs = m["architecture"]["input_modalities"]
                .as_array()
                .cloned()
                .unwrap_or_default();
            let has = |modality: &str| inputs.iter().any(|x| x.as_str() == Some(modality));

            let model = CatalogModel {
                name: m["id"].as_str().unwrap_or_default().to_owned(),
                display_name: m["name"].as_str().unwrap_or_default().to_owned(),
                provider: provider.clone(),
                capabilities: ModelCapabilities {
                    vision: has("image"),
                    video: has("video"),
                },
                sorted: seq,
            };
            seq += 1;
            model
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;

    fn backend(qualified: bool) -> HttpBackend {
        HttpBackend::new(BackendConfig {
            id: "openrouter".into(),
            display_name: "OpenRouter".into(),
            base_url: "https://openrouter.ai/api/v1/".into(),
            api_key: "sk-or-test".into(),
            qualified_model_ids: qualified,
        })
        .unwrap()
    }

    #[test]
    fn unqualified_model_id_is_a_config_error() {
        let b = backend(true);
        let err = b.validate_model_id("gpt-4o").unwrap_err();
        assert!(matches!(err, GatewayError::Config { .. }));
        assert!(b.validate_model_id("openai/gpt-4o").is_ok());
    }

    #[test]
    fn unqualified_ids_pass_when_backend_does_not_require_them() {
        let b = backend(false);
        assert!(b.validate_model_id("gpt-4o").is_ok());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let b = backend(false);
        assert_eq!(
            b.endpoint("chat/completions"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_includes_sampling_params_only_when_set() {
        let b = backend(true);
        let mut request =
            ChatRequest::streaming("openai/gpt-4o", vec![ChatMessage::user("Hello")]);
        request.temperature = Some(0.7);

        let body = b.build_request_body(&request, true);
        assert_eq!(body["model"], "openai/gpt-4o");
        assert_eq!(body["stream"], true);
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6);
        assert!(body.get("top_p").is_none());
        assert!(body.get("max_tokens").is_none());

        let body = b.build_request_body(&request, false);
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn messages_to_wire_basic_roles() {
        let wire = messages_to_wire(&[
            ChatMessage::system("Be helpful."),
            ChatMessage::user("Hello"),
            ChatMessage::assistant("Hi!"),
        ]);

        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[1]["role"], "user");
        assert_eq!(wire[2]["role"], "assistant");
        assert_eq!(wire[2]["content"], "Hi!");
    }

    #[test]
    fn messages_to_wire_tool_call_round() {
        let wire = messages_to_wire(&[
            ChatMessage::assistant_tool_calls(vec![ToolCall {
                id: "call_abc".into(),
                name: "read_file".into(),
                arguments: "{\"path\":\"a.txt\"}".into(),
            }]),
            ChatMessage::tool_result("call_abc", "file contents"),
        ]);

        let tc = &wire[0]["tool_calls"][0];
        assert_eq!(tc["id"], "call_abc");
        assert_eq!(tc["type"], "function");
        assert_eq!(tc["function"]["name"], "read_file");
        assert_eq!(tc["function"]["arguments"], "{\"path\":\"a.txt\"}");
        // Empty content stays off the wire.
        assert!(wire[0].get("content").is_none());

        assert_eq!(wire[1]["role"], "tool");
        assert_eq!(wire[1]["tool_call_id"], "call_abc");
        assert_eq!(wire[1]["content"], "file contents");
    }

    #[test]
    fn extract_answer_reads_first_choice() {
        let v = json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello there"},
                "finish_reason": "stop"
            }]
        });
        assert_eq!(extract_answer(&v), "Hello there");
        assert_eq!(extract_answer(&json!({})), "");
    }

    #[test]
    fn model_listing_filters_and_maps_capabilities() {
        let provider = ProviderDescriptor::new("openrouter", "OpenRouter");
        let listing = json!({
            "data": [
                {
                    "id": "openai/gpt-4o",
                    "name": "GPT-4o",
                    "architecture": {
                        "modality": "text+image->text",
                        "input_modalities": ["text", "image"],
                        "output_modalities": ["text"]
                    }
                },
                {
                    "id": "google/gemini-2.5-pro",
                    "name": "Gemini 2.5 Pro",
                    "architecture": {
                        "input_modalities": ["text", "image", "video"],
                        "output_modalities": ["text"]
                    }
                },
                {
                    "id": "some/image-gen",
                    "name": "Image Gen",
                    "architecture": {
                        "input_modalities": ["text"],
                        "output_modalities": ["image"]
                    }
                }
            ]
        });

        let models = models_from_listing(&listing, &provider);
        assert_eq!(models.len(), 2);

        assert_eq!(models[0].name, "openai/gpt-4o");
        assert!(models[0].capabilities.vision);
        assert!(!models[0].capabilities.video);
        assert_eq!(models[0].sorted, 0);

        assert!(models[1].capabilities.video);
        assert_eq!(models[1].sorted, 1);
        assert_eq!(models[1].provider.id, "openrouter");
    }

    #[test]
    fn legacy_modality_field_is_accepted() {
        let provider = ProviderDescriptor::new("openrouter", "OpenRouter");
        let listing = json!({
            "data": [{
                "id": "mistralai/mistral-large",
                "name": "Mistral Large",
                "architecture": {"modality": "text->text"}
            }]
        });

        let models = models_from_listing(&listing, &provider);
        assert_eq!(models.len(), 1);
        assert!(!models[0].capabilities.vision);
    }

    #[test]
    fn empty_listing_maps_to_no_models() {
        let provider = ProviderDescriptor::new("openrouter", "OpenRouter");
        assert!(models_from_listing(&json!({}), &provider).is_empty());
        assert!(models_from_listing(&json!({"data": []}), &provider).is_empty());
    }
}
