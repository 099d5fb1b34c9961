//! Core types for the gateway.
//!
//! These model the data flowing between a chat client and the backend
//! providers.  They are provider-agnostic; the [`crate::client`] module
//! translates them into the wire format.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// The role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions that shape model behavior.
    System,
    /// Input from the human user.
    User,
    /// Output from the model.
    Assistant,
    /// Result of a tool invocation, fed back to the model.
    Tool,
}

/// A single message in a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced this message.
    pub role: Role,

    /// The textual content.  For [`Role::Tool`] messages this is the
    /// serialized tool result; for [`Role::Assistant`] messages that carry
    /// only tool calls it may be empty.
    #[serde(default)]
    pub content: String,

    /// Tool calls requested by the assistant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Which tool call this message responds to (only for [`Role::Tool`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant text message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create an assistant message that carries tool calls.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tool calls
// ---------------------------------------------------------------------------

/// A complete tool invocation reassembled from a turn's stream.
///
/// The arguments stay a raw string buffer at this layer: the gateway
/// reassembles the fragments, the caller decides when (and whether) the
/// buffer parses as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier assigned by the model for correlating results.
    pub id: String,

    /// The function name to invoke.
    pub name: String,

    /// The accumulated argument buffer.
    pub arguments: String,
}

/// One tool-call fragment as it arrives on a single delta.
///
/// A fragment with a `call_id` opens (or reopens) the record at its index;
/// one without a `call_id` extends the record already open there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallFragment {
    /// Position of the call in the response's tool-call array.
    pub index: u32,

    /// Present on the opening fragment of each call.
    pub call_id: Option<String>,

    /// Present on the opening fragment of each call.
    pub function_name: Option<String>,

    /// A chunk of the argument buffer, possibly empty.
    pub argument_chunk: String,
}

// ---------------------------------------------------------------------------
// Stream deltas and emitted events
// ---------------------------------------------------------------------------

/// One incremental unit of a streamed model response, decoded from the wire.
///
/// All fields are independent and optional; a delta carrying none of them is
/// a keep-alive or structural frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatDelta {
    /// A chunk of intermediate "thinking" text.
    pub reasoning: Option<String>,

    /// A chunk of final answer text.
    pub content: Option<String>,

    /// At most one tool-call fragment per delta.
    pub tool_call: Option<ToolCallFragment>,
}

/// An event emitted to the caller while a turn streams.
///
/// Events are delivered in arrival order; `Done` is terminal and carries the
/// finalized tool calls (possibly none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// A chunk of reasoning-channel text.
    Reasoning(String),

    /// A chunk of answer-channel text.
    Answer(String),

    /// The turn completed; all tool calls are finalized.
    Done(Vec<ToolCall>),

    /// The turn failed (timeout, transport, or decode).
    Failed(String),
}

// ---------------------------------------------------------------------------
// Chat request
// ---------------------------------------------------------------------------

/// A full request to send to a backend.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The model identifier, e.g. `"openai/gpt-4o"`.
    pub model: String,

    /// The conversation history.
    pub messages: Vec<ChatMessage>,

    /// Whether to use streaming mode.
    #[serde(skip)]
    pub stream: bool,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Presence penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    /// Frequency penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    /// Maximum tokens the model may generate in this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a streaming request with default sampling parameters.
    pub fn streaming(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            temperature: None,
            top_p: None,
            presence_penalty: None,
            frequency_penalty: None,
            max_tokens: None,
        }
    }

    /// Create a non-streaming request with default sampling parameters.
    pub fn oneshot(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            stream: false,
            ..Self::streaming(model, messages)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
