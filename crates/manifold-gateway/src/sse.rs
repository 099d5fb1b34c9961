//! SSE line decoding.
//!
//! Backends stream turns as standard SSE: `data:` lines carrying JSON
//! payloads, a `data: [DONE]` sentinel at the end, and the occasional
//! comment or `event:` line in between.  This module decodes one line at a
//! time into [`ChatDelta`] values; splitting the byte stream into lines is
//! the transport's job.

use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::types::{ChatDelta, ToolCallFragment};

/// One decoded SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A delta payload.
    Delta(ChatDelta),

    /// The `[DONE]` stream terminator.
    Done,
}

/// Decode a single SSE line.
///
/// Returns `Ok(None)` for lines that carry no frame: blanks, comments, and
/// `event:`/`id:` field lines.  Invalid JSON in a `data:` payload is an
/// error.
pub fn decode_line(line: &str) -> Result<Option<SseFrame>> {
    let line = line.trim_end();

    // SSE comment lines start with `:`.
    if line.is_empty() || line.starts_with(':') {
        return Ok(None);
    }

    let Some(data) = line.strip_prefix("data: ") else {
        tracing::trace!(line, "ignoring non-data SSE line");
        return Ok(None);
    };

    let data = data.trim();
    if data == "[DONE]" {
        return Ok(Some(SseFrame::Done));
    }

    let v: Value = serde_json::from_str(data).map_err(|e| GatewayError::Parse {
        reason: format!("invalid JSON in SSE data: {e}"),
    })?;

    Ok(Some(SseFrame::Delta(delta_from_value(&v))))
}

/// Extract the delta payload from a chat-completion chunk.
fn delta_from_value(v: &Value) -> ChatDelta {
    let delta = &v["choices"][0]["delta"];

    let tool_call = delta["tool_calls"]
        .as_array()
        .and_then(|fragments| fragments.first())
        .map(fragment_from_value);

    ChatDelta {
        reasoning: delta["reasoning_content"].as_str().map(str::to_owned),
        content: delta["content"].as_str().map(str::to_owned),
        tool_call,
    }
}

/// Extract one tool-call fragment from a `tool_calls` array entry.
fn fragment_from_value(tc: &Value) -> ToolCallFragment {
    ToolCallFragment {
        index: tc["index"].as_u64().unwrap_or(0) as u32,
        call_id: tc["id"].as_str().map(str::to_owned),
        function_name: tc["function"]["name"].as_str().map(str::to_owned),
        argument_chunk: tc["function"]["arguments"]
            .as_str()
            .unwrap_or_default()
            .to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
