//! Delta classification.
//!
//! Each incoming delta carries up to two independent text payloads: a
//! reasoning chunk and an answer chunk.  When both are non-empty the
//! reasoning chunk wins; the answer chunk is only considered once the
//! reasoning channel is silent.  A delta with neither is a keep-alive or
//! structural frame and produces no event (tool-call fragments ride
//! alongside and are routed to the accumulator separately).

use crate::types::ChatDelta;

/// The text channel a delta feeds, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaPayload {
    /// A chunk of intermediate reasoning text.
    Reasoning(String),

    /// A chunk of final answer text.
    Answer(String),

    /// No text payload; nothing to emit.
    Empty,
}

/// Classify a delta's text payload.
pub fn classify(delta: &ChatDelta) -> DeltaPayload {
    if let Some(reasoning) = &delta.reasoning
        && !reasoning.is_empty()
    {
        return DeltaPayload::Reasoning(reasoning.clone());
    }

    if let Some(content) = &delta.content
        && !content.is_empty()
    {
        return DeltaPayload::Answer(content.clone());
    }

    DeltaPayload::Empty
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCallFragment;

    fn delta(reasoning: Option<&str>, content: Option<&str>) -> ChatDelta {
        ChatDelta {
            reasoning: reasoning.map(str::to_owned),
            content: content.map(str::to_owned),
            tool_call: None,
        }
    }

    #[test]
    fn reasoning_only_classifies_as_reasoning() {
        assert_eq!(
            classify(&delta(Some("thinking"), None)),
            DeltaPayload::Reasoning("thinking".into())
        );
    }

    #[test]
    fn answer_only_classifies_as_answer() {
        assert_eq!(
            classify(&delta(None, Some("hello"))),
            DeltaPayload::Answer("hello".into())
        );
    }

    #[test]
    fn reasoning_wins_when_both_present() {
        assert_eq!(
            classify(&delta(Some("thinking"), Some("hello"))),
            DeltaPayload::Reasoning("thinking".into())
        );
    }

    #[test]
    fn empty_reasoning_falls_through_to_answer() {
        assert_eq!(
            classify(&delta(Some(""), Some("hello"))),
            DeltaPayload::Answer("hello".into())
        );
    }

    #[test]
    fn keepalive_frames_classify_as_empty() {
        assert_eq!(classify(&delta(None, None)), DeltaPayload::Empty);
        assert_eq!(classify(&delta(Some(""), Some(""))), DeltaPayload::Empty);
    }

    #[test]
    fn tool_fragment_does_not_affect_text_classification() {
        let d = ChatDelta {
            reasoning: None,
            content: None,
            tool_call: Some(ToolCallFragment {
                index: 0,
                call_id: Some("tc_1".into()),
                function_name: Some("lookup".into()),
                argument_chunk: String::new(),
            }),
        };
        assert_eq!(classify(&d), DeltaPayload::Empty);
    }
}
