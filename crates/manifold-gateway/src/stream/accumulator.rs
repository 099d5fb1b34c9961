//! Tool-call reassembly.
//!
//! Backends fragment a tool invocation across many deltas: the opening
//! fragment carries the call id and function name, later fragments carry
//! only argument chunks correlated by their position in the tool-call
//! array.  The accumulator rebuilds one complete record per position for
//! the duration of a single turn; aborting the turn drops the accumulator
//! and all partial state with it.

use std::collections::BTreeMap;

use crate::types::{ToolCall, ToolCallFragment};

/// In-progress tool call at one stream position.
#[derive(Debug)]
struct PendingCall {
    call_id: String,
    function_name: String,
    argument_buffer: String,
}

/// Rebuilds complete tool calls from per-delta fragments, keyed by stream
/// position.  Scoped to one turn.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    records: BTreeMap<u32, PendingCall>,
}

impl ToolCallAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no record has been opened yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ingest one fragment.
    ///
    /// A fragment carrying a `call_id` opens (or reopens, replacing any
    /// previous state) the record at its index.  A fragment without one
    /// appends its chunk to the record already open at that index; if no
    /// such record exists the fragment is a protocol anomaly and is dropped
    /// without failing the turn.
    pub fn ingest(&mut self, fragment: ToolCallFragment) {
        match fragment.call_id {
            Some(call_id) => {
                self.records.insert(
                    fragment.index,
                    PendingCall {
                        call_id,
                        function_name: fragment.function_name.unwrap_or_default(),
                        argument_buffer: fragment.argument_chunk,
                    },
                );
            }
            None => match self.records.get_mut(&fragment.index) {
                Some(record) => record.argument_buffer.push_str(&fragment.argument_chunk),
                None => {
                    tracing::warn!(
                        index = fragment.index,
                        "dropping tool-call continuation with no open record"
                    );
                }
            },
        }
    }

    /// Consume the accumulator and return the completed records in
    /// ascending index order.
    pub fn finalize(self) -> Vec<ToolCall> {
        self.records
            .into_values()
            .map(|record| ToolCall {
                id: record.call_id,
                name: record.function_name,
                arguments: record.argument_buffer,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
