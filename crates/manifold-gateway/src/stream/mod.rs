//! Streaming response reconstruction.
//!
//! A backend streams a turn as many small deltas: reasoning text, answer
//! text, and tool-call fragments, interleaved with keep-alive frames.  This
//! module reassembles that into well-formed events:
//!
//! - [`classifier`] -- Decides which text channel (if any) a delta feeds.
//! - [`accumulator`] -- Rebuilds complete tool calls from fragments keyed by
//!   stream position.

pub mod accumulator;
pub mod classifier;

pub use accumulator::ToolCallAccumulator;
pub use classifier::{DeltaPayload, classify};
