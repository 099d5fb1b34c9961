//! Streaming turn orchestration for the Manifold gateway.
//!
//! Sits between a chat client and interchangeable LLM backends: dispatches
//! one chat turn to a backend, reconstructs the incremental response stream
//! (reasoning text, answer text, fragmented tool calls) into well-formed
//! ordered events under a hard deadline, and hands finalized tool calls to
//! the caller for a dependent follow-up turn.  Which backends and models a
//! turn may target is decided up front by the `manifold-policy` crate.
//!
//! ## Architecture
//!
//! ```text
//!  caller ──> TurnOrchestrator ──> ChatBackend (HTTP / scripted)
//!                   │                     │
//!                   │   per delta         ▼
//!                   ├──> classifier ── reasoning / answer
//!                   ├──> accumulator ─ tool-call fragments
//!                   ▼
//!             TurnEvent channel (Reasoning | Answer | Done | Failed)
//! ```
//!
//! ## Modules
//!
//! - [`types`] -- Messages, requests, deltas, emitted events.
//! - [`stream`] -- Delta classification and tool-call reassembly.
//! - [`sse`] -- SSE line decoding.
//! - [`turn`] -- The turn orchestrator and its backend/caller seams.
//! - [`client`] -- The production HTTP backend.
//! - [`config`] -- Gateway configuration and the per-model timeout policy.
//! - [`error`] -- Gateway error types.

pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod stream;
pub mod turn;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use client::HttpBackend;
pub use config::{BackendConfig, GatewayConfig, TimeoutConfig};
pub use error::{GatewayError, Result};
pub use stream::{DeltaPayload, ToolCallAccumulator, classify};
pub use turn::{
    ChatBackend, DeltaStream, ToolExecutor, TurnContinuation, TurnOrchestrator, TurnOutcome,
};
pub use types::{
    ChatDelta, ChatMessage, ChatRequest, Role, ToolCall, ToolCallFragment, TurnEvent,
};
