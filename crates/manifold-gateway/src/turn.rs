//! Turn orchestration.
//!
//! Drives one chat turn end-to-end: issues the request, arms a deadline,
//! feeds every delta through the classifier and the tool-call accumulator,
//! emits typed events to the caller in arrival order, and on completion
//! hands finalized tool calls to a caller-supplied continuation.
//!
//! One turn is one sequential decode loop; concurrent turns are fully
//! independent, each owning its own accumulator and deadline.  Cancellation
//! is cooperative and structured: the caller trips a
//! [`CancellationToken`], the in-flight exchange is dropped (which stops
//! byte consumption), partial tool-call state is discarded, and no further
//! events are emitted.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::TimeoutConfig;
use crate::error::{GatewayError, Result};
use crate::stream::accumulator::ToolCallAccumulator;
use crate::stream::classifier::{self, DeltaPayload};
use crate::types::{ChatDelta, ChatMessage, ChatRequest, ToolCall, TurnEvent};

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// A backend capable of serving chat turns.
///
/// The production implementation is [`crate::client::HttpBackend`]; tests
/// drive the orchestrator with scripted implementations.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a streaming exchange for the request.
    async fn open_stream(&self, request: &ChatRequest) -> Result<Box<dyn DeltaStream>>;

    /// Await one complete response body and return its single answer text.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// One open streaming exchange, delivering deltas in arrival order.
///
/// Dropping the stream closes the exchange; no further bytes are consumed.
#[async_trait]
pub trait DeltaStream: Send {
    /// The next delta, or `None` at end of stream.
    async fn next_delta(&mut self) -> Result<Option<ChatDelta>>;
}

// ---------------------------------------------------------------------------
// Caller seams
// ---------------------------------------------------------------------------

/// Executes finalized tool calls on behalf of the caller.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run one call and return the result content to feed back to the
    /// model.
    async fn execute(&self, call: &ToolCall) -> String;
}

/// Receives the hand-off when a turn finalizes with tool calls.
///
/// `assistant` is the tool-call message and `results` the tool-result
/// messages, ready to append to the conversation for the dependent
/// follow-up turn.  Whether and how deep to chain follow-ups is the
/// caller's concern.
#[async_trait]
pub trait TurnContinuation: Send {
    async fn resume(&mut self, assistant: ChatMessage, results: Vec<ChatMessage>);
}

// ---------------------------------------------------------------------------
// Outcome and state
// ---------------------------------------------------------------------------

/// Terminal result of a turn that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The stream ended normally.  Carries the finalized tool calls
    /// (possibly none).
    Completed { tool_calls: Vec<ToolCall> },

    /// The caller cancelled before completion.  Not a failure.
    Aborted,
}

/// Lifecycle of one turn, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Idle,
    Sending,
    Streaming,
    Completed,
    Aborted,
    Failed,
}

fn enter(turn_id: Uuid, state: &mut TurnState, next: TurnState) {
    tracing::debug!(turn_id = %turn_id, from = ?state, to = ?next, "turn state transition");
    *state = next;
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives chat turns against one backend.
///
/// The orchestrator is stateless across turns; it may be shared and used
/// for any number of concurrent turns.
pub struct TurnOrchestrator<B: ChatBackend> {
    backend: B,
    timeouts: TimeoutConfig,
}

impl<B: ChatBackend> TurnOrchestrator<B> {
    /// Create an orchestrator over a backend with the given deadline
    /// policy.
    pub fn new(backend: B, timeouts: TimeoutConfig) -> Self {
        Self { backend, timeouts }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one streaming turn.
    ///
    /// Events are delivered on `events` in arrival order, ending with
    /// either `Done` or `Failed`.  On completion with finalized tool
    /// calls, `tools` executes them and `continuation` receives the
    /// assistant tool-call message plus the result messages.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Timeout`] when the deadline expires, or the
    /// underlying transport/decode error.  Caller cancellation is not an
    /// error; it yields `Ok(TurnOutcome::Aborted)`.
    pub async fn run_streaming(
        &self,
        request: &ChatRequest,
        events: mpsc::Sender<TurnEvent>,
        cancel: CancellationToken,
        tools: &dyn ToolExecutor,
        continuation: &mut dyn TurnContinuation,
    ) -> Result<TurnOutcome> {
        let turn_id = Uuid::now_v7();
        let mut state = TurnState::Idle;

        let budget = self.timeouts.budget_for(&request.model);
        tracing::info!(
            turn_id = %turn_id,
            model = %request.model,
            budget_secs = budget.as_secs(),
            "starting streaming turn"
        );

        // A single absolute deadline, armed when the request leaves.  It
        // covers connecting, the wait for the first byte, and the whole
        // stream.
        enter(turn_id, &mut state, TurnState::Sending);
        let deadline = Instant::now() + budget;

        let mut stream = tokio::select! {
            _ = cancel.cancelled() => {
                enter(turn_id, &mut state, TurnState::Aborted);
                return Ok(TurnOutcome::Aborted);
            }
            _ = tokio::time::sleep_until(deadline) => {
                enter(turn_id, &mut state, TurnState::Failed);
                return Err(fail(&events, timeout_error(request, budget)).await);
            }
            opened = self.backend.open_stream(request) => match opened {
                Ok(stream) => stream,
                Err(e) => {
                    enter(turn_id, &mut state, TurnState::Failed);
                    return Err(fail(&events, e).await);
                }
            }
        };

        let mut accumulator = ToolCallAccumulator::new();

        loop {
            let delta = tokio::select! {
                _ = cancel.cancelled() => {
                    // Dropping the stream stops byte consumption; dropping
                    // the accumulator discards partial tool-call state.
                    enter(turn_id, &mut state, TurnState::Aborted);
                    return Ok(TurnOutcome::Aborted);
                }
                _ = tokio::time::sleep_until(deadline) => {
                    enter(turn_id, &mut state, TurnState::Failed);
                    return Err(fail(&events, timeout_error(request, budget)).await);
                }
                next = stream.next_delta() => match next {
                    Ok(Some(delta)) => delta,
                    Ok(None) => break,
                    Err(e) => {
                        enter(turn_id, &mut state, TurnState::Failed);
                        return Err(fail(&events, e).await);
                    }
                }
            };

            if state == TurnState::Sending {
                enter(turn_id, &mut state, TurnState::Streaming);
            }

            let event = match classifier::classify(&delta) {
                DeltaPayload::Reasoning(text) => Some(TurnEvent::Reasoning(text)),
                DeltaPayload::Answer(text) => Some(TurnEvent::Answer(text)),
                DeltaPayload::Empty => None,
            };

            if let Some(fragment) = delta.tool_call {
                accumulator.ingest(fragment);
            }

            if let Some(event) = event {
                if events.send(event).await.is_err() {
                    // The receiver is gone; nobody is listening to this turn.
                    tracing::debug!(turn_id = %turn_id, "event receiver dropped; aborting turn");
                    enter(turn_id, &mut state, TurnState::Aborted);
                    return Ok(TurnOutcome::Aborted);
                }
            }
        }

        drop(stream);
        enter(turn_id, &mut state, TurnState::Completed);

        let tool_calls = accumulator.finalize();
        tracing::info!(
            turn_id = %turn_id,
            tool_count = tool_calls.len(),
            "streaming turn completed"
        );

        if events
            .send(TurnEvent::Done(tool_calls.clone()))
            .await
            .is_err()
        {
            tracing::trace!(turn_id = %turn_id, "event receiver dropped before Done");
        }

        if !tool_calls.is_empty() {
            let assistant = ChatMessage::assistant_tool_calls(tool_calls.clone());
            let mut results = Vec::with_capacity(tool_calls.len());
            for call in &tool_calls {
                let content = tools.execute(call).await;
                results.push(ChatMessage::tool_result(&call.id, content));
            }
            continuation.resume(assistant, results).await;
        }

        Ok(TurnOutcome::Completed { tool_calls })
    }

    /// Run one non-streaming turn: await the complete response body and
    /// emit its single answer in one step.  No classifier or accumulator
    /// involvement.
    pub async fn run_oneshot(
        &self,
        request: &ChatRequest,
        events: mpsc::Sender<TurnEvent>,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome> {
        let turn_id = Uuid::now_v7();
        let mut state = TurnState::Idle;

        let budget = self.timeouts.budget_for(&request.model);
        tracing::info!(
            turn_id = %turn_id,
            model = %request.model,
            budget_secs = budget.as_secs(),
            "starting one-shot turn"
        );

        enter(turn_id, &mut state, TurnState::Sending);
        let deadline = Instant::now() + budget;

        let answer = tokio::select! {
            _ = cancel.cancelled() => {
                enter(turn_id, &mut state, TurnState::Aborted);
                return Ok(TurnOutcome::Aborted);
            }
            _ = tokio::time::sleep_until(deadline) => {
                enter(turn_id, &mut state, TurnState::Failed);
                return Err(fail(&events, timeout_error(request, budget)).await);
            }
            result = self.backend.complete(request) => match result {
                Ok(answer) => answer,
                Err(e) => {
                    enter(turn_id, &mut state, TurnState::Failed);
                    return Err(fail(&events, e).await);
                }
            }
        };

        enter(turn_id, &mut state, TurnState::Completed);
        let _ = events.send(TurnEvent::Answer(answer)).await;
        let _ = events.send(TurnEvent::Done(Vec::new())).await;
        Ok(TurnOutcome::Completed {
            tool_calls: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Failure helpers
// ---------------------------------------------------------------------------

fn timeout_error(request: &ChatRequest, budget: std::time::Duration) -> GatewayError {
    GatewayError::Timeout {
        model: request.model.clone(),
        secs: budget.as_secs(),
    }
}

/// Surface a failure on the event channel, then hand the error back for
/// propagation.
async fn fail(events: &mpsc::Sender<TurnEvent>, err: GatewayError) -> GatewayError {
    tracing::warn!(error = %err, "turn failed");
    let _ = events.send(TurnEvent::Failed(err.to_string())).await;
    err
}
