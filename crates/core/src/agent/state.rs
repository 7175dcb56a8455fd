use std::collections::HashSet;
use std::future::pending;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use zikomo_model::{ModelRequest, ToolCallRequest};

use super::AgentInner;
use crate::error::TurnError;
use crate::model_client::OracleReply;
use crate::observe::Observer;
use crate::tool::{Error as ToolError, ToolResult};
use crate::transcript::{Content, Role, Transcript};

/// The stage of a turn.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    /// Waiting for the oracle to answer the transcript.
    #[default]
    AwaitingOracle,
    /// Running the tools the oracle requested.
    Dispatching,
    /// The oracle gave a final answer.
    Done,
    /// The turn ended with an error.
    Failed,
}

impl TurnStage {
    /// Returns `true` for [`Done`](Self::Done) and [`Failed`](Self::Failed).
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnStage::Done | TurnStage::Failed)
    }
}

#[derive(Default)]
struct LoopState {
    transcript: Transcript,
    step_count: usize,
    stage: TurnStage,
    pending: Vec<ToolCallRequest>,
}

/// Drives one turn from the user message to a final answer.
pub(super) struct TurnLoop {
    inner: Arc<AgentInner>,
    observer: Observer,
    cancel_rx: watch::Receiver<bool>,
    state: LoopState,
}

impl TurnLoop {
    pub(super) fn new(
        inner: Arc<AgentInner>,
        observer: Observer,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            inner,
            observer,
            cancel_rx,
            state: LoopState::default(),
        }
    }

    pub(super) async fn run(
        mut self,
        input: String,
    ) -> Result<Transcript, TurnError> {
        debug!("turn started");
        self.append(Role::User, Content::Text(input));

        loop {
            let result = match self.state.stage {
                TurnStage::AwaitingOracle => self.consult_oracle().await,
                TurnStage::Dispatching => self.dispatch_pending().await,
                TurnStage::Done => {
                    debug!(steps = self.state.step_count, "turn finished");
                    return Ok(self.state.transcript);
                }
                TurnStage::Failed => unreachable!("failed turns return early"),
            };
            if let Err(err) = result {
                warn!(steps = self.state.step_count, "turn failed: {err}");
                return Err(err);
            }
        }
    }

    async fn consult_oracle(&mut self) -> Result<(), TurnError> {
        if self.is_cancelled() {
            return Err(self.fail(TurnError::Cancelled));
        }

        let inner = &self.inner;
        let config = &inner.config;
        let req = ModelRequest {
            messages: self
                .state
                .transcript
                .to_model_messages(inner.system_prompt.as_deref()),
            tools: inner.registry.definitions(),
        };
        trace!("consulting the oracle, step {}", self.state.step_count);

        let reply = tokio::select! {
            biased;
            _ = cancelled(&mut self.cancel_rx) => {
                debug!("oracle request abandoned");
                return Err(self.fail(TurnError::Cancelled));
            }
            reply = inner.model_client.send_request(
                req,
                config.oracle_timeout(),
                config.oracle_retry(),
            ) => reply,
        };
        let OracleReply {
            text, tool_calls, ..
        } = match reply {
            Ok(reply) => reply,
            Err(err) => {
                return Err(self.fail(TurnError::OracleUnavailable(err)));
            }
        };

        if tool_calls.is_empty() {
            self.state.stage = TurnStage::Done;
            self.append(Role::Assistant, Content::Text(text));
            return Ok(());
        }

        let calls = assign_call_ids(tool_calls, self.state.step_count);
        debug!("oracle requested {} tool call(s)", calls.len());
        self.state.pending = calls.clone();
        self.state.stage = TurnStage::Dispatching;
        self.append(Role::Assistant, Content::ToolCalls { text, calls });
        Ok(())
    }

    async fn dispatch_pending(&mut self) -> Result<(), TurnError> {
        let max_steps = self.inner.config.max_steps().get();
        if self.is_cancelled() {
            return Err(self.abandon_pending(TurnError::Cancelled));
        }
        if self.state.step_count >= max_steps {
            return Err(
                self.abandon_pending(TurnError::StepBudgetExceeded { max_steps })
            );
        }

        let requests = std::mem::take(&mut self.state.pending);
        let results = self
            .inner
            .registry
            .dispatch(requests, self.inner.config.tool_timeout())
            .await;
        self.state.step_count += 1;

        let mut results = results.into_iter().peekable();
        while let Some(result) = results.next() {
            // The last result completes the round.
            if results.peek().is_none() {
                self.state.stage = TurnStage::AwaitingOracle;
            }
            self.append(Role::Tool, Content::ToolResult(result));
        }
        self.state.stage = TurnStage::AwaitingOracle;
        Ok(())
    }

    /// Answers every pending request with a "not executed" result and fails.
    fn abandon_pending(&mut self, err: TurnError) -> TurnError {
        self.state.stage = TurnStage::Failed;
        let pending = std::mem::take(&mut self.state.pending);
        if pending.is_empty() {
            self.emit();
            return err;
        }
        for req in pending {
            let reason = err.to_string();
            let result = ToolResult {
                id: req.id,
                name: req.name,
                output: Err(ToolError::not_executed().with_reason(reason)),
            };
            self.append(Role::Tool, Content::ToolResult(result));
        }
        err
    }

    fn fail(&mut self, err: TurnError) -> TurnError {
        self.state.stage = TurnStage::Failed;
        self.emit();
        err
    }

    fn append(&mut self, role: Role, content: Content) {
        let entry = self.state.transcript.append(role, content);
        trace!("appended entry #{} ({})", entry.seq(), role.as_str());
        self.emit();
    }

    #[inline]
    fn emit(&self) {
        self.observer
            .emit(self.state.transcript.entries(), self.state.stage);
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }
}

/// Resolves once the turn is cancelled, never if its handle is gone.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    if cancel_rx.wait_for(|cancelled| *cancelled).await.is_err() {
        pending::<()>().await;
    }
}

/// Replaces missing or repeated correlation ids so that they are unique
/// within the step.
fn assign_call_ids(
    mut calls: Vec<ToolCallRequest>,
    step: usize,
) -> Vec<ToolCallRequest> {
    let mut seen = HashSet::new();
    for (idx, call) in calls.iter_mut().enumerate() {
        if !call.id.is_empty() && seen.insert(call.id.clone()) {
            continue;
        }
        let mut id = format!("call_{step}_{idx}");
        let mut suffix = 1;
        while !seen.insert(id.clone()) {
            id = format!("call_{step}_{idx}_{suffix}");
            suffix += 1;
        }
        warn!("replacing correlation id `{}` with `{id}`", call.id);
        call.id = id;
    }
    calls
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use zikomo_test_model::TestModelProvider;

    use super::*;
    use crate::AgentBuilder;
    use crate::observe;
    use crate::tool::ErrorKind as ToolErrorKind;

    fn call(id: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_owned(),
            name: "search".to_owned(),
            arguments: json!({}),
        }
    }

    #[test]
    fn test_assign_call_ids() {
        let calls = assign_call_ids(vec![call("a"), call(""), call("a")], 2);
        let ids: Vec<_> = calls.iter().map(|call| call.id.as_str()).collect();
        assert_eq!(ids, ["a", "call_2_1", "call_2_2"]);
    }

    #[test]
    fn test_assigned_ids_avoid_taken_ones() {
        let calls = assign_call_ids(vec![call("call_0_1"), call("")], 0);
        let ids: Vec<_> = calls.iter().map(|call| call.id.as_str()).collect();
        assert_eq!(ids, ["call_0_1", "call_0_1_1"]);

        let calls = assign_call_ids(
            vec![call("call_1_1"), call("call_1_1_1"), call("call_1_1")],
            1,
        );
        let ids: Vec<_> = calls.iter().map(|call| call.id.as_str()).collect();
        assert_eq!(ids, ["call_1_1", "call_1_1_1", "call_1_2"]);
    }

    #[tokio::test]
    async fn test_cancel_before_dispatch() {
        let agent = AgentBuilder::with_model_provider(
            TestModelProvider::default(),
        )
        .build()
        .unwrap();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (observer, mut snapshots) = observe::channel(None);
        let mut turn_loop =
            TurnLoop::new(Arc::clone(&agent.inner), observer, cancel_rx);

        let calls = vec![call("call_a"), call("call_b")];
        turn_loop.append(Role::User, Content::Text("Go".to_owned()));
        turn_loop.state.pending = calls.clone();
        turn_loop.state.stage = TurnStage::Dispatching;
        turn_loop.append(
            Role::Assistant,
            Content::ToolCalls {
                text: String::new(),
                calls,
            },
        );

        cancel_tx.send_replace(true);
        let err = turn_loop.dispatch_pending().await.unwrap_err();
        assert_eq!(err, TurnError::Cancelled);
        assert_eq!(turn_loop.state.step_count, 0);

        let results: Vec<_> =
            turn_loop.state.transcript.tool_results().collect();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["call_a", "call_b"]);
        for result in &results {
            assert_eq!(
                result.output.as_ref().unwrap_err().kind(),
                ToolErrorKind::NotExecuted
            );
        }

        drop(turn_loop);
        let snapshots = snapshots.collect().await;
        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots[1].stage(), TurnStage::Dispatching);
        assert_eq!(snapshots[3].stage(), TurnStage::Failed);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(!TurnStage::AwaitingOracle.is_terminal());
        assert!(!TurnStage::Dispatching.is_terminal());
        assert!(TurnStage::Done.is_terminal());
        assert!(TurnStage::Failed.is_terminal());
    }
}
