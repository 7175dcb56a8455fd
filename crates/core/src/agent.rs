mod builder;
mod state;

use std::panic::resume_unwind;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::AgentConfig;
use crate::error::TurnError;
use crate::filter::TranslationFilter;
use crate::model_client::ModelClient;
use crate::observe::{self, ObservationStream};
use crate::tool::Registry;
use crate::transcript::Transcript;
pub use builder::AgentBuilder;
use state::TurnLoop;
pub use state::TurnStage;

/// An agent instance, which holds a model provider, the registered tools,
/// and the configuration shared by all turns.
///
/// Each call to [`start_turn`] runs one user message to completion in its
/// own task. Turns may run concurrently, they only share the registry and
/// the resources its tools own.
///
/// [`start_turn`]: Agent::start_turn
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    model_client: ModelClient,
    registry: Registry,
    config: AgentConfig,
    system_prompt: Option<String>,
    filter: Option<TranslationFilter>,
    next_turn_id: AtomicU64,
}

impl Agent {
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            model_client,
            registry,
            config,
            system_prompt,
            translator,
            ..
        } = builder;

        let filter = match (translator, config.target_language()) {
            (Some(translator), Some(lang)) => {
                Some(TranslationFilter::new(translator, lang))
            }
            _ => None,
        };

        Self {
            inner: Arc::new(AgentInner {
                model_client,
                registry,
                config,
                system_prompt,
                filter,
                next_turn_id: AtomicU64::new(1),
            }),
        }
    }

    /// Starts a turn for the given user message.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn start_turn<S: Into<String>>(&self, input: S) -> Turn {
        let id = self.inner.next_turn_id.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (observer, snapshots) = observe::channel(self.inner.filter.clone());

        let turn_loop =
            TurnLoop::new(Arc::clone(&self.inner), observer, cancel_rx);
        let input = input.into();
        let task = tokio::spawn(
            turn_loop.run(input).instrument(debug_span!("turn", id)),
        );

        Turn {
            id,
            snapshots,
            task,
            cancel_tx,
        }
    }

    /// Runs a turn to completion, ignoring its snapshots.
    pub async fn run<S: Into<String>>(
        &self,
        input: S,
    ) -> Result<Transcript, TurnError> {
        self.start_turn(input).finish().await
    }

    /// Returns the tool registry.
    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }
}

/// A handle to a running turn.
///
/// Dropping the handle doesn't stop the turn, use [`cancel`] for that.
///
/// [`cancel`]: Turn::cancel
pub struct Turn {
    id: u64,
    snapshots: ObservationStream,
    task: JoinHandle<Result<Transcript, TurnError>>,
    cancel_tx: watch::Sender<bool>,
}

impl Turn {
    /// Returns the id of this turn, unique within its agent.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the snapshots emitted by this turn.
    #[inline]
    pub fn snapshots(&mut self) -> &mut ObservationStream {
        &mut self.snapshots
    }

    /// Asks the turn to stop.
    ///
    /// A pending oracle request is abandoned. Tool invocations that have
    /// started are awaited, requests that haven't are answered with a
    /// "not executed" result. The turn then fails with
    /// [`TurnError::Cancelled`]. Has no effect on a finished turn.
    #[inline]
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Waits for the turn to end and returns its transcript.
    pub async fn finish(self) -> Result<Transcript, TurnError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => resume_unwind(err.into_panic()),
            Err(_) => Err(TurnError::Cancelled),
        }
    }
}
