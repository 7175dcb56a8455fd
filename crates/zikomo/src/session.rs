use std::sync::Arc;

use zikomo_core::filter::Translator;
use zikomo_core::tool::RegistryError;
use zikomo_core::{Agent, AgentBuilder, AgentConfig, Turn};
use zikomo_model::ModelProvider;

use crate::query::{QueryItem, QueryRequest, QueryResponse};
use crate::slots::SlotBook;
use crate::tools::*;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    slot_book: Option<Arc<SlotBook>>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let agent_builder = AgentBuilder::with_model_provider(provider);
        Self {
            agent_builder,
            slot_book: None,
        }
    }

    /// Sets the system prompt for the agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.agent_builder = self.agent_builder.with_system_prompt(prompt);
        self
    }

    /// Sets the agent configuration.
    #[inline]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.agent_builder = self.agent_builder.with_config(config);
        self
    }

    /// Sets the translator for the messages shown to the user.
    #[inline]
    pub fn with_translator<T: Translator>(mut self, translator: T) -> Self {
        self.agent_builder = self.agent_builder.with_translator(translator);
        self
    }

    /// Uses the given appointment book instead of the default schedule.
    #[inline]
    pub fn with_slot_book(mut self, slot_book: Arc<SlotBook>) -> Self {
        self.slot_book = Some(slot_book);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Result<Session, RegistryError> {
        let slot_book = self.slot_book.unwrap_or_default();
        let agent = self
            .agent_builder
            .with_tool(WeatherTool::new())
            .with_tool(SearchTool::new())
            .with_tool(CheckAvailabilityTool::new(Arc::clone(&slot_book)))
            .with_tool(BookAppointmentTool::new(Arc::clone(&slot_book)))
            .build()?;

        Ok(Session { agent, slot_book })
    }
}

/// A chat session with the assistant.
///
/// The session holds a fully configured agent that you can use directly, and
/// the appointment book its tools work on. Messages may be sent while other
/// turns are still running.
#[derive(Clone)]
pub struct Session {
    agent: Agent,
    slot_book: Arc<SlotBook>,
}

impl Session {
    /// Sends a message and returns the running turn.
    #[inline]
    pub fn send_message(&self, message: &str) -> Turn {
        self.agent.start_turn(message)
    }

    /// Answers a query, collecting everything shown along the way.
    pub async fn query(&self, req: QueryRequest) -> QueryResponse {
        let mut turn = self.agent.start_turn(req.message);
        let mut resp = QueryResponse::default();
        let mut last_seq = None;
        while let Some(snapshot) = turn.snapshots().next().await {
            let Some(entry) = snapshot.latest() else {
                continue;
            };
            // A failure without a new entry repeats the previous one.
            if last_seq == Some(entry.seq()) {
                continue;
            }
            last_seq = Some(entry.seq());
            resp.responses.push(QueryItem {
                role: entry.role().as_str().to_owned(),
                content: entry.text().into_owned(),
            });
        }

        if let Err(err) = turn.finish().await {
            warn!("query failed: {err}");
            resp.responses.push(QueryItem {
                role: "error".to_owned(),
                content: err.to_string(),
            });
            resp.error = Some(err.to_string());
        }
        resp
    }

    /// Returns the underlying agent.
    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Returns the appointment book.
    #[inline]
    pub fn slot_book(&self) -> &Arc<SlotBook> {
        &self.slot_book
    }
}
