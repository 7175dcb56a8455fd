use std::sync::Arc;

use zikomo_model::ModelProvider;

use super::Agent;
use crate::config::AgentConfig;
use crate::filter::Translator;
use crate::model_client::ModelClient;
use crate::tool::{Registry, RegistryError, Tool};

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) registry: Registry,
    pub(crate) config: AgentConfig,
    pub(crate) system_prompt: Option<String>,
    pub(crate) translator: Option<Arc<dyn Translator>>,
    pub(crate) error: Option<RegistryError>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            registry: Registry::new(),
            config: AgentConfig::default(),
            system_prompt: None,
            translator: None,
            error: None,
        }
    }

    /// Sets the system prompt sent ahead of every transcript.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the configuration.
    #[inline]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a tool.
    ///
    /// A registration error is reported by [`build`](Self::build).
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        if let Err(err) = self.registry.register(tool) {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Sets the translator used for emitted snapshots.
    ///
    /// Snapshots are only translated when the configuration also has a
    /// target language.
    #[inline]
    pub fn with_translator<T: Translator>(mut self, translator: T) -> Self {
        self.translator = Some(Arc::new(translator));
        self
    }

    /// Builds the agent.
    ///
    /// Fails with the first error met while registering tools.
    pub fn build(mut self) -> Result<Agent, RegistryError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        Ok(Agent::from_builder(self))
    }
}
