use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::Instrument;
use zikomo_model::{ModelTool, ToolCallRequest};

use super::object::BoxedToolFuture;
use super::{
    Effect, Error, Tool, ToolObject, ToolObjectImpl, ToolOutput, ToolResult,
};

/// The error returned when a tool cannot be registered.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegistryError {
    /// Another tool with the same name is already registered.
    DuplicateToolName(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateToolName(name) => {
                write!(f, "tool `{name}` is already registered")
            }
        }
    }
}

impl StdError for RegistryError {}

/// A registered tool as seen from outside the registry.
#[derive(Clone, Copy)]
pub struct ToolSpec<'a> {
    object: &'a dyn ToolObject,
}

impl<'a> ToolSpec<'a> {
    /// Returns the name of the tool.
    #[inline]
    pub fn name(&self) -> &'a str {
        self.object.name()
    }

    /// Returns the description of the tool.
    #[inline]
    pub fn description(&self) -> &'a str {
        self.object.description()
    }

    /// Returns the parameter schema of the tool.
    #[inline]
    pub fn parameter_schema(&self) -> &'a Value {
        self.object.parameter_schema()
    }

    /// Returns the effect class of the tool.
    #[inline]
    pub fn effect(&self) -> Effect {
        self.object.effect()
    }

    /// Returns the definition sent to the model.
    pub fn definition(&self) -> ModelTool {
        ModelTool {
            name: self.name().to_owned(),
            description: self.description().to_owned(),
            parameters: self.parameter_schema().clone(),
        }
    }
}

impl Debug for ToolSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name())
            .field("effect", &self.effect())
            .finish_non_exhaustive()
    }
}

struct Registered {
    object: Arc<dyn ToolObject>,
    // Held for the whole invocation of a mutating tool.
    serial: Option<Arc<Mutex<()>>>,
}

/// A capability table that resolves tool requests from the model by name and
/// runs them.
///
/// Tools are registered once before the agent starts, the registry is
/// immutable afterwards and shared by every turn.
#[derive(Default)]
pub struct Registry {
    tools: BTreeMap<String, Registered>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    pub fn register<T: Tool>(&mut self, tool: T) -> Result<(), RegistryError> {
        let name = tool.name().to_owned();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateToolName(name));
        }
        let serial = match tool.effect() {
            Effect::ReadOnly => None,
            Effect::Mutating => Some(Arc::new(Mutex::new(()))),
        };
        debug!("registered tool `{name}` ({:?})", tool.effect());
        self.tools.insert(
            name,
            Registered {
                object: Arc::new(ToolObjectImpl(tool)),
                serial,
            },
        );
        Ok(())
    }

    /// Looks up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<ToolSpec<'_>, Error> {
        match self.tools.get(name) {
            Some(registered) => Ok(ToolSpec {
                object: registered.object.as_ref(),
            }),
            None => Err(Error::unknown_tool()
                .with_reason(format!("no tool named `{name}`"))),
        }
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the definitions of all tools, sorted by name.
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .values()
            .map(|registered| {
                ToolSpec {
                    object: registered.object.as_ref(),
                }
                .definition()
            })
            .collect()
    }

    /// Runs the requests of one reasoning step and returns one result per
    /// request, in request order.
    ///
    /// Every valid request runs in its own task. Invocations of the same
    /// mutating tool wait for each other, all other invocations run
    /// concurrently. Unknown tools and invalid arguments fail without
    /// invoking anything. `limit` applies to each invocation separately,
    /// excluding the time spent waiting for a mutating tool.
    pub async fn dispatch(
        &self,
        requests: Vec<ToolCallRequest>,
        limit: Duration,
    ) -> Vec<ToolResult> {
        let span = debug_span!("dispatch", requests = requests.len());
        async move {
            let pending: Vec<_> = requests
                .into_iter()
                .map(|req| {
                    let ToolCallRequest {
                        id,
                        name,
                        arguments,
                    } = req;
                    let invocation = match self.prepare(&name, arguments) {
                        Ok(invocation) => {
                            trace!("spawning tool `{name}` ({id})");
                            Pending::Running(tokio::spawn(
                                invocation.run(limit).instrument(debug_span!(
                                    "tool",
                                    name = name.as_str(),
                                    id = id.as_str()
                                )),
                            ))
                        }
                        Err(err) => {
                            warn!("rejected tool call `{name}` ({id}): {err}");
                            Pending::Rejected(err)
                        }
                    };
                    (id, name, invocation)
                })
                .collect();

            let mut results = Vec::with_capacity(pending.len());
            for (id, name, invocation) in pending {
                let output = match invocation {
                    Pending::Rejected(err) => Err(err),
                    Pending::Running(task) => task.await.unwrap_or_else(|err| {
                        error!("tool `{name}` ({id}) aborted: {err}");
                        Err(Error::execution_error()
                            .with_reason("the tool stopped unexpectedly"))
                    }),
                };
                results.push(ToolResult { id, name, output });
            }
            results
        }
        .instrument(span)
        .await
    }

    fn prepare(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<Invocation, Error> {
        let Some(registered) = self.tools.get(name) else {
            return Err(Error::unknown_tool()
                .with_reason(format!("no tool named `{name}`")));
        };
        let fut = registered.object.prepare(arguments)?;
        Ok(Invocation {
            fut,
            serial: registered.serial.clone(),
        })
    }
}

enum Pending {
    Running(JoinHandle<ToolOutput>),
    Rejected(Error),
}

struct Invocation {
    fut: BoxedToolFuture,
    serial: Option<Arc<Mutex<()>>>,
}

impl Invocation {
    async fn run(self, limit: Duration) -> ToolOutput {
        let _guard = match self.serial {
            Some(serial) => Some(serial.lock_owned().await),
            None => None,
        };
        match timeout(limit, self.fut).await {
            Ok(output) => output,
            Err(_) => {
                warn!("tool timed out after {limit:?}");
                Err(Error::timed_out()
                    .with_reason(format!("no result within {limit:?}")))
            }
        }
    }
}
