//! Tool call supports.

mod error;
mod object;
mod registry;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub(crate) use object::{ToolObject, ToolObjectImpl};
pub use registry::{Registry, RegistryError, ToolSpec};

/// The output of a tool invocation.
pub type ToolOutput = Result<String, Error>;

/// Whether a tool changes shared state.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// The tool only reads. Invocations may run with unbounded concurrency.
    #[default]
    ReadOnly,
    /// The tool mutates a shared resource. Invocations of the same tool are
    /// serialized.
    Mutating,
}

/// A tool that can be called by the model.
///
/// Implementations of this trait should not keep per-call state. Shared
/// state a tool changes must live in a [`SharedResource`] and be touched only
/// through its atomic operations.
///
/// [`SharedResource`]: crate::resource::SharedResource
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    ///
    /// Arguments from the model are deserialized into this type before the
    /// tool is invoked, a mismatch is reported to the model as invalid
    /// arguments.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Returns the effect class of the tool.
    #[inline]
    fn effect(&self) -> Effect {
        Effect::ReadOnly
    }

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and must not cause any side effect before the future is polled. The
    /// future may be dropped at any await point when the invocation times
    /// out, so it should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolOutput> + Send + 'static;
}

/// The result of one tool invocation, paired with its request by the
/// correlation id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    /// Correlation id of the request.
    pub id: String,
    /// Name of the requested tool.
    pub name: String,
    /// Output of the invocation.
    pub output: ToolOutput,
}

impl ToolResult {
    /// Returns `true` if the invocation succeeded.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.output.is_ok()
    }

    /// Returns the text shown to the model for this result.
    pub fn content(&self) -> String {
        match &self.output {
            Ok(payload) => payload.clone(),
            Err(err) => format!("Error: {err}"),
        }
    }
}
