use std::pin::Pin;

use serde_json::Value;

use super::{Effect, Error, Tool, ToolOutput};

pub(crate) type BoxedToolFuture =
    Pin<Box<dyn Future<Output = ToolOutput> + Send>>;

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn effect(&self) -> Effect;

    /// Validates the arguments and creates the invocation future, without
    /// running it.
    fn prepare(&self, arguments: Value) -> Result<BoxedToolFuture, Error>;
}

pub(crate) struct ToolObjectImpl<T: Tool>(pub T);

impl<T: Tool> ToolObject for ToolObjectImpl<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    #[inline]
    fn effect(&self) -> Effect {
        self.0.effect()
    }

    fn prepare(&self, arguments: Value) -> Result<BoxedToolFuture, Error> {
        let input: T::Input =
            serde_json::from_value(arguments).map_err(|err| {
                Error::invalid_arguments().with_reason(format!("{err}"))
            })?;
        Ok(Box::pin(self.0.execute(input)))
    }
}
