//! Core logic including the reasoning loop, tool dispatch, observation
//! stream and configurations.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
mod config;
mod error;
pub mod filter;
mod model_client;
pub mod observe;
pub mod resource;
pub mod tool;
pub mod transcript;

pub use agent::{Agent, AgentBuilder, Turn, TurnStage};
pub use config::{AgentConfig, RetryPolicy};
pub use error::{OracleError, TurnError};
pub use zikomo_model::ErrorKind as OracleErrorKind;
