//! The protocol between the agent loop and a reasoning oracle.
//!
//! An oracle receives the conversation so far together with the tools it may
//! request, and answers with a stream of events: text deltas, tool call
//! requests and a completion marker. The agent decides what to do next based
//! on whether any tool calls were requested.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that oracle implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
