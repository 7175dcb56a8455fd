//! Request and response types of the query front end.

use serde::{Deserialize, Serialize};

/// A user message sent to the assistant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The message, empty when absent.
    #[serde(default)]
    pub message: String,
}

/// One message shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryItem {
    /// `user`, `assistant`, `tool`, or `error`.
    pub role: String,
    /// The message text.
    pub content: String,
}

/// The messages produced while answering a [`QueryRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The newest entry of every snapshot, in order.
    pub responses: Vec<QueryItem>,
    /// The error that ended the turn, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
