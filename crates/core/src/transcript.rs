//! Transcript-related types.

use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zikomo_model::{ModelMessage, ToolCallRequest, ToolCallResult};

use crate::tool::ToolResult;

/// The author of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user.
    User,
    /// The oracle.
    Assistant,
    /// A tool invoked on behalf of the oracle.
    Tool,
}

impl Role {
    /// Returns the lowercase name of the role.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// The payload of an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    /// Plain text, a user input or a final answer.
    Text(String),
    /// An oracle message that requests tools.
    ToolCalls {
        /// Text accompanying the requests, often empty.
        text: String,
        /// The requests, in the order the oracle issued them.
        calls: Vec<ToolCallRequest>,
    },
    /// The result of one requested tool.
    ToolResult(ToolResult),
}

/// An item in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    seq: u64,
    role: Role,
    content: Content,
}

impl Entry {
    /// Returns the sequence number, assigned when the entry was appended.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the role of the author.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the content of the entry.
    #[inline]
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Returns a human-readable rendition of the content.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.content {
            Content::Text(text) => Cow::Borrowed(text),
            Content::ToolCalls { text, calls } => {
                let calls: Vec<_> = calls
                    .iter()
                    .map(|call| format!("{}({})", call.name, call.arguments))
                    .collect();
                let calls = calls.join(", ");
                if text.is_empty() {
                    Cow::Owned(calls)
                } else {
                    Cow::Owned(format!("{text}\n{calls}"))
                }
            }
            Content::ToolResult(result) => Cow::Owned(result.content()),
        }
    }

    /// Returns a copy with the text replaced, keeping sequence number,
    /// role, and any structured payload.
    pub(crate) fn with_text(&self, new_text: String) -> Self {
        let content = match &self.content {
            Content::Text(_) => Content::Text(new_text),
            Content::ToolCalls { calls, .. } => Content::ToolCalls {
                text: new_text,
                calls: calls.clone(),
            },
            Content::ToolResult(result) => Content::ToolResult(result.clone()),
        };
        Self {
            seq: self.seq,
            role: self.role,
            content,
        }
    }

    fn to_model_message(&self) -> ModelMessage {
        match &self.content {
            Content::Text(text) => match self.role {
                Role::Assistant => ModelMessage::assistant(text.clone()),
                _ => ModelMessage::user(text.clone()),
            },
            Content::ToolCalls { text, calls } => ModelMessage::Assistant {
                content: text.clone(),
                tool_calls: calls.clone(),
            },
            Content::ToolResult(result) => {
                ModelMessage::Tool(ToolCallResult {
                    id: result.id.clone(),
                    content: result.content(),
                    is_error: !result.is_success(),
                })
            }
        }
    }
}

/// The append-only record of one turn.
///
/// Entries are shared by reference counting, so cloning a transcript or
/// taking a snapshot of it doesn't copy any content.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    entries: Vec<Arc<Entry>>,
}

impl Transcript {
    /// Appends an entry and returns it.
    pub(crate) fn append(&mut self, role: Role, content: Content) -> &Arc<Entry> {
        let seq = self.entries.len() as u64;
        self.entries.push(Arc::new(Entry { seq, role, content }));
        &self.entries[self.entries.len() - 1]
    }

    /// Returns all entries in order.
    #[inline]
    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the transcript has no entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the final answer, if the last entry is one.
    pub fn final_answer(&self) -> Option<&str> {
        let last = self.entries.last()?;
        match (last.role, &last.content) {
            (Role::Assistant, Content::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the tool results, in transcript order.
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.entries.iter().filter_map(|entry| match &entry.content {
            Content::ToolResult(result) => Some(result),
            _ => None,
        })
    }

    /// Converts the transcript into messages for the oracle.
    pub(crate) fn to_model_messages(
        &self,
        system_prompt: Option<&str>,
    ) -> Vec<ModelMessage> {
        let system = system_prompt.map(|prompt| ModelMessage::System {
            content: prompt.to_owned(),
        });
        system
            .into_iter()
            .chain(self.entries.iter().map(|entry| entry.to_model_message()))
            .collect()
    }
}
