use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zikomo_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelRequest,
    ModelResponseEvent, ModelTool, ToolCallRequest,
};

use crate::{Error, OpenAIConfig};

// ---------------------------------
// Types shared by both directions
// ---------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub r#type: String,
    pub function: FunctionCall,
}

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        tools: req.tools.iter().map(create_tool).collect(),
    }
}

fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System { content } => Message::System {
            content: content.clone(),
        },
        ModelMessage::User { content } => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant {
            content,
            tool_calls,
        } => {
            let tool_calls = if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls.iter().map(create_tool_call).collect())
            };
            let content = if content.is_empty() && tool_calls.is_some() {
                None
            } else {
                Some(content.clone())
            };
            Message::Assistant {
                content,
                tool_calls,
            }
        }
        ModelMessage::Tool(result) => Message::Tool {
            tool_call_id: result.id.clone(),
            content: result.content.clone(),
        },
    }
}

#[inline]
fn create_tool_call(req: &ToolCallRequest) -> ToolCall {
    ToolCall {
        id: req.id.clone(),
        r#type: "function".to_owned(),
        function: FunctionCall {
            name: req.name.clone(),
            arguments: req.arguments.to_string(),
        },
    }
}

#[inline]
fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

/// Turns a completion into the events the model client expects.
pub fn into_events(
    completion: ChatCompletion,
) -> Result<VecDeque<ModelResponseEvent>, Error> {
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new("no choices in the response", ErrorKind::Other));
    };
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(Error::new(
            "the response was filtered",
            ErrorKind::Moderated,
        ));
    }

    let mut events = VecDeque::new();
    let ResponseMessage {
        content,
        tool_calls,
    } = choice.message;
    if let Some(content) = content.filter(|c| !c.is_empty()) {
        events.push_back(ModelResponseEvent::MessageDelta(content));
    }
    let finish_reason = if !tool_calls.is_empty() {
        ModelFinishReason::ToolCalls
    } else if choice.finish_reason.as_deref() == Some("length") {
        ModelFinishReason::Length
    } else {
        ModelFinishReason::Stop
    };
    for call in tool_calls {
        let arguments = match serde_json::from_str(&call.function.arguments) {
            Ok(arguments) => arguments,
            Err(err) => {
                // Leave it to the tool to reject.
                warn!("tool call `{}` has malformed arguments: {err}", call.id);
                Value::String(call.function.arguments)
            }
        };
        events.push_back(ModelResponseEvent::ToolCall(ToolCallRequest {
            id: call.id,
            name: call.function.name,
            arguments,
        }));
    }
    events.push_back(ModelResponseEvent::Completed(finish_reason));
    Ok(events)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use zikomo_model::{ModelProviderError, ToolCallResult};

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System {
                    content: "You are a helpful assistant.".to_owned(),
                },
                ModelMessage::user("Hello"),
                ModelMessage::Assistant {
                    content: String::new(),
                    tool_calls: vec![ToolCallRequest {
                        id: "call_1".to_owned(),
                        name: "search".to_owned(),
                        arguments: json!({ "query": "nairobi food" }),
                    }],
                },
                ModelMessage::Tool(ToolCallResult {
                    id: "call_1".to_owned(),
                    content: "Nyama choma".to_owned(),
                    is_error: false,
                }),
            ],
            tools: vec![ModelTool {
                name: "search".to_owned(),
                description: "Searches the web.".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } }
                }),
            }],
        };
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .build();
        let value =
            serde_json::to_value(create_request(&request, &config)).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "custom",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "Hello" },
                    {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "search",
                                "arguments": "{\"query\":\"nairobi food\"}"
                            }
                        }]
                    },
                    { "role": "tool", "tool_call_id": "call_1", "content": "Nyama choma" }
                ],
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "search",
                        "description": "Searches the web.",
                        "parameters": {
                            "type": "object",
                            "properties": { "query": { "type": "string" } }
                        }
                    }
                }]
            })
        );
    }

    #[test]
    fn test_tool_call_events() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "check_availability",
                            "arguments": "{\"day\":\"monday\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();
        let events: Vec<_> = into_events(completion).unwrap().into();
        assert_eq!(
            events,
            [
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_abc".to_owned(),
                    name: "check_availability".to_owned(),
                    arguments: json!({ "day": "monday" }),
                }),
                ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
            ]
        );
    }

    #[test]
    fn test_text_events() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Hi there" },
                "finish_reason": "stop"
            }]
        }))
        .unwrap();
        let events: Vec<_> = into_events(completion).unwrap().into();
        assert_eq!(
            events,
            [
                ModelResponseEvent::MessageDelta("Hi there".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[test]
    fn test_truncated_text() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "Mwina" },
                "finish_reason": "length"
            }]
        }))
        .unwrap();
        let events: Vec<_> = into_events(completion).unwrap().into();
        assert_eq!(
            events.last(),
            Some(&ModelResponseEvent::Completed(ModelFinishReason::Length))
        );
    }

    #[test]
    fn test_filtered_response() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{
                "message": { "content": null },
                "finish_reason": "content_filter"
            }]
        }))
        .unwrap();
        let err = into_events(completion).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Moderated);
    }
}
