//! OpenAI-compatible chat completions client
//!
//! Speaks `POST {base_url}/chat/completions` with native function calling:
//! tool schemas go out under `tools`, the tool-use mode under `tool_choice`,
//! and tool invocations come back in `choices[0].message.tool_calls`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    Completion, CompletionProvider, CompletionRequest, LLMError, Message, Result, ToolCall,
    ToolSchema, Usage,
};
use crate::config::LLMConfig;
use crate::secrets::{scrub_secrets, SecretString};

const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct OpenAIProvider {
    base_url: String,
    model: String,
    api_key: SecretString,
    client: Client,
}

impl OpenAIProvider {
    /// Create a provider for the configured endpoint and model
    ///
    /// # Errors
    /// Returns `LLMError::InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: &LLMConfig, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LLMError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
        })
    }

    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages.iter().map(WireMessage::from).collect()
    }

    fn convert_tools(tools: &[ToolSchema]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|tool| WireTool {
                kind: "function".to_string(),
                function: WireFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect()
    }

    fn build_request(&self, request: &CompletionRequest<'_>) -> ChatRequest {
        // tool_choice is only valid alongside tools
        let tool_choice = if request.tools.is_empty() {
            None
        } else {
            request.tool_choice.map(|c| c.as_str().to_string())
        };

        ChatRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(request.messages),
            tools: Self::convert_tools(request.tools),
            tool_choice,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        let payload = self.build_request(&request);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(
            "Completion request: model={}, messages={}, tools={}, tool_choice={:?}",
            payload.model,
            payload.messages.len(),
            payload.tools.len(),
            payload.tool_choice
        );

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.unsecure())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to completion service at {}",
                        self.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub_secrets(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                500..=599 => {
                    LLMError::ProviderUnavailable(format!("API error ({}): {}", status, text))
                }
                _ => LLMError::InvalidRequest(format!("API error ({}): {}", status, text)),
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse completion: {}", e)))?;

        tracing::info!(
            "Completion received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
            .collect();

        Ok(Completion {
            model: if data.model.is_empty() {
                self.model.clone()
            } else {
                data.model
            },
            content: choice.message.content,
            tool_calls,
            usage: data.usage,
        })
    }
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

/// Message format on the wire, shared by requests and responses
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        let role = msg.role().to_string();
        match msg {
            Message::System { content } | Message::User { content } => Self {
                role,
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: None,
            },
            Message::Assistant {
                content,
                tool_calls,
            } => Self {
                role,
                content: content.clone(),
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls.iter().map(WireToolCall::from).collect())
                },
                tool_call_id: None,
            },
            Message::Tool {
                tool_call_id,
                content,
            } => Self {
                role,
                content: Some(content.clone()),
                tool_calls: None,
                tool_call_id: Some(tool_call_id.clone()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

impl From<&ToolCall> for WireToolCall {
    fn from(tc: &ToolCall) -> Self {
        Self {
            id: tc.id.clone(),
            kind: function_kind(),
            function: WireFunctionCall {
                name: tc.name.clone(),
                arguments: tc.arguments.clone(),
            },
        }
    }
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolChoice;
    use serde_json::json;

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new(&LLMConfig::default(), SecretString::new("sk-test")).unwrap()
    }

    #[test]
    fn test_provider_properties() {
        let provider = provider();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            Message::system("You are a librarian"),
            Message::user("Hello"),
            Message::Assistant {
                content: None,
                tool_calls: vec![ToolCall::new(
                    "call_1",
                    "get_summary_by_title",
                    r#"{"title":"The Hobbit"}"#,
                )],
            },
            Message::tool_result("call_1", "Bilbo..."),
        ];

        let wire = serde_json::to_value(OpenAIProvider::convert_messages(&messages)).unwrap();

        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[1]["role"], "user");
        assert_eq!(wire[2]["role"], "assistant");
        assert!(wire[2]["content"].is_null());
        assert_eq!(wire[2]["tool_calls"][0]["type"], "function");
        assert_eq!(
            wire[2]["tool_calls"][0]["function"]["name"],
            "get_summary_by_title"
        );
        assert_eq!(wire[3]["role"], "tool");
        assert_eq!(wire[3]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_request_without_tools_omits_tool_choice() {
        let provider = provider();
        let messages = vec![Message::user("Hello")];
        let request = CompletionRequest {
            messages: &messages,
            tools: &[],
            tool_choice: Some(ToolChoice::None),
        };

        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_request_with_tools() {
        let provider = provider();
        let messages = vec![Message::user("Hello")];
        let tools = vec![ToolSchema {
            name: "get_summary_by_title".to_string(),
            description: "lookup".to_string(),
            parameters: json!({"type": "object"}),
        }];
        let request = CompletionRequest::new(&messages).with_tools(&tools, ToolChoice::Auto);

        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "get_summary_by_title");
    }

    #[test]
    fn test_response_parsing_with_tool_calls() {
        let body = json!({
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "get_summary_by_title", "arguments": "{\"title\":\"1984\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let parsed: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(parsed.usage.unwrap().total_tokens, 15);
        let message = &parsed.choices[0].message;
        assert!(message.content.is_none());
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].function.arguments, "{\"title\":\"1984\"}");
    }
}
