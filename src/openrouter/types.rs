//! OpenRouter wire model for `/chat/completions` and `/embeddings`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterChatRequest {
    pub model: String,
    pub messages: Vec<OpenRouterMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// A string or an array of strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<OpenRouterResponseFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenRouterTool>>,
    /// `"auto"`, `"none"`, `"required"` or a function selector object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<OpenRouterContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenRouterToolCall>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenRouterContent {
    Text(String),
    Parts(Vec<OpenRouterContentPart>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<OpenRouterMediaUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<OpenRouterMediaUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio: Option<OpenRouterInputAudio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<OpenRouterFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRouterMediaUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRouterInputAudio {
    pub data: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRouterFile {
    pub filename: String,
    pub file_data: String,
}

/// Tool call in a request or response. Stream deltas may omit every field but the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRouterToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub function: OpenRouterFunctionCall,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRouterFunctionCall {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: OpenRouterFunctionDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterFunctionDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<OpenRouterJsonSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterJsonSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strict: bool,
    pub schema: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<OpenRouterChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<OpenRouterUsage>,
    /// Request-level failure reported with a 2xx status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OpenRouterChoiceError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterStreamChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<OpenRouterChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<OpenRouterUsage>,
    /// Mid-stream failure not attached to any choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OpenRouterChoiceError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterChoice {
    #[serde(default)]
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<OpenRouterMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<OpenRouterMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OpenRouterChoiceError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRouterChoiceError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterEmbeddingRequest {
    pub model: String,
    pub input: Option<OpenRouterEmbeddingInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenRouterEmbeddingInput {
    Text(String),
    TextBatch(Vec<String>),
    Values(Vec<Value>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterEmbeddingResponse {
    #[serde(default)]
    pub data: Vec<OpenRouterEmbedding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<OpenRouterEmbeddingUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OpenRouterChoiceError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterEmbedding {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub embedding: Vec<f64>,
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRouterEmbeddingUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_unset_fields() {
        let request = OpenRouterChatRequest {
            model: "openai/gpt-4o".into(),
            messages: vec![OpenRouterMessage {
                role: "user".into(),
                content: Some(OpenRouterContent::Text("hi".into())),
                ..Default::default()
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({
                "model": "openai/gpt-4o",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn stream_chunk_parses_openrouter_delta_with_choice_error() {
        let chunk: OpenRouterStreamChunk = serde_json::from_value(json!({
            "id": "gen-1",
            "object": "chat.completion.chunk",
            "created": 1700000000,
            "model": "anthropic/claude-3.5-sonnet",
            "provider": "Anthropic",
            "choices": [{
                "index": 0,
                "delta": {"role": "assistant", "content": ""},
                "finish_reason": "error",
                "native_finish_reason": "error",
                "error": {"code": 502, "message": "upstream overloaded"}
            }]
        }))
        .expect("parse");

        let choice = &chunk.choices[0];
        assert_eq!(choice.finish_reason.as_deref(), Some("error"));
        assert_eq!(
            choice.error,
            Some(OpenRouterChoiceError {
                code: 502,
                message: "upstream overloaded".into()
            })
        );
        assert_eq!(
            choice.delta.as_ref().and_then(|d| d.content.clone()),
            Some(OpenRouterContent::Text(String::new()))
        );
    }

    #[test]
    fn tool_call_delta_parses_with_only_index_and_arguments() {
        let call: OpenRouterToolCall =
            serde_json::from_value(json!({"index": 1, "function": {"arguments": "{\"ci"}}))
                .expect("parse");
        assert_eq!(call.index, Some(1));
        assert!(call.id.is_empty());
        assert_eq!(call.function.arguments, "{\"ci");
    }
}
