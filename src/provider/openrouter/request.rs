//! Domain → OpenRouter wire conversion.
//!
//! Every function is a pure structural copy. Absent inputs stay absent.

use serde_json::{Value, json};

use crate::openrouter::types::{
    OpenRouterChatRequest, OpenRouterContent, OpenRouterContentPart, OpenRouterEmbeddingInput,
    OpenRouterEmbeddingRequest, OpenRouterFile, OpenRouterFunctionCall, OpenRouterFunctionDef,
    OpenRouterInputAudio, OpenRouterJsonSchema, OpenRouterMediaUrl, OpenRouterMessage,
    OpenRouterResponseFormat, OpenRouterTool, OpenRouterToolCall,
};
use crate::types::{
    ChatRequest, ContentPart, EmbeddingInput, EmbeddingRequest, ImageUrl, Message, MessageContent,
    ResponseFormat, StopSequence, Tool, ToolCall, ToolChoice,
};

pub fn to_wire_chat_request(request: Option<&ChatRequest>) -> Option<OpenRouterChatRequest> {
    request.map(convert_chat_request)
}

pub fn to_wire_embedding_request(
    request: Option<&EmbeddingRequest>,
) -> Option<OpenRouterEmbeddingRequest> {
    request.map(convert_embedding_request)
}

pub fn to_wire_message(message: Option<&Message>) -> Option<OpenRouterMessage> {
    message.map(convert_message)
}

pub fn to_wire_tool_choice(choice: Option<&ToolChoice>) -> Option<Value> {
    choice.map(convert_tool_choice)
}

pub fn to_wire_response_format(
    format: Option<&ResponseFormat>,
) -> Option<OpenRouterResponseFormat> {
    format.map(convert_response_format)
}

pub(crate) fn convert_chat_request(request: &ChatRequest) -> OpenRouterChatRequest {
    OpenRouterChatRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(convert_message).collect(),
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
        max_tokens: request.max_tokens,
        stop: request.stop.as_ref().map(convert_stop),
        stream: request.stream,
        seed: request.seed,
        presence_penalty: request.presence_penalty,
        frequency_penalty: request.frequency_penalty,
        response_format: request.response_format.as_ref().map(convert_response_format),
        tools: (!request.tools.is_empty())
            .then(|| request.tools.iter().map(convert_tool).collect()),
        tool_choice: request.tool_choice.as_ref().map(convert_tool_choice),
        parallel_tool_calls: request.parallel_tool_calls,
        user: request.user.clone(),
    }
}

pub(crate) fn convert_embedding_request(request: &EmbeddingRequest) -> OpenRouterEmbeddingRequest {
    OpenRouterEmbeddingRequest {
        model: request.model.clone(),
        input: request.input.as_ref().map(|input| match input {
            EmbeddingInput::Text(text) => OpenRouterEmbeddingInput::Text(text.clone()),
            EmbeddingInput::TextBatch(batch) => OpenRouterEmbeddingInput::TextBatch(batch.clone()),
            EmbeddingInput::Values(values) => OpenRouterEmbeddingInput::Values(values.clone()),
        }),
    }
}

fn convert_message(message: &Message) -> OpenRouterMessage {
    OpenRouterMessage {
        role: message.role.clone(),
        content: message.content.as_ref().map(|content| match content {
            MessageContent::Text(text) => OpenRouterContent::Text(text.clone()),
            MessageContent::Parts(parts) => {
                OpenRouterContent::Parts(parts.iter().map(convert_part).collect())
            }
        }),
        name: message.name.clone(),
        tool_call_id: message.tool_call_id.clone(),
        tool_calls: message
            .tool_calls
            .as_ref()
            .filter(|calls| !calls.is_empty())
            .map(|calls| calls.iter().map(convert_tool_call).collect()),
    }
}

fn convert_part(part: &ContentPart) -> OpenRouterContentPart {
    let mut wire = OpenRouterContentPart {
        kind: part.kind().to_string(),
        ..Default::default()
    };
    match part {
        ContentPart::Text { text } => wire.text = Some(text.clone()),
        ContentPart::ImageUrl { image_url } => wire.image_url = Some(convert_media(image_url)),
        ContentPart::VideoUrl { video_url } => wire.video_url = Some(convert_media(video_url)),
        ContentPart::InputAudio { input_audio } => {
            wire.input_audio = Some(OpenRouterInputAudio {
                data: input_audio.data.clone(),
                format: input_audio.format.clone(),
            })
        }
        ContentPart::File { file } => {
            wire.file = Some(OpenRouterFile {
                filename: file.filename.clone(),
                file_data: file.file_data.clone(),
            })
        }
    }
    wire
}

fn convert_media(media: &ImageUrl) -> OpenRouterMediaUrl {
    OpenRouterMediaUrl {
        url: media.url.clone(),
        detail: media.detail.clone(),
    }
}

fn convert_tool_call(call: &ToolCall) -> OpenRouterToolCall {
    OpenRouterToolCall {
        index: call.index,
        id: call.id.clone(),
        kind: call.kind.clone(),
        function: OpenRouterFunctionCall {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        },
    }
}

fn convert_tool(tool: &Tool) -> OpenRouterTool {
    OpenRouterTool {
        kind: tool.kind.clone(),
        function: OpenRouterFunctionDef {
            name: tool.function.name.clone(),
            description: tool.function.description.clone(),
            parameters: tool.function.parameters.clone(),
        },
    }
}

fn convert_response_format(format: &ResponseFormat) -> OpenRouterResponseFormat {
    OpenRouterResponseFormat {
        kind: format.kind.clone(),
        json_schema: format
            .json_schema
            .as_ref()
            .map(|schema| OpenRouterJsonSchema {
                name: schema.name.clone(),
                strict: schema.strict,
                schema: schema.schema.clone(),
            }),
    }
}

fn convert_tool_choice(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => Value::from("auto"),
        ToolChoice::None => Value::from("none"),
        ToolChoice::Required => Value::from("required"),
        ToolChoice::Function { name } => json!({
            "type": "function",
            "function": { "name": name }
        }),
        ToolChoice::Custom(value) => value.clone(),
    }
}

fn convert_stop(stop: &StopSequence) -> Value {
    match stop {
        StopSequence::One(sequence) => Value::from(sequence.as_str()),
        StopSequence::Many(sequences) => Value::from(sequences.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FileData, FunctionCall, InputAudio};

    #[test]
    fn multimodal_parts_keep_order_and_url() {
        let request = ChatRequest::new(
            "openai/gpt-4o",
            vec![Message::multimodal(
                "user",
                Some(vec![
                    ContentPart::text("What is in this picture?"),
                    ContentPart::image_url("https://example.com/cat.png?size=large&v=2"),
                ]),
            )],
        );

        let wire = to_wire_chat_request(Some(&request)).expect("wire request");
        let Some(OpenRouterContent::Parts(parts)) = &wire.messages[0].content else {
            panic!("expected parts, got {:?}", wire.messages[0].content);
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].kind, "text");
        assert_eq!(parts[0].text.as_deref(), Some("What is in this picture?"));
        assert_eq!(parts[1].kind, "image_url");
        assert_eq!(
            parts[1].image_url.as_ref().map(|image| image.url.as_str()),
            Some("https://example.com/cat.png?size=large&v=2")
        );
    }

    #[test]
    fn empty_tool_lists_are_omitted() {
        let mut assistant = Message::text("assistant", "");
        assistant.tool_calls = Some(Vec::new());
        let request = ChatRequest::new("m", vec![assistant]);

        let wire = convert_chat_request(&request);
        assert!(wire.tools.is_none());
        assert!(wire.messages[0].tool_calls.is_none());

        let value = serde_json::to_value(&wire).expect("serialize");
        assert!(value.get("tools").is_none());
        assert!(value["messages"][0].get("tool_calls").is_none());
    }

    #[test]
    fn tool_calls_and_definitions_are_copied() {
        let mut assistant = Message::text("assistant", "");
        assistant.content = None;
        assistant.tool_calls = Some(vec![ToolCall {
            index: None,
            id: "call_1".into(),
            kind: "function".into(),
            function: FunctionCall {
                name: "get_weather".into(),
                arguments: r#"{"city":"Paris"}"#.into(),
            },
        }]);
        let mut request = ChatRequest::new(
            "m",
            vec![
                Message::text("user", "Weather in Paris?"),
                assistant,
                Message::tool_result("call_1", "18C, clear"),
            ],
        );
        request.tools = vec![Tool::function(
            "get_weather",
            Some("Current weather".into()),
            Some(json!({"type": "object", "properties": {"city": {"type": "string"}}})),
        )];
        request.tool_choice = Some(ToolChoice::Function {
            name: "get_weather".into(),
        });

        let value = serde_json::to_value(convert_chat_request(&request)).expect("serialize");
        assert_eq!(value["tools"][0]["function"]["name"], "get_weather");
        assert_eq!(
            value["tool_choice"],
            json!({"type": "function", "function": {"name": "get_weather"}})
        );
        assert_eq!(value["messages"][1]["content"], Value::Null);
        assert_eq!(value["messages"][1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(value["messages"][2]["tool_call_id"], "call_1");
        assert_eq!(value["messages"][2]["role"], "tool");
    }

    #[test]
    fn tool_choice_and_stop_forms() {
        assert_eq!(convert_tool_choice(&ToolChoice::Auto), json!("auto"));
        assert_eq!(convert_tool_choice(&ToolChoice::None), json!("none"));
        assert_eq!(convert_tool_choice(&ToolChoice::Required), json!("required"));
        assert_eq!(
            convert_tool_choice(&ToolChoice::Custom(json!({"type": "web_search"}))),
            json!({"type": "web_search"})
        );
        assert_eq!(convert_stop(&StopSequence::One("END".into())), json!("END"));
        assert_eq!(
            convert_stop(&StopSequence::Many(vec!["a".into(), "b".into()])),
            json!(["a", "b"])
        );
    }

    #[test]
    fn audio_and_file_parts_carry_payloads() {
        let message = Message::multimodal(
            "user",
            Some(vec![
                ContentPart::InputAudio {
                    input_audio: InputAudio {
                        data: "UklGRg==".into(),
                        format: "wav".into(),
                    },
                },
                ContentPart::File {
                    file: FileData {
                        filename: "report.pdf".into(),
                        file_data: "data:application/pdf;base64,JVBERi0=".into(),
                    },
                },
            ]),
        );
        let value = serde_json::to_value(convert_message(&message)).expect("serialize");
        assert_eq!(
            value["content"],
            json!([
                {"type": "input_audio", "input_audio": {"data": "UklGRg==", "format": "wav"}},
                {
                    "type": "file",
                    "file": {
                        "filename": "report.pdf",
                        "file_data": "data:application/pdf;base64,JVBERi0="
                    }
                }
            ])
        );
    }

    #[test]
    fn absent_inputs_stay_absent() {
        assert!(to_wire_chat_request(None).is_none());
        assert!(to_wire_embedding_request(None).is_none());
        assert!(to_wire_message(None).is_none());
        assert!(to_wire_tool_choice(None).is_none());
        assert!(to_wire_response_format(None).is_none());
    }

    #[test]
    fn embedding_input_shapes_are_preserved() {
        let request = EmbeddingRequest::new("openai/text-embedding-3-small", vec![
            "a".to_string(),
            "b".to_string(),
        ]);
        let value = serde_json::to_value(convert_embedding_request(&request)).expect("serialize");
        assert_eq!(
            value,
            json!({"model": "openai/text-embedding-3-small", "input": ["a", "b"]})
        );
    }
}
