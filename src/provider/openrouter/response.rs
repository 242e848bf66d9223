//! OpenRouter wire → domain conversion.
//!
//! Content parts whose `type` is unknown, or whose payload is missing, have no domain
//! representation and are dropped.

use serde_json::Value;

use crate::openrouter::types::{
    OpenRouterChatRequest, OpenRouterChatResponse, OpenRouterChoice, OpenRouterContent,
    OpenRouterContentPart, OpenRouterEmbeddingInput, OpenRouterEmbeddingRequest,
    OpenRouterEmbeddingResponse, OpenRouterMediaUrl, OpenRouterMessage, OpenRouterResponseFormat,
    OpenRouterStreamChunk, OpenRouterTool, OpenRouterToolCall, OpenRouterUsage,
};
use crate::types::{
    ChatRequest, ChatResponse, Choice, ChoiceError, ContentPart, EmbeddingData, EmbeddingInput,
    EmbeddingRequest, EmbeddingResponse, EmbeddingUsage, FileData, FunctionCall, FunctionDef,
    ImageUrl, InputAudio, JsonSchemaDef, Message, MessageContent, ResponseFormat, StopSequence,
    StreamChunk, Tool, ToolCall, ToolChoice, Usage,
};

pub fn from_wire_chat_response(response: Option<OpenRouterChatResponse>) -> Option<ChatResponse> {
    response.map(convert_chat_response)
}

pub fn from_wire_stream_chunk(chunk: Option<OpenRouterStreamChunk>) -> Option<StreamChunk> {
    chunk.map(convert_stream_chunk)
}

pub fn from_wire_embedding_response(
    response: Option<OpenRouterEmbeddingResponse>,
) -> Option<EmbeddingResponse> {
    response.map(convert_embedding_response)
}

pub fn from_wire_message(message: Option<OpenRouterMessage>) -> Option<Message> {
    message.map(convert_message)
}

pub fn from_wire_choice(choice: Option<OpenRouterChoice>) -> Option<Choice> {
    choice.map(convert_choice)
}

/// Reverse of [`super::request::to_wire_chat_request`].
pub fn from_wire_chat_request(request: Option<OpenRouterChatRequest>) -> Option<ChatRequest> {
    request.map(convert_chat_request)
}

pub fn from_wire_embedding_request(
    request: Option<OpenRouterEmbeddingRequest>,
) -> Option<EmbeddingRequest> {
    request.map(|request| EmbeddingRequest {
        model: request.model,
        input: request.input.map(|input| match input {
            OpenRouterEmbeddingInput::Text(text) => EmbeddingInput::Text(text),
            OpenRouterEmbeddingInput::TextBatch(batch) => EmbeddingInput::TextBatch(batch),
            OpenRouterEmbeddingInput::Values(values) => EmbeddingInput::Values(values),
        }),
    })
}

pub(crate) fn convert_chat_response(response: OpenRouterChatResponse) -> ChatResponse {
    ChatResponse {
        id: response.id,
        object: response.object,
        created: response.created,
        model: response.model,
        choices: response.choices.into_iter().map(convert_choice).collect(),
        usage: response.usage.map(convert_usage),
    }
}

pub(crate) fn convert_stream_chunk(chunk: OpenRouterStreamChunk) -> StreamChunk {
    StreamChunk {
        id: chunk.id,
        object: chunk.object,
        created: chunk.created,
        model: chunk.model,
        choices: chunk.choices.into_iter().map(convert_choice).collect(),
        usage: chunk.usage.map(convert_usage),
    }
}

pub(crate) fn convert_embedding_response(
    response: OpenRouterEmbeddingResponse,
) -> EmbeddingResponse {
    EmbeddingResponse {
        data: response
            .data
            .into_iter()
            .map(|item| EmbeddingData {
                object: item.object,
                embedding: item.embedding,
                index: item.index,
            })
            .collect(),
        usage: response.usage.map(|usage| EmbeddingUsage {
            prompt_tokens: usage.prompt_tokens,
            total_tokens: usage.total_tokens,
        }),
    }
}

fn convert_choice(choice: OpenRouterChoice) -> Choice {
    Choice {
        index: choice.index,
        message: choice.message.map(convert_message),
        delta: choice.delta.map(convert_message),
        finish_reason: choice.finish_reason,
        error: choice.error.map(|error| ChoiceError {
            code: error.code,
            message: error.message,
        }),
    }
}

fn convert_usage(usage: OpenRouterUsage) -> Usage {
    Usage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
        cost: usage.cost,
    }
}

fn convert_message(message: OpenRouterMessage) -> Message {
    Message {
        role: message.role,
        content: message.content.map(|content| match content {
            OpenRouterContent::Text(text) => MessageContent::Text(text),
            OpenRouterContent::Parts(parts) => {
                MessageContent::Parts(parts.into_iter().filter_map(convert_part).collect())
            }
        }),
        name: message.name,
        tool_call_id: message.tool_call_id,
        tool_calls: message
            .tool_calls
            .map(|calls| calls.into_iter().map(convert_tool_call).collect()),
    }
}

fn convert_part(part: OpenRouterContentPart) -> Option<ContentPart> {
    match part.kind.as_str() {
        "text" => part.text.map(|text| ContentPart::Text { text }),
        "image_url" => part.image_url.map(|media| ContentPart::ImageUrl {
            image_url: convert_media(media),
        }),
        "video_url" => part.video_url.map(|media| ContentPart::VideoUrl {
            video_url: convert_media(media),
        }),
        "input_audio" => part.input_audio.map(|audio| ContentPart::InputAudio {
            input_audio: InputAudio {
                data: audio.data,
                format: audio.format,
            },
        }),
        "file" => part.file.map(|file| ContentPart::File {
            file: FileData {
                filename: file.filename,
                file_data: file.file_data,
            },
        }),
        _ => None,
    }
}

fn convert_media(media: OpenRouterMediaUrl) -> ImageUrl {
    ImageUrl {
        url: media.url,
        detail: media.detail,
    }
}

fn convert_tool_call(call: OpenRouterToolCall) -> ToolCall {
    ToolCall {
        index: call.index,
        id: call.id,
        kind: call.kind,
        function: FunctionCall {
            name: call.function.name,
            arguments: call.function.arguments,
        },
    }
}

fn convert_tool(tool: OpenRouterTool) -> Tool {
    Tool {
        kind: tool.kind,
        function: FunctionDef {
            name: tool.function.name,
            description: tool.function.description,
            parameters: tool.function.parameters,
        },
    }
}

fn convert_response_format(format: OpenRouterResponseFormat) -> ResponseFormat {
    ResponseFormat {
        kind: format.kind,
        json_schema: format.json_schema.map(|schema| JsonSchemaDef {
            name: schema.name,
            strict: schema.strict,
            schema: schema.schema,
        }),
    }
}

fn convert_chat_request(request: OpenRouterChatRequest) -> ChatRequest {
    ChatRequest {
        model: request.model,
        messages: request.messages.into_iter().map(convert_message).collect(),
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
        max_tokens: request.max_tokens,
        stop: request.stop.and_then(convert_stop),
        seed: request.seed,
        presence_penalty: request.presence_penalty,
        frequency_penalty: request.frequency_penalty,
        stream: request.stream,
        response_format: request.response_format.map(convert_response_format),
        tools: request
            .tools
            .map(|tools| tools.into_iter().map(convert_tool).collect())
            .unwrap_or_default(),
        tool_choice: request.tool_choice.map(convert_tool_choice),
        parallel_tool_calls: request.parallel_tool_calls,
        user: request.user,
    }
}

fn convert_stop(stop: Value) -> Option<StopSequence> {
    match stop {
        Value::String(sequence) => Some(StopSequence::One(sequence)),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(sequence) => Some(sequence),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(StopSequence::Many),
        _ => None,
    }
}

fn convert_tool_choice(choice: Value) -> ToolChoice {
    match choice.as_str() {
        Some("auto") => return ToolChoice::Auto,
        Some("none") => return ToolChoice::None,
        Some("required") => return ToolChoice::Required,
        _ => {}
    }
    let function_name = (choice.get("type").and_then(Value::as_str) == Some("function"))
        .then(|| choice.pointer("/function/name").and_then(Value::as_str))
        .flatten();
    match function_name {
        Some(name) => ToolChoice::Function {
            name: name.to_string(),
        },
        None => ToolChoice::Custom(choice),
    }
}
