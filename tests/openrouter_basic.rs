use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use futures_util::{StreamExt, stream};
use llm_gateway::client::Client;
use llm_gateway::config::{
    with_api_key, with_base_url, with_debug, with_forwarded_for, with_headers, with_max_retries,
    with_referer, with_timeout, with_title, with_transport,
};
use llm_gateway::error::LLMError;
use llm_gateway::http::{HttpRequest, HttpResponse, HttpStreamResponse, HttpTransport};
use llm_gateway::provider::StreamItem;
use llm_gateway::types::{
    ChatRequest, ContentPart, EmbeddingRequest, Message, MessageContent, ResponseFormat, Tool,
    ToolChoice,
};
use serde_json::{Value, json};

/// Serves queued responses in order and records every request it receives.
#[derive(Default)]
struct RecordingTransport {
    responses: Mutex<Vec<Canned>>,
    requests: Mutex<Vec<HttpRequest>>,
}

enum Canned {
    Json(u16, Value, HashMap<String, String>),
    Sse(Vec<String>),
}

impl RecordingTransport {
    fn with(responses: Vec<Canned>) -> Arc<Self> {
        let transport = Self::default();
        *transport.responses.lock().expect("lock") = responses.into_iter().rev().collect();
        Arc::new(transport)
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock").clone()
    }

    fn body(&self, index: usize) -> Value {
        serde_json::from_slice(&self.requests()[index].body).expect("json body")
    }

    fn next(&self, request: HttpRequest) -> Canned {
        self.requests.lock().expect("lock").push(request);
        self.responses
            .lock()
            .expect("lock")
            .pop()
            .expect("unexpected request")
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError> {
        match self.next(request) {
            Canned::Json(status, body, headers) => Ok(HttpResponse {
                status,
                headers,
                body: serde_json::to_vec(&body).expect("encode"),
            }),
            Canned::Sse(_) => panic!("stream response queued for a plain request"),
        }
    }

    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LLMError> {
        match self.next(request) {
            Canned::Sse(events) => Ok(HttpStreamResponse {
                status: 200,
                headers: HashMap::new(),
                body: Box::pin(stream::iter(
                    events
                        .into_iter()
                        .map(|event| Ok::<_, LLMError>(event.into_bytes())),
                )),
            }),
            Canned::Json(status, body, headers) => Ok(HttpStreamResponse {
                status,
                headers,
                body: Box::pin(stream::iter(vec![Ok::<_, LLMError>(
                    serde_json::to_vec(&body).expect("encode"),
                )])),
            }),
        }
    }
}

fn ok(body: Value) -> Canned {
    Canned::Json(200, body, HashMap::new())
}

fn completion(text: &str) -> Value {
    json!({
        "id": "gen-123",
        "object": "chat.completion",
        "created": 1718000000,
        "model": "openai/gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11}
    })
}

fn client(transport: Arc<RecordingTransport>) -> Client {
    Client::new(
        "openrouter",
        [with_api_key("sk-or-test"), with_max_retries(0), with_transport(transport)],
    )
    .expect("client")
}

#[tokio::test]
async fn chat_sends_headers_and_translates_response() {
    let transport = RecordingTransport::with(vec![ok(completion("Hi there"))]);
    let client = Client::new(
        "openrouter",
        [
            with_api_key("sk-or-test"),
            with_base_url("https://gateway.example.com/api/v1"),
            with_timeout(Duration::from_secs(15)),
            with_referer("https://myapp.example.com"),
            with_title("My App"),
            with_forwarded_for("203.0.113.7"),
            with_headers(HashMap::from([("X-Team".to_string(), "search".to_string())])),
            with_headers(HashMap::from([("X-Env".to_string(), "test".to_string())])),
            with_debug(true),
            with_transport(transport.clone()),
        ],
    )
    .expect("client");

    let mut request = ChatRequest::new(
        "openai/gpt-4o-mini",
        vec![
            Message::text("system", "Be brief."),
            Message::text("user", "Say hi"),
        ],
    );
    request.temperature = Some(0.2);
    request.max_tokens = Some(64);

    let response = client.chat().create(request).await.expect("response");
    assert_eq!(response.id, "gen-123");
    assert_eq!(response.first_text(), Some("Hi there"));
    assert_eq!(response.usage.as_ref().map(|u| u.total_tokens), Some(11));

    let sent = &transport.requests()[0];
    assert_eq!(sent.url, "https://gateway.example.com/api/v1/chat/completions");
    assert_eq!(sent.timeout, Some(Duration::from_secs(15)));
    let header = |name: &str| sent.headers.get(name).map(String::as_str);
    assert_eq!(header("Authorization"), Some("Bearer sk-or-test"));
    assert_eq!(header("HTTP-Referer"), Some("https://myapp.example.com"));
    assert_eq!(header("X-Title"), Some("My App"));
    assert_eq!(header("X-Forwarded-For"), Some("203.0.113.7"));
    assert_eq!(header("X-Team"), Some("search"));
    assert_eq!(header("X-Env"), Some("test"));

    let body = transport.body(0);
    assert_eq!(body["model"], "openai/gpt-4o-mini");
    assert_eq!(body["temperature"], 0.2);
    assert_eq!(body["max_tokens"], 64);
    assert_eq!(body["stream"], false);
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "Be brief."},
            {"role": "user", "content": "Say hi"}
        ])
    );
    assert!(body.get("tools").is_none());
}

#[tokio::test]
async fn multimodal_parts_reach_the_wire_in_order() {
    let png = general_purpose::STANDARD.encode(b"\x89PNG\r\n\x1a\nfake");
    let data_url = format!("data:image/png;base64,{png}");
    let transport = RecordingTransport::with(vec![ok(completion("A cat."))]);
    let client = client(transport.clone());

    let request = ChatRequest::new(
        "google/gemini-2.0-flash-001",
        vec![Message::multimodal(
            "user",
            Some(vec![
                ContentPart::text("What is shown?"),
                ContentPart::image_url(data_url.clone()),
            ]),
        )],
    );
    client.chat().create(request).await.expect("response");

    assert_eq!(
        transport.body(0)["messages"][0]["content"],
        json!([
            {"type": "text", "text": "What is shown?"},
            {"type": "image_url", "image_url": {"url": data_url}}
        ])
    );
}

#[tokio::test]
async fn empty_multimodal_message_is_sent_as_empty_parts() {
    let message = Message::multimodal("user", None);
    assert_eq!(message.content, Some(MessageContent::Parts(Vec::new())));

    let transport = RecordingTransport::with(vec![ok(completion("?"))]);
    client(transport.clone())
        .chat()
        .create(ChatRequest::new("m", vec![message]))
        .await
        .expect("response");
    assert_eq!(transport.body(0)["messages"][0]["content"], json!([]));
}

#[tokio::test]
async fn tools_and_structured_output_are_forwarded() {
    let transport = RecordingTransport::with(vec![ok(json!({
        "id": "gen-tools",
        "object": "chat.completion",
        "created": 1,
        "model": "openai/gpt-4o",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{\"city\":\"Oslo\"}"}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    }))]);
    let client = client(transport.clone());

    let mut request = ChatRequest::new(
        "openai/gpt-4o",
        vec![Message::text("user", "Weather in Oslo?")],
    );
    request.tools = vec![Tool::function(
        "get_weather",
        Some("Current weather for a city".into()),
        Some(json!({
            "type": "object",
            "properties": {"city": {"type": "string"}},
            "required": ["city"]
        })),
    )];
    request.tool_choice = Some(ToolChoice::Auto);
    request.response_format = Some(ResponseFormat::json_object());

    let response = client.chat().create(request).await.expect("response");
    let message = response.choices[0].message.as_ref().expect("message");
    assert_eq!(message.content, None);
    let calls = message.tool_calls.as_ref().expect("tool calls");
    assert_eq!(calls[0].function.name, "get_weather");
    assert_eq!(calls[0].function.arguments, r#"{"city":"Oslo"}"#);

    let body = transport.body(0);
    assert_eq!(body["tool_choice"], "auto");
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["parameters"]["required"], json!(["city"]));
    assert_eq!(body["response_format"], json!({"type": "json_object"}));
}

#[tokio::test]
async fn streaming_yields_chunks_then_sticky_end() {
    let event = |content: &str| {
        format!(
            "data: {}\n\n",
            json!({
                "id": "gen-s",
                "object": "chat.completion.chunk",
                "created": 1,
                "model": "openai/gpt-4o-mini",
                "choices": [{"index": 0, "delta": {"content": content}}]
            })
        )
    };
    let transport = RecordingTransport::with(vec![Canned::Sse(vec![
        ": OPENROUTER PROCESSING\n\n".to_string(),
        event("Hel"),
        event("lo"),
        "data: [DONE]\n\n".to_string(),
    ])]);
    let client = client(transport.clone());

    let mut reader = client
        .chat()
        .create_stream(ChatRequest::new("openai/gpt-4o-mini", vec![Message::text("user", "hi")]))
        .await
        .expect("reader");

    let mut text = String::new();
    loop {
        let item = reader.next().await.expect("item");
        if let Some(chunk) = item.chunk() {
            if let Some(delta) = chunk.choices[0].delta.as_ref().and_then(Message::as_text) {
                text.push_str(delta);
            }
        }
        if item.is_end() {
            break;
        }
    }
    assert_eq!(text, "Hello");
    assert_eq!(reader.next().await.expect("end"), StreamItem::End);
    reader.close();
    reader.close();
    assert_eq!(reader.next().await.expect("end"), StreamItem::End);

    assert_eq!(transport.body(0)["stream"], true);
}

#[tokio::test]
async fn stream_without_done_marker_delivers_last_chunk() {
    let tail = format!(
        "data: {}",
        json!({
            "id": "gen-t",
            "choices": [{"index": 0, "delta": {"content": "bye"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4, "cost": 0.0001}
        })
    );
    let transport = RecordingTransport::with(vec![Canned::Sse(vec![tail])]);

    let chunks = client(transport)
        .chat()
        .create_stream(ChatRequest::new("m", vec![Message::text("user", "hi")]))
        .await
        .expect("reader")
        .into_stream()
        .collect::<Vec<_>>()
        .await;
    assert_eq!(chunks.len(), 1);
    let chunk = chunks[0].as_ref().expect("chunk");
    assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
    assert_eq!(chunk.usage.as_ref().and_then(|u| u.cost), Some(0.0001));
}

#[tokio::test]
async fn embeddings_round_trip() {
    let transport = RecordingTransport::with(vec![ok(json!({
        "object": "list",
        "data": [
            {"object": "embedding", "embedding": [0.1, 0.2], "index": 0},
            {"object": "embedding", "embedding": [0.3, 0.4], "index": 1}
        ],
        "model": "openai/text-embedding-3-small",
        "usage": {"prompt_tokens": 6, "total_tokens": 6}
    }))]);
    let client = client(transport.clone());

    let response = client
        .embeddings()
        .create(EmbeddingRequest::new(
            "openai/text-embedding-3-small",
            vec!["first".to_string(), "second".to_string()],
        ))
        .await
        .expect("embeddings");
    assert_eq!(response.data.len(), 2);
    assert_eq!(response.data[1].embedding, vec![0.3, 0.4]);
    assert_eq!(response.usage.map(|u| u.total_tokens), Some(6));

    let sent = &transport.requests()[0];
    assert_eq!(sent.url, "https://openrouter.ai/api/v1/embeddings");
    assert_eq!(
        transport.body(0),
        json!({"model": "openai/text-embedding-3-small", "input": ["first", "second"]})
    );
}

#[tokio::test]
async fn rate_limit_is_retried_with_retry_after() {
    let transport = RecordingTransport::with(vec![
        Canned::Json(
            429,
            json!({"error": {"code": 429, "message": "Rate limit exceeded"}}),
            HashMap::from([("retry-after".to_string(), "1".to_string())]),
        ),
        ok(completion("finally")),
    ]);
    let client = Client::new(
        "openrouter",
        [with_api_key("k"), with_max_retries(1), with_transport(transport.clone())],
    )
    .expect("client");

    tokio::time::pause();
    let response = client
        .chat()
        .create(ChatRequest::new("m", vec![Message::text("user", "hi")]))
        .await
        .expect("response");
    assert_eq!(response.first_text(), Some("finally"));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn backend_errors_surface_as_typed_errors() {
    let transport = RecordingTransport::with(vec![
        Canned::Json(
            401,
            json!({"error": {"code": 401, "message": "User not found."}}),
            HashMap::new(),
        ),
        Canned::Json(
            400,
            json!({"error": {"code": 400, "message": "openai/nope is not a valid model ID"}}),
            HashMap::new(),
        ),
    ]);
    let client = client(transport.clone());
    let request = ChatRequest::new("openai/nope", vec![Message::text("user", "hi")]);

    let err = client.chat().create(request.clone()).await.unwrap_err();
    assert!(matches!(err, LLMError::Auth { .. }), "got {err:?}");

    let err = client.chat().create(request).await.unwrap_err();
    match err {
        LLMError::Provider {
            provider,
            status,
            message,
        } => {
            assert_eq!(provider, "openrouter");
            assert_eq!(status, Some(400));
            assert!(message.contains("not a valid model"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn per_choice_errors_are_data_not_failures() {
    let transport = RecordingTransport::with(vec![ok(json!({
        "id": "gen-e",
        "object": "chat.completion",
        "created": 1,
        "model": "m",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": ""},
            "finish_reason": "error",
            "error": {"code": 502, "message": "Upstream provider error"}
        }]
    }))]);

    let response = client(transport)
        .chat()
        .create(ChatRequest::new("m", vec![Message::text("user", "hi")]))
        .await
        .expect("response");
    let error = response.choices[0].error.as_ref().expect("choice error");
    assert_eq!(error.code, 502);
    assert_eq!(error.message, "Upstream provider error");
}

#[tokio::test]
async fn validation_failures_skip_the_network() {
    let transport = RecordingTransport::with(Vec::new());
    let client = client(transport.clone());

    let err = client
        .chat()
        .create(ChatRequest::new("m", Vec::new()))
        .await
        .unwrap_err();
    assert!(err.is_invalid_request());

    let err = client
        .embeddings()
        .create(EmbeddingRequest::new("e", ""))
        .await
        .unwrap_err();
    assert!(err.matches(&LLMError::invalid_request("input", "cannot be empty string")));
    assert!(transport.requests().is_empty());
}
