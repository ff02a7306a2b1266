//! Integration tests: run the Ollama client and the generator against a local fake /api/generate.
//! Does not require a running Ollama.

mod common;

use axum::http::StatusCode;
use common::{FakeOllama, OllamaScript};
use lib::generation::{GenerationError, Generator};
use lib::llm::{GenerationBackend, LlmError, OllamaClient};
use std::sync::Arc;

async fn generator_for(fake: &FakeOllama) -> Generator {
    let addr = fake.start().await;
    let client = OllamaClient::new(Some(format!("http://{}/", addr)));
    Generator::new(Arc::new(client), "llama3.1:8b")
}

#[tokio::test]
async fn streamed_fragments_are_joined_and_request_is_well_formed() {
    let fake = FakeOllama::new(OllamaScript::fragments(&["Rust", " is", " a language."]));
    let generator = generator_for(&fake).await;

    let reply = generator.generate("what is rust?").await.expect("generate");
    assert_eq!(reply, "Rust is a language.");

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "llama3.1:8b");
    assert_eq!(requests[0]["prompt"], "what is rust?");
    assert_eq!(requests[0]["stream"], true);
}

#[tokio::test]
async fn done_without_fragments_yields_empty_reply() {
    let fake = FakeOllama::new(OllamaScript::fragments(&[]));
    let generator = generator_for(&fake).await;
    assert_eq!(generator.generate("hi").await.expect("generate"), "");
}

#[tokio::test]
async fn last_line_without_newline_is_processed() {
    let body = concat!(
        r#"{"response":"a","done":false}"#,
        "\n",
        r#"{"response":"b","done":true}"#
    );
    let fake = FakeOllama::new(OllamaScript::Body(body.to_string()));
    let generator = generator_for(&fake).await;
    assert_eq!(generator.generate("x").await.expect("generate"), "ab");
}

#[tokio::test]
async fn error_line_mid_stream_fails_without_partial_output() {
    let body = concat!(
        r#"{"response":"Rust","done":false}"#,
        "\n",
        r#"{"error":"model runner has unexpectedly stopped"}"#,
        "\n"
    );
    let fake = FakeOllama::new(OllamaScript::Body(body.to_string()));
    let generator = generator_for(&fake).await;
    let err = generator.generate("what is rust?").await.unwrap_err();
    match err {
        GenerationError::Backend(LlmError::Api(msg)) => {
            assert!(msg.contains("unexpectedly stopped"), "{}", msg)
        }
        other => panic!("expected backend api error, got {:?}", other),
    }
}

#[tokio::test]
async fn stream_ending_before_done_is_interrupted() {
    let body = concat!(r#"{"response":"Rust","done":false}"#, "\n");
    let fake = FakeOllama::new(OllamaScript::Body(body.to_string()));
    let generator = generator_for(&fake).await;
    let err = generator.generate("what is rust?").await.unwrap_err();
    assert!(matches!(err, GenerationError::Backend(LlmError::Interrupted)));
}

#[tokio::test]
async fn http_error_status_includes_backend_text() {
    let fake = FakeOllama::new(OllamaScript::Status(
        StatusCode::NOT_FOUND,
        r#"{"error":"model 'llama3.1:8b' not found"}"#.to_string(),
    ));
    let generator = generator_for(&fake).await;
    let err = generator.generate("hi").await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("404"), "{}", text);
    assert!(text.contains("not found"), "{}", text);
}

#[tokio::test]
async fn unreachable_backend_is_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let port = listener.local_addr().expect("local_addr").port();
    drop(listener);
    let client = OllamaClient::new(Some(format!("http://127.0.0.1:{}", port)));
    let generator = Generator::new(Arc::new(client), "llama3.1:8b");
    let err = generator.generate("hi").await.unwrap_err();
    assert!(matches!(err, GenerationError::Backend(LlmError::Request(_))));
}

#[tokio::test]
async fn list_models_reads_tags() {
    let fake = FakeOllama::new(OllamaScript::fragments(&[]));
    let addr = fake.start().await;
    let client = OllamaClient::new(Some(format!("http://{}", addr)));
    let models = client.list_models().await.expect("list models");
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].name, "llama3.1:8b");
    assert_eq!(models[0].size, Some(4_920_753_328));
}

#[tokio::test]
async fn callback_error_aborts_stream_and_is_returned() {
    let fake = FakeOllama::new(OllamaScript::fragments(&["a", "b", "c"]));
    let addr = fake.start().await;
    let client = OllamaClient::new(Some(format!("http://{}", addr)));

    let mut seen: Vec<String> = Vec::new();
    let mut on_fragment = |fragment: &str| -> Result<(), LlmError> {
        seen.push(fragment.to_string());
        Err(LlmError::Aborted("stop".to_string()))
    };
    let result = client.generate("llama3.1:8b", "hi", &mut on_fragment).await;

    match result {
        Err(LlmError::Aborted(reason)) => assert_eq!(reason, "stop"),
        other => panic!("expected aborted stream, got {:?}", other),
    }
    assert_eq!(seen, vec!["a"]);
}
