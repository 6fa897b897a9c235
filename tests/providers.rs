use locsheet_translator::providers::{
    BatchItem, GeminiProvider, OpenAiProvider, SpellCheckBatchRequest, TranslationBatchRequest,
};
use locsheet_translator::{TargetLanguage, TranslationProvider, TranslatorError};
use mockito::Matcher;
use reqwest::Client;

fn batch() -> TranslationBatchRequest {
    TranslationBatchRequest {
        context_snippet: String::new(),
        glossary_snippet: "Term: espada -> Translation: sword".to_string(),
        source_language_name: "Español".to_string(),
        target_language: TargetLanguage {
            code: "en".to_string(),
            name: "English".to_string(),
        },
        items: vec![
            BatchItem {
                id: "en:1".to_string(),
                key: "greet".to_string(),
                source_text: "hola".to_string(),
            },
            BatchItem {
                id: "en:2".to_string(),
                key: "weapon".to_string(),
                source_text: "espada".to_string(),
            },
        ],
    }
}

fn chat_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

#[tokio::test]
async fn openai_unwraps_fenced_json_from_the_first_choice() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({"model": "gpt-4o-mini"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body(
            "```json\n[{\"id\":\"en:1\",\"translatedText\":\"hello\"},{\"id\":\"en:2\",\"translatedText\":\"sword\"}]\n```",
        ))
        .create_async()
        .await;

    let provider = OpenAiProvider::new(Client::new(), format!("{}/v1/chat/completions", server.url()));
    let results = provider
        .translate_batch("sk-test", "gpt-4o-mini", &batch())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "en:1");
    assert_eq!(results[0].translated_text, "hello");
    assert_eq!(results[1].translated_text, "sword");
}

#[tokio::test]
async fn openai_non_success_is_a_provider_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body("{\"error\":\"invalid api key\"}")
        .create_async()
        .await;

    let provider = OpenAiProvider::new(Client::new(), format!("{}/v1/chat/completions", server.url()));
    let err = provider
        .translate_batch("bad", "gpt-4o-mini", &batch())
        .await
        .unwrap_err();

    match err {
        TranslatorError::ProviderHttp {
            provider,
            status,
            body,
        } => {
            assert_eq!(provider, "openai");
            assert_eq!(status, 401);
            assert!(body.contains("invalid api key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn openai_malformed_body_yields_no_items() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(chat_body("Sorry, I cannot help with that."))
        .create_async()
        .await;

    let provider = OpenAiProvider::new(Client::new(), format!("{}/v1/chat/completions", server.url()));
    let results = provider
        .translate_batch("sk-test", "gpt-4o-mini", &batch())
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn openai_spell_check_uses_the_same_result_shape() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(serde_json::json!({"temperature": 0.1})))
        .with_status(200)
        .with_body(chat_body("[{\"id\":\"spell:1\",\"translatedText\":\"hola\"}]"))
        .create_async()
        .await;

    let provider = OpenAiProvider::new(Client::new(), format!("{}/v1/chat/completions", server.url()));
    let request = SpellCheckBatchRequest {
        language_name: "Español".to_string(),
        items: vec![BatchItem {
            id: "spell:1".to_string(),
            key: "greet".to_string(),
            source_text: "ola".to_string(),
        }],
    };
    let results = provider
        .spell_correct_batch("sk-test", "gpt-4o-mini", &request)
        .await
        .unwrap();
    assert_eq!(results[0].translated_text, "hola");
}

#[tokio::test]
async fn gemini_passes_the_key_as_query_and_joins_parts() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [
                    {"text": "[{\"id\":\"en:1\",\"translatedText\":\"hello\"},"},
                    {"text": "{\"id\":\"en:2\",\"translatedText\":\"sword\"}]"}
                ]
            }
        }]
    });
    let mock = server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::UrlEncoded("key".into(), "g-key".into()))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let provider = GeminiProvider::new(Client::new(), server.url());
    let results = provider
        .translate_batch("g-key", "gemini-1.5-flash", &batch())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].id, "en:2");
}

#[tokio::test]
async fn gemini_blocked_prompt_yields_no_items() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("{\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}")
        .create_async()
        .await;

    let provider = GeminiProvider::new(Client::new(), server.url());
    let results = provider
        .translate_batch("g-key", "gemini-1.5-flash", &batch())
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn gemini_quota_error_is_a_provider_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("quota exceeded")
        .create_async()
        .await;

    let provider = GeminiProvider::new(Client::new(), server.url());
    let err = provider
        .translate_batch("g-key", "gemini-1.5-flash", &batch())
        .await
        .unwrap_err();
    assert!(matches!(err, TranslatorError::ProviderHttp { status: 429, .. }));
    assert!(!err.to_string().contains("g-key"));
}
