use crate::providers::{
    parse_result_items, BatchItem, ProviderKind, ResultItem, SpellCheckBatchRequest,
    TranslationBatchRequest, TranslationProvider,
};
use crate::utils::{Result, TranslatorError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const TRANSLATE_SYSTEM_PROMPT: &str = "You are a professional video game translator. \
Respect the provided context and glossaries. Keep the tone and do not invent information. \
Return ONLY valid JSON.";

const SPELLCHECK_SYSTEM_PROMPT: &str = "You are a spelling and grammar corrector. \
Only fix spelling and grammar mistakes in the same language. Do not translate or change the meaning. \
Keep tone and formatting (dialogue, capitalization, etc.). Return ONLY valid JSON.";

/// Chat-completions backend.
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn text_payload(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "[]".to_string())
    }
}

impl OpenAiProvider {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn build_translation_prompt(request: &TranslationBatchRequest) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "Additional context (may be truncated):\n{}\n\n",
            none_if_empty(&request.context_snippet)
        ));
        prompt.push_str(&format!(
            "Glossary (use exactly these translations when they apply):\n{}\n\n",
            none_if_empty(&request.glossary_snippet)
        ));
        prompt.push_str(&format!("Source language: {}\n", request.source_language_name));
        prompt.push_str(&format!(
            "Target language: {} ({})\n\n",
            request.target_language.name, request.target_language.code
        ));
        prompt.push_str("Translate the following texts and return a JSON array with the format:\n");
        prompt.push_str("[{\"id\": \"ITEM_ID\", \"translatedText\": \"translated text\"}]\n\n");
        prompt.push_str("Items to translate:\n");
        prompt.push_str(&items_json(&request.items));

        prompt
    }

    fn build_spellcheck_prompt(request: &SpellCheckBatchRequest) -> String {
        let mut prompt = format!("Text language: {}\n\n", request.language_name);
        prompt.push_str("Return a JSON array with the format:\n");
        prompt.push_str("[{\"id\": \"ITEM_ID\", \"translatedText\": \"corrected text\"}]\n\n");
        prompt.push_str("Texts to correct:\n");
        prompt.push_str(&items_json(&request.items));
        prompt
    }

    async fn complete(
        &self,
        credential: &str,
        model_id: &str,
        system: &str,
        user: String,
        temperature: f32,
    ) -> Result<String> {
        let request = ChatRequest {
            model: model_id,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslatorError::ProviderHttp {
                provider: ProviderKind::OpenAi.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!(provider = "openai", error = %e, "Unexpected response shape");
            ChatResponse::default()
        });

        Ok(parsed.text_payload())
    }
}

#[async_trait]
impl TranslationProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn translate_batch(
        &self,
        credential: &str,
        model_id: &str,
        request: &TranslationBatchRequest,
    ) -> Result<Vec<ResultItem>> {
        let content = self
            .complete(
                credential,
                model_id,
                TRANSLATE_SYSTEM_PROMPT,
                Self::build_translation_prompt(request),
                0.2,
            )
            .await?;

        let results = parse_result_items(&content);
        debug!(
            provider = "openai",
            returned = results.len(),
            items = request.items.len(),
            "Parsed translations"
        );
        Ok(results)
    }

    fn supports_spell_check(&self) -> bool {
        true
    }

    async fn spell_correct_batch(
        &self,
        credential: &str,
        model_id: &str,
        request: &SpellCheckBatchRequest,
    ) -> Result<Vec<ResultItem>> {
        let content = self
            .complete(
                credential,
                model_id,
                SPELLCHECK_SYSTEM_PROMPT,
                Self::build_spellcheck_prompt(request),
                0.1,
            )
            .await?;
        Ok(parse_result_items(&content))
    }
}

pub(crate) fn none_if_empty(text: &str) -> &str {
    if text.trim().is_empty() {
        "None"
    } else {
        text
    }
}

pub(crate) fn items_json(items: &[BatchItem]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TargetLanguage;

    #[test]
    fn translation_prompt_embeds_everything() {
        let request = TranslationBatchRequest {
            context_snippet: String::new(),
            glossary_snippet: "Term: sword -> Translation: espada".to_string(),
            source_language_name: "Spanish".to_string(),
            target_language: TargetLanguage {
                code: "en".to_string(),
                name: "English".to_string(),
            },
            items: vec![BatchItem {
                id: "en:1".to_string(),
                key: "k1".to_string(),
                source_text: "hola".to_string(),
            }],
        };

        let prompt = OpenAiProvider::build_translation_prompt(&request);
        assert!(prompt.contains("Additional context (may be truncated):\nNone"));
        assert!(prompt.contains("Term: sword -> Translation: espada"));
        assert!(prompt.contains("Target language: English (en)"));
        assert!(prompt.contains(r#""translatedText""#));
        assert!(prompt.contains(r#"{"id":"en:1","key":"k1","sourceText":"hola"}"#));
    }

    #[test]
    fn missing_choices_become_empty_array() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(parsed.text_payload(), "[]");
    }
}
