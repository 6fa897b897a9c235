use crate::providers::openai::{items_json, none_if_empty};
use crate::providers::{
    parse_result_items, ProviderKind, ResultItem, SpellCheckBatchRequest, TranslationBatchRequest,
    TranslationProvider,
};
use crate::utils::{Result, TranslatorError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Single-content `generateContent` backend.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn text_payload(self) -> String {
        let text = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text.unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.is_empty() {
            "[]".to_string()
        } else {
            text
        }
    }
}

impl GeminiProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, model_id: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(model_id)
        )
    }

    fn build_translation_prompt(request: &TranslationBatchRequest) -> String {
        let mut text = String::from(
            "You are a professional video game translator. Respect the provided context and glossaries. ",
        );
        text.push_str("Return ONLY a JSON array with the format ");
        text.push_str("[{\"id\": \"ITEM_ID\", \"translatedText\": \"translated text\"}].\n\n");
        text.push_str(&format!(
            "Additional context (may be truncated):\n{}\n\n",
            none_if_empty(&request.context_snippet)
        ));
        text.push_str(&format!(
            "Glossary (use exactly these translations when they apply):\n{}\n\n",
            none_if_empty(&request.glossary_snippet)
        ));
        text.push_str(&format!("Source language: {}\n", request.source_language_name));
        text.push_str(&format!(
            "Target language: {} ({})\n\n",
            request.target_language.name, request.target_language.code
        ));
        text.push_str("Items to translate:\n");
        text.push_str(&items_json(&request.items));
        text
    }

    fn build_spellcheck_prompt(request: &SpellCheckBatchRequest) -> String {
        let mut text = String::from(
            "You are a spelling and grammar corrector. Only fix spelling and grammar mistakes in the same language. \
             Do not translate or change the meaning. Keep tone and formatting. Return ONLY a JSON array: ",
        );
        text.push_str("[{\"id\": \"ITEM_ID\", \"translatedText\": \"corrected text\"}].\n\n");
        text.push_str(&format!("Text language: {}\n\n", request.language_name));
        text.push_str("Texts to correct:\n");
        text.push_str(&items_json(&request.items));
        text
    }

    async fn generate(
        &self,
        credential: &str,
        model_id: &str,
        text: String,
        temperature: f32,
    ) -> Result<String> {
        let payload = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let response = self
            .client
            .post(self.url_for(model_id))
            .query(&[("key", credential)])
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslatorError::ProviderHttp {
                provider: ProviderKind::Gemini.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| e.without_url())?;
        let parsed: GenerateResponse = serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!(provider = "gemini", error = %e, "Unexpected response shape");
            GenerateResponse::default()
        });

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            warn!(provider = "gemini", block_reason = %reason, "Prompt blocked");
        }

        Ok(parsed.text_payload())
    }
}

#[async_trait]
impl TranslationProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn translate_batch(
        &self,
        credential: &str,
        model_id: &str,
        request: &TranslationBatchRequest,
    ) -> Result<Vec<ResultItem>> {
        let content = self
            .generate(credential, model_id, Self::build_translation_prompt(request), 0.2)
            .await?;

        let results = parse_result_items(&content);
        debug!(
            provider = "gemini",
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
            .generate(credential, model_id, Self::build_spellcheck_prompt(request), 0.1)
            .await?;
        Ok(parse_result_items(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_are_joined_with_newlines() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"[{\"id\":\"a\","},{"text":"\"translatedText\":\"b\"}]"}]}}]}"#,
        )
        .unwrap();
        let payload = parsed.text_payload();
        assert_eq!(payload, "[{\"id\":\"a\",\n\"translatedText\":\"b\"}]");
        assert_eq!(parse_result_items(&payload).len(), 1);
    }

    #[test]
    fn blocked_prompt_has_empty_payload() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(parsed.text_payload(), "[]");
    }

    #[test]
    fn model_id_is_url_encoded() {
        let provider = GeminiProvider::new(Client::new(), "http://localhost:1/");
        assert_eq!(
            provider.url_for("gemini 1.5"),
            "http://localhost:1/v1beta/models/gemini%201.5:generateContent"
        );
    }
}
