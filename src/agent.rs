//! Клиент ИИ-сервиса предложений (chat-completions API)
//!
//! Единственная конкретная реализация `ProposalService`: OpenAI-совместимый
//! endpoint выбранного провайдера. Клиент не интерпретирует содержимое
//! ответа — только проверяет, что это валидный плоский JSON-объект.

use razgon_core::{RazgonError, Result, SettingsMapping};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::codec::json_value_to_string;
use crate::optimizer::{OptimizationRequest, ProposalService};
use crate::preferences::Preferences;

/// Поддерживаемые провайдеры
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Groq,
    OpenAi,
}

impl AiProvider {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "groq" => Some(Self::Groq),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a PC Optimization Expert AI. \
Your goal is to analyze a game configuration file and propose optimized values based on the user's hardware. \
You MUST return ONLY a valid JSON object with the exact same keys as the input, but with optimized values. \
Do not add comments, do not add markdown code blocks (```json). Just the raw JSON string. \
Focus on Stability and FPS.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    // Низкая температура для детерминированного технического вывода
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct ChatCompletionsAgent {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatCompletionsAgent {
    pub fn new(api_key: String, provider: AiProvider, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: provider.base_url().to_string(),
            model,
        }
    }

    /// Собрать клиента из настроек приложения.
    /// Пустой или отсутствующий ключ — `AiUnavailable`.
    pub fn from_preferences(prefs: &Preferences) -> Result<Self> {
        let api_key = prefs
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(RazgonError::AiUnavailable)?;
        Ok(Self::new(api_key, prefs.provider, prefs.model.clone()))
    }
}

impl ProposalService for ChatCompletionsAgent {
    fn propose(
        &self,
        request: &OptimizationRequest,
    ) -> impl Future<Output = Result<SettingsMapping>> + Send {
        let title = request.title.clone();
        let hardware = serde_json::to_string(&request.hardware);
        let current = serde_json::to_string(&request.current);

        async move {
            let user_prompt = format!(
                "Game: {}\nHardware: {}\nCurrent Config: {}\n\nProvide the optimized JSON configuration.",
                title, hardware?, current?
            );

            let body = ChatRequest {
                model: &self.model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: SYSTEM_PROMPT.to_string(),
                    },
                    ChatMessage {
                        role: "user",
                        content: user_prompt,
                    },
                ],
                temperature: 0.3,
            };

            log::debug!("AI: requesting proposal from {}", self.base_url);

            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?
                .error_for_status()?;

            let parsed: ChatResponse = response.json().await?;
            let content = parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| RazgonError::AiResponse("no choices in response".into()))?
                .message
                .content;

            log::info!("AI: received proposal ({} chars)", content.len());
            parse_proposal(&content)
        }
    }
}

/// Разобрать текст ответа модели в плоское отображение
fn parse_proposal(content: &str) -> Result<SettingsMapping> {
    let cleaned = strip_markdown_fences(content.trim());
    let value: serde_json::Value =
        serde_json::from_str(cleaned).map_err(|e| RazgonError::AiResponse(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| RazgonError::AiResponse("response is not a JSON object".into()))?;

    Ok(object
        .iter()
        .map(|(key, value)| (key.clone(), json_value_to_string(value)))
        .collect())
}

/// Модели любят заворачивать JSON в markdown, несмотря на запрет
fn strip_markdown_fences(content: &str) -> &str {
    let mut s = content;
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(
            strip_markdown_fences("```json\n{\"a\": 1}\n```"),
            "{\"a\": 1}"
        );
        assert_eq!(strip_markdown_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_markdown_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn proposal_parses_into_flat_strings() {
        let settings =
            parse_proposal("```json\n{\"VSync\": \"Off\", \"FOV\": 90, \"HDR\": false}\n```")
                .unwrap();
        assert_eq!(settings["VSync"], "Off");
        assert_eq!(settings["FOV"], "90");
        assert_eq!(settings["HDR"], "false");
    }

    #[test]
    fn prose_response_is_an_ai_response_error() {
        let err = parse_proposal("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, RazgonError::AiResponse(_)));
    }

    #[test]
    fn non_object_response_is_rejected() {
        let err = parse_proposal("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, RazgonError::AiResponse(_)));
    }

    #[test]
    fn agent_requires_api_key() {
        let prefs = Preferences::default();
        assert!(matches!(
            ChatCompletionsAgent::from_preferences(&prefs),
            Err(RazgonError::AiUnavailable)
        ));
    }
}
