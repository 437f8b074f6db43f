//! Provider adapter: one interface over incompatible vendor chat APIs.
//!
//! The supported vendors disagree on nearly everything: auth header names,
//! request body nesting, token-limit field names, and even whether the REST
//! verb lives in the path (Gemini) or the body. A closed [`ProviderKind`]
//! enum with one request-building and one response-parsing branch per vendor
//! is the whole design; there is no plugin system, and an unknown provider
//! name is an explicit error rather than a silent fallback.
//!
//! | kind | URL | auth | max-length field |
//! |------|-----|------|------------------|
//! | `openai`, `github` | `{endpoint}/chat/completions` | `Authorization: Bearer` | `max_completion_tokens` |
//! | `anthropic` | `{endpoint}/chat/completions` | `x-api-key` + `anthropic-version` | `max_tokens` |
//! | `cohere`, `mistral` | `{endpoint}/chat/completions` | `Authorization: Bearer` | `max_tokens` |
//! | `gemini` | `{endpoint}/models/{model}:generateContent?key={key}` | key in query | n/a |
//!
//! Calls are single-shot request/response. The adapter performs no retries;
//! a non-success vendor status is surfaced as [`ProviderError::CallFailed`]
//! with the vendor's status code and raw error body.

use std::str::FromStr;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::ChatMessage;

/// Completion-length cap sent to every vendor that accepts one.
const MAX_COMPLETION_TOKENS: u32 = 4000;

/// Version header required by the Anthropic messages API.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Errors from the provider adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request named a provider this relay does not speak.
    #[error("unsupported provider: {0}")]
    Unsupported(String),

    /// The request carried no messages to forward.
    #[error("conversation is empty")]
    EmptyConversation,

    /// No API key was available for the resolved provider.
    #[error("no API key configured for provider {0}")]
    MissingApiKey(&'static str),

    /// The vendor answered with a non-success HTTP status.
    #[error("provider call failed with status {status}: {body}")]
    CallFailed { status: u16, body: String },

    /// The vendor answered 200 but the expected text field was absent.
    #[error("no response from AI model")]
    EmptyResponse,

    /// The outbound call never completed (connect failure, timeout).
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The closed set of vendor protocols the relay can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Github,
    Anthropic,
    Cohere,
    Mistral,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Github => "github",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Cohere => "cohere",
            ProviderKind::Mistral => "mistral",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Endpoint used when neither the request nor the config names one.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Github => "https://models.inference.ai.azure.com",
            ProviderKind::Anthropic => "https://api.anthropic.com/v1",
            ProviderKind::Cohere => "https://api.cohere.ai/compatibility/v1",
            ProviderKind::Mistral => "https://api.mistral.ai/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    /// Model used when neither the request nor the config names one.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Github => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-haiku-latest",
            ProviderKind::Cohere => "command-r",
            ProviderKind::Mistral => "mistral-small-latest",
            ProviderKind::Gemini => "gemini-2.0-flash",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderKind::OpenAi),
            "github" => Ok(ProviderKind::Github),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "cohere" => Ok(ProviderKind::Cohere),
            "mistral" => Ok(ProviderKind::Mistral),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(ProviderError::Unsupported(other.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully shaped outbound request, ready to hand to the HTTP client.
///
/// Kept as plain data so request shaping can be tested without a network.
#[derive(Debug)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

/// Shapes the vendor-specific HTTP request for one chat completion.
pub fn build_request(
    kind: ProviderKind,
    endpoint: &str,
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
) -> Result<ProviderRequest, ProviderError> {
    if messages.is_empty() {
        return Err(ProviderError::EmptyConversation);
    }
    let endpoint = endpoint.trim_end_matches('/');

    match kind {
        ProviderKind::Gemini => {
            // Gemini gets only the final message's text; prior turns are
            // dropped. Inherited wire behavior, kept as-is so a relayed
            // conversation renders the same through every deployment.
            let last = messages.last().ok_or(ProviderError::EmptyConversation)?;
            Ok(ProviderRequest {
                url: format!(
                    "{}/models/{}:generateContent?key={}",
                    endpoint, model, api_key
                ),
                headers: Vec::new(),
                body: json!({
                    "contents": [{ "parts": [{ "text": last.content }] }],
                }),
            })
        }
        ProviderKind::Anthropic => Ok(ProviderRequest {
            url: format!("{}/chat/completions", endpoint),
            headers: vec![
                ("x-api-key", api_key.to_string()),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
            body: json!({
                "model": model,
                "messages": messages,
                "max_tokens": MAX_COMPLETION_TOKENS,
            }),
        }),
        ProviderKind::Cohere | ProviderKind::Mistral => Ok(ProviderRequest {
            url: format!("{}/chat/completions", endpoint),
            headers: vec![("Authorization", format!("Bearer {}", api_key))],
            body: json!({
                "model": model,
                "messages": messages,
                "max_tokens": MAX_COMPLETION_TOKENS,
            }),
        }),
        ProviderKind::OpenAi | ProviderKind::Github => Ok(ProviderRequest {
            url: format!("{}/chat/completions", endpoint),
            headers: vec![("Authorization", format!("Bearer {}", api_key))],
            body: json!({
                "model": model,
                "messages": messages,
                "max_completion_tokens": MAX_COMPLETION_TOKENS,
            }),
        }),
    }
}

/// Extracts the assistant's text from a vendor response body.
///
/// Returns `None` when the expected field is missing — the caller surfaces
/// that as [`ProviderError::EmptyResponse`].
pub fn extract_text(kind: ProviderKind, response: &Value) -> Option<String> {
    let text = match kind {
        ProviderKind::Gemini => response
            .pointer("/candidates/0/content/parts/0/text")?
            .as_str()?,
        ProviderKind::Anthropic => response.pointer("/content/0/text")?.as_str()?,
        ProviderKind::OpenAi
        | ProviderKind::Github
        | ProviderKind::Cohere
        | ProviderKind::Mistral => response.pointer("/choices/0/message/content")?.as_str()?,
    };
    Some(text.to_string())
}

/// Builds the shared outbound HTTP client with the configured call timeout.
pub fn http_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Performs one chat completion against the given vendor and returns the
/// assistant's text.
pub async fn send(
    client: &reqwest::Client,
    kind: ProviderKind,
    endpoint: &str,
    api_key: &str,
    model: &str,
    messages: &[ChatMessage],
) -> Result<String, ProviderError> {
    let request = build_request(kind, endpoint, api_key, model, messages)?;

    debug!(provider = %kind, model, url = %request.url, "dispatching provider call");

    let mut outbound = client.post(&request.url).json(&request.body);
    for (name, value) in &request.headers {
        outbound = outbound.header(*name, value);
    }

    let response = outbound.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::CallFailed {
            status: status.as_u16(),
            body,
        });
    }

    let body: Value = response.json().await?;
    extract_text(kind, &body).ok_or(ProviderError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: Role::User,
                content: "first question".into(),
            },
            ChatMessage {
                role: Role::Assistant,
                content: "first answer".into(),
            },
            ChatMessage {
                role: Role::User,
                content: "second question".into(),
            },
        ]
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let err = "grok".parse::<ProviderKind>().unwrap_err();
        assert!(matches!(err, ProviderError::Unsupported(name) if name == "grok"));
    }

    #[test]
    fn openai_request_shape() {
        let req = build_request(
            ProviderKind::OpenAi,
            "https://api.openai.com/v1",
            "sk-test",
            "gpt-4o-mini",
            &messages(),
        )
        .unwrap();

        assert_eq!(req.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(
            req.headers,
            vec![("Authorization", "Bearer sk-test".to_string())]
        );
        assert_eq!(req.body["model"], "gpt-4o-mini");
        assert_eq!(req.body["max_completion_tokens"], 4000);
        assert_eq!(req.body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(req.body["messages"][0]["role"], "user");
        assert_eq!(req.body["messages"][0]["content"], "first question");
    }

    #[test]
    fn github_request_uses_openai_shape() {
        let req = build_request(
            ProviderKind::Github,
            "https://models.inference.ai.azure.com",
            "ghp_test",
            "gpt-4o-mini",
            &messages(),
        )
        .unwrap();

        assert_eq!(
            req.url,
            "https://models.inference.ai.azure.com/chat/completions"
        );
        assert_eq!(
            req.headers,
            vec![("Authorization", "Bearer ghp_test".to_string())]
        );
        assert_eq!(req.body["max_completion_tokens"], 4000);
        assert!(req.body.get("max_tokens").is_none());
    }

    #[test]
    fn anthropic_request_shape() {
        let req = build_request(
            ProviderKind::Anthropic,
            "https://api.anthropic.com/v1",
            "sk-ant",
            "claude-3-5-haiku-latest",
            &messages(),
        )
        .unwrap();

        assert_eq!(req.url, "https://api.anthropic.com/v1/chat/completions");
        assert_eq!(
            req.headers,
            vec![
                ("x-api-key", "sk-ant".to_string()),
                ("anthropic-version", "2023-06-01".to_string()),
            ]
        );
        assert_eq!(req.body["max_tokens"], 4000);
        assert!(req.body.get("max_completion_tokens").is_none());
    }

    #[test]
    fn mistral_and_cohere_use_bearer_and_max_tokens() {
        for kind in [ProviderKind::Mistral, ProviderKind::Cohere] {
            let req = build_request(kind, "https://example.test/v1", "key", "m", &messages())
                .unwrap();
            assert_eq!(req.url, "https://example.test/v1/chat/completions");
            assert_eq!(req.headers, vec![("Authorization", "Bearer key".to_string())]);
            assert_eq!(req.body["max_tokens"], 4000);
        }
    }

    #[test]
    fn gemini_request_keys_in_query_and_drops_history() {
        let req = build_request(
            ProviderKind::Gemini,
            "https://generativelanguage.googleapis.com/v1beta",
            "AIza-test",
            "gemini-2.0-flash",
            &messages(),
        )
        .unwrap();

        assert_eq!(
            req.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent?key=AIza-test"
        );
        assert!(req.headers.is_empty());
        let parts = req.body["contents"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        // Only the final message's text goes out.
        assert_eq!(
            req.body["contents"][0]["parts"][0]["text"],
            "second question"
        );
    }

    #[test]
    fn trailing_slash_on_endpoint_is_tolerated() {
        let req = build_request(
            ProviderKind::Mistral,
            "https://api.mistral.ai/v1/",
            "key",
            "m",
            &messages(),
        )
        .unwrap();
        assert_eq!(req.url, "https://api.mistral.ai/v1/chat/completions");
    }

    #[test]
    fn empty_conversation_rejected() {
        let err = build_request(ProviderKind::OpenAi, "https://x", "k", "m", &[]).unwrap_err();
        assert!(matches!(err, ProviderError::EmptyConversation));
    }

    #[test]
    fn extract_openai_text() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        });
        for kind in [
            ProviderKind::OpenAi,
            ProviderKind::Github,
            ProviderKind::Cohere,
            ProviderKind::Mistral,
        ] {
            assert_eq!(extract_text(kind, &body).as_deref(), Some("hello"));
        }
    }

    #[test]
    fn extract_anthropic_text() {
        let body = json!({ "content": [{ "type": "text", "text": "hi there" }] });
        assert_eq!(
            extract_text(ProviderKind::Anthropic, &body).as_deref(),
            Some("hi there")
        );
    }

    #[test]
    fn extract_gemini_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "bonjour" }] } }]
        });
        assert_eq!(
            extract_text(ProviderKind::Gemini, &body).as_deref(),
            Some("bonjour")
        );
    }

    #[test]
    fn missing_field_yields_none() {
        let body = json!({ "choices": [] });
        assert_eq!(extract_text(ProviderKind::OpenAi, &body), None);
        assert_eq!(extract_text(ProviderKind::Gemini, &json!({})), None);
        assert_eq!(
            extract_text(ProviderKind::Anthropic, &json!({ "content": [] })),
            None
        );
    }

    #[test]
    fn non_string_text_yields_none() {
        let body = json!({
            "choices": [{ "message": { "content": 42 } }]
        });
        assert_eq!(extract_text(ProviderKind::OpenAi, &body), None);
    }
}
