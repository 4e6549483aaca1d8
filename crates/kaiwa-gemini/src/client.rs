// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` API.
//!
//! Credentials are tried in shuffled order: each 4xx/5xx response is
//! recorded as a [`CredentialFailure`] and the next key is tried, so a
//! quota-exhausted key degrades to a retry instead of a hard failure.
//! Transport-level errors abort immediately; they affect every key alike.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use kaiwa_config::model::GeminiConfig;
use kaiwa_core::{
    CredentialFailure, FinishReason, Generation, GenerationProvider, KaiwaError, Turn,
};

use crate::types::{GenerateContentRequest, GenerateContentResponse, safety_settings};

/// Gemini generation client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    default_model: String,
    api_keys: Vec<String>,
}

impl GeminiClient {
    /// Build a client from configuration. At least one API key is required.
    pub fn new(config: &GeminiConfig) -> Result<Self, KaiwaError> {
        if config.api_keys.is_empty() {
            return Err(KaiwaError::Config(
                "gemini.api_keys must not be empty".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| KaiwaError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            default_model: config.model.clone(),
            api_keys: config.api_keys.clone(),
        })
    }

    /// The model used when a request carries no override.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Trailing characters of a key, enough to identify it in logs without
/// disclosing it.
fn key_hint(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(5)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{tail}")
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn generate(
        &self,
        turns: &[Turn],
        model: Option<&str>,
    ) -> Result<Generation, KaiwaError> {
        let model = model.unwrap_or(&self.default_model);
        let url = self.endpoint.replace("{model}", model);
        let request = GenerateContentRequest {
            contents: turns,
            safety_settings: safety_settings(),
        };

        let mut keys = self.api_keys.clone();
        keys.shuffle(&mut rand::thread_rng());

        let mut failures = Vec::new();
        for key in &keys {
            let response = self
                .client
                .post(&url)
                .query(&[("key", key.as_str())])
                .json(&request)
                .send()
                .await
                .map_err(|e| KaiwaError::Provider {
                    message: format!("gemini request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            if status.is_client_error() || status.is_server_error() {
                let body = response
                    .json::<serde_json::Value>()
                    .await
                    .unwrap_or(serde_json::Value::Null);
                warn!(status = status.as_u16(), key = %key_hint(key), "credential attempt failed");
                failures.push(CredentialFailure {
                    key_hint: key_hint(key),
                    status: status.as_u16(),
                    body,
                });
                continue;
            }

            let parsed: GenerateContentResponse =
                response.json().await.map_err(|e| KaiwaError::Provider {
                    message: format!("malformed gemini response: {e}"),
                    source: Some(Box::new(e)),
                })?;
            let candidate =
                parsed
                    .candidates
                    .into_iter()
                    .next()
                    .ok_or_else(|| KaiwaError::Provider {
                        message: "gemini response carried no candidates".into(),
                        source: None,
                    })?;

            let finish_reason =
                FinishReason::from_wire(candidate.finish_reason.as_deref().unwrap_or("STOP"));
            debug!(model, finish = %finish_reason, "generation complete");
            return Ok(Generation {
                turn: candidate.content,
                finish_reason,
            });
        }

        Err(KaiwaError::Generation { failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use kaiwa_core::Role;

    fn config_for(server: &MockServer, keys: Vec<String>) -> GeminiConfig {
        GeminiConfig {
            api_keys: keys,
            model: "gemini-test".to_string(),
            endpoint: format!("{}/models/{{model}}:generateContent", server.uri()),
        }
    }

    fn reply_body(text: &str, finish: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": finish
            }]
        })
    }

    #[test]
    fn construction_requires_a_key() {
        let config = GeminiConfig {
            api_keys: vec![],
            ..GeminiConfig::default()
        };
        assert!(matches!(GeminiClient::new(&config), Err(KaiwaError::Config(_))));
    }

    #[test]
    fn key_hint_never_discloses_the_key() {
        assert_eq!(key_hint("super-secret-key-12345"), "...12345");
        assert_eq!(key_hint("abc"), "...abc");
    }

    #[tokio::test]
    async fn successful_generation_returns_model_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(query_param("key", "k1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("hello", "STOP")))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server, vec!["k1".into()])).unwrap();
        let turns = vec![Turn::text(Role::User, "hi")];
        let generation = client.generate(&turns, None).await.unwrap();

        assert_eq!(generation.turn.role, Role::Model);
        assert_eq!(generation.turn.joined_text(), "hello");
        assert!(generation.finish_reason.is_stop());
    }

    #[tokio::test]
    async fn model_override_lands_in_the_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/custom-model:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("ok", "STOP")))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server, vec!["k1".into()])).unwrap();
        let turns = vec![Turn::text(Role::User, "hi")];
        let generation = client.generate(&turns, Some("custom-model")).await.unwrap();
        assert_eq!(generation.turn.joined_text(), "ok");
    }

    #[tokio::test]
    async fn failing_credential_rotates_to_the_next() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "bad"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"error": "quota"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(query_param("key", "good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("saved", "STOP")))
            .mount(&server)
            .await;

        let client =
            GeminiClient::new(&config_for(&server, vec!["bad".into(), "good".into()])).unwrap();
        let turns = vec![Turn::text(Role::User, "hi")];
        let generation = client.generate(&turns, None).await.unwrap();
        assert_eq!(generation.turn.joined_text(), "saved");
    }

    #[tokio::test]
    async fn exhausting_all_credentials_reports_each_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"error": "denied"})),
            )
            .mount(&server)
            .await;

        let client =
            GeminiClient::new(&config_for(&server, vec!["k1".into(), "k2".into()])).unwrap();
        let turns = vec![Turn::text(Role::User, "hi")];
        match client.generate(&turns, None).await {
            Err(KaiwaError::Generation { failures }) => {
                assert_eq!(failures.len(), 2);
                assert!(failures.iter().all(|f| f.status == 403));
                assert!(failures.iter().all(|f| f.body["error"] == "denied"));
            }
            other => panic!("expected credential exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_stop_finish_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(reply_body("cut", "MAX_TOKENS")),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config_for(&server, vec!["k1".into()])).unwrap();
        let turns = vec![Turn::text(Role::User, "hi")];
        let generation = client.generate(&turns, None).await.unwrap();
        assert_eq!(
            generation.finish_reason,
            FinishReason::Other("MAX_TOKENS".to_string())
        );
    }
}
