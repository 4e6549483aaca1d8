// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the Gemini `generateContent` endpoint.

use serde::{Deserialize, Serialize};

use kaiwa_core::Turn;

/// One safety category override.
#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

/// The permissive safety block sent with every request.
pub fn safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: "BLOCK_NONE",
    })
    .collect()
}

/// Request body: history plus safety settings.
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest<'a> {
    pub contents: &'a [Turn],
    #[serde(rename = "safetySettings")]
    pub safety_settings: Vec<SafetySetting>,
}

/// Response body; only the fields the session layer consumes.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One completion candidate.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    /// The model's reply, in the shared turn format.
    pub content: Turn,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}
