// SPDX-FileCopyrightText: 2026 Kaiwa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Kaiwa session backend.

use std::time::Duration;

use thiserror::Error;

use crate::provider::CredentialFailure;

/// The primary error type used across all Kaiwa crates.
#[derive(Debug, Error)]
pub enum KaiwaError {
    /// A history record or persisted entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed persisted data (non-integer state keys, bad base64, bad JSON
    /// in an imported document).
    #[error("format error: {0}")]
    Format(String),

    /// An imported history document failed structural validation.
    ///
    /// Reasons are ordered innermost cause first, ready for display.
    #[error("invalid history document: {}", reasons.join(" / "))]
    Validation { reasons: Vec<String> },

    /// A conversation name is not `\w+` and not the `<main>` alias.
    #[error("invalid conversation name: {0:?}")]
    InvalidName(String),

    /// The cooldown limiter rejected the request.
    #[error("rate limited, retry in {:.1}s", remaining.as_secs_f64())]
    RateLimited { remaining: Duration },

    /// Every generation credential was tried and failed.
    #[error("generation failed: all {} credentials exhausted", failures.len())]
    Generation { failures: Vec<CredentialFailure> },

    /// Generation completed, but not with a clean stop reason.
    #[error("generation finished with reason {reason}")]
    NonStopFinish { reason: String },

    /// Provider transport errors (connection failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage backend errors (file I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),
}

impl KaiwaError {
    /// Wrap an I/O or serialization error as a storage error.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        KaiwaError::Storage {
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_reasons_join_innermost_first() {
        let err = KaiwaError::Validation {
            reasons: vec![
                "invalid value present in inline_data".into(),
                "invalid inline_data".into(),
                "invalid part format".into(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "invalid history document: invalid value present in inline_data \
             / invalid inline_data / invalid part format"
        );
    }

    #[test]
    fn rate_limited_reports_remaining_seconds() {
        let err = KaiwaError::RateLimited {
            remaining: Duration::from_millis(2500),
        };
        assert_eq!(err.to_string(), "rate limited, retry in 2.5s");
    }

    #[test]
    fn storage_wraps_io_error() {
        let err = KaiwaError::storage(std::io::Error::other("disk gone"));
        assert!(err.to_string().contains("disk gone"));
    }
}
