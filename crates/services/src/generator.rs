use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use recall_core::model::Flashcard;

use crate::error::GenerateError;

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub endpoint: Url,
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Applied when `RECALL_GENERATE_TIMEOUT_SECS` is unset. A hung endpoint
    /// must not hang the caller indefinitely.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn from_env() -> Option<Self> {
        let raw = env::var("RECALL_GENERATE_URL").ok()?;
        let endpoint = Url::parse(raw.trim()).ok()?;
        let timeout = env::var("RECALL_GENERATE_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or(Self::DEFAULT_TIMEOUT, Duration::from_secs);
        Some(Self { endpoint, timeout })
    }
}

/// Client for the card-generation endpoint.
#[derive(Clone)]
pub struct GeneratorService {
    client: Client,
    config: Option<GeneratorConfig>,
}

impl GeneratorService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(GeneratorConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<GeneratorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Generate flashcards from the given source text.
    ///
    /// The trimmed text is posted as `{"text": ...}`; the endpoint answers
    /// with a `flashcards` array of front/back pairs. A successful response
    /// without that shape yields an empty list rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::EmptyText` for blank input (checked before any
    /// network traffic), `Disabled` when no endpoint is configured, `Status`
    /// on a non-success response, and `Http` on transport failures or
    /// timeout.
    pub async fn generate(&self, source_text: &str) -> Result<Vec<Flashcard>, GenerateError> {
        let text = source_text.trim();
        if text.is_empty() {
            return Err(GenerateError::EmptyText);
        }
        let config = self.config.as_ref().ok_or(GenerateError::Disabled)?;

        let response = self
            .client
            .post(config.endpoint.clone())
            .timeout(config.timeout)
            .json(&GenerateRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "generation request failed");
            return Err(GenerateError::Status(status));
        }

        let body = response.text().await?;
        let cards = normalize_response(&body);
        tracing::debug!(cards = cards.len(), "generation request completed");
        Ok(cards)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireCard {
    front: String,
    back: String,
}

/// Extracts cards from a successful response body.
///
/// Anything that is not a JSON object carrying a `flashcards` array degrades
/// to "no cards"; array elements that do not fit the front/back shape are
/// skipped. Order is preserved.
fn normalize_response(body: &str) -> Vec<Flashcard> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        tracing::warn!("generation response was not JSON; treating as no cards");
        return Vec::new();
    };
    let Some(items) = value.get("flashcards").and_then(Value::as_array) else {
        tracing::warn!("generation response had no flashcards array; treating as no cards");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<WireCard>(item.clone()).ok())
        .map(|card| Flashcard::new(card.front, card.back))
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
