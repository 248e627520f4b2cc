//! HTTP classifier client.
//!
//! Sends `{"text": "..."}` to a classifier endpoint (for example a hosted
//! FinBERT model) and maps the top label to a signed score. Accepted
//! response shapes:
//! - `{"label": "positive", "score": 0.93}`
//! - `[{"label": "positive", "score": 0.93}]` (first entry is used)

use crate::error::{ScorerError, ScorerResult};
use crate::scorer::{label_to_score, truncate_chars, BoxFuture, SentimentScorer};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default timeout for classifier requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Single(LabelScore),
    Batch(Vec<LabelScore>),
}

impl ClassifyResponse {
    fn top(self) -> ScorerResult<LabelScore> {
        match self {
            Self::Single(entry) => Ok(entry),
            Self::Batch(entries) => entries.into_iter().next().ok_or_else(|| {
                ScorerError::InvalidResponse("empty classifier response".to_string())
            }),
        }
    }
}

/// Remote sentiment classifier.
pub struct HttpScorer {
    client: Client,
    url: String,
    max_chars: usize,
}

impl HttpScorer {
    /// Create a client for the classifier at `url`.
    pub fn new(
        url: impl Into<String>,
        timeout: Option<Duration>,
        max_chars: usize,
    ) -> ScorerResult<Self> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| ScorerError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            max_chars,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn classify(&self, text: &str) -> ScorerResult<f64> {
        let request = ClassifyRequest {
            text: truncate_chars(text, self.max_chars),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScorerError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScorerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ScorerError::InvalidResponse(format!("Failed to parse response: {e}")))?;
        let top = body.top()?;
        debug!(label = %top.label, score = top.score, "Classifier response");

        label_to_score(&top.label, top.score)
    }
}

impl SentimentScorer for HttpScorer {
    fn score<'a>(&'a self, text: &'a str) -> BoxFuture<'a, ScorerResult<f64>> {
        Box::pin(self.classify(text))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
