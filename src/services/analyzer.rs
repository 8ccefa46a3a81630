//! Report analyzer service
//!
//! Scores report texts and writes motivational or praise notes through an
//! external HTTP service. Every call may fail or the service may be disabled;
//! callers degrade to the manual path.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::utils::errors::{AnalyzerError, AnalyzerResult, ReportBuddyError, Result};

/// Score of a report text, 0 to 10
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub score: u8,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    fn is_enabled(&self) -> bool;

    async fn score(&self, text: &str) -> AnalyzerResult<Analysis>;

    async fn motivate(&self, text: &str) -> AnalyzerResult<String>;

    async fn praise(&self, text: &str) -> AnalyzerResult<String>;
}

#[derive(Debug, Serialize)]
struct AnalyzerRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    text: String,
}

/// Analyzer backed by an HTTP service
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("ReportBuddy-Bot/1.0")
            .build()
            .map_err(ReportBuddyError::Http)?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        text: &str,
    ) -> AnalyzerResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Calling analyzer");

        let mut request = self.client.post(&url).json(&AnalyzerRequest { text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::Timeout
            } else {
                AnalyzerError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Analyzer returned an error status");
            return Err(AnalyzerError::RequestFailed(format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AnalyzerError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn score(&self, text: &str) -> AnalyzerResult<Analysis> {
        let analysis: Analysis = self.post("score", text).await?;
        if analysis.score > 10 {
            return Err(AnalyzerError::InvalidResponse(format!(
                "score {} out of range",
                analysis.score
            )));
        }
        Ok(analysis)
    }

    async fn motivate(&self, text: &str) -> AnalyzerResult<String> {
        self.post::<TextResponse>("motivate", text).await.map(|r| r.text)
    }

    async fn praise(&self, text: &str) -> AnalyzerResult<String> {
        self.post::<TextResponse>("praise", text).await.map(|r| r.text)
    }
}

/// Used when the analyzer is switched off in configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAnalyzer;

#[async_trait]
impl Analyzer for DisabledAnalyzer {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn score(&self, _text: &str) -> AnalyzerResult<Analysis> {
        Err(AnalyzerError::Disabled)
    }

    async fn motivate(&self, _text: &str) -> AnalyzerResult<String> {
        Err(AnalyzerError::Disabled)
    }

    async fn praise(&self, _text: &str) -> AnalyzerResult<String> {
        Err(AnalyzerError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: &str) -> AnalyzerConfig {
        AnalyzerConfig {
            enabled: true,
            url: url.to_string(),
            api_key: Some("secret".to_string()),
            timeout_seconds: 1,
            min_score: 5,
        }
    }

    #[tokio::test]
    async fn test_score_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/score"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(serde_json::json!({ "text": "closed three tickets" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "score": 7,
                "recommendations": ["Mention blockers"]
            })))
            .mount(&server)
            .await;

        let analyzer = HttpAnalyzer::new(&config(&server.uri())).unwrap();
        let analysis = analyzer.score("closed three tickets").await.unwrap();
        assert_eq!(analysis.score, 7);
        assert_eq!(analysis.recommendations, vec!["Mention blockers".to_string()]);
    }

    #[tokio::test]
    async fn test_error_status_is_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/praise"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let analyzer = HttpAnalyzer::new(&config(&server.uri())).unwrap();
        assert_matches!(analyzer.praise("done").await, Err(AnalyzerError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/motivate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "text": "go" }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let analyzer = HttpAnalyzer::new(&config(&server.uri())).unwrap();
        assert_matches!(analyzer.motivate("plan").await, Err(AnalyzerError::Timeout));
    }

    #[tokio::test]
    async fn test_out_of_range_score_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/score"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "score": 42 })),
            )
            .mount(&server)
            .await;

        let analyzer = HttpAnalyzer::new(&config(&server.uri())).unwrap();
        assert_matches!(analyzer.score("x").await, Err(AnalyzerError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_disabled_analyzer() {
        let analyzer = DisabledAnalyzer;
        assert!(!analyzer.is_enabled());
        assert_matches!(analyzer.score("x").await, Err(AnalyzerError::Disabled));
    }
}
