//! Advice generation boundary. External generative-AI services live
//! behind `AdviceGenerator` with an explicit timeout and a static
//! fallback, so their availability can never affect the prediction or
//! history paths.

use crate::config::AdviceConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// What the caller knows about the user when asking for advice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdviceContext {
    pub question: String,

    /// Latest predicted risk, when available
    #[serde(default)]
    pub risk_percent: Option<f64>,

    /// Mean blood sugar from the tracker, when available
    #[serde(default)]
    pub mean_glucose_mg_dl: Option<f64>,
}

#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    async fn generate(&self, context: &AdviceContext) -> Result<String>;
}

/// Deterministic canned guidance used when no external generator is
/// configured or the configured one fails
pub struct StaticAdviceGenerator;

#[async_trait]
impl AdviceGenerator for StaticAdviceGenerator {
    async fn generate(&self, context: &AdviceContext) -> Result<String> {
        let mut advice = String::from(
            "General guidance: favour whole grains, vegetables and lean protein; \
             keep regular meal times; aim for at least 150 minutes of moderate \
             activity per week; and discuss any concerns with your doctor.",
        );

        if let Some(risk) = context.risk_percent {
            if risk >= 50.0 {
                advice.push_str(
                    " Your last predicted risk was elevated - please consider \
                     scheduling a screening appointment.",
                );
            } else {
                advice.push_str(" Your last predicted risk was low - keep up your current habits.");
            }
        }

        if let Some(mean) = context.mean_glucose_mg_dl {
            if mean > 180.0 {
                advice.push_str(
                    " Your average logged blood sugar is above the target range; \
                     reviewing your readings with a clinician is recommended.",
                );
            }
        }

        Ok(advice)
    }
}

#[derive(Debug, Serialize)]
struct AdviceRequestPayload<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct AdviceResponsePayload {
    text: String,
}

/// Generator backed by an external HTTP endpoint
pub struct HttpAdviceGenerator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAdviceGenerator {
    pub fn new(endpoint: String, timeout_secs: u64, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn build_prompt(context: &AdviceContext) -> String {
        let mut prompt = format!(
            "You are a diabetes health assistant. Answer briefly and practically.\n\
             Question: {}",
            context.question
        );
        if let Some(risk) = context.risk_percent {
            prompt.push_str(&format!("\nLatest predicted diabetes risk: {:.2}%", risk));
        }
        if let Some(mean) = context.mean_glucose_mg_dl {
            prompt.push_str(&format!("\nAverage logged blood sugar: {:.0} mg/dL", mean));
        }
        prompt
    }
}

#[async_trait]
impl AdviceGenerator for HttpAdviceGenerator {
    async fn generate(&self, context: &AdviceContext) -> Result<String> {
        let prompt = Self::build_prompt(context);

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&AdviceRequestPayload { prompt: &prompt });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout("advice request timed out".to_string())
            } else {
                AppError::Integration {
                    integration_source: "advice".to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(AppError::Integration {
                integration_source: "advice".to_string(),
                message: format!("endpoint returned {}", response.status()),
            });
        }

        let payload: AdviceResponsePayload =
            response.json().await.map_err(|e| AppError::Integration {
                integration_source: "advice".to_string(),
                message: format!("invalid response body: {}", e),
            })?;

        Ok(payload.text)
    }
}

/// Tries the primary generator and degrades to static guidance on any
/// failure, so advice requests always answer.
pub struct FallbackAdviceGenerator {
    primary: Option<Arc<dyn AdviceGenerator>>,
    fallback: StaticAdviceGenerator,
}

impl FallbackAdviceGenerator {
    pub fn new(primary: Option<Arc<dyn AdviceGenerator>>) -> Self {
        Self {
            primary,
            fallback: StaticAdviceGenerator,
        }
    }
}

#[async_trait]
impl AdviceGenerator for FallbackAdviceGenerator {
    async fn generate(&self, context: &AdviceContext) -> Result<String> {
        if let Some(ref primary) = self.primary {
            match primary.generate(context).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(error = %e, "Advice generator failed, using static fallback");
                }
            }
        }
        self.fallback.generate(context).await
    }
}

/// Build the advice generator from configuration
pub fn create_advice_generator(config: &AdviceConfig) -> Arc<dyn AdviceGenerator> {
    let primary: Option<Arc<dyn AdviceGenerator>> = if config.enabled {
        match config.endpoint {
            Some(ref endpoint) => {
                let api_key = config
                    .api_key_env
                    .as_ref()
                    .and_then(|name| std::env::var(name).ok());
                match HttpAdviceGenerator::new(endpoint.clone(), config.timeout_secs, api_key) {
                    Ok(generator) => Some(Arc::new(generator)),
                    Err(e) => {
                        warn!(error = %e, "Advice endpoint misconfigured, using static fallback");
                        None
                    }
                }
            }
            None => {
                warn!("Advice enabled but no endpoint configured, using static fallback");
                None
            }
        }
    } else {
        None
    };

    Arc::new(FallbackAdviceGenerator::new(primary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(question: &str) -> AdviceContext {
        AdviceContext {
            question: question.to_string(),
            risk_percent: None,
            mean_glucose_mg_dl: None,
        }
    }

    #[tokio::test]
    async fn test_static_generator_mentions_elevated_risk() {
        let generator = StaticAdviceGenerator;
        let ctx = AdviceContext {
            risk_percent: Some(73.89),
            ..context("What should I eat?")
        };
        let advice = generator.generate(&ctx).await.unwrap();
        assert!(advice.contains("elevated"));
    }

    #[tokio::test]
    async fn test_http_generator_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/generate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"text": "Eat more fibre."}"#)
            .create_async()
            .await;

        let generator =
            HttpAdviceGenerator::new(format!("{}/generate", server.url()), 5, None).unwrap();
        let advice = generator.generate(&context("diet?")).await.unwrap();
        assert_eq!(advice, "Eat more fibre.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_generator_maps_server_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate")
            .with_status(500)
            .create_async()
            .await;

        let generator =
            HttpAdviceGenerator::new(format!("{}/generate", server.url()), 5, None).unwrap();
        let err = generator.generate(&context("diet?")).await.unwrap_err();
        assert_eq!(err.error_code(), "INTEGRATION_ERROR");
    }

    #[tokio::test]
    async fn test_fallback_kicks_in_when_primary_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate")
            .with_status(503)
            .create_async()
            .await;

        let primary: Arc<dyn AdviceGenerator> = Arc::new(
            HttpAdviceGenerator::new(format!("{}/generate", server.url()), 5, None).unwrap(),
        );
        let generator = FallbackAdviceGenerator::new(Some(primary));

        // Never errors: the static text answers instead
        let advice = generator.generate(&context("diet?")).await.unwrap();
        assert!(advice.contains("General guidance"));
    }

    #[tokio::test]
    async fn test_fallback_without_primary_uses_static_text() {
        let generator = FallbackAdviceGenerator::new(None);
        let advice = generator.generate(&context("diet?")).await.unwrap();
        assert!(advice.contains("General guidance"));
    }
}
