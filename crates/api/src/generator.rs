//! Client for the external layout generator.
//!
//! [`LayoutGenerator`] returns the model's raw text for one
//! [`GenerationAction`]. Repairing that text into markup is done by
//! [`generate_markup`] and [`recommend`], so every implementation gets the
//! same leniency.

use std::time::Duration;

use async_trait::async_trait;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::generation::{
    repair_markup, repair_recommendations, GeneratedMarkup, GenerationAction,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;

#[async_trait]
pub trait LayoutGenerator: Send + Sync {
    /// Run one action and return the raw model output.
    ///
    /// Transport failures, non-success statuses and empty responses are all
    /// reported as `CoreError::DependencyFailure`.
    async fn complete(&self, action: &GenerationAction) -> Result<String, CoreError>;
}

/// Validate `action`, run it, and repair the output into layout markup.
pub async fn generate_markup(
    generator: &dyn LayoutGenerator,
    action: &GenerationAction,
) -> Result<GeneratedMarkup, CoreError> {
    action.validate()?;
    let raw = generator.complete(action).await?;
    repair_markup(&raw)
}

/// Validate `action`, run it, and repair the output into recommendations.
pub async fn recommend(
    generator: &dyn LayoutGenerator,
    action: &GenerationAction,
) -> Result<Vec<String>, CoreError> {
    action.validate()?;
    let raw = generator.complete(action).await?;
    repair_recommendations(&raw)
}

// ---------------------------------------------------------------------------
// Chat-completions client
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String, CoreError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| CoreError::DependencyFailure("Generator returned no content".into()))
    }
}

/// Generator speaking an OpenAI-style chat-completions API.
pub struct HttpLayoutGenerator {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpLayoutGenerator {
    pub fn new(
        api_url: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }
}

fn dependency(context: &str, err: impl std::fmt::Display) -> CoreError {
    CoreError::DependencyFailure(format!("{context}: {err}"))
}

#[async_trait]
impl LayoutGenerator for HttpLayoutGenerator {
    async fn complete(&self, action: &GenerationAction) -> Result<String, CoreError> {
        let user_prompt = action.user_prompt();
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: action.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| dependency("Generator request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::DependencyFailure(format!(
                "Generator responded with {status}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| dependency("Generator response was not valid JSON", e))?;

        tracing::debug!(action = action.kind(), model = %self.model, "Generator call completed");
        parsed.into_content()
    }
}

/// Generator used when no API is configured. Every call fails, so
/// generation endpoints persist the placeholder layout.
pub struct OfflineGenerator;

#[async_trait]
impl LayoutGenerator for OfflineGenerator {
    async fn complete(&self, action: &GenerationAction) -> Result<String, CoreError> {
        Err(CoreError::DependencyFailure(format!(
            "No generator configured for '{}'",
            action.kind()
        )))
    }
}

/// Build the generator described by `config`.
pub fn from_config(config: &GeneratorConfig) -> Result<Box<dyn LayoutGenerator>, reqwest::Error> {
    match (&config.api_url, &config.api_key) {
        (Some(url), Some(key)) => Ok(Box::new(HttpLayoutGenerator::new(
            url.clone(),
            key.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        _ => Ok(Box::new(OfflineGenerator)),
    }
}
