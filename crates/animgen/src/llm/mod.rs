//! Prompt Dispatcher: the Azure OpenAI chat-completions client.
//!
//! One POST per prompt, no streaming, no retries. The endpoint is consumed
//! as an opaque external service; only the deployment URL and the `api-key`
//! header are ours to build.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::pipeline::ModelBackend;
use crate::prelude::*;

const API_VERSION: &str = "2024-12-01-preview";

/// Model configuration from environment variables
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Azure resource name, the `{resource}` in `{resource}.openai.azure.com`.
    pub resource: String,
    /// Deployment name of the chat model.
    pub deployment: String,
    pub api_key: String,
}

impl ModelConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            resource: std::env::var("AZURE_OPENAI_RESOURCE")
                .map_err(|_| eyre!("AZURE_OPENAI_RESOURCE environment variable not set"))?,
            deployment: std::env::var("AZURE_OPENAI_DEPLOYMENT")
                .map_err(|_| eyre!("AZURE_OPENAI_DEPLOYMENT environment variable not set"))?,
            api_key: std::env::var("AZURE_OPENAI_API_KEY")
                .map_err(|_| eyre!("AZURE_OPENAI_API_KEY environment variable not set"))?,
        })
    }

    /// Chat-completions URL for this resource and deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "https://{}.openai.azure.com/openai/deployments/{}/chat/completions?api-version={}",
            self.resource, self.deployment, API_VERSION
        )
    }
}

/// HTTP client for the hosted model.
pub struct ModelClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl ModelClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl ModelBackend for ModelClient {
    async fn complete(&self, prompt: &str) -> Result<String, Error> {
        let request = ChatCompletionRequest {
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: 1.0,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Model(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Model(format!("HTTP {status}: {body}")));
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Model(format!("invalid response body: {e}")))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::Model("empty model response".to_string()))
    }
}

// Chat-completions wire types. Only the fields this application reads.

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}
