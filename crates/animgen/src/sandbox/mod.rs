//! Execution Relay and Artifact Fetcher: the session-pool client.
//!
//! Three bearer-authenticated calls against the pool management endpoint:
//! upload the generated file, trigger the render, download the video.
//! Errors in the generated code are not parsed here — the pool's message
//! propagates opaquely as an execution failure.

use animgen_core::session::{
    build_session_url, classify_execution, render_command, upload_payload, ExecutionResponse,
};

use crate::error::Error;
use crate::pipeline::SandboxBackend;
use crate::prelude::*;

/// Session-pool configuration from environment variables
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Management endpoint of the session pool.
    pub pool_url: String,
    /// Bearer credential for the pool. Obtaining it (e.g. through a cloud
    /// credential chain) is outside this tool; any token that the pool
    /// accepts works.
    pub token: String,
}

impl SandboxConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            pool_url: std::env::var("SESSION_POOL_URL")
                .map_err(|_| eyre!("SESSION_POOL_URL environment variable not set"))?,
            token: std::env::var("SESSION_POOL_TOKEN")
                .map_err(|_| eyre!("SESSION_POOL_TOKEN environment variable not set"))?,
        })
    }
}

/// HTTP client for the session pool.
pub struct SandboxClient {
    client: reqwest::Client,
    config: SandboxConfig,
}

impl SandboxClient {
    pub fn new(config: SandboxConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    fn url(&self, path: &str, session_id: &str) -> String {
        build_session_url(&self.config.pool_url, path, session_id)
    }
}

impl SandboxBackend for SandboxClient {
    async fn upload(&self, session_id: &str, scene: &str, code: &str) -> Result<(), Error> {
        let response = self
            .client
            .post(self.url("manim/create", session_id))
            .bearer_auth(&self.config.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(upload_payload(scene, code))
            .send()
            .await
            .map_err(|e| Error::Execution(format!("upload request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Execution(format!("upload failed: HTTP {status}: {body}")));
        }

        Ok(())
    }

    async fn execute(&self, session_id: &str, scene: &str) -> Result<String, Error> {
        let body = serde_json::json!({ "command": render_command(scene) });

        let response = self
            .client
            .post(self.url("manim/generate", session_id))
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Execution(format!("render request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Execution(format!("render failed: HTTP {status}: {text}")));
        }

        let payload: ExecutionResponse = response
            .json()
            .await
            .map_err(|e| Error::Execution(format!("invalid render response: {e}")))?;

        classify_execution(&payload).map_err(Error::Execution)
    }

    async fn download(&self, session_id: &str, remote_path: &str) -> Result<Vec<u8>, Error> {
        let body = serde_json::json!({ "videofile": remote_path });

        let response = self
            .client
            .post(self.url("manim/get_video", session_id))
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Artifact(format!("download request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Artifact(format!(
                "download of {remote_path} failed: HTTP {status}: {text}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Artifact(format!("download of {remote_path} failed: {e}")))?;

        Ok(bytes.to_vec())
    }
}
