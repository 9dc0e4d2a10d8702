//! Pure transformations for the session-pool API.
//!
//! The pool management endpoint is consumed as an opaque external service;
//! everything here just shapes strings for it: request URLs, the render
//! command, and the interpretation of its execution payload.

use regex::Regex;
use serde::Deserialize;

/// Build a session-pool request URL for `path`, scoped to a session.
///
/// The pool endpoint may or may not carry a trailing slash or an existing
/// query string; the session identifier is percent-encoded into the
/// `identifier` query parameter either way.
pub fn build_session_url(endpoint: &str, path: &str, session_id: &str) -> String {
    let mut base = endpoint.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    let separator = if base.contains('?') { '&' } else { '?' };
    let encoded = urlencoding::encode(session_id);

    format!("{base}{path}{separator}identifier={encoded}")
}

/// Render the manim invocation for a scene, high quality, explicit output
/// filename.
pub fn render_command(scene: &str) -> String {
    format!("manim -qh {scene}.py {scene} -o {scene}.mp4")
}

/// The file content uploaded to the pool: the module filename on the first
/// line, the source below it.
pub fn upload_payload(scene: &str, code: &str) -> String {
    format!("{scene}.py\n{code}")
}

/// Execution payload returned by the pool's generate endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionResponse {
    pub status: Option<String>,
    pub output: Option<String>,
    pub message: Option<String>,
}

/// Interpret an execution payload: the render output on success, the pool's
/// error message otherwise. Errors in the generated code are not parsed —
/// the message propagates opaquely.
pub fn classify_execution(response: &ExecutionResponse) -> Result<String, String> {
    if response.status.as_deref() == Some("success") {
        Ok(response.output.clone().unwrap_or_default())
    } else {
        Err(response
            .message
            .clone()
            .unwrap_or_else(|| "execution failed without a message".to_string()))
    }
}

/// Scan execution output for the rendered video path.
///
/// The pool renders under `/mnt/data`; any absolute `.mp4` path in the
/// output is taken as the artifact.
pub fn find_artifact_path(output: &str) -> Option<String> {
    let pattern = Regex::new(r"(/[\w./\- ]*?\.mp4)").unwrap();
    pattern
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Normalize a model-provided remote path: models tend to quote it.
pub fn clean_remote_path(path: &str) -> String {
    path.trim().replace(['\'', '"', '`'], "")
}
