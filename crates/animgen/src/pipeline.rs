//! The generation pipeline: one strictly linear pass per chat turn.
//!
//! Prompt Dispatcher -> Execution Relay -> Artifact Fetcher. No retries, no
//! caching, no state shared between turns; every turn gets a fresh session
//! identifier and a fresh [`Turn`].

use std::path::{Path, PathBuf};

use animgen_core::codegen::{
    build_generation_prompt, build_path_prompt, extract_code_blocks, sanitize_code, scene_name,
};
use animgen_core::session::{clean_remote_path, find_artifact_path};

use crate::error::Error;

/// Backend that turns a prompt into model text.
#[allow(async_fn_in_trait)]
pub trait ModelBackend {
    async fn complete(&self, prompt: &str) -> Result<String, Error>;
}

/// Backend that runs generated code in a remote session and serves the
/// files it produces.
#[allow(async_fn_in_trait)]
pub trait SandboxBackend {
    /// Upload `code` as `{scene}.py` into the session.
    async fn upload(&self, session_id: &str, scene: &str, code: &str) -> Result<(), Error>;

    /// Render the scene and return the raw execution output.
    async fn execute(&self, session_id: &str, scene: &str) -> Result<String, Error>;

    /// Download a file from the session.
    async fn download(&self, session_id: &str, remote_path: &str) -> Result<Vec<u8>, Error>;
}

/// State of a single chat turn. Fields are populated strictly in order and
/// the whole value is discarded once the turn ends.
#[derive(Debug, Clone)]
pub struct Turn {
    /// Fresh random identifier, also the name of the pool session.
    pub session_id: String,
    pub user_prompt: String,
    pub generated_code: Option<String>,
    pub scene_name: Option<String>,
    /// Local path of the downloaded video.
    pub artifact_path: Option<PathBuf>,
}

impl Turn {
    fn new(user_prompt: &str) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_prompt: user_prompt.to_string(),
            generated_code: None,
            scene_name: None,
            artifact_path: None,
        }
    }
}

/// Run one turn end to end and write the rendered video into `out_dir` as
/// `{session_id}.mp4`.
pub async fn run_turn<M, S>(
    model: &M,
    sandbox: &S,
    question: &str,
    out_dir: &Path,
) -> Result<Turn, Error>
where
    M: ModelBackend,
    S: SandboxBackend,
{
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::InvalidRequest("empty question".to_string()));
    }

    let mut turn = Turn::new(question);

    // Prompt Dispatcher
    let response = model.complete(&build_generation_prompt(question)).await?;
    let block = extract_code_blocks(&response)
        .into_iter()
        .next()
        .ok_or_else(|| Error::Execution("model response contains no code block".to_string()))?;
    let code = sanitize_code(&block.code);
    let scene = scene_name(&code)
        .ok_or_else(|| Error::Execution("no class name found in the generated code".to_string()))?;
    turn.generated_code = Some(code.clone());
    turn.scene_name = Some(scene.clone());

    // Execution Relay
    sandbox.upload(&turn.session_id, &scene, &code).await?;
    let output = sandbox.execute(&turn.session_id, &scene).await?;

    // Artifact Fetcher. The render output usually names the video path; when
    // it does not, the model is asked to name it, as the original tooling did.
    let remote_path = match find_artifact_path(&output) {
        Some(path) => path,
        None => {
            let answer = model
                .complete(&build_path_prompt(&output))
                .await
                .map_err(|e| Error::Artifact(e.to_string()))?;
            let cleaned = clean_remote_path(&answer);
            if cleaned.is_empty() {
                return Err(Error::Artifact(
                    "could not resolve the rendered video path".to_string(),
                ));
            }
            cleaned
        }
    };

    let bytes = sandbox.download(&turn.session_id, &remote_path).await?;
    if bytes.is_empty() {
        return Err(Error::Artifact(format!(
            "downloaded file is empty: {remote_path}"
        )));
    }

    let local_path = out_dir.join(format!("{}.mp4", turn.session_id));
    tokio::fs::write(&local_path, &bytes)
        .await
        .map_err(|e| Error::Artifact(format!("failed to write {}: {e}", local_path.display())))?;

    turn.artifact_path = Some(local_path);
    Ok(turn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const SCENE_RESPONSE: &str = "Sure!\n```python\nfrom manim import *\n\nclass Square(Scene):\n    def construct(self):\n        pass\n```";

    struct FakeModel {
        script: Mutex<VecDeque<Result<String, Error>>>,
        calls: Mutex<usize>,
    }

    impl FakeModel {
        fn new(script: Vec<Result<String, Error>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ModelBackend for FakeModel {
        async fn complete(&self, _prompt: &str) -> Result<String, Error> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Model("script exhausted".to_string())))
        }
    }

    struct FakeSandbox {
        calls: Mutex<Vec<String>>,
        execute_result: Result<String, Error>,
    }

    impl FakeSandbox {
        fn new(execute_result: Result<String, Error>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                execute_result,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SandboxBackend for FakeSandbox {
        async fn upload(&self, _session_id: &str, _scene: &str, _code: &str) -> Result<(), Error> {
            self.calls.lock().unwrap().push("upload".to_string());
            Ok(())
        }

        async fn execute(&self, _session_id: &str, _scene: &str) -> Result<String, Error> {
            self.calls.lock().unwrap().push("execute".to_string());
            match &self.execute_result {
                Ok(output) => Ok(output.clone()),
                Err(Error::Execution(msg)) => Err(Error::Execution(msg.clone())),
                Err(_) => unreachable!("fakes only script execution errors"),
            }
        }

        async fn download(&self, _session_id: &str, _remote_path: &str) -> Result<Vec<u8>, Error> {
            self.calls.lock().unwrap().push("download".to_string());
            Ok(b"not really mp4 bytes".to_vec())
        }
    }

    #[tokio::test]
    async fn test_happy_path_writes_video() {
        let model = FakeModel::new(vec![Ok(SCENE_RESPONSE.to_string())]);
        let sandbox = FakeSandbox::new(Ok("Rendered /mnt/data/media/Square.mp4".to_string()));
        let dir = tempfile::tempdir().unwrap();

        let turn = run_turn(&model, &sandbox, "explain squares", dir.path())
            .await
            .unwrap();

        let path = turn.artifact_path.unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        assert_eq!(turn.scene_name.as_deref(), Some("Square"));
        assert_eq!(sandbox.calls(), vec!["upload", "execute", "download"]);
        // The artifact path was found in the output, no second model call.
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_model_failure_stops_before_sandbox() {
        let model = FakeModel::new(vec![Err(Error::Model("401".to_string()))]);
        let sandbox = FakeSandbox::new(Ok(String::new()));
        let dir = tempfile::tempdir().unwrap();

        let err = run_turn(&model, &sandbox, "anything", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Model(_)));
        assert!(sandbox.calls().is_empty());
    }

    #[tokio::test]
    async fn test_execution_failure_stops_before_download() {
        let model = FakeModel::new(vec![Ok(SCENE_RESPONSE.to_string())]);
        let sandbox = FakeSandbox::new(Err(Error::Execution("SyntaxError".to_string())));
        let dir = tempfile::tempdir().unwrap();

        let err = run_turn(&model, &sandbox, "anything", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Execution(_)));
        assert_eq!(sandbox.calls(), vec!["upload", "execute"]);
    }

    #[tokio::test]
    async fn test_empty_question_rejected_without_any_call() {
        let model = FakeModel::new(vec![]);
        let sandbox = FakeSandbox::new(Ok(String::new()));
        let dir = tempfile::tempdir().unwrap();

        let err = run_turn(&model, &sandbox, "   ", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(model.calls(), 0);
        assert!(sandbox.calls().is_empty());
    }

    #[tokio::test]
    async fn test_response_without_code_block_fails_turn() {
        let model = FakeModel::new(vec![Ok("I cannot write code today.".to_string())]);
        let sandbox = FakeSandbox::new(Ok(String::new()));
        let dir = tempfile::tempdir().unwrap();

        let err = run_turn(&model, &sandbox, "anything", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Execution(_)));
        assert!(sandbox.calls().is_empty());
    }

    #[tokio::test]
    async fn test_path_resolution_falls_back_to_model() {
        let model = FakeModel::new(vec![
            Ok(SCENE_RESPONSE.to_string()),
            Ok("'/mnt/data/media/Square.mp4'".to_string()),
        ]);
        let sandbox = FakeSandbox::new(Ok("render finished".to_string()));
        let dir = tempfile::tempdir().unwrap();

        let turn = run_turn(&model, &sandbox, "explain squares", dir.path())
            .await
            .unwrap();

        assert_eq!(model.calls(), 2);
        assert!(turn.artifact_path.is_some());
    }

    #[tokio::test]
    async fn test_consecutive_turns_are_independent() {
        let dir = tempfile::tempdir().unwrap();

        // First turn fails at the model stage.
        let failing = FakeModel::new(vec![Err(Error::Model("down".to_string()))]);
        let sandbox = FakeSandbox::new(Ok("Rendered /mnt/data/media/Square.mp4".to_string()));
        assert!(run_turn(&failing, &sandbox, "q", dir.path()).await.is_err());

        // The identical second turn succeeds regardless.
        let model = FakeModel::new(vec![Ok(SCENE_RESPONSE.to_string())]);
        let first = run_turn(&model, &sandbox, "q", dir.path()).await.unwrap();

        let model = FakeModel::new(vec![Ok(SCENE_RESPONSE.to_string())]);
        let second = run_turn(&model, &sandbox, "q", dir.path()).await.unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert_ne!(first.artifact_path, second.artifact_path);
    }
}
