//! The chat server: one HTTP surface over the generation pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::llm::{ModelClient, ModelConfig};
use crate::pipeline;
use crate::prelude::{eprintln, *};
use crate::sandbox::{SandboxClient, SandboxConfig};

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory where downloaded videos are kept
    #[arg(long, env = "ANIMGEN_VIDEO_DIR", default_value = "./videos")]
    pub video_dir: PathBuf,
}

struct AppState {
    model: ModelClient,
    sandbox: SandboxClient,
    video_dir: PathBuf,
    verbose: bool,
}

#[derive(Debug, serde::Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, serde::Serialize)]
struct ChatResponse {
    reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let model = ModelClient::new(ModelConfig::from_env()?)?;
    let sandbox = SandboxClient::new(SandboxConfig::from_env()?)?;

    tokio::fs::create_dir_all(&options.video_dir)
        .await
        .map_err(|e| eyre!("Failed to create {}: {}", options.video_dir.display(), e))?;

    let addr = format!("{}:{}", options.host, options.port);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = Arc::new(AppState {
        model,
        sandbox,
        video_dir: options.video_dir,
        verbose: global.verbose,
    });

    let app_router = Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .route("/videos/{name}", get(video_handler))
        .layer(cors)
        .with_state(state);

    if global.verbose {
        eprintln!("Chat server listening on http://{addr}");
        eprintln!("Chat endpoint: http://{addr}/chat");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    axum::serve(listener, app_router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    if state.verbose {
        eprintln!("Chat turn: {}", request.message);
    }

    match pipeline::run_turn(
        &state.model,
        &state.sandbox,
        &request.message,
        &state.video_dir,
    )
    .await
    {
        Ok(turn) => {
            if state.verbose {
                eprintln!("Turn {} complete for: {}", turn.session_id, turn.user_prompt);
            }

            let name = turn
                .artifact_path
                .as_deref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            Json(ChatResponse {
                reply: "Video is finished, here is the result:".to_string(),
                video_url: Some(format!("/videos/{name}")),
                error: None,
            })
        }
        Err(e) => {
            if state.verbose {
                eprintln!("Turn failed: {e}");
            }

            Json(ChatResponse {
                reply: "The video could not be generated.".to_string(),
                video_url: None,
                error: Some(e.to_string()),
            })
        }
    }
}

async fn video_handler(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    // Served names are always `{uuid}.mp4`; anything that could escape the
    // video directory is rejected.
    if name.contains('/') || name.contains("..") {
        return (StatusCode::BAD_REQUEST, "invalid video name").into_response();
    }

    match tokio::fs::read(state.video_dir.join(&name)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "video/mp4")], bytes).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "video not found").into_response(),
    }
}
