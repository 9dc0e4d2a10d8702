//! One-shot CLI run of the pipeline: question in, local video file out.

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::llm::{ModelClient, ModelConfig};
use crate::pipeline;
use crate::prelude::{eprintln, println, *};
use crate::sandbox::{SandboxClient, SandboxConfig};

#[derive(Debug, clap::Args)]
pub struct GenerateOptions {
    /// The question to explain with an animation
    pub question: String,

    /// Where to write the rendered video (defaults to {session_id}.mp4)
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Directory for downloaded videos
    #[arg(long, env = "ANIMGEN_VIDEO_DIR", default_value = ".")]
    pub video_dir: PathBuf,
}

pub async fn run(options: GenerateOptions, global: crate::Global) -> Result<()> {
    let model = ModelClient::new(ModelConfig::from_env()?)?;
    let sandbox = SandboxClient::new(SandboxConfig::from_env()?)?;

    if global.verbose {
        eprintln!("Model endpoint: {}", model.config().completions_url());
        eprintln!("Session pool: {}", sandbox.config().pool_url);
        eprintln!();
    }

    tokio::fs::create_dir_all(&options.video_dir)
        .await
        .map_err(|e| eyre!("Failed to create {}: {}", options.video_dir.display(), e))?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("Generating animation (model, render, download)...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = pipeline::run_turn(&model, &sandbox, &options.question, &options.video_dir).await;
    spinner.finish_and_clear();

    let turn = result?;
    let mut path = turn
        .artifact_path
        .ok_or_eyre("pipeline finished without an artifact path")?;

    if let Some(output) = options.output {
        tokio::fs::copy(&path, &output)
            .await
            .map_err(|e| eyre!("Failed to write {}: {}", output.display(), e))?;
        tokio::fs::remove_file(&path).await.ok();
        path = output;
    }

    if global.verbose {
        if let Some(scene) = &turn.scene_name {
            eprintln!("Rendered scene: {scene}");
        }
        if let Some(code) = &turn.generated_code {
            eprintln!("Generated {} bytes of manim source", code.len());
        }
    }

    println!("{} {}", "Video ready:".green().bold(), path.display());

    Ok(())
}
