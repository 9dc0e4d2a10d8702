use crate::prelude::*;
use clap::Parser;

mod error;
mod generate;
mod llm;
mod pipeline;
mod prelude;
mod sandbox;
mod serve;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Generate manim explainer videos from natural-language questions"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "ANIMGEN_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Start the chat server
    Serve(crate::serve::ServeOptions),

    /// Run the pipeline once and write the video locally
    Generate(crate::generate::GenerateOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(options) => crate::serve::run(options, app.global).await,
        SubCommands::Generate(options) => crate::generate::run(options, app.global).await,
    }
}
