pub mod ai;
pub mod capture;
pub mod config;
pub mod error;
pub mod session;

use anyhow::Context;
use clap::Parser;
use std::io::Read;

pub use ai::llm::{process_content, PostGenerator};
pub use ai::StructuredPost;
pub use capture::CapturedContent;
pub use config::{AppConfig, Settings};
pub use error::PipelineError;

/// Turn selected text (read from stdin) into a LinkedIn post.
#[derive(Debug, Parser)]
#[command(name = "postcraft", version, about)]
struct Cli {
    /// Page the text was selected on
    #[arg(long, default_value = "")]
    url: String,

    /// Title of that page
    #[arg(long, default_value = "")]
    title: String,

    /// Original author, if known
    #[arg(long)]
    author: Option<String>,

    /// Model to use instead of the configured one
    #[arg(long)]
    model: Option<String>,

    /// Only check that the configured API key is accepted
    #[arg(long)]
    verify: bool,
}

pub fn run() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config_dir = config::default_config_dir();
    let app_config = AppConfig::load(&config_dir);
    let mut settings = app_config.settings();
    if let Some(model) = cli.model {
        settings = settings.with_model(model);
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    if cli.verify {
        let client = ai::openai::OpenAIClient::from_settings(&settings)?;
        let ok = runtime.block_on(client.verify_api_key())?;
        println!("{}", if ok { "Connected" } else { "Invalid API key" });
        return Ok(());
    }

    let mut selected_text = String::new();
    std::io::stdin()
        .read_to_string(&mut selected_text)
        .context("failed to read selected text from stdin")?;

    let mut content = CapturedContent::new(selected_text.trim(), cli.url, cli.title);
    content.author = cli.author;

    log::info!("Config loaded from {}", config_dir.display());
    let post = runtime.block_on(process_content(&content, &settings))?;
    println!("{}", serde_json::to_string_pretty(&post)?);
    Ok(())
}
