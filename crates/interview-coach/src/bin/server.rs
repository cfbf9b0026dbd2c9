//! Interview coach server binary
//!
//! Run with: cargo run -p interview-coach --bin interview-coach-server -- --config coach.toml

use clap::Parser;
use interview_coach::{config::CoachConfig, providers::build_llm, server::CoachServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "interview-coach-server", about = "Interview simulator and grading server")]
#[command(version)]
struct Cli {
    /// TOML config file (falls back to $COACH_CONFIG, then defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_coach=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Interview Coach                       ║
║        Manufacturing interview practice and grading       ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let mut config = CoachConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - LLM model: {}", config.active_model());
    tracing::info!("  - Database: {}", config.storage.database_path.display());
    tracing::info!("  - Slide retrieval: {} (top {})", config.retrieval.enabled, config.retrieval.top_k);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    // Check the language-model backend
    let llm = build_llm(&config)?;
    tracing::info!("Checking {} backend...", llm.name());
    match llm.health_check().await {
        Ok(true) => tracing::info!("{} is reachable", llm.name()),
        _ => {
            tracing::warn!("{} backend not available; chat and grading will fail until it is", llm.name());
            tracing::warn!("  For Ollama: ollama serve && ollama pull {}", config.ollama.model);
        }
    }

    // Create and start server
    let server = CoachServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/sessions              - Start an interview");
    println!("  POST /api/sessions/:id/messages - Ask a question");
    println!("  POST /api/sessions/:id/end      - Grade and save");
    println!("  GET  /api/dashboard/grades      - Tutor dashboard");
    println!("  POST /api/slides                - Upload lecture slides");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
