mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use clap::{Parser, Subcommand};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::OllamaClient;
use crate::models::job::JobDescription;
use crate::routes::build_router;
use crate::screening::intake::extract_resume_text;
use crate::screening::pipeline::ScreeningPipeline;
use crate::screening::rules::EvaluationRules;
use crate::screening::store::SqliteResultStore;
use crate::state::AppState;

/// Screens resumes against a job description with a local Ollama backend.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Evaluate a single resume and print the decision
    Evaluate {
        /// Candidate name
        #[arg(long)]
        name: String,
        /// Candidate email
        #[arg(long)]
        email: String,
        /// Path to the resume PDF
        #[arg(long)]
        resume: PathBuf,
        /// Job description JSON; overrides JOB_DESCRIPTION_PATH
        #[arg(long)]
        job: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let job = load_job(config.job_description_path.as_deref())?;
            serve(config, job).await
        }
        Command::Evaluate {
            name,
            email,
            resume,
            job,
        } => {
            let job = load_job(job.or_else(|| config.job_description_path.clone()).as_deref())?;
            evaluate(&config, &job, &name, &email, &resume).await
        }
    }
}

fn load_job(path: Option<&Path>) -> Result<JobDescription> {
    let job = match path {
        Some(path) => JobDescription::from_file(path)?,
        None => JobDescription::sample(),
    };
    info!("Job description: {} ({} skills)", job.title, job.skills.len());
    Ok(job)
}

async fn build_pipeline(config: &Config) -> Result<ScreeningPipeline> {
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(SqliteResultStore::new(pool));

    let ollama = Arc::new(OllamaClient::from_config(config)?);
    info!(
        "Ollama client initialized at {} (embedding: {}, generation: {})",
        config.ollama_base_url,
        ollama.embedding_model(),
        ollama.generation_model()
    );

    Ok(ScreeningPipeline::new(
        ollama.clone(),
        ollama,
        store,
        EvaluationRules::standard(),
        config,
    ))
}

async fn serve(config: Config, job: JobDescription) -> Result<()> {
    let pipeline = build_pipeline(&config).await?;

    let origin: HeaderValue = config
        .cors_allowed_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {}", config.cors_allowed_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        job: Arc::new(job),
        config,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn evaluate(
    config: &Config,
    job: &JobDescription,
    name: &str,
    email: &str,
    resume: &Path,
) -> Result<()> {
    let pipeline = build_pipeline(config).await?;
    let resume_text = extract_resume_text(resume.to_path_buf()).await?;

    let evaluation = pipeline
        .evaluate_candidate(job, &resume_text, name, email, &resume.to_string_lossy())
        .await?;

    println!("Record:   {}", evaluation.record_id);
    println!("Decision: {}", evaluation.decision.decision);
    println!("Score:    {}", evaluation.decision.compatibility_score);
    println!("\n{}", evaluation.decision.justification);
    Ok(())
}
