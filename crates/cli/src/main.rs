//! Mentora CLI — the main entry point.
//!
//! Commands:
//! - `demo`     — Run one teaching exchange through the full pipeline
//!                against a scripted generation backend
//! - `validate` — Run the response validator against a candidate response

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use mentora_config::AppConfig;
use mentora_core::error::GenerationError;
use mentora_core::generation::{GenerationClient, GenerationParams};
use mentora_core::persona::{PersonaId, PersonaProfile};
use mentora_core::session::{LearnerId, TeachingSession};
use mentora_core::storage::Storage;
use mentora_prompt::{FileFragmentStore, HistoryBudget, PromptAssembler};
use mentora_session::SessionOrchestrator;
use mentora_storage::InMemoryStorage;
use mentora_validator::{ResponseValidator, ValidationInput};

#[derive(Parser)]
#[command(
    name = "mentora",
    about = "Mentora — persona-faithful teaching conversations",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "mentora.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one exchange through the pipeline with a scripted backend
    Demo {
        /// The learner's message
        #[arg(short, long, default_value = "How do I solve 3x + 7 = 22?")]
        message: String,

        /// Scripted backend responses, consumed in order. When the script
        /// runs out, a canned guided question is produced.
        #[arg(short, long)]
        respond: Vec<String>,

        /// Persona name for the seeded profile
        #[arg(long, default_value = "Ms. Rivera")]
        persona: String,

        /// Session subject
        #[arg(long, default_value = "algebra")]
        subject: String,

        /// Session topic
        #[arg(long, default_value = "linear equations")]
        topic: String,
    },

    /// Validate a candidate response without touching a session
    Validate {
        /// The candidate instructor response
        response: String,

        /// The learner input it responds to
        #[arg(short, long, default_value = "")]
        input: String,
    },
}

/// Scripted generation backend for pipeline smoke tests. Plays back the
/// provided responses in order, then falls back to a fixed guided question.
struct ScriptedBackend {
    responses: tokio::sync::Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: tokio::sync::Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl GenerationClient for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        let mut responses = self.responses.lock().await;
        Ok(responses.pop_front().unwrap_or_else(|| {
            "That's a good question to sit with for a moment. What have you \
             already tried, and where did it stop making sense?"
                .to_string()
        }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config).context("loading configuration")?;

    match cli.command {
        Commands::Demo {
            message,
            respond,
            persona,
            subject,
            topic,
        } => run_demo(&config, &message, respond, &persona, &subject, &topic).await,
        Commands::Validate { response, input } => run_validate(&config, &response, &input),
    }
}

async fn run_demo(
    config: &AppConfig,
    message: &str,
    respond: Vec<String>,
    persona: &str,
    subject: &str,
    topic: &str,
) -> anyhow::Result<()> {
    let storage = Arc::new(InMemoryStorage::new());

    let profile = PersonaProfile::minimal(PersonaId::new(), persona);
    storage.save_profile(&profile).await?;

    let session = TeachingSession::new(
        LearnerId::new(),
        profile.id.clone(),
        subject,
        topic,
        format!("work through {topic} together"),
    );
    let session_id = session.id.clone();
    storage.save_session(&session).await?;

    let mut assembler = PromptAssembler::new(Arc::new(FileFragmentStore::new(
        config.prompts.root.clone(),
    )));
    if let Some(max_tokens) = config.prompts.history_token_budget {
        assembler = assembler.with_history_budget(HistoryBudget {
            max_tokens,
            chars_per_token: config.prompts.chars_per_token,
        });
    }

    let orchestrator = SessionOrchestrator::new(
        storage.clone(),
        Arc::new(ScriptedBackend::new(respond)),
        assembler,
    )
    .with_validator(ResponseValidator::new(
        config.validation.min_response_chars,
        config.validation.verification_length_threshold,
    ))
    .with_params(config.generation.to_params());

    let reply = orchestrator
        .process_learner_message(&session_id, message)
        .await?;

    println!("Learner:  {message}");
    println!("{persona}: {reply}");
    Ok(())
}

fn run_validate(config: &AppConfig, response: &str, input: &str) -> anyhow::Result<()> {
    let profile = PersonaProfile::minimal(PersonaId::new(), "Instructor");
    let session = TeachingSession::new(
        LearnerId::new(),
        profile.id.clone(),
        "general",
        "general",
        "validation check",
    );

    let validator = ResponseValidator::new(
        config.validation.min_response_chars,
        config.validation.verification_length_threshold,
    );
    let report = validator.validate(&ValidationInput {
        response,
        session: &session,
        profile: &profile,
        learner_input: input,
    });

    println!("action: {:?}", report.action);
    for violation in &report.violations {
        println!(
            "  [{:?}] {}: {}",
            violation.severity, violation.rule, violation.message
        );
    }
    Ok(())
}
