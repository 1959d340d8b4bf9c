use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yuwen_generator::models::{ContentRequest, GradeLevel};
use yuwen_generator::Gateway;

#[derive(Debug, Parser)]
#[command(name = "yuwen-generator")]
#[command(about = "Generate Chinese learning content for primary school students")]
struct CliArgs {
    /// Settings file written by the settings UI.
    #[arg(long, value_name = "PATH", default_value = "app_settings.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reading comprehension article with quiz questions.
    Reading {
        /// Grade as 1-6 or 一年级..六年级.
        #[arg(long, value_parser = parse_grade, default_value = "3")]
        grade: GradeLevel,
        #[arg(long, default_value = "")]
        topic: String,
    },
    /// Classical poem by title, author or theme (empty for a random one).
    Poetry {
        #[arg(default_value = "")]
        query: String,
    },
    /// Breakdown of a single character.
    Character { character: String },
    /// Picture-writing task for a topic (random when omitted).
    Composition { topic: Option<String> },
    /// Feedback on a student composition read from a file.
    Evaluate {
        #[arg(long)]
        topic: String,
        file: PathBuf,
    },
}

fn parse_grade(input: &str) -> std::result::Result<GradeLevel, String> {
    input.parse()
}

impl Command {
    fn into_request(self) -> Result<ContentRequest> {
        Ok(match self {
            Command::Reading { grade, topic } => ContentRequest::Reading { grade, topic },
            Command::Poetry { query } => ContentRequest::Poetry { query },
            Command::Character { character } => ContentRequest::Character { character },
            Command::Composition { topic } => ContentRequest::CompositionGeneration { topic },
            Command::Evaluate { topic, file } => ContentRequest::CompositionEvaluation {
                student_text: std::fs::read_to_string(&file)?,
                topic,
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yuwen_generator=info,diagnostics=error".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let request = args.command.into_request()?;
    let operation = request.operation();

    info!("Starting {}", operation);
    let gateway = Gateway::from_settings_file(&args.settings);

    match gateway.generate(request).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            let notice = e.notice(operation.label());
            error!("{} failed: {}", operation, e);
            eprintln!("{}", notice.message);
            std::process::exit(1);
        }
    }
}
