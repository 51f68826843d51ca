use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

mod db;
mod engine;
mod error;
#[cfg(test)]
mod fixtures;
mod models;
mod prompt;
mod query;
mod report;
mod scope;
mod store;
mod summarize;

use engine::{GeminiConfig, GeminiEngine};
use error::ConfigurationError;
use query::{AdminSession, QueryOrchestrator};
use scope::{AccessScope, ScopedView};
use store::RecordStore;
use summarize::DigestLimits;

#[derive(Parser)]
#[command(name = "scoped-query")]
#[command(about = "Ask plain-English questions about the student records you are allowed to see", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Dataset file (.csv or .json)
    #[arg(long, global = true, default_value = "student_data.csv")]
    data: PathBuf,

    /// Read records from Postgres instead of the dataset file
    #[arg(long, global = true)]
    from_db: bool,

    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,
}

#[derive(Args)]
struct ScopeArgs {
    /// Grade the administrator may see (omit for all grades)
    #[arg(long)]
    grade: Option<i32>,

    /// Class section the administrator may see (omit for all sections)
    #[arg(long = "class")]
    class_section: Option<String>,
}

impl ScopeArgs {
    fn scope(&self) -> AccessScope {
        AccessScope::new(self.grade, self.class_section.clone())
    }
}

#[derive(Args)]
struct EngineArgs {
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = engine::DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "GEMINI_BASE_URL")]
    base_url: Option<String>,

    /// Seconds to wait for the reasoning engine before giving up
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    #[arg(long, default_value_t = 50)]
    homework_rows: usize,

    #[arg(long, default_value_t = 50)]
    quiz_rows: usize,

    #[arg(long, default_value_t = 20)]
    sample_rows: usize,
}

impl EngineArgs {
    fn orchestrator(&self) -> Result<QueryOrchestrator, ConfigurationError> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigurationError::MissingApiKey)?;

        let engine = GeminiEngine::new(GeminiConfig {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            ..GeminiConfig::new(api_key)
        });
        Ok(QueryOrchestrator::new(Arc::new(engine))
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }

    fn limits(&self) -> DigestLimits {
        DigestLimits {
            homework_rows: self.homework_rows,
            quiz_rows: self.quiz_rows,
            sample_rows: self.sample_rows,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the Postgres schema
    InitDb,
    /// Import records from a CSV or JSON file into Postgres
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Show what the administrator is authorized to see
    Access {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        json: bool,
    },
    /// Print a submission-rate summary of the visible records
    Summary {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Ask one question and print the answer
    Ask {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        engine: EngineArgs,
        question: String,
    },
    /// Interactive question loop on stdin
    Chat {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        engine: EngineArgs,
    },
}

async fn connect(source: &SourceArgs) -> anyhow::Result<PgPool> {
    let database_url = source
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_store(source: &SourceArgs) -> anyhow::Result<RecordStore> {
    if source.from_db {
        let pool = connect(source).await?;
        return db::fetch_records(&pool).await;
    }
    Ok(store::load_path(&source.data)?)
}

fn print_access(session: &AdminSession<'_>) {
    let info = session.access_info();
    println!("Admin access:");
    println!("  Grade: {}", info.grade);
    println!("  Class: {}", info.class);
    println!("  Students: {}", info.total_students);
    println!("  Records: {}", info.total_records);
}

async fn chat(session: &AdminSession<'_>) -> anyhow::Result<()> {
    print_access(session);
    println!("Type a question, `summary` for quick stats, or `exit` to quit.");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        match question {
            "" => continue,
            "exit" | "quit" => break,
            "summary" => {
                print!("{}", session.summary_report());
                continue;
            }
            _ => {}
        }

        match session.ask(question).await {
            Ok(answer) => println!("{answer}"),
            Err(err) if err.is_retryable() => println!("{}", err.user_message()),
            Err(err) => println!("{err}\n\nCheck the API key and restart the session."),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scoped_query_assistant=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&cli.source).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Import { file } => {
            let records = store::load_path(&file)?;
            let pool = connect(&cli.source).await?;
            let inserted = db::import_records(&pool, records.records()).await?;
            println!("Inserted {inserted} records from {}.", file.display());
        }
        Commands::Access { scope, json } => {
            let store = load_store(&cli.source).await?;
            let view = ScopedView::new(&store, scope.scope());
            let info = report::access_info(&view);
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Grade: {}", info.grade);
                println!("Class: {}", info.class);
                println!("Students: {}", info.total_students);
                println!("Records: {}", info.total_records);
            }
        }
        Commands::Summary { scope } => {
            let store = load_store(&cli.source).await?;
            let view = ScopedView::new(&store, scope.scope());
            print!("{}", report::build_summary_report(&view));
        }
        Commands::Ask {
            scope,
            engine,
            question,
        } => {
            let orchestrator = engine.orchestrator()?;
            let store = load_store(&cli.source).await?;
            let session = AdminSession::new(&store, scope.scope(), engine.limits(), orchestrator);
            match session.ask(&question).await {
                Ok(answer) => println!("{answer}"),
                Err(err) => println!("{}", err.user_message()),
            }
        }
        Commands::Chat { scope, engine } => {
            let orchestrator = engine.orchestrator()?;
            let store = load_store(&cli.source).await?;
            let session = AdminSession::new(&store, scope.scope(), engine.limits(), orchestrator);
            chat(&session).await?;
            info!("chat session closed");
        }
    }

    Ok(())
}
