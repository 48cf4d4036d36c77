use anyhow::Result;
use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use clap::{Parser, Subcommand};
use ollama_rs::Ollama;
use std::env;
use std::sync::Arc;
use tracing::info;

use arcanum::api::{serve, AppState};
use arcanum::connections::ConnectionAnalyzer;
use arcanum::db::Database;
use arcanum::discovery::{Discovery, SearchClient};
use arcanum::error::PipelineError;
use arcanum::gazetteer::Gazetteer;
use arcanum::importer::{run_location_backfill, BatchConfig, BatchImporter, Importer};
use arcanum::llm::{LlmSummarizer, Summarizer};
use arcanum::logging::configure_logging;
use arcanum::mysteries::MysteryDeriver;
use arcanum::{LLMClient, LLMParams};

#[derive(Parser)]
#[command(name = "arcanum", about = "Content pipeline for an ancient-mysteries encyclopedia")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the operator HTTP API (default).
    Serve,
    /// Search the topic list and import new articles.
    ImportBatch,
    /// Fill in coordinates for articles without them.
    ImportBackfill,
    /// Ask the LLM for thematic connections across the corpus.
    AnalyzeConnections,
    /// Cluster articles under the fixed mystery definitions.
    DeriveMysteries {
        /// Also create mysteries with no matching articles yet.
        #[arg(long)]
        create_when_empty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();

    let db_path = env::var("DATABASE_PATH").unwrap_or("arcanum.db".to_string());
    let db = Database::new(&db_path).await?;

    let gazetteer = Arc::new(match env::var("GAZETTEER_PATH") {
        Ok(path) => Gazetteer::from_json_file(std::path::Path::new(&path))?,
        Err(_) => Gazetteer::builtin(),
    });

    let summarizer = build_summarizer();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let discovery: Option<Arc<dyn Discovery>> =
                SearchClient::from_env().map(|client| Arc::new(client) as Arc<dyn Discovery>);
            if discovery.is_none() {
                info!("EXA_API_KEY not set; batch import endpoint will be unavailable");
            }

            let state = AppState {
                db,
                summarizer,
                discovery,
                gazetteer,
                secret: env::var("CRON_SECRET").ok(),
            };
            serve(state).await?;
        }
        Command::ImportBatch => {
            let discovery = SearchClient::from_env().ok_or_else(|| {
                PipelineError::Configuration("EXA_API_KEY is required for batch import".to_string())
            })?;
            let importer = Importer::new(db.clone(), summarizer, gazetteer);
            let batch = BatchImporter::new(
                db,
                Arc::new(discovery),
                importer,
                BatchConfig::default(),
            );
            let stats = batch.run().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::ImportBackfill => {
            let stats = run_location_backfill(&db, &gazetteer).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::AnalyzeConnections => {
            let summarizer = summarizer.ok_or_else(|| {
                PipelineError::Configuration("an LLM is required for connection analysis".to_string())
            })?;
            let analyzer = ConnectionAnalyzer::new(db, summarizer);
            let stats = analyzer.run().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::DeriveMysteries { create_when_empty } => {
            let summarizer = summarizer.ok_or_else(|| {
                PipelineError::Configuration("an LLM is required for mystery derivation".to_string())
            })?;
            let deriver =
                MysteryDeriver::new(db, summarizer).create_when_empty(create_when_empty);
            let stats = deriver.run().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

/// Picks the LLM backend from the environment: OpenAI when an API key is set,
/// Ollama when a host is, otherwise none.
fn build_summarizer() -> Option<Arc<dyn Summarizer>> {
    let temperature: f32 = env::var("LLM_TEMPERATURE")
        .unwrap_or("0.0".to_string())
        .parse()
        .unwrap_or(0.0);

    if let Ok(api_key) = env::var("OPENAI_API_KEY") {
        let model = env::var("LLM_MODEL").unwrap_or("gpt-4o-mini".to_string());
        info!("Using OpenAI model {}", model);
        let config = OpenAIConfig::new().with_api_key(api_key);
        let params = LLMParams {
            llm_client: LLMClient::OpenAI(OpenAIClient::with_config(config)),
            model,
            temperature,
        };
        return Some(Arc::new(LlmSummarizer::new(params)));
    }

    if let Ok(host) = env::var("OLLAMA_HOST") {
        let port: u16 = env::var("OLLAMA_PORT")
            .unwrap_or("11434".to_string())
            .parse()
            .unwrap_or(11434);
        let model = env::var("LLM_MODEL").unwrap_or("llama3".to_string());
        info!("Using Ollama at {}:{} with model {}", host, port, model);
        let params = LLMParams {
            llm_client: LLMClient::Ollama(Ollama::new(host, port)),
            model,
            temperature,
        };
        return Some(Arc::new(LlmSummarizer::new(params)));
    }

    info!("No LLM configured; summaries and derivations will be unavailable");
    None
}
