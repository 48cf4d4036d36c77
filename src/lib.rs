pub mod api;
pub mod classify;
pub mod connections;
pub mod db;
pub mod discovery;
pub mod environment;
pub mod error;
pub mod gazetteer;
pub mod importer;
pub mod llm;
pub mod logging;
pub mod media;
pub mod mysteries;
pub mod prompts;
pub mod slug;
pub mod topics;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_DB: &str = "db_query";

#[derive(Clone, Debug)]
pub enum LLMClient {
    Ollama(Ollama),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

#[derive(Clone)]
pub struct LLMParams {
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
}
