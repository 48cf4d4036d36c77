use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use std::time::Duration;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

const LLM_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_RETRIES: usize = 3;

/// The summarization service boundary: single-turn prompt in, prose out.
///
/// Passed into the importer and the derivation jobs so tests can substitute a
/// fake for the real language-model client.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

pub struct LlmSummarizer {
    params: LLMParams,
}

impl LlmSummarizer {
    pub fn new(params: LLMParams) -> Self {
        LlmSummarizer { params }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        generate_llm_response(prompt, max_tokens, &self.params)
            .await
            .ok_or_else(|| {
                PipelineError::Upstream("no response from language model".to_string())
            })
    }
}

/// Sends a single-turn prompt to the configured LLM backend, retrying with
/// exponential backoff on errors and timeouts. Returns `None` only after all
/// retries are exhausted.
pub async fn generate_llm_response(
    prompt: &str,
    max_tokens: u32,
    params: &LLMParams,
) -> Option<String> {
    let mut response_text = String::new();
    let mut backoff = 2;

    debug!(target: TARGET_LLM_REQUEST, "Starting LLM response generation ({} prompt chars)", prompt.len());

    for retry_count in 0..MAX_RETRIES {
        match timeout(LLM_TIMEOUT, generate_once(prompt, max_tokens, params)).await {
            Ok(Ok(response)) => {
                response_text = response;
                debug!(target: TARGET_LLM_REQUEST, "LLM response received ({} chars)", response_text.len());
                break;
            }
            Ok(Err(e)) => {
                warn!(target: TARGET_LLM_REQUEST, "Error generating response: {}", e);
                if retry_count < MAX_RETRIES - 1 {
                    info!(target: TARGET_LLM_REQUEST, "Retrying LLM request... ({}/{})", retry_count + 1, MAX_RETRIES);
                } else {
                    error!(target: TARGET_LLM_REQUEST, "Failed to generate response after {} retries", MAX_RETRIES);
                }
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "LLM request timed out");
                if retry_count < MAX_RETRIES - 1 {
                    info!(target: TARGET_LLM_REQUEST, "Retrying LLM request... ({}/{})", retry_count + 1, MAX_RETRIES);
                } else {
                    error!(target: TARGET_LLM_REQUEST, "Failed to generate response after {} retries due to timeouts", MAX_RETRIES);
                }
            }
        }

        if retry_count < MAX_RETRIES - 1 {
            debug!(target: TARGET_LLM_REQUEST, "Backing off for {} seconds before retry", backoff);
            sleep(Duration::from_secs(backoff)).await;
            backoff *= 2; // Exponential backoff
        }
    }

    if response_text.is_empty() {
        error!(target: TARGET_LLM_REQUEST, "No response generated after all retries");
        None
    } else {
        Some(response_text)
    }
}

async fn generate_once(
    prompt: &str,
    max_tokens: u32,
    params: &LLMParams,
) -> std::result::Result<String, String> {
    match &params.llm_client {
        LLMClient::Ollama(ollama) => {
            let mut request = GenerationRequest::new(params.model.to_string(), prompt.to_string());
            request.options = Some(
                GenerationOptions::default()
                    .temperature(params.temperature)
                    .num_predict(max_tokens as i32),
            );

            let response = ollama.generate(request).await.map_err(|e| e.to_string())?;
            Ok(response.response)
        }
        LLMClient::OpenAI(client) => {
            let message = ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| e.to_string())?;

            let request = CreateChatCompletionRequestArgs::default()
                .model(&params.model)
                .temperature(params.temperature)
                .max_tokens(max_tokens)
                .messages([message.into()])
                .build()
                .map_err(|e| e.to_string())?;

            let response = client
                .chat()
                .create(request)
                .await
                .map_err(|e| e.to_string())?;

            response
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone())
                .ok_or_else(|| "empty completion".to_string())
        }
    }
}
