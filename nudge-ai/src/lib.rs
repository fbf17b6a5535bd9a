//! nudge-ai: the generative-AI capability client.
//!
//! Every public operation returns a value. Provider failures are logged and
//! mapped to the operation's fallback.

pub mod json;
pub mod offline;
pub mod openai;
pub mod prompts;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use nudge_core::{ParsedTask, PriorityAssignment, TaskSummary};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Offline,
}

impl Provider {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "offline" | "none" => Some(Provider::Offline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: Provider,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub image_model: String,
    pub tts_model: String,
    pub voice: String,
    pub temperature: f32,
    /// Used to tell the model what "now" looks like to the user.
    pub timezone: Tz,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Offline,
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            image_model: "dall-e-3".to_string(),
            tts_model: "tts-1".to_string(),
            voice: "nova".to_string(),
            temperature: 0.4,
            timezone: chrono_tz::America::Chicago,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiClient {
    config: AiConfig,
    http: reqwest::Client,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn offline() -> Self {
        Self::new(AiConfig::default())
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Fallback: the raw text, no time.
    pub async fn parse(&self, raw: &str, now: DateTime<Utc>) -> ParsedTask {
        match self.try_parse(raw, now).await {
            Ok(p) => p,
            Err(e) => {
                warn!("parse failed, keeping raw text: {e:#}");
                ParsedTask::fallback(raw)
            }
        }
    }

    /// Fallback: no steps, the task stays as it is.
    pub async fn decompose(&self, title: &str) -> Vec<String> {
        match self.try_decompose(title).await {
            Ok(steps) => steps,
            Err(e) => {
                warn!("decompose failed: {e:#}");
                Vec::new()
            }
        }
    }

    /// Fallback: no assignments.
    pub async fn prioritize(&self, tasks: &[TaskSummary]) -> Vec<PriorityAssignment> {
        if tasks.is_empty() {
            return Vec::new();
        }
        match self.try_prioritize(tasks).await {
            Ok(out) => out,
            Err(e) => {
                warn!("prioritize failed: {e:#}");
                Vec::new()
            }
        }
    }

    /// Fallback: no image.
    pub async fn generate_image(&self, title: &str) -> Option<String> {
        match self.config.provider {
            Provider::Offline => None,
            Provider::OpenAI => {
                match openai::generate_image(&self.http, &self.config, &prompts::image_prompt(title)).await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("image generation failed: {e:#}");
                        None
                    }
                }
            }
        }
    }

    /// Fallback: none, and the caller speaks with the on-device synthesizer.
    pub async fn speak(&self, text: &str) -> Option<Vec<u8>> {
        match self.config.provider {
            Provider::Offline => None,
            Provider::OpenAI => match openai::speech(&self.http, &self.config, text).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("speech synthesis failed: {e:#}");
                    None
                }
            },
        }
    }

    async fn try_parse(&self, raw: &str, now: DateTime<Utc>) -> Result<ParsedTask> {
        match self.config.provider {
            Provider::Offline => offline::parse(raw),
            Provider::OpenAI => {
                let local_now = now.with_timezone(&self.config.timezone).format("%Y-%m-%d %H:%M (%A)");
                let user = prompts::parse_user(raw, &local_now.to_string());
                let reply = openai::chat_complete(&self.http, &self.config, prompts::PARSE_SYSTEM, &user).await?;
                debug!(reply = %reply, "parse reply");
                json::parse_task_reply(raw, &reply)
            }
        }
    }

    async fn try_decompose(&self, title: &str) -> Result<Vec<String>> {
        match self.config.provider {
            Provider::Offline => Ok(Vec::new()),
            Provider::OpenAI => {
                let user = prompts::decompose_user(title);
                let reply = openai::chat_complete(&self.http, &self.config, prompts::DECOMPOSE_SYSTEM, &user).await?;
                json::parse_subtasks(&reply)
            }
        }
    }

    async fn try_prioritize(&self, tasks: &[TaskSummary]) -> Result<Vec<PriorityAssignment>> {
        match self.config.provider {
            Provider::Offline => Ok(Vec::new()),
            Provider::OpenAI => {
                let user = prompts::prioritize_user(tasks);
                let reply = openai::chat_complete(&self.http, &self.config, prompts::PRIORITIZE_SYSTEM, &user).await?;
                let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
                json::parse_priorities(&reply, &ids)
            }
        }
    }
}
