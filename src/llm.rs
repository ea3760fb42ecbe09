//! Text-generation client.
//!
//! Wraps an OpenAI-compatible chat-completions endpoint behind the
//! `TextGenerator` trait so the interview logic can be driven by a scripted
//! generator in tests. Every caller treats a failure the same way: degrade to
//! its deterministic fallback, never surface the error mid-interview.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Error from a text-generation call.
///
/// The variants exist for logging; callers are expected to treat every
/// failure identically and fall back to their deterministic path.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network, TLS, or timeout failure in the underlying transport.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered, but not with anything we can use.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The client cannot make requests at all (missing API key, quota).
    #[error("{0}")]
    Unavailable(String),
}

/// A synchronous system/user instruction pair completion.
pub trait TextGenerator {
    fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
///
/// Constructed once and passed explicitly to everything that needs it. A
/// missing API key does not fail construction; it fails each call instead,
/// so the interview still runs end-to-end on its fallback paths.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    temperature: f64,
    api_key: Option<String>,
    api_key_env: String,
}

impl OpenAiClient {
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let api_key = std::env::var(&config.llm.api_key_env).ok();
        if api_key.is_none() {
            warn!(env_var = %config.llm.api_key_env, "api_key_missing");
        }

        Ok(Self {
            client,
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            api_key,
            api_key_env: config.llm.api_key_env.clone(),
        })
    }
}

impl TextGenerator for OpenAiClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GenerationError::Unavailable(format!("{} is not set", self.api_key_env))
        })?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": self.temperature,
        });

        debug!(model = %self.model, "completion_request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "completion_http_error");
            return Err(GenerationError::Unavailable(format!(
                "endpoint returned HTTP {}",
                status
            )));
        }

        let json: Value = response.json()?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                GenerationError::MalformedResponse("no message content in response".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}

/// Strips an optional fenced code block wrapper from a model reply.
///
/// Models asked for JSON-only output still frequently wrap it in
/// triple-backtick fences (with or without a language tag). Callers run
/// replies through this before parsing.
pub fn strip_code_fences(text: &str) -> String {
    let mut cleaned = text.trim();

    if cleaned.starts_with("```") {
        cleaned = match cleaned.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        };
    }
    if cleaned.ends_with("```") {
        cleaned = match cleaned.rsplit_once('\n') {
            Some((rest, _)) => rest,
            None => "",
        };
    }

    cleaned.trim().to_string()
}
