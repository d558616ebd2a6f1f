//! Client for an OpenAI-compatible chat-completion endpoint.

use std::time::Duration;

use qf_core::{ChatMessage, QuizData, QuizParams, build_messages, parse_quiz_reply};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::ApiConfig, error::ApiError};

/// Longest part of an upstream error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Chat completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("The chat completion response contained no message")]
    EmptyReply,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ChatClient {
    http: Client,
    url: String,
    model: String,
    temperature: f32,
}

impl ChatClient {
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.chat_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.chat_completions_url.clone(),
            model: config.chat_model.clone(),
            temperature: config.chat_temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `messages` and return the content of the first choice.
    pub async fn complete(&self, token: &str, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Chat completion endpoint returned an error");
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ChatError::EmptyReply)
    }

    /// Ask the model for a quiz about `source_text` and parse its reply.
    pub async fn generate_quiz(
        &self,
        token: &str,
        source_text: &str,
        params: &QuizParams,
        max_source_chars: usize,
    ) -> Result<QuizData, ApiError> {
        let messages = build_messages(source_text, params, max_source_chars);

        tracing::info!(
            model = %self.model,
            difficulty = %params.difficulty,
            question_count = params.question_count,
            "Requesting quiz generation"
        );

        let content = self.complete(token, &messages).await?;
        let quiz = parse_quiz_reply(&content)?;

        if quiz.questions.len() != params.question_count as usize {
            tracing::warn!(
                requested = params.question_count,
                received = quiz.questions.len(),
                "Model returned a different number of questions than requested"
            );
        }

        Ok(quiz)
    }
}
