//! Prompt construction and reply parsing for quiz generation.
//!
//! The chat model is asked to answer with a fenced ```json block holding an object with
//! a `title` string and a `questions` array. Everything outside the block is ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::GenerationError,
    params::QuizParams,
    question::{QuestionType, QuizQuestion},
    quiz::QuizData,
};

// The info string (`json`, `JSON`, `jsonc`, ...) runs to the end of the opening line
static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*[ \t]*\r?\n|(?i:json))?\s*(.*?)\s*```")
        .expect("fenced block pattern is valid")
});

const SYSTEM_PROMPT: &str = "You are an assistant that writes quizzes from study material. \
Always answer with a single JSON object inside a ```json fenced code block and nothing else.";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat-completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A question as the model writes it. Its `id` is never trusted, so it is not read.
#[derive(Deserialize)]
struct GeneratedQuestion {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<QuestionType>,
}

impl From<GeneratedQuestion> for QuizQuestion {
    fn from(generated: GeneratedQuestion) -> Self {
        Self::new(
            generated.title,
            generated.description.unwrap_or_default(),
            generated.kind.unwrap_or_default(),
        )
    }
}

/// Build the fixed prompt for a generation request.
///
/// `source_text` is cut to at most `max_source_chars` characters.
pub fn build_messages(
    source_text: &str,
    params: &QuizParams,
    max_source_chars: usize,
) -> Vec<ChatMessage> {
    let source = truncate_chars(source_text.trim(), max_source_chars);
    let types = [
        QuestionType::ShortAnswer,
        QuestionType::LongAnswer,
        QuestionType::Rating,
    ]
    .map(QuestionType::as_str)
    .join(", ");

    let user = format!(
        "Create a quiz with exactly {count} questions of {difficulty} difficulty based on the text below.\n\
         Respond with a ```json fenced block containing an object of the form\n\
         {{\"title\": \"Quiz title\", \"questions\": [{{\"id\": \"1\", \"title\": \"Question text\", \
         \"description\": \"Extra context or instructions\", \"type\": \"short_answer\"}}]}}\n\
         The \"type\" of each question must be one of: {types}. \
         Use \"rating\" only for questions answered on a scale from 1 to 5.\n\n\
         Text:\n{source}",
        count = params.question_count,
        difficulty = params.difficulty,
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Turn the content of a chat reply into quiz data.
///
/// Every question receives a fresh identifier regardless of what the model produced.
pub fn parse_quiz_reply(content: &str) -> Result<QuizData, GenerationError> {
    let block = FENCED_JSON
        .captures(content)
        .and_then(|caps| caps.get(1))
        .ok_or(GenerationError::MissingJsonBlock)?
        .as_str();

    let value: Value =
        serde_json::from_str(block).map_err(|e| GenerationError::MalformedJson(e.to_string()))?;

    let title = value
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| GenerationError::InvalidStructure("missing string field `title`".into()))?
        .trim()
        .to_string();
    if title.is_empty() {
        return Err(GenerationError::InvalidStructure("field `title` is empty".into()));
    }

    let raw_questions = value
        .get("questions")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            GenerationError::InvalidStructure("missing array field `questions`".into())
        })?;

    let questions = raw_questions
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            GeneratedQuestion::deserialize(raw)
                .map(QuizQuestion::from)
                .map_err(|e| GenerationError::InvalidQuestion {
                    index,
                    message: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        title = %title,
        questions = questions.len(),
        "Parsed generated quiz"
    );

    Ok(QuizData { title, questions })
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}
