use thiserror::Error;

/// Errors raised while editing a question list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("Question not found: {0}")]
    QuestionNotFound(String),
    #[error("Index {index} is out of range for a list of {len} questions")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors raised while turning a chat reply into quiz data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("The model reply did not contain a fenced JSON block")]
    MissingJsonBlock,
    #[error("The model reply contained malformed JSON: {0}")]
    MalformedJson(String),
    #[error("Invalid quiz data structure: {0}")]
    InvalidStructure(String),
    #[error("Invalid question at position {index}: {message}")]
    InvalidQuestion { index: usize, message: String },
}
