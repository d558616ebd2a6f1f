//! Quiz domain library for Quizforge
//!
//! This crate holds the quiz data model, the editing operations on a question list,
//! and the prompt/reply handling used when questions are generated by a chat model.
//! It does no I/O: the HTTP service in `qf-api` owns the network calls.

pub mod error;
pub mod generation;
pub mod params;
pub mod question;
pub mod quiz;

pub use error::{GenerationError, QuizError};
pub use generation::{ChatMessage, ChatRole, build_messages, parse_quiz_reply};
pub use params::{DEFAULT_QUESTION_COUNT, Difficulty, MAX_QUESTION_COUNT, QuizParams};
pub use question::{QuestionPatch, QuestionType, QuizQuestion};
pub use quiz::{QuestionList, QuizData};
