use std::fmt;

use serde::{Deserialize, Serialize};

/// Question count used when the requested one is missing or invalid.
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

/// Largest number of questions a single generation may ask for.
pub const MAX_QUESTION_COUNT: u32 = 50;

/// Difficulty level of a generated quiz
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a generation request.
///
/// The question count is always usable: invalid input is replaced with
/// [`DEFAULT_QUESTION_COUNT`] and oversized input is capped at [`MAX_QUESTION_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawQuizParams")]
pub struct QuizParams {
    pub difficulty: Difficulty,
    pub question_count: u32,
}

impl QuizParams {
    /// Build parameters from a possibly invalid raw count.
    pub fn new(difficulty: Difficulty, raw_count: Option<i64>) -> Self {
        Self {
            difficulty,
            question_count: sanitize_count(raw_count),
        }
    }
}

impl Default for QuizParams {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            question_count: DEFAULT_QUESTION_COUNT,
        }
    }
}

fn sanitize_count(raw: Option<i64>) -> u32 {
    match raw {
        Some(n) if n > 0 => u32::try_from(n)
            .unwrap_or(MAX_QUESTION_COUNT)
            .min(MAX_QUESTION_COUNT),
        _ => DEFAULT_QUESTION_COUNT,
    }
}

/// Loose wire form: form fields often arrive as strings.
#[derive(Deserialize)]
struct RawQuizParams {
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(default)]
    question_count: Option<RawCount>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl RawCount {
    fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<RawQuizParams> for QuizParams {
    fn from(raw: RawQuizParams) -> Self {
        Self::new(
            raw.difficulty,
            raw.question_count.as_ref().and_then(RawCount::as_int),
        )
    }
}
