use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a question added by hand.
pub const BLANK_QUESTION_TITLE: &str = "New question";

/// Kind of answer a question expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// A single line of free text
    #[default]
    #[serde(alias = "short-answer", alias = "short")]
    ShortAnswer,
    /// A paragraph of free text
    #[serde(alias = "long-answer", alias = "long")]
    LongAnswer,
    /// A rating out of 5
    #[serde(alias = "rating-out-of-5")]
    Rating,
}

impl QuestionType {
    /// Wire name of the type, as used in prompts and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShortAnswer => "short_answer",
            Self::LongAnswer => "long_answer",
            Self::Rating => "rating",
        }
    }
}

/// A single quiz question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Identifier, unique within its list
    #[serde(default)]
    pub id: String,
    /// Display text
    pub title: String,
    /// Free text shown under the title
    #[serde(default)]
    pub description: String,
    /// Expected answer kind
    #[serde(rename = "type", default)]
    pub kind: QuestionType,
}

impl QuizQuestion {
    /// Create a question with a freshly stamped identifier.
    pub fn new(title: impl Into<String>, description: impl Into<String>, kind: QuestionType) -> Self {
        Self {
            id: fresh_id(),
            title: title.into(),
            description: description.into(),
            kind,
        }
    }

    /// The question appended when a user adds one by hand.
    pub fn blank() -> Self {
        Self::new(BLANK_QUESTION_TITLE, String::new(), QuestionType::ShortAnswer)
    }

    /// Replace the identifier with a fresh one.
    pub fn restamp(&mut self) {
        self.id = fresh_id();
    }

    /// Apply a partial field edit. Fields left as `None` are kept.
    pub fn apply(&mut self, patch: QuestionPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
    }
}

/// Partial edit of a question's fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<QuestionType>,
}

impl QuestionPatch {
    /// Whether the patch changes nothing.
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.kind.is_none()
    }
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}
