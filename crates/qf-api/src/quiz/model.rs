use qf_core::{QuestionPatch, QuestionType, QuizParams, QuizQuestion, question::BLANK_QUESTION_TITLE};
use serde::Deserialize;
use validator::Validate;

use crate::validation::{validate_not_blank, validate_source_text};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(max = 200))]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameQuizRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
}

/// Question supplied by the client. Missing fields take the blank-question defaults.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AddQuestionRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<QuestionType>,
}

impl From<AddQuestionRequest> for QuizQuestion {
    fn from(req: AddQuestionRequest) -> Self {
        Self::new(
            req.title.unwrap_or_else(|| BLANK_QUESTION_TITLE.to_string()),
            req.description.unwrap_or_default(),
            req.kind.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<QuestionType>,
}

impl From<UpdateQuestionRequest> for QuestionPatch {
    fn from(req: UpdateQuestionRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            kind: req.kind,
        }
    }
}

/// Move the question at `source` to `destination`
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub source: usize,
    pub destination: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(custom(function = "validate_source_text"))]
    pub text: String,
    #[serde(flatten)]
    pub params: QuizParams,
}
