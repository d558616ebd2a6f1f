use serde::{Deserialize, Serialize};

use crate::{
    error::QuizError,
    question::{QuestionPatch, QuizQuestion},
};

/// A generated quiz: a title plus its ordered questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizData {
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

/// Ordered list of questions being edited.
///
/// Every question in the list has a distinct `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionList {
    items: Vec<QuizQuestion>,
}

impl QuestionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[QuizQuestion] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuizQuestion> {
        self.items.iter()
    }

    pub fn get(&self, id: &str) -> Option<&QuizQuestion> {
        self.items.iter().find(|q| q.id == id)
    }

    /// Append a question. A colliding id is re-stamped first.
    pub fn add(&mut self, mut question: QuizQuestion) -> &QuizQuestion {
        if question.id.is_empty() || self.get(&question.id).is_some() {
            question.restamp();
        }
        self.items.push(question);
        &self.items[self.items.len() - 1]
    }

    /// Append the default hand-added question.
    pub fn add_blank(&mut self) -> &QuizQuestion {
        self.add(QuizQuestion::blank())
    }

    /// Edit the fields of the question with `id`.
    pub fn update(&mut self, id: &str, patch: QuestionPatch) -> Result<&QuizQuestion, QuizError> {
        let question = self
            .items
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| QuizError::QuestionNotFound(id.to_string()))?;
        question.apply(patch);
        Ok(question)
    }

    /// Delete the question with `id` and return it.
    pub fn remove(&mut self, id: &str) -> Result<QuizQuestion, QuizError> {
        let index = self
            .items
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| QuizError::QuestionNotFound(id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Move the item at `source` so that it ends up at `destination`.
    ///
    /// Both positions index the current list. On error the list is unchanged.
    pub fn reorder(&mut self, source: usize, destination: usize) -> Result<(), QuizError> {
        let len = self.items.len();
        for index in [source, destination] {
            if index >= len {
                return Err(QuizError::IndexOutOfRange { index, len });
            }
        }
        if source == destination {
            return Ok(());
        }

        let item = self.items.remove(source);
        self.items.insert(destination, item);
        Ok(())
    }

    /// Replace every question at once.
    pub fn replace(&mut self, questions: Vec<QuizQuestion>) {
        self.items.clear();
        for question in questions {
            self.add(question);
        }
    }
}

impl From<Vec<QuizQuestion>> for QuestionList {
    fn from(questions: Vec<QuizQuestion>) -> Self {
        let mut list = Self::new();
        list.replace(questions);
        list
    }
}

impl<'a> IntoIterator for &'a QuestionList {
    type Item = &'a QuizQuestion;
    type IntoIter = std::slice::Iter<'a, QuizQuestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
