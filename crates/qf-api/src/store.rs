//! In-memory quiz drafts.
//!
//! Drafts only live as long as the process (and are evicted once idle); nothing is
//! persisted. The map lock is never held across an `.await`.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::{DateTime, Duration, Utc};
use qf_core::{QuestionList, QuizData};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Title of a draft created without one
pub const UNTITLED_QUIZ: &str = "Untitled quiz";

/// A quiz being authored
#[derive(Debug, Clone, Serialize)]
pub struct QuizDraft {
    pub id: Uuid,
    pub title: String,
    pub questions: QuestionList,
    /// Set while a generation request is in flight
    pub generating: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuizDraft {
    fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            questions: QuestionList::new(),
            generating: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Clone, Debug, Default)]
pub struct DraftStore {
    drafts: Arc<RwLock<HashMap<Uuid, QuizDraft>>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, QuizDraft>> {
        self.drafts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, QuizDraft>> {
        self.drafts.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn create(&self, title: Option<String>) -> QuizDraft {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED_QUIZ.to_string());
        let draft = QuizDraft::new(title);
        self.write().insert(draft.id, draft.clone());
        tracing::debug!(quiz_id = %draft.id, "Created quiz draft");
        draft
    }

    pub fn get(&self, id: Uuid) -> Result<QuizDraft, ApiError> {
        self.read().get(&id).cloned().ok_or(ApiError::QuizNotFound(id))
    }

    pub fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.write()
            .remove(&id)
            .map(|_| ())
            .ok_or(ApiError::QuizNotFound(id))
    }

    /// Run `edit` on the draft and return its result with a snapshot of the draft.
    ///
    /// `updated_at` is only bumped when `edit` succeeds.
    pub fn update<T>(
        &self,
        id: Uuid,
        edit: impl FnOnce(&mut QuizDraft) -> Result<T, ApiError>,
    ) -> Result<(T, QuizDraft), ApiError> {
        let mut drafts = self.write();
        let draft = drafts.get_mut(&id).ok_or(ApiError::QuizNotFound(id))?;
        let output = edit(draft)?;
        draft.touch();
        Ok((output, draft.clone()))
    }

    /// Mark the draft as generating.
    ///
    /// Fails when a generation is already in flight for it. The returned guard clears the
    /// flag when dropped, whether or not the generation succeeded.
    pub fn begin_generation(&self, id: Uuid) -> Result<GenerationGuard, ApiError> {
        let mut drafts = self.write();
        let draft = drafts.get_mut(&id).ok_or(ApiError::QuizNotFound(id))?;
        if draft.generating {
            return Err(ApiError::GenerationInProgress(id));
        }
        draft.generating = true;

        Ok(GenerationGuard {
            store: self.clone(),
            id,
        })
    }

    /// Replace the draft's title and questions with a generated quiz.
    pub fn finish_generation(
        &self,
        guard: GenerationGuard,
        quiz: QuizData,
    ) -> Result<QuizDraft, ApiError> {
        let id = guard.id;
        let mut drafts = self.write();
        let draft = drafts.get_mut(&id).ok_or(ApiError::QuizNotFound(id))?;

        draft.title = quiz.title;
        draft.questions.replace(quiz.questions);
        draft.generating = false;
        draft.touch();
        let snapshot = draft.clone();

        // The flag is already cleared; release the lock before the guard's drop runs.
        drop(drafts);
        drop(guard);
        Ok(snapshot)
    }

    /// Remove drafts not updated within `ttl`. Drafts with a generation in flight are kept.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let mut drafts = self.write();
        let before = drafts.len();
        drafts.retain(|_, draft| draft.generating || draft.updated_at >= cutoff);
        before - drafts.len()
    }

    fn clear_generating(&self, id: Uuid) {
        if let Some(draft) = self.write().get_mut(&id) {
            draft.generating = false;
        }
    }
}

/// Holds a draft's generation flag
#[derive(Debug)]
pub struct GenerationGuard {
    store: DraftStore,
    id: Uuid,
}

impl GenerationGuard {
    pub fn quiz_id(&self) -> Uuid {
        self.id
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.store.clear_generating(self.id);
    }
}
