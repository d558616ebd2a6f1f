use std::time::Instant;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
};
use qf_core::{QuizQuestion, QuestionPatch};
use uuid::Uuid;
use validator::Validate;

use crate::{
    ApiState,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    metrics::record_generation_event,
    middleware::rate_limit,
    store::QuizDraft,
    token::resolve_token,
};

use super::model::{
    AddQuestionRequest, CreateQuizRequest, GenerateQuizRequest, RenameQuizRequest,
    ReorderRequest, UpdateQuestionRequest,
};

/// Create the quiz routes
pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    let editing_routes = Router::new()
        .route("/quizzes", post(create_quiz))
        .route(
            "/quizzes/{id}",
            get(get_quiz).patch(rename_quiz).delete(delete_quiz),
        )
        .route("/quizzes/{id}/questions", post(add_question))
        .route("/quizzes/{id}/questions/reorder", post(reorder_questions))
        .route(
            "/quizzes/{id}/questions/{question_id}",
            patch(update_question).delete(delete_question),
        );

    // Every generation costs an upstream call
    let generation_routes = Router::new()
        .route("/quizzes/{id}/generate", post(generate_questions))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERATION_RATE_PER_SECOND,
            rate_limit::GENERATION_BURST_SIZE
        ));

    Router::new().merge(editing_routes).merge(generation_routes)
}

async fn create_quiz(
    State(state): State<ApiState>,
    ApiJson(payload): ApiJson<CreateQuizRequest>,
) -> Result<(StatusCode, Json<QuizDraft>), ApiError> {
    payload.validate()?;

    let draft = state.drafts.create(payload.title);
    Ok((StatusCode::CREATED, Json(draft)))
}

async fn get_quiz(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<QuizDraft>, ApiError> {
    state.drafts.get(id).map(Json)
}

async fn rename_quiz(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<RenameQuizRequest>,
) -> Result<Json<QuizDraft>, ApiError> {
    payload.validate()?;

    let ((), draft) = state.drafts.update(id, |draft| {
        draft.title = payload.title.trim().to_string();
        Ok(())
    })?;
    Ok(Json(draft))
}

async fn delete_quiz(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.drafts.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_question(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddQuestionRequest>,
) -> Result<(StatusCode, Json<QuizQuestion>), ApiError> {
    payload.validate()?;

    let (question, _) = state
        .drafts
        .update(id, |draft| Ok(draft.questions.add(payload.into()).clone()))?;
    Ok((StatusCode::CREATED, Json(question)))
}

async fn update_question(
    State(state): State<ApiState>,
    ApiPath((id, question_id)): ApiPath<(Uuid, String)>,
    ApiJson(payload): ApiJson<UpdateQuestionRequest>,
) -> Result<Json<QuizQuestion>, ApiError> {
    payload.validate()?;

    let patch = QuestionPatch::from(payload);
    let (question, _) = state.drafts.update(id, |draft| {
        Ok(draft.questions.update(&question_id, patch)?.clone())
    })?;
    Ok(Json(question))
}

async fn delete_question(
    State(state): State<ApiState>,
    ApiPath((id, question_id)): ApiPath<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .drafts
        .update(id, |draft| {
            draft
                .questions
                .remove(&question_id)
                .map_err(ApiError::from)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_questions(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ReorderRequest>,
) -> Result<Json<QuizDraft>, ApiError> {
    let ((), draft) = state.drafts.update(id, |draft| {
        draft
            .questions
            .reorder(payload.source, payload.destination)
            .map_err(ApiError::from)
    })?;
    Ok(Json(draft))
}

/// Replace the draft's title and questions with a generated quiz.
///
/// On any failure the draft keeps its previous content.
async fn generate_questions(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<GenerateQuizRequest>,
) -> Result<Json<QuizDraft>, ApiError> {
    payload.validate()?;
    let token = resolve_token(&headers, state.fallback_token.as_deref())?;

    let guard = state.drafts.begin_generation(id)?;
    let start = Instant::now();

    let result = state
        .chat
        .generate_quiz(&token, &payload.text, &payload.params, state.max_source_chars)
        .await;
    record_generation_event(result.is_ok(), start.elapsed().as_secs_f64());

    let quiz = result?;
    let draft = state.drafts.finish_generation(guard, quiz)?;

    tracing::info!(
        quiz_id = %draft.id,
        questions = draft.questions.len(),
        "Generated quiz questions"
    );
    Ok(Json(draft))
}
