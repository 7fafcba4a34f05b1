use crate::domain::questionnaire::{
    self, level_label, AnswerError, AnswerSet, AssessmentResult, Question, Questionnaire, QUESTIONS,
};
use crate::state::{QuestionnaireSession, SharedState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ScorePayload {
    answers: AnswerSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    #[serde(flatten)]
    result: AssessmentResult,
    stress_label: &'static str,
    anxiety_label: &'static str,
}

impl From<AssessmentResult> for ScoreResponse {
    fn from(result: AssessmentResult) -> Self {
        Self {
            stress_label: level_label(result.stress_level),
            anxiety_label: level_label(result.anxiety_level),
            result,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerPayload {
    question_id: u32,
    value: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionnaireView {
    id: Uuid,
    current_index: usize,
    total: usize,
    progress: f64,
    question: &'static Question,
    selected: Option<u8>,
    is_answered: bool,
    answered_count: usize,
    result: Option<ScoreResponse>,
}

impl QuestionnaireView {
    fn new(id: Uuid, q: &Questionnaire) -> Self {
        let question = q.current_question();
        Self {
            id,
            current_index: q.current_index(),
            total: QUESTIONS.len(),
            progress: q.progress(),
            question,
            selected: q.answers().get(question.id),
            is_answered: q.is_answered(),
            answered_count: q.answers().len(),
            result: q.result().cloned().map(ScoreResponse::from),
        }
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/questions", get(list_questions))
        .route("/score", post(score))
        .route("/sessions", post(open_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/answers", put(record_answer))
        .route("/sessions/:id/next", post(next_question))
        .route("/sessions/:id/previous", post(previous_question))
        .route("/sessions/:id/restart", post(restart))
        .with_state(state)
}

fn answer_rejection(e: AnswerError) -> StatusCode {
    tracing::warn!("Rejected answer: {}", e);
    StatusCode::BAD_REQUEST
}

async fn list_questions() -> Json<&'static [Question]> {
    Json(QUESTIONS)
}

async fn score(Json(payload): Json<ScorePayload>) -> Result<Json<ScoreResponse>, StatusCode> {
    payload.answers.validate().map_err(answer_rejection)?;
    let result = questionnaire::score(&payload.answers);
    tracing::info!(
        "Scored questionnaire: {} answers, risk {:?}",
        payload.answers.len(),
        result.risk_level
    );
    Ok(Json(result.into()))
}

async fn open_session(State(state): State<SharedState>) -> (StatusCode, Json<QuestionnaireView>) {
    let id = Uuid::new_v4();
    let questionnaire = Questionnaire::new();
    let view = QuestionnaireView::new(id, &questionnaire);
    state.questionnaires.write().await.insert(
        id,
        QuestionnaireSession {
            questionnaire,
            last_active: Utc::now(),
        },
    );
    (StatusCode::CREATED, Json(view))
}

/// Runs `f` against the session and returns the refreshed view.
async fn with_session<F>(
    state: &SharedState,
    id: Uuid,
    f: F,
) -> Result<Json<QuestionnaireView>, StatusCode>
where
    F: FnOnce(&mut Questionnaire) -> Result<(), StatusCode>,
{
    let mut sessions = state.questionnaires.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    f(&mut session.questionnaire)?;
    session.last_active = Utc::now();
    Ok(Json(QuestionnaireView::new(id, &session.questionnaire)))
}

async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionnaireView>, StatusCode> {
    let sessions = state.questionnaires.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(QuestionnaireView::new(id, &session.questionnaire)))
}

async fn record_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnswerPayload>,
) -> Result<Json<QuestionnaireView>, StatusCode> {
    with_session(&state, id, |q| {
        q.answer(payload.question_id, payload.value).map_err(answer_rejection)
    })
    .await
}

async fn next_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionnaireView>, StatusCode> {
    with_session(&state, id, |q| {
        if let Some(result) = q.next() {
            tracing::info!("Questionnaire {} finished with {:?} risk", id, result.risk_level);
        }
        Ok(())
    })
    .await
}

async fn previous_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionnaireView>, StatusCode> {
    with_session(&state, id, |q| {
        q.previous();
        Ok(())
    })
    .await
}

async fn restart(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionnaireView>, StatusCode> {
    with_session(&state, id, |q| {
        q.restart();
        Ok(())
    })
    .await
}
