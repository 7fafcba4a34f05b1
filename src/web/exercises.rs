use crate::domain::exercise::{
    catalog, find_exercise, Exercise, ExercisePlayer, ExerciseSummary, PlayerError, PlayerStatus,
    PlayerView,
};
use crate::services::exercise_runtime::ExerciseSession;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FEEDBACK_THANKS: &str = "Thank you for your feedback! It helps us improve the exercises.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionOpened {
    id: Uuid,
    #[serde(flatten)]
    view: PlayerView,
}

#[derive(Debug, Deserialize)]
struct FeedbackPayload {
    rating: u8,
    #[serde(default)]
    feedback: String,
}

#[derive(Debug, Serialize)]
struct FeedbackAck {
    message: &'static str,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/exercises", get(list_exercises))
        .route("/exercises/:slug", get(get_exercise))
        .route("/exercises/:slug/sessions", post(open_session))
        .route("/exercise-sessions/:id", get(view_session).delete(close_session))
        .route("/exercise-sessions/:id/start", post(start))
        .route("/exercise-sessions/:id/pause", post(pause))
        .route("/exercise-sessions/:id/resume", post(resume))
        .route("/exercise-sessions/:id/reset", post(reset))
        .route("/exercise-sessions/:id/audio", post(toggle_audio))
        .route("/exercise-sessions/:id/feedback", post(submit_feedback))
        .with_state(state)
}

fn transition_rejected(e: PlayerError) -> StatusCode {
    tracing::warn!("Exercise control rejected: {}", e);
    StatusCode::CONFLICT
}

async fn list_exercises() -> Json<Vec<ExerciseSummary>> {
    Json(catalog().map(ExerciseSummary::from).collect())
}

async fn get_exercise(Path(slug): Path<String>) -> Result<Json<&'static Exercise>, StatusCode> {
    find_exercise(&slug).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn open_session(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<(StatusCode, Json<SessionOpened>), StatusCode> {
    let exercise = find_exercise(&slug).ok_or(StatusCode::NOT_FOUND)?;
    let session = ExerciseSession::new(ExercisePlayer::new(exercise, state.narrator.clone()));
    let view = session.view().await;

    let id = Uuid::new_v4();
    state.exercise_sessions.write().await.insert(id, session);
    tracing::info!("Exercise session {} opened for {}", id, exercise.slug);

    Ok((StatusCode::CREATED, Json(SessionOpened { id, view })))
}

async fn view_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, StatusCode> {
    let sessions = state.exercise_sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(session.view().await))
}

async fn close_session(State(state): State<SharedState>, Path(id): Path<Uuid>) -> StatusCode {
    match state.exercise_sessions.write().await.remove(&id) {
        Some(_) => {
            tracing::info!("Exercise session {} closed", id);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn start(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, StatusCode> {
    let mut sessions = state.exercise_sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    session.start().await.map(Json).map_err(transition_rejected)
}

async fn pause(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, StatusCode> {
    let mut sessions = state.exercise_sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    session.pause().await.map(Json).map_err(transition_rejected)
}

async fn resume(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, StatusCode> {
    let mut sessions = state.exercise_sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    session.resume().await.map(Json).map_err(transition_rejected)
}

async fn reset(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, StatusCode> {
    let mut sessions = state.exercise_sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(session.reset().await))
}

async fn toggle_audio(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, StatusCode> {
    let mut sessions = state.exercise_sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(session.toggle_audio().await))
}

/// Ratings are logged only. Nothing is persisted.
async fn submit_feedback(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FeedbackPayload>,
) -> Result<Json<FeedbackAck>, StatusCode> {
    if !(1..=5).contains(&payload.rating) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let sessions = state.exercise_sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let view = session.view().await;
    if view.status != PlayerStatus::Completed {
        return Err(StatusCode::CONFLICT);
    }

    tracing::info!(
        "Feedback for {}: {} stars, {} chars of text",
        view.slug,
        payload.rating,
        payload.feedback.trim().chars().count()
    );
    Ok(Json(FeedbackAck {
        message: FEEDBACK_THANKS,
    }))
}

#[cfg(test)]
mod tests {
    use super::FEEDBACK_THANKS;
    use crate::web::routes;
    use crate::web::test_support::{send_json, state};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn catalog_lists_and_resolves_aliases() {
        let app = routes(state());
        let (status, list) = send_json(&app, "GET", "/exercises", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 4);

        let (status, exercise) = send_json(&app, "GET", "/exercises/deep-breathing", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(exercise["slug"], "deep-breathing-exercises");
        assert!(exercise["guidedSteps"].as_array().unwrap().len() > 1);

        let (status, _) = send_json(&app, "GET", "/exercises/juggling", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn controls_follow_the_player_rules() {
        let app = routes(state());
        let open = "/exercises/mindfulness-for-beginners/sessions";
        let (status, opened) = send_json(&app, "POST", open, None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(opened["status"], "idle");
        assert_eq!(opened["clock"], "Ready to start");
        let base = format!("/exercise-sessions/{}", opened["id"].as_str().unwrap());

        let (status, _) = send_json(&app, "POST", &format!("{base}/pause"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, view) = send_json(&app, "POST", &format!("{base}/start"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["status"], "running");
        assert_eq!(view["currentStep"], 0);
        assert!(view["utterance"]["text"].is_string());

        let (status, _) = send_json(&app, "POST", &format!("{base}/start"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, view) = send_json(&app, "POST", &format!("{base}/audio"), None).await;
        assert_eq!(view["audioEnabled"], false);
        assert!(view["utterance"].is_null());

        let (_, view) = send_json(&app, "POST", &format!("{base}/pause"), None).await;
        assert_eq!(view["status"], "paused");
        let (_, view) = send_json(&app, "POST", &format!("{base}/resume"), None).await;
        assert_eq!(view["status"], "running");
        let (_, view) = send_json(&app, "POST", &format!("{base}/reset"), None).await;
        assert_eq!(view["status"], "idle");
        assert_eq!(view["timeRemaining"], 0);

        let (status, _) = send_json(&app, "DELETE", &base, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send_json(&app, "GET", &base, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn feedback_only_after_completion() {
        let app = routes(state());
        let (_, opened) = send_json(&app, "POST", "/exercises/deep-breathing/sessions", None).await;
        let base = format!("/exercise-sessions/{}", opened["id"].as_str().unwrap());
        let feedback = json!({ "rating": 5, "feedback": "Calming" });

        let feedback_uri = format!("{base}/feedback");
        let (status, _) = send_json(&app, "POST", &feedback_uri, Some(feedback.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        send_json(&app, "POST", &format!("{base}/start"), None).await;
        tokio::time::sleep(Duration::from_secs(45)).await;

        let (_, view) = send_json(&app, "GET", &base, None).await;
        assert_eq!(view["status"], "completed");
        assert_eq!(view["heading"], "Exercise Complete!");

        let unrated = json!({ "rating": 0 });
        let (status, _) = send_json(&app, "POST", &feedback_uri, Some(unrated)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, ack) = send_json(&app, "POST", &feedback_uri, Some(feedback)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["message"], FEEDBACK_THANKS);
    }

    #[tokio::test]
    async fn unknown_sessions_are_404() {
        let app = routes(state());
        let (status, _) = send_json(&app, "POST", "/exercises/juggling/sessions", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send_json(
            &app,
            "POST",
            &format!("/exercise-sessions/{}/start", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
