use crate::domain::chat::{self, ChatAssessment, ChatError, ChatReply, InterviewState, Interviewer};
use crate::middleware::rate_limit_middleware;
use crate::services::chat_stream::{compose, paced};
use crate::state::{ChatSession, SharedState};
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Only the number of messages matters, so their shape is not checked.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreated {
    id: Uuid,
    state: InterviewState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    reply: String,
    assessment: Option<ChatAssessment>,
    question_count: usize,
    progress: f64,
    state: InterviewState,
}

/// Stateless streaming endpoint mounted under `/api`.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(stream_reply))
        .route_layer(middleware::from_fn_with_state(
            state.chat_limiter.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Scripted interview sessions mounted under `/chat`.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/:id/messages", post(send_message))
        .route_layer(middleware::from_fn_with_state(
            state.chat_limiter.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

fn processing_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to process request" })),
    )
        .into_response()
}

async fn stream_reply(State(state): State<SharedState>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!("Chat API error: {}", e);
            return processing_failed();
        }
    };

    tokio::time::sleep(state.config.response_delay).await;

    let reply = chat::api_reply(request.messages.len(), &mut rand::thread_rng());
    let text = match compose(&reply) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Chat API error: {}", e);
            return processing_failed();
        }
    };

    tracing::debug!(
        "Streaming reply for {} messages (assessment: {})",
        request.messages.len(),
        reply.assessment.is_some()
    );

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(paced(&text, state.config.word_delay)),
    )
        .into_response()
}

async fn open_session(State(state): State<SharedState>) -> (StatusCode, Json<SessionCreated>) {
    let id = Uuid::new_v4();
    state.chat_sessions.write().await.insert(
        id,
        ChatSession {
            interviewer: Interviewer::new(),
            last_active: Utc::now(),
        },
    );
    tracing::info!("Chat session {} opened", id);

    (
        StatusCode::CREATED,
        Json(SessionCreated {
            id,
            state: InterviewState::Interviewing,
        }),
    )
}

async fn send_message(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MessagePayload>,
) -> Result<Json<MessageResponse>, StatusCode> {
    if payload.content.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !state.chat_sessions.read().await.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }

    tokio::time::sleep(state.config.typing_delay).await;

    let mut sessions = state.chat_sessions.write().await;
    // Pruned while we were "typing".
    let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let ChatReply { text, assessment } = session
        .interviewer
        .respond(&payload.content, &mut rand::thread_rng())
        .map_err(|e| match e {
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
        })?;
    session.last_active = Utc::now();

    let interviewer = &session.interviewer;
    if assessment.is_some() {
        tracing::info!("Chat session {} concluded after {} turns", id, interviewer.turns());
    }

    Ok(Json(MessageResponse {
        reply: text,
        assessment,
        question_count: interviewer.turns(),
        progress: interviewer.progress(),
        state: interviewer.state(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::domain::chat::{
        API_FIRST_FOLLOW_UP, API_SECOND_FOLLOW_UP, API_SUMMARY, CONCLUSION, TURN_THRESHOLD,
    };
    use crate::services::chat_stream::{decode_body, split_assessment};
    use crate::state::AppState;
    use crate::web::routes;
    use crate::web::test_support::{send, send_json, state};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;
    use tower::ServiceExt;

    fn conversation(n: usize) -> serde_json::Value {
        let messages: Vec<_> = (0..n)
            .map(|i| {
                let role = if i % 2 == 0 { "user" } else { "assistant" };
                json!({ "role": role, "content": format!("message {i}") })
            })
            .collect();
        json!({ "messages": messages })
    }

    #[tokio::test]
    async fn stream_headers_and_follow_ups() {
        let app = routes(state());
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(conversation(1).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["cache-control"], "no-cache");
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.lines().all(|l| l.starts_with("0:{\"content\":")));
        assert_eq!(decode_body(&body).unwrap(), API_FIRST_FOLLOW_UP);

        let (_, body) = send(&app, "POST", "/api/chat", Some(conversation(2))).await;
        assert_eq!(decode_body(&body).unwrap(), API_SECOND_FOLLOW_UP);

        let empty = json!({ "messages": [] });
        let (_, body) = send(&app, "POST", "/api/chat", Some(empty)).await;
        assert_eq!(decode_body(&body).unwrap(), API_SECOND_FOLLOW_UP);
    }

    #[tokio::test]
    async fn third_message_streams_an_assessment() {
        let app = routes(state());
        let (status, body) = send(&app, "POST", "/api/chat", Some(conversation(3))).await;
        assert_eq!(status, StatusCode::OK);

        let text = decode_body(&body).unwrap();
        let (visible, assessment) = split_assessment(&text).unwrap();
        assert_eq!(visible, API_SUMMARY);
        let assessment = assessment.unwrap();
        assert!((30..70).contains(&assessment.stress_level));
        assert!((25..60).contains(&assessment.anxiety_level));
        assert!((60..90).contains(&assessment.overall_wellbeing));
        assert_eq!(assessment.recommendations.len(), 4);
    }

    #[tokio::test]
    async fn malformed_request_is_a_500() {
        let app = routes(state());
        let malformed = json!({ "msgs": 1 });
        let (status, body) = send_json(&app, "POST", "/api/chat", Some(malformed)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Failed to process request" }));
    }

    #[tokio::test]
    async fn message_shape_is_not_checked() {
        let app = routes(state());
        let bare = json!({ "messages": [{}] });
        let (status, body) = send(&app, "POST", "/api/chat", Some(bare)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decode_body(&body).unwrap(), API_FIRST_FOLLOW_UP);

        let loose = json!({ "messages": [{ "role": "system" }, { "content": 3 }] });
        let (status, body) = send(&app, "POST", "/api/chat", Some(loose)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decode_body(&body).unwrap(), API_SECOND_FOLLOW_UP);
    }

    #[tokio::test(start_paused = true)]
    async fn first_frame_waits_for_the_response_delay() {
        let app = routes(Arc::new(AppState::new(AppConfig {
            response_delay: Duration::from_millis(1_000),
            word_delay: Duration::from_millis(50),
            ..AppConfig::default()
        })));
        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(conversation(1).to_string()))
            .unwrap();

        let started = Instant::now();
        let response = app.oneshot(request).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1_000));

        let mut frames = response.into_body().into_data_stream();
        let mut arrivals = Vec::new();
        while let Some(chunk) = frames.next().await {
            chunk.unwrap();
            arrivals.push(started.elapsed().as_millis());
        }
        assert_eq!(arrivals.len(), API_FIRST_FOLLOW_UP.split(' ').count());
        assert!((1_000..1_010).contains(&arrivals[0]));
        for pair in arrivals.windows(2) {
            assert!((50..55).contains(&(pair[1] - pair[0])));
        }
    }

    #[tokio::test]
    async fn rate_limit_applies_to_the_stream() {
        let app = routes(Arc::new(AppState::new(AppConfig {
            response_delay: Duration::ZERO,
            word_delay: Duration::ZERO,
            chat_rate_limit: 2,
            ..AppConfig::default()
        })));
        for _ in 0..2 {
            let (status, _) = send(&app, "POST", "/api/chat", Some(conversation(1))).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = send(&app, "POST", "/api/chat", Some(conversation(1))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn session_interviews_then_concludes() {
        let app = routes(state());
        let (status, created) = send_json(&app, "POST", "/chat/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["state"], "interviewing");
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/chat/sessions/{id}/messages");

        for turn in 1..=TURN_THRESHOLD {
            let message = json!({ "content": "I feel tired" });
            let (status, body) = send_json(&app, "POST", &uri, Some(message)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["questionCount"], turn);
            assert!(body["assessment"].is_null());
        }

        let last = json!({ "content": "that's all" });
        let (_, body) = send_json(&app, "POST", &uri, Some(last)).await;
        assert_eq!(body["state"], "concluded");
        assert_eq!(body["reply"], CONCLUSION);
        assert_eq!(body["assessment"]["recommendations"].as_array().unwrap().len(), 6);
        assert_eq!(body["questionCount"], TURN_THRESHOLD);
    }

    #[tokio::test]
    async fn session_rejects_blank_and_unknown() {
        let app = routes(state());
        let (_, created) = send_json(&app, "POST", "/chat/sessions", None).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            "POST",
            &format!("/chat/sessions/{id}/messages"),
            Some(json!({ "content": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/chat/sessions/{}/messages", uuid::Uuid::new_v4()),
            Some(json!({ "content": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
