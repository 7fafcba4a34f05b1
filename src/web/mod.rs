pub mod assessment;
pub mod chat;
pub mod exercises;
pub mod resources;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", chat::api_router(state.clone()))
        .nest("/chat", chat::router(state.clone()))
        .nest("/assessment", assessment::router(state.clone()))
        .nest("/resources", resources::router())
        .merge(exercises::router(state))
}


#[cfg(test)]
mod tests {
    use super::test_support::{send, state};
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn health_is_ok() {
        let app = routes(state());
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = routes(state());
        let (status, _) = send(&app, "GET", "/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
