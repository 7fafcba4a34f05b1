use crate::domain::resources::{library, CrisisLine, ResourceCategory, CRISIS_LINES};
use axum::{routing::get, Json, Router};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_library))
        .route("/crisis", get(crisis_lines))
}

async fn list_library() -> Json<Vec<ResourceCategory>> {
    Json(library())
}

async fn crisis_lines() -> Json<&'static [CrisisLine]> {
    Json(CRISIS_LINES)
}
