use axum::Json;
use axum::extract::State;

use crate::processing::estimator::Assessment;
use crate::service::SharedState;

/// GET /air_quality/latest - Most recent assessment, null before the first reading
pub async fn get_latest(State(state): State<SharedState>) -> Json<Option<Assessment>> {
    let state = state.read().await;

    Json(state.latest.clone())
}
