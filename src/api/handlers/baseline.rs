use axum::Json;
use axum::extract::State;

use crate::api::models::*;
use crate::processing::baseline::{BaselineEstimator, BaselineInfo};
use crate::service::SharedState;

const NO_BASELINE_ESTIMATOR: &str = "Active estimator has no baseline calibration";

fn action_response(status: &str, estimator: &BaselineEstimator) -> Json<BaselineActionResponse> {
    Json(BaselineActionResponse {
        status: status.to_string(),
        phase: estimator.phase(),
        baseline: estimator.baseline_info(),
    })
}

/// GET /baseline - Calibration diagnostics
pub async fn get_baseline(State(state): State<SharedState>) -> Result<Json<BaselineInfo>, ApiError> {
    let state = state.read().await;

    let estimator = state
        .estimator
        .baseline()
        .ok_or_else(|| conflict(NO_BASELINE_ESTIMATOR))?;

    Ok(Json(estimator.baseline_info()))
}

/// POST /baseline/lock - Freeze the current baseline
pub async fn lock_baseline(
    State(state): State<SharedState>,
) -> Result<Json<BaselineActionResponse>, ApiError> {
    let mut state = state.write().await;

    let estimator = state
        .estimator
        .baseline_mut()
        .ok_or_else(|| conflict(NO_BASELINE_ESTIMATOR))?;

    if !estimator.lock() {
        return Err(conflict("No baseline established yet"));
    }

    Ok(action_response("locked", estimator))
}

/// POST /baseline/unlock - Resume rolling recomputation
pub async fn unlock_baseline(
    State(state): State<SharedState>,
) -> Result<Json<BaselineActionResponse>, ApiError> {
    let mut state = state.write().await;

    let estimator = state
        .estimator
        .baseline_mut()
        .ok_or_else(|| conflict(NO_BASELINE_ESTIMATOR))?;

    estimator.unlock();

    Ok(action_response("unlocked", estimator))
}

/// POST /baseline/reset - Discard calibration and start collecting again
pub async fn reset_baseline(
    State(state): State<SharedState>,
) -> Result<Json<BaselineActionResponse>, ApiError> {
    let mut state = state.write().await;

    let estimator = state
        .estimator
        .baseline_mut()
        .ok_or_else(|| conflict(NO_BASELINE_ESTIMATOR))?;

    estimator.reset();

    Ok(action_response("reset", estimator))
}

/// POST /baseline/force_complete - Mark calibration complete without locking
pub async fn force_complete(
    State(state): State<SharedState>,
) -> Result<Json<BaselineActionResponse>, ApiError> {
    let mut state = state.write().await;

    let estimator = state
        .estimator
        .baseline_mut()
        .ok_or_else(|| conflict(NO_BASELINE_ESTIMATOR))?;

    if !estimator.force_complete() {
        return Err(conflict("No baseline established yet"));
    }

    Ok(action_response("calibration_complete", estimator))
}
