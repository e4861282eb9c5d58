use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

use crate::processing::baseline::{BaselineInfo, CalibrationPhase};

// ============= Device Endpoints =============

#[derive(Debug, Serialize)]
pub struct DeviceInfoResponse {
    #[serde(rename = "type")]
    pub device_type: String,
    pub device_id: String,
    pub sensor: String,
    pub estimator: String,
    pub readings_processed: u64,
    pub exporting_metrics: bool,
}

// ============= Baseline Endpoints =============

#[derive(Debug, Serialize)]
pub struct BaselineActionResponse {
    pub status: String,
    pub phase: CalibrationPhase,
    pub baseline: BaselineInfo,
}

// ============= Error Response =============

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn conflict(message: impl Into<String>) -> ApiError {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
