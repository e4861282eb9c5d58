use axum::Json;
use axum::extract::State;

use crate::api::models::*;
use crate::service::SharedState;

/// GET /device/info - Return device identity and active estimator
pub async fn get_device_info(State(state): State<SharedState>) -> Json<DeviceInfoResponse> {
    let state = state.read().await;

    Json(DeviceInfoResponse {
        device_type: "air_quality".to_string(),
        device_id: state.device_id.clone(),
        sensor: "BME680".to_string(),
        estimator: state.estimator.name().to_string(),
        readings_processed: state.readings_processed,
        exporting_metrics: state.is_exporting(),
    })
}
