use axum::Router;
use axum::routing::{get, post};

use super::handlers::{air_quality, baseline, device};
use crate::service::SharedState;

/// Create the API router with all endpoints
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // Device info
        .route("/device/info", get(device::get_device_info))
        // Readings
        .route("/air_quality/latest", get(air_quality::get_latest))
        // Baseline calibration
        .route("/baseline", get(baseline::get_baseline))
        .route("/baseline/lock", post(baseline::lock_baseline))
        .route("/baseline/unlock", post(baseline::unlock_baseline))
        .route("/baseline/reset", post(baseline::reset_baseline))
        .route("/baseline/force_complete", post(baseline::force_complete))
        // Add state to all routes
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use super::*;
    use crate::error::AirQualityError;
    use crate::processing::estimator::{AirQualityEstimator, Assessment};
    use crate::protocol::SensorSample;
    use crate::service::state::{create_shared_state, test_state};

    /// Estimator without a baseline state machine
    struct PassthroughEstimator;

    impl AirQualityEstimator for PassthroughEstimator {
        fn assess(&mut self, _sample: &SensorSample) -> Result<Assessment, AirQualityError> {
            Err(AirQualityError::InvalidReading("unsupported".to_string()))
        }

        fn name(&self) -> &'static str {
            "Passthrough"
        }
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_device_info_route() {
        let app = create_router(test_state(3));

        let (status, body) = send(app, "GET", "/device/info").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "air_quality");
        assert_eq!(body["device_id"], "test_device");
    }

    #[tokio::test]
    async fn test_latest_is_null_before_first_reading() {
        let app = create_router(test_state(3));

        let (status, body) = send(app, "GET", "/air_quality/latest").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn test_baseline_route() {
        let app = create_router(test_state(3));

        let (status, body) = send(app, "GET", "/baseline").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "collecting");
        assert_eq!(body["readings_count"], 0);
        assert_eq!(body["min_readings_for_baseline"], 3);
    }

    #[tokio::test]
    async fn test_lock_route_conflicts_without_baseline() {
        let app = create_router(test_state(3));

        let (status, body) = send(app, "POST", "/baseline/lock").await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("No baseline"));
    }

    #[tokio::test]
    async fn test_reset_route() {
        let app = create_router(test_state(3));

        let (status, body) = send(app, "POST", "/baseline/reset").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "reset");
        assert_eq!(body["phase"], "collecting");
    }

    #[tokio::test]
    async fn test_baseline_routes_conflict_without_baseline_estimator() {
        let state = create_shared_state(
            "test_device".to_string(),
            None,
            Box::new(PassthroughEstimator),
        );

        let (status, _) = send(create_router(state.clone()), "GET", "/baseline").await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(create_router(state), "POST", "/baseline/unlock").await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_lock_requires_post() {
        let app = create_router(test_state(3));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/baseline/lock")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
