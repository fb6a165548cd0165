//! HTTP boundary for the scoring service.
//!
//! `GET /health` answers liveness. `POST /predict` scores one JSON record.

use crate::error::{PredictionError, PredictionErrorKind};
use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::prediction::PredictionOutput;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error};

/// Detail returned for every scoring failure; the cause is only logged
pub const SCORING_FAILURE_DETAIL: &str = "prediction failed";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: InferenceEngine,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(engine: InferenceEngine) -> Self {
        Self {
            engine,
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Failure of a request at the boundary
#[derive(Debug)]
pub enum ApiError {
    /// Body was not parseable JSON
    MalformedBody(String),
    Prediction(PredictionError),
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        ApiError::Prediction(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::MalformedBody(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Prediction(PredictionError::InvalidInput(validation)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, validation.to_string())
            }
            ApiError::Prediction(PredictionError::ScoringFailure { .. }) => {
                (StatusCode::BAD_REQUEST, SCORING_FAILURE_DETAIL.to_string())
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Build the service router
pub fn router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionOutput>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        state.metrics.record_error(PredictionErrorKind::InvalidInput);
        debug!(error = %rejection.body_text(), "Unparseable request body");
        ApiError::MalformedBody(rejection.body_text())
    })?;

    if !body.is_object() {
        state.metrics.record_error(PredictionErrorKind::InvalidInput);
        return Err(ApiError::MalformedBody(
            "request body must be a JSON object".to_string(),
        ));
    }

    let started = Instant::now();
    match state.engine.predict_value(&body) {
        Ok(output) => {
            state.metrics.record_prediction(&output, started.elapsed());
            Ok(Json(output))
        }
        Err(err) => {
            state.metrics.record_error(err.kind());
            match &err {
                PredictionError::InvalidInput(validation) => {
                    debug!(fields = ?validation.fields(), "Input rejected");
                }
                PredictionError::ScoringFailure { detail } => {
                    error!(detail = %detail, "Scoring failed");
                }
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_contract::FEATURE_COUNT;
    use crate::models::artifact::ModelArtifact;
    use crate::training::logistic::LogisticParams;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    fn state(coefficients: Vec<f64>) -> AppState {
        AppState::new(InferenceEngine::new(ModelArtifact::new(
            LogisticParams {
                coefficients,
                intercept: -1.0,
            },
            "TenYearCHD",
        )))
    }

    fn sample_body() -> String {
        serde_json::json!({
            "male": 0, "age": 61, "currentSmoker": 1, "cigsPerDay": 30,
            "BPMeds": 0, "prevalentStroke": 0, "prevalentHyp": 1, "diabetes": 0,
            "totChol": 225, "sysBP": 150, "diaBP": 95, "BMI": 28.58,
            "heartRate": 65, "glucose": 103
        })
        .to_string()
    }

    async fn post_predict(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/predict")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(state(vec![0.0; FEATURE_COUNT]), true);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_predict_success() {
        let state = state(vec![0.0; FEATURE_COUNT]);
        let metrics = state.metrics.clone();
        let (status, body) = post_predict(router(state, true), sample_body()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], 0);
        assert_eq!(body["probability"], 0.2689);
        assert_eq!(
            body["message"],
            "Not high risk of coronary heart disease in the next 10 years"
        );
        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_validation_error_is_422() {
        let state = state(vec![0.0; FEATURE_COUNT]);
        let metrics = state.metrics.clone();
        let mut input: Value = serde_json::from_str(&sample_body()).unwrap();
        input.as_object_mut().unwrap().remove("glucose");
        input["BPMeds"] = serde_json::json!(2);

        let (status, body) = post_predict(router(state, false), input.to_string()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("glucose"));
        assert!(detail.contains("BPMeds"));
        assert_eq!(metrics.validation_rejections.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = router(state(vec![0.0; FEATURE_COUNT]), true);
        let (status, body) = post_predict(app.clone(), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, _) = post_predict(app, "[1, 2, 3]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_scoring_failure_hides_detail() {
        let state = state(vec![f64::MAX; FEATURE_COUNT]);
        let metrics = state.metrics.clone();
        let (status, body) = post_predict(router(state, true), sample_body()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], SCORING_FAILURE_DETAIL);
        assert_eq!(metrics.scoring_failures.load(Ordering::Relaxed), 1);
    }
}
