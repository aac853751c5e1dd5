//! HTTP API for the risk engine, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use risk_lib::{
    alerts::{AlertEvaluator, AlertmanagerPayload, RiskAlert},
    engine::RiskEngine,
    health::{HealthResponse, ReadinessResponse},
    observability::{EngineMetrics, StructuredLogger},
    params::{
        AlertParams, BacktestParams, BatchRequest, EtlParams, IngestRequest, LiveQuery,
        TrainParams, ValidationError,
    },
    PredictionResult,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub engine: RwLock<RiskEngine>,
    pub metrics: EngineMetrics,
    pub logger: StructuredLogger,
    ready: AtomicBool,
}

impl AppState {
    pub fn new(engine: RiskEngine, metrics: EngineMetrics, logger: StructuredLogger) -> Self {
        Self {
            engine: RwLock::new(engine),
            metrics,
            logger,
            ready: AtomicBool::new(false),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Request failures surfaced to API clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        warn!(error = %message, "Rejected API request");
        (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
    }
}

/// Unwrap a JSON body, treating a request without one as all defaults
fn body_or_default<T: DeserializeOwned + Default>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(ApiError::Body(rejection)),
    }
}

#[derive(Serialize)]
struct PredictionsResponse {
    predictions: Vec<PredictionResult>,
}

#[derive(Serialize)]
struct AlertsResponse {
    alerts: Vec<RiskAlert>,
    count: usize,
}

#[derive(Serialize)]
struct ResetResponse {
    reset: bool,
}

/// Health check response - degraded components still answer 200
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    (StatusCode::OK, Json(HealthResponse::from_engine(&engine)))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, Json(ReadinessResponse::ready()))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse::not_ready("Engine not yet initialized")),
        )
    }
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        state.metrics.render(),
    )
}

async fn ingest_telemetry(
    State(state): State<Arc<AppState>>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    request.validate()?;

    let report = state.engine.write().await.ingest(request.events);
    state.metrics.record_ingest(&report);
    state.logger.log_ingest(&report);

    Ok(Json(report))
}

async fn run_etl(
    State(state): State<Arc<AppState>>,
    body: Result<Json<EtlParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = body_or_default(body)?;
    params.validate()?;

    let start = Instant::now();
    let report = state
        .engine
        .write()
        .await
        .run_etl(params.bucket_minutes, params.lookback_hours);
    state
        .metrics
        .record_etl(&report, start.elapsed().as_secs_f64());
    state
        .logger
        .log_etl(&report, params.bucket_minutes, params.lookback_hours);

    Ok(Json(report))
}

async fn train(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TrainParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = body_or_default(body)?;
    params.validate()?;

    let start = Instant::now();
    let report = state.engine.write().await.train(
        params.horizon_hours,
        params.incident_threshold,
        params.learning_rate,
        params.epochs,
    );
    state
        .metrics
        .record_training(&report, start.elapsed().as_secs_f64());
    state.logger.log_training(&report, params.epochs);

    Ok(Json(report))
}

async fn infer_batch(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    request.validate()?;

    let predictions = state.engine.read().await.infer_batch(&request.items);
    state.metrics.inc_predictions(predictions.len());

    Ok(Json(PredictionsResponse { predictions }))
}

async fn infer_live(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LiveQuery>,
) -> impl IntoResponse {
    let predictions = state
        .engine
        .read()
        .await
        .infer_latest(query.service.as_deref(), query.route.as_deref());
    state.metrics.inc_predictions(predictions.len());

    Json(PredictionsResponse { predictions })
}

async fn evaluate_alerts(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AlertParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = body_or_default(body)?;
    params.validate()?;

    let alerts = state.engine.read().await.evaluate_alerts(params.threshold);
    state.metrics.inc_alerts(alerts.len());
    state.logger.log_alerts(params.threshold, alerts.len());

    let count = alerts.len();
    Ok(Json(AlertsResponse { alerts, count }))
}

async fn alertmanager_alerts(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AlertParams>, JsonRejection>,
) -> Result<Json<AlertmanagerPayload>, ApiError> {
    let params = body_or_default(body)?;
    params.validate()?;

    let alerts = state.engine.read().await.evaluate_alerts(params.threshold);
    state.metrics.inc_alerts(alerts.len());
    state.logger.log_alerts(params.threshold, alerts.len());

    let evaluator = AlertEvaluator::new(params.threshold);
    Ok(Json(
        evaluator.alertmanager_payload(&alerts, state.logger.instance()),
    ))
}

async fn backtest(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BacktestParams>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = body_or_default(body)?;
    params.validate()?;

    let report = state.engine.read().await.backtest(
        params.horizon_hours,
        params.incident_threshold,
        params.top_k,
    );
    state.metrics.record_backtest(&report);
    state.logger.log_backtest(&report);

    Ok(Json(report))
}

async fn summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.read().await.summary())
}

async fn model(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.read().await.model_snapshot())
}

async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.write().await.reset();
    state.metrics.record_reset();
    state.logger.log_reset();

    Json(ResetResponse { reset: true })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/telemetry", post(ingest_telemetry))
        .route("/api/v1/etl", post(run_etl))
        .route("/api/v1/train", post(train))
        .route("/api/v1/infer/batch", post(infer_batch))
        .route("/api/v1/infer/live", get(infer_live))
        .route("/api/v1/alerts/evaluate", post(evaluate_alerts))
        .route("/api/v1/alerts/alertmanager", post(alertmanager_alerts))
        .route("/api/v1/backtest", post(backtest))
        .route("/api/v1/summary", get(summary))
        .route("/api/v1/model", get(model))
        .route("/api/v1/reset", post(reset))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
