use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::actuation::SeverityTable;
use crate::capability;
use crate::classifier::{ClassifierAdapter, LabelSet, ModelStatus};
use crate::config::BridgeConfig;
use crate::orchestrator::{DecisionOrchestrator, DecisionResult};
use crate::vision::{canonical_test_image_base64, ImageInput, ImageTensor};

// --- Error Handling ---
pub struct ServerError(anyhow::Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "Internal server error",
                "message": self.0.to_string(),
                "timestamp": Utc::now(),
            })),
        )
            .into_response()
    }
}

impl<E> From<E> for ServerError where E: Into<anyhow::Error> {
    fn from(err: E) -> Self { Self(err.into()) }
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DecisionOrchestrator>,
    /// Model path reloaded by `/api/model/reload` when the request names none
    pub model_path: Option<PathBuf>,
}

impl AppState {
    /// Probe capabilities, load the configured model and assemble the pipeline.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let flags = capability::probe(config.overrides);
        let classifier = Arc::new(ClassifierAdapter::new(config.taxonomy.labels.clone(), flags));

        if let Some(path) = &config.model_path {
            info!("Looking for model file: {}", path.display());
        }
        classifier.load_model(config.model_path.as_deref());

        let orchestrator = DecisionOrchestrator::new(
            flags,
            classifier,
            config.taxonomy.severity.clone(),
            config.model_version.clone(),
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            model_path: config.model_path.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    image_base64: Option<String>,
    zone_id: Option<String>,
    request_id: Option<String>,
}

#[derive(Serialize)]
struct PredictResponse {
    #[serde(flatten)]
    result: DecisionResult,
    zone_id: String,
    request_id: String,
}

#[derive(Serialize)]
struct TestResponse {
    #[serde(flatten)]
    result: DecisionResult,
    test_image: bool,
    codec_available: bool,
}

#[derive(Serialize)]
struct ModelInfo {
    model_loaded: bool,
    class_names: LabelSet,
    severity_mapping: SeverityTable,
    input_shape: [usize; 3],
    total_parameters: u64,
    framework: String,
    model_version: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    timestamp: chrono::DateTime<Utc>,
    version: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ReloadRequest {
    model_path: Option<PathBuf>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/predict", post(predict_endpoint))
        .route("/api/model/info", get(model_info))
        .route("/api/model/test", post(test_model))
        .route("/api/model/reload", post(reload_model))
        .route("/api/health", get(health_check))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(internal_error))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: BridgeConfig) -> anyhow::Result<()> {
    info!("🌱 Starting leaf bridge server...");

    let state = tokio::task::spawn_blocking({
        let config = config.clone();
        move || AppState::from_config(&config)
    })
    .await?;
    let app = router(state);

    info!("Endpoints available:");
    info!("  POST /api/predict      - disease prediction");
    info!("  GET  /api/model/info   - model information");
    info!("  POST /api/model/test   - test model with sample image");
    info!("  POST /api/model/reload - reload model artifact");
    info!("  GET  /api/health       - health check");

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Server listening at http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn decide(state: &AppState, input: ImageInput) -> Result<DecisionResult, ServerError> {
    let orchestrator = state.orchestrator.clone();
    let result = tokio::task::spawn_blocking(move || orchestrator.classify_and_act(&input)).await?;
    Ok(result)
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": message }))).into_response()
}

async fn predict_endpoint(State(state): State<AppState>, body: Bytes) -> Result<Response, ServerError> {
    let request: Option<PredictRequest> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice(&body)?
    };

    let Some(request) = request else {
        return Ok(bad_request("No image data provided"));
    };
    let Some(image) = request.image_base64.filter(|data| !data.is_empty()) else {
        return Ok(bad_request("No image data provided"));
    };

    let zone_id = request.zone_id.unwrap_or_else(|| "unknown".to_string());
    let request_id = request.request_id.unwrap_or_else(|| "unknown".to_string());

    let result = decide(&state, ImageInput::Encoded(image)).await?;
    info!(
        "Prediction request from {}: {} (severity: {})",
        zone_id,
        result.disease_type(),
        result.severity().level()
    );

    Ok(Json(PredictResponse { result, zone_id, request_id }).into_response())
}

async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    let orchestrator = &state.orchestrator;
    let classifier = orchestrator.classifier();
    let status = classifier.status();

    Json(ModelInfo {
        model_loaded: status.model_loaded,
        class_names: classifier.labels().clone(),
        severity_mapping: orchestrator.severity_table().clone(),
        input_shape: ImageTensor::SHAPE,
        total_parameters: status.total_parameters,
        framework: status.framework,
        model_version: orchestrator.model_version().to_string(),
    })
}

async fn test_model(State(state): State<AppState>) -> Result<Json<TestResponse>, ServerError> {
    let flags = state.orchestrator.capabilities();
    let encoded = canonical_test_image_base64(&flags)?;
    let result = decide(&state, ImageInput::Encoded(encoded)).await?;

    Ok(Json(TestResponse {
        result,
        test_image: true,
        codec_available: flags.codec_available,
    }))
}

async fn reload_model(State(state): State<AppState>, body: Bytes) -> Result<Json<ModelStatus>, ServerError> {
    let request: ReloadRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ReloadRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };
    let path = request.model_path.or_else(|| state.model_path.clone());

    let classifier = state.orchestrator.classifier().clone();
    let status = tokio::task::spawn_blocking(move || classifier.load_model(path.as_deref())).await?;
    info!("Model reload finished: loaded={} framework={}", status.model_loaded, status.framework);

    Ok(Json(status))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.orchestrator.classifier().status().model_loaded,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "Endpoint not found" })))
}

fn internal_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_default();
    error!("Handler panicked: {}", detail);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": "Internal server error" }))).into_response()
}
