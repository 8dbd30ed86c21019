// Property Valuation System - REST API Server
// Serves the prediction pipeline over HTTP with Axum

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use property_valuation::{
    predict, predict_batch, ModelContext, PredictionError, PropertyDescriptor, VERSION,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state: the loaded-once, read-only serving context.
#[derive(Clone)]
struct AppState {
    ctx: Arc<ModelContext>,
}

/// Error payload, FastAPI-style `{"detail": "..."}`.
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn error_response(status: StatusCode, detail: String) -> axum::response::Response {
    (status, Json(ErrorResponse { detail })).into_response()
}

fn map_prediction_error(err: PredictionError) -> axum::response::Response {
    if err.is_invalid_input() {
        error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    } else {
        error_response(StatusCode::BAD_REQUEST, err.to_string())
    }
}

#[derive(Deserialize)]
struct BatchRequest {
    properties: Vec<PropertyDescriptor>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET / - Service directory
async fn read_root() -> impl IntoResponse {
    Json(json!({
        "message": "Property Price Prediction API",
        "version": VERSION,
        "endpoints": {
            "/predict": "POST - Predict price for a single property",
            "/predict/batch": "POST - Predict prices for multiple properties",
            "/model/info": "GET - Get model information",
            "/validation/rules": "GET - Get validation rules and typical size ranges",
            "/areas": "GET - Get list of available areas",
            "/property-types": "GET - Get list of available property sub-types",
            "/registration-types": "GET - Get list of available registration types",
            "/health": "GET - Health check"
        }
    }))
}

/// POST /predict - Predict price for a single property
async fn predict_price(
    State(state): State<AppState>,
    Json(input): Json<PropertyDescriptor>,
) -> impl IntoResponse {
    match predict(&state.ctx, &input) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => map_prediction_error(e),
    }
}

/// POST /predict/batch - Predict prices for multiple properties
async fn predict_batch_prices(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> impl IntoResponse {
    match predict_batch(&state.ctx, &request.properties) {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => map_prediction_error(e),
    }
}

/// GET /model/info - Model information and statistics
async fn get_model_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ctx.model_info())
}

/// GET /areas - All known location areas
async fn get_areas(State(state): State<AppState>) -> impl IntoResponse {
    let mut areas = state.ctx.area_encoder.classes().to_vec();
    areas.sort();
    Json(json!({
        "total_areas": areas.len(),
        "areas": areas
    }))
}

/// GET /property-types - All known property sub-types
async fn get_property_types(State(state): State<AppState>) -> impl IntoResponse {
    let mut types = state.ctx.subtype_encoder.classes().to_vec();
    types.sort();
    Json(json!({
        "total_types": types.len(),
        "property_sub_types": types
    }))
}

/// GET /registration-types - All known registration types
async fn get_registration_types(State(state): State<AppState>) -> impl IntoResponse {
    let mut types = state.ctx.regtype_encoder.classes().to_vec();
    types.sort();
    Json(json!({
        "total_types": types.len(),
        "registration_types": types
    }))
}

/// GET /validation/rules - Loaded validation rule tables
async fn get_validation_rules(State(state): State<AppState>) -> impl IntoResponse {
    match &state.ctx.validation_rules {
        Some(rules) => (StatusCode::OK, Json(rules.clone())).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "Validation rules not available".to_string(),
        ),
    }
}

/// GET /health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ctx.health())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Property Valuation System - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let model_dir = std::env::var("MODEL_DIR").unwrap_or_else(|_| "model".to_string());

    println!("📦 Loading model and encoders from {:?}...", model_dir);
    let ctx = match ModelContext::load(&model_dir) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("❌ Failed to load model artifacts: {:#}", e);
            eprintln!("   Place the trained artifacts in {:?}, or set MODEL_DIR.", model_dir);
            std::process::exit(1);
        }
    };
    println!(
        "✓ Loaded {} ({} areas, {} sub-types, {} registration types)",
        ctx.model.model_type(),
        ctx.area_encoder.len(),
        ctx.subtype_encoder.len(),
        ctx.regtype_encoder.len()
    );
    if ctx.validation_rules.is_none() {
        println!("⚠️  Validation rules not loaded - predictions will carry no warnings");
    }

    let state = AppState { ctx: Arc::new(ctx) };

    let app = Router::new()
        .route("/", get(read_root))
        .route("/predict", post(predict_price))
        .route("/predict/batch", post(predict_batch_prices))
        .route("/model/info", get(get_model_info))
        .route("/areas", get(get_areas))
        .route("/property-types", get(get_property_types))
        .route("/registration-types", get(get_registration_types))
        .route("/validation/rules", get(get_validation_rules))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = "0.0.0.0:8000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:8000");
    println!("   Try: curl http://localhost:8000/health");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
