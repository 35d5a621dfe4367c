use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;
use crate::core::{render_cards, RecommendError, RecommendOutcome, Recommender};
use crate::models::{ErrorResponse, HealthResponse, RecommendResponse, ScoreResponse};
use crate::services::AdvisorError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}

impl AppState {
    pub fn new(recommender: Recommender) -> Self {
        Self {
            recommender: Arc::new(recommender),
        }
    }
}

/// Configure the survey routes (mounted under /api/v1)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(post_only("/recommend", web::post().to(recommend)))
        .service(post_only("/recommend/cards", web::post().to(recommend_cards)))
        .service(post_only("/score", web::post().to(score)));
}

fn post_only(path: &str, route: actix_web::Route) -> actix_web::Resource {
    web::resource(path)
        .route(route)
        .default_service(web::route().to(use_post))
}

/// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

async fn use_post() -> HttpResponse {
    error_json(StatusCode::METHOD_NOT_ALLOWED, "Use POST", "This endpoint only accepts POST")
}

/// Recommend endpoint
///
/// POST /api/v1/recommend
///
/// The body is the raw survey form; every field is optional.
async fn recommend(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    match run_pipeline(&state, &body).await {
        Ok(outcome) => HttpResponse::Ok().json(RecommendResponse {
            recommendations: outcome.recommendations,
        }),
        Err(response) => response,
    }
}

/// Same pipeline as [`recommend`], rendered as HTML result cards
async fn recommend_cards(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    match run_pipeline(&state, &body).await {
        Ok(outcome) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(render_cards(&outcome.recommendations)),
        Err(response) => response,
    }
}

/// Deterministic rule scores only; the advisor is never consulted
async fn score(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let raw = match parse_body(&body) {
        Ok(raw) => raw,
        Err(response) => return response,
    };

    let (_, scores) = state.recommender.baseline(&raw);
    let version = state.recommender.scorer().rules().version;

    HttpResponse::Ok().json(ScoreResponse::new(version, scores))
}

async fn run_pipeline(
    state: &AppState,
    body: &[u8],
) -> Result<RecommendOutcome, HttpResponse> {
    let raw = parse_body(body)?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("recommend", %request_id);

    let result = state
        .recommender
        .clone()
        .recommend_isolated(raw)
        .instrument(span)
        .await;

    result.map_err(|e| {
        tracing::error!("Recommendation {} failed: {}", request_id, e);
        recommend_error_response(&e)
    })
}

/// An empty body is an empty survey; anything else must be JSON
fn parse_body(body: &[u8]) -> Result<Value, HttpResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_slice(body).map_err(|e| {
        tracing::info!("Rejected survey body: {}", e);
        error_json(StatusCode::BAD_REQUEST, "invalid_json", &format!("Invalid JSON: {}", e))
    })
}

fn recommend_error_response(err: &RecommendError) -> HttpResponse {
    let kind = match err {
        RecommendError::Advisor(AdvisorError::MissingCredential) => "configuration_error",
        RecommendError::Advisor(AdvisorError::ApiError { .. })
        | RecommendError::Advisor(AdvisorError::RequestError(_)) => "advisor_error",
        _ => "internal_error",
    };

    error_json(StatusCode::INTERNAL_SERVER_ERROR, kind, &err.to_string())
}

fn error_json(status: StatusCode, error: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}
