mod auth;
mod export;
mod products;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use portal_core::{FieldErrors, ValidationError};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::middleware::{request_id, require_session, AuthSettings, RequestId};
use crate::pages;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: AuthSettings,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                fields: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// A 400 carrying the per-field messages produced by payload validation.
    pub fn validation(request_id: impl Into<String>, error: ValidationError) -> Self {
        let fields = (!error.fields.is_empty()).then_some(error.fields);
        Self {
            error: ErrorBody {
                code: "validation_error".to_owned(),
                message: error.message,
                fields,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &portal_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Unwrap a JSON body, turning malformed or non-JSON input into a 400.
pub(super) fn json_body(
    request_id: &str,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected request body");
            Err(ApiError::new(
                request_id,
                "validation_error",
                "invalid payload",
            ))
        }
    }
}

fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/pricing", get(pages::pricing_page))
        .route("/admin", get(pages::admin_page))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/{id}",
            patch(products::update_product).delete(products::delete_product),
        )
        .route("/api/export", get(export::export_products))
        .layer(axum::middleware::from_fn(require_session))
}

pub fn build_app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(pages::index))
        .route("/login", get(pages::login_page))
        .route("/api/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout));

    Router::new()
        .merge(public_routes)
        .merge(protected_router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                )),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match portal_db::health_check(&state.pool).await {
        Ok(latency) => {
            tracing::debug!(?latency, "health check ok");
            (
                StatusCode::OK,
                Json(ApiResponse {
                    data: HealthData {
                        status: "ok",
                        database: "ok",
                    },
                    meta,
                }),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}
