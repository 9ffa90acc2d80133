use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use portal_core::{
    parse_product_id, validate_new_product, validate_product_patch, Product, Progress,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{json_body, map_db_error, ApiError, AppState};

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct ProductListResponse {
    products: Vec<Product>,
    progress: Progress,
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteResponse {
    message: &'static str,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn product_id(req_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    parse_product_id(raw).map_err(|e| {
        tracing::debug!(error = %e, "rejected product id");
        ApiError::new(req_id, "bad_request", "Invalid product id")
    })
}

fn not_found(req_id: &str) -> ApiError {
    ApiError::new(req_id, "not_found", "Product not found")
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/products: every product in creation order, plus progress.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let products: Vec<Product> = portal_db::list_products(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .into_iter()
        .map(Product::from)
        .collect();
    let progress = Progress::of(&products);

    Ok(Json(ProductListResponse { products, progress }))
}

/// POST /api/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let rid = &req_id.0;

    let body = json_body(rid, body)?;
    let new_product = validate_new_product(&body).map_err(|e| ApiError::validation(rid, e))?;

    let row = portal_db::create_product(&state.pool, &new_product)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    tracing::info!(product_id = %row.public_id, "product created");

    Ok((StatusCode::CREATED, Json(Product::from(row))))
}

/// PATCH /api/products/{id}
///
/// The id is checked before the body, so a malformed id is a 400 whatever
/// the payload holds.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let rid = &req_id.0;

    let id = product_id(rid, &raw_id)?;
    let body = json_body(rid, body)?;
    let patch = validate_product_patch(&body).map_err(|e| ApiError::validation(rid, e))?;

    let row = portal_db::update_product(&state.pool, id, &patch)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;

    Ok(Json(Product::from(row)))
}

/// DELETE /api/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let rid = &req_id.0;

    let id = product_id(rid, &raw_id)?;
    portal_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid))?;
    tracing::info!(product_id = %id, "product deleted");

    Ok(Json(DeleteResponse {
        message: "Product deleted",
    }))
}
