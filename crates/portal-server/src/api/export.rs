use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use portal_core::{
    build_pricing_workbook, export::XLSX_CONTENT_TYPE, export_filename, ExportRow, Product,
};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

/// GET /api/export: the whole catalog as an `.xlsx` attachment.
pub(super) async fn export_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let rid = &req_id.0;

    let rows: Vec<ExportRow> = portal_db::list_products(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .into_iter()
        .map(|row| ExportRow::from(&Product::from(row)))
        .collect();

    let bytes = build_pricing_workbook(&rows).map_err(|e| {
        tracing::error!(error = %e, "export failed");
        ApiError::new(rid, "internal_error", "failed to build export")
    })?;

    let filename = export_filename(chrono::Utc::now().date_naive());
    tracing::info!(rows = rows.len(), %filename, "pricing exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (header::CACHE_CONTROL, "no-store".to_owned()),
        ],
        bytes,
    ))
}
