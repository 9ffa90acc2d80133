use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use portal_core::{build_pricing_workbook, export_filename, ExportRow, Product};

/// Build the same workbook `GET /api/export` serves and write it to `out`,
/// or to the dated default name in the current directory.
pub(crate) async fn run_export(pool: &sqlx::PgPool, out: Option<PathBuf>) -> anyhow::Result<()> {
    let rows: Vec<ExportRow> = portal_db::list_products(pool)
        .await?
        .into_iter()
        .map(|row| ExportRow::from(&Product::from(row)))
        .collect();

    let bytes = build_pricing_workbook(&rows)?;
    let path = output_path(out, chrono::Utc::now().date_naive());
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(rows = rows.len(), path = %path.display(), "export written");
    println!("wrote {} product(s) to {}", rows.len(), path.display());
    Ok(())
}

fn output_path(out: Option<PathBuf>, today: NaiveDate) -> PathBuf {
    out.unwrap_or_else(|| Path::new(".").join(export_filename(today)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_uses_dated_filename() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).expect("date");
        assert_eq!(
            output_path(None, today),
            Path::new(".").join("product-pricing-2025-01-15.xlsx")
        );
    }

    #[test]
    fn explicit_path_wins() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).expect("date");
        assert_eq!(
            output_path(Some(PathBuf::from("/tmp/out.xlsx")), today),
            PathBuf::from("/tmp/out.xlsx")
        );
    }
}
