//! Spreadsheet export of the current pricing.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use crate::products::Product;

pub const SHEET_NAME: &str = "Pricing";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const HEADER: [&str; 4] = ["Product Name", "Item Code", "Retail Price", "Bulk Price"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
}

/// The exported subset of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub name: String,
    pub item_code: String,
    pub retail_price: Option<Decimal>,
    pub bulk_price: Option<Decimal>,
}

impl From<&Product> for ExportRow {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            item_code: product.item_code.clone(),
            retail_price: product.retail_price,
            bulk_price: product.bulk_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

fn price_cell(price: Option<Decimal>) -> Cell {
    price.and_then(|p| p.to_f64()).map_or(Cell::Empty, Cell::Number)
}

/// Header row followed by one row per product, in the given order.
fn grid(rows: &[ExportRow]) -> Vec<[Cell; 4]> {
    let header = HEADER.map(|title| Cell::Text(title.to_owned()));
    std::iter::once(header)
        .chain(rows.iter().map(|row| {
            [
                Cell::Text(row.name.clone()),
                Cell::Text(row.item_code.clone()),
                price_cell(row.retail_price),
                price_cell(row.bulk_price),
            ]
        }))
        .collect()
}

/// Encode the rows as an `.xlsx` workbook with a single `Pricing` sheet.
/// Absent prices are left as empty cells.
///
/// # Errors
///
/// Returns [`ExportError::Xlsx`] if the encoder rejects the data.
pub fn build_pricing_workbook(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (row_idx, cells) in grid(rows).iter().enumerate() {
        let row = u32::try_from(row_idx).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, cell) in (0u16..).zip(cells.iter()) {
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row, col, *value)?;
                }
                Cell::Empty => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// `product-pricing-YYYY-MM-DD.xlsx`
#[must_use]
pub fn export_filename(date: NaiveDate) -> String {
    format!("product-pricing-{}.xlsx", date.format("%Y-%m-%d"))
}
