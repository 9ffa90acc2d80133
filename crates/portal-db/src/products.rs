//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use portal_core::{NewProduct, Product, ProductPatch};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const PRODUCT_COLUMNS: &str = "id, public_id, name, item_code, image_url, retail_price, bulk_price, \
                               created_at, updated_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub item_code: String,
    pub image_url: String,
    pub retail_price: Option<Decimal>,
    pub bulk_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.public_id,
            name: row.name,
            item_code: row.item_code,
            image_url: row.image_url,
            retail_price: row.retail_price,
            bulk_price: row.bulk_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every product, oldest first. Rows created in the same instant keep
/// insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a product and returns the stored row, including the generated
/// public id and timestamps.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products (name, item_code, image_url, retail_price, bulk_price) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&product.name)
    .bind(&product.item_code)
    .bind(&product.image_url)
    .bind(product.retail_price)
    .bind(product.bulk_price)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse update and returns the updated row, or `None` when no
/// product has that public id.
///
/// Text fields use `COALESCE` (absent keeps the current value). Prices are
/// tri-state, so each carries a "was supplied" flag next to its value:
///   - `None`          => keep existing value
///   - `Some(None)`    => set to NULL
///   - `Some(Some(v))` => set to `v`
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_product(
    pool: &PgPool,
    public_id: Uuid,
    patch: &ProductPatch,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products \
         SET name         = COALESCE($2, name), \
             item_code    = COALESCE($3, item_code), \
             image_url    = COALESCE($4, image_url), \
             retail_price = CASE WHEN $5::BOOL THEN $6 ELSE retail_price END, \
             bulk_price   = CASE WHEN $7::BOOL THEN $8 ELSE bulk_price END, \
             updated_at   = NOW() \
         WHERE public_id = $1 \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(public_id)
    .bind(patch.name.as_deref())
    .bind(patch.item_code.as_deref())
    .bind(patch.image_url.as_deref())
    .bind(patch.retail_price.is_some())
    .bind(patch.retail_price.flatten())
    .bind(patch.bulk_price.is_some())
    .bind(patch.bulk_price.flatten())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Hard-deletes a product and returns the removed row, or `None` when no
/// product has that public id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_product(pool: &PgPool, public_id: Uuid) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "DELETE FROM products WHERE public_id = $1 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product(name: &str, code: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            item_code: code.to_string(),
            image_url: format!("https://images.example.com/{code}.jpg"),
            retail_price: None,
            bulk_price: None,
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_assigns_identity_and_leaves_prices_absent(pool: PgPool) {
        let row = create_product(&pool, &new_product("Hydra Glow Serum", "COS-1001"))
            .await
            .expect("create");

        assert!(!row.public_id.is_nil());
        assert_eq!(row.item_code, "COS-1001");
        assert!(row.retail_price.is_none());
        assert!(row.bulk_price.is_none());
        assert_eq!(row.created_at, row.updated_at);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_returns_creation_order(pool: PgPool) {
        for (name, code) in [("Zeta", "Z-1"), ("Alpha", "A-1"), ("Mid", "M-1")] {
            create_product(&pool, &new_product(name, code))
                .await
                .expect("create");
        }

        let names: Vec<String> = list_products(&pool)
            .await
            .expect("list")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn item_code_is_not_unique(pool: PgPool) {
        create_product(&pool, &new_product("One", "DUP-1"))
            .await
            .expect("first");
        create_product(&pool, &new_product("Two", "DUP-1"))
            .await
            .expect("duplicate item code is allowed");
        assert_eq!(list_products(&pool).await.expect("list").len(), 2);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn update_clears_retail_and_keeps_bulk(pool: PgPool) {
        let row = create_product(&pool, &new_product("Serum", "COS-1")).await.expect("create");
        update_product(
            &pool,
            row.public_id,
            &ProductPatch::prices(Some(Decimal::new(999, 2)), Some(Decimal::new(750, 2))),
        )
        .await
        .expect("set prices")
        .expect("row exists");

        let cleared = update_product(
            &pool,
            row.public_id,
            &ProductPatch {
                retail_price: Some(None),
                ..ProductPatch::default()
            },
        )
        .await
        .expect("clear retail")
        .expect("row exists");

        assert_eq!(cleared.retail_price, None);
        assert_eq!(cleared.bulk_price, Some(Decimal::new(750, 2)));
        assert_eq!(cleared.name, "Serum");
        assert!(cleared.updated_at >= row.updated_at);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn update_unknown_id_returns_none(pool: PgPool) {
        let result = update_product(
            &pool,
            Uuid::new_v4(),
            &ProductPatch {
                name: Some("Ghost".to_string()),
                ..ProductPatch::default()
            },
        )
        .await
        .expect("query");
        assert!(result.is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn delete_returns_removed_row_once(pool: PgPool) {
        let row = create_product(&pool, &new_product("Serum", "COS-1")).await.expect("create");

        let deleted = delete_product(&pool, row.public_id).await.expect("delete");
        assert_eq!(deleted.map(|r| r.public_id), Some(row.public_id));

        let again = delete_product(&pool, row.public_id).await.expect("delete again");
        assert!(again.is_none());
        assert!(list_products(&pool).await.expect("list").is_empty());
    }

    #[test]
    fn row_converts_to_product_with_public_id() {
        let public_id = Uuid::new_v4();
        let now = Utc::now();
        let product = Product::from(ProductRow {
            id: 7,
            public_id,
            name: "Serum".to_string(),
            item_code: "COS-1".to_string(),
            image_url: "https://images.example.com/serum.jpg".to_string(),
            retail_price: Some(Decimal::new(999, 2)),
            bulk_price: None,
            created_at: now,
            updated_at: now,
        });
        assert_eq!(product.id, public_id);
        assert!(product.is_done());
    }
}
