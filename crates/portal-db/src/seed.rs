use sqlx::PgPool;

use crate::DbError;

/// Catalog entry used to (re)populate an empty portal. Prices start absent.
#[derive(Debug, Clone, Copy)]
pub struct SeedProduct {
    pub name: &'static str,
    pub item_code: &'static str,
    pub image_url: &'static str,
}

/// The starter catalog shipped with the portal.
#[must_use]
pub fn sample_catalog() -> &'static [SeedProduct] {
    &[
        SeedProduct {
            name: "Hydra Glow Serum",
            item_code: "COS-1001",
            image_url: "https://images.unsplash.com/photo-1556228578-8c89e6adf883?auto=format&fit=crop&w=800&q=80",
        },
        SeedProduct {
            name: "Velvet Matte Lipstick",
            item_code: "COS-1002",
            image_url: "https://images.unsplash.com/photo-1586495777744-4413f21062fa?auto=format&fit=crop&w=800&q=80",
        },
        SeedProduct {
            name: "Daily UV Shield SPF 50",
            item_code: "COS-1003",
            image_url: "https://images.unsplash.com/photo-1612817288484-6f916006741a?auto=format&fit=crop&w=800&q=80",
        },
        SeedProduct {
            name: "Silk Finish Foundation",
            item_code: "COS-1004",
            image_url: "https://images.unsplash.com/photo-1629198745660-1ea63a6d4f58?auto=format&fit=crop&w=800&q=80",
        },
        SeedProduct {
            name: "Night Repair Eye Cream",
            item_code: "COS-1005",
            image_url: "https://images.unsplash.com/photo-1571781418606-70265b9cce90?auto=format&fit=crop&w=800&q=80",
        },
    ]
}

/// Replace the whole catalog with `products`, all prices absent.
///
/// Returns the number of products inserted. Runs in a single transaction; if
/// any statement fails the previous catalog is left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_products(pool: &PgPool, products: &[SeedProduct]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM products").execute(&mut *tx).await?;

    let mut count = 0usize;
    for product in products {
        sqlx::query(
            "INSERT INTO products (name, item_code, image_url, retail_price, bulk_price) \
             VALUES ($1, $2, $3, NULL, NULL)",
        )
        .bind(product.name)
        .bind(product.item_code)
        .bind(product.image_url)
        .execute(&mut *tx)
        .await?;
        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
