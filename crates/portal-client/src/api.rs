use async_trait::async_trait;
use portal_core::{Product, ProductPatch, Progress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClientError;

/// Body of `GET /api/products`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub progress: Progress,
}

/// The add-product form. Prices are never part of it; a new product starts
/// pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProductForm {
    pub name: String,
    pub item_code: String,
    pub image_url: String,
}

/// The product operations both UIs depend on.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list_products(&self) -> Result<ProductList, ClientError>;

    async fn create_product(&self, form: &NewProductForm) -> Result<Product, ClientError>;

    async fn update_product(&self, id: Uuid, patch: &ProductPatch)
        -> Result<Product, ClientError>;

    async fn delete_product(&self, id: Uuid) -> Result<(), ClientError>;
}
