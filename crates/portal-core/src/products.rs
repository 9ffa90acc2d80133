use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::CoreError;

/// A catalog entry as exposed over the API and held by both UIs.
///
/// Prices travel as plain JSON numbers; `null` (or a missing key) means the
/// price has not been entered yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub item_code: String,
    pub image_url: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub retail_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub bulk_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// A product is done once either price has been entered.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.retail_price.is_some() || self.bulk_price.is_some()
    }
}

/// Validated fields for a new catalog entry. Identifier and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub item_code: String,
    pub image_url: String,
    pub retail_price: Option<Decimal>,
    pub bulk_price: Option<Decimal>,
}

/// Sparse update. `None` leaves a field untouched; for prices `Some(None)`
/// clears the stored value.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub item_code: Option<String>,
    pub image_url: Option<String>,
    pub retail_price: Option<Option<Decimal>>,
    pub bulk_price: Option<Option<Decimal>>,
}

impl ProductPatch {
    /// Patch that writes both prices at once, as the pricing session does.
    #[must_use]
    pub fn prices(retail_price: Option<Decimal>, bulk_price: Option<Decimal>) -> Self {
        Self {
            retail_price: Some(retail_price),
            bulk_price: Some(bulk_price),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.item_code.is_none()
            && self.image_url.is_none()
            && self.retail_price.is_none()
            && self.bulk_price.is_none()
    }

    /// Overlay the supplied fields onto a local copy of a product.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(item_code) = &self.item_code {
            product.item_code.clone_from(item_code);
        }
        if let Some(image_url) = &self.image_url {
            product.image_url.clone_from(image_url);
        }
        if let Some(retail_price) = self.retail_price {
            product.retail_price = retail_price;
        }
        if let Some(bulk_price) = self.bulk_price {
            product.bulk_price = bulk_price;
        }
    }

    /// Wire form: only supplied keys appear, cleared prices are `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(name) = &self.name {
            body.insert("name".to_owned(), Value::from(name.as_str()));
        }
        if let Some(item_code) = &self.item_code {
            body.insert("itemCode".to_owned(), Value::from(item_code.as_str()));
        }
        if let Some(image_url) = &self.image_url {
            body.insert("imageUrl".to_owned(), Value::from(image_url.as_str()));
        }
        if let Some(retail_price) = self.retail_price {
            body.insert("retailPrice".to_owned(), price_to_json(retail_price));
        }
        if let Some(bulk_price) = self.bulk_price {
            body.insert("bulkPrice".to_owned(), price_to_json(bulk_price));
        }
        Value::Object(body)
    }
}

fn price_to_json(price: Option<Decimal>) -> Value {
    price
        .and_then(|p| p.to_f64())
        .map_or(Value::Null, Value::from)
}

/// Completion counters over a product list. Never stored; recomputed from
/// whatever list the caller holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

impl Progress {
    /// `percent` is `completed / total * 100` rounded half up, and 0 for an
    /// empty list.
    #[must_use]
    pub fn from_counts(completed: usize, total: usize) -> Self {
        let completed = completed.min(total);
        let percent = if total == 0 {
            0
        } else {
            let rounded = (completed * 200 + total) / (total * 2);
            u32::try_from(rounded).unwrap_or(100)
        };
        Self {
            completed,
            total,
            percent,
        }
    }

    #[must_use]
    pub fn of<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let (completed, total) = products
            .into_iter()
            .fold((0, 0), |(done, all), p| (done + usize::from(p.is_done()), all + 1));
        Self::from_counts(completed, total)
    }
}

/// Parse the path segment used to address a product.
///
/// # Errors
///
/// Returns [`CoreError::InvalidProductId`] when `raw` is not a UUID.
pub fn parse_product_id(raw: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(raw).map_err(|_| CoreError::InvalidProductId(raw.to_owned()))
}
