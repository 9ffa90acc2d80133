//! Shape checks for product payloads arriving over HTTP.
//!
//! Validation works on a raw `serde_json::Value` so that type mismatches
//! (`"retailPrice": "abc"`) surface as field errors instead of a generic
//! deserialization failure.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::products::{NewProduct, ProductPatch};

const NAME: &str = "name";
const ITEM_CODE: &str = "itemCode";
const IMAGE_URL: &str = "imageUrl";
const RETAIL_PRICE: &str = "retailPrice";
const BULK_PRICE: &str = "bulkPrice";

/// Field name to messages, keyed by the wire (camelCase) field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub fields: FieldErrors,
}

impl ValidationError {
    fn from_fields(fields: FieldErrors) -> Self {
        Self {
            message: "invalid payload".to_owned(),
            fields,
        }
    }

    fn not_an_object() -> Self {
        Self {
            message: "payload must be a JSON object".to_owned(),
            fields: FieldErrors::default(),
        }
    }
}

/// Validate a create payload.
///
/// `name` and `itemCode` must be non-empty after trimming, `imageUrl` must
/// parse as an absolute URL, prices are optional numbers (absent or `null`
/// both mean "not set"). Unknown keys are ignored.
///
/// # Errors
///
/// Returns [`ValidationError`] naming every offending field.
pub fn validate_new_product(body: &Value) -> Result<NewProduct, ValidationError> {
    let obj = body.as_object().ok_or_else(ValidationError::not_an_object)?;
    let mut errors = FieldErrors::default();

    let name = required_text(obj, NAME, "Name is required", &mut errors);
    let item_code = required_text(obj, ITEM_CODE, "Item code is required", &mut errors);
    let image_url = required_text(obj, IMAGE_URL, "Image URL is required", &mut errors)
        .and_then(|url| check_url(url, &mut errors));
    let retail_price = price(obj, RETAIL_PRICE, &mut errors).flatten();
    let bulk_price = price(obj, BULK_PRICE, &mut errors).flatten();

    match (name, item_code, image_url) {
        (Some(name), Some(item_code), Some(image_url)) if errors.is_empty() => Ok(NewProduct {
            name,
            item_code,
            image_url,
            retail_price,
            bulk_price,
        }),
        _ => Err(ValidationError::from_fields(errors)),
    }
}

/// Validate a sparse update payload. Every key is optional; prices accept an
/// explicit `null` meaning "clear".
///
/// # Errors
///
/// Returns [`ValidationError`] naming every offending field.
pub fn validate_product_patch(body: &Value) -> Result<ProductPatch, ValidationError> {
    let obj = body.as_object().ok_or_else(ValidationError::not_an_object)?;
    let mut errors = FieldErrors::default();

    let name = optional_text(obj, NAME, "Name is required", &mut errors);
    let item_code = optional_text(obj, ITEM_CODE, "Item code is required", &mut errors);
    let image_url = optional_text(obj, IMAGE_URL, "Image URL is required", &mut errors)
        .and_then(|url| check_url(url, &mut errors));
    let retail_price = price(obj, RETAIL_PRICE, &mut errors);
    let bulk_price = price(obj, BULK_PRICE, &mut errors);

    if !errors.is_empty() {
        return Err(ValidationError::from_fields(errors));
    }

    Ok(ProductPatch {
        name,
        item_code,
        image_url,
        retail_price,
        bulk_price,
    })
}

fn required_text(
    obj: &Map<String, Value>,
    key: &str,
    empty_message: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    if obj.get(key).is_none_or(Value::is_null) {
        errors.add(key, "Required");
        return None;
    }
    optional_text(obj, key, empty_message, errors)
}

fn optional_text(
    obj: &Map<String, Value>,
    key: &str,
    empty_message: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match obj.get(key)? {
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                errors.add(key, empty_message);
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        other => {
            errors.add(key, format!("Expected string, received {}", type_name(other)));
            None
        }
    }
}

fn check_url(candidate: String, errors: &mut FieldErrors) -> Option<String> {
    if url::Url::parse(&candidate).is_ok() {
        Some(candidate)
    } else {
        errors.add(IMAGE_URL, "Image URL must be a valid URL");
        None
    }
}

/// `None` = key absent, `Some(None)` = explicit `null`, `Some(Some(_))` = a
/// number `Decimal` can hold.
#[allow(clippy::option_option)]
fn price(obj: &Map<String, Value>, key: &str, errors: &mut FieldErrors) -> Option<Option<Decimal>> {
    match obj.get(key)? {
        Value::Null => Some(None),
        Value::Number(n) => match n.as_f64().and_then(|f| Decimal::try_from(f).ok()) {
            Some(value) => Some(Some(value)),
            None => {
                errors.add(key, "Number is out of range");
                None
            }
        },
        other => {
            errors.add(key, format!("Expected number, received {}", type_name(other)));
            None
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "name": "  Hydra Glow Serum ",
            "itemCode": "COS-1001",
            "imageUrl": "https://images.example.com/serum.jpg"
        })
    }

    #[test]
    fn new_product_trims_text_and_defaults_prices() {
        let product = validate_new_product(&valid_body()).expect("valid");
        assert_eq!(product.name, "Hydra Glow Serum");
        assert_eq!(product.item_code, "COS-1001");
        assert_eq!(product.retail_price, None);
        assert_eq!(product.bulk_price, None);
    }

    #[test]
    fn new_product_accepts_numeric_and_null_prices() {
        let mut body = valid_body();
        body["retailPrice"] = json!(9.99);
        body["bulkPrice"] = Value::Null;
        let product = validate_new_product(&body).expect("valid");
        assert_eq!(product.retail_price, Some(Decimal::new(999, 2)));
        assert_eq!(product.bulk_price, None);
    }

    #[test]
    fn new_product_rejects_non_url_image() {
        let mut body = valid_body();
        body["imageUrl"] = json!("not a url");
        let err = validate_new_product(&body).unwrap_err();
        assert_eq!(err.fields.fields().collect::<Vec<_>>(), vec!["imageUrl"]);
        assert_eq!(
            err.fields.messages("imageUrl"),
            ["Image URL must be a valid URL".to_string()]
        );
    }

    #[test]
    fn new_product_rejects_relative_url() {
        let mut body = valid_body();
        body["imageUrl"] = json!("/images/serum.jpg");
        let err = validate_new_product(&body).unwrap_err();
        assert!(err.fields.contains("imageUrl"));
    }

    #[test]
    fn new_product_names_exactly_the_empty_fields() {
        let mut body = valid_body();
        body["name"] = json!("   ");
        body["itemCode"] = json!("");
        let err = validate_new_product(&body).unwrap_err();
        assert_eq!(
            err.fields.fields().collect::<Vec<_>>(),
            vec!["itemCode", "name"]
        );
        assert_eq!(err.fields.messages("name"), ["Name is required".to_string()]);
    }

    #[test]
    fn new_product_reports_missing_fields_as_required() {
        let err = validate_new_product(&json!({})).unwrap_err();
        assert_eq!(
            err.fields.fields().collect::<Vec<_>>(),
            vec!["imageUrl", "itemCode", "name"]
        );
        assert_eq!(err.fields.messages("name"), ["Required".to_string()]);
    }

    #[test]
    fn new_product_rejects_string_price() {
        let mut body = valid_body();
        body["retailPrice"] = json!("abc");
        let err = validate_new_product(&body).unwrap_err();
        assert_eq!(err.fields.fields().collect::<Vec<_>>(), vec!["retailPrice"]);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = validate_new_product(&json!([1, 2, 3])).unwrap_err();
        assert!(err.fields.is_empty());
        assert_eq!(err.to_string(), "payload must be a JSON object");
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch = validate_product_patch(&json!({ "retailPrice": null })).expect("valid");
        assert_eq!(patch.retail_price, Some(None));
        assert_eq!(patch.bulk_price, None);
        assert!(patch.name.is_none());
    }

    #[test]
    fn patch_accepts_both_prices() {
        let patch =
            validate_product_patch(&json!({ "retailPrice": 10, "bulkPrice": 8.5 })).expect("valid");
        assert_eq!(patch.retail_price, Some(Some(Decimal::from(10))));
        assert_eq!(patch.bulk_price, Some(Some(Decimal::new(85, 1))));
    }

    #[test]
    fn patch_rejects_malformed_price_and_blank_name() {
        let err = validate_product_patch(&json!({ "retailPrice": "abc", "name": " " })).unwrap_err();
        assert_eq!(
            err.fields.fields().collect::<Vec<_>>(),
            vec!["name", "retailPrice"]
        );
    }

    #[test]
    fn patch_rejects_price_beyond_decimal_range() {
        let err = validate_product_patch(&json!({ "bulkPrice": 1e30 })).unwrap_err();
        assert_eq!(
            err.fields.messages("bulkPrice"),
            ["Number is out of range".to_string()]
        );
    }

    #[test]
    fn patch_rejects_null_text_field() {
        let err = validate_product_patch(&json!({ "itemCode": null })).unwrap_err();
        assert_eq!(
            err.fields.messages("itemCode"),
            ["Expected string, received null".to_string()]
        );
    }

    #[test]
    fn empty_patch_is_valid_and_empty() {
        let patch = validate_product_patch(&json!({})).expect("valid");
        assert!(patch.is_empty());
    }
}
