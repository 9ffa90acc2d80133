pub mod app_config;
pub mod config;
pub mod export;
pub mod products;
pub mod session;
pub mod validation;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use export::{build_pricing_workbook, export_filename, ExportError, ExportRow};
pub use products::{parse_product_id, NewProduct, Product, ProductPatch, Progress};
pub use session::{Credentials, MissingCredentials, ResolvedCredentials, Session};
pub use validation::{validate_new_product, validate_product_patch, FieldErrors, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid product id: {0}")]
    InvalidProductId(String),
}
