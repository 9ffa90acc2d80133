//! Client side of the pricing portal: a typed HTTP client plus the state
//! machines behind the admin table and the one-product-at-a-time pricing
//! session.

pub mod admin;
pub mod api;
pub mod client;
pub mod error;
pub mod price_input;
pub mod session;

#[cfg(test)]
mod fake;

pub use admin::{
    AdminError, AdminRow, AdminTable, CommitOutcome, DeleteConfirmation, PriceCommit, RowState,
    StatusFilter,
};
pub use api::{NewProductForm, ProductApi, ProductList};
pub use client::PortalClient;
pub use error::ClientError;
pub use price_input::{parse_price_input, InvalidPrice, PriceField};
pub use session::{Advance, PricingSession, SaveStatus, SessionError, SessionView};
