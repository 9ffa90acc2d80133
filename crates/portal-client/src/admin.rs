//! Admin table: the whole catalog held locally, filtered for display, with
//! optimistic price edits and deletes that roll back on failure.

use portal_core::{Product, ProductPatch, Progress};
use thiserror::Error;
use uuid::Uuid;

use crate::api::{NewProductForm, ProductApi};
use crate::error::ClientError;
use crate::price_input::{parse_price_input, InvalidPrice, PriceField};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Done,
    Pending,
}

impl StatusFilter {
    fn admits(self, product: &Product) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Done => product.is_done(),
            StatusFilter::Pending => !product.is_done(),
        }
    }
}

/// Sync state of one row.
///
/// `Pending` and `Error` keep the values the row had before the last
/// optimistic change; on failure the row has already been restored to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Clean,
    Pending { snapshot: Product },
    Error { snapshot: Product, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRow {
    pub product: Product,
    pub state: RowState,
}

impl AdminRow {
    fn clean(product: Product) -> Self {
        Self {
            product,
            state: RowState::Clean,
        }
    }
}

/// Proof that the user was asked to confirm a delete. Only the most recent
/// request can be confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    id: Uuid,
    token: u64,
}

impl DeleteConfirmation {
    #[must_use]
    pub fn product_id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Price must be a valid number")]
    InvalidPrice(#[from] InvalidPrice),
    #[error("no product with id {0} in the table")]
    UnknownProduct(Uuid),
    #[error("delete was not confirmed")]
    DeleteNotConfirmed,
    #[error(transparent)]
    Request(#[from] ClientError),
}

/// A price edit applied locally and waiting to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCommit {
    id: Uuid,
    patch: ProductPatch,
}

impl PriceCommit {
    #[must_use]
    pub fn product_id(&self) -> Uuid {
        self.id
    }

    pub async fn send<A: ProductApi + ?Sized>(self, api: &A) -> CommitOutcome {
        let result = api.update_product(self.id, &self.patch).await;
        CommitOutcome {
            id: self.id,
            result,
        }
    }
}

/// The server's answer to a [`PriceCommit`].
#[derive(Debug)]
pub struct CommitOutcome {
    id: Uuid,
    result: Result<Product, ClientError>,
}

pub struct AdminTable<A: ProductApi> {
    api: A,
    rows: Vec<AdminRow>,
    search: String,
    filter: StatusFilter,
    delete_request: Option<DeleteConfirmation>,
    next_token: u64,
}

impl<A: ProductApi> AdminTable<A> {
    /// An empty table; call [`AdminTable::refresh`] to load the catalog.
    pub fn new(api: A) -> Self {
        Self {
            api,
            rows: Vec::new(),
            search: String::new(),
            filter: StatusFilter::All,
            delete_request: None,
            next_token: 0,
        }
    }

    /// Replace the local list with the server's. Every row starts clean.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Request`] if the list cannot be fetched; the
    /// current rows are kept.
    pub async fn refresh(&mut self) -> Result<(), AdminError> {
        let list = self.api.list_products().await?;
        self.rows = list.products.into_iter().map(AdminRow::clean).collect();
        self.delete_request = None;
        Ok(())
    }

    #[must_use]
    pub fn rows(&self) -> &[AdminRow] {
        &self.rows
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// Rows matching the search text (case-insensitive, on name or item code)
    /// and the status filter, in list order.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<&AdminRow> {
        let needle = self.search.trim().to_lowercase();
        self.rows
            .iter()
            .filter(|row| {
                needle.is_empty()
                    || row.product.name.to_lowercase().contains(&needle)
                    || row.product.item_code.to_lowercase().contains(&needle)
            })
            .filter(|row| self.filter.admits(&row.product))
            .collect()
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::of(self.rows.iter().map(|row| &row.product))
    }

    /// Commit a price cell (blur or Enter). The new value shows immediately;
    /// if the server refuses it the row reverts and carries the error.
    ///
    /// Shorthand for [`AdminTable::begin_commit`], [`PriceCommit::send`] and
    /// [`AdminTable::finish_commit`] when nothing needs to render the row
    /// while it is pending.
    ///
    /// # Errors
    ///
    /// - [`AdminError::InvalidPrice`] for non-numeric text; nothing is sent.
    /// - [`AdminError::UnknownProduct`] if `id` is not in the table.
    /// - [`AdminError::Request`] if the update failed and was rolled back.
    pub async fn commit_price(
        &mut self,
        id: Uuid,
        field: PriceField,
        text: &str,
    ) -> Result<(), AdminError> {
        let commit = self.begin_commit(id, field, text)?;
        let outcome = commit.send(&self.api).await;
        self.finish_commit(outcome)
    }

    /// Apply a price edit locally and mark the row `Pending`. The returned
    /// commit is sent with [`PriceCommit::send`] against [`AdminTable::api`],
    /// which only borrows the table, so rows can be read while it runs.
    ///
    /// # Errors
    ///
    /// - [`AdminError::InvalidPrice`] for non-numeric text; the row is left
    ///   untouched.
    /// - [`AdminError::UnknownProduct`] if `id` is not in the table.
    pub fn begin_commit(
        &mut self,
        id: Uuid,
        field: PriceField,
        text: &str,
    ) -> Result<PriceCommit, AdminError> {
        let price = parse_price_input(text)?;
        let patch = match field {
            PriceField::Retail => ProductPatch {
                retail_price: Some(price),
                ..ProductPatch::default()
            },
            PriceField::Bulk => ProductPatch {
                bulk_price: Some(price),
                ..ProductPatch::default()
            },
        };

        let row = self.row_mut(id)?;
        let snapshot = match &row.state {
            // Stacked edits roll back to the last value the server confirmed.
            RowState::Pending { snapshot } => snapshot.clone(),
            RowState::Clean | RowState::Error { .. } => row.product.clone(),
        };
        patch.apply_to(&mut row.product);
        row.state = RowState::Pending { snapshot };

        Ok(PriceCommit { id, patch })
    }

    /// Settle a sent commit: keep the server's copy of the row, or restore
    /// the snapshot and record the error.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Request`] if the update failed and was rolled
    /// back.
    pub fn finish_commit(&mut self, outcome: CommitOutcome) -> Result<(), AdminError> {
        self.settle(outcome.id, outcome.result.map(Some))
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Submit the add-product form. The created product is appended to the
    /// end of the list.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Request`] carrying the server's message.
    pub async fn add_product(&mut self, form: &NewProductForm) -> Result<&Product, AdminError> {
        let created = self.api.create_product(form).await?;
        tracing::debug!(product_id = %created.id, "product added");
        self.rows.push(AdminRow::clean(created));
        let last = self.rows.len() - 1;
        Ok(&self.rows[last].product)
    }

    /// First step of a delete: ask for confirmation. A new request replaces
    /// any earlier unconfirmed one.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::UnknownProduct`] if `id` is not in the table.
    pub fn request_delete(&mut self, id: Uuid) -> Result<DeleteConfirmation, AdminError> {
        self.position(id)?;
        self.next_token += 1;
        let confirmation = DeleteConfirmation {
            id,
            token: self.next_token,
        };
        self.delete_request = Some(confirmation.clone());
        Ok(confirmation)
    }

    pub fn cancel_delete(&mut self) {
        self.delete_request = None;
    }

    /// Second step of a delete. The row disappears at once and is put back
    /// in its former position if the server refuses.
    ///
    /// # Errors
    ///
    /// - [`AdminError::DeleteNotConfirmed`] if `confirmation` is stale.
    /// - [`AdminError::UnknownProduct`] if the row is already gone.
    /// - [`AdminError::Request`] if the delete failed and was rolled back.
    pub async fn confirm_delete(
        &mut self,
        confirmation: DeleteConfirmation,
    ) -> Result<(), AdminError> {
        if self.delete_request.as_ref() != Some(&confirmation) {
            return Err(AdminError::DeleteNotConfirmed);
        }
        self.delete_request = None;

        let id = confirmation.id;
        let index = self.position(id)?;
        let removed = self.rows.remove(index);

        match self.api.delete_product(id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(product_id = %id, error = %e, "delete failed, restoring row");
                let snapshot = removed.product.clone();
                let restored = AdminRow {
                    product: removed.product,
                    state: RowState::Error {
                        snapshot,
                        message: e.to_string(),
                    },
                };
                self.rows.insert(index.min(self.rows.len()), restored);
                Err(e.into())
            }
        }
    }

    fn settle(
        &mut self,
        id: Uuid,
        outcome: Result<Option<Product>, ClientError>,
    ) -> Result<(), AdminError> {
        let Ok(index) = self.position(id) else {
            // Row removed while the request was in flight.
            return outcome.map(|_| ()).map_err(AdminError::from);
        };
        let row = &mut self.rows[index];
        let snapshot = match std::mem::replace(&mut row.state, RowState::Clean) {
            RowState::Pending { snapshot } | RowState::Error { snapshot, .. } => snapshot,
            RowState::Clean => row.product.clone(),
        };

        match outcome {
            Ok(updated) => {
                if let Some(updated) = updated {
                    row.product = updated;
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(product_id = %id, error = %e, "price update failed, rolling back");
                row.product = snapshot.clone();
                row.state = RowState::Error {
                    snapshot,
                    message: e.to_string(),
                };
                Err(e.into())
            }
        }
    }

    fn position(&self, id: Uuid) -> Result<usize, AdminError> {
        self.rows
            .iter()
            .position(|row| row.product.id == id)
            .ok_or(AdminError::UnknownProduct(id))
    }

    fn row_mut(&mut self, id: Uuid) -> Result<&mut AdminRow, AdminError> {
        let index = self.position(id)?;
        Ok(&mut self.rows[index])
    }
}
