//! Pricing session: one product at a time, in list order, with debounced
//! autosave of the two price inputs.
//!
//! Every keystroke cancels the armed autosave and arms a new one, so a burst
//! of typing produces a single write once the input has been quiet for the
//! debounce window. "Save & Next" disarms the timer and saves immediately.

use std::sync::Arc;
use std::time::Duration;

use portal_core::{Product, ProductPatch, Progress};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ProductApi;
use crate::error::ClientError;
use crate::price_input::{format_price_input, parse_price_input, PriceField};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    /// A write is queued behind the debounce window or in flight.
    Saving,
    Saved,
    Failed(String),
}

/// Outcome of "Save & Next".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the product at this position.
    Moved(usize),
    /// Saved, but this was the last product.
    Completed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{field} price must be a valid number")]
    InvalidPrice { field: PriceField },
    #[error("Failed to load products: {0}")]
    Load(#[source] ClientError),
    #[error("Failed to save product pricing: {0}")]
    Save(#[source] ClientError),
}

/// What the session screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub product: Option<Product>,
    pub position: usize,
    pub total: usize,
    pub has_next: bool,
    pub retail_input: String,
    pub bulk_input: String,
    pub status: SaveStatus,
    pub progress: Progress,
}

#[derive(Debug)]
struct SessionState {
    products: Vec<Product>,
    index: usize,
    retail_input: String,
    bulk_input: String,
    status: SaveStatus,
    progress: Progress,
}

impl SessionState {
    fn current(&self) -> Option<&Product> {
        self.products.get(self.index)
    }

    /// Reset both input buffers to the current product's stored prices.
    fn load_inputs(&mut self) {
        let (retail, bulk) = self
            .current()
            .map_or((None, None), |p| (p.retail_price, p.bulk_price));
        self.retail_input = format_price_input(retail);
        self.bulk_input = format_price_input(bulk);
    }
}

struct PendingSave {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct PricingSession<A: ProductApi + 'static> {
    api: Arc<A>,
    state: Arc<Mutex<SessionState>>,
    /// Held for the whole of a write so updates reach the server in order.
    writes: Arc<Mutex<()>>,
    debounce: Duration,
    pending: Option<PendingSave>,
    /// Superseded autosaves whose timer may already have fired.
    superseded: Vec<JoinHandle<()>>,
}

impl<A: ProductApi + 'static> PricingSession<A> {
    /// Fetch the catalog and open the session on its first product.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Load`] if the list cannot be fetched.
    pub async fn start(api: Arc<A>) -> Result<Self, SessionError> {
        let list = api.list_products().await.map_err(SessionError::Load)?;
        let mut state = SessionState {
            products: list.products,
            index: 0,
            retail_input: String::new(),
            bulk_input: String::new(),
            status: SaveStatus::Idle,
            progress: list.progress,
        };
        state.load_inputs();

        Ok(Self {
            api,
            state: Arc::new(Mutex::new(state)),
            writes: Arc::new(Mutex::new(())),
            debounce: DEFAULT_DEBOUNCE,
            pending: None,
            superseded: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub async fn edit_retail(&mut self, text: impl Into<String>) {
        self.state.lock().await.retail_input = text.into();
        self.arm_autosave().await;
    }

    pub async fn edit_bulk(&mut self, text: impl Into<String>) {
        self.state.lock().await.bulk_input = text.into();
        self.arm_autosave().await;
    }

    /// Cancel any armed autosave, save the current inputs now and, only if
    /// that worked, move to the next product.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidPrice`] if an input holds non-numeric text;
    ///   nothing is sent.
    /// - [`SessionError::Save`] if the server refused the update.
    pub async fn save_and_next(&mut self) -> Result<Advance, SessionError> {
        self.disarm().await;
        persist(&*self.api, &self.state, &self.writes).await?;

        let mut state = self.state.lock().await;
        if state.index + 1 < state.products.len() {
            state.index += 1;
            state.load_inputs();
            Ok(Advance::Moved(state.index))
        } else {
            tracing::info!("reached the last product");
            Ok(Advance::Completed)
        }
    }

    /// Wait for the armed autosave, and any earlier one still writing, to
    /// finish.
    pub async fn settle(&mut self) {
        if let Some(pending) = self.pending.take() {
            join_autosave(pending.handle).await;
        }
        self.join_superseded().await;
    }

    pub async fn view(&self) -> SessionView {
        let state = self.state.lock().await;
        SessionView {
            product: state.current().cloned(),
            position: state.index,
            total: state.products.len(),
            has_next: state.index + 1 < state.products.len(),
            retail_input: state.retail_input.clone(),
            bulk_input: state.bulk_input.clone(),
            status: state.status.clone(),
            progress: state.progress,
        }
    }

    async fn arm_autosave(&mut self) {
        if let Some(previous) = self.pending.take() {
            previous.token.cancel();
            if !previous.handle.is_finished() {
                self.superseded.push(previous.handle);
            }
        }
        self.state.lock().await.status = SaveStatus::Saving;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let writes = Arc::clone(&self.writes);
        let delay = self.debounce;

        let handle = tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    if let Err(e) = persist(&*api, &state, &writes).await {
                        tracing::warn!(error = %e, "autosave failed");
                    }
                }
            }
        });

        self.pending = Some(PendingSave { token, handle });
    }

    /// Cancel the armed autosave and wait out every autosave that already
    /// fired, so nothing older can land after the next write.
    async fn disarm(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.token.cancel();
            join_autosave(pending.handle).await;
        }
        self.join_superseded().await;
    }

    async fn join_superseded(&mut self) {
        for handle in std::mem::take(&mut self.superseded) {
            join_autosave(handle).await;
        }
    }
}

async fn join_autosave(handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        tracing::warn!(error = %e, "autosave task failed");
    }
}

/// Write the buffered retail and bulk prices of the current product in one
/// update, then fold the server's copy back into the list by id.
///
/// The buffers are read only once `writes` is held, so a write queued behind
/// another always sends the newest input.
async fn persist<A: ProductApi + ?Sized>(
    api: &A,
    state: &Mutex<SessionState>,
    writes: &Mutex<()>,
) -> Result<(), SessionError> {
    let _write = writes.lock().await;
    let (id, patch) = {
        let mut state = state.lock().await;
        let Some(id) = state.current().map(|p| p.id) else {
            return Ok(());
        };

        let retail = match parse_price_input(&state.retail_input) {
            Ok(price) => price,
            Err(_) => return Err(fail(&mut state, PriceField::Retail)),
        };
        let bulk = match parse_price_input(&state.bulk_input) {
            Ok(price) => price,
            Err(_) => return Err(fail(&mut state, PriceField::Bulk)),
        };

        state.status = SaveStatus::Saving;
        (id, ProductPatch::prices(retail, bulk))
    };

    match api.update_product(id, &patch).await {
        Ok(updated) => {
            let mut state = state.lock().await;
            let saved_id = updated.id;
            if let Some(slot) = state.products.iter_mut().find(|p| p.id == saved_id) {
                *slot = updated;
            }
            state.progress = Progress::of(&state.products);
            state.status = SaveStatus::Saved;
            Ok(())
        }
        Err(e) => {
            let err = SessionError::Save(e);
            state.lock().await.status = SaveStatus::Failed(err.to_string());
            Err(err)
        }
    }
}

fn fail(state: &mut SessionState, field: PriceField) -> SessionError {
    let err = SessionError::InvalidPrice { field };
    state.status = SaveStatus::Failed(err.to_string());
    err
}
