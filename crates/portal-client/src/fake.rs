//! In-memory [`ProductApi`] for exercising the UI state machines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use portal_core::{Product, ProductPatch, Progress};
use uuid::Uuid;

use crate::api::{NewProductForm, ProductApi, ProductList};
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    List,
    Create(NewProductForm),
    Update(Uuid, ProductPatch),
    Delete(Uuid),
}

#[derive(Default)]
pub(crate) struct FakeApi {
    products: Mutex<Vec<Product>>,
    calls: Mutex<Vec<Call>>,
    pub(crate) fail_writes: AtomicBool,
    update_delay: Mutex<Option<Duration>>,
}

pub(crate) fn product(name: &str) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        item_code: format!("{name}-001"),
        image_url: format!("https://images.example.com/{name}.jpg"),
        retail_price: None,
        bulk_price: None,
        created_at: now,
        updated_at: now,
    }
}

impl FakeApi {
    pub(crate) fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn updates(&self) -> Vec<(Uuid, ProductPatch)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(id, patch) => Some((id, patch)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn stored(&self) -> Vec<Product> {
        self.products.lock().expect("products lock").clone()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Make every update take `delay` before it is applied.
    pub(crate) fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.lock().expect("delay lock") = Some(delay);
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn check_failure(&self) -> Result<(), ClientError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                message: "database query failed".to_string(),
            });
        }
        Ok(())
    }

    fn not_found() -> ClientError {
        ClientError::Status {
            status: 404,
            message: "Product not found".to_string(),
        }
    }
}

#[async_trait]
impl ProductApi for FakeApi {
    async fn list_products(&self) -> Result<ProductList, ClientError> {
        self.record(Call::List);
        let products = self.stored();
        let progress = Progress::of(&products);
        Ok(ProductList { products, progress })
    }

    async fn create_product(&self, form: &NewProductForm) -> Result<Product, ClientError> {
        self.record(Call::Create(form.clone()));
        self.check_failure()?;
        let mut created = product(&form.name);
        created.item_code.clone_from(&form.item_code);
        created.image_url.clone_from(&form.image_url);
        self.products
            .lock()
            .expect("products lock")
            .push(created.clone());
        Ok(created)
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: &ProductPatch,
    ) -> Result<Product, ClientError> {
        self.record(Call::Update(id, patch.clone()));
        let delay = *self.update_delay.lock().expect("delay lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;
        let mut products = self.products.lock().expect("products lock");
        let stored = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(Self::not_found)?;
        patch.apply_to(stored);
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_product(&self, id: Uuid) -> Result<(), ClientError> {
        self.record(Call::Delete(id));
        self.check_failure()?;
        let mut products = self.products.lock().expect("products lock");
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }
}
