//! Commerce backend abstraction
//!
//! The bot only reads the catalog and mutates carts and customers; prices,
//! stock and totals are computed by the backend.

mod elasticpath;
mod token;
mod types;

pub use elasticpath::{ElasticPathClient, DEFAULT_BASE_URL};
pub use types::{Cart, CartItem, Customer, CustomerOutcome, Product};

use crate::error::BackendError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Operations the storefront needs from the commerce backend
#[async_trait]
pub trait CommerceService: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError>;

    async fn get_product(&self, product_id: &str) -> Result<Product, BackendError>;

    /// Resolve an image file id into a public URL
    async fn get_file_href(&self, file_id: &str) -> Result<String, BackendError>;

    async fn add_to_cart(
        &self,
        reference: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), BackendError>;

    /// Cart contents with per-line and grand totals
    async fn get_cart(&self, reference: &str) -> Result<Cart, BackendError>;

    async fn remove_cart_item(&self, reference: &str, cart_item_id: &str)
        -> Result<(), BackendError>;

    /// Duplicate (409) and invalid (422) submissions are outcomes, not errors
    async fn create_customer(&self, name: &str, email: &str)
        -> Result<CustomerOutcome, BackendError>;
}

/// Logging wrapper for commerce services
pub struct LoggingCommerce {
    inner: Arc<dyn CommerceService>,
}

impl LoggingCommerce {
    pub fn new(inner: Arc<dyn CommerceService>) -> Self {
        Self { inner }
    }
}

fn log_call<T>(operation: &'static str, started: Instant, result: &Result<T, BackendError>) {
    let duration_ms = started.elapsed().as_millis();
    match result {
        Ok(_) => {
            tracing::info!(operation, duration_ms = %duration_ms, "commerce call completed");
        }
        Err(e) => {
            tracing::error!(
                operation,
                duration_ms = %duration_ms,
                status = ?e.status,
                error = %e.message,
                "commerce call failed"
            );
        }
    }
}

#[async_trait]
impl CommerceService for LoggingCommerce {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let start = Instant::now();
        let result = self.inner.list_products().await;
        log_call("list_products", start, &result);
        result
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, BackendError> {
        let start = Instant::now();
        let result = self.inner.get_product(product_id).await;
        log_call("get_product", start, &result);
        result
    }

    async fn get_file_href(&self, file_id: &str) -> Result<String, BackendError> {
        let start = Instant::now();
        let result = self.inner.get_file_href(file_id).await;
        log_call("get_file_href", start, &result);
        result
    }

    async fn add_to_cart(
        &self,
        reference: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let start = Instant::now();
        let result = self.inner.add_to_cart(reference, product_id, quantity).await;
        log_call("add_to_cart", start, &result);
        result
    }

    async fn get_cart(&self, reference: &str) -> Result<Cart, BackendError> {
        let start = Instant::now();
        let result = self.inner.get_cart(reference).await;
        log_call("get_cart", start, &result);
        result
    }

    async fn remove_cart_item(
        &self,
        reference: &str,
        cart_item_id: &str,
    ) -> Result<(), BackendError> {
        let start = Instant::now();
        let result = self.inner.remove_cart_item(reference, cart_item_id).await;
        log_call("remove_cart_item", start, &result);
        result
    }

    async fn create_customer(
        &self,
        name: &str,
        email: &str,
    ) -> Result<CustomerOutcome, BackendError> {
        let start = Instant::now();
        let result = self.inner.create_customer(name, email).await;
        log_call("create_customer", start, &result);
        result
    }
}
