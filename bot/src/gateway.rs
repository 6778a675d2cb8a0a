//! Resilient persistence gateway.
//!
//! Wraps any [`OrderRepository`] with the fixed-delay retry from
//! `courier-runtime`. Infrastructure errors are retried up to the policy's
//! attempt budget; a missing record or a corrupt row fails immediately.
//!
//! Commits are not idempotent. If an insert reaches the database but its
//! acknowledgement is lost, the retry stores a second copy of the order.

use crate::error::{GatewayError, RepositoryError, RepositoryResult};
use crate::providers::OrderRepository;
use crate::types::{NewProduct, Order, OrderId, Product, ProductId, UserId};
use courier_runtime::retry::{RetryPolicy, retry_with_predicate};
use metrics::counter;
use std::future::Future;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Retrying decorator around an order repository.
///
/// The caller waits for the whole retry loop: up to
/// `max_attempts × delay` (15 seconds with the defaults) when the store is down.
#[derive(Debug, Clone)]
pub struct PersistenceGateway<R> {
    repository: R,
    policy: RetryPolicy,
}

impl<R: OrderRepository> PersistenceGateway<R> {
    /// Wrap `repository` with `policy`.
    #[must_use]
    pub const fn new(repository: R, policy: RetryPolicy) -> Self {
        Self { repository, policy }
    }

    /// The wrapped repository
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// The retry policy in use
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Durably store a completed order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] wrapping the last cause once the
    /// attempt budget is spent.
    pub async fn commit(&self, order: &Order) -> Result<OrderId> {
        let result = self
            .run("insert_order", || self.repository.insert_order(order))
            .await;

        match &result {
            Ok(order_id) => {
                counter!("courier_orders_committed_total").increment(1);
                tracing::info!(
                    order_id = %order_id,
                    user_id = %order.user_id,
                    product_id = %order.product_id,
                    total = %order.total_price,
                    "Order committed"
                );
            },
            Err(error) => {
                counter!("courier_commit_failures_total").increment(1);
                tracing::error!(user_id = %order.user_id, error = %error, "Order commit failed");
            },
        }
        result
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if it does not exist.
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        self.run("get_product", || async move {
            self.repository
                .get_product(id)
                .await?
                .ok_or_else(|| RepositoryError::product_not_found(id))
        })
        .await
    }

    /// Every product, available or not.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] if the store stays unreachable.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.run("list_products", || self.repository.list_products()).await
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if it does not exist.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.run("get_order", || async move {
            self.repository
                .get_order(id)
                .await?
                .ok_or_else(|| RepositoryError::order_not_found(id))
        })
        .await
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] if the store stays unreachable.
    pub async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        self.run("list_orders_for_user", || self.repository.list_orders_for_user(user_id))
            .await
    }

    /// Admin: create a product.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] if the store stays unreachable.
    pub async fn create_product(&self, product: &NewProduct) -> Result<ProductId> {
        let id = self
            .run("insert_product", || self.repository.insert_product(product))
            .await?;
        tracing::info!(product_id = %id, name = %product.name, "Product created");
        Ok(id)
    }

    /// Admin: overwrite a product's stock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the product does not exist.
    pub async fn update_stock(&self, id: ProductId, stock: i32) -> Result<()> {
        self.run("update_stock", || self.repository.update_stock(id, stock))
            .await?;
        tracing::info!(product_id = %id, stock, "Stock updated");
        Ok(())
    }

    /// Admin: flip a product's availability and return it as now stored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the product does not exist.
    pub async fn toggle_availability(&self, id: ProductId) -> Result<Product> {
        let mut product = self.get_product(id).await?;
        product.is_available = !product.is_available;

        let is_available = product.is_available;
        self.run("set_availability", || self.repository.set_availability(id, is_available))
            .await?;
        tracing::info!(product_id = %id, is_available, "Availability toggled");
        Ok(product)
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RepositoryResult<T>>,
    {
        retry_with_predicate(
            &self.policy,
            || {
                let pending = attempt();
                async move {
                    let result = pending.await;
                    if result.is_err() {
                        counter!("courier_commit_attempts_failed_total", "operation" => operation).increment(1);
                    }
                    result
                }
            },
            RepositoryError::is_transient,
        )
        .await
        .map_err(|failure| GatewayError::from_failure(operation, failure.attempts, failure.error))
    }
}
