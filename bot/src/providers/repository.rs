//! Durable order and product storage.

use crate::error::RepositoryResult;
use crate::types::{NewProduct, Order, OrderId, Product, ProductId, UserId};
use std::future::Future;

/// Durable store for products and orders.
///
/// Implementations only deal with persistence mechanics. Business rules are
/// enforced before an order reaches the repository, and retries are layered
/// on top by [`crate::gateway::PersistenceGateway`].
///
/// Infrastructure failures must be reported as
/// [`RepositoryError::Database`](crate::error::RepositoryError::Database) so
/// the gateway can retry them.
pub trait OrderRepository: Send + Sync {
    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn get_product(&self, id: ProductId) -> impl Future<Output = RepositoryResult<Option<Product>>> + Send;

    /// Every product, available or not, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn list_products(&self) -> impl Future<Output = RepositoryResult<Vec<Product>>> + Send;

    /// Insert an order and return its new id.
    ///
    /// Not idempotent: calling it twice stores two orders.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    fn insert_order(&self, order: &Order) -> impl Future<Output = RepositoryResult<OrderId>> + Send;

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn get_order(&self, id: OrderId) -> impl Future<Output = RepositoryResult<Option<Order>>> + Send;

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    fn list_orders_for_user(&self, user_id: UserId) -> impl Future<Output = RepositoryResult<Vec<Order>>> + Send;

    /// Insert a product (available by default) and return its new id.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    fn insert_product(&self, product: &NewProduct) -> impl Future<Output = RepositoryResult<ProductId>> + Send;

    /// Overwrite a product's stock.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or error if the update fails.
    fn update_stock(&self, id: ProductId, stock: i32) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Show or hide a product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or error if the update fails.
    fn set_availability(&self, id: ProductId, is_available: bool) -> impl Future<Output = RepositoryResult<()>> + Send;
}
