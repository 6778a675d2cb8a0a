//! Mock order repository for testing.

use crate::error::{RepositoryError, RepositoryResult};
use crate::providers::OrderRepository;
use crate::stores::default_products;
use crate::types::{NewProduct, Order, OrderId, Product, ProductId, UserId};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    orders: Vec<Order>,
    next_order_id: i64,
    failures_remaining: usize,
    commit_failures_remaining: usize,
    insert_attempts: usize,
}

impl Tables {
    /// Consumes one injected failure, if any are pending.
    fn injected_failure(&mut self) -> RepositoryResult<()> {
        if self.failures_remaining == 0 {
            return Ok(());
        }
        self.failures_remaining -= 1;
        Err(RepositoryError::Database("connection refused (injected)".to_string()))
    }

    fn product_mut(&mut self, id: ProductId) -> RepositoryResult<&mut Product> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::product_not_found(id))
    }
}

/// In-memory order repository.
///
/// Ids are assigned sequentially from 1. Failures can be injected to exercise
/// the gateway's retry loop, either for the next calls whatever the operation
/// or for order inserts only.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryOrderRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository seeded with the default catalog.
    #[must_use]
    pub fn with_default_catalog() -> Self {
        let repository = Self::new();
        if let Ok(mut tables) = repository.tables.lock() {
            for (index, product) in default_products().into_iter().enumerate() {
                let id = ProductId::new(i32::try_from(index + 1).unwrap_or(i32::MAX));
                tables.products.insert(id, materialize(id, product));
            }
        }
        repository
    }

    /// Make the next `count` calls fail with a transient database error.
    pub fn fail_next(&self, count: usize) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.failures_remaining = count;
        }
    }

    /// Make the next `count` order inserts fail, leaving reads untouched.
    pub fn fail_next_commits(&self, count: usize) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.commit_failures_remaining = count;
        }
    }

    /// How many times `insert_order` was called, failed calls included.
    #[must_use]
    pub fn insert_attempts(&self) -> usize {
        self.tables.lock().map_or(0, |tables| tables.insert_attempts)
    }

    /// Stored orders in insertion order.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.tables.lock().map_or_else(|_| Vec::new(), |tables| tables.orders.clone())
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> RepositoryResult<T>) -> RepositoryResult<T> {
        let mut tables = self.lock()?;
        tables.injected_failure()?;
        f(&mut tables)
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Database("Mutex lock failed".to_string()))
    }
}

fn materialize(id: ProductId, product: NewProduct) -> Product {
    Product {
        id,
        name: product.name,
        description: product.description,
        price: product.price,
        image_url: product.image_url,
        stock: product.stock,
        is_available: true,
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn get_product(&self, id: ProductId) -> impl Future<Output = RepositoryResult<Option<Product>>> + Send {
        let result = self.with_tables(|tables| Ok(tables.products.get(&id).cloned()));
        async move { result }
    }

    fn list_products(&self) -> impl Future<Output = RepositoryResult<Vec<Product>>> + Send {
        let result = self.with_tables(|tables| Ok(tables.products.values().cloned().collect()));
        async move { result }
    }

    fn insert_order(&self, order: &Order) -> impl Future<Output = RepositoryResult<OrderId>> + Send {
        let result = self.lock().and_then(|mut tables| {
            tables.insert_attempts += 1;
            if tables.commit_failures_remaining > 0 {
                tables.commit_failures_remaining -= 1;
                return Err(RepositoryError::Database("connection reset (injected)".to_string()));
            }
            tables.injected_failure()?;

            tables.next_order_id += 1;
            let id = OrderId::new(tables.next_order_id);
            let mut stored = order.clone();
            stored.id = Some(id);
            tables.orders.push(stored);
            Ok(id)
        });
        async move { result }
    }

    fn get_order(&self, id: OrderId) -> impl Future<Output = RepositoryResult<Option<Order>>> + Send {
        let result = self.with_tables(|tables| {
            Ok(tables.orders.iter().find(|order| order.id == Some(id)).cloned())
        });
        async move { result }
    }

    fn list_orders_for_user(&self, user_id: UserId) -> impl Future<Output = RepositoryResult<Vec<Order>>> + Send {
        let result = self.with_tables(|tables| {
            Ok(tables
                .orders
                .iter()
                .rev()
                .filter(|order| order.user_id == user_id)
                .cloned()
                .collect())
        });
        async move { result }
    }

    fn insert_product(&self, product: &NewProduct) -> impl Future<Output = RepositoryResult<ProductId>> + Send {
        let result = self.with_tables(|tables| {
            let next = tables.products.keys().next_back().map_or(1, |id| id.value() + 1);
            let id = ProductId::new(next);
            tables.products.insert(id, materialize(id, product.clone()));
            Ok(id)
        });
        async move { result }
    }

    fn update_stock(&self, id: ProductId, stock: i32) -> impl Future<Output = RepositoryResult<()>> + Send {
        let result = self.with_tables(|tables| {
            tables.product_mut(id)?.stock = stock;
            Ok(())
        });
        async move { result }
    }

    fn set_availability(&self, id: ProductId, is_available: bool) -> impl Future<Output = RepositoryResult<()>> + Send {
        let result = self.with_tables(|tables| {
            tables.product_mut(id)?.is_available = is_available;
            Ok(())
        });
        async move { result }
    }
}
