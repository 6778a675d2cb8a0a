//! Storage implementations for the ordering workflow.
//!
//! - **Session Store** (Redis) - volatile per-user dialogue state with idle TTL
//! - **Order Repository** (`PostgreSQL`) - durable products and orders

pub mod order_postgres;
pub mod session_redis;

// Re-exports
pub use order_postgres::PostgresOrderRepository;
pub use session_redis::RedisSessionStore;

use crate::types::{Money, NewProduct};

/// Products seeded into an empty catalog.
#[must_use]
pub fn default_products() -> Vec<NewProduct> {
    [("Вода 19л", 29_999), ("Вода 5л", 12_999), ("Вода 0.5л", 4_999)]
        .into_iter()
        .map(|(name, kopecks)| NewProduct {
            name: name.to_string(),
            description: format!("Питьевая вода, {}", name.trim_start_matches("Вода ")),
            price: Money::from_kopecks(kopecks),
            image_url: None,
            stock: 100,
        })
        .collect()
}
