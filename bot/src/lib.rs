//! # Courier Bot
//!
//! A conversational ordering workflow: each user walks a small state machine
//! (pick a product, enter quantity, phone, address and delivery slot) whose
//! session lives in a TTL cache, and completed orders are committed to a
//! durable store through a retrying gateway.
//!
//! ## Architecture
//!
//! ```text
//! Inbound → Route → WorkflowReducer → (Session, Effects) → Orchestrator
//!                                                          ├─ SessionStore (Redis)
//!                                                          └─ PersistenceGateway → OrderRepository (PostgreSQL)
//! ```
//!
//! The reducer is pure and synchronous. All I/O happens in the
//! [`orchestrator`], which is generic over the [`providers`] traits so tests
//! run against the in-memory [`mocks`].
//!
//! ## Example
//!
//! ```rust
//! use courier_bot::{Inbound, Orchestrator, PersistenceGateway, UserId, WorkflowConfig};
//! use courier_bot::mocks::{InMemoryOrderRepository, InMemorySessionStore};
//! use courier_core::environment::{Clock, SystemClock};
//! use courier_runtime::retry::RetryPolicy;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let orchestrator = Orchestrator::new(
//!     InMemorySessionStore::new(Arc::clone(&clock)),
//!     PersistenceGateway::new(InMemoryOrderRepository::with_default_catalog(), RetryPolicy::default()),
//!     clock,
//!     WorkflowConfig::default(),
//! );
//!
//! let effects = orchestrator.handle(Inbound::text(UserId::new(7), "/order")).await;
//! assert!(!effects.is_empty());
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod console;
pub mod effects;
pub mod environment;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod reducers;
pub mod session;
pub mod stores;
pub mod types;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::{Button, Inbound, InboundKind, WorkflowAction};
pub use config::{Config, WorkflowConfig};
pub use effects::{ChatEffect, Markup};
pub use error::{GatewayError, RepositoryError, StoreError, WorkflowError};
pub use gateway::PersistenceGateway;
pub use orchestrator::Orchestrator;
pub use reducers::WorkflowReducer;
pub use session::{Session, Stage};
pub use types::{Money, Order, OrderId, OrderStatus, Product, ProductId, Quantity, UserId};
