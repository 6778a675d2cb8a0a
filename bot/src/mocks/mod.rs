//! In-memory providers for tests and the offline console mode.
//!
//! Both mocks are cheap to clone and clones share state, so a test can keep a
//! handle for inspection while the orchestrator owns another.

pub mod repository;
pub mod session;

pub use repository::InMemoryOrderRepository;
pub use session::InMemorySessionStore;
