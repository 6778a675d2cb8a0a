//! Provider traits for the workflow's external collaborators.
//!
//! These traits are the seams between the orchestrator and infrastructure:
//! production code plugs in Redis and `PostgreSQL`, tests plug in the in-memory
//! implementations from [`crate::mocks`].

pub mod repository;
pub mod session;

pub use repository::OrderRepository;
pub use session::SessionStore;
