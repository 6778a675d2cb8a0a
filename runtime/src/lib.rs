//! # Courier Runtime
//!
//! Helpers for the imperative shell around the courier workflow.
//!
//! The only piece that lives here today is [`retry`]: a bounded, fixed-delay
//! retry loop used to absorb transient infrastructure failures when talking
//! to the durable store.

pub mod retry;

pub use retry::{RetryFailure, RetryPolicy, retry_with_delay, retry_with_predicate};
