//! # Courier Core
//!
//! Core traits for the courier ordering workflow.
//!
//! The workflow is split into a functional core and an imperative shell:
//!
//! - **State**: the per-user conversation stage
//! - **Action**: one inbound user input, already resolved by the shell
//! - **Reducer**: pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of what the shell should do next (reply, commit)
//! - **Environment**: read-only context injected by the shell (clock, catalog snapshot)
//!
//! Reducers never perform I/O. Everything that suspends (session cache, durable
//! store, transport) lives in the shell that interprets the effects.
//!
//! ## Example
//!
//! ```
//! use courier_core::reducer::Reducer;
//! use courier_core::{smallvec, SmallVec};
//!
//! struct Counter;
//!
//! impl Reducer for Counter {
//!     type State = u32;
//!     type Action = u32;
//!     type Environment = ();
//!     type Effect = String;
//!
//!     fn reduce(&self, state: &mut u32, by: u32, _env: &()) -> SmallVec<[String; 4]> {
//!         *state += by;
//!         smallvec![format!("count is {state}")]
//!     }
//! }
//!
//! let mut state = 0;
//! let effects = Counter.reduce(&mut state, 2, &());
//! assert_eq!(state, 2);
//! assert_eq!(effects[0], "count is 2");
//! ```

pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Reducer module - the core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They validate the action, update state in place, and return descriptions
/// of the effects the shell should carry out.
pub mod reducer {
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The input type this reducer processes
    /// - `Environment`: Read-only context the reducer may consult
    /// - `Effect`: Outward effect descriptions interpreted by the shell
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected, read-only context
        type Environment;

        /// The effect type handed back to the shell
        type Effect;

        /// Reduce an action into state changes and effects
        ///
        /// Implementations must be deterministic for a given state, action and
        /// environment. An action that is rejected must leave `state` untouched.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Self::Effect; 4]>;
    }
}

/// Environment module - injected dependencies
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
