//! Workflow reducers.
//!
//! Pure functions: `(Session, WorkflowAction, WorkflowEnvironment) → (Session, Effects)`.
//! A rejected input returns a single `ShowError` and leaves the session untouched.

mod admin;
mod ordering;

use crate::actions::WorkflowAction;
use crate::effects::ChatEffect;
use crate::environment::WorkflowEnvironment;
use crate::session::{Session, Stage};
use crate::validation::ValidationError;
use courier_core::reducer::Reducer;
use courier_core::{SmallVec, smallvec};

/// Effects returned by one reduction.
pub type Effects = SmallVec<[ChatEffect; 4]>;

/// The conversational ordering state machine.
///
/// Routes each action to the ordering dialogue or the admin sub-flow depending
/// on the action and the current stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowReducer;

impl WorkflowReducer {
    /// Create a new workflow reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for WorkflowReducer {
    type State = Session;
    type Action = WorkflowAction;
    type Environment = WorkflowEnvironment;
    type Effect = ChatEffect;

    fn reduce(&self, session: &mut Session, action: WorkflowAction, env: &WorkflowEnvironment) -> Effects {
        match action {
            // ═══════════════════════════════════════════════════════════
            // Navigation
            // ═══════════════════════════════════════════════════════════
            WorkflowAction::Reset => {
                session.stage = Stage::Start;
                smallvec![ChatEffect::ResetToMenu]
            },
            WorkflowAction::Cancel => ordering::cancel(session),

            // ═══════════════════════════════════════════════════════════
            // Ordering dialogue
            // ═══════════════════════════════════════════════════════════
            WorkflowAction::BeginOrder => ordering::begin_order(session, env),
            WorkflowAction::PickProduct(product_id) => ordering::pick_product(session, product_id, env),
            WorkflowAction::BeginRepeat { previous } => ordering::begin_repeat(session, previous, env),
            WorkflowAction::Contact(raw) => ordering::on_contact(session, &raw),
            WorkflowAction::Confirm => ordering::confirm(session, env),

            // ═══════════════════════════════════════════════════════════
            // Free input, routed by stage
            // ═══════════════════════════════════════════════════════════
            WorkflowAction::Text(text) => {
                if matches!(session.stage, Stage::Admin(_)) {
                    admin::on_text(session, &text)
                } else {
                    ordering::on_text(session, &text, env)
                }
            },
            WorkflowAction::Photo(file_id) => {
                if matches!(session.stage, Stage::Admin(_)) {
                    admin::on_photo(session, file_id)
                } else {
                    reject(session, &ValidationError::UnexpectedInput)
                }
            },

            // ═══════════════════════════════════════════════════════════
            // Admin sub-flow
            // ═══════════════════════════════════════════════════════════
            WorkflowAction::BeginProductCreation => admin::begin_creation(session, env),
            WorkflowAction::BeginStockUpdate(product_id) => admin::begin_stock_update(session, product_id, env),
        }
    }
}

/// Rejects the input without touching the session.
fn reject(session: &Session, error: &ValidationError) -> Effects {
    tracing::debug!(
        user_id = %session.user_id,
        stage = session.stage_name(),
        error = %error,
        "Input rejected"
    );
    metrics::counter!("courier_validation_failures_total", "stage" => session.stage_name()).increment(1);
    smallvec![ChatEffect::error(error)]
}
