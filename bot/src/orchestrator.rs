//! The imperative shell around the workflow reducer.
//!
//! For every inbound event the orchestrator:
//!
//! 1. loads the user's session (a fresh `Start` session if absent or expired)
//! 2. resolves the event into a [`Route`] against the current stage
//! 3. for reducer routes, reads the catalog if the step needs it, reduces, and
//!    persists the session whether or not the input was accepted
//! 4. carries out the persistence effects (`SubmitOrder`, admin writes)
//!    through the gateway and replaces them with what the user should see
//!
//! A session back at `Start` is deleted rather than written: an absent session
//! and a fresh one are the same thing, so submit and cancel both leave nothing
//! behind. Every other session is written on every input, which is what keeps
//! the idle expiry sliding.
//!
//! Infrastructure failures never escape [`Orchestrator::handle`]; they are
//! logged with the user id and answered with a generic apology.

use crate::actions::{Button, Inbound, Route, WorkflowAction};
use crate::config::WorkflowConfig;
use crate::effects::{ChatEffect, Choice, Markup, OrderHistoryEntry};
use crate::environment::{Catalog, WorkflowEnvironment};
use crate::error::{GatewayError, WorkflowError};
use crate::gateway::PersistenceGateway;
use crate::prompts;
use crate::providers::{OrderRepository, SessionStore};
use crate::reducers::WorkflowReducer;
use crate::session::{Session, Stage};
use crate::types::{NewProduct, Order, OrderId, Product, ProductId, UserId};
use crate::validation::ValidationError;
use courier_core::environment::Clock;
use courier_core::reducer::Reducer;
use std::sync::Arc;

/// Result type alias for one handled input.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Runs inbound events through the workflow for any session store and repository.
pub struct Orchestrator<S, R> {
    sessions: S,
    gateway: PersistenceGateway<R>,
    reducer: WorkflowReducer,
    clock: Arc<dyn Clock>,
    config: WorkflowConfig,
}

impl<S: SessionStore, R: OrderRepository> Orchestrator<S, R> {
    /// Wire an orchestrator from its collaborators.
    #[must_use]
    pub fn new(sessions: S, gateway: PersistenceGateway<R>, clock: Arc<dyn Clock>, config: WorkflowConfig) -> Self {
        Self {
            sessions,
            gateway,
            reducer: WorkflowReducer::new(),
            clock,
            config,
        }
    }

    /// The session store
    #[must_use]
    pub const fn sessions(&self) -> &S {
        &self.sessions
    }

    /// The persistence gateway
    #[must_use]
    pub const fn gateway(&self) -> &PersistenceGateway<R> {
        &self.gateway
    }

    /// The workflow settings
    #[must_use]
    pub const fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Handle one inbound event and return what the transport should render.
    ///
    /// Never fails: infrastructure errors become a single apology.
    pub async fn handle(&self, inbound: Inbound) -> Vec<ChatEffect> {
        let user_id = inbound.user_id;

        match self.try_handle(inbound).await {
            Ok(effects) => effects,
            Err(error) => {
                tracing::error!(user_id = %user_id, error = %error, "Failed to handle input");
                vec![ChatEffect::ShowError(prompts::APOLOGY.to_string())]
            },
        }
    }

    async fn try_handle(&self, inbound: Inbound) -> Result<Vec<ChatEffect>> {
        let session = self.load_session(inbound.user_id).await?;
        let route = Route::resolve(inbound.kind, &session.stage);
        tracing::debug!(user_id = %session.user_id, stage = session.stage_name(), route = ?route, "Routing input");

        let effects = match route {
            Route::Reduce(action) => return self.reduce_and_persist(session, action).await,
            Route::Repeat(order_id) => match self.previous_order(order_id).await? {
                Some(previous) => {
                    return self
                        .reduce_and_persist(session, WorkflowAction::BeginRepeat { previous })
                        .await;
                },
                None => vec![ChatEffect::error(&ValidationError::OrderNotFound)],
            },
            Route::ShowMenu => vec![ChatEffect::prompt_with(prompts::MAIN_MENU, Markup::MainMenu)],
            Route::ShowCatalog => self.show_catalog().await?,
            Route::ShowHistory => self.show_history(session.user_id).await?,
            Route::AdminMenu | Route::AdminStockPicker | Route::AdminTogglePicker | Route::ToggleProduct(_)
                if !self.is_admin(session.user_id) =>
            {
                tracing::warn!(user_id = %session.user_id, "Non-admin attempted admin action");
                vec![ChatEffect::error(&ValidationError::NotPermitted)]
            },
            Route::AdminMenu => vec![ChatEffect::prompt_with(prompts::ADMIN_MENU, Markup::AdminMenu)],
            Route::AdminStockPicker => {
                self.admin_picker(prompts::ADMIN_PICK_STOCK, |product| Button::UpdateStock(product.id))
                    .await?
            },
            Route::AdminTogglePicker => {
                self.admin_picker(prompts::ADMIN_PICK_TOGGLE, |product| Button::ToggleProduct(product.id))
                    .await?
            },
            Route::ToggleProduct(product_id) => self.toggle_product(product_id).await,
        };

        // Views leave the stage alone but still count as activity.
        self.persist(&session).await?;
        Ok(effects)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Session lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    async fn load_session(&self, user_id: UserId) -> Result<Session> {
        let session = self.sessions.get(user_id).await?;
        Ok(session.unwrap_or_else(|| {
            tracing::debug!(user_id = %user_id, "Starting fresh session");
            Session::new(user_id)
        }))
    }

    async fn persist(&self, session: &Session) -> Result<()> {
        if matches!(session.stage, Stage::Start) {
            self.sessions.delete(session.user_id).await?;
        } else {
            self.sessions.set(session, self.config.session_ttl).await?;
        }
        Ok(())
    }

    async fn reduce_and_persist(&self, mut session: Session, action: WorkflowAction) -> Result<Vec<ChatEffect>> {
        let env = self.environment(&action, &session.stage).await?;
        let effects = self.reducer.reduce(&mut session, action, &env);

        self.persist(&session).await?;

        let mut rendered = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                ChatEffect::SubmitOrder(order) => rendered.extend(self.submit(session.user_id, &order, &env).await),
                ChatEffect::CreateProduct(product) => rendered.extend(self.create_product(&product).await),
                ChatEffect::UpdateStock { product_id, stock } => {
                    rendered.extend(self.update_stock(product_id, stock).await);
                },
                outward => rendered.push(outward),
            }
        }
        Ok(rendered)
    }

    async fn environment(&self, action: &WorkflowAction, stage: &Stage) -> Result<WorkflowEnvironment> {
        let env = WorkflowEnvironment::new(Arc::clone(&self.clock), self.config.delivery).with_admin(self.config.admin);

        if !action.needs_catalog(stage) {
            return Ok(env);
        }
        let products = self.gateway.list_products().await?;
        Ok(env.with_catalog(Catalog::new(products)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Write path
    // ═══════════════════════════════════════════════════════════════════════

    /// Commits the order. On failure the session stays in `ConfirmingOrder`
    /// so a `Confirm` retries the submission.
    async fn submit(&self, user_id: UserId, order: &Order, env: &WorkflowEnvironment) -> Vec<ChatEffect> {
        let order_id = match self.gateway.commit(order).await {
            Ok(order_id) => order_id,
            Err(error) => {
                tracing::warn!(user_id = %user_id, error = %error, "Order kept in session for resubmission");
                return vec![
                    ChatEffect::ShowError(prompts::SUBMIT_FAILED.to_string()),
                    ChatEffect::prompt_with(prompts::RETRY_SUBMIT, Markup::ConfirmOrCancel),
                ];
            },
        };

        // The order is durable; a stale session only costs the user a /cancel.
        if let Err(error) = self.sessions.delete(user_id).await {
            tracing::warn!(user_id = %user_id, order_id = %order_id, error = %error, "Failed to clear session after commit");
        }

        let mut effects = vec![ChatEffect::ShowConfirmation {
            order_id,
            delivery_date: order.delivery_date,
            delivery_time: order.delivery_time,
        }];
        if let Some(admin) = self.config.admin {
            let product_name = env.catalog.find(order.product_id).map(|product| product.name.as_str());
            effects.push(ChatEffect::NotifyAdmin {
                admin,
                text: prompts::admin_notification(order_id, order, product_name),
            });
        }
        effects.push(ChatEffect::ResetToMenu);
        effects
    }

    async fn create_product(&self, product: &NewProduct) -> Vec<ChatEffect> {
        match self.gateway.create_product(product).await {
            Ok(_) => vec![ChatEffect::prompt_with(
                prompts::admin_product_created(&product.name),
                Markup::AdminMenu,
            )],
            Err(error) => admin_write_failed(&error),
        }
    }

    async fn update_stock(&self, product_id: ProductId, stock: i32) -> Vec<ChatEffect> {
        match self.gateway.update_stock(product_id, stock).await {
            Ok(()) => vec![ChatEffect::prompt_with(prompts::admin_stock_updated(stock), Markup::AdminMenu)],
            Err(error) => admin_write_failed(&error),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Views
    // ═══════════════════════════════════════════════════════════════════════

    async fn previous_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        match self.gateway.get_order(order_id).await {
            Ok(order) => Ok(Some(order)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn show_catalog(&self) -> Result<Vec<ChatEffect>> {
        let available: Vec<Product> = self
            .gateway
            .list_products()
            .await?
            .into_iter()
            .filter(|product| product.is_available)
            .collect();

        if available.is_empty() {
            return Ok(vec![ChatEffect::prompt_with(prompts::EMPTY_CATALOG, Markup::MainMenu)]);
        }
        Ok(vec![ChatEffect::ShowCatalog(available)])
    }

    async fn show_history(&self, user_id: UserId) -> Result<Vec<ChatEffect>> {
        let orders = self.gateway.list_orders_for_user(user_id).await?;
        if orders.is_empty() {
            return Ok(vec![ChatEffect::prompt_with(prompts::EMPTY_HISTORY, Markup::MainMenu)]);
        }

        let catalog = Catalog::new(self.gateway.list_products().await?);
        let entries = orders
            .into_iter()
            .map(|order| OrderHistoryEntry {
                product_name: catalog.find(order.product_id).map(|product| product.name.clone()),
                order,
            })
            .collect();
        Ok(vec![ChatEffect::ShowOrderHistory(entries)])
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Admin
    // ═══════════════════════════════════════════════════════════════════════

    fn is_admin(&self, user_id: UserId) -> bool {
        self.config.admin == Some(user_id)
    }

    async fn admin_picker(&self, header: &str, button: impl Fn(&Product) -> Button) -> Result<Vec<ChatEffect>> {
        let products = self.gateway.list_products().await?;
        if products.is_empty() {
            return Ok(vec![ChatEffect::prompt_with(prompts::EMPTY_CATALOG, Markup::AdminMenu)]);
        }

        let choices = products
            .iter()
            .map(|product| Choice::new(prompts::admin_product_label(product), button(product)))
            .collect();
        Ok(vec![ChatEffect::prompt_with(header, Markup::Choices(choices))])
    }

    async fn toggle_product(&self, product_id: ProductId) -> Vec<ChatEffect> {
        match self.gateway.toggle_availability(product_id).await {
            Ok(product) => vec![ChatEffect::prompt_with(prompts::admin_toggled(&product), Markup::AdminMenu)],
            Err(error) => admin_write_failed(&error),
        }
    }
}

impl<S, R> std::fmt::Debug for Orchestrator<S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn admin_write_failed(error: &GatewayError) -> Vec<ChatEffect> {
    if error.is_not_found() {
        return vec![ChatEffect::error(&ValidationError::UnknownProduct)];
    }
    tracing::error!(error = %error, "Admin catalog write failed");
    vec![ChatEffect::ShowError(prompts::ADMIN_SAVE_FAILED.to_string())]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::mocks::{InMemoryOrderRepository, InMemorySessionStore};
    use courier_runtime::retry::RetryPolicy;
    use courier_testing::{FixedClock, at};

    const USER: UserId = UserId::new(100);
    const ADMIN: UserId = UserId::new(1);

    fn orchestrator() -> Orchestrator<InMemorySessionStore, InMemoryOrderRepository> {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(at("2024-06-01T07:00:00Z")));
        Orchestrator::new(
            InMemorySessionStore::new(Arc::clone(&clock)),
            PersistenceGateway::new(InMemoryOrderRepository::with_default_catalog(), RetryPolicy::no_retry()),
            clock,
            WorkflowConfig::default().with_admin(Some(ADMIN)),
        )
    }

    #[tokio::test]
    async fn unknown_commands_show_the_menu() {
        let orchestrator = orchestrator();
        let effects = orchestrator.handle(Inbound::text(USER, "/launch")).await;
        assert_eq!(effects, vec![ChatEffect::prompt_with(prompts::MAIN_MENU, Markup::MainMenu)]);
    }

    #[tokio::test]
    async fn session_store_outage_is_an_apology() {
        let orchestrator = orchestrator();
        orchestrator.sessions().set_unavailable(true);

        let effects = orchestrator.handle(Inbound::text(USER, "/order")).await;
        assert_eq!(effects, vec![ChatEffect::ShowError(prompts::APOLOGY.to_string())]);
    }

    #[tokio::test]
    async fn rejected_input_still_saves_the_session() {
        let orchestrator = orchestrator();
        orchestrator.handle(Inbound::text(USER, "/order")).await;

        let effects = orchestrator.handle(Inbound::text(USER, "Квас")).await;
        assert_eq!(effects, vec![ChatEffect::error(&ValidationError::UnknownProduct)]);
        assert!(orchestrator.sessions().contains(USER).unwrap());
    }

    #[tokio::test]
    async fn persistence_effects_never_reach_the_transport() {
        let orchestrator = orchestrator();
        for text in ["/order", "Вода 5л", "1", "+79001234567", "Ленина 10", "02.06.2099 12:00"] {
            let effects = orchestrator.handle(Inbound::text(USER, text)).await;
            assert!(effects.iter().all(ChatEffect::is_outward), "{text}: {effects:?}");
        }
    }

    #[tokio::test]
    async fn admin_routes_are_gated() {
        let orchestrator = orchestrator();

        let effects = orchestrator.handle(Inbound::text(USER, "/admin")).await;
        assert_eq!(effects, vec![ChatEffect::error(&ValidationError::NotPermitted)]);

        let effects = orchestrator
            .handle(Inbound::button(USER, &Button::ToggleProduct(ProductId::new(1))))
            .await;
        assert_eq!(effects, vec![ChatEffect::error(&ValidationError::NotPermitted)]);
        assert!(
            orchestrator
                .gateway()
                .get_product(ProductId::new(1))
                .await
                .unwrap()
                .is_available
        );

        let effects = orchestrator.handle(Inbound::text(ADMIN, "/admin")).await;
        assert_eq!(effects, vec![ChatEffect::prompt_with(prompts::ADMIN_MENU, Markup::AdminMenu)]);
    }

    #[tokio::test]
    async fn repeating_an_unknown_order_is_not_found() {
        let orchestrator = orchestrator();
        let effects = orchestrator
            .handle(Inbound::button(USER, &Button::Repeat(OrderId::new(999))))
            .await;
        assert_eq!(effects, vec![ChatEffect::error(&ValidationError::OrderNotFound)]);
    }
}
