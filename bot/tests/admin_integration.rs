//! Integration tests for the admin catalog sub-flow.

#![allow(clippy::unwrap_used, clippy::panic)] // Test code can use unwrap and panic

use courier_bot::actions::{Button, Inbound};
use courier_bot::config::WorkflowConfig;
use courier_bot::effects::{ChatEffect, Markup};
use courier_bot::mocks::{InMemoryOrderRepository, InMemorySessionStore};
use courier_bot::prompts;
use courier_bot::providers::{OrderRepository, SessionStore};
use courier_bot::session::{AdminStage, Stage};
use courier_bot::validation::ValidationError;
use courier_bot::{Money, Orchestrator, PersistenceGateway, ProductId, UserId};
use courier_core::environment::Clock;
use courier_runtime::retry::RetryPolicy;
use courier_testing::{FixedClock, at};
use std::sync::Arc;

const ADMIN: UserId = UserId::new(1);
const CUSTOMER: UserId = UserId::new(100);

fn setup() -> (
    Orchestrator<InMemorySessionStore, InMemoryOrderRepository>,
    InMemorySessionStore,
    InMemoryOrderRepository,
) {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(at("2024-06-01T07:00:00Z")));
    let sessions = InMemorySessionStore::new(Arc::clone(&clock));
    let repository = InMemoryOrderRepository::with_default_catalog();
    let orchestrator = Orchestrator::new(
        sessions.clone(),
        PersistenceGateway::new(repository.clone(), RetryPolicy::no_retry()),
        clock,
        WorkflowConfig::default().with_admin(Some(ADMIN)),
    );
    (orchestrator, sessions, repository)
}

async fn admin_says(orchestrator: &Orchestrator<InMemorySessionStore, InMemoryOrderRepository>, text: &str) -> Vec<ChatEffect> {
    orchestrator.handle(Inbound::text(ADMIN, text)).await
}

#[tokio::test]
async fn test_admin_creates_a_product_step_by_step() {
    let (orchestrator, sessions, repository) = setup();

    assert_eq!(
        admin_says(&orchestrator, "/addproduct").await,
        vec![ChatEffect::prompt(prompts::ADMIN_ENTER_NAME)]
    );
    assert_eq!(
        admin_says(&orchestrator, "Вода 1л").await,
        vec![ChatEffect::prompt(prompts::ADMIN_ENTER_DESCRIPTION)]
    );
    assert_eq!(
        admin_says(&orchestrator, "Бутилированная питьевая вода").await,
        vec![ChatEffect::prompt(prompts::ADMIN_ENTER_PRICE)]
    );

    // A bad price re-prompts without losing the name and description.
    assert_eq!(
        admin_says(&orchestrator, "бесплатно").await,
        vec![ChatEffect::error(&ValidationError::InvalidPrice)]
    );
    assert!(matches!(
        sessions.get(ADMIN).await.unwrap().map(|s| s.stage),
        Some(Stage::Admin(AdminStage::ProductPrice { .. }))
    ));

    assert_eq!(
        admin_says(&orchestrator, "79,50").await,
        vec![ChatEffect::prompt(prompts::ADMIN_SEND_IMAGE)]
    );
    assert_eq!(
        orchestrator.handle(Inbound::photo(ADMIN, "photo-file-1")).await,
        vec![ChatEffect::prompt(prompts::ADMIN_ENTER_STOCK)]
    );

    let effects = admin_says(&orchestrator, "12").await;
    assert_eq!(
        effects,
        vec![ChatEffect::prompt_with(
            prompts::admin_product_created("Вода 1л"),
            Markup::AdminMenu
        )]
    );
    assert_eq!(sessions.get(ADMIN).await.unwrap(), None);

    let product = repository.get_product(ProductId::new(4)).await.unwrap().unwrap();
    assert_eq!(product.name, "Вода 1л");
    assert_eq!(product.price, Money::from_kopecks(7_950));
    assert_eq!(product.image_url.as_deref(), Some("photo-file-1"));
    assert_eq!(product.stock, 12);
    assert!(product.is_available);

    // Customers can order it straight away.
    let effects = orchestrator.handle(Inbound::text(CUSTOMER, "/order")).await;
    assert!(matches!(
        &effects[..],
        [ChatEffect::ShowPrompt { markup: Markup::Choices(choices), .. }] if choices.len() == 4
    ));
}

#[tokio::test]
async fn test_price_beyond_the_catalog_column_is_rejected() {
    let (orchestrator, sessions, _) = setup();
    for text in ["/addproduct", "Слиток", "Очень дорогой"] {
        admin_says(&orchestrator, text).await;
    }

    assert_eq!(
        admin_says(&orchestrator, "79228162514264337593543950335").await,
        vec![ChatEffect::error(&ValidationError::InvalidPrice)]
    );
    assert!(matches!(
        sessions.get(ADMIN).await.unwrap().map(|s| s.stage),
        Some(Stage::Admin(AdminStage::ProductPrice { .. }))
    ));
}

#[tokio::test]
async fn test_admin_updates_stock() {
    let (orchestrator, _, repository) = setup();

    let effects = orchestrator.handle(Inbound::text(ADMIN, "/updatestock")).await;
    assert!(matches!(
        &effects[..],
        [ChatEffect::ShowPrompt { markup: Markup::Choices(choices), .. }]
            if choices[1].button == Button::UpdateStock(ProductId::new(2))
    ));

    orchestrator
        .handle(Inbound::button(ADMIN, &Button::UpdateStock(ProductId::new(2))))
        .await;
    assert_eq!(
        admin_says(&orchestrator, "-3").await,
        vec![ChatEffect::error(&ValidationError::InvalidStock)]
    );

    let effects = admin_says(&orchestrator, "40").await;
    assert_eq!(
        effects,
        vec![ChatEffect::prompt_with(prompts::admin_stock_updated(40), Markup::AdminMenu)]
    );
    assert_eq!(repository.get_product(ProductId::new(2)).await.unwrap().unwrap().stock, 40);
}

#[tokio::test]
async fn test_hidden_products_cannot_be_ordered() {
    let (orchestrator, _, _) = setup();

    let effects = orchestrator
        .handle(Inbound::button(ADMIN, &Button::ToggleProduct(ProductId::new(3))))
        .await;
    assert!(matches!(
        &effects[..],
        [ChatEffect::ShowPrompt { text, markup: Markup::AdminMenu }] if text.contains("скрыт")
    ));

    orchestrator.handle(Inbound::text(CUSTOMER, "/order")).await;
    let effects = orchestrator
        .handle(Inbound::button(CUSTOMER, &Button::OrderProduct(ProductId::new(3))))
        .await;
    assert_eq!(effects, vec![ChatEffect::error(&ValidationError::ProductUnavailable)]);
}

#[tokio::test]
async fn test_customers_cannot_enter_the_admin_flow() {
    let (orchestrator, sessions, _) = setup();

    let effects = orchestrator.handle(Inbound::text(CUSTOMER, "/addproduct")).await;

    assert_eq!(effects, vec![ChatEffect::error(&ValidationError::NotPermitted)]);
    assert_eq!(sessions.get(CUSTOMER).await.unwrap(), None);
}

#[tokio::test]
async fn test_cancel_abandons_product_creation() {
    let (orchestrator, sessions, repository) = setup();
    admin_says(&orchestrator, "/addproduct").await;
    admin_says(&orchestrator, "Квас").await;

    let effects = admin_says(&orchestrator, "/cancel").await;

    assert_eq!(
        effects,
        vec![ChatEffect::prompt(prompts::ACTION_CANCELLED), ChatEffect::ResetToMenu]
    );
    assert_eq!(sessions.get(ADMIN).await.unwrap(), None);
    assert_eq!(repository.list_products().await.unwrap().len(), 3);
}
