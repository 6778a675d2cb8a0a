//! Integration tests for the customer ordering dialogue, driven through the
//! orchestrator against the in-memory stores.

#![allow(clippy::unwrap_used, clippy::panic)] // Test code can use unwrap and panic

use chrono::Duration;
use courier_bot::actions::{Button, Inbound, MENU_ORDER};
use courier_bot::config::WorkflowConfig;
use courier_bot::effects::{ChatEffect, Markup};
use courier_bot::mocks::{InMemoryOrderRepository, InMemorySessionStore};
use courier_bot::prompts;
use courier_bot::providers::SessionStore;
use courier_bot::session::{CheckoutMode, Stage};
use courier_bot::validation::ValidationError;
use courier_bot::{Money, OrderId, OrderStatus, Orchestrator, PersistenceGateway, UserId};
use courier_core::environment::Clock;
use courier_runtime::retry::RetryPolicy;
use courier_testing::{ManualClock, at};
use std::sync::Arc;

const CUSTOMER: UserId = UserId::new(100);
const ADMIN: UserId = UserId::new(1);

struct Harness {
    orchestrator: Orchestrator<InMemorySessionStore, InMemoryOrderRepository>,
    sessions: InMemorySessionStore,
    repository: InMemoryOrderRepository,
    clock: ManualClock,
}

impl Harness {
    /// 10:00 local time (UTC+3) on 1 June 2024.
    fn new(policy: RetryPolicy) -> Self {
        let clock = ManualClock::new(at("2024-06-01T07:00:00Z"));
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let sessions = InMemorySessionStore::new(Arc::clone(&shared));
        let repository = InMemoryOrderRepository::with_default_catalog();

        let orchestrator = Orchestrator::new(
            sessions.clone(),
            PersistenceGateway::new(repository.clone(), policy),
            shared,
            WorkflowConfig::default().with_admin(Some(ADMIN)),
        );

        Self {
            orchestrator,
            sessions,
            repository,
            clock,
        }
    }

    async fn say(&self, text: &str) -> Vec<ChatEffect> {
        self.orchestrator.handle(Inbound::text(CUSTOMER, text)).await
    }

    async fn press(&self, button: &Button) -> Vec<ChatEffect> {
        self.orchestrator.handle(Inbound::button(CUSTOMER, button)).await
    }

    async fn stage(&self) -> Option<Stage> {
        self.sessions
            .get(CUSTOMER)
            .await
            .unwrap()
            .map(|session| session.stage)
    }

    /// Walks the dialogue up to the delivery slot prompt.
    async fn fill_until_date(&self) {
        for text in [MENU_ORDER, "Вода 19л", "2", "+79001234567", "Ленина 10"] {
            self.say(text).await;
        }
        assert!(matches!(self.stage().await, Some(Stage::AwaitingDate { .. })));
    }
}

fn prompt_text(effect: &ChatEffect) -> &str {
    match effect {
        ChatEffect::ShowPrompt { text, .. } => text,
        other => panic!("expected a prompt, got {other:?}"),
    }
}

#[tokio::test]
async fn test_order_from_menu_to_confirmation() {
    let harness = Harness::new(RetryPolicy::default());

    let effects = harness.say(MENU_ORDER).await;
    assert!(matches!(
        &effects[..],
        [ChatEffect::ShowPrompt { markup: Markup::Choices(choices), .. }] if choices.len() == 3
    ));

    let effects = harness.say("Вода 19л").await;
    assert!(prompt_text(&effects[0]).contains("Вода 19л"));

    let effects = harness.say("2").await;
    assert!(prompt_text(&effects[0]).contains("599.98"));
    let Some(Stage::AwaitingPhoneNumber { draft }) = harness.stage().await else {
        panic!("expected the phone step");
    };
    assert_eq!(draft.total_price, Money::from_kopecks(59_998));

    let effects = harness.say("+79001234567").await;
    assert_eq!(effects, vec![ChatEffect::prompt(prompts::ENTER_ADDRESS)]);

    harness.say("Ленина 10").await;
    let effects = harness.say("02.06.2099 12:00").await;

    let [
        ChatEffect::ShowConfirmation { order_id, .. },
        ChatEffect::NotifyAdmin { admin, text },
        ChatEffect::ResetToMenu,
    ] = &effects[..]
    else {
        panic!("unexpected effects: {effects:?}");
    };
    assert_eq!(*order_id, OrderId::new(1));
    assert_eq!(*admin, ADMIN);
    assert!(text.contains("Вода 19л"));

    let orders = harness.repository.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.status, OrderStatus::New);
    assert_eq!(order.quantity.get(), 2);
    assert_eq!(order.total_price, Money::from_kopecks(59_998));
    assert_eq!(order.phone_number.as_str(), "+79001234567");
    assert_eq!(order.delivery_address, "Ленина 10");

    // Back to a fresh Start: nothing left in the store.
    assert_eq!(harness.stage().await, None);
}

#[tokio::test]
async fn test_shared_contact_is_normalized() {
    let harness = Harness::new(RetryPolicy::default());
    for text in [MENU_ORDER, "Вода 5л", "1"] {
        harness.say(text).await;
    }

    harness
        .orchestrator
        .handle(Inbound::contact(CUSTOMER, "79001234567"))
        .await;

    let Some(Stage::AwaitingAddress { phone_number, .. }) = harness.stage().await else {
        panic!("expected the address step");
    };
    assert_eq!(phone_number.as_str(), "+79001234567");
}

#[tokio::test]
async fn test_invalid_inputs_reprompt_without_losing_progress() {
    let harness = Harness::new(RetryPolicy::default());
    for text in [MENU_ORDER, "Вода 19л"] {
        harness.say(text).await;
    }

    let effects = harness.say("два").await;
    assert_eq!(effects, vec![ChatEffect::error(&ValidationError::InvalidQuantity)]);
    assert!(matches!(harness.stage().await, Some(Stage::EnteringQuantity { .. })));

    harness.say("2").await;
    let effects = harness.say("89001234567").await;
    assert_eq!(effects, vec![ChatEffect::error(&ValidationError::InvalidPhone)]);
    assert!(matches!(harness.stage().await, Some(Stage::AwaitingPhoneNumber { .. })));
}

#[tokio::test]
async fn test_quantity_beyond_an_order_row_is_rejected() {
    let harness = Harness::new(RetryPolicy::default());
    for text in [MENU_ORDER, "Вода 19л"] {
        harness.say(text).await;
    }

    let effects = harness.say("3000000000").await;
    assert_eq!(effects, vec![ChatEffect::error(&ValidationError::InvalidQuantity)]);
    assert!(matches!(harness.stage().await, Some(Stage::EnteringQuantity { .. })));
}

#[tokio::test]
async fn test_delivery_slot_rules() {
    let harness = Harness::new(RetryPolicy::default());
    harness.fill_until_date().await;

    let cases = [
        ("2099-06-02 12:00", ValidationError::DateTimeFormat),
        ("31.02.2099 12:00", ValidationError::ImpossibleDateTime),
        ("01.06.2024 09:30", ValidationError::NotInFuture),
    ];
    for (text, expected) in cases {
        assert_eq!(harness.say(text).await, vec![ChatEffect::error(&expected)], "{text}");
    }

    for text in ["02.06.2099 21:00", "02.06.2099 08:59"] {
        let effects = harness.say(text).await;
        assert!(
            matches!(&effects[..], [ChatEffect::ShowError(message)] if message.contains("с 09:00 до 21:00")),
            "{text}: {effects:?}"
        );
    }

    assert!(matches!(harness.stage().await, Some(Stage::AwaitingDate { .. })));
    assert!(harness.repository.orders().is_empty());
}

#[tokio::test]
async fn test_idle_session_expires_after_an_hour() {
    let harness = Harness::new(RetryPolicy::default());
    for text in [MENU_ORDER, "Вода 19л", "2", "+79001234567"] {
        harness.say(text).await;
    }

    // Still inside the idle window.
    harness.clock.advance(Duration::minutes(59));
    assert!(matches!(harness.stage().await, Some(Stage::AwaitingAddress { .. })));

    harness.clock.advance(Duration::minutes(2));
    let effects = harness.say("Ленина 10").await;

    assert_eq!(effects, vec![ChatEffect::prompt_with(prompts::MAIN_MENU, Markup::MainMenu)]);
    assert_eq!(harness.stage().await, None);
}

#[tokio::test]
async fn test_rejected_input_refreshes_the_idle_clock() {
    let harness = Harness::new(RetryPolicy::default());
    for text in [MENU_ORDER, "Вода 19л"] {
        harness.say(text).await;
    }

    harness.clock.advance(Duration::minutes(50));
    harness.say("много").await;
    harness.clock.advance(Duration::minutes(50));

    assert!(matches!(harness.stage().await, Some(Stage::EnteringQuantity { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_failed_commit_keeps_the_order_for_resubmission() {
    let harness = Harness::new(RetryPolicy::default());
    harness.fill_until_date().await;
    harness.repository.fail_next_commits(3);

    let effects = harness.say("02.06.2099 12:00").await;
    assert_eq!(
        effects,
        vec![
            ChatEffect::ShowError(prompts::SUBMIT_FAILED.to_string()),
            ChatEffect::prompt_with(prompts::RETRY_SUBMIT, Markup::ConfirmOrCancel),
        ]
    );
    assert_eq!(harness.repository.insert_attempts(), 3);
    assert!(harness.repository.orders().is_empty());
    assert!(matches!(
        harness.stage().await,
        Some(Stage::ConfirmingOrder {
            mode: CheckoutMode::Direct,
            ..
        })
    ));

    let effects = harness.press(&Button::Confirm).await;
    assert!(matches!(effects.first(), Some(ChatEffect::ShowConfirmation { .. })));
    assert_eq!(harness.repository.orders().len(), 1);
    assert_eq!(harness.stage().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_commit_succeeds_after_transient_failures() {
    let harness = Harness::new(RetryPolicy::default());
    harness.fill_until_date().await;
    harness.repository.fail_next_commits(2);

    let effects = harness.say("02.06.2099 12:00").await;

    assert!(matches!(effects.first(), Some(ChatEffect::ShowConfirmation { .. })));
    assert_eq!(harness.repository.insert_attempts(), 3);
    assert_eq!(harness.repository.orders().len(), 1);
}

#[tokio::test]
async fn test_cancel_discards_the_draft() {
    let harness = Harness::new(RetryPolicy::default());
    for text in [MENU_ORDER, "Вода 19л", "2"] {
        harness.say(text).await;
    }

    let effects = harness.say("/cancel").await;

    assert_eq!(
        effects,
        vec![ChatEffect::prompt(prompts::ORDER_CANCELLED), ChatEffect::ResetToMenu]
    );
    assert_eq!(harness.stage().await, None);
}

#[tokio::test]
async fn test_repeat_order_reuses_contact_and_waits_for_confirmation() {
    let harness = Harness::new(RetryPolicy::default());
    harness.fill_until_date().await;
    harness.say("02.06.2099 12:00").await;

    let effects = harness.press(&Button::Repeat(OrderId::new(1))).await;
    assert_eq!(effects.len(), 2);
    assert!(prompt_text(&effects[0]).contains("Ленина 10"));
    assert!(matches!(
        harness.stage().await,
        Some(Stage::AwaitingDate {
            mode: CheckoutMode::Review,
            ..
        })
    ));

    let effects = harness.say("03.06.2099 15:00").await;
    assert!(matches!(
        &effects[..],
        [ChatEffect::ShowPrompt { markup: Markup::ConfirmOrCancel, .. }]
    ));
    assert_eq!(harness.repository.orders().len(), 1);

    let effects = harness.press(&Button::Confirm).await;
    assert!(matches!(
        effects.first(),
        Some(ChatEffect::ShowConfirmation { order_id, .. }) if *order_id == OrderId::new(2)
    ));

    let orders = harness.repository.orders();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[1].phone_number, orders[0].phone_number);
    assert_eq!(orders[1].delivery_address, "Ленина 10");
    assert_eq!(orders[1].total_price, Money::from_kopecks(59_998));
}

#[tokio::test]
async fn test_orders_of_other_users_cannot_be_repeated() {
    let harness = Harness::new(RetryPolicy::default());
    harness.fill_until_date().await;
    harness.say("02.06.2099 12:00").await;

    let stranger = UserId::new(555);
    let effects = harness
        .orchestrator
        .handle(Inbound::button(stranger, &Button::Repeat(OrderId::new(1))))
        .await;

    assert_eq!(effects, vec![ChatEffect::error(&ValidationError::OrderNotFound)]);
}

#[tokio::test]
async fn test_history_lists_orders_with_product_names() {
    let harness = Harness::new(RetryPolicy::default());

    let effects = harness.say("/history").await;
    assert_eq!(effects, vec![ChatEffect::prompt_with(prompts::EMPTY_HISTORY, Markup::MainMenu)]);

    harness.fill_until_date().await;
    harness.say("02.06.2099 12:00").await;

    let effects = harness.say("/history").await;
    let [ChatEffect::ShowOrderHistory(entries)] = &effects[..] else {
        panic!("unexpected effects: {effects:?}");
    };
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].product_name.as_deref(), Some("Вода 19л"));
    assert_eq!(entries[0].order.id, Some(OrderId::new(1)));
}

#[tokio::test]
async fn test_catalog_shows_available_products() {
    let harness = Harness::new(RetryPolicy::default());

    let effects = harness.say("/products").await;

    let [ChatEffect::ShowCatalog(products)] = &effects[..] else {
        panic!("unexpected effects: {effects:?}");
    };
    let names: Vec<_> = products.iter().map(|product| product.name.as_str()).collect();
    assert_eq!(names, ["Вода 19л", "Вода 5л", "Вода 0.5л"]);
}
