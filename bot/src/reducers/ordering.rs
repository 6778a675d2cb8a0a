//! The customer ordering dialogue.
//!
//! `Start → SelectingProduct → EnteringQuantity → AwaitingPhoneNumber →
//! AwaitingAddress → AwaitingDate → ConfirmingOrder`. Direct orders emit
//! `SubmitOrder` as soon as the slot is valid; repeat orders stop at
//! `ConfirmingOrder` with a summary and wait for `Confirm`.

use super::{Effects, reject};
use crate::effects::{ChatEffect, Markup};
use crate::environment::WorkflowEnvironment;
use crate::prompts;
use crate::session::{CheckoutMode, DeliveryContact, DraftOrder, Session, Stage};
use crate::types::{Order, Product, ProductId};
use crate::validation::{self, ValidationError};
use courier_core::smallvec;

pub(super) fn begin_order(session: &mut Session, env: &WorkflowEnvironment) -> Effects {
    if env.catalog.available().next().is_none() {
        session.stage = Stage::Start;
        return smallvec![ChatEffect::prompt_with(prompts::EMPTY_CATALOG, Markup::MainMenu)];
    }

    session.stage = Stage::SelectingProduct;
    smallvec![product_picker(env)]
}

pub(super) fn pick_product(session: &mut Session, product_id: ProductId, env: &WorkflowEnvironment) -> Effects {
    match available_product(env, product_id) {
        Ok(product) => select(session, product),
        Err(error) => reject(session, &error),
    }
}

pub(super) fn begin_repeat(session: &mut Session, previous: Order, env: &WorkflowEnvironment) -> Effects {
    if previous.user_id != session.user_id {
        return reject(session, &ValidationError::OrderNotFound);
    }

    let product = match available_product(env, previous.product_id) {
        Ok(product) => product,
        Err(error) => {
            session.stage = Stage::Start;
            return smallvec![ChatEffect::error(&error), ChatEffect::ResetToMenu];
        },
    };

    // Re-priced: the new order locks today's price, not the old total.
    let Some(draft) = DraftOrder::priced(product.id, previous.quantity, product.price) else {
        session.stage = Stage::Start;
        return smallvec![ChatEffect::error(&ValidationError::InvalidQuantity), ChatEffect::ResetToMenu];
    };
    let (_, contact) = previous.reopen();
    let intro = prompts::repeat_intro(product, &draft, &contact);

    session.stage = Stage::AwaitingDate {
        draft,
        contact,
        mode: CheckoutMode::Review,
    };
    smallvec![ChatEffect::prompt(intro), ChatEffect::prompt(prompts::enter_date(&env.delivery))]
}

pub(super) fn on_text(session: &mut Session, text: &str, env: &WorkflowEnvironment) -> Effects {
    match session.stage.clone() {
        Stage::Start => smallvec![ChatEffect::prompt_with(prompts::MAIN_MENU, Markup::MainMenu)],

        Stage::SelectingProduct => match env.catalog.find_by_name(text) {
            Some(product) if product.is_available => select(session, product),
            Some(_) => reject(session, &ValidationError::ProductUnavailable),
            None => reject(session, &ValidationError::UnknownProduct),
        },

        Stage::EnteringQuantity { product_id } => {
            let quantity = match validation::parse_quantity(text) {
                Ok(quantity) => quantity,
                Err(error) => return reject(session, &error),
            };

            let product = match available_product(env, product_id) {
                Ok(product) => product,
                Err(error) => {
                    session.stage = Stage::SelectingProduct;
                    return smallvec![ChatEffect::error(&error), product_picker(env)];
                },
            };

            let Some(draft) = DraftOrder::priced(product.id, quantity, product.price) else {
                return reject(session, &ValidationError::InvalidQuantity);
            };
            let prompt = prompts::enter_phone(draft.total_price);
            session.stage = Stage::AwaitingPhoneNumber { draft };
            smallvec![ChatEffect::prompt_with(prompt, Markup::RequestContact)]
        },

        Stage::AwaitingPhoneNumber { draft } => match validation::parse_phone(text) {
            Ok(phone_number) => {
                session.stage = Stage::AwaitingAddress { draft, phone_number };
                smallvec![ChatEffect::prompt(prompts::ENTER_ADDRESS)]
            },
            Err(error) => reject(session, &error),
        },

        Stage::AwaitingAddress { draft, phone_number } => match validation::parse_address(text) {
            Ok(delivery_address) => {
                session.stage = Stage::AwaitingDate {
                    draft,
                    contact: DeliveryContact {
                        phone_number,
                        delivery_address,
                    },
                    mode: CheckoutMode::Direct,
                };
                smallvec![ChatEffect::prompt(prompts::enter_date(&env.delivery))]
            },
            Err(error) => reject(session, &error),
        },

        Stage::AwaitingDate { draft, contact, mode } => {
            let (date, time) = match env.delivery.parse(text, env.clock.now()) {
                Ok(slot) => slot,
                Err(error) => return reject(session, &error),
            };

            let order = draft.complete(session.user_id, contact, date, time);
            let effect = match mode {
                CheckoutMode::Direct => ChatEffect::SubmitOrder(Box::new(order.clone())),
                CheckoutMode::Review => {
                    let name = product_name(env, order.product_id);
                    ChatEffect::prompt_with(prompts::order_summary(&order, &name), Markup::ConfirmOrCancel)
                },
            };
            session.stage = Stage::ConfirmingOrder { order, mode };
            smallvec![effect]
        },

        Stage::ConfirmingOrder { .. } | Stage::Admin(_) => reject(session, &ValidationError::UnexpectedInput),
    }
}

pub(super) fn on_contact(session: &mut Session, raw: &str) -> Effects {
    let Stage::AwaitingPhoneNumber { draft } = &session.stage else {
        return reject(session, &ValidationError::UnexpectedInput);
    };
    let draft = draft.clone();

    match validation::parse_contact(raw) {
        Ok(phone_number) => {
            session.stage = Stage::AwaitingAddress { draft, phone_number };
            smallvec![ChatEffect::prompt(prompts::ENTER_ADDRESS)]
        },
        Err(error) => reject(session, &error),
    }
}

/// Submits the order under review after re-checking its slot.
///
/// A slot that went stale while the user was reviewing sends the dialogue back
/// to date entry with the rest of the order intact.
pub(super) fn confirm(session: &mut Session, env: &WorkflowEnvironment) -> Effects {
    let Stage::ConfirmingOrder { order, mode } = &session.stage else {
        return reject(session, &ValidationError::UnexpectedInput);
    };

    match env.delivery.check(order.delivery_date, order.delivery_time, env.clock.now()) {
        Ok(()) => smallvec![ChatEffect::SubmitOrder(Box::new(order.clone()))],
        Err(error) => {
            tracing::debug!(user_id = %session.user_id, error = %error, "Delivery slot expired before confirmation");
            let (draft, contact) = order.reopen();
            let mode = *mode;
            session.stage = Stage::AwaitingDate { draft, contact, mode };
            smallvec![ChatEffect::error(&error), ChatEffect::prompt(prompts::enter_date(&env.delivery))]
        },
    }
}

pub(super) fn cancel(session: &mut Session) -> Effects {
    let text = match session.stage {
        Stage::Start => return smallvec![ChatEffect::ResetToMenu],
        Stage::Admin(_) => prompts::ACTION_CANCELLED,
        _ => prompts::ORDER_CANCELLED,
    };
    tracing::debug!(user_id = %session.user_id, stage = session.stage_name(), "Dialogue cancelled");
    session.stage = Stage::Start;
    smallvec![ChatEffect::prompt(text), ChatEffect::ResetToMenu]
}

fn select(session: &mut Session, product: &Product) -> Effects {
    session.stage = Stage::EnteringQuantity { product_id: product.id };
    smallvec![ChatEffect::prompt(prompts::enter_quantity(product))]
}

fn available_product(env: &WorkflowEnvironment, product_id: ProductId) -> Result<&Product, ValidationError> {
    match env.catalog.find(product_id) {
        Some(product) if product.is_available => Ok(product),
        _ => Err(ValidationError::ProductUnavailable),
    }
}

fn product_picker(env: &WorkflowEnvironment) -> ChatEffect {
    ChatEffect::prompt_with(prompts::CHOOSE_PRODUCT, prompts::product_choices(env.catalog.available()))
}

fn product_name(env: &WorkflowEnvironment, product_id: ProductId) -> String {
    env.catalog
        .find(product_id)
        .map_or_else(|| format!("товар №{product_id}"), |product| product.name.clone())
}
