//! Effects produced by the workflow.
//!
//! The reducer returns [`ChatEffect`] values. Most describe something for the
//! transport to render; the persistence variants are instructions consumed by
//! the orchestrator and never leave it.

use crate::actions::Button;
use crate::types::{NewProduct, Order, OrderId, Product, ProductId, UserId};
use chrono::{NaiveDate, NaiveTime};

/// Something the shell should do after a reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEffect {
    /// Ask for the next input
    ShowPrompt {
        /// Message text
        text: String,
        /// Keyboard to attach
        markup: Markup,
    },
    /// Input was rejected; the text says how to fix it
    ShowError(String),
    /// Order committed
    ShowConfirmation {
        /// Id assigned by the store
        order_id: OrderId,
        /// Delivery day
        delivery_date: NaiveDate,
        /// Delivery time
        delivery_time: NaiveTime,
    },
    /// Render the main menu
    ResetToMenu,
    /// Catalog listing with order buttons
    ShowCatalog(Vec<Product>),
    /// Past orders, newest first
    ShowOrderHistory(Vec<OrderHistoryEntry>),
    /// Tell the administrator about a new order
    NotifyAdmin {
        /// Recipient
        admin: UserId,
        /// Summary text
        text: String,
    },

    /// Commit this order through the gateway
    SubmitOrder(Box<Order>),
    /// Admin: create this product
    CreateProduct(NewProduct),
    /// Admin: set a product's stock
    UpdateStock {
        /// Product to restock
        product_id: ProductId,
        /// New stock count
        stock: i32,
    },
}

impl ChatEffect {
    /// Prompt without a keyboard.
    #[must_use]
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::ShowPrompt {
            text: text.into(),
            markup: Markup::None,
        }
    }

    /// Prompt with a keyboard.
    #[must_use]
    pub fn prompt_with(text: impl Into<String>, markup: Markup) -> Self {
        Self::ShowPrompt {
            text: text.into(),
            markup,
        }
    }

    /// Error message from anything displayable.
    #[must_use]
    pub fn error(err: &impl std::fmt::Display) -> Self {
        Self::ShowError(err.to_string())
    }

    /// Whether the transport should see this effect.
    #[must_use]
    pub const fn is_outward(&self) -> bool {
        !matches!(
            self,
            Self::SubmitOrder(_) | Self::CreateProduct(_) | Self::UpdateStock { .. }
        )
    }
}

/// Keyboard attached to a prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Markup {
    /// Plain text
    #[default]
    None,
    /// Catalog / order / history buttons
    MainMenu,
    /// One button that shares the user's contact
    RequestContact,
    /// Confirm and cancel buttons
    ConfirmOrCancel,
    /// Admin panel buttons
    AdminMenu,
    /// Arbitrary list of buttons, one per row
    Choices(Vec<Choice>),
}

/// One inline button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    /// Text on the button
    pub label: String,
    /// What pressing it sends back
    pub button: Button,
}

impl Choice {
    /// Creates a choice
    #[must_use]
    pub fn new(label: impl Into<String>, button: Button) -> Self {
        Self {
            label: label.into(),
            button,
        }
    }
}

/// A past order with the product name resolved for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderHistoryEntry {
    /// Stored order
    pub order: Order,
    /// Product name, if the product still exists
    pub product_name: Option<String>,
}
