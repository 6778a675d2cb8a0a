//! Inbound events and the actions the workflow reducer understands.
//!
//! The transport hands the orchestrator an [`Inbound`] event. The orchestrator
//! resolves it into a [`Route`]: either a [`WorkflowAction`] for the reducer or
//! a read-only view / admin operation that never touches the session stage.

use crate::session::Stage;
use crate::types::{Order, OrderId, ProductId, UserId};

/// Start-menu label that begins ordering
pub const MENU_ORDER: &str = "Заказать";
/// Start-menu label that shows the catalog
pub const MENU_CATALOG: &str = "Ассортимент";
/// Start-menu label that shows past orders
pub const MENU_HISTORY: &str = "История заказов";

/// One event from the transport, keyed by user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inbound {
    /// Who sent it
    pub user_id: UserId,
    /// What was sent
    pub kind: InboundKind,
}

impl Inbound {
    /// A typed message
    #[must_use]
    pub fn text(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            kind: InboundKind::Text(text.into()),
        }
    }

    /// A shared contact card
    #[must_use]
    pub fn contact(user_id: UserId, phone_number: impl Into<String>) -> Self {
        Self {
            user_id,
            kind: InboundKind::Contact {
                phone_number: phone_number.into(),
            },
        }
    }

    /// A photo attachment
    #[must_use]
    pub fn photo(user_id: UserId, file_id: impl Into<String>) -> Self {
        Self {
            user_id,
            kind: InboundKind::Photo {
                file_id: file_id.into(),
            },
        }
    }

    /// A button press
    #[must_use]
    pub fn button(user_id: UserId, button: &Button) -> Self {
        Self {
            user_id,
            kind: InboundKind::Button {
                payload: button.payload(),
            },
        }
    }
}

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundKind {
    /// Free text, including slash commands
    Text(String),
    /// Shared contact
    Contact {
        /// Number as the transport delivered it
        phone_number: String,
    },
    /// Photo attachment
    Photo {
        /// Transport file reference
        file_id: String,
    },
    /// Button press with an opaque payload
    Button {
        /// Payload string, see [`Button::parse`]
        payload: String,
    },
}

/// Slash commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/menu`
    Menu,
    /// `/products`
    Products,
    /// `/order`
    Order,
    /// `/history`
    History,
    /// `/cancel`
    Cancel,
    /// `/admin`
    Admin,
    /// `/addproduct`
    AddProduct,
    /// `/updatestock`
    UpdateStock,
    /// `/toggleproduct`
    ToggleProduct,
    /// Anything else starting with `/`
    Unknown(String),
}

impl Command {
    /// Parses text starting with `/`. Arguments and a `@botname` suffix are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name).to_lowercase();

        Some(match name.as_str() {
            "start" => Self::Start,
            "menu" => Self::Menu,
            "products" => Self::Products,
            "order" => Self::Order,
            "history" => Self::History,
            "cancel" => Self::Cancel,
            "admin" => Self::Admin,
            "addproduct" => Self::AddProduct,
            "updatestock" => Self::UpdateStock,
            "toggleproduct" => Self::ToggleProduct,
            _ => Self::Unknown(name),
        })
    }
}

/// Button payloads understood by the workflow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Button {
    /// Back to the main menu
    Menu,
    /// Browse the catalog
    Products,
    /// Begin ordering
    Order,
    /// Past orders
    History,
    /// Order this product
    OrderProduct(ProductId),
    /// Repeat a past order
    Repeat(OrderId),
    /// Submit the order under review
    Confirm,
    /// Drop the order under review
    Cancel,
    /// Admin panel
    AdminMenu,
    /// Start the product creation sub-flow
    AdminAddProduct,
    /// Pick a product to restock
    AdminUpdateStock,
    /// Pick a product to show or hide
    AdminToggleProduct,
    /// Restock this product
    UpdateStock(ProductId),
    /// Flip availability of this product
    ToggleProduct(ProductId),
}

impl Button {
    /// Parses a payload string.
    #[must_use]
    pub fn parse(payload: &str) -> Option<Self> {
        let exact = match payload {
            "menu" => Some(Self::Menu),
            "products" => Some(Self::Products),
            "order" => Some(Self::Order),
            "history" => Some(Self::History),
            "confirm_repeat" => Some(Self::Confirm),
            "cancel_repeat" => Some(Self::Cancel),
            "admin_menu" => Some(Self::AdminMenu),
            "admin_add_product" => Some(Self::AdminAddProduct),
            "admin_update_stock" => Some(Self::AdminUpdateStock),
            "admin_toggle_product" => Some(Self::AdminToggleProduct),
            _ => None,
        };
        if exact.is_some() {
            return exact;
        }

        if let Some(id) = payload.strip_prefix("order_") {
            return id.parse().ok().map(|id| Self::OrderProduct(ProductId::new(id)));
        }
        if let Some(id) = payload.strip_prefix("repeat_") {
            return id.parse().ok().map(|id| Self::Repeat(OrderId::new(id)));
        }
        if let Some(id) = payload.strip_prefix("update_stock_") {
            return id.parse().ok().map(|id| Self::UpdateStock(ProductId::new(id)));
        }
        if let Some(id) = payload.strip_prefix("toggle_product_") {
            return id.parse().ok().map(|id| Self::ToggleProduct(ProductId::new(id)));
        }
        None
    }

    /// Payload string sent back by the transport.
    #[must_use]
    pub fn payload(&self) -> String {
        match self {
            Self::Menu => "menu".into(),
            Self::Products => "products".into(),
            Self::Order => "order".into(),
            Self::History => "history".into(),
            Self::OrderProduct(id) => format!("order_{id}"),
            Self::Repeat(id) => format!("repeat_{id}"),
            Self::Confirm => "confirm_repeat".into(),
            Self::Cancel => "cancel_repeat".into(),
            Self::AdminMenu => "admin_menu".into(),
            Self::AdminAddProduct => "admin_add_product".into(),
            Self::AdminUpdateStock => "admin_update_stock".into(),
            Self::AdminToggleProduct => "admin_toggle_product".into(),
            Self::UpdateStock(id) => format!("update_stock_{id}"),
            Self::ToggleProduct(id) => format!("toggle_product_{id}"),
        }
    }
}

/// Input to the workflow reducer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowAction {
    /// Back to the main menu, dropping any draft
    Reset,
    /// Show the product picker
    BeginOrder,
    /// Abandon the current dialogue
    Cancel,
    /// Free text for the current step
    Text(String),
    /// Shared contact number
    Contact(String),
    /// Photo file id
    Photo(String),
    /// Product picked from a button
    PickProduct(ProductId),
    /// Start over from a past order, already loaded by the shell
    BeginRepeat {
        /// The order being repeated
        previous: Order,
    },
    /// Submit the order under review
    Confirm,
    /// Admin: start product creation
    BeginProductCreation,
    /// Admin: restock a product
    BeginStockUpdate(ProductId),
}

impl WorkflowAction {
    /// Whether reducing this action at `stage` consults the catalog.
    ///
    /// The shell only reads products from the store when this is true.
    #[must_use]
    pub const fn needs_catalog(&self, stage: &Stage) -> bool {
        match self {
            Self::BeginOrder
            | Self::PickProduct(_)
            | Self::BeginRepeat { .. }
            | Self::BeginStockUpdate(_)
            | Self::Confirm => true,
            Self::Text(_) => matches!(
                stage,
                Stage::SelectingProduct | Stage::EnteringQuantity { .. } | Stage::AwaitingDate { .. }
            ),
            Self::Reset | Self::Cancel | Self::Contact(_) | Self::Photo(_) | Self::BeginProductCreation => false,
        }
    }
}

/// What the orchestrator does with one inbound event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Feed an action to the reducer
    Reduce(WorkflowAction),
    /// Show the main menu without touching the session
    ShowMenu,
    /// Browse available products
    ShowCatalog,
    /// List the user's past orders
    ShowHistory,
    /// Load a past order and start a repeat checkout
    Repeat(OrderId),
    /// Admin panel
    AdminMenu,
    /// Admin: product list for restocking
    AdminStockPicker,
    /// Admin: product list for availability toggling
    AdminTogglePicker,
    /// Admin: flip availability
    ToggleProduct(ProductId),
}

impl Route {
    /// Resolves an event against the current stage.
    #[must_use]
    pub fn resolve(kind: InboundKind, stage: &Stage) -> Self {
        match kind {
            InboundKind::Text(text) => Command::parse(&text).map_or_else(
                || Self::from_text(text, stage),
                Self::from_command,
            ),
            InboundKind::Contact { phone_number } => Self::Reduce(WorkflowAction::Contact(phone_number)),
            InboundKind::Photo { file_id } => Self::Reduce(WorkflowAction::Photo(file_id)),
            InboundKind::Button { payload } => Button::parse(&payload).map_or(Self::ShowMenu, Self::from_button),
        }
    }

    fn from_text(text: String, stage: &Stage) -> Self {
        if matches!(stage, Stage::Start) {
            match text.trim() {
                MENU_ORDER => return Self::Reduce(WorkflowAction::BeginOrder),
                MENU_CATALOG => return Self::ShowCatalog,
                MENU_HISTORY => return Self::ShowHistory,
                _ => {},
            }
        }
        Self::Reduce(WorkflowAction::Text(text))
    }

    fn from_command(command: Command) -> Self {
        match command {
            Command::Start | Command::Menu => Self::Reduce(WorkflowAction::Reset),
            Command::Products => Self::ShowCatalog,
            Command::Order => Self::Reduce(WorkflowAction::BeginOrder),
            Command::History => Self::ShowHistory,
            Command::Cancel => Self::Reduce(WorkflowAction::Cancel),
            Command::Admin => Self::AdminMenu,
            Command::AddProduct => Self::Reduce(WorkflowAction::BeginProductCreation),
            Command::UpdateStock => Self::AdminStockPicker,
            Command::ToggleProduct => Self::AdminTogglePicker,
            Command::Unknown(_) => Self::ShowMenu,
        }
    }

    fn from_button(button: Button) -> Self {
        match button {
            Button::Menu => Self::Reduce(WorkflowAction::Reset),
            Button::Products => Self::ShowCatalog,
            Button::Order => Self::Reduce(WorkflowAction::BeginOrder),
            Button::History => Self::ShowHistory,
            Button::OrderProduct(id) => Self::Reduce(WorkflowAction::PickProduct(id)),
            Button::Repeat(id) => Self::Repeat(id),
            Button::Confirm => Self::Reduce(WorkflowAction::Confirm),
            Button::Cancel => Self::Reduce(WorkflowAction::Cancel),
            Button::AdminMenu => Self::AdminMenu,
            Button::AdminAddProduct => Self::Reduce(WorkflowAction::BeginProductCreation),
            Button::AdminUpdateStock => Self::AdminStockPicker,
            Button::AdminToggleProduct => Self::AdminTogglePicker,
            Button::UpdateStock(id) => Self::Reduce(WorkflowAction::BeginStockUpdate(id)),
            Button::ToggleProduct(id) => Self::ToggleProduct(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_ignore_case_arguments_and_bot_suffix() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/Order@water_bot now"), Some(Command::Order));
        assert_eq!(Command::parse("/frobnicate"), Some(Command::Unknown("frobnicate".into())));
        assert_eq!(Command::parse("order"), None);
    }

    #[test]
    fn button_payloads_parse_back() {
        for button in [
            Button::Menu,
            Button::Order,
            Button::OrderProduct(ProductId::new(3)),
            Button::Repeat(OrderId::new(77)),
            Button::Confirm,
            Button::UpdateStock(ProductId::new(2)),
            Button::ToggleProduct(ProductId::new(1)),
        ] {
            assert_eq!(Button::parse(&button.payload()), Some(button));
        }
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert_eq!(Button::parse("order_x"), None);
        assert_eq!(Button::parse("repeat_"), None);
        assert_eq!(Button::parse("launch"), None);
    }

    #[test]
    fn menu_labels_only_route_at_start() {
        assert_eq!(
            Route::resolve(InboundKind::Text(MENU_ORDER.into()), &Stage::Start),
            Route::Reduce(WorkflowAction::BeginOrder)
        );
        assert_eq!(
            Route::resolve(InboundKind::Text(MENU_HISTORY.into()), &Stage::Start),
            Route::ShowHistory
        );
        assert_eq!(
            Route::resolve(InboundKind::Text(MENU_ORDER.into()), &Stage::SelectingProduct),
            Route::Reduce(WorkflowAction::Text(MENU_ORDER.into()))
        );
    }

    #[test]
    fn commands_win_over_stage_text() {
        assert_eq!(
            Route::resolve(InboundKind::Text("/cancel".into()), &Stage::SelectingProduct),
            Route::Reduce(WorkflowAction::Cancel)
        );
        assert_eq!(
            Route::resolve(InboundKind::Text("/unknown".into()), &Stage::Start),
            Route::ShowMenu
        );
    }

    #[test]
    fn unknown_button_shows_menu() {
        assert_eq!(
            Route::resolve(InboundKind::Button { payload: "bogus".into() }, &Stage::Start),
            Route::ShowMenu
        );
    }
}
