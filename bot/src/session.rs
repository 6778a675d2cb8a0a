//! Per-user conversation state.
//!
//! Each [`Stage`] carries exactly the data gathered so far, so a session can
//! never claim to be past quantity entry without a priced draft, or hold a
//! product selection while sitting at the menu.

use crate::types::{Money, Order, OrderStatus, PhoneNumber, ProductId, Quantity, UserId};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One user's conversation, as stored in the session cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Owner of the session, never changes
    pub user_id: UserId,
    /// Current workflow stage with its collected data
    pub stage: Stage,
}

impl Session {
    /// A fresh session at the main menu.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            stage: Stage::Start,
        }
    }

    /// Product chosen so far, if the dialogue is past product selection.
    #[must_use]
    pub const fn selected_product_id(&self) -> Option<ProductId> {
        match &self.stage {
            Stage::EnteringQuantity { product_id } => Some(*product_id),
            Stage::AwaitingPhoneNumber { draft }
            | Stage::AwaitingAddress { draft, .. }
            | Stage::AwaitingDate { draft, .. } => Some(draft.product_id),
            Stage::ConfirmingOrder { order, .. } => Some(order.product_id),
            Stage::Start | Stage::SelectingProduct | Stage::Admin(_) => None,
        }
    }

    /// Quantity confirmed so far.
    #[must_use]
    pub fn selected_quantity(&self) -> Option<Quantity> {
        self.draft().map(|draft| draft.quantity)
    }

    /// The priced draft, present from phone entry onwards.
    #[must_use]
    pub fn draft(&self) -> Option<DraftOrder> {
        match &self.stage {
            Stage::AwaitingPhoneNumber { draft }
            | Stage::AwaitingAddress { draft, .. }
            | Stage::AwaitingDate { draft, .. } => Some(draft.clone()),
            Stage::ConfirmingOrder { order, .. } => Some(order.reopen().0),
            _ => None,
        }
    }

    /// Name of the current stage, for logs.
    #[must_use]
    pub const fn stage_name(&self) -> &'static str {
        self.stage.name()
    }
}

/// Workflow stage.
///
/// Serialized adjacently tagged (`{"state": "...", "data": {...}}`). There is
/// no schema versioning: a format change requires flushing the cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data")]
pub enum Stage {
    /// Main menu
    #[default]
    Start,
    /// Waiting for a product pick
    SelectingProduct,
    /// Product chosen, waiting for a quantity
    EnteringQuantity {
        /// Chosen product
        product_id: ProductId,
    },
    /// Draft priced, waiting for a phone number
    AwaitingPhoneNumber {
        /// Product, quantity and locked total
        draft: DraftOrder,
    },
    /// Waiting for a delivery address
    AwaitingAddress {
        /// Product, quantity and locked total
        draft: DraftOrder,
        /// Validated phone number
        phone_number: PhoneNumber,
    },
    /// Everything but the delivery slot is known
    AwaitingDate {
        /// Product, quantity and locked total
        draft: DraftOrder,
        /// Phone and address
        contact: DeliveryContact,
        /// Whether a valid slot submits at once or asks for confirmation
        mode: CheckoutMode,
    },
    /// Complete order waiting for submit (or a failed submit waiting for retry)
    ConfirmingOrder {
        /// Fully populated, valid order
        order: Order,
        /// How the order was assembled
        mode: CheckoutMode,
    },
    /// Admin catalog sub-flow
    Admin(AdminStage),
}

impl Stage {
    /// Stable name for logs and metrics labels.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::SelectingProduct => "SelectingProduct",
            Self::EnteringQuantity { .. } => "EnteringQuantity",
            Self::AwaitingPhoneNumber { .. } => "AwaitingPhoneNumber",
            Self::AwaitingAddress { .. } => "AwaitingAddress",
            Self::AwaitingDate { .. } => "AwaitingDate",
            Self::ConfirmingOrder { .. } => "ConfirmingOrder",
            Self::Admin(stage) => stage.name(),
        }
    }

}

/// How a checkout reached the date step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutMode {
    /// Regular order: a valid slot submits immediately.
    Direct,
    /// Repeat order: a valid slot shows a summary and waits for confirmation.
    Review,
}

/// Product, quantity and the total locked at quantity entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    /// Chosen product
    pub product_id: ProductId,
    /// Units ordered
    pub quantity: Quantity,
    /// Unit price × quantity at the moment the quantity was entered
    pub total_price: Money,
}

impl DraftOrder {
    /// Prices a draft at `unit_price`. `None` if the total does not fit a decimal.
    #[must_use]
    pub fn priced(product_id: ProductId, quantity: Quantity, unit_price: Money) -> Option<Self> {
        Some(Self {
            product_id,
            quantity,
            total_price: unit_price.times(quantity)?,
        })
    }

    /// Completes the draft into a `New` order.
    #[must_use]
    pub fn complete(
        self,
        user_id: UserId,
        contact: DeliveryContact,
        delivery_date: NaiveDate,
        delivery_time: NaiveTime,
    ) -> Order {
        Order {
            id: None,
            user_id,
            product_id: self.product_id,
            quantity: self.quantity,
            total_price: self.total_price,
            phone_number: contact.phone_number,
            delivery_address: contact.delivery_address,
            delivery_date,
            delivery_time,
            status: OrderStatus::New,
        }
    }
}

/// Where and whom to deliver to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryContact {
    /// Validated phone number
    pub phone_number: PhoneNumber,
    /// Non-blank address
    pub delivery_address: String,
}

impl Order {
    /// Splits an order back into its draft and contact, dropping the slot.
    #[must_use]
    pub fn reopen(&self) -> (DraftOrder, DeliveryContact) {
        (
            DraftOrder {
                product_id: self.product_id,
                quantity: self.quantity,
                total_price: self.total_price,
            },
            DeliveryContact {
                phone_number: self.phone_number.clone(),
                delivery_address: self.delivery_address.clone(),
            },
        )
    }
}

/// Admin catalog stages. Product creation walks name → description → price →
/// image → stock; each step carries the fields already entered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step")]
pub enum AdminStage {
    /// Waiting for the product name
    ProductName,
    /// Waiting for the description
    ProductDescription {
        /// Entered name
        name: String,
    },
    /// Waiting for the price
    ProductPrice {
        /// Entered name
        name: String,
        /// Entered description
        description: String,
    },
    /// Waiting for a photo or an image URL
    ProductImage {
        /// Entered name
        name: String,
        /// Entered description
        description: String,
        /// Parsed price
        price: Money,
    },
    /// Waiting for the initial stock
    ProductStock {
        /// Entered name
        name: String,
        /// Entered description
        description: String,
        /// Parsed price
        price: Money,
        /// Photo file id or URL
        image_url: Option<String>,
    },
    /// Waiting for a new stock count for an existing product
    UpdatingStock {
        /// Product being restocked
        product_id: ProductId,
    },
}

impl AdminStage {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProductName => "AdminProductName",
            Self::ProductDescription { .. } => "AdminProductDescription",
            Self::ProductPrice { .. } => "AdminProductPrice",
            Self::ProductImage { .. } => "AdminProductImage",
            Self::ProductStock { .. } => "AdminProductStock",
            Self::UpdatingStock { .. } => "AdminUpdatingStock",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::validation::parse_phone;

    fn draft() -> DraftOrder {
        DraftOrder::priced(ProductId::new(1), Quantity::new(2).unwrap(), Money::from_kopecks(29_999)).unwrap()
    }

    fn contact() -> DeliveryContact {
        DeliveryContact {
            phone_number: parse_phone("+79001234567").unwrap(),
            delivery_address: "Ленина 10".into(),
        }
    }

    #[test]
    fn fresh_session_has_no_selection() {
        let session = Session::new(UserId::new(5));
        assert_eq!(session.stage, Stage::Start);
        assert_eq!(session.selected_product_id(), None);
        assert_eq!(session.draft(), None);
    }

    #[test]
    fn selection_and_draft_follow_the_stage() {
        let mut session = Session::new(UserId::new(5));
        session.stage = Stage::EnteringQuantity {
            product_id: ProductId::new(1),
        };
        assert_eq!(session.selected_product_id(), Some(ProductId::new(1)));
        assert_eq!(session.selected_quantity(), None);

        session.stage = Stage::AwaitingAddress {
            draft: draft(),
            phone_number: contact().phone_number,
        };
        assert_eq!(session.selected_quantity().map(Quantity::get), Some(2));
        assert_eq!(session.draft().unwrap().total_price, Money::from_kopecks(59_998));
    }

    #[test]
    fn completed_order_reopens_to_the_same_draft() {
        let date = NaiveDate::from_ymd_opt(2099, 6, 2).unwrap();
        let time = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let order = draft().complete(UserId::new(5), contact(), date, time);

        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.id, None);
        assert_eq!(order.reopen(), (draft(), contact()));
    }

    #[test]
    fn mid_flow_session_survives_the_cache_format() {
        let session = Session {
            user_id: UserId::new(42),
            stage: Stage::AwaitingDate {
                draft: draft(),
                contact: contact(),
                mode: CheckoutMode::Direct,
            },
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["stage"]["state"], "AwaitingDate");
        assert_eq!(json["stage"]["data"]["draft"]["total_price"], "599.98");

        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn admin_stage_serializes_with_step_tag() {
        let stage = Stage::Admin(AdminStage::ProductPrice {
            name: "Вода 1л".into(),
            description: "Питьевая".into(),
        });
        let json = serde_json::to_value(&stage).unwrap();
        assert_eq!(json["state"], "Admin");
        assert_eq!(json["data"]["step"], "ProductPrice");
        assert_eq!(serde_json::from_value::<Stage>(json).unwrap(), stage);
    }
}
