//! Core domain types for the ordering workflow.
//!
//! Identifiers are newtypes over the integer keys used by the durable store.
//! Validated values (`Quantity`, `PhoneNumber`) can only be built through their
//! parsing constructors, so an `Order` holding them is valid by construction.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a conversation partner (the chat id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new `UserId`
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a catalog product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i32);

impl ProductId {
    /// Creates a new `ProductId`
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned to an order by the durable store on commit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    /// Creates a new `OrderId`
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money amount in rubles, kept as an exact decimal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a money amount from a decimal value
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from kopecks (hundredths)
    #[must_use]
    pub fn from_kopecks(kopecks: i64) -> Self {
        Self(Decimal::new(kopecks, 2))
    }

    /// Returns the decimal amount
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Largest unit price the catalog can hold (`NUMERIC(10, 2)`).
    pub const MAX_PRICE: Decimal = Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2);

    /// Price of `quantity` units at this unit price, or `None` on overflow.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity.get())).map(Self)
    }

    /// Parses a positive amount typed by a person (`299.99` or `299,99`) that
    /// fits [`Money::MAX_PRICE`].
    #[must_use]
    pub fn parse_positive(text: &str) -> Option<Self> {
        let normalized = text.trim().replace(',', ".");
        let amount = Decimal::from_str(&normalized).ok()?.round_dp(2);
        (amount > Decimal::ZERO && amount <= Self::MAX_PRICE).then_some(Self(amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ₽", self.0)
    }
}

/// A strictly positive number of units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity a single order row can hold (`INTEGER`).
    pub const MAX: u32 = i32::MAX.unsigned_abs();

    /// Returns `None` for zero or anything above [`Quantity::MAX`].
    #[must_use]
    pub const fn new(units: u32) -> Option<Self> {
        if units == 0 || units > Self::MAX { None } else { Some(Self(units)) }
    }

    /// Number of units
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mobile number in the `+79XXXXXXXXX` national format.
///
/// Built through [`crate::validation::parse_phone`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub(crate) const fn new_unchecked(number: String) -> Self {
        Self(number)
    }

    /// Returns the number as text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog product. Read-only to the ordering workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display name, also accepted as typed selection
    pub name: String,
    /// Longer description shown in the catalog
    pub description: String,
    /// Current unit price
    pub price: Money,
    /// Photo reference (URL or transport file id)
    pub image_url: Option<String>,
    /// Units in stock
    pub stock: i32,
    /// Disabled products cannot be ordered
    pub is_available: bool,
}

/// Product fields gathered by the admin creation flow, before the store assigns an id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Unit price
    pub price: Money,
    /// Photo reference
    pub image_url: Option<String>,
    /// Initial stock
    pub stock: i32,
}

/// Lifecycle status of a committed order.
///
/// The workflow only ever creates `New` orders; the other values are set by
/// fulfillment processes outside this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Just placed, awaiting fulfillment
    New,
    /// Accepted by the operator
    Confirmed,
    /// Out for delivery
    Delivering,
    /// Handed to the customer
    Delivered,
    /// Cancelled by the operator
    Cancelled,
}

impl OrderStatus {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Confirmed => "Confirmed",
            Self::Delivering => "Delivering",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Confirmed" => Ok(Self::Confirmed),
            "Delivering" => Ok(Self::Delivering),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

/// A fully specified order.
///
/// Every field is populated and individually valid; `id` is `None` until the
/// durable store assigns one on commit. `total_price` is fixed when the
/// quantity is entered and never recomputed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Assigned by the store on commit
    pub id: Option<OrderId>,
    /// Who placed the order
    pub user_id: UserId,
    /// Ordered product
    pub product_id: ProductId,
    /// Number of units
    pub quantity: Quantity,
    /// Unit price × quantity, locked at order time
    pub total_price: Money,
    /// Contact number
    pub phone_number: PhoneNumber,
    /// Where to deliver
    pub delivery_address: String,
    /// Delivery day
    pub delivery_date: NaiveDate,
    /// Delivery time of day
    pub delivery_time: NaiveTime,
    /// Lifecycle status
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn total_is_exact_decimal_product() {
        let price = Money::parse_positive("299.99").unwrap();
        let total = price.times(Quantity::new(2).unwrap()).unwrap();
        assert_eq!(total, Money::from_kopecks(59_998));
        assert_eq!(total.to_string(), "599.98 ₽");
    }

    #[test]
    fn quantity_rejects_zero_and_oversized_counts() {
        assert!(Quantity::new(0).is_none());
        assert_eq!(Quantity::new(3).map(Quantity::get), Some(3));
        assert_eq!(Quantity::new(2_147_483_647).map(Quantity::get), Some(Quantity::MAX));
        assert!(Quantity::new(2_147_483_648).is_none());
        assert!(Quantity::new(3_000_000_000).is_none());
    }

    #[test]
    fn overflowing_total_is_none() {
        let huge = Money::new(Decimal::MAX);
        assert!(huge.times(Quantity::new(2).unwrap()).is_none());
        assert_eq!(huge.times(Quantity::new(1).unwrap()), Some(huge));
    }

    #[test]
    fn price_is_capped_at_catalog_precision() {
        assert_eq!(Money::parse_positive("99999999.99").map(|m| m.amount()), Some(Money::MAX_PRICE));
        assert!(Money::parse_positive("100000000").is_none());
        assert!(Money::parse_positive("79228162514264337593543950335").is_none());
    }

    #[test]
    fn money_parse_accepts_comma_and_rejects_non_positive() {
        assert_eq!(Money::parse_positive("129,99"), Some(Money::from_kopecks(12_999)));
        assert_eq!(Money::parse_positive(" 50 "), Some(Money::from_kopecks(5_000)));
        assert!(Money::parse_positive("0").is_none());
        assert!(Money::parse_positive("-3").is_none());
        assert!(Money::parse_positive("abc").is_none());
    }

    #[test]
    fn order_status_round_trips_through_text() {
        for status in [
            OrderStatus::New,
            OrderStatus::Confirmed,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("Lost".parse::<OrderStatus>().is_err());
    }
}
