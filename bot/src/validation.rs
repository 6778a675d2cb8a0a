//! Field validation for the ordering dialogue.
//!
//! Every parser here is pure and returns a [`ValidationError`] whose display
//! text is the re-prompt shown to the user.

use crate::types::{Money, PhoneNumber, Quantity};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Result type alias for validation.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Input date/time layout, `DD.MM.YYYY HH:MM`.
pub const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

#[allow(clippy::expect_used)] // Literal pattern, covered by tests
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+79[0-9]{9}$").expect("phone pattern is valid"));

#[allow(clippy::expect_used)] // Literal pattern, covered by tests
static DATE_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}\.[0-9]{2}\.[0-9]{4} [0-9]{2}:[0-9]{2}$").expect("date pattern is valid")
});

/// Rejected user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Text does not name a product in the list.
    #[error("Пожалуйста, выберите товар из списка.")]
    UnknownProduct,

    /// Referenced order does not exist or belongs to someone else.
    #[error("Заказ не найден.")]
    OrderNotFound,

    /// Product was removed or disabled.
    #[error("К сожалению, этот товар больше недоступен.")]
    ProductUnavailable,

    /// Quantity is not a positive integer.
    #[error("Пожалуйста, введите корректное количество (целое число больше 0).")]
    InvalidQuantity,

    /// Phone number does not match `+79XXXXXXXXX`.
    #[error("Неверный формат номера. Введите номер в формате +79XXXXXXXXX, например +79123456789.")]
    InvalidPhone,

    /// Address is blank.
    #[error("Пожалуйста, введите корректный адрес доставки.")]
    EmptyAddress,

    /// Text does not look like `DD.MM.YYYY HH:MM`.
    #[error("Неверный формат. Введите дату и время в формате ДД.ММ.ГГГГ ЧЧ:ММ, например 25.12.2024 14:30.")]
    DateTimeFormat,

    /// Looks right but names no real calendar moment.
    #[error("Такой даты или времени не существует. Проверьте введённые значения.")]
    ImpossibleDateTime,

    /// Not strictly later than now.
    #[error("Дата и время доставки должны быть в будущем.")]
    NotInFuture,

    /// Time of day falls outside delivery hours.
    #[error("Доставка осуществляется с {opens} до {closes}. Выберите другое время.")]
    OutsideDeliveryHours {
        /// Window start, inclusive
        opens: String,
        /// Window end, exclusive
        closes: String,
    },

    /// Input kind does not fit the current step.
    #[error("Пожалуйста, следуйте подсказке или воспользуйтесь кнопками меню.")]
    UnexpectedInput,

    /// Admin: required text field is blank.
    #[error("Значение не может быть пустым. Попробуйте ещё раз.")]
    EmptyText,

    /// Admin: price is not a positive decimal.
    #[error("Введите корректную цену, например 299.99.")]
    InvalidPrice,

    /// Admin: stock is not a non-negative integer.
    #[error("Введите корректное количество на складе (целое число, 0 или больше).")]
    InvalidStock,

    /// Non-admin tried an admin action.
    #[error("Эта команда доступна только администратору.")]
    NotPermitted,
}

/// Parses a strictly positive integer quantity no larger than [`Quantity::MAX`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidQuantity`] for anything else.
pub fn parse_quantity(text: &str) -> Result<Quantity> {
    text.trim()
        .parse::<u32>()
        .ok()
        .and_then(Quantity::new)
        .ok_or(ValidationError::InvalidQuantity)
}

/// Checks typed text against the mobile number pattern. No normalization.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPhone`] when the text does not match exactly.
pub fn parse_phone(text: &str) -> Result<PhoneNumber> {
    if PHONE_PATTERN.is_match(text) {
        Ok(PhoneNumber::new_unchecked(text.to_string()))
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

/// Parses a number shared as a contact card.
///
/// Transports often drop the leading `+`; it is restored before the strict check.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPhone`] when the normalized number does not match.
pub fn parse_contact(raw: &str) -> Result<PhoneNumber> {
    let raw = raw.trim();
    if raw.starts_with('+') {
        parse_phone(raw)
    } else {
        parse_phone(&format!("+{raw}"))
    }
}

/// Accepts any address that is not blank.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyAddress`] for blank text.
pub fn parse_address(text: &str) -> Result<String> {
    let address = text.trim();
    if address.is_empty() {
        Err(ValidationError::EmptyAddress)
    } else {
        Ok(address.to_string())
    }
}

/// Admin: trims a required free-text field.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyText`] for blank text.
pub fn parse_required(text: &str) -> Result<String> {
    let value = text.trim();
    if value.is_empty() {
        Err(ValidationError::EmptyText)
    } else {
        Ok(value.to_string())
    }
}

/// Admin: parses a positive price within [`Money::MAX_PRICE`].
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPrice`].
pub fn parse_price(text: &str) -> Result<Money> {
    Money::parse_positive(text).ok_or(ValidationError::InvalidPrice)
}

/// Admin: parses a non-negative stock count.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidStock`].
pub fn parse_stock(text: &str) -> Result<i32> {
    text.trim()
        .parse::<i32>()
        .ok()
        .filter(|stock| *stock >= 0)
        .ok_or(ValidationError::InvalidStock)
}

/// Delivery hours and the local time zone they are expressed in.
///
/// Accepted slots are strictly later than now and start within
/// `[opens, closes)`: the closing time itself is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryWindow {
    /// First accepted time of day
    pub opens: NaiveTime,
    /// First rejected time of day
    pub closes: NaiveTime,
    /// Offset of the local wall clock that users type times in
    pub utc_offset: FixedOffset,
}

impl Default for DeliveryWindow {
    fn default() -> Self {
        Self {
            opens: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            closes: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default(),
            utc_offset: FixedOffset::east_opt(3 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl DeliveryWindow {
    /// Parses `DD.MM.YYYY HH:MM` and checks it against now and the window.
    ///
    /// Rules are applied in order: layout, calendar validity, future, hours.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing rule.
    pub fn parse(&self, text: &str, now: DateTime<Utc>) -> Result<(NaiveDate, NaiveTime)> {
        let text = text.trim();
        if !DATE_TIME_PATTERN.is_match(text) {
            return Err(ValidationError::DateTimeFormat);
        }

        let slot = NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
            .map_err(|_| ValidationError::ImpossibleDateTime)?;

        self.check(slot.date(), slot.time(), now)?;
        Ok((slot.date(), slot.time()))
    }

    /// Re-checks an already parsed slot, e.g. at confirmation time.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotInFuture`] or [`ValidationError::OutsideDeliveryHours`].
    pub fn check(&self, date: NaiveDate, time: NaiveTime, now: DateTime<Utc>) -> Result<()> {
        let local_now = now.with_timezone(&self.utc_offset).naive_local();
        if date.and_time(time) <= local_now {
            return Err(ValidationError::NotInFuture);
        }

        if time < self.opens || time >= self.closes {
            return Err(ValidationError::OutsideDeliveryHours {
                opens: self.opens.format("%H:%M").to_string(),
                closes: self.closes.format("%H:%M").to_string(),
            });
        }

        Ok(())
    }
}
