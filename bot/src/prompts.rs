//! User-facing texts.

use crate::actions::Button;
use crate::effects::{Choice, Markup};
use crate::session::{DeliveryContact, DraftOrder};
use crate::types::{Order, OrderId, Product};
use crate::validation::DeliveryWindow;
use chrono::{NaiveDate, NaiveTime};

/// Main menu greeting
pub const MAIN_MENU: &str = "Добро пожаловать! Выберите действие:";
/// Picker header
pub const CHOOSE_PRODUCT: &str = "Выберите товар:";
/// Nothing to order
pub const EMPTY_CATALOG: &str = "Сейчас нет доступных товаров.";
/// Address step
pub const ENTER_ADDRESS: &str = "Введите адрес доставки:";
/// Order dropped by the user
pub const ORDER_CANCELLED: &str = "Заказ отменён.";
/// Admin sub-flow dropped
pub const ACTION_CANCELLED: &str = "Действие отменено.";
/// Terminal commit failure
pub const SUBMIT_FAILED: &str = "Не удалось сохранить заказ. Ваши данные сохранены, попробуйте ещё раз.";
/// Offer to resubmit after a failure
pub const RETRY_SUBMIT: &str = "Нажмите «Подтвердить», чтобы повторить отправку, или «Отмена».";
/// Orchestrator boundary failure
pub const APOLOGY: &str = "Произошла ошибка. Пожалуйста, попробуйте позже.";
/// No past orders
pub const EMPTY_HISTORY: &str = "У вас пока нет заказов.";
/// Admin panel header
pub const ADMIN_MENU: &str = "Панель администратора:";
/// Admin creation step 1
pub const ADMIN_ENTER_NAME: &str = "Введите название товара:";
/// Admin creation step 2
pub const ADMIN_ENTER_DESCRIPTION: &str = "Введите описание товара:";
/// Admin creation step 3
pub const ADMIN_ENTER_PRICE: &str = "Введите цену товара, например 299.99:";
/// Admin creation step 4
pub const ADMIN_SEND_IMAGE: &str = "Отправьте фото товара или ссылку на изображение (или «-», чтобы пропустить):";
/// Admin creation step 5
pub const ADMIN_ENTER_STOCK: &str = "Введите количество товара на складе:";
/// Admin write failed
pub const ADMIN_SAVE_FAILED: &str = "Не удалось сохранить изменения. Попробуйте позже.";
/// Restock picker header
pub const ADMIN_PICK_STOCK: &str = "Выберите товар для обновления остатка:";
/// Toggle picker header
pub const ADMIN_PICK_TOGGLE: &str = "Выберите товар, чтобы скрыть или показать его:";

const SLOT_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Product picker keyboard, available products only.
#[must_use]
pub fn product_choices<'a>(products: impl Iterator<Item = &'a Product>) -> Markup {
    Markup::Choices(
        products
            .map(|product| Choice::new(format!("{} {}", crate::actions::MENU_ORDER, product.name), Button::OrderProduct(product.id)))
            .collect(),
    )
}

/// Quantity step.
#[must_use]
pub fn enter_quantity(product: &Product) -> String {
    format!("Вы выбрали: {} ({}). Введите количество:", product.name, product.price)
}

/// Phone step, with the locked total.
#[must_use]
pub fn enter_phone(order_total: impl std::fmt::Display) -> String {
    format!(
        "Сумма заказа: {order_total}. Введите номер телефона в формате +79XXXXXXXXX или поделитесь контактом:"
    )
}

/// Date step.
#[must_use]
pub fn enter_date(window: &DeliveryWindow) -> String {
    format!(
        "Введите дату и время доставки в формате ДД.ММ.ГГГГ ЧЧ:ММ (доставка с {} до {}):",
        window.opens.format("%H:%M"),
        window.closes.format("%H:%M"),
    )
}

/// Repeat order intro, re-priced.
#[must_use]
pub fn repeat_intro(product: &Product, draft: &DraftOrder, contact: &DeliveryContact) -> String {
    format!(
        "Повтор заказа: {} × {} = {} (по текущей цене).\nТелефон: {}\nАдрес: {}",
        product.name, draft.quantity, draft.total_price, contact.phone_number, contact.delivery_address
    )
}

/// Review summary shown before a repeat order is submitted.
#[must_use]
pub fn order_summary(order: &Order, product_name: &str) -> String {
    format!(
        "Проверьте заказ:\nТовар: {product_name}\nКоличество: {}\nСумма: {}\nТелефон: {}\nАдрес: {}\nДоставка: {}\n\nПодтвердить заказ?",
        order.quantity,
        order.total_price,
        order.phone_number,
        order.delivery_address,
        order.delivery_date.and_time(order.delivery_time).format(SLOT_FORMAT),
    )
}

/// Confirmation line, rendered by transports for `ShowConfirmation`.
#[must_use]
pub fn confirmation(order_id: OrderId, delivery_date: NaiveDate, delivery_time: NaiveTime) -> String {
    format!(
        "Заказ №{order_id} оформлен! Доставка {}.",
        delivery_date.and_time(delivery_time).format(SLOT_FORMAT)
    )
}

/// New-order notice for the administrator.
#[must_use]
pub fn admin_notification(order_id: OrderId, order: &Order, product_name: Option<&str>) -> String {
    let product = product_name.map_or_else(|| format!("товар №{}", order.product_id), str::to_string);
    format!(
        "Новый заказ №{order_id}\nПокупатель: {}\nТовар: {product}\nКоличество: {}\nСумма: {}\nТелефон: {}\nАдрес: {}\nДоставка: {}",
        order.user_id,
        order.quantity,
        order.total_price,
        order.phone_number,
        order.delivery_address,
        order.delivery_date.and_time(order.delivery_time).format(SLOT_FORMAT),
    )
}

/// Restock step.
#[must_use]
pub fn admin_enter_new_stock(product: &Product) -> String {
    format!("Текущий остаток «{}»: {}. Введите новое количество:", product.name, product.stock)
}

/// Product created.
#[must_use]
pub fn admin_product_created(name: &str) -> String {
    format!("Товар «{name}» добавлен.")
}

/// Stock saved.
#[must_use]
pub fn admin_stock_updated(stock: i32) -> String {
    format!("Остаток обновлён: {stock} шт.")
}

/// Availability flipped.
#[must_use]
pub fn admin_toggled(product: &Product) -> String {
    if product.is_available {
        format!("Товар «{}» снова доступен для заказа.", product.name)
    } else {
        format!("Товар «{}» скрыт из каталога.", product.name)
    }
}

/// Label for a product in the admin pickers.
#[must_use]
pub fn admin_product_label(product: &Product) -> String {
    let status = if product.is_available { "доступен" } else { "скрыт" };
    format!("{} ({} шт., {status})", product.name, product.stock)
}
