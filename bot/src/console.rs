//! Line-oriented console transport used by the `courier-bot` binary.
//!
//! Each input line is `<userId> <text>`. Non-text events use a `#` prefix:
//!
//! ```text
//! 100 /order
//! 100 #button order_1
//! 100 #contact 79001234567
//! 1 #photo AgACAgIAAxkBAAI
//! ```

use crate::actions::{Button, Inbound, InboundKind, MENU_CATALOG, MENU_HISTORY, MENU_ORDER};
use crate::effects::{ChatEffect, Choice, Markup, OrderHistoryEntry};
use crate::prompts;
use crate::types::{Product, UserId};
use std::fmt::Write;

/// Parses one console line. Returns `None` for blank or malformed lines.
#[must_use]
pub fn parse_line(line: &str) -> Option<Inbound> {
    let (user, rest) = line.trim().split_once(char::is_whitespace)?;
    let user_id = UserId::new(user.parse().ok()?);
    let rest = rest.trim_start();

    let kind = match rest.split_once(char::is_whitespace) {
        Some(("#contact", phone)) => InboundKind::Contact {
            phone_number: phone.trim().to_string(),
        },
        Some(("#photo", file_id)) => InboundKind::Photo {
            file_id: file_id.trim().to_string(),
        },
        Some(("#button", payload)) => InboundKind::Button {
            payload: payload.trim().to_string(),
        },
        _ if rest.is_empty() => return None,
        _ => InboundKind::Text(rest.to_string()),
    };
    Some(Inbound { user_id, kind })
}

/// Renders an effect as console text. Persistence effects have no rendering.
#[must_use]
pub fn render(effect: &ChatEffect) -> Option<String> {
    let text = match effect {
        ChatEffect::ShowPrompt { text, markup } => with_markup(text.clone(), markup),
        ChatEffect::ShowError(text) => format!("⚠ {text}"),
        ChatEffect::ShowConfirmation {
            order_id,
            delivery_date,
            delivery_time,
        } => prompts::confirmation(*order_id, *delivery_date, *delivery_time),
        ChatEffect::ResetToMenu => with_markup(prompts::MAIN_MENU.to_string(), &Markup::MainMenu),
        ChatEffect::ShowCatalog(products) => catalog(products),
        ChatEffect::ShowOrderHistory(entries) => history(entries),
        ChatEffect::NotifyAdmin { admin, text } => format!("→ admin {admin}:\n{text}"),
        ChatEffect::SubmitOrder(_) | ChatEffect::CreateProduct(_) | ChatEffect::UpdateStock { .. } => return None,
    };
    Some(text)
}

fn with_markup(mut text: String, markup: &Markup) -> String {
    let buttons: Vec<String> = match markup {
        Markup::None => return text,
        Markup::MainMenu => vec![label(MENU_ORDER), label(MENU_CATALOG), label(MENU_HISTORY)],
        Markup::RequestContact => vec!["[Отправить контакт → #contact <номер>]".to_string()],
        Markup::ConfirmOrCancel => vec![
            button("Подтвердить", &Button::Confirm),
            button("Отмена", &Button::Cancel),
        ],
        Markup::AdminMenu => vec![
            button("Добавить товар", &Button::AdminAddProduct),
            button("Обновить остаток", &Button::AdminUpdateStock),
            button("Скрыть/показать", &Button::AdminToggleProduct),
            button("Меню", &Button::Menu),
        ],
        Markup::Choices(choices) => choices
            .iter()
            .map(|Choice { label, button: pressed }| button(label, pressed))
            .collect(),
    };

    for line in buttons {
        text.push('\n');
        text.push_str(&line);
    }
    text
}

fn label(text: &str) -> String {
    format!("[{text}]")
}

fn button(text: &str, button: &Button) -> String {
    format!("[{text} → #button {}]", button.payload())
}

fn catalog(products: &[Product]) -> String {
    let mut out = String::from("Ассортимент:");
    for product in products {
        let _ = write!(
            out,
            "\n• {}: {} ({} шт.)\n  {}\n  {}",
            product.name,
            product.price,
            product.stock,
            product.description,
            button(MENU_ORDER, &Button::OrderProduct(product.id)),
        );
    }
    out
}

fn history(entries: &[OrderHistoryEntry]) -> String {
    let mut out = String::from("Ваши заказы:");
    for OrderHistoryEntry { order, product_name } in entries {
        let id = order.id.map_or_else(String::new, |id| format!("№{id} "));
        let name = product_name.as_deref().unwrap_or("товар снят с продажи");
        let _ = write!(
            out,
            "\n• {id}{name} × {} = {}, {} {} ({})",
            order.quantity,
            order.total_price,
            order.delivery_date.format("%d.%m.%Y"),
            order.delivery_time.format("%H:%M"),
            order.status,
        );
        if let Some(order_id) = order.id {
            out.push_str("\n  ");
            out.push_str(&button("Повторить", &Button::Repeat(order_id)));
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::types::{OrderId, ProductId};
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn text_lines_keep_inner_spacing() {
        let inbound = parse_line("100 Ленина  10").unwrap();
        assert_eq!(inbound, Inbound::text(UserId::new(100), "Ленина  10"));
    }

    #[test]
    fn hash_prefixes_select_event_kinds() {
        assert_eq!(
            parse_line("100 #contact 79001234567").unwrap(),
            Inbound::contact(UserId::new(100), "79001234567")
        );
        assert_eq!(
            parse_line("1 #photo file-1").unwrap(),
            Inbound::photo(UserId::new(1), "file-1")
        );
        assert_eq!(
            parse_line("100 #button order_2").unwrap(),
            Inbound::button(UserId::new(100), &Button::OrderProduct(ProductId::new(2)))
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("100"), None);
        assert_eq!(parse_line("bob hello"), None);
    }

    #[test]
    fn choices_render_their_payloads() {
        let effect = ChatEffect::prompt_with(
            "Выберите товар:",
            Markup::Choices(vec![Choice::new("Заказать Вода 5л", Button::OrderProduct(ProductId::new(2)))]),
        );
        assert_eq!(
            render(&effect).unwrap(),
            "Выберите товар:\n[Заказать Вода 5л → #button order_2]"
        );
    }

    #[test]
    fn confirmation_names_the_order() {
        let effect = ChatEffect::ShowConfirmation {
            order_id: OrderId::new(12),
            delivery_date: NaiveDate::from_ymd_opt(2099, 6, 2).unwrap(),
            delivery_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        };
        assert_eq!(render(&effect).unwrap(), "Заказ №12 оформлен! Доставка 02.06.2099 12:00.");
    }
}
