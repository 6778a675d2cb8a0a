//! Read-only context handed to the workflow reducer.

use crate::types::{Product, ProductId, UserId};
use crate::validation::DeliveryWindow;
use courier_core::environment::Clock;
use std::sync::Arc;

/// Everything the reducer may consult besides the session itself.
#[derive(Clone)]
pub struct WorkflowEnvironment {
    /// Source of "now" for delivery slot checks
    pub clock: Arc<dyn Clock>,
    /// Product snapshot, empty when the step does not need one
    pub catalog: Catalog,
    /// Delivery hours
    pub delivery: DeliveryWindow,
    /// Configured administrator
    pub admin: Option<UserId>,
}

impl WorkflowEnvironment {
    /// Environment with an empty catalog and no administrator.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, delivery: DeliveryWindow) -> Self {
        Self {
            clock,
            catalog: Catalog::default(),
            delivery,
            admin: None,
        }
    }

    /// Replace the catalog snapshot
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the administrator
    #[must_use]
    pub const fn with_admin(mut self, admin: Option<UserId>) -> Self {
        self.admin = admin;
        self
    }

    /// Whether `user_id` may use admin actions.
    #[must_use]
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin == Some(user_id)
    }
}

impl std::fmt::Debug for WorkflowEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEnvironment")
            .field("now", &self.clock.now())
            .field("catalog", &self.catalog)
            .field("delivery", &self.delivery)
            .field("admin", &self.admin)
            .finish()
    }
}

/// A snapshot of every product, available or not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Wraps a product list
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Looks a product up by id, regardless of availability.
    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Looks a product up by the text of its picker label or its bare name.
    #[must_use]
    pub fn find_by_name(&self, text: &str) -> Option<&Product> {
        let text = text.trim();
        let name = text.strip_prefix(crate::actions::MENU_ORDER).map_or(text, str::trim);
        self.products.iter().find(|product| product.name == name)
    }

    /// Products that can be ordered.
    pub fn available(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|product| product.is_available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Money;

    fn product(id: i32, name: &str, is_available: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.into(),
            description: String::new(),
            price: Money::from_kopecks(100),
            image_url: None,
            stock: 10,
            is_available,
        }
    }

    #[test]
    fn name_lookup_accepts_picker_label() {
        let catalog = Catalog::new(vec![product(1, "Вода 19л", true), product(2, "Вода 5л", true)]);
        assert_eq!(catalog.find_by_name("Вода 5л").map(|p| p.id), Some(ProductId::new(2)));
        assert_eq!(catalog.find_by_name("Заказать Вода 19л").map(|p| p.id), Some(ProductId::new(1)));
        assert!(catalog.find_by_name("Сок").is_none());
    }

    #[test]
    fn available_skips_disabled_products() {
        let catalog = Catalog::new(vec![product(1, "A", true), product(2, "B", false)]);
        let ids: Vec<_> = catalog.available().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProductId::new(1)]);
        assert!(catalog.find(ProductId::new(2)).is_some());
    }
}
