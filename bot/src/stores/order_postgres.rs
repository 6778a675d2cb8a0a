//! `PostgreSQL` order repository implementation.
//!
//! Products and orders live in two tables created by the embedded migrations.
//! Queries are plain runtime `sqlx` queries mapped through row structs, so the
//! crate builds without a live database.
//!
//! # Example
//!
//! ```no_run
//! use courier_bot::stores::PostgresOrderRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = PostgresOrderRepository::connect("postgres://localhost/courier", 5).await?;
//! repository.initialize().await?;
//! # Ok(())
//! # }
//! ```

use super::default_products;
use crate::error::{RepositoryError, RepositoryResult};
use crate::providers::OrderRepository;
use crate::types::{Money, NewProduct, Order, OrderId, OrderStatus, PhoneNumber, Product, ProductId, Quantity, UserId};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, stock, is_available";
const ORDER_COLUMNS: &str = "id, user_id, product_id, quantity, total_price, phone_number, \
                             delivery_address, delivery_date, delivery_time, status";

/// `PostgreSQL` order repository.
#[derive(Debug, Clone)]
pub struct PostgresOrderRepository {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to connect: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Create the schema if absent and seed the default catalog into an empty
    /// `products` table.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if a migration or the seed fails.
    pub async fn initialize(&self) -> RepositoryResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Migration failed: {e}")))?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        if count == 0 {
            let seed = default_products();
            for product in &seed {
                self.insert_product(product).await?;
            }
            tracing::info!(products = seed.len(), "Seeded default catalog");
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    image_url: Option<String>,
    stock: i32,
    is_available: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: Money::new(row.price),
            image_url: row.image_url,
            stock: row.stock,
            is_available: row.is_available,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    product_id: i32,
    quantity: i32,
    total_price: Decimal,
    phone_number: String,
    delivery_address: String,
    delivery_date: NaiveDate,
    delivery_time: NaiveTime,
    status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> RepositoryResult<Self> {
        let quantity = u32::try_from(row.quantity)
            .ok()
            .and_then(Quantity::new)
            .ok_or_else(|| RepositoryError::Corrupt(format!("order {} has quantity {}", row.id, row.quantity)))?;
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::Corrupt(format!("order {}: {e}", row.id)))?;

        Ok(Self {
            id: Some(OrderId::new(row.id)),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity,
            total_price: Money::new(row.total_price),
            phone_number: PhoneNumber::new_unchecked(row.phone_number),
            delivery_address: row.delivery_address,
            delivery_date: row.delivery_date,
            delivery_time: row.delivery_time,
            status,
        })
    }
}

fn quantity_column(quantity: Quantity) -> RepositoryResult<i32> {
    i32::try_from(quantity.get())
        .map_err(|_| RepositoryError::Corrupt(format!("quantity {quantity} does not fit the orders table")))
}

impl OrderRepository for PostgresOrderRepository {
    async fn get_product(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    async fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert_order(&self, order: &Order) -> RepositoryResult<OrderId> {
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO orders
                (user_id, product_id, quantity, total_price, phone_number,
                 delivery_address, delivery_date, delivery_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(order.user_id.value())
        .bind(order.product_id.value())
        .bind(quantity_column(order.quantity)?)
        .bind(order.total_price.amount())
        .bind(order.phone_number.as_str())
        .bind(&order.delivery_address)
        .bind(order.delivery_date)
        .bind(order.delivery_time)
        .bind(order.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderId::new(id))
    }

    async fn get_order(&self, id: OrderId) -> RepositoryResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn insert_product(&self, product: &NewProduct) -> RepositoryResult<ProductId> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO products (name, description, price, image_url, stock, is_available)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.image_url.as_deref())
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProductId::new(id))
    }

    async fn update_stock(&self, id: ProductId, stock: i32) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
            .bind(id.value())
            .bind(stock)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::product_not_found(id));
        }
        Ok(())
    }

    async fn set_availability(&self, id: ProductId, is_available: bool) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE products SET is_available = $2 WHERE id = $1")
            .bind(id.value())
            .bind(is_available)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::product_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    fn row(quantity: i32, status: &str) -> OrderRow {
        OrderRow {
            id: 5,
            user_id: 100,
            product_id: 1,
            quantity,
            total_price: Decimal::new(59_998, 2),
            phone_number: "+79001234567".into(),
            delivery_address: "Ленина 10".into(),
            delivery_date: NaiveDate::from_ymd_opt(2099, 6, 2).unwrap(),
            delivery_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            status: status.into(),
        }
    }

    #[test]
    fn order_rows_map_to_domain_orders() {
        let order = Order::try_from(row(2, "New")).unwrap();
        assert_eq!(order.id, Some(OrderId::new(5)));
        assert_eq!(order.quantity.get(), 2);
        assert_eq!(order.total_price, Money::from_kopecks(59_998));
        assert_eq!(order.status, OrderStatus::New);
    }

    #[test]
    fn rows_with_impossible_values_are_corrupt() {
        assert!(matches!(Order::try_from(row(0, "New")), Err(RepositoryError::Corrupt(_))));
        assert!(matches!(Order::try_from(row(-3, "New")), Err(RepositoryError::Corrupt(_))));
        assert!(matches!(Order::try_from(row(1, "Lost")), Err(RepositoryError::Corrupt(_))));
    }
}
