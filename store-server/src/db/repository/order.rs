//! Order Repository
//!
//! One document per order, keyed by `order_id`. Concurrent writes are
//! last-write-wins: `save` replaces the whole document.

use super::{BaseRepository, RepoResult, unique_violation};
use shared::models::{Order, OrderStatus};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// 列表查询条件
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find order by client order number
    pub async fn find_by_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * OMIT id FROM order WHERE order_number = $order_number")
            .bind(("order_number", order_number.to_string()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Find order by the reference sent to the payment provider
    pub async fn find_by_payment_ref(&self, payment_ref: &str) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * OMIT id FROM order WHERE payment_ref = $payment_ref")
            .bind(("payment_ref", payment_ref.to_string()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Insert a new order document
    ///
    /// An existing order with the same `order_number` yields `RepoError::Duplicate`.
    pub async fn create(&self, order: &Order) -> RepoResult<()> {
        let duplicate = || format!("Order {} already exists", order.order_number);
        self.base
            .db()
            .query("CREATE type::thing('order', $id) CONTENT $data RETURN NONE")
            .bind(("id", order.order_id.clone()))
            .bind(("data", order.clone()))
            .await
            .map_err(|e| unique_violation(e, duplicate))?
            .check()
            .map_err(|e| unique_violation(e, duplicate))?;
        Ok(())
    }

    /// Replace an existing order document
    pub async fn save(&self, order: &Order) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE type::thing('order', $id) CONTENT $data RETURN NONE")
            .bind(("id", order.order_id.clone()))
            .bind(("data", order.clone()))
            .await?
            .check()?;
        Ok(())
    }

    /// Orders matching `filter`, newest first
    ///
    /// Pagination is applied by the caller: ORDER BY + LIMIT on an indexed
    /// WHERE clause drops rows in the embedded engine.
    pub async fn list(&self, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
        let mut conditions = Vec::new();
        if filter.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!("SELECT * OMIT id FROM order {where_clause} ORDER BY created_at DESC");
        let mut query = self.base.db().query(sql);
        if let Some(user_id) = &filter.user_id {
            query = query.bind(("user_id", user_id.clone()));
        }
        if let Some(status) = filter.status {
            query = query.bind(("status", status.as_str().to_string()));
        }

        let orders: Vec<Order> = query.await?.take(0)?;
        Ok(orders)
    }

    /// Orders created in `[start, end)`
    pub async fn find_created_between(&self, start: i64, end: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * OMIT id FROM order WHERE created_at >= $start AND created_at < $end",
            )
            .bind(("start", start))
            .bind(("end", end))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// All orders past the draft stage
    pub async fn find_placed(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * OMIT id FROM order WHERE status != 'Draft'")
            .await?
            .take(0)?;
        Ok(orders)
    }
}
