use sqlx::Row;

use shoply_core::domain::order::{Order, OrderId, OrderItem, OrderStatus};

use super::{
    decode_decimal, decode_quantity, decode_status, decode_timestamp, OrderRepository,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: &str) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT good_id, good_name, unit_price, quantity, subtotal
             FROM order_item WHERE order_id = ? ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(OrderItem {
                    good_id: row.get::<i64, _>("good_id"),
                    good_name: row.get::<String, _>("good_name"),
                    unit_price: decode_decimal("unit_price", &row.get::<String, _>("unit_price"))?,
                    quantity: decode_quantity("quantity", row.get::<i64, _>("quantity"))?,
                    subtotal: decode_decimal("subtotal", &row.get::<String, _>("subtotal"))?,
                })
            })
            .collect()
    }

    async fn order_from_row(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<Order, RepositoryError> {
        let order_id = row.get::<String, _>("order_id");
        let items = self.load_items(&order_id).await?;

        Ok(Order {
            order_id: OrderId(order_id),
            user_phone: row.get::<String, _>("user_phone"),
            shipping_address: row.get::<String, _>("shipping_address"),
            status: decode_status(row.get::<i64, _>("status"))?,
            discount_policy: row.get::<String, _>("discount_policy"),
            total_amount: decode_decimal("total_amount", &row.get::<String, _>("total_amount"))?,
            discount_amount: decode_decimal(
                "discount_amount",
                &row.get::<String, _>("discount_amount"),
            )?,
            final_amount: decode_decimal("final_amount", &row.get::<String, _>("final_amount"))?,
            items,
            created_at: decode_timestamp("created_at", &row.get::<String, _>("created_at"))?,
        })
    }

    async fn collect_orders(
        &self,
        rows: Vec<sqlx::sqlite::SqliteRow>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(self.order_from_row(row).await?);
        }
        Ok(orders)
    }
}

const ORDER_COLUMNS: &str = "order_id, user_phone, shipping_address, status, discount_policy, \
                             total_amount, discount_amount, final_amount, created_at";

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.order_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, phone: &str) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_phone = ? ORDER BY created_at DESC"
        ))
        .bind(phone)
        .fetch_all(&self.pool)
        .await?;

        self.collect_orders(rows).await
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        self.collect_orders(rows).await
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ? ORDER BY created_at DESC"
        ))
        .bind(status.code())
        .fetch_all(&self.pool)
        .await?;

        self.collect_orders(rows).await
    }

    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (order_id, user_phone, shipping_address, status, discount_policy,
                                 total_amount, discount_amount, final_amount, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.order_id.0)
        .bind(&order.user_phone)
        .bind(&order.shipping_address)
        .bind(order.status.code())
        .bind(&order.discount_policy)
        .bind(order.total_amount.to_string())
        .bind(order.discount_amount.to_string())
        .bind(order.final_amount.to_string())
        .bind(order.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_item (order_id, position, good_id, good_name, unit_price, quantity, subtotal)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&order.order_id.0)
            .bind(position as i64)
            .bind(item.good_id)
            .bind(&item.good_name)
            .bind(item.unit_price.to_string())
            .bind(i64::from(item.quantity))
            .bind(item.subtotal.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let updated = sqlx::query("UPDATE orders SET status = ? WHERE order_id = ?")
            .bind(status.code())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(updated.rows_affected() == 1)
    }

    async fn delete(&self, id: &OrderId) -> Result<bool, RepositoryError> {
        // Item rows cascade via the foreign key.
        let deleted = sqlx::query("DELETE FROM orders WHERE order_id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected() == 1)
    }
}
