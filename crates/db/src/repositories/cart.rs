use sqlx::Row;

use shoply_core::domain::cart::{Cart, CartId, CartItem};

use super::{decode_decimal, decode_quantity, decode_timestamp, CartRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCartRepository {
    pool: DbPool,
}

impl SqlCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, cart_id: &str) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT good_id, good_name, unit_price, quantity, subtotal
             FROM cart_item WHERE cart_id = ? ORDER BY position",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CartItem {
                    good_id: row.get::<i64, _>("good_id"),
                    good_name: row.get::<String, _>("good_name"),
                    unit_price: decode_decimal("unit_price", &row.get::<String, _>("unit_price"))?,
                    quantity: decode_quantity("quantity", row.get::<i64, _>("quantity"))?,
                    subtotal: decode_decimal("subtotal", &row.get::<String, _>("subtotal"))?,
                })
            })
            .collect()
    }

    async fn cart_from_row(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<Cart, RepositoryError> {
        let cart_id = row.get::<String, _>("cart_id");
        let items = self.load_items(&cart_id).await?;

        Ok(Cart {
            cart_id: CartId(cart_id),
            user_phone: row.get::<String, _>("user_phone"),
            shipping_address: row.get::<String, _>("shipping_address"),
            discount_policy: row.get::<String, _>("discount_policy"),
            total_amount: decode_decimal("total_amount", &row.get::<String, _>("total_amount"))?,
            discount_amount: decode_decimal(
                "discount_amount",
                &row.get::<String, _>("discount_amount"),
            )?,
            final_amount: decode_decimal("final_amount", &row.get::<String, _>("final_amount"))?,
            items,
            is_converted: row.get::<i64, _>("is_converted") != 0,
            created_at: decode_timestamp("created_at", &row.get::<String, _>("created_at"))?,
        })
    }
}

const CART_COLUMNS: &str = "cart_id, user_phone, shipping_address, discount_policy, \
                            total_amount, discount_amount, final_amount, is_converted, created_at";

#[async_trait::async_trait]
impl CartRepository for SqlCartRepository {
    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {CART_COLUMNS} FROM cart WHERE cart_id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.cart_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn find_active_by_user(&self, phone: &str) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM cart
             WHERE user_phone = ? AND is_converted = 0
             ORDER BY created_at DESC, cart_id DESC
             LIMIT 1"
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.cart_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn save(&self, cart: Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO cart (cart_id, user_phone, shipping_address, discount_policy,
                               total_amount, discount_amount, final_amount, is_converted, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(cart_id) DO UPDATE SET
                 user_phone = excluded.user_phone,
                 shipping_address = excluded.shipping_address,
                 discount_policy = excluded.discount_policy,
                 total_amount = excluded.total_amount,
                 discount_amount = excluded.discount_amount,
                 final_amount = excluded.final_amount,
                 is_converted = excluded.is_converted",
        )
        .bind(&cart.cart_id.0)
        .bind(&cart.user_phone)
        .bind(&cart.shipping_address)
        .bind(&cart.discount_policy)
        .bind(cart.total_amount.to_string())
        .bind(cart.discount_amount.to_string())
        .bind(cart.final_amount.to_string())
        .bind(i64::from(cart.is_converted))
        .bind(cart.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_item WHERE cart_id = ?")
            .bind(&cart.cart_id.0)
            .execute(&mut *tx)
            .await?;

        for (position, item) in cart.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO cart_item (cart_id, position, good_id, good_name, unit_price, quantity, subtotal)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&cart.cart_id.0)
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

    async fn mark_converted(&self, id: &CartId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE cart SET is_converted = 1 WHERE cart_id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: &CartId) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM cart WHERE cart_id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected() == 1)
    }
}
