use sqlx::Row;

use shoply_core::domain::good::{Good, GoodId};

use super::{decode_decimal, decode_quantity, GoodRepository, RepositoryError, StockDecrement};
use crate::DbPool;

pub struct SqlGoodRepository {
    pool: DbPool,
}

impl SqlGoodRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn good_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Good, RepositoryError> {
    Ok(Good {
        id: row.get::<i64, _>("id"),
        name: row.get::<String, _>("name"),
        price: decode_decimal("price", &row.get::<String, _>("price"))?,
        stock: decode_quantity("stock", row.get::<i64, _>("stock"))?,
        category: row.get::<String, _>("category"),
    })
}

#[async_trait::async_trait]
impl GoodRepository for SqlGoodRepository {
    async fn find_by_id(&self, id: GoodId) -> Result<Option<Good>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, price, stock, category FROM good WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(good_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Good>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, price, stock, category FROM good ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(good_from_row).collect()
    }

    async fn save(&self, good: Good) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO good (id, name, price, stock, category)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 price = excluded.price,
                 stock = excluded.stock,
                 category = excluded.category",
        )
        .bind(good.id)
        .bind(&good.name)
        .bind(good.price.to_string())
        .bind(i64::from(good.stock))
        .bind(&good.category)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn decrement_stock(
        &self,
        id: GoodId,
        quantity: u32,
    ) -> Result<StockDecrement, RepositoryError> {
        // Single conditional UPDATE: the check and the decrement happen in
        // one statement, so concurrent settlements cannot both pass.
        let updated = sqlx::query(
            "UPDATE good SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
        )
        .bind(i64::from(quantity))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 1 {
            let remaining = sqlx::query("SELECT stock FROM good WHERE id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?
                .get::<i64, _>("stock");
            return Ok(StockDecrement::Applied {
                remaining: decode_quantity("stock", remaining)?,
            });
        }

        match sqlx::query("SELECT stock FROM good WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        {
            Some(row) => Ok(StockDecrement::Insufficient {
                available: decode_quantity("stock", row.get::<i64, _>("stock"))?,
            }),
            None => Ok(StockDecrement::NotFound),
        }
    }

    async fn restore_stock(&self, id: GoodId, quantity: u32) -> Result<bool, RepositoryError> {
        let updated = sqlx::query("UPDATE good SET stock = stock + ? WHERE id = ?")
            .bind(i64::from(quantity))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(updated.rows_affected() == 1)
    }
}
