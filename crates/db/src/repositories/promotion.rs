use sqlx::Row;

use shoply_core::domain::good::GoodId;
use shoply_core::promo::{Promotion, Scope};

use super::{decode_timestamp, PromotionRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPromotionRepository {
    pool: DbPool,
}

impl SqlPromotionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn promotion_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Promotion, RepositoryError> {
    let name = row.get::<String, _>("name");
    let policy = serde_json::from_str(&row.get::<String, _>("policy")).map_err(|error| {
        RepositoryError::Decode(format!("promotion `{name}` holds invalid policy JSON: {error}"))
    })?;
    let scope: Scope = serde_json::from_str(&row.get::<String, _>("scope")).map_err(|error| {
        RepositoryError::Decode(format!("promotion `{name}` holds invalid scope: {error}"))
    })?;

    Ok(Promotion {
        name,
        policy,
        scope,
        active: row.get::<i64, _>("active") != 0,
        created_at: decode_timestamp("created_at", &row.get::<String, _>("created_at"))?,
    })
}

fn encode_scope(scope: &Scope) -> Result<String, RepositoryError> {
    serde_json::to_string(scope)
        .map_err(|error| RepositoryError::Decode(format!("scope failed to encode: {error}")))
}

const PROMOTION_COLUMNS: &str = "name, policy, scope, active, created_at";

#[async_trait::async_trait]
impl PromotionRepository for SqlPromotionRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Promotion>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PROMOTION_COLUMNS} FROM promotion WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(promotion_from_row).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PROMOTION_COLUMNS} FROM promotion ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(promotion_from_row).collect()
    }

    async fn list_active(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotion WHERE active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(promotion_from_row).collect()
    }

    async fn list_for_good(&self, id: GoodId) -> Result<Vec<Promotion>, RepositoryError> {
        // Scope is opaque JSON in the store, so applicability is decided
        // here rather than in SQL.
        let active = self.list_active().await?;
        Ok(active.into_iter().filter(|promotion| promotion.scope.applies_to(id)).collect())
    }

    async fn save(&self, promotion: Promotion) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO promotion (name, policy, scope, active, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                 policy = excluded.policy,
                 scope = excluded.scope,
                 active = excluded.active",
        )
        .bind(&promotion.name)
        .bind(promotion.policy.to_string())
        .bind(encode_scope(&promotion.scope)?)
        .bind(i64::from(promotion.active))
        .bind(promotion.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, name: &str, promotion: Promotion) -> Result<bool, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE promotion SET name = ?, policy = ?, scope = ?, active = ? WHERE name = ?",
        )
        .bind(&promotion.name)
        .bind(promotion.policy.to_string())
        .bind(encode_scope(&promotion.scope)?)
        .bind(i64::from(promotion.active))
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(updated.rows_affected() == 1)
    }

    async fn delete(&self, name: &str) -> Result<bool, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM promotion WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(deleted.rows_affected() == 1)
    }
}
