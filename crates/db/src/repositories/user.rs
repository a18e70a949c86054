use sqlx::Row;

use shoply_core::domain::user::User;

use super::{RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT phone, password, name FROM user WHERE phone = ?")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| User {
            phone: row.get::<String, _>("phone"),
            password: row.get::<String, _>("password"),
            name: row.get::<String, _>("name"),
        }))
    }

    async fn save(&self, user: User) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user (phone, password, name)
             VALUES (?, ?, ?)
             ON CONFLICT(phone) DO UPDATE SET
                 password = excluded.password,
                 name = excluded.name",
        )
        .bind(&user.phone)
        .bind(&user.password)
        .bind(&user.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
