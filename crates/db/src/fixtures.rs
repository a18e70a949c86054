use sqlx::{Executor, Row};

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_USER_PHONES: &[&str] = &["13800000001", "13800000002"];
const SEED_GOOD_IDS: &[i64] = &[1, 2, 3, 4, 5];
const SEED_PROMOTION_NAMES: &[&str] =
    &["store-90off", "kettle-step", "keyboard-coupon", "retired-half-price"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub users: usize,
    pub goods: usize,
    pub promotions: usize,
}

/// Deterministic demo dataset: shoppers, catalog rows, and one promotion of
/// each store-resident kind (plus one deactivated row). Loading is
/// idempotent.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            users: SEED_USER_PHONES.len(),
            goods: SEED_GOOD_IDS.len(),
            promotions: SEED_PROMOTION_NAMES.len(),
        })
    }

    /// Check that every seeded row is present.
    pub async fn verify(pool: &DbPool) -> Result<bool, RepositoryError> {
        let users = count(pool, "SELECT COUNT(*) AS count FROM user").await?;
        let goods = count(pool, "SELECT COUNT(*) AS count FROM good").await?;
        let promotions = count(pool, "SELECT COUNT(*) AS count FROM promotion").await?;

        Ok(users >= SEED_USER_PHONES.len() as i64
            && goods >= SEED_GOOD_IDS.len() as i64
            && promotions >= SEED_PROMOTION_NAMES.len() as i64)
    }
}

async fn count(pool: &DbPool, sql: &str) -> Result<i64, RepositoryError> {
    Ok(sqlx::query(sql).fetch_one(pool).await?.get::<i64, _>("count"))
}
