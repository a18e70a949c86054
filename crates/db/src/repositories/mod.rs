use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use shoply_core::domain::cart::{Cart, CartId};
use shoply_core::domain::good::{Good, GoodId};
use shoply_core::domain::order::{Order, OrderId, OrderStatus};
use shoply_core::domain::user::User;
use shoply_core::promo::Promotion;

pub mod cart;
pub mod good;
pub mod memory;
pub mod order;
pub mod promotion;
pub mod user;

pub use cart::SqlCartRepository;
pub use good::SqlGoodRepository;
pub use memory::{
    InMemoryCartRepository, InMemoryGoodRepository, InMemoryOrderRepository,
    InMemoryPromotionRepository, InMemoryUserRepository,
};
pub use order::SqlOrderRepository;
pub use promotion::SqlPromotionRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for shoply_core::ApplicationError {
    fn from(error: RepositoryError) -> Self {
        shoply_core::ApplicationError::Persistence(error.to_string())
    }
}

/// Result of a conditional stock decrement. `Applied` means the update went
/// through atomically; `Insufficient` means the row was left untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StockDecrement {
    Applied { remaining: u32 },
    Insufficient { available: u32 },
    NotFound,
}

#[async_trait]
pub trait GoodRepository: Send + Sync {
    async fn find_by_id(&self, id: GoodId) -> Result<Option<Good>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Good>, RepositoryError>;
    async fn save(&self, good: Good) -> Result<(), RepositoryError>;
    /// Compare-and-swap decrement: only succeeds when `stock >= quantity`,
    /// so two racing settlements can never both drain the same units.
    async fn decrement_stock(
        &self,
        id: GoodId,
        quantity: u32,
    ) -> Result<StockDecrement, RepositoryError>;
    /// Best-effort restock used by order returns. Returns false when the
    /// good no longer exists.
    async fn restore_stock(&self, id: GoodId, quantity: u32) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepositoryError>;
    async fn save(&self, user: User) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, RepositoryError>;
    /// Latest unconverted cart for the phone; newest `created_at` wins.
    async fn find_active_by_user(&self, phone: &str) -> Result<Option<Cart>, RepositoryError>;
    async fn save(&self, cart: Cart) -> Result<(), RepositoryError>;
    async fn mark_converted(&self, id: &CartId) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &CartId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
    async fn list_by_user(&self, phone: &str) -> Result<Vec<Order>, RepositoryError>;
    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError>;
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError>;
    async fn save(&self, order: Order) -> Result<(), RepositoryError>;
    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError>;
    async fn delete(&self, id: &OrderId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Promotion>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Promotion>, RepositoryError>;
    async fn list_active(&self) -> Result<Vec<Promotion>, RepositoryError>;
    /// Active promotions whose scope covers the good: global rows plus rows
    /// whose allow-list names it.
    async fn list_for_good(&self, id: GoodId) -> Result<Vec<Promotion>, RepositoryError>;
    async fn save(&self, promotion: Promotion) -> Result<(), RepositoryError>;
    async fn update(&self, name: &str, promotion: Promotion) -> Result<bool, RepositoryError>;
    async fn delete(&self, name: &str) -> Result<bool, RepositoryError>;
}

pub(crate) fn decode_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    raw.trim().parse::<Decimal>().map_err(|_| {
        RepositoryError::Decode(format!("column `{column}` holds invalid decimal `{raw}`"))
    })
}

pub(crate) fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw).map(|value| value.with_timezone(&Utc)).map_err(|_| {
        RepositoryError::Decode(format!("column `{column}` holds invalid timestamp `{raw}`"))
    })
}

pub(crate) fn decode_quantity(column: &str, raw: i64) -> Result<u32, RepositoryError> {
    u32::try_from(raw).map_err(|_| {
        RepositoryError::Decode(format!("column `{column}` holds negative quantity {raw}"))
    })
}

pub(crate) fn decode_status(raw: i64) -> Result<OrderStatus, RepositoryError> {
    OrderStatus::from_code(raw).map_err(|error| RepositoryError::Decode(error.to_string()))
}
