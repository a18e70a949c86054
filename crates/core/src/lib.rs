pub mod config;
pub mod domain;
pub mod errors;
pub mod promo;

pub use domain::cart::{Cart, CartId, CartItem};
pub use domain::good::{Good, GoodId};
pub use domain::order::{Order, OrderId, OrderItem, OrderStatus, UnknownStatusCode};
pub use domain::user::User;
pub use errors::{ApplicationError, DomainError};
pub use promo::recalc::{recalculate, RecalcOutcome};
pub use promo::resolver::{resolve_policy, ResolvedPolicy};
pub use promo::strategy::{CartRule, Strategy, Tier};
pub use promo::{Promotion, Scope};
