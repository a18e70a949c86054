use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::cart::{Cart, CartItem};
use crate::domain::good::GoodId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

/// Closed lifecycle enum mapped onto the legacy integer codes stored in the
/// database (0, 1, 3, 4). Code 2 was never assigned by the legacy schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Active,
    Settled,
    Returned,
    Repair,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown order status code {0}")]
pub struct UnknownStatusCode(pub i64);

impl OrderStatus {
    pub fn from_code(code: i64) -> Result<Self, UnknownStatusCode> {
        match code {
            0 => Ok(Self::Active),
            1 => Ok(Self::Settled),
            3 => Ok(Self::Returned),
            4 => Ok(Self::Repair),
            other => Err(UnknownStatusCode(other)),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Active => 0,
            Self::Settled => 1,
            Self::Returned => 3,
            Self::Repair => 4,
        }
    }
}

/// Line snapshot captured at settlement time; price and name stay fixed even
/// if the catalog row changes later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub good_id: GoodId,
    pub good_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

impl From<CartItem> for OrderItem {
    fn from(item: CartItem) -> Self {
        Self {
            good_id: item.good_id,
            good_name: item.good_name,
            unit_price: item.unit_price,
            quantity: item.quantity,
            subtotal: item.subtotal,
        }
    }
}

/// Settled purchase record. Immutable post-creation apart from `status`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_phone: String,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub discount_policy: String,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Convert a priced cart into an order, snapshotting line items. The
    /// order id defaults to the cart id so the two stay correlated.
    pub fn from_cart(cart: Cart, status: OrderStatus) -> Self {
        Self {
            order_id: OrderId(cart.cart_id.0.clone()),
            user_phone: cart.user_phone,
            shipping_address: cart.shipping_address,
            status,
            discount_policy: cart.discount_policy,
            total_amount: cart.total_amount,
            discount_amount: cart.discount_amount,
            final_amount: cart.final_amount,
            items: cart.items.into_iter().map(OrderItem::from).collect(),
            created_at: Utc::now(),
        }
    }

    /// Post-settlement lifecycle guard. Returns and repairs only apply to a
    /// settled order; a repair may still end in a return.
    pub fn check_transition(&self, to: OrderStatus) -> Result<(), DomainError> {
        let allowed = matches!(
            (self.status, to),
            (OrderStatus::Settled, OrderStatus::Returned)
                | (OrderStatus::Settled, OrderStatus::Repair)
                | (OrderStatus::Repair, OrderStatus::Returned)
        );
        if allowed {
            Ok(())
        } else {
            Err(DomainError::InvalidOrderTransition { from: self.status, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::cart::{Cart, CartItem};

    use super::{OrderStatus, Order};

    #[test]
    fn legacy_codes_round_trip() {
        for code in [0, 1, 3, 4] {
            let status = OrderStatus::from_code(code).expect("known code");
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn undefined_codes_are_rejected() {
        let error = OrderStatus::from_code(2).expect_err("code 2 was never assigned");
        assert_eq!(error.0, 2);
        assert!(OrderStatus::from_code(7).is_err());
    }

    #[test]
    fn transitions_only_leave_the_settled_and_repair_states() {
        let cart = Cart::new("138", vec![CartItem::new(1, "Lamp", Decimal::from(10), 1)]);
        let mut order = Order::from_cart(cart, OrderStatus::Settled);

        assert!(order.check_transition(OrderStatus::Returned).is_ok());
        assert!(order.check_transition(OrderStatus::Repair).is_ok());

        order.status = OrderStatus::Repair;
        assert!(order.check_transition(OrderStatus::Returned).is_ok());

        order.status = OrderStatus::Returned;
        assert!(order.check_transition(OrderStatus::Repair).is_err());
        assert!(order.check_transition(OrderStatus::Returned).is_err());
    }

    #[test]
    fn from_cart_snapshots_items_and_amounts() {
        let mut cart = Cart::new(
            "13800000000",
            vec![CartItem::new(9, "Lamp", Decimal::new(4500, 2), 2)],
        );
        cart.set_final_amount(Decimal::new(8000, 2));
        let cart_id = cart.cart_id.0.clone();

        let order = Order::from_cart(cart, OrderStatus::Settled);

        assert_eq!(order.order_id.0, cart_id);
        assert_eq!(order.status, OrderStatus::Settled);
        assert_eq!(order.total_amount, Decimal::new(9000, 2));
        assert_eq!(order.final_amount, Decimal::new(8000, 2));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].good_name, "Lamp");
    }
}
