use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::good::GoodId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartId(pub String);

impl CartId {
    pub fn generate() -> Self {
        Self(format!("cart-{}", Uuid::new_v4()))
    }
}

/// One cart line. `subtotal` tracks `unit_price * quantity` until a
/// policy-aware recompute overrides it with a discounted figure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub good_id: GoodId,
    pub good_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

impl CartItem {
    pub fn new(good_id: GoodId, good_name: impl Into<String>, unit_price: Decimal, quantity: u32) -> Self {
        Self {
            good_id,
            good_name: good_name.into(),
            unit_price,
            quantity,
            subtotal: unit_price * Decimal::from(quantity),
        }
    }

    pub fn undiscounted_subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Mutable pre-order basket, one active cart per user phone. Becomes
/// immutable once converted into an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub cart_id: CartId,
    pub user_phone: String,
    pub shipping_address: String,
    pub discount_policy: String,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub items: Vec<CartItem>,
    pub is_converted: bool,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_phone: impl Into<String>, items: Vec<CartItem>) -> Self {
        let mut cart = Self {
            cart_id: CartId::generate(),
            user_phone: user_phone.into(),
            shipping_address: String::new(),
            discount_policy: String::new(),
            total_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            final_amount: Decimal::ZERO,
            items,
            is_converted: false,
            created_at: Utc::now(),
        };
        cart.reset_totals();
        cart
    }

    /// Sum of undiscounted line amounts, ignoring any subtotal overrides.
    pub fn original_total(&self) -> Decimal {
        self.items.iter().map(CartItem::undiscounted_subtotal).sum()
    }

    /// Total requested quantity across all lines; tiered rules key off this.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Restore the undiscounted state: subtotals, totals, no discount.
    pub fn reset_totals(&mut self) {
        for item in &mut self.items {
            item.subtotal = item.undiscounted_subtotal();
        }
        self.total_amount = self.original_total();
        self.discount_amount = Decimal::ZERO;
        self.final_amount = self.total_amount;
    }

    /// Record a recomputed payable amount, keeping the invariant
    /// `final = total - discount` with `discount >= 0`.
    pub fn set_final_amount(&mut self, final_amount: Decimal) {
        self.total_amount = self.original_total();
        self.final_amount = final_amount.max(Decimal::ZERO);
        self.discount_amount = (self.total_amount - self.final_amount).max(Decimal::ZERO);
    }
}
