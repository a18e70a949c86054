use rust_decimal::Decimal;

use crate::domain::cart::Cart;
use crate::promo::resolver::{resolve_policy, ResolvedPolicy};
use crate::promo::strategy::Strategy;
use crate::promo::Promotion;

/// Amounts produced by one recalculation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecalcOutcome {
    pub original_total: Decimal,
    pub final_amount: Decimal,
    pub discount_amount: Decimal,
}

/// Recompute a cart's totals.
///
/// With an explicit resolved policy the policy decides the new total: a
/// per-line strategy reprices every line, a whole-cart rule reprices the
/// overall total. Without one, each line independently shops the promotion
/// store for the most favorable applicable per-line strategy (minimum
/// resulting subtotal wins). Either way the cart ends with
/// `total_amount = Σ unit_price × quantity`, a non-negative `final_amount`,
/// and `discount_amount = total - final`, never negative.
pub fn recalculate(
    cart: &mut Cart,
    policy: Option<&ResolvedPolicy>,
    promotions: &[Promotion],
) -> RecalcOutcome {
    cart.reset_totals();
    let original_total = cart.total_amount;

    let new_total = match policy {
        Some(ResolvedPolicy::PerLine(strategy)) => {
            let mut total = Decimal::ZERO;
            for item in &mut cart.items {
                item.subtotal = strategy.apply(item.unit_price, item.quantity).max(Decimal::ZERO);
                total += item.subtotal;
            }
            total
        }
        Some(ResolvedPolicy::WholeCart(rule)) => {
            rule.apply(original_total, cart.total_quantity())
        }
        None => {
            let mut total = Decimal::ZERO;
            for item in &mut cart.items {
                item.subtotal = best_line_subtotal(item.good_id, item.unit_price, item.quantity, promotions);
                total += item.subtotal;
            }
            total
        }
    };

    if let Some(policy) = policy {
        if cart.discount_policy.is_empty() {
            cart.discount_policy = policy.display_name();
        }
    }

    cart.set_final_amount(new_total);
    RecalcOutcome {
        original_total,
        final_amount: cart.final_amount,
        discount_amount: cart.discount_amount,
    }
}

/// Most favorable subtotal for one line across every applicable store
/// promotion. Rows that fail to resolve, resolve to whole-cart rules, or do
/// not cover this good simply do not compete; with no applicable strategy
/// the line keeps its undiscounted amount.
fn best_line_subtotal(
    good_id: i64,
    unit_price: Decimal,
    quantity: u32,
    promotions: &[Promotion],
) -> Decimal {
    let undiscounted = unit_price * Decimal::from(quantity);
    promotions
        .iter()
        .filter(|promotion| promotion.active && promotion.scope.applies_to(good_id))
        .filter_map(|promotion| match resolve_policy(&promotion.policy) {
            Some(ResolvedPolicy::PerLine(strategy)) => {
                Some(apply_line_strategy(&strategy, unit_price, quantity))
            }
            _ => None,
        })
        .fold(undiscounted, Decimal::min)
}

fn apply_line_strategy(strategy: &Strategy, unit_price: Decimal, quantity: u32) -> Decimal {
    strategy.apply(unit_price, quantity).max(Decimal::ZERO)
}
