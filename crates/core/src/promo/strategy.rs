use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-line pricing strategy: maps `(unit_price, quantity)` to a discounted
/// line subtotal. Strategies are immutable values; coupons compose by owning
/// their base strategy outright.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Multiply every unit by a factor in `(0, 1]`.
    Discount(Decimal),
    /// Fixed per-position table: 1st unit full price, 2nd at 90%, 3rd at
    /// 80%, 4th and later at full price again.
    StepDiscount,
    /// Knock a flat amount off each unit, floored at zero.
    PriceReduction(Decimal),
    /// Flat deduction applied after the wrapped strategy, floored at zero.
    /// May wrap any strategy, including another coupon.
    Coupon { base: Box<Strategy>, value: Decimal },
}

impl Strategy {
    pub fn apply(&self, unit_price: Decimal, quantity: u32) -> Decimal {
        match self {
            Self::Discount(factor) => unit_price * *factor * Decimal::from(quantity),
            Self::StepDiscount => {
                let mut total = Decimal::ZERO;
                for position in 1..=quantity {
                    total += match position {
                        2 => unit_price * Decimal::new(9, 1),
                        3 => unit_price * Decimal::new(8, 1),
                        _ => unit_price,
                    };
                }
                total
            }
            Self::PriceReduction(amount) => {
                ((unit_price - *amount) * Decimal::from(quantity)).max(Decimal::ZERO)
            }
            Self::Coupon { base, value } => {
                (base.apply(unit_price, quantity) - *value).max(Decimal::ZERO)
            }
        }
    }

    /// Human-readable label, display only.
    pub fn label(&self) -> String {
        match self {
            Self::Discount(factor) => {
                format!("{}%off", (*factor * Decimal::ONE_HUNDRED).normalize())
            }
            Self::StepDiscount => "step".to_string(),
            Self::PriceReduction(amount) => format!("reduce {}", amount.normalize()),
            Self::Coupon { base, value } => {
                format!("{} coupon-{}", base.label(), value.normalize())
            }
        }
    }
}

/// Quantity threshold for a tiered rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub min_qty: u32,
    pub factor: Decimal,
}

/// Whole-cart pricing rule, evaluated against the cart total rather than
/// individual lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartRule {
    /// Discount factor chosen by total requested quantity across all lines;
    /// the highest qualifying threshold wins.
    Tiered(Vec<Tier>),
    /// Subtract a flat amount once the cart total reaches the threshold.
    FullReduction { threshold: Decimal, reduce: Decimal },
}

impl CartRule {
    pub fn apply(&self, cart_total: Decimal, total_quantity: u32) -> Decimal {
        match self {
            Self::Tiered(tiers) => {
                let mut sorted = tiers.clone();
                sorted.sort_by_key(|tier| tier.min_qty);
                let factor = sorted
                    .iter()
                    .rev()
                    .find(|tier| tier.min_qty <= total_quantity)
                    .map(|tier| tier.factor);
                match factor {
                    Some(factor) => (cart_total * factor).max(Decimal::ZERO),
                    None => cart_total,
                }
            }
            Self::FullReduction { threshold, reduce } => {
                if cart_total >= *threshold {
                    (cart_total - *reduce).max(Decimal::ZERO)
                } else {
                    cart_total
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{CartRule, Strategy, Tier};

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    #[test]
    fn discount_scales_price_by_factor() {
        let strategy = Strategy::Discount(dec(8, 1));
        assert_eq!(strategy.apply(dec(100, 0), 3), dec(240, 0));
    }

    #[test]
    fn step_discount_charges_100_90_80_then_full() {
        let strategy = Strategy::StepDiscount;
        // 10 + 9 + 8
        assert_eq!(strategy.apply(dec(10, 0), 3), dec(27, 0));
        // Position 4 is charged full price, not free.
        assert_eq!(strategy.apply(dec(10, 0), 4), dec(37, 0));
        assert_eq!(strategy.apply(dec(10, 0), 1), dec(10, 0));
        assert_eq!(strategy.apply(dec(10, 0), 0), Decimal::ZERO);
    }

    #[test]
    fn price_reduction_floors_at_zero() {
        assert_eq!(Strategy::PriceReduction(dec(5, 0)).apply(dec(10, 0), 4), dec(20, 0));
        assert_eq!(Strategy::PriceReduction(dec(20, 0)).apply(dec(10, 0), 4), Decimal::ZERO);
    }

    #[test]
    fn coupon_deducts_after_base_strategy() {
        let strategy = Strategy::Coupon {
            base: Box::new(Strategy::Discount(dec(9, 1))),
            value: dec(5, 0),
        };
        assert_eq!(strategy.apply(dec(100, 0), 1), dec(85, 0));
    }

    #[test]
    fn coupon_composes_with_another_coupon() {
        let inner = Strategy::Coupon {
            base: Box::new(Strategy::Discount(dec(9, 1))),
            value: dec(5, 0),
        };
        let outer = Strategy::Coupon { base: Box::new(inner), value: dec(100, 0) };
        assert_eq!(outer.apply(dec(100, 0), 1), Decimal::ZERO);
    }

    #[test]
    fn tiered_rule_picks_highest_qualifying_threshold() {
        let rule = CartRule::Tiered(vec![
            Tier { min_qty: 10, factor: dec(8, 1) },
            Tier { min_qty: 3, factor: dec(95, 2) },
            Tier { min_qty: 5, factor: dec(9, 1) },
        ]);

        assert_eq!(rule.apply(dec(100, 0), 2), dec(100, 0));
        assert_eq!(rule.apply(dec(100, 0), 4), dec(95, 0));
        assert_eq!(rule.apply(dec(100, 0), 7), dec(90, 0));
        assert_eq!(rule.apply(dec(100, 0), 12), dec(80, 0));
    }

    #[test]
    fn full_reduction_only_fires_at_threshold() {
        let rule = CartRule::FullReduction { threshold: dec(200, 0), reduce: dec(30, 0) };
        assert_eq!(rule.apply(dec(199, 0), 1), dec(199, 0));
        assert_eq!(rule.apply(dec(200, 0), 1), dec(170, 0));
        assert_eq!(rule.apply(dec(20, 0), 1), dec(20, 0));
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(Strategy::Discount(dec(9, 1)).label(), "90%off");
        assert_eq!(Strategy::StepDiscount.label(), "step");
        assert_eq!(Strategy::PriceReduction(dec(5, 0)).label(), "reduce 5");
    }
}
