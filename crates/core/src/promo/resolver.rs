use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::DomainError;
use crate::promo::strategy::{CartRule, Strategy, Tier};

/// A policy payload resolved into something evaluable: either a per-line
/// strategy or a whole-cart rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedPolicy {
    PerLine(Strategy),
    WholeCart(CartRule),
}

impl ResolvedPolicy {
    /// Display name recorded on carts and orders. Never used for
    /// re-evaluation; only discount, full-reduction and tiered policies get
    /// a name, everything else stays blank.
    pub fn display_name(&self) -> String {
        match self {
            Self::PerLine(Strategy::Discount(factor)) => {
                format!("{}%off", (*factor * Decimal::ONE_HUNDRED).normalize())
            }
            Self::WholeCart(CartRule::FullReduction { threshold, reduce }) => {
                format!("满{}减{}", threshold.normalize(), reduce.normalize())
            }
            Self::WholeCart(CartRule::Tiered(_)) => "tiered".to_string(),
            _ => String::new(),
        }
    }
}

/// Strict construction: dispatches on the `type` tag and validates
/// parameters. Unknown tags fail with [`DomainError::UnknownStrategy`];
/// callers that cannot recover fall back to undiscounted pricing.
pub fn build_policy(payload: &Value) -> Result<ResolvedPolicy, DomainError> {
    let object = payload
        .as_object()
        .ok_or_else(|| DomainError::InvariantViolation("policy payload is not an object".into()))?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::InvariantViolation("policy payload has no `type`".into()))?;

    match kind {
        "discount" => {
            let factor = decimal_field(payload, &["factor", "discount"])?;
            if factor <= Decimal::ZERO || factor > Decimal::ONE {
                return Err(DomainError::InvariantViolation(format!(
                    "discount factor {factor} outside (0, 1]"
                )));
            }
            Ok(ResolvedPolicy::PerLine(Strategy::Discount(factor)))
        }
        "step_discount" => Ok(ResolvedPolicy::PerLine(Strategy::StepDiscount)),
        "reduction" => {
            let amount = decimal_field(payload, &["amount", "value"])?;
            if amount < Decimal::ZERO {
                return Err(DomainError::InvariantViolation("reduction amount is negative".into()));
            }
            Ok(ResolvedPolicy::PerLine(Strategy::PriceReduction(amount)))
        }
        "coupon" => {
            let value = decimal_field(payload, &["value", "amount"])?;
            let base_payload = object
                .get("base")
                .or_else(|| object.get("policy"))
                .ok_or_else(|| {
                    DomainError::InvariantViolation("coupon payload has no `base`".into())
                })?;
            match build_policy(base_payload)? {
                ResolvedPolicy::PerLine(base) => Ok(ResolvedPolicy::PerLine(Strategy::Coupon {
                    base: Box::new(base),
                    value,
                })),
                ResolvedPolicy::WholeCart(_) => Err(DomainError::InvariantViolation(
                    "coupon cannot wrap a whole-cart rule".into(),
                )),
            }
        }
        "tiered" => {
            let raw_tiers = object
                .get("tiers")
                .and_then(Value::as_array)
                .ok_or_else(|| DomainError::InvariantViolation("tiered payload has no `tiers`".into()))?;
            let mut tiers = Vec::with_capacity(raw_tiers.len());
            for raw in raw_tiers {
                let min_qty = raw
                    .get("min_qty")
                    .or_else(|| raw.get("minQty"))
                    .and_then(Value::as_u64)
                    .ok_or_else(|| {
                        DomainError::InvariantViolation("tier has no `min_qty`".into())
                    })?;
                let factor = decimal_field(raw, &["factor", "discount"])?;
                tiers.push(Tier { min_qty: min_qty as u32, factor });
            }
            if tiers.is_empty() {
                return Err(DomainError::InvariantViolation("tiered payload is empty".into()));
            }
            Ok(ResolvedPolicy::WholeCart(CartRule::Tiered(tiers)))
        }
        "full_reduction" => {
            let threshold = decimal_field(payload, &["threshold", "full"])?;
            let reduce = decimal_field(payload, &["reduce", "minus"])?;
            Ok(ResolvedPolicy::WholeCart(CartRule::FullReduction { threshold, reduce }))
        }
        other => Err(DomainError::UnknownStrategy(other.to_string())),
    }
}

/// Lenient resolution for client-declared payloads: absent, empty or
/// malformed input resolves to `None` and never reaches the caller as an
/// error. Settlement and recalculation then fall back to the promotion
/// store or to undiscounted pricing.
pub fn resolve_policy(payload: &Value) -> Option<ResolvedPolicy> {
    match payload {
        Value::Null => None,
        Value::Object(object) if object.is_empty() => None,
        other => build_policy(other).ok(),
    }
}

fn decimal_field(payload: &Value, names: &[&str]) -> Result<Decimal, DomainError> {
    for name in names {
        let Some(raw) = payload.get(name) else { continue };
        let parsed = match raw {
            Value::Number(number) => number.to_string().parse::<Decimal>().ok(),
            Value::String(text) => text.trim().parse::<Decimal>().ok(),
            _ => None,
        };
        return parsed.ok_or_else(|| {
            DomainError::InvariantViolation(format!("field `{name}` is not a decimal"))
        });
    }
    Err(DomainError::InvariantViolation(format!("missing decimal field `{}`", names[0])))
}
