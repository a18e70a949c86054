use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type GoodId = i64;

/// Catalog entry. `stock` is the only field settlement mutates; it is clamped
/// at zero on decrement and restore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Good {
    pub id: GoodId,
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    pub category: String,
}

impl Good {
    pub fn decremented(&self, quantity: u32) -> u32 {
        self.stock.saturating_sub(quantity)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::Good;

    #[test]
    fn stock_decrement_clamps_at_zero() {
        let good = Good {
            id: 1,
            name: "Kettle".to_string(),
            price: Decimal::new(1999, 2),
            stock: 3,
            category: "kitchen".to_string(),
        };

        assert_eq!(good.decremented(2), 1);
        assert_eq!(good.decremented(5), 0);
    }
}
