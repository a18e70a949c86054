pub mod recalc;
pub mod resolver;
pub mod strategy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::good::GoodId;

/// Applicability predicate for a promotion row: every good, or an explicit
/// allow-list of good ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScopeRepr", into = "ScopeRepr")]
pub enum Scope {
    Global,
    Goods(Vec<GoodId>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScopeRepr {
    Tag(String),
    Ids(Vec<GoodId>),
}

impl TryFrom<ScopeRepr> for Scope {
    type Error = String;

    fn try_from(repr: ScopeRepr) -> Result<Self, Self::Error> {
        match repr {
            ScopeRepr::Tag(tag) if tag == "global" => Ok(Self::Global),
            ScopeRepr::Tag(other) => Err(format!("unsupported scope tag `{other}`")),
            ScopeRepr::Ids(ids) => Ok(Self::Goods(ids)),
        }
    }
}

impl From<Scope> for ScopeRepr {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Global => Self::Tag("global".to_string()),
            Scope::Goods(ids) => Self::Ids(ids),
        }
    }
}

impl Scope {
    pub fn applies_to(&self, good_id: GoodId) -> bool {
        match self {
            Self::Global => true,
            Self::Goods(ids) => ids.contains(&good_id),
        }
    }
}

/// Promotion store row. The policy payload is kept raw; it is resolved into
/// an evaluator on demand so malformed rows degrade to no-discount instead of
/// poisoning the store. Rows are owned by the store; carts and orders only
/// ever keep the resolved display name or the resulting amounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub name: String,
    pub policy: serde_json::Value,
    pub scope: Scope,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Promotion {
    pub fn new(name: impl Into<String>, policy: serde_json::Value, scope: Scope) -> Self {
        Self { name: name.into(), policy, scope, active: true, created_at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Scope;

    #[test]
    fn global_scope_round_trips_as_tag() {
        let encoded = serde_json::to_value(Scope::Global).expect("serialize scope");
        assert_eq!(encoded, json!("global"));
        let decoded: Scope = serde_json::from_value(encoded).expect("deserialize scope");
        assert_eq!(decoded, Scope::Global);
    }

    #[test]
    fn product_scope_round_trips_as_id_list() {
        let scope = Scope::Goods(vec![3, 7]);
        let encoded = serde_json::to_value(scope.clone()).expect("serialize scope");
        assert_eq!(encoded, json!([3, 7]));
        let decoded: Scope = serde_json::from_value(encoded).expect("deserialize scope");
        assert_eq!(decoded, scope);
    }

    #[test]
    fn unknown_scope_tag_is_rejected() {
        let result = serde_json::from_value::<Scope>(json!("regional"));
        assert!(result.is_err());
    }

    #[test]
    fn scope_applicability() {
        assert!(Scope::Global.applies_to(42));
        assert!(Scope::Goods(vec![1, 2]).applies_to(2));
        assert!(!Scope::Goods(vec![1, 2]).applies_to(3));
    }
}
