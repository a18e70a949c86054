//! Wire-boundary normalization.
//!
//! Requests arrive as `<COMMAND> <payload>` where the payload is a bare
//! token or a JSON object. Clients disagree on field spelling (camelCase vs
//! snake_case) and on where the pricing policy lives (`policy`,
//! `policy_detail`, `policy_str`), so everything is normalized here into
//! canonical request structs before any service sees it. Precedence is
//! first-non-empty in the documented order.

use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use shoply_core::domain::cart::CartItem;
use shoply_core::promo::Scope;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub command: String,
    pub payload: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace arrived.
    Empty,
    /// The JSON payload is truncated; the caller should keep reading.
    Incomplete,
    /// The payload is present but not valid JSON.
    BadPayload,
}

/// Split a raw request into command and payload. A payload opening with
/// `{` or `[` must parse as JSON; anything else is kept as a bare token.
pub fn parse_request(raw: &str) -> Result<Request, ParseError> {
    let raw = raw.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }

    let (command, rest) = match raw.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim_start()),
        None => (raw, ""),
    };

    let payload = if rest.is_empty() {
        Value::Null
    } else if rest.starts_with('{') || rest.starts_with('[') {
        match serde_json::from_str(rest) {
            Ok(value) => value,
            Err(error) if error.is_eof() => return Err(ParseError::Incomplete),
            Err(_) => return Err(ParseError::BadPayload),
        }
    } else {
        Value::String(rest.to_string())
    };

    Ok(Request { command: command.to_string(), payload })
}

pub fn error_body(code: &str) -> Value {
    json!({ "error": code })
}

pub fn error_with(code: &str, context: &[(&str, Value)]) -> Value {
    let mut object = Map::new();
    object.insert("error".to_string(), Value::String(code.to_string()));
    for (key, value) in context {
        object.insert((*key).to_string(), value.clone());
    }
    Value::Object(object)
}

/// First non-empty string among the aliases. Bare numbers are accepted for
/// fields like phone that some clients send unquoted.
pub fn string_field(payload: &Value, names: &[&str]) -> Option<String> {
    for name in names {
        match payload.get(name) {
            Some(Value::String(text)) if !text.trim().is_empty() => {
                return Some(text.trim().to_string());
            }
            Some(Value::Number(number)) => return Some(number.to_string()),
            _ => {}
        }
    }
    None
}

pub fn decimal_field(payload: &Value, names: &[&str]) -> Option<Decimal> {
    for name in names {
        match payload.get(name) {
            Some(Value::Number(number)) => {
                if let Ok(value) = number.to_string().parse::<Decimal>() {
                    return Some(value);
                }
            }
            Some(Value::String(text)) => {
                if let Ok(value) = text.trim().parse::<Decimal>() {
                    return Some(value);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn i64_field(payload: &Value, names: &[&str]) -> Option<i64> {
    for name in names {
        match payload.get(name) {
            Some(Value::Number(number)) => {
                if let Some(value) = number.as_i64() {
                    return Some(value);
                }
            }
            Some(Value::String(text)) => {
                if let Ok(value) = text.trim().parse::<i64>() {
                    return Some(value);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn u32_field(payload: &Value, names: &[&str]) -> Option<u32> {
    i64_field(payload, names).and_then(|value| u32::try_from(value).ok())
}

/// First alias holding a usable policy payload: objects and arrays are taken
/// as-is, non-empty strings are parsed as embedded JSON text.
pub fn json_field(payload: &Value, names: &[&str]) -> Option<Value> {
    for name in names {
        match payload.get(name) {
            Some(value @ (Value::Object(_) | Value::Array(_))) => return Some(value.clone()),
            Some(Value::String(text)) if !text.trim().is_empty() => {
                if let Ok(parsed) = serde_json::from_str::<Value>(text) {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

/// Bare-token payload, e.g. `GET_CART 13800000000`. Object payloads fall
/// back to the usual aliases so `{"userPhone": ...}` also works.
pub fn token(payload: &Value, names: &[&str]) -> Option<String> {
    match payload {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Object(_) => string_field(payload, names),
        _ => None,
    }
}

const POLICY_ALIASES: &[&str] = &["policy", "policy_detail", "policy_str"];

fn line_item(value: &Value) -> Option<CartItem> {
    let good_id = i64_field(value, &["productId", "product_id", "goodId", "good_id", "id"])?;
    let good_name = string_field(value, &["productName", "product_name", "goodName", "good_name", "name"])
        .unwrap_or_default();
    let unit_price = decimal_field(value, &["price", "unitPrice", "unit_price"])?;
    let quantity = u32_field(value, &["quantity", "qty", "count"])?;
    Some(CartItem::new(good_id, good_name, unit_price, quantity))
}

/// Parse the `items` array into cart lines. Subtotals sent by the client are
/// ignored; they are recomputed server-side.
pub fn parse_items(payload: &Value) -> Result<Vec<CartItem>, Value> {
    let raw = match payload.get("items") {
        Some(Value::Array(entries)) if !entries.is_empty() => entries,
        _ => return Err(error_body("missing_items")),
    };

    let mut items = Vec::with_capacity(raw.len());
    for (index, entry) in raw.iter().enumerate() {
        match line_item(entry) {
            Some(item) => items.push(item),
            None => {
                return Err(error_with("invalid_item", &[("index", json!(index))]));
            }
        }
    }
    Ok(items)
}

/// Canonical `ADD_SETTLED_ORDER` request.
#[derive(Clone, Debug)]
pub struct SettleOrderRequest {
    pub order_id: Option<String>,
    pub user_phone: String,
    pub shipping_address: String,
    pub discount_policy: String,
    pub policy: Option<Value>,
    pub final_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub status: Option<i64>,
    pub items: Vec<CartItem>,
}

impl SettleOrderRequest {
    pub fn from_payload(payload: &Value) -> Result<Self, Value> {
        let user_phone = string_field(payload, &["userPhone", "user_phone", "phone"])
            .ok_or_else(|| error_body("missing_userPhone"))?;
        let items = parse_items(payload)?;

        Ok(Self {
            order_id: string_field(payload, &["orderId", "order_id"]),
            user_phone,
            shipping_address: string_field(payload, &["shippingAddress", "shipping_address"])
                .unwrap_or_default(),
            discount_policy: string_field(payload, &["discountPolicy", "discount_policy"])
                .unwrap_or_default(),
            policy: json_field(payload, POLICY_ALIASES),
            final_amount: decimal_field(payload, &["final_amount", "finalAmount"]),
            discount_amount: decimal_field(payload, &["discount_amount", "discountAmount"]),
            status: i64_field(payload, &["status"]),
            items,
        })
    }
}

/// Canonical `SAVE_CART` / `SAVE_CART_WITH_POLICY` request.
#[derive(Clone, Debug)]
pub struct SaveCartRequest {
    pub user_phone: String,
    pub shipping_address: String,
    pub discount_policy: String,
    pub policy: Option<Value>,
    pub items: Vec<CartItem>,
}

impl SaveCartRequest {
    pub fn from_payload(payload: &Value) -> Result<Self, Value> {
        let user_phone = string_field(payload, &["userPhone", "user_phone", "phone"])
            .ok_or_else(|| error_body("missing_userPhone"))?;
        let cart = match payload.get("cart") {
            Some(cart @ Value::Object(_)) => cart,
            _ => return Err(error_body("missing_cart")),
        };
        let items = parse_items(cart)?;

        Ok(Self {
            user_phone,
            shipping_address: string_field(cart, &["shippingAddress", "shipping_address"])
                .or_else(|| string_field(payload, &["shippingAddress", "shipping_address"]))
                .unwrap_or_default(),
            discount_policy: string_field(cart, &["discountPolicy", "discount_policy"])
                .or_else(|| string_field(payload, &["discountPolicy", "discount_policy"]))
                .unwrap_or_default(),
            policy: json_field(cart, POLICY_ALIASES)
                .or_else(|| json_field(payload, POLICY_ALIASES)),
            items,
        })
    }
}

/// Canonical request for the return / repair / delete order commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderActionRequest {
    pub order_id: String,
    pub user_phone: Option<String>,
}

impl OrderActionRequest {
    pub fn from_payload(payload: &Value) -> Result<Self, Value> {
        let order_id = string_field(payload, &["orderId", "order_id"])
            .or_else(|| token(payload, &[]))
            .ok_or_else(|| error_body("missing_orderId"))?;
        Ok(Self {
            order_id,
            user_phone: string_field(payload, &["userPhone", "user_phone", "phone"]),
        })
    }
}

/// Canonical `ADD_PROMOTION` / `UPDATE_PROMOTION` request.
#[derive(Clone, Debug)]
pub struct PromotionUpsertRequest {
    pub name: String,
    pub new_name: Option<String>,
    pub policy: Value,
    pub scope: Scope,
    pub active: Option<bool>,
}

impl PromotionUpsertRequest {
    pub fn from_payload(payload: &Value) -> Result<Self, Value> {
        let name = string_field(payload, &["name"]).ok_or_else(|| error_body("missing_name"))?;

        // Some admin clients inline the policy fields next to `name` instead
        // of nesting them; accept that shape by peeling the metadata off.
        let policy = match json_field(payload, POLICY_ALIASES) {
            Some(policy) => policy,
            None if payload.get("type").is_some() => {
                let mut object = payload.as_object().cloned().unwrap_or_default();
                object.remove("name");
                object.remove("new_name");
                object.remove("conditions");
                object.remove("active");
                Value::Object(object)
            }
            None => return Err(error_body("missing_policy")),
        };

        let scope = match payload.get("conditions") {
            None | Some(Value::Null) => Scope::Global,
            Some(value) => serde_json::from_value::<Scope>(value.clone())
                .map_err(|_| error_body("invalid_conditions"))?,
        };

        Ok(Self {
            name,
            new_name: string_field(payload, &["new_name", "newName"]),
            policy,
            scope,
            active: payload.get("active").and_then(Value::as_bool),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use shoply_core::promo::Scope;

    use super::{
        parse_request, ParseError, PromotionUpsertRequest, SaveCartRequest, SettleOrderRequest,
    };

    #[test]
    fn splits_command_and_json_payload() {
        let request = parse_request(r#"ADD_SETTLED_ORDER {"userPhone":"138"}"#).expect("parses");
        assert_eq!(request.command, "ADD_SETTLED_ORDER");
        assert_eq!(request.payload["userPhone"], "138");
    }

    #[test]
    fn bare_token_payload_survives() {
        let request = parse_request("GET_CART 13800000000").expect("parses");
        assert_eq!(request.payload, json!("13800000000"));
    }

    #[test]
    fn truncated_json_reports_incomplete() {
        assert_eq!(
            parse_request(r#"SAVE_CART {"userPhone":"138""#).unwrap_err(),
            ParseError::Incomplete
        );
        assert_eq!(parse_request("SAVE_CART {not json}").unwrap_err(), ParseError::BadPayload);
        assert_eq!(parse_request("   ").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn settle_request_accepts_both_spellings() {
        let payload = json!({
            "user_phone": "138",
            "items": [{"product_id": 7, "productName": "Kettle", "price": "19.90", "qty": 2}],
            "finalAmount": "30.00",
            "discount_amount": 9.8,
        });
        let request = SettleOrderRequest::from_payload(&payload).expect("normalizes");
        assert_eq!(request.user_phone, "138");
        assert_eq!(request.items[0].good_id, 7);
        assert_eq!(request.items[0].subtotal, Decimal::new(3980, 2));
        assert_eq!(request.final_amount, Some(Decimal::new(3000, 2)));
        assert_eq!(request.discount_amount, Some(Decimal::new(98, 1)));
    }

    #[test]
    fn settle_request_requires_phone_and_items() {
        let missing_phone = SettleOrderRequest::from_payload(&json!({"items": [{}]})).unwrap_err();
        assert_eq!(missing_phone["error"], "missing_userPhone");

        let missing_items =
            SettleOrderRequest::from_payload(&json!({"userPhone": "138"})).unwrap_err();
        assert_eq!(missing_items["error"], "missing_items");
    }

    #[test]
    fn policy_aliases_resolve_first_non_empty() {
        let payload = json!({
            "userPhone": "138",
            "items": [{"productId": 1, "price": 10, "quantity": 1}],
            "policy": "",
            "policy_detail": {"type": "discount", "factor": "0.9"},
        });
        let request = SettleOrderRequest::from_payload(&payload).expect("normalizes");
        assert_eq!(request.policy.expect("policy")["type"], "discount");

        let embedded = json!({
            "userPhone": "138",
            "items": [{"productId": 1, "price": 10, "quantity": 1}],
            "policy_str": "{\"type\":\"step_discount\"}",
        });
        let request = SettleOrderRequest::from_payload(&embedded).expect("normalizes");
        assert_eq!(request.policy.expect("policy")["type"], "step_discount");
    }

    #[test]
    fn save_cart_requires_nested_cart_object() {
        let missing = SaveCartRequest::from_payload(&json!({"userPhone": "138"})).unwrap_err();
        assert_eq!(missing["error"], "missing_cart");

        let payload = json!({
            "userPhone": "138",
            "cart": {
                "items": [{"productId": 3, "productName": "Mug", "price": "2.50", "quantity": 4}],
                "policy": {"type": "discount", "factor": 0.8},
            },
        });
        let request = SaveCartRequest::from_payload(&payload).expect("normalizes");
        assert_eq!(request.items.len(), 1);
        assert!(request.policy.is_some());
    }

    #[test]
    fn promotion_upsert_reads_conditions_as_scope() {
        let payload = json!({
            "name": "kettle-step",
            "policy": {"type": "step_discount"},
            "conditions": [1, 2],
        });
        let request = PromotionUpsertRequest::from_payload(&payload).expect("normalizes");
        assert_eq!(request.scope, Scope::Goods(vec![1, 2]));

        let inline = json!({"name": "store-90off", "type": "discount", "factor": 0.9});
        let request = PromotionUpsertRequest::from_payload(&inline).expect("normalizes");
        assert_eq!(request.policy["type"], "discount");
        assert_eq!(request.scope, Scope::Global);
    }
}
