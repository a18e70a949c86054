//! Command routing. Every inbound request ends here and every outcome,
//! success or failure, leaves as a JSON body; nothing may escape to tear
//! down the connection loop.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use shoply_core::ApplicationError;
use shoply_db::repositories::{
    CartRepository, GoodRepository, OrderRepository, PromotionRepository, UserRepository,
};

use crate::carts::CartService;
use crate::promotions::PromotionAdmin;
use crate::protocol::{
    self, error_body, error_with, OrderActionRequest, ParseError, PromotionUpsertRequest, Request,
    SaveCartRequest, SettleOrderRequest,
};
use crate::settlement::SettlementService;

pub struct Dispatcher {
    users: Arc<dyn UserRepository>,
    goods: Arc<dyn GoodRepository>,
    orders: Arc<dyn OrderRepository>,
    settlement: SettlementService,
    carts: CartService,
    promotions: PromotionAdmin,
}

impl Dispatcher {
    pub fn new(
        users: Arc<dyn UserRepository>,
        goods: Arc<dyn GoodRepository>,
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        promotions: Arc<dyn PromotionRepository>,
        failed_order_log: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self {
            users,
            goods: goods.clone(),
            orders: orders.clone(),
            settlement: SettlementService::new(
                goods,
                orders,
                carts.clone(),
                promotions.clone(),
                failed_order_log,
            ),
            carts: CartService::new(carts, promotions.clone()),
            promotions: PromotionAdmin::new(promotions),
        }
    }

    /// Parse and route one raw request.
    pub async fn dispatch(&self, raw: &str) -> Value {
        match protocol::parse_request(raw) {
            Ok(request) => self.handle(request).await,
            Err(ParseError::Empty) => error_body("empty_request"),
            Err(ParseError::Incomplete | ParseError::BadPayload) => error_body("bad_payload"),
        }
    }

    pub async fn handle(&self, request: Request) -> Value {
        debug!(event_name = "dispatch.request", command = %request.command, "handling request");
        let payload = &request.payload;

        match request.command.as_str() {
            "LOGIN" => unwrap_or_envelope(self.login(payload).await),
            "GET_ALL_GOODS" => unwrap_or_envelope(self.all_goods().await),
            "GET_GOOD" => unwrap_or_envelope(self.one_good(payload).await),
            "SAVE_CART" | "SAVE_CART_WITH_POLICY" => match SaveCartRequest::from_payload(payload) {
                Ok(save) => self.carts.save_cart(save).await,
                Err(body) => body,
            },
            "GET_CART" => match protocol::token(payload, &["userPhone", "user_phone", "phone"]) {
                Some(phone) => self.carts.get_cart(&phone).await,
                None => error_body("missing_userPhone"),
            },
            "UPDATE_CART_FOR_PROMOTIONS" => {
                match protocol::token(payload, &["userPhone", "user_phone", "phone"]) {
                    Some(phone) => self.carts.update_for_promotions(&phone).await,
                    None => error_body("missing_userPhone"),
                }
            }
            "ADD_SETTLED_ORDER" => match SettleOrderRequest::from_payload(payload) {
                Ok(settle) => self.settlement.settle(settle).await,
                Err(body) => body,
            },
            "RETURN_SETTLED_ORDER" => match OrderActionRequest::from_payload(payload) {
                Ok(action) => self.settlement.return_order(action).await,
                Err(body) => body,
            },
            "REPAIR_SETTLED_ORDER" => match OrderActionRequest::from_payload(payload) {
                Ok(action) => self.settlement.repair_order(action).await,
                Err(body) => body,
            },
            "DELETE_SETTLED_ORDER" => match OrderActionRequest::from_payload(payload) {
                Ok(action) => self.settlement.delete_order(action).await,
                Err(body) => body,
            },
            "GET_ORDERS_BY_USER" => {
                match protocol::token(payload, &["userPhone", "user_phone", "phone"]) {
                    Some(phone) => unwrap_or_envelope(self.orders_by_user(&phone).await),
                    None => error_body("missing_userPhone"),
                }
            }
            "GET_ALL_PROMOTIONS" => self.promotions.list_all().await,
            "GET_PROMOTIONS_BY_PRODUCT_ID" => {
                match protocol::token(payload, &["productId", "product_id", "id"])
                    .and_then(|id| id.parse::<i64>().ok())
                {
                    Some(id) => self.promotions.list_for_good(id).await,
                    None => error_body("missing_productId"),
                }
            }
            "ADD_PROMOTION" => match PromotionUpsertRequest::from_payload(payload) {
                Ok(upsert) => self.promotions.add(upsert).await,
                Err(body) => body,
            },
            "UPDATE_PROMOTION" => match PromotionUpsertRequest::from_payload(payload) {
                Ok(upsert) => self.promotions.update(upsert).await,
                Err(body) => body,
            },
            "DELETE_PROMOTION" => match protocol::token(payload, &["name"]) {
                Some(name) => self.promotions.delete(&name).await,
                None => error_body("missing_name"),
            },
            other => {
                warn!(event_name = "dispatch.unknown_command", command = %other, "unknown command");
                error_with("unknown_command", &[("command", json!(other))])
            }
        }
    }

    async fn login(&self, payload: &Value) -> Result<Value, ApplicationError> {
        let phone = match protocol::string_field(payload, &["phone", "userPhone", "user_phone"]) {
            Some(phone) => phone,
            None => return Ok(error_body("missing_userPhone")),
        };
        let password = match protocol::string_field(payload, &["password"]) {
            Some(password) => password,
            None => return Ok(error_body("missing_password")),
        };

        Ok(match self.users.find_by_phone(&phone).await? {
            Some(user) if user.password_matches(&password) => {
                json!({ "result": "ok", "phone": user.phone, "name": user.name })
            }
            _ => error_body("invalid_credentials"),
        })
    }

    async fn all_goods(&self) -> Result<Value, ApplicationError> {
        let goods = self.goods.list_all().await?;
        Ok(serde_json::to_value(&goods).unwrap_or_else(|_| error_body("encode_failed")))
    }

    async fn one_good(&self, payload: &Value) -> Result<Value, ApplicationError> {
        let id = match protocol::token(payload, &["id", "goodId", "good_id", "productId"])
            .and_then(|id| id.parse::<i64>().ok())
        {
            Some(id) => id,
            None => return Ok(error_body("missing_id")),
        };

        Ok(match self.goods.find_by_id(id).await? {
            Some(good) => {
                serde_json::to_value(&good).unwrap_or_else(|_| error_body("encode_failed"))
            }
            None => error_with("good_not_found", &[("productId", json!(id))]),
        })
    }

    async fn orders_by_user(&self, phone: &str) -> Result<Value, ApplicationError> {
        let orders = self.orders.list_by_user(phone).await?;
        Ok(serde_json::to_value(&orders).unwrap_or_else(|_| error_body("encode_failed")))
    }
}

/// Boundary conversion for the read-side handlers: layered errors leave the
/// process only as JSON envelopes.
fn unwrap_or_envelope(result: Result<Value, ApplicationError>) -> Value {
    match result {
        Ok(body) => body,
        Err(ApplicationError::Domain(err)) => {
            error_with("domain_failure", &[("detail", json!(err.to_string()))])
        }
        Err(err @ ApplicationError::Persistence(_)) => {
            error_with("persistence_failure", &[("detail", json!(err.to_string()))])
        }
        Err(err @ ApplicationError::Configuration(_)) => {
            error_with("configuration_failure", &[("detail", json!(err.to_string()))])
        }
    }
}
