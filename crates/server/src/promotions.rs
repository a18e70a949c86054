//! Promotion store administration. Rows are stored with their raw policy
//! payload; resolution happens at pricing time, so a row with a policy the
//! engine cannot evaluate is tolerated here and simply never discounts.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use shoply_core::domain::good::GoodId;
use shoply_core::promo::Promotion;
use shoply_db::repositories::PromotionRepository;

use crate::protocol::{error_body, error_with, PromotionUpsertRequest};
use crate::settlement::persistence_error;

pub struct PromotionAdmin {
    promotions: Arc<dyn PromotionRepository>,
}

impl PromotionAdmin {
    pub fn new(promotions: Arc<dyn PromotionRepository>) -> Self {
        Self { promotions }
    }

    pub async fn list_all(&self) -> Value {
        match self.promotions.list_all().await {
            Ok(rows) => serde_json::to_value(&rows).unwrap_or_else(|_| error_body("encode_failed")),
            Err(err) => persistence_error(err),
        }
    }

    pub async fn list_for_good(&self, good_id: GoodId) -> Value {
        match self.promotions.list_for_good(good_id).await {
            Ok(rows) => serde_json::to_value(&rows).unwrap_or_else(|_| error_body("encode_failed")),
            Err(err) => persistence_error(err),
        }
    }

    pub async fn add(&self, request: PromotionUpsertRequest) -> Value {
        match self.promotions.find_by_name(&request.name).await {
            Ok(Some(_)) => {
                return error_with("duplicate_name", &[("name", json!(request.name))]);
            }
            Ok(None) => {}
            Err(err) => return persistence_error(err),
        }

        let mut promotion = Promotion::new(request.name.clone(), request.policy, request.scope);
        if let Some(active) = request.active {
            promotion.active = active;
        }

        match self.promotions.save(promotion).await {
            Ok(()) => {
                info!(event_name = "promotion.added", name = %request.name, "promotion added");
                json!({ "result": "added", "name": request.name })
            }
            Err(err) => persistence_error(err),
        }
    }

    /// Update a row in place, optionally renaming it via `new_name`.
    /// `created_at` and, unless overridden, the active flag survive.
    pub async fn update(&self, request: PromotionUpsertRequest) -> Value {
        let existing = match self.promotions.find_by_name(&request.name).await {
            Ok(Some(existing)) => existing,
            Ok(None) => {
                return error_with("promotion_not_found", &[("name", json!(request.name))]);
            }
            Err(err) => return persistence_error(err),
        };

        let mut updated = existing;
        if let Some(new_name) = &request.new_name {
            updated.name = new_name.clone();
        }
        updated.policy = request.policy;
        updated.scope = request.scope;
        if let Some(active) = request.active {
            updated.active = active;
        }
        let final_name = updated.name.clone();

        match self.promotions.update(&request.name, updated).await {
            Ok(true) => json!({ "result": "updated", "name": final_name }),
            Ok(false) => error_with("promotion_not_found", &[("name", json!(request.name))]),
            Err(err) => persistence_error(err),
        }
    }

    pub async fn delete(&self, name: &str) -> Value {
        match self.promotions.delete(name).await {
            Ok(true) => {
                info!(event_name = "promotion.deleted", name, "promotion deleted");
                json!({ "result": "deleted", "name": name })
            }
            Ok(false) => error_with("promotion_not_found", &[("name", json!(name))]),
            Err(err) => persistence_error(err),
        }
    }
}
