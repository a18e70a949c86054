//! Cart commands: save a priced cart, re-price the active cart against the
//! promotion store, fetch the active cart.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use shoply_core::domain::cart::Cart;
use shoply_core::promo::recalc::recalculate;
use shoply_core::promo::resolver::resolve_policy;
use shoply_db::repositories::{CartRepository, PromotionRepository};

use crate::protocol::{error_body, SaveCartRequest};
use crate::settlement::persistence_error;

pub struct CartService {
    carts: Arc<dyn CartRepository>,
    promotions: Arc<dyn PromotionRepository>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartRepository>, promotions: Arc<dyn PromotionRepository>) -> Self {
        Self { carts, promotions }
    }

    /// Save a new cart for the user. An explicit policy is applied right
    /// away; without one the cart is stored undiscounted, and the store
    /// pass stays an explicit `UPDATE_CART_FOR_PROMOTIONS` call.
    pub async fn save_cart(&self, request: SaveCartRequest) -> Value {
        let mut cart = Cart::new(request.user_phone, request.items);
        cart.shipping_address = request.shipping_address;
        cart.discount_policy = request.discount_policy;

        // Malformed policies fall back to undiscounted pricing.
        match request.policy.as_ref().and_then(resolve_policy) {
            Some(policy) => {
                recalculate(&mut cart, Some(&policy), &[]);
            }
            None => cart.reset_totals(),
        }

        let cart_id = cart.cart_id.clone();
        match self.carts.save(cart).await {
            Ok(()) => {
                info!(event_name = "cart.saved", cart_id = %cart_id.0, "cart saved");
                json!({ "result": "saved", "cart_id": cart_id.0 })
            }
            Err(err) => persistence_error(err),
        }
    }

    /// Re-price the user's active cart against the promotion store, letting
    /// each line pick its most favorable applicable discount.
    pub async fn update_for_promotions(&self, user_phone: &str) -> Value {
        let mut cart = match self.carts.find_active_by_user(user_phone).await {
            Ok(Some(cart)) => cart,
            Ok(None) => return error_body("cart_not_found"),
            Err(err) => return persistence_error(err),
        };

        let promotions = match self.promotions.list_active().await {
            Ok(promotions) => promotions,
            Err(err) => return persistence_error(err),
        };

        let outcome = recalculate(&mut cart, None, &promotions);
        if let Err(err) = self.carts.save(cart).await {
            return persistence_error(err);
        }

        json!({
            "result": "updated",
            "original_total": outcome.original_total,
            "final_amount": outcome.final_amount,
            "discount_amount": outcome.discount_amount,
        })
    }

    pub async fn get_cart(&self, user_phone: &str) -> Value {
        match self.carts.find_active_by_user(user_phone).await {
            Ok(Some(cart)) => serde_json::to_value(&cart)
                .unwrap_or_else(|_| error_body("encode_failed")),
            Ok(None) => error_body("cart_not_found"),
            Err(err) => persistence_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use shoply_core::domain::cart::CartItem;
    use shoply_core::promo::{Promotion, Scope};
    use shoply_db::repositories::{
        CartRepository, InMemoryCartRepository, InMemoryPromotionRepository, PromotionRepository,
    };

    use crate::carts::CartService;
    use crate::protocol::SaveCartRequest;

    fn request(items: Vec<CartItem>, policy: Option<serde_json::Value>) -> SaveCartRequest {
        SaveCartRequest {
            user_phone: "13800000000".to_string(),
            shipping_address: String::new(),
            discount_policy: String::new(),
            policy,
            items,
        }
    }

    fn amount(value: &serde_json::Value) -> Decimal {
        value.as_str().expect("decimal string").parse().expect("decimal")
    }

    fn service() -> (CartService, Arc<InMemoryCartRepository>, Arc<InMemoryPromotionRepository>) {
        let carts = Arc::new(InMemoryCartRepository::default());
        let promotions = Arc::new(InMemoryPromotionRepository::default());
        (CartService::new(carts.clone(), promotions.clone()), carts, promotions)
    }

    #[tokio::test]
    async fn save_without_policy_keeps_undiscounted_totals() {
        let (service, carts, _) = service();

        let response = service
            .save_cart(request(vec![CartItem::new(1, "Mug", Decimal::new(250, 2), 4)], None))
            .await;

        assert_eq!(response["result"], "saved");
        let cart = carts
            .find_active_by_user("13800000000")
            .await
            .expect("load")
            .expect("saved cart");
        assert_eq!(cart.total_amount, Decimal::from(10));
        assert_eq!(cart.final_amount, Decimal::from(10));
        assert_eq!(cart.discount_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn save_with_policy_prices_the_cart() {
        let (service, carts, _) = service();

        let response = service
            .save_cart(request(
                vec![CartItem::new(1, "Desk", Decimal::from(100), 2)],
                Some(json!({"type": "discount", "factor": "0.9"})),
            ))
            .await;

        assert_eq!(response["result"], "saved");
        let cart = carts
            .find_active_by_user("13800000000")
            .await
            .expect("load")
            .expect("saved cart");
        assert_eq!(cart.final_amount, Decimal::from(180));
        assert_eq!(cart.discount_policy, "90%off");
    }

    #[tokio::test]
    async fn malformed_policy_degrades_to_no_discount() {
        let (service, carts, _) = service();

        let response = service
            .save_cart(request(
                vec![CartItem::new(1, "Desk", Decimal::from(100), 1)],
                Some(json!({"type": "time_travel_discount"})),
            ))
            .await;

        assert_eq!(response["result"], "saved");
        let cart = carts
            .find_active_by_user("13800000000")
            .await
            .expect("load")
            .expect("saved cart");
        assert_eq!(cart.final_amount, Decimal::from(100));
    }

    #[tokio::test]
    async fn update_for_promotions_picks_best_per_line() {
        let (service, _, promotions) = service();
        promotions
            .save(Promotion::new(
                "store-90off",
                json!({"type": "discount", "factor": "0.9"}),
                Scope::Global,
            ))
            .await
            .expect("seed");
        promotions
            .save(Promotion::new(
                "kettle-half",
                json!({"type": "discount", "factor": "0.5"}),
                Scope::Goods(vec![1]),
            ))
            .await
            .expect("seed");

        service
            .save_cart(request(
                vec![
                    CartItem::new(1, "Kettle", Decimal::from(100), 1),
                    CartItem::new(2, "Mug", Decimal::from(10), 1),
                ],
                None,
            ))
            .await;

        let response = service.update_for_promotions("13800000000").await;
        assert_eq!(response["result"], "updated");
        assert_eq!(amount(&response["original_total"]), Decimal::from(110));
        // Kettle gets its 50% allow-list promotion, the mug the global 90%.
        assert_eq!(amount(&response["final_amount"]), Decimal::from(59));
        assert_eq!(amount(&response["discount_amount"]), Decimal::from(51));
    }

    #[tokio::test]
    async fn update_for_promotions_without_cart_reports_not_found() {
        let (service, _, _) = service();
        let response = service.update_for_promotions("13800000000").await;
        assert_eq!(response["error"], "cart_not_found");
    }
}
