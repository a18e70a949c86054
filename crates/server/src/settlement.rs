//! Settlement orchestration: priced cart in, durable order plus stock
//! mutation out, with rollback when the mutation fails halfway.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use shoply_core::domain::cart::{Cart, CartId};
use shoply_core::domain::good::GoodId;
use shoply_core::domain::order::{Order, OrderId, OrderStatus};
use shoply_core::promo::recalc::recalculate;
use shoply_core::promo::resolver::resolve_policy;
use shoply_db::repositories::{
    CartRepository, GoodRepository, OrderRepository, PromotionRepository, RepositoryError,
    StockDecrement,
};

use crate::protocol::{error_with, OrderActionRequest, SettleOrderRequest};

pub(crate) fn persistence_error(error: RepositoryError) -> Value {
    error_with("persistence_failure", &[("detail", json!(error.to_string()))])
}

/// Per-good async locks serializing the check-then-decrement window, so two
/// settlements racing on the same good cannot both pass the stock check.
/// Guards are always taken in ascending good id order to rule out deadlock.
#[derive(Clone, Default)]
pub struct StockLocks {
    inner: Arc<Mutex<HashMap<GoodId, Arc<Mutex<()>>>>>,
}

impl StockLocks {
    pub async fn acquire(&self, mut ids: Vec<GoodId>) -> Vec<OwnedMutexGuard<()>> {
        ids.sort_unstable();
        ids.dedup();

        let handles: Vec<Arc<Mutex<()>>> = {
            let mut table = self.inner.lock().await;
            ids.into_iter().map(|id| Arc::clone(table.entry(id).or_default())).collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }
        guards
    }
}

pub struct SettlementService {
    goods: Arc<dyn GoodRepository>,
    orders: Arc<dyn OrderRepository>,
    carts: Arc<dyn CartRepository>,
    promotions: Arc<dyn PromotionRepository>,
    locks: StockLocks,
    failed_order_log: PathBuf,
}

impl SettlementService {
    pub fn new(
        goods: Arc<dyn GoodRepository>,
        orders: Arc<dyn OrderRepository>,
        carts: Arc<dyn CartRepository>,
        promotions: Arc<dyn PromotionRepository>,
        failed_order_log: impl Into<PathBuf>,
    ) -> Self {
        Self {
            goods,
            orders,
            carts,
            promotions,
            locks: StockLocks::default(),
            failed_order_log: failed_order_log.into(),
        }
    }

    /// Settle a cart into an order.
    ///
    /// Stock sufficiency is validated for every line before anything is
    /// persisted. The order row is saved next, then stock is decremented per
    /// line; the first decrement failure stops the loop, leaves earlier
    /// decrements in place, and deletes the just-saved order.
    pub async fn settle(&self, request: SettleOrderRequest) -> Value {
        let status = match request.status {
            None => OrderStatus::Settled,
            Some(code) => match OrderStatus::from_code(code) {
                Ok(status) => status,
                Err(_) => return error_with("invalid_status", &[("status", json!(code))]),
            },
        };

        let _guards =
            self.locks.acquire(request.items.iter().map(|item| item.good_id).collect()).await;

        for item in &request.items {
            let good = match self.goods.find_by_id(item.good_id).await {
                Ok(Some(good)) => good,
                Ok(None) => {
                    return error_with("good_not_found", &[("productId", json!(item.good_id))]);
                }
                Err(err) => return persistence_error(err),
            };
            if item.quantity > good.stock {
                return error_with(
                    "stock_exceeded",
                    &[
                        ("productId", json!(item.good_id)),
                        ("available", json!(good.stock)),
                        ("requested", json!(item.quantity)),
                    ],
                );
            }
        }

        let (cart, reused_cart) = match self.resolve_amounts(&request).await {
            Ok(resolved) => resolved,
            Err(body) => return body,
        };

        let order = Order::from_cart(cart, status);
        let order_id = order.order_id.clone();

        if let Err(err) = self.orders.save(order.clone()).await {
            self.journal_failed_order(&request, &err).await;
            return error_with("save_failed", &[("detail", json!(err.to_string()))]);
        }

        for item in &order.items {
            let failure = match self.goods.decrement_stock(item.good_id, item.quantity).await {
                Ok(StockDecrement::Applied { .. }) => None,
                Ok(StockDecrement::Insufficient { available }) => Some(format!(
                    "good {} has {} left, {} requested",
                    item.good_id, available, item.quantity
                )),
                Ok(StockDecrement::NotFound) => {
                    Some(format!("good {} disappeared mid-settlement", item.good_id))
                }
                Err(err) => Some(err.to_string()),
            };
            if let Some(reason) = failure {
                return self.rollback(&order_id, &reason).await;
            }
        }

        if let Some(cart_id) = reused_cart {
            if let Err(err) = self.carts.mark_converted(&cart_id).await {
                warn!(
                    event_name = "order.settle.cart_mark_failed",
                    cart_id = %cart_id.0,
                    error = %err,
                    "settled order saved but source cart could not be marked converted"
                );
            }
        }

        info!(
            event_name = "order.settle.completed",
            order_id = %order_id.0,
            user_phone = %order.user_phone,
            final_amount = %order.final_amount,
            "cart settled into order"
        );
        json!({ "result": "added", "order_id": order_id.0 })
    }

    /// Amount precedence: client-supplied final and discount amounts win
    /// verbatim; otherwise a server-held cart with a matching id and a
    /// positive computed final amount is reused; otherwise totals are
    /// recomputed from the declared policy or the promotion store.
    async fn resolve_amounts(
        &self,
        request: &SettleOrderRequest,
    ) -> Result<(Cart, Option<CartId>), Value> {
        let mut cart = Cart::new(request.user_phone.clone(), request.items.clone());
        cart.shipping_address = request.shipping_address.clone();
        cart.discount_policy = request.discount_policy.clone();
        if let Some(order_id) = &request.order_id {
            cart.cart_id = CartId(order_id.clone());
        }

        if let (Some(final_amount), Some(discount_amount)) =
            (request.final_amount, request.discount_amount)
        {
            cart.final_amount = final_amount;
            cart.discount_amount = discount_amount;
            return Ok((cart, None));
        }

        let server_cart = self
            .carts
            .find_active_by_user(&request.user_phone)
            .await
            .map_err(persistence_error)?;
        if let Some(server_cart) = server_cart {
            let id_matches = request
                .order_id
                .as_deref()
                .map_or(true, |order_id| order_id == server_cart.cart_id.0);
            if id_matches && server_cart.final_amount > Decimal::ZERO {
                let cart_id = server_cart.cart_id.clone();
                let mut reused = server_cart;
                if !request.shipping_address.is_empty() {
                    reused.shipping_address = request.shipping_address.clone();
                }
                return Ok((reused, Some(cart_id)));
            }
        }

        let policy = request.policy.as_ref().and_then(resolve_policy);
        let promotions = self.promotions.list_active().await.map_err(persistence_error)?;
        recalculate(&mut cart, policy.as_ref(), &promotions);
        Ok((cart, None))
    }

    async fn rollback(&self, order_id: &OrderId, reason: &str) -> Value {
        match self.orders.delete(order_id).await {
            Ok(true) => {
                warn!(
                    event_name = "order.settle.stock_update_failed",
                    order_id = %order_id.0,
                    reason,
                    "stock decrement failed; order rolled back"
                );
                error_with("stock_update_failed", &[("order_id", json!(order_id.0))])
            }
            Ok(false) => {
                error!(
                    event_name = "order.settle.rollback_failed",
                    order_id = %order_id.0,
                    reason,
                    "stock decrement failed and the saved order was already gone; \
                     manual remediation required"
                );
                error_with("stock_update_and_rollback_failed", &[("order_id", json!(order_id.0))])
            }
            Err(err) => {
                error!(
                    event_name = "order.settle.rollback_failed",
                    order_id = %order_id.0,
                    reason,
                    error = %err,
                    "stock decrement failed and rollback delete also failed; \
                     manual remediation required"
                );
                error_with("stock_update_and_rollback_failed", &[("order_id", json!(order_id.0))])
            }
        }
    }

    /// Best-effort side journal of orders that failed to save, one JSON
    /// object per line, for manual recovery.
    async fn journal_failed_order(&self, request: &SettleOrderRequest, cause: &RepositoryError) {
        let entry = json!({
            "at": Utc::now().to_rfc3339(),
            "order_id": request.order_id,
            "user_phone": request.user_phone,
            "items": request.items,
            "final_amount": request.final_amount,
            "discount_amount": request.discount_amount,
            "detail": cause.to_string(),
        });
        let mut line = entry.to_string();
        line.push('\n');

        let written = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.failed_order_log)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(err) = written {
            warn!(
                event_name = "order.settle.journal_failed",
                path = %self.failed_order_log.display(),
                error = %err,
                "could not journal failed order save"
            );
        }
    }

    /// Mark an order returned and restock its lines. Individual restock
    /// failures are logged but never undo the status change.
    pub async fn return_order(&self, request: OrderActionRequest) -> Value {
        let (order, body) = match self.transition(&request, OrderStatus::Returned).await {
            Ok(outcome) => outcome,
            Err(body) => return body,
        };

        for item in &order.items {
            match self.goods.restore_stock(item.good_id, item.quantity).await {
                Ok(true) => {}
                Ok(false) => warn!(
                    event_name = "order.return.restock_skipped",
                    order_id = %order.order_id.0,
                    good_id = item.good_id,
                    "returned line references a good that no longer exists"
                ),
                Err(err) => warn!(
                    event_name = "order.return.restock_failed",
                    order_id = %order.order_id.0,
                    good_id = item.good_id,
                    error = %err,
                    "could not restore stock for returned line"
                ),
            }
        }
        body
    }

    /// Mark an order as awaiting repair. No stock effect.
    pub async fn repair_order(&self, request: OrderActionRequest) -> Value {
        match self.transition(&request, OrderStatus::Repair).await {
            Ok((_, body)) => body,
            Err(body) => body,
        }
    }

    /// Remove an order row outright. When the caller supplies a phone it
    /// must match the order's owner; omitting the phone is the admin path.
    pub async fn delete_order(&self, request: OrderActionRequest) -> Value {
        let order_id = OrderId(request.order_id.clone());
        let order = match self.orders.find_by_id(&order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                return error_with("order_not_found", &[("order_id", json!(order_id.0))]);
            }
            Err(err) => return persistence_error(err),
        };

        if let Some(phone) = &request.user_phone {
            if phone != &order.user_phone {
                return error_with("forbidden", &[("order_id", json!(order_id.0))]);
            }
        }

        match self.orders.delete(&order_id).await {
            Ok(true) => json!({ "result": "deleted", "order_id": order_id.0 }),
            Ok(false) => error_with("order_not_found", &[("order_id", json!(order_id.0))]),
            Err(err) => persistence_error(err),
        }
    }

    async fn transition(
        &self,
        request: &OrderActionRequest,
        to: OrderStatus,
    ) -> Result<(Order, Value), Value> {
        let order_id = OrderId(request.order_id.clone());
        let order = match self.orders.find_by_id(&order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                return Err(error_with("order_not_found", &[("order_id", json!(order_id.0))]));
            }
            Err(err) => return Err(persistence_error(err)),
        };

        if order.check_transition(to).is_err() {
            return Err(error_with(
                "invalid_transition",
                &[("from", json!(order.status)), ("to", json!(to))],
            ));
        }

        match self.orders.update_status(&order_id, to).await {
            Ok(true) => {
                let body =
                    json!({ "result": "updated", "order_id": order_id.0, "status": to.code() });
                Ok((order, body))
            }
            Ok(false) => Err(error_with("order_not_found", &[("order_id", json!(order_id.0))])),
            Err(err) => Err(persistence_error(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::json;

    use shoply_core::domain::cart::{Cart, CartItem};
    use shoply_core::domain::good::{Good, GoodId};
    use shoply_core::domain::order::{OrderId, OrderStatus};
    use shoply_core::promo::{Promotion, Scope};
    use shoply_db::repositories::{
        CartRepository, GoodRepository, InMemoryCartRepository, InMemoryGoodRepository,
        InMemoryOrderRepository, InMemoryPromotionRepository, OrderRepository,
        PromotionRepository, RepositoryError, StockDecrement,
    };

    use crate::protocol::{OrderActionRequest, SettleOrderRequest};
    use crate::settlement::SettlementService;

    fn good(id: GoodId, price: &str, stock: u32) -> Good {
        Good {
            id,
            name: format!("good-{id}"),
            price: price.parse().expect("price"),
            stock,
            category: "test".to_string(),
        }
    }

    fn settle_request(items: Vec<CartItem>) -> SettleOrderRequest {
        SettleOrderRequest {
            order_id: None,
            user_phone: "13800000000".to_string(),
            shipping_address: "1 Main St".to_string(),
            discount_policy: String::new(),
            policy: None,
            final_amount: None,
            discount_amount: None,
            status: None,
            items,
        }
    }

    struct Fixture {
        goods: Arc<InMemoryGoodRepository>,
        orders: Arc<InMemoryOrderRepository>,
        carts: Arc<InMemoryCartRepository>,
        promotions: Arc<InMemoryPromotionRepository>,
        journal: tempfile::NamedTempFile,
    }

    impl Fixture {
        async fn new(goods: Vec<Good>) -> Self {
            let repository = Arc::new(InMemoryGoodRepository::default());
            for good in goods {
                repository.save(good).await.expect("seed good");
            }
            Self {
                goods: repository,
                orders: Arc::new(InMemoryOrderRepository::default()),
                carts: Arc::new(InMemoryCartRepository::default()),
                promotions: Arc::new(InMemoryPromotionRepository::default()),
                journal: tempfile::NamedTempFile::new().expect("journal file"),
            }
        }

        fn service(&self) -> SettlementService {
            SettlementService::new(
                self.goods.clone(),
                self.orders.clone(),
                self.carts.clone(),
                self.promotions.clone(),
                self.journal.path(),
            )
        }
    }

    #[tokio::test]
    async fn settles_and_decrements_stock() {
        let fixture = Fixture::new(vec![good(1, "10.00", 5)]).await;
        let service = fixture.service();

        let response = service
            .settle(settle_request(vec![CartItem::new(1, "Kettle", Decimal::from(10), 2)]))
            .await;

        assert_eq!(response["result"], "added");
        let order_id = OrderId(response["order_id"].as_str().expect("order id").to_string());
        let order = fixture.orders.find_by_id(&order_id).await.expect("load").expect("saved");
        assert_eq!(order.status, OrderStatus::Settled);
        assert_eq!(order.final_amount, Decimal::from(20));

        let remaining = fixture.goods.find_by_id(1).await.expect("load").expect("good");
        assert_eq!(remaining.stock, 3);
    }

    #[tokio::test]
    async fn stock_exceeded_fails_before_any_persistence() {
        let fixture = Fixture::new(vec![good(1, "10.00", 1)]).await;
        let service = fixture.service();

        let response = service
            .settle(settle_request(vec![CartItem::new(1, "Kettle", Decimal::from(10), 3)]))
            .await;

        assert_eq!(response["error"], "stock_exceeded");
        assert_eq!(response["productId"], 1);
        assert_eq!(response["available"], 1);
        assert_eq!(response["requested"], 3);
        assert!(fixture.orders.list_recent(10).await.expect("list").is_empty());
        assert_eq!(fixture.goods.find_by_id(1).await.expect("load").expect("good").stock, 1);
    }

    #[tokio::test]
    async fn unknown_good_reports_which_line() {
        let fixture = Fixture::new(vec![good(1, "10.00", 5)]).await;
        let service = fixture.service();

        let response = service
            .settle(settle_request(vec![
                CartItem::new(1, "Kettle", Decimal::from(10), 1),
                CartItem::new(99, "Ghost", Decimal::from(5), 1),
            ]))
            .await;

        assert_eq!(response["error"], "good_not_found");
        assert_eq!(response["productId"], 99);
    }

    #[tokio::test]
    async fn client_amounts_are_trusted_verbatim() {
        let fixture = Fixture::new(vec![good(1, "100.00", 5)]).await;
        let service = fixture.service();

        let mut request = settle_request(vec![CartItem::new(1, "Desk", Decimal::from(100), 1)]);
        request.final_amount = Some(Decimal::new(8888, 2));
        request.discount_amount = Some(Decimal::new(1112, 2));
        let response = service.settle(request).await;

        let order_id = OrderId(response["order_id"].as_str().expect("order id").to_string());
        let order = fixture.orders.find_by_id(&order_id).await.expect("load").expect("saved");
        assert_eq!(order.final_amount, Decimal::new(8888, 2));
        assert_eq!(order.discount_amount, Decimal::new(1112, 2));
    }

    #[tokio::test]
    async fn recalculates_from_promotion_store_when_no_amounts_given() {
        let fixture = Fixture::new(vec![good(1, "100.00", 5)]).await;
        fixture
            .promotions
            .save(Promotion::new(
                "store-90off",
                json!({"type": "discount", "factor": "0.9"}),
                Scope::Global,
            ))
            .await
            .expect("seed promotion");
        let service = fixture.service();

        let response = service
            .settle(settle_request(vec![CartItem::new(1, "Desk", Decimal::from(100), 2)]))
            .await;

        let order_id = OrderId(response["order_id"].as_str().expect("order id").to_string());
        let order = fixture.orders.find_by_id(&order_id).await.expect("load").expect("saved");
        assert_eq!(order.total_amount, Decimal::from(200));
        assert_eq!(order.final_amount, Decimal::from(180));
        assert_eq!(order.discount_amount, Decimal::from(20));
    }

    #[tokio::test]
    async fn reuses_server_cart_amounts() {
        let fixture = Fixture::new(vec![good(1, "50.00", 5)]).await;
        let mut cart =
            Cart::new("13800000000", vec![CartItem::new(1, "Lamp", Decimal::from(50), 2)]);
        cart.set_final_amount(Decimal::from(90));
        let cart_id = cart.cart_id.clone();
        fixture.carts.save(cart).await.expect("seed cart");
        let service = fixture.service();

        let mut request = settle_request(vec![CartItem::new(1, "Lamp", Decimal::from(50), 2)]);
        request.order_id = Some(cart_id.0.clone());
        let response = service.settle(request).await;

        assert_eq!(response["order_id"], cart_id.0);
        let order =
            fixture.orders.find_by_id(&OrderId(cart_id.0.clone())).await.expect("load").expect("saved");
        assert_eq!(order.final_amount, Decimal::from(90));
        assert_eq!(order.discount_amount, Decimal::from(10));

        let cart = fixture.carts.find_by_id(&cart_id).await.expect("load").expect("cart");
        assert!(cart.is_converted);
    }

    /// Good repository that refuses to decrement one particular good,
    /// standing in for a mid-settlement storage failure.
    struct FailingDecrement {
        inner: Arc<InMemoryGoodRepository>,
        poisoned: GoodId,
    }

    #[async_trait]
    impl GoodRepository for FailingDecrement {
        async fn find_by_id(&self, id: GoodId) -> Result<Option<Good>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn list_all(&self) -> Result<Vec<Good>, RepositoryError> {
            self.inner.list_all().await
        }

        async fn save(&self, good: Good) -> Result<(), RepositoryError> {
            self.inner.save(good).await
        }

        async fn decrement_stock(
            &self,
            id: GoodId,
            quantity: u32,
        ) -> Result<StockDecrement, RepositoryError> {
            if id == self.poisoned {
                return Err(RepositoryError::Decode("simulated stock write failure".into()));
            }
            self.inner.decrement_stock(id, quantity).await
        }

        async fn restore_stock(&self, id: GoodId, quantity: u32) -> Result<bool, RepositoryError> {
            self.inner.restore_stock(id, quantity).await
        }
    }

    #[tokio::test]
    async fn decrement_failure_rolls_back_order_but_not_earlier_decrements() {
        let fixture = Fixture::new(vec![good(1, "10.00", 5), good(2, "20.00", 5)]).await;
        let goods = Arc::new(FailingDecrement { inner: fixture.goods.clone(), poisoned: 2 });
        let service = SettlementService::new(
            goods,
            fixture.orders.clone(),
            fixture.carts.clone(),
            fixture.promotions.clone(),
            fixture.journal.path(),
        );

        let response = service
            .settle(settle_request(vec![
                CartItem::new(1, "Kettle", Decimal::from(10), 2),
                CartItem::new(2, "Mug", Decimal::from(20), 1),
            ]))
            .await;

        assert_eq!(response["error"], "stock_update_failed");
        let order_id = OrderId(response["order_id"].as_str().expect("order id").to_string());
        assert!(fixture.orders.find_by_id(&order_id).await.expect("load").is_none());

        // The first line's decrement stays applied; only the order is undone.
        assert_eq!(fixture.goods.find_by_id(1).await.expect("load").expect("good").stock, 3);
        assert_eq!(fixture.goods.find_by_id(2).await.expect("load").expect("good").stock, 5);
    }

    #[tokio::test]
    async fn concurrent_settlements_for_the_last_unit_cannot_both_win() {
        let fixture = Fixture::new(vec![good(1, "10.00", 1)]).await;
        let service = Arc::new(fixture.service());

        let first = tokio::spawn({
            let service = service.clone();
            async move {
                service
                    .settle(settle_request(vec![CartItem::new(1, "Kettle", Decimal::from(10), 1)]))
                    .await
            }
        });
        let second = tokio::spawn({
            let service = service.clone();
            async move {
                service
                    .settle(settle_request(vec![CartItem::new(1, "Kettle", Decimal::from(10), 1)]))
                    .await
            }
        });

        let outcomes = [first.await.expect("join"), second.await.expect("join")];
        let added = outcomes.iter().filter(|body| body["result"] == "added").count();
        let rejected = outcomes.iter().filter(|body| body["error"] == "stock_exceeded").count();
        assert_eq!(added, 1);
        assert_eq!(rejected, 1);
        assert_eq!(fixture.goods.find_by_id(1).await.expect("load").expect("good").stock, 0);
    }

    #[tokio::test]
    async fn return_restocks_and_repair_does_not() {
        let fixture = Fixture::new(vec![good(1, "10.00", 5)]).await;
        let service = fixture.service();

        let response = service
            .settle(settle_request(vec![CartItem::new(1, "Kettle", Decimal::from(10), 2)]))
            .await;
        let order_id = response["order_id"].as_str().expect("order id").to_string();
        assert_eq!(fixture.goods.find_by_id(1).await.expect("load").expect("good").stock, 3);

        let repaired = service
            .repair_order(OrderActionRequest { order_id: order_id.clone(), user_phone: None })
            .await;
        assert_eq!(repaired["status"], OrderStatus::Repair.code());
        assert_eq!(fixture.goods.find_by_id(1).await.expect("load").expect("good").stock, 3);

        let returned = service
            .return_order(OrderActionRequest { order_id: order_id.clone(), user_phone: None })
            .await;
        assert_eq!(returned["status"], OrderStatus::Returned.code());
        assert_eq!(fixture.goods.find_by_id(1).await.expect("load").expect("good").stock, 5);

        // A second return is rejected: the order already left the
        // returnable states.
        let again = service
            .return_order(OrderActionRequest { order_id, user_phone: None })
            .await;
        assert_eq!(again["error"], "invalid_transition");
    }

    #[tokio::test]
    async fn delete_enforces_ownership_unless_phone_omitted() {
        let fixture = Fixture::new(vec![good(1, "10.00", 5)]).await;
        let service = fixture.service();

        let response = service
            .settle(settle_request(vec![CartItem::new(1, "Kettle", Decimal::from(10), 1)]))
            .await;
        let order_id = response["order_id"].as_str().expect("order id").to_string();

        let forbidden = service
            .delete_order(OrderActionRequest {
                order_id: order_id.clone(),
                user_phone: Some("13999999999".to_string()),
            })
            .await;
        assert_eq!(forbidden["error"], "forbidden");

        let deleted = service
            .delete_order(OrderActionRequest { order_id: order_id.clone(), user_phone: None })
            .await;
        assert_eq!(deleted["result"], "deleted");
        assert!(fixture
            .orders
            .find_by_id(&OrderId(order_id))
            .await
            .expect("load")
            .is_none());
    }
}
