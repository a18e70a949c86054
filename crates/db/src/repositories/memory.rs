use std::collections::HashMap;

use tokio::sync::RwLock;

use shoply_core::domain::cart::{Cart, CartId};
use shoply_core::domain::good::{Good, GoodId};
use shoply_core::domain::order::{Order, OrderId, OrderStatus};
use shoply_core::domain::user::User;
use shoply_core::promo::Promotion;

use super::{
    CartRepository, GoodRepository, OrderRepository, PromotionRepository, RepositoryError,
    StockDecrement, UserRepository,
};

#[derive(Default)]
pub struct InMemoryGoodRepository {
    goods: RwLock<HashMap<GoodId, Good>>,
}

#[async_trait::async_trait]
impl GoodRepository for InMemoryGoodRepository {
    async fn find_by_id(&self, id: GoodId) -> Result<Option<Good>, RepositoryError> {
        let goods = self.goods.read().await;
        Ok(goods.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Good>, RepositoryError> {
        let goods = self.goods.read().await;
        let mut all: Vec<Good> = goods.values().cloned().collect();
        all.sort_by_key(|good| good.id);
        Ok(all)
    }

    async fn save(&self, good: Good) -> Result<(), RepositoryError> {
        let mut goods = self.goods.write().await;
        goods.insert(good.id, good);
        Ok(())
    }

    async fn decrement_stock(
        &self,
        id: GoodId,
        quantity: u32,
    ) -> Result<StockDecrement, RepositoryError> {
        let mut goods = self.goods.write().await;
        match goods.get_mut(&id) {
            Some(good) if good.stock >= quantity => {
                good.stock -= quantity;
                Ok(StockDecrement::Applied { remaining: good.stock })
            }
            Some(good) => Ok(StockDecrement::Insufficient { available: good.stock }),
            None => Ok(StockDecrement::NotFound),
        }
    }

    async fn restore_stock(&self, id: GoodId, quantity: u32) -> Result<bool, RepositoryError> {
        let mut goods = self.goods.write().await;
        match goods.get_mut(&id) {
            Some(good) => {
                good.stock = good.stock.saturating_add(quantity);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(phone).cloned())
    }

    async fn save(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users.insert(user.phone.clone(), user);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: RwLock<HashMap<String, Cart>>,
}

#[async_trait::async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, RepositoryError> {
        let carts = self.carts.read().await;
        Ok(carts.get(&id.0).cloned())
    }

    async fn find_active_by_user(&self, phone: &str) -> Result<Option<Cart>, RepositoryError> {
        let carts = self.carts.read().await;
        Ok(carts
            .values()
            .filter(|cart| cart.user_phone == phone && !cart.is_converted)
            .max_by_key(|cart| cart.created_at)
            .cloned())
    }

    async fn save(&self, cart: Cart) -> Result<(), RepositoryError> {
        let mut carts = self.carts.write().await;
        carts.insert(cart.cart_id.0.clone(), cart);
        Ok(())
    }

    async fn mark_converted(&self, id: &CartId) -> Result<(), RepositoryError> {
        let mut carts = self.carts.write().await;
        if let Some(cart) = carts.get_mut(&id.0) {
            cart.is_converted = true;
        }
        Ok(())
    }

    async fn delete(&self, id: &CartId) -> Result<bool, RepositoryError> {
        let mut carts = self.carts.write().await;
        Ok(carts.remove(&id.0).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id.0).cloned())
    }

    async fn list_by_user(&self, phone: &str) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> =
            orders.values().filter(|order| order.user_phone == phone).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> =
            orders.values().filter(|order| order.status == status).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn save(&self, order: Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.order_id.0.clone(), order);
        Ok(())
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&id.0) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &OrderId) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.write().await;
        Ok(orders.remove(&id.0).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryPromotionRepository {
    promotions: RwLock<HashMap<String, Promotion>>,
}

#[async_trait::async_trait]
impl PromotionRepository for InMemoryPromotionRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Promotion>, RepositoryError> {
        let promotions = self.promotions.read().await;
        Ok(promotions.get(name).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Promotion>, RepositoryError> {
        let promotions = self.promotions.read().await;
        let mut all: Vec<Promotion> = promotions.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn list_active(&self) -> Result<Vec<Promotion>, RepositoryError> {
        Ok(self.list_all().await?.into_iter().filter(|promotion| promotion.active).collect())
    }

    async fn list_for_good(
        &self,
        id: shoply_core::domain::good::GoodId,
    ) -> Result<Vec<Promotion>, RepositoryError> {
        Ok(self
            .list_active()
            .await?
            .into_iter()
            .filter(|promotion| promotion.scope.applies_to(id))
            .collect())
    }

    async fn save(&self, promotion: Promotion) -> Result<(), RepositoryError> {
        let mut promotions = self.promotions.write().await;
        promotions.insert(promotion.name.clone(), promotion);
        Ok(())
    }

    async fn update(&self, name: &str, promotion: Promotion) -> Result<bool, RepositoryError> {
        let mut promotions = self.promotions.write().await;
        if promotions.remove(name).is_none() {
            return Ok(false);
        }
        promotions.insert(promotion.name.clone(), promotion);
        Ok(true)
    }

    async fn delete(&self, name: &str) -> Result<bool, RepositoryError> {
        let mut promotions = self.promotions.write().await;
        Ok(promotions.remove(name).is_some())
    }
}
