//! Order persistence seam.

use std::collections::HashMap;
use std::sync::RwLock;

use mercora_core::{DomainError, DomainResult, OrderId, UserId};

use crate::order::{Order, OrderStatus};

/// System-of-record access for orders.
pub trait OrderRepository: Send + Sync {
    fn create(&self, order: &Order) -> DomainResult<()>;
    fn get(&self, id: OrderId) -> DomainResult<Order>;
    fn list_for_user(&self, user_id: UserId) -> DomainResult<Vec<Order>>;
    fn update_status(&self, id: OrderId, status: OrderStatus) -> DomainResult<()>;
}

/// In-memory order repository.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn create(&self, order: &Order) -> DomainResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;

        if orders.contains_key(&order.id) {
            return Err(DomainError::conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    fn get(&self, id: OrderId) -> DomainResult<Order> {
        let orders = self
            .orders
            .read()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;
        orders.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    fn list_for_user(&self, user_id: UserId) -> DomainResult<Vec<Order>> {
        let orders = self
            .orders
            .read()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;

        let mut matching: Vec<Order> = orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by_key(|order| order.created_at);
        Ok(matching)
    }

    fn update_status(&self, id: OrderId, status: OrderStatus) -> DomainResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::conflict("lock poisoned"))?;

        match orders.get_mut(&id) {
            Some(order) => {
                order.status = status;
                Ok(())
            }
            None => Err(DomainError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderItem;
    use mercora_core::{OrderItemId, ProductId};

    fn order_for(user_id: UserId) -> Order {
        let order_id = OrderId::new();
        Order::pending(
            order_id,
            user_id,
            vec![OrderItem {
                id: OrderItemId::new(),
                order_id,
                product_id: ProductId::new(),
                quantity: 1,
                price: 100,
            }],
        )
    }

    #[test]
    fn create_then_get_round_trips() {
        let repo = InMemoryOrderRepository::new();
        let order = order_for(UserId::new());

        repo.create(&order).unwrap();
        assert_eq!(repo.get(order.id).unwrap(), order);
    }

    #[test]
    fn list_for_user_filters_by_owner() {
        let repo = InMemoryOrderRepository::new();
        let alice = UserId::new();
        let bob = UserId::new();

        repo.create(&order_for(alice)).unwrap();
        repo.create(&order_for(alice)).unwrap();
        repo.create(&order_for(bob)).unwrap();

        assert_eq!(repo.list_for_user(alice).unwrap().len(), 2);
        assert_eq!(repo.list_for_user(bob).unwrap().len(), 1);
    }

    #[test]
    fn update_status_persists() {
        let repo = InMemoryOrderRepository::new();
        let order = order_for(UserId::new());
        repo.create(&order).unwrap();

        repo.update_status(order.id, OrderStatus::Completed).unwrap();
        assert_eq!(repo.get(order.id).unwrap().status, OrderStatus::Completed);
    }

    #[test]
    fn missing_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        assert_eq!(repo.get(OrderId::new()).unwrap_err(), DomainError::NotFound);
        assert_eq!(
            repo.update_status(OrderId::new(), OrderStatus::Cancelled)
                .unwrap_err(),
            DomainError::NotFound
        );
    }
}
