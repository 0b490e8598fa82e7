//! Cache key conventions shared across services.

use mercora_core::{OrderId, ProductId, UserId};

pub fn product(id: ProductId) -> String {
    format!("product:{id}")
}

pub fn products_list() -> String {
    "products:list".to_string()
}

pub fn order(id: OrderId) -> String {
    format!("order:{id}")
}

pub fn user_orders(user_id: UserId) -> String {
    format!("user:{user_id}:orders")
}
