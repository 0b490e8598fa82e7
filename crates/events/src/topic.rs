//! Topic names shared by producers and consumers.

pub const ORDER_CREATED: &str = "order.created";
pub const PRODUCT_CREATED: &str = "product.created";
pub const PRODUCT_UPDATED: &str = "product.updated";
pub const PRODUCT_DELETED: &str = "product.deleted";
