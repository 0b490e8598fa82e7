//! Orders: the fulfillment transaction that mutates shared inventory.
//!
//! Order creation decrements product stock item by item and compensates
//! (restores every prior decrement) on any mid-sequence failure; cancellation
//! is the compensating action for a whole order.

pub mod events;
pub mod order;
pub mod repository;
pub mod service;

pub use events::{OrderCreatedEvent, OrderItemEvent};
pub use order::{Order, OrderItem, OrderStatus};
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::{NewOrderItem, OrderService};
