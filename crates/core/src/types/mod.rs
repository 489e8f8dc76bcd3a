//! Core types for Vitrine.
//!
//! Type-safe wrappers for ids and money, plus the entities consumed from the
//! REST API.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod order;
pub mod price;
pub mod role;
pub mod status;
pub mod user;

pub use cart::{Cart, CartItem, CartTotals};
pub use catalog::{Category, CategoryRef, Pagination, Product, ProductPage, Variant, filter_products};
pub use id::*;
pub use order::{Order, OrderCustomer, OrderItem, OrderProduct, Payment, PaymentMethod};
pub use price::{DEFAULT_SHIPPING, Money};
pub use role::{Role, UnknownRole};
pub use status::{OrderStatus, PaymentStatus};
pub use user::{Address, User};
