//! Core types for Khaja.
//!
//! This module provides type-safe wrappers for common domain concepts.

mod email;
mod id;
mod money;
mod phone;
mod status;

pub use email::{Email, EmailError};
pub use id::{CategoryId, OrderId, ProductId, RestaurantId, UserId};
pub use money::Money;
pub use phone::{Phone, PhoneError};
pub use status::{DeliverySlot, OrderStatus, PaymentMethod};
