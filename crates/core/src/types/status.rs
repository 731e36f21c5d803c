//! Status and tag enums for orders.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// The client only ever submits `Pending`; the rest of the lifecycle is
/// driven server-side and read back on the order-history screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Cash handed to the rider on delivery.
    #[default]
    #[serde(rename = "cashondelivery")]
    CashOnDelivery,
    /// Khalti digital wallet.
    #[serde(rename = "khalti")]
    Khalti,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CashOnDelivery => write!(f, "cashondelivery"),
            Self::Khalti => write!(f, "khalti"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cashondelivery" | "cod" => Ok(Self::CashOnDelivery),
            "khalti" => Ok(Self::Khalti),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Delivery time slot offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliverySlot {
    /// Express delivery within roughly 45 minutes.
    #[default]
    #[serde(rename = "45 min")]
    Express,
    /// One-hour delivery window.
    #[serde(rename = "1_HOUR")]
    OneHour,
    /// Two-hour delivery window.
    #[serde(rename = "2_HOUR")]
    TwoHour,
}

impl std::str::FromStr for DeliverySlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "45" | "express" => Ok(Self::Express),
            "1h" | "1_HOUR" => Ok(Self::OneHour),
            "2h" | "2_HOUR" => Ok(Self::TwoHour),
            _ => Err(format!("invalid delivery slot: {s}")),
        }
    }
}
