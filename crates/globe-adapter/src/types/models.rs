/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{OrderExecutionType, OrderType, Side};

/// Resting order as returned by `/orders/open-orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub execution_type: Option<OrderExecutionType>,
    pub order_id: String,
    pub instrument: String,
    pub side: Side,
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub filled_quantity: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    /// Milliseconds since epoch
    pub timestamp: i64,
}

impl OpenOrder {
    pub fn remaining_quantity(&self) -> Decimal {
        (self.quantity - self.filled_quantity).max(Decimal::ZERO)
    }
}
