/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - order commands sent over the WebSocket
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{OrderType, Side};

/// Order placement request
///
/// `order_id` is the correlation key for the asynchronous confirmation on
/// `my-market-events`; one is generated when left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub instrument: String,
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    pub side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl Order {
    pub fn limit(instrument: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            instrument: instrument.into(),
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            side,
            order_id: None,
        }
    }

    pub fn post_only(
        instrument: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            order_type: OrderType::PostOnly,
            ..Self::limit(instrument, side, quantity, price)
        }
    }

    pub fn market(instrument: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            instrument: instrument.into(),
            order_type: OrderType::Market,
            quantity,
            price: None,
            side,
            order_id: None,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Return the order id, generating one if missing
    pub(crate) fn ensure_order_id(&mut self) -> String {
        ensure_id(&mut self.order_id)
    }
}

/// Cancel (or reduce) a resting order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub instrument: String,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_id: Option<String>,
    /// Reduce the order to this quantity instead of removing it
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub new_quantity: Option<Decimal>,
}

impl CancelOrder {
    pub fn new(instrument: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            order_id: order_id.into(),
            cancel_id: None,
            new_quantity: None,
        }
    }

    pub fn with_cancel_id(mut self, cancel_id: impl Into<String>) -> Self {
        self.cancel_id = Some(cancel_id.into());
        self
    }

    pub fn with_new_quantity(mut self, new_quantity: Decimal) -> Self {
        self.new_quantity = Some(new_quantity);
        self
    }

    pub(crate) fn ensure_cancel_id(&mut self) -> String {
        ensure_id(&mut self.cancel_id)
    }
}

/// Cancel an untriggered stop order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelStopOrder {
    pub instrument: String,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_id: Option<String>,
}

impl CancelStopOrder {
    pub fn new(instrument: impl Into<String>, order_id: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            order_id: order_id.into(),
            cancel_id: None,
        }
    }

    pub fn with_cancel_id(mut self, cancel_id: impl Into<String>) -> Self {
        self.cancel_id = Some(cancel_id.into());
        self
    }

    pub(crate) fn ensure_cancel_id(&mut self) -> String {
        ensure_id(&mut self.cancel_id)
    }
}

/// Generate a request id for order correlation
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

fn ensure_id(slot: &mut Option<String>) -> String {
    match slot {
        Some(id) if !id.is_empty() => id.clone(),
        _ => {
            let id = new_request_id();
            *slot = Some(id.clone());
            id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_order_wire_format() {
        let order = Order::limit("XBTUSD", Side::Buy, Decimal::from(1000), Decimal::from(100))
            .with_order_id("abc");
        let value = serde_json::to_value(&order).unwrap();

        assert_eq!(value["instrument"], "XBTUSD");
        assert_eq!(value["order_type"], "limit");
        assert_eq!(value["side"], "buy");
        assert_eq!(value["quantity"].as_f64(), Some(1000.0));
        assert_eq!(value["price"].as_f64(), Some(100.0));
        assert_eq!(value["order_id"], "abc");
    }

    #[test]
    fn test_market_order_omits_price() {
        let order = Order::market("XBTUSD", Side::Sell, Decimal::from(250));
        let value = serde_json::to_value(&order).unwrap();

        assert!(value.get("price").is_none());
        assert!(value.get("order_id").is_none());
    }

    #[test]
    fn test_ensure_order_id_generates_once() {
        let mut order = Order::market("XBTUSD", Side::Sell, Decimal::ONE);
        let first = order.ensure_order_id();
        let second = order.ensure_order_id();

        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(first, second);
    }

    #[test]
    fn test_ensure_id_keeps_caller_id_and_replaces_empty() {
        let mut order = Order::market("XBTUSD", Side::Buy, Decimal::ONE).with_order_id("mine");
        assert_eq!(order.ensure_order_id(), "mine");

        let mut cancel = CancelOrder::new("XBTUSD", "mine").with_cancel_id("");
        let cancel_id = cancel.ensure_cancel_id();
        assert!(!cancel_id.is_empty());
        assert_eq!(cancel.cancel_id.as_deref(), Some(cancel_id.as_str()));
    }

    #[test]
    fn test_parse_order_with_integer_quantity() {
        let order: Order = serde_json::from_str(
            r#"{"instrument":"XBTUSD","order_type":"post_only","quantity":5,"side":"sell","price":101.5}"#,
        )
        .unwrap();
        assert_eq!(order.quantity, Decimal::from(5));
        assert_eq!(order.price, Some(Decimal::new(1015, 1)));
    }
}
