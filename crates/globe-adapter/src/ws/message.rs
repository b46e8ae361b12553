/*
[INPUT]:  Raw WebSocket text frames / outbound command values
[OUTPUT]: Classified inbound frames and serialized command frames
[POS]:    WebSocket layer - message parsing and validation
[UPDATE]: When adding new message types or changing format
*/

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::topic::{Channel, Topic};
use crate::types::{CancelOrder, CancelStopOrder, Order};

/// Outbound command frame, tagged by its `command` field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    Subscribe(Topic),
    Unsubscribe(Topic),
    PlaceOrder(Order),
    CancelOrder(CancelOrder),
    StopOrder {
        #[serde(with = "rust_decimal::serde::float")]
        trigger: Decimal,
        order: Order,
    },
    CancelStopOrder(CancelStopOrder),
}

/// `subscription` header of a channel frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionHeader {
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// A full channel frame as delivered to subscription handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub subscription: SubscriptionHeader,
    #[serde(default)]
    pub data: Value,
    /// Any other top-level fields the exchange sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChannelMessage {
    /// The catalogue channel, if the name is a known one
    pub fn channel(&self) -> Option<Channel> {
        serde_json::from_value(Value::String(self.subscription.channel.clone())).ok()
    }

    pub fn instrument(&self) -> Option<&str> {
        self.subscription.instrument.as_deref()
    }

    /// Decode the payload into a typed value
    pub fn data_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data)
    }
}

/// Inbound frame after classification
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Frame carrying a `subscription` header
    Channel(ChannelMessage),
    /// Frame carrying an `error` field
    Error(Value),
    /// Valid JSON of any other shape
    Unrecognized(Value),
}

impl InboundFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        if has_field(&value, "subscription") {
            return serde_json::from_value(value).map(InboundFrame::Channel);
        }
        if has_field(&value, "error") {
            return Ok(InboundFrame::Error(value));
        }
        Ok(InboundFrame::Unrecognized(value))
    }
}

fn has_field(value: &Value, field: &str) -> bool {
    value.get(field).is_some_and(|inner| !inner.is_null())
}
