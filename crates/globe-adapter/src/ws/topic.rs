/*
[INPUT]:  Channel name, instrument symbol, optional resolution
[OUTPUT]: Topic descriptors and the registry keys derived from them
[POS]:    WebSocket layer - subscription catalogue
[UPDATE]: When the exchange adds channels or changes namespacing
*/

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Resolution;

/// Every channel the exchange publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Depth,
    IndexPrice,
    InsuranceFund,
    ProductList,
    ProductDetail,
    Trades,
    MarketOverview,
    PriceHistory,
    OpenInterest,
    MyMarketEvents,
    MyAccountOverview,
    MyOrders,
    MyPositions,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Depth => "depth",
            Channel::IndexPrice => "index-price",
            Channel::InsuranceFund => "insurance-fund",
            Channel::ProductList => "product-list",
            Channel::ProductDetail => "product-detail",
            Channel::Trades => "trades",
            Channel::MarketOverview => "market-overview",
            Channel::PriceHistory => "price-history",
            Channel::OpenInterest => "open-interest",
            Channel::MyMarketEvents => "my-market-events",
            Channel::MyAccountOverview => "my-account-overview",
            Channel::MyOrders => "my-orders",
            Channel::MyPositions => "my-positions",
        }
    }

    /// Personalized channels need an authenticated handshake
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Channel::MyMarketEvents
                | Channel::MyAccountOverview
                | Channel::MyOrders
                | Channel::MyPositions
        )
    }

    /// Channels whose handlers are registered per instrument.
    ///
    /// The exchange multiplexes every instrument's order stream over one
    /// `my-orders` channel name.
    pub fn is_instrument_namespaced(&self) -> bool {
        matches!(self, Channel::MyOrders)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription target: channel plus optional instrument and resolution
///
/// Two topics address the same subscription when their [`Topic::key`]s are
/// equal; the resolution does not take part in the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub channel: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl Topic {
    fn public(channel: Channel, instrument: Option<String>) -> Self {
        Self {
            channel,
            instrument,
            resolution: None,
        }
    }

    /// Best bid and ask levels for an instrument
    pub fn depth(instrument: impl Into<String>) -> Self {
        Self::public(Channel::Depth, Some(instrument.into()))
    }

    pub fn index_price(instrument: impl Into<String>) -> Self {
        Self::public(Channel::IndexPrice, Some(instrument.into()))
    }

    pub fn insurance_fund(instrument: impl Into<String>) -> Self {
        Self::public(Channel::InsuranceFund, Some(instrument.into()))
    }

    pub fn product_list() -> Self {
        Self::public(Channel::ProductList, None)
    }

    /// Contract details including fees and funding period
    pub fn product_detail(instrument: impl Into<String>) -> Self {
        Self::public(Channel::ProductDetail, Some(instrument.into()))
    }

    /// The 100 most recent trades
    pub fn trades(instrument: impl Into<String>) -> Self {
        Self::public(Channel::Trades, Some(instrument.into()))
    }

    /// 24h volume, price change and funding rate
    pub fn market_overview(instrument: impl Into<String>) -> Self {
        Self::public(Channel::MarketOverview, Some(instrument.into()))
    }

    /// Candles at the given resolution
    pub fn price_history(instrument: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            channel: Channel::PriceHistory,
            instrument: Some(instrument.into()),
            resolution: Some(resolution),
        }
    }

    pub fn open_interest(instrument: impl Into<String>) -> Self {
        Self::public(Channel::OpenInterest, Some(instrument.into()))
    }

    /// Order confirmations, rejections and fills for the current user
    pub fn my_market_events(instrument: impl Into<String>) -> Self {
        Self::public(Channel::MyMarketEvents, Some(instrument.into()))
    }

    /// Balances, margin limits and PnL
    pub fn my_account_overview() -> Self {
        Self::public(Channel::MyAccountOverview, None)
    }

    /// Open order updates keyed by order id; a `null` value means removed
    pub fn my_open_orders(instrument: impl Into<String>) -> Self {
        Self::public(Channel::MyOrders, Some(instrument.into()))
    }

    pub fn my_positions() -> Self {
        Self::public(Channel::MyPositions, None)
    }

    /// Registry key shared by the subscribe and routing paths
    pub fn key(&self) -> String {
        topic_key(self.channel.as_str(), self.instrument.as_deref())
    }
}

/// `channel`, or `channel-instrument` for instrument namespaced channels
pub(crate) fn topic_key(channel: &str, instrument: Option<&str>) -> String {
    match instrument {
        Some(instrument) if channel == Channel::MyOrders.as_str() => {
            format!("{channel}-{instrument}")
        }
        _ => channel.to_string(),
    }
}

/// Keys tried, in order, when routing an inbound frame
pub(crate) fn routing_keys(channel: &str, instrument: Option<&str>) -> Vec<String> {
    let primary = topic_key(channel, instrument);
    if primary == channel {
        vec![primary]
    } else {
        vec![primary, channel.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Topic::depth("XBTUSD"), "depth")]
    #[case(Topic::product_list(), "product-list")]
    #[case(Topic::price_history("XBTUSD", Resolution::OneHour), "price-history")]
    #[case(Topic::my_account_overview(), "my-account-overview")]
    #[case(Topic::my_open_orders("XBTUSD"), "my-orders-XBTUSD")]
    #[case(Topic::my_open_orders("ETHUSD"), "my-orders-ETHUSD")]
    fn test_topic_key(#[case] topic: Topic, #[case] expected: &str) {
        assert_eq!(topic.key(), expected);
    }

    #[test]
    fn test_key_ignores_resolution() {
        let hourly = Topic::price_history("XBTUSD", Resolution::OneHour);
        let minutely = Topic::price_history("XBTUSD", Resolution::OneMinute);
        assert_eq!(hourly.key(), minutely.key());
        assert_eq!(Topic::depth("XBTUSD").key(), Topic::depth("XBTUSD").key());
    }

    #[test]
    fn test_routing_keys() {
        assert_eq!(
            routing_keys("my-orders", Some("XBTUSD")),
            vec!["my-orders-XBTUSD".to_string(), "my-orders".to_string()]
        );
        assert_eq!(routing_keys("depth", Some("XBTUSD")), vec!["depth".to_string()]);
        assert_eq!(routing_keys("my-orders", None), vec!["my-orders".to_string()]);
    }

    #[test]
    fn test_topic_wire_format() {
        let value = serde_json::to_value(Topic::price_history("XBTUSD", Resolution::FiveMinutes))
            .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"channel": "price-history", "instrument": "XBTUSD", "resolution": "5m"})
        );

        let value = serde_json::to_value(Topic::product_list()).unwrap();
        assert_eq!(value, serde_json::json!({"channel": "product-list"}));
    }

    #[test]
    fn test_private_channels() {
        assert!(Channel::MyOrders.requires_auth());
        assert!(Channel::MyPositions.requires_auth());
        assert!(!Channel::Depth.requires_auth());
        assert!(!Channel::ProductList.requires_auth());
        assert!(Channel::MyOrders.is_instrument_namespaced());
        assert!(!Channel::MyPositions.is_instrument_namespaced());
    }

    #[test]
    fn test_channel_wire_names_match_as_str() {
        for channel in [
            Channel::Depth,
            Channel::IndexPrice,
            Channel::InsuranceFund,
            Channel::ProductList,
            Channel::ProductDetail,
            Channel::Trades,
            Channel::MarketOverview,
            Channel::PriceHistory,
            Channel::OpenInterest,
            Channel::MyMarketEvents,
            Channel::MyAccountOverview,
            Channel::MyOrders,
            Channel::MyPositions,
        ] {
            assert_eq!(serde_json::to_value(channel).unwrap(), channel.as_str());
        }
    }
}
