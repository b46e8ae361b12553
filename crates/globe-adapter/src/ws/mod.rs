/*
[INPUT]:  WebSocket configuration, topics and order commands
[OUTPUT]: Routed market data, account updates and order acknowledgements
[POS]:    WebSocket layer - real-time data streams and trading
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod client;
pub mod dispatch;
pub mod message;
pub mod registry;
pub mod topic;
mod trade;

pub use client::{ConnectionState, GlobeWebSocket};
pub use dispatch::ErrorHandler;
pub use message::{ChannelMessage, Command, InboundFrame, SubscriptionHeader};
pub use registry::ReceiveHandler;
pub use topic::{Channel, Topic};
