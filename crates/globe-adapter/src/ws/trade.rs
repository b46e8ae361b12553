/*
[INPUT]:  Order and cancel requests
[OUTPUT]: Order command frames over the authenticated connection
[POS]:    WebSocket layer - trading commands
[UPDATE]: When adding order commands or changing id assignment
*/

use rust_decimal::Decimal;
use tracing::info;

use super::client::GlobeWebSocket;
use super::message::Command;
use crate::error::Result;
use crate::types::{CancelOrder, CancelStopOrder, Order};

impl GlobeWebSocket {
    /// Place an order; returns the client order id (generated when absent).
    ///
    /// Confirmation arrives on the `my-market-events` channel.
    pub fn place_order(&self, mut order: Order) -> Result<String> {
        self.require_credentials("place_order")?;
        let order_id = order.ensure_order_id();
        info!(
            order_id = %order_id,
            instrument = %order.instrument,
            side = ?order.side,
            order_type = ?order.order_type,
            quantity = %order.quantity,
            price = ?order.price,
            "placing order"
        );
        self.send(&Command::PlaceOrder(order))?;
        Ok(order_id)
    }

    /// Cancel, or reduce with `new_quantity`; returns the cancel id
    pub fn cancel_order(&self, mut cancel: CancelOrder) -> Result<String> {
        self.require_credentials("cancel_order")?;
        let cancel_id = cancel.ensure_cancel_id();
        info!(
            cancel_id = %cancel_id,
            order_id = %cancel.order_id,
            instrument = %cancel.instrument,
            new_quantity = ?cancel.new_quantity,
            "cancelling order"
        );
        self.send(&Command::CancelOrder(cancel))?;
        Ok(cancel_id)
    }

    /// Place an order that activates once the market reaches `trigger`
    pub fn place_stop_order(&self, trigger: Decimal, mut order: Order) -> Result<String> {
        self.require_credentials("place_stop_order")?;
        let order_id = order.ensure_order_id();
        info!(
            order_id = %order_id,
            instrument = %order.instrument,
            trigger = %trigger,
            "placing stop order"
        );
        self.send(&Command::StopOrder { trigger, order })?;
        Ok(order_id)
    }

    pub fn cancel_stop_order(&self, mut cancel: CancelStopOrder) -> Result<String> {
        self.require_credentials("cancel_stop_order")?;
        let cancel_id = cancel.ensure_cancel_id();
        info!(
            cancel_id = %cancel_id,
            order_id = %cancel.order_id,
            instrument = %cancel.instrument,
            "cancelling stop order"
        );
        self.send(&Command::CancelStopOrder(cancel))?;
        Ok(cancel_id)
    }
}
