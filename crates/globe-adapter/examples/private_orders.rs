/*
[INPUT]:  GLOBE_API_KEY, GLOBE_API_SECRET, GLOBE_PASSPHRASE, RUST_LOG
[OUTPUT]: Logged account updates, an order placed and cancelled
[POS]:    Examples - authenticated channels and order commands
[UPDATE]: When private channels or order commands change
*/

use globe_adapter::{
    CancelOrder, ClientConfig, GlobeClient, GlobeError, GlobeWebSocket, Order, Side, Topic,
};
use rust_decimal::Decimal;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const INSTRUMENT: &str = "XBTUSD";

#[tokio::main]
async fn main() -> globe_adapter::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ClientConfig::from_env()?;
    if config.credentials.is_none() {
        return Err(GlobeError::Config(
            "set GLOBE_API_SECRET and GLOBE_PASSPHRASE".to_string(),
        ));
    }

    let rest = GlobeClient::with_config(config.clone())?;
    let open_orders = rest.get_open_orders(INSTRUMENT, None, Some(20)).await?;
    info!(open_orders = %open_orders, "open orders");
    let overview = rest.get_account_overview().await?;
    info!(overview = %overview, "account overview");

    let ws = GlobeWebSocket::new(config)?.with_error_handler(|err| {
        warn!(error = %err, "exchange error");
    });
    ws.connect().await?;

    ws.subscribe(Topic::my_account_overview(), |message| {
        info!(data = %message.data, "account overview update");
    })?;
    ws.subscribe(Topic::my_market_events(INSTRUMENT), |message| {
        info!(data = %message.data, "market event");
    })?;
    ws.subscribe(Topic::my_open_orders(INSTRUMENT), |message| {
        info!(data = %message.data, "open orders update");
    })?;

    let order = Order::post_only(INSTRUMENT, Side::Buy, Decimal::ONE, Decimal::from(1_000));
    let order_id = ws.place_order(order)?;
    info!(order_id = %order_id, "order sent");

    sleep(Duration::from_secs(5)).await;

    let cancel_id = ws.cancel_order(CancelOrder::new(INSTRUMENT, order_id))?;
    info!(cancel_id = %cancel_id, "cancel sent");

    sleep(Duration::from_secs(5)).await;
    ws.close();
    Ok(())
}
