/*
[INPUT]:  GLOBE_* environment variables (optional), RUST_LOG
[OUTPUT]: Logged market data updates and historical candles
[POS]:    Examples - public market data streams
[UPDATE]: When public channels or REST endpoints change
*/

use globe_adapter::{ClientConfig, GlobeClient, GlobeWebSocket, Resolution, Topic};
use tokio::time::{Duration, sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;

const INSTRUMENT: &str = "XBTUSD";

#[tokio::main]
async fn main() -> globe_adapter::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ClientConfig::from_env()?;

    let rest = GlobeClient::with_config(config.clone())?;
    let candles = rest
        .get_historic_market_rates(INSTRUMENT, Resolution::OneHour)
        .await?;
    info!(
        instrument = INSTRUMENT,
        candles = candles.as_array().map_or(0, Vec::len),
        "historic market rates"
    );

    let ws = GlobeWebSocket::new(config)?;
    ws.connect().await?;

    ws.subscribe(Topic::index_price(INSTRUMENT), |message| {
        info!(data = %message.data, "index price");
    })?;
    ws.subscribe(Topic::depth(INSTRUMENT), |message| {
        info!(data = %message.data, "depth");
    })?;
    ws.subscribe(Topic::price_history(INSTRUMENT, Resolution::OneMinute), |message| {
        info!(data = %message.data, "price history");
    })?;

    sleep(Duration::from_secs(30)).await;

    ws.unsubscribe(&Topic::depth(INSTRUMENT))?;
    ws.close();
    Ok(())
}
