/*
[INPUT]:  Instrument symbols and candle resolutions
[OUTPUT]: Historical market and index price candles
[POS]:    HTTP layer - public market data endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use serde_json::Value;

use crate::error::Result;
use crate::http::GlobeClient;
use crate::types::Resolution;

impl GlobeClient {
    /// Historical market price candles
    ///
    /// GET /api/v1/history/{instrument}/candles/{resolution}
    pub async fn get_historic_market_rates(
        &self,
        instrument: &str,
        resolution: Resolution,
    ) -> Result<Value> {
        let url = self.endpoint_url(
            &["history", instrument, "candles", resolution.as_str()],
            &[],
        )?;
        self.send_json(self.public_request(url)).await
    }

    /// Historical index price candles
    ///
    /// GET /api/v1/history/index-price/{instrument}/candles/{resolution}
    pub async fn get_historic_index_price_rates(
        &self,
        instrument: &str,
        resolution: Resolution,
    ) -> Result<Value> {
        let url = self.endpoint_url(
            &["history", "index-price", instrument, "candles", resolution.as_str()],
            &[],
        )?;
        self.send_json(self.public_request(url)).await
    }
}
