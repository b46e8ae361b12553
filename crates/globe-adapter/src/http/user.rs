/*
[INPUT]:  Query parameters and API credentials
[OUTPUT]: User account data (open orders, positions, account overview, trades)
[POS]:    HTTP layer - user data endpoints (require signed headers)
[UPDATE]: When adding new user endpoints or changing query parameters
*/

use serde_json::Value;

use crate::error::Result;
use crate::http::GlobeClient;

impl GlobeClient {
    /// Query resting orders for an instrument, newest first
    ///
    /// The body is returned as-is; entries can be read into
    /// [`OpenOrder`](crate::types::OpenOrder) with `serde_json::from_value`.
    ///
    /// GET /api/v1/orders/open-orders?instrument={instrument}&upto_timestamp={ts}&page_size={n}
    pub async fn get_open_orders(
        &self,
        instrument: &str,
        upto_timestamp: Option<i64>,
        page_size: Option<u32>,
    ) -> Result<Value> {
        let mut params = vec![("instrument", instrument.to_string())];
        if let Some(ts) = upto_timestamp {
            params.push(("upto_timestamp", ts.to_string()));
        }
        if let Some(size) = page_size {
            params.push(("page_size", size.to_string()));
        }

        let url = self.endpoint_url(&["orders", "open-orders"], &params)?;
        let builder = self.signed_request(url, "get_open_orders")?;
        self.send_json(builder).await
    }

    /// GET /api/v1/positions
    pub async fn get_positions(&self) -> Result<Value> {
        let url = self.endpoint_url(&["positions"], &[])?;
        let builder = self.signed_request(url, "get_positions")?;
        self.send_json(builder).await
    }

    /// Balances, margin and PnL
    ///
    /// GET /api/v1/account-overview
    pub async fn get_account_overview(&self) -> Result<Value> {
        let url = self.endpoint_url(&["account-overview"], &[])?;
        let builder = self.signed_request(url, "get_account_overview")?;
        self.send_json(builder).await
    }

    /// GET /api/v1/history/my-trades?instrument={instrument}&page={page}
    pub async fn get_my_trades(&self, instrument: &str, page: Option<u32>) -> Result<Value> {
        let mut params = vec![("instrument", instrument.to_string())];
        if let Some(page) = page {
            params.push(("page", page.to_string()));
        }

        let url = self.endpoint_url(&["history", "my-trades"], &params)?;
        let builder = self.signed_request(url, "get_my_trades")?;
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::Credentials;
    use crate::config::ClientConfig;
    use crate::error::GlobeError;
    use crate::http::GlobeClient;
    use crate::types::{OpenOrder, OrderType, Side};
    use rust_decimal::Decimal;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed_client_for(server: &MockServer) -> GlobeClient {
        let config = ClientConfig::default()
            .with_host(server.address().to_string())
            .with_tls(false)
            .with_credentials(Credentials::new("c2VjcmV0", "pass").with_api_key("k"));
        GlobeClient::with_config(config).expect("client init")
    }

    #[tokio::test]
    async fn test_get_open_orders() {
        let server = MockServer::start().await;
        let mock_response = r#"[
            {
                "type": "order",
                "order_id": "o-1",
                "instrument": "XBTUSD",
                "side": "buy",
                "order_type": "limit",
                "quantity": 100,
                "filled_quantity": 25,
                "price": 9950.5,
                "timestamp": 1700000000000
            }
        ]"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/api/v1/orders/open-orders"))
            .and(query_param("instrument", "XBTUSD"))
            .and(query_param("page_size", "50"))
            .and(header("X-Access-Key", "k"))
            .and(header("X-Access-Passphrase", "pass"))
            .and(header_exists("X-Access-Signature"))
            .and(header_exists("X-Access-Nonce"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(mock_response, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let body = signed_client_for(&server)
            .get_open_orders("XBTUSD", None, Some(50))
            .await
            .expect("get_open_orders failed");

        let orders: Vec<OpenOrder> = serde_json::from_value(body).unwrap();
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.order_id, "o-1");
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.price, Some(Decimal::new(99505, 1)));
        assert_eq!(order.remaining_quantity(), Decimal::from(75));
    }

    #[tokio::test]
    async fn test_get_open_orders_keeps_unknown_shape() {
        let server = MockServer::start().await;
        let mock_response = r#"{"orders":[{"id":"o-2","price":null}],"next_upto_timestamp":1699999999000}"#;

        let _mock = Mock::given(method("GET"))
            .and(path("/api/v1/orders/open-orders"))
            .and(query_param("upto_timestamp", "1700000000000"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(mock_response, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let body = signed_client_for(&server)
            .get_open_orders("XBTUSD", Some(1_700_000_000_000), None)
            .await
            .expect("get_open_orders failed");

        assert_eq!(body["orders"][0]["id"], "o-2");
        assert_eq!(body["next_upto_timestamp"], 1_699_999_999_000_i64);
    }

    #[tokio::test]
    async fn test_get_my_trades_query() {
        let server = MockServer::start().await;

        let _mock = Mock::given(method("GET"))
            .and(path("/api/v1/history/my-trades"))
            .and(query_param("instrument", "XBTUSD"))
            .and(query_param("page", "2"))
            .and(header_exists("X-Access-Signature"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"trades":[]}"#, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let trades = signed_client_for(&server)
            .get_my_trades("XBTUSD", Some(2))
            .await
            .expect("get_my_trades failed");

        assert_eq!(trades["trades"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_private_endpoints_require_credentials() {
        let client = GlobeClient::new().expect("client init");

        assert!(matches!(
            client.get_positions().await,
            Err(GlobeError::AuthRequired { operation: "get_positions" })
        ));
        assert!(matches!(
            client.get_account_overview().await,
            Err(GlobeError::AuthRequired { .. })
        ));
        assert!(matches!(
            client.get_open_orders("XBTUSD", None, None).await,
            Err(GlobeError::AuthRequired { .. })
        ));
        assert!(matches!(
            client.get_my_trades("XBTUSD", None).await,
            Err(GlobeError::AuthRequired { .. })
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;

        let _mock = Mock::given(method("GET"))
            .and(path("/api/v1/account-overview"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid signature"))
            .mount(&server)
            .await;

        let err = signed_client_for(&server)
            .get_account_overview()
            .await
            .unwrap_err();

        assert!(err.is_auth_error());
    }
}
