use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use common::{Error, OrderGateway, OrderRequest, Result};

/// Posts orders as JSON to the order-management service.
pub struct HttpGateway {
    url: String,
    http: Client,
}

impl HttpGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl OrderGateway for HttpGateway {
    async fn submit(&self, order: &OrderRequest) -> Result<()> {
        debug!(symbol = %order.symbol, side = %order.side, url = %self.url, "Posting order");

        let resp = self
            .http
            .post(&self.url)
            .json(order)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Gateway {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use common::OrderSide;
    use serde_json::Value;

    use super::*;

    /// Start a one-route OMS stub answering with `status`, returning its URL
    /// and the bodies it received.
    async fn stub_oms(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/orders",
                post(
                    move |State(seen): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                        seen.lock().unwrap().push(body);
                        (status, "stub reply")
                    },
                ),
            )
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/orders"), received)
    }

    #[tokio::test]
    async fn posts_gateway_json_and_accepts_success() {
        let (url, received) = stub_oms(StatusCode::OK).await;
        let gateway = HttpGateway::new(url, Duration::from_secs(2)).unwrap();

        let order = OrderRequest::market("TCS", OrderSide::Sell, 7, 3100.25);
        gateway.submit(&order).await.unwrap();

        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["symbol"], "TCS");
        assert_eq!(bodies[0]["side"], "SELL");
        assert_eq!(bodies[0]["type"], "MARKET");
        assert_eq!(bodies[0]["quantity"], 7);
        assert_eq!(bodies[0]["price"], 3100.25);
    }

    #[tokio::test]
    async fn non_success_status_is_a_gateway_error() {
        let (url, _) = stub_oms(StatusCode::INTERNAL_SERVER_ERROR).await;
        let gateway = HttpGateway::new(url, Duration::from_secs(2)).unwrap();

        let err = gateway
            .submit(&OrderRequest::market("TCS", OrderSide::Buy, 1, 1.0))
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Gateway { status: 500, ref body } if body == "stub reply"),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway =
            HttpGateway::new(format!("http://{addr}/orders"), Duration::from_secs(2)).unwrap();
        let err = gateway
            .submit(&OrderRequest::market("TCS", OrderSide::Buy, 1, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "unexpected error: {err}");
    }
}
