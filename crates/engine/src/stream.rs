use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};
use url::Url;

use common::{Error, Result, Tick};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// WebSocket subscription to the `market_ticks` relay.
///
/// Forwards every text frame, in arrival order, over a bounded channel to
/// the ingestion loop. Parsing happens on the loop side. Reconnects with
/// exponential backoff after the first successful connection.
pub struct TickFeed {
    url: Url,
}

enum FeedExit {
    /// Receiver dropped or stop signal: the subscription is released.
    Released,
    Disconnected(String),
}

impl TickFeed {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::Config(format!("TICK_STREAM_URL: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::Config(format!(
                "TICK_STREAM_URL must use ws:// or wss://, got '{url}'"
            )));
        }
        Ok(Self { url })
    }

    /// Open one connection to the relay.
    pub async fn connect(&self) -> Result<WsStream> {
        let (ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        info!(url = %self.url, "Subscribed to tick stream");
        Ok(ws)
    }

    /// One connection attempt, abandoned as soon as the stop signal fires.
    /// `None` means stop.
    async fn reconnect(&self, shutdown: &mut watch::Receiver<bool>) -> Option<Result<WsStream>> {
        tokio::select! {
            res = self.connect() => Some(res),
            _ = shutdown.changed() => None,
        }
    }

    /// Run the feed until the stop signal fires or the ingestion loop drops
    /// its receiver. `initial` is the connection established at startup.
    /// Call this inside a `tokio::spawn`.
    pub async fn run(
        self,
        initial: WsStream,
        tick_tx: mpsc::Sender<String>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut conn = Some(initial);
        let mut backoff = Duration::from_secs(1);

        loop {
            let ws = match conn.take() {
                Some(ws) => ws,
                None => match self.reconnect(&mut shutdown).await {
                    None => {
                        info!("Stop signal received while reconnecting");
                        return;
                    }
                    Some(Ok(ws)) => {
                        backoff = Duration::from_secs(1);
                        ws
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, backoff = ?backoff, "Tick stream reconnect failed");
                        if !sleep_or_stop(backoff, &mut shutdown).await {
                            return;
                        }
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                        continue;
                    }
                },
            };

            match forward(ws, &tick_tx, &mut shutdown).await {
                FeedExit::Released => {
                    info!("Tick stream subscription released");
                    return;
                }
                FeedExit::Disconnected(reason) => {
                    warn!(reason = %reason, backoff = ?backoff, "Tick stream disconnected, reconnecting");
                    if !sleep_or_stop(backoff, &mut shutdown).await {
                        return;
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }
}

async fn forward(
    ws: WsStream,
    tick_tx: &mpsc::Sender<String>,
    shutdown: &mut watch::Receiver<bool>,
) -> FeedExit {
    let (mut write, mut read) = ws.split();

    loop {
        let text = tokio::select! {
            _ = shutdown.changed() => {
                let _ = write.close().await;
                return FeedExit::Released;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        warn!("Dropping non-UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    return FeedExit::Disconnected("closed by server".into());
                }
                Some(Ok(_)) => continue, // ping/pong
                Some(Err(e)) => return FeedExit::Disconnected(e.to_string()),
            },
        };

        // Blocks while the hand-off is full; ticks are never dropped or reordered
        if tick_tx.send(text).await.is_err() {
            let _ = write.close().await;
            return FeedExit::Released;
        }
    }
}

/// Sleep for `delay`; returns `false` if the stop signal fired first.
async fn sleep_or_stop(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown.changed() => false,
    }
}

// ─── Tick JSON parsing ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TickMessage {
    symbol: String,
    price: f64,
    /// Epoch milliseconds.
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Parse one relay payload.
///
/// The relay also carries order updates on the same socket; those are
/// recognised by their `side`/`status` fields and return `Ok(None)`.
pub fn parse_tick(text: &str) -> Result<Option<Tick>> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::MalformedTick(e.to_string()))?;
    if value.get("side").is_some() || value.get("status").is_some() {
        return Ok(None);
    }

    let msg: TickMessage =
        serde_json::from_value(value).map_err(|e| Error::MalformedTick(e.to_string()))?;
    if msg.symbol.is_empty() {
        return Err(Error::MalformedTick("empty symbol".into()));
    }
    if !msg.price.is_finite() || msg.price <= 0.0 {
        return Err(Error::MalformedTick(format!("invalid price {}", msg.price)));
    }

    Ok(Some(Tick {
        symbol: msg.symbol,
        price: msg.price,
        timestamp: msg
            .timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
    }))
}
