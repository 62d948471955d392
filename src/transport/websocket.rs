//! WebSocket connector and message helpers.
//!
//! Pools WebSocket client connections made with `tokio-tungstenite`.
//!
//! # Example
//!
//! ```ignore
//! use wspool::{Context, Pool, WsConnector};
//! use wspool::websocket::exchange_text;
//!
//! let connector = WsConnector::new("wss://example.com/feed")?
//!     .header("Authorization", "Bearer secret")?;
//! let pool = Pool::builder().build(connector)?;
//!
//! let reply = pool
//!     .submit(&Context::new(), |ws| Box::pin(exchange_text(ws, "ping")))
//!     .await?;
//! ```
//!
//! # Close Handling
//!
//! [`recv_message`] turns a close frame from the peer into
//! [`Error::Closed`], which the pool treats as an abnormal close unless
//! the peer said it was going away.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{from_str, to_string};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use crate::context::Context;
use crate::error::{Error, Result};

use super::{Connection, Connector};

// ============================================================================
// Constants
// ============================================================================

/// Close code reported when a close frame carries no status (RFC 6455, 1005).
const CLOSE_NO_STATUS: u16 = 1005;

// ============================================================================
// Types
// ============================================================================

/// Client WebSocket stream produced by [`WsConnector`].
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WsConnector
// ============================================================================

/// Opens WebSocket client connections to a fixed URL.
///
/// Extra handshake headers (auth tokens, API keys) are sent with every
/// connection attempt.
#[derive(Debug, Clone)]
pub struct WsConnector {
    /// Target `ws://` or `wss://` URL.
    url: Url,
    /// Extra headers for the opening handshake.
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl WsConnector {
    /// Creates a connector for the given URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is malformed or its scheme is
    /// not `ws` or `wss`.
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::config(format!("Invalid URL {url}: {e}")))?;

        match url.scheme() {
            "ws" | "wss" => Ok(Self {
                url,
                headers: Vec::new(),
            }),
            scheme => Err(Error::config(format!(
                "Unsupported URL scheme '{scheme}' (expected ws or wss)"
            ))),
        }
    }

    /// Adds a header to the opening handshake.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the name or value is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::config(format!("Invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::config(format!("Invalid header value for {name}: {e}")))?;

        self.headers.push((name, value));
        Ok(self)
    }

    /// Returns the target URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Conn = WsStream;

    async fn connect(&self, ctx: &Context) -> Result<Self::Conn> {
        let mut request = self.url.as_str().into_client_request()?;
        request.headers_mut().extend(self.headers.iter().cloned());

        let (stream, response) = tokio::select! {
            result = connect_async(request) => result?,
            err = ctx.done() => return Err(err),
        };

        debug!(url = %self.url, status = %response.status(), "WebSocket handshake completed");

        Ok(stream)
    }
}

// ============================================================================
// Connection for WebSocketStream
// ============================================================================

#[async_trait]
impl<S> Connection for WebSocketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Writes a close frame with an empty payload.
    async fn send_close(&mut self) -> Result<()> {
        self.send(Message::Close(None)).await?;
        Ok(())
    }

    /// Shuts down the underlying stream.
    async fn shutdown(mut self) -> Result<()> {
        self.get_mut().shutdown().await?;
        Ok(())
    }
}

// ============================================================================
// Message Helpers
// ============================================================================

/// Receives the next data message.
///
/// Ping and pong frames are skipped (tungstenite answers pings itself).
///
/// # Errors
///
/// - [`Error::Closed`] if the peer sent a close frame
/// - [`Error::ConnectionClosed`] if the stream ended without one
/// - [`Error::WebSocket`] on transport failures
pub async fn recv_message<S>(ws: &mut WebSocketStream<S>) -> Result<Message>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(Message::Close(frame))) => return Err(close_error(frame)),
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                trace!("Skipping control frame");
            }
            Some(Ok(message)) => return Ok(message),
            Some(Err(e)) => return Err(e.into()),
            None => return Err(Error::ConnectionClosed),
        }
    }
}

/// Sends a text message and waits for a text reply.
///
/// # Errors
///
/// Everything [`recv_message`] returns, plus [`Error::Protocol`] if the
/// reply is binary.
pub async fn exchange_text<S>(ws: &mut WebSocketStream<S>, text: impl Into<String>) -> Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let text: String = text.into();
    ws.send(Message::text(text)).await?;

    match recv_message(ws).await? {
        Message::Text(reply) => Ok(reply.as_str().to_owned()),
        Message::Binary(data) => Err(Error::protocol(format!(
            "Expected text reply, got {} binary bytes",
            data.len()
        ))),
        other => Err(Error::protocol(format!("Unexpected reply: {other:?}"))),
    }
}

/// Sends a JSON request and decodes the JSON reply.
///
/// # Errors
///
/// Everything [`exchange_text`] returns, plus [`Error::Json`] if either
/// side fails to (de)serialize.
pub async fn exchange_json<S, Req, Resp>(ws: &mut WebSocketStream<S>, request: &Req) -> Result<Resp>
where
    S: AsyncRead + AsyncWrite + Unpin,
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let json = to_string(request)?;
    let reply = exchange_text(ws, json).await?;
    Ok(from_str(&reply)?)
}

/// Converts a received close frame into [`Error::Closed`].
fn close_error(frame: Option<CloseFrame>) -> Error {
    match frame {
        Some(frame) => Error::closed(u16::from(frame.code), frame.reason.as_str()),
        None => Error::closed(CLOSE_NO_STATUS, ""),
    }
}

// ============================================================================
// Tests
// ============================================================================
