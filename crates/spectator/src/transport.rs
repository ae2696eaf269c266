//! Live transport seam.
//!
//! The connection manager only sees [`Transport`] and [`Connection`]; the
//! production implementation wraps a tokio-tungstenite websocket.

use std::future::Future;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::TransportError;

/// Close code the server uses for a deliberate, final close.
pub const NORMAL_CLOSE: u16 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Peer closed the channel, with its close code when one was sent.
    Close(Option<u16>),
}

pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;

    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

pub trait Connection: Send + 'static {
    /// Next inbound frame; `None` once the stream has ended.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Frame, TransportError>>> + Send;

    fn send(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport for WsTransport {
    type Connection = WsConnection;

    async fn connect(&self, url: &str) -> Result<WsConnection, TransportError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        debug!(url, status = %response.status(), "websocket handshake complete");
        Ok(WsConnection { stream })
    }
}

impl Connection for WsConnection {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            let msg = match self.stream.next().await? {
                Ok(msg) => msg,
                Err(e) => return Some(Err(TransportError::Read(e.to_string()))),
            };
            match msg {
                Message::Text(text) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Message::Close(frame) => {
                    return Some(Ok(Frame::Close(frame.map(|f| u16::from(f.code)))));
                }
                // Ping/pong are answered by tungstenite; binary frames are not part of the protocol
                _ => continue,
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
