//! Stove connection management
//!
//! The socket boundary seen by the polling session: a [`Connector`] opens a
//! byte stream, and [`StoveConnection`] runs one request/response exchange at a
//! time over it.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::accumulator::ResponseAccumulator;
use crate::codec::Frame;
use crate::error::{Result, StoveError};

/// Byte stream a connector hands to the session
pub trait StoveStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> StoveStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// Opens a fresh stream to the stove
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn StoveStream>>;

    /// Human readable target for logs
    fn target(&self) -> String;
}

/// TCP connector for a stove WiFi module
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> Result<Box<dyn StoveStream>> {
        let addr = format!("{}:{}", self.host, self.port);
        debug!("TCP connecting: {}", addr);

        match timeout(self.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("TCP_NODELAY: {}", e);
                }
                info!("TCP connected: {}", addr);
                Ok(Box::new(stream))
            },
            Ok(Err(e)) => {
                error!("TCP err: {} - {}", addr, e);
                Err(StoveError::connect(format!(
                    "Failed to connect to {addr}: {e}"
                )))
            },
            Err(_) => {
                warn!("TCP timeout: {}", addr);
                Err(StoveError::connect(format!(
                    "Connection to {addr} timed out"
                )))
            },
        }
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One open stream plus its response buffer
pub struct StoveConnection {
    stream: Box<dyn StoveStream>,
    accumulator: ResponseAccumulator,
}

impl std::fmt::Debug for StoveConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoveConnection")
            .field("buffered", &self.accumulator.buffered_len())
            .finish()
    }
}

impl StoveConnection {
    pub fn new(stream: Box<dyn StoveStream>) -> Self {
        Self {
            stream,
            accumulator: ResponseAccumulator::new(),
        }
    }

    /// Open a connection through `connector`
    pub async fn open(connector: &dyn Connector) -> Result<Self> {
        let stream = connector.connect().await?;
        Ok(Self::new(stream))
    }

    /// Write one frame
    pub async fn send(&mut self, frame: &Frame) -> Result<()> {
        let wire = frame.encode();
        self.stream.write_all(&wire).await.map_err(|e| {
            error!("TX: {}", e);
            StoveError::socket(format!("Send error: {e}"))
        })?;
        self.stream.flush().await.map_err(|e| {
            error!("TX flush: {}", e);
            StoveError::socket(format!("Flush error: {e}"))
        })?;
        debug!("TX: {} ({}B)", frame, wire.len());
        Ok(())
    }

    /// Wait for the next complete response line or `timeout_duration`
    pub async fn receive_line(&mut self, timeout_duration: Duration) -> Result<Vec<String>> {
        match timeout(timeout_duration, self.read_line()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("RX timeout after {:?}", timeout_duration);
                Err(StoveError::ExchangeTimeout(timeout_duration))
            },
        }
    }

    async fn read_line(&mut self) -> Result<Vec<String>> {
        loop {
            if let Some(line) = self.accumulator.next_line() {
                debug!("RX: {} fields", line.len());
                return Ok(line);
            }

            let read = self
                .stream
                .read_buf(self.accumulator.buffer_mut())
                .await
                .map_err(|e| {
                    error!("RX: {}", e);
                    StoveError::socket(format!("Read error: {e}"))
                })?;

            if read == 0 {
                error!("RX: connection closed by stove");
                return Err(StoveError::socket("Connection closed by stove"));
            }
        }
    }

    /// Send a frame and wait for its single response line
    ///
    /// Exactly one exchange is in flight per connection; `&mut self` enforces it.
    /// `cancel` is checked before the write and raced against the response
    /// wait only, so a frame is never left half written. A write that stalls
    /// longer than `response_timeout` fails the exchange.
    pub async fn exchange(
        &mut self,
        frame: &Frame,
        response_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        if cancel.is_cancelled() {
            return Err(StoveError::Stopped);
        }

        match timeout(response_timeout, self.send(frame)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("TX stalled for {:?}", response_timeout);
                return Err(StoveError::ExchangeTimeout(response_timeout));
            },
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("RX abandoned: {}", frame);
                Err(StoveError::Stopped)
            },
            line = self.receive_line(response_timeout) => line,
        }
    }
}
