//! Transport layer for MCP JSON-RPC communication.
//!
//! MCP uses newline-delimited JSON over stdin/stdout. The same framing serves
//! the server (stdin/stdout) and the demo client (a child process' pipes).

use std::io;
use std::string::FromUtf8Error;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::protocol::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Message that can be received by the server.
#[derive(Debug)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// A line that is not a valid JSON-RPC message. Answered with a null id.
    Malformed(JsonRpcError),
}

/// Newline-delimited JSON transport over any async reader/writer pair.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

/// Transport bound to the process' stdin and stdout.
pub type StdioTransport = LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl StdioTransport {
    /// Create a transport using stdin/stdout.
    pub fn stdio() -> Self {
        LineTransport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Give back the writer, e.g. to inspect what was written.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Read the next non-blank line. `None` at EOF. A line that is not
    /// UTF-8 comes back as its decoding error.
    async fn read_line(&mut self) -> io::Result<Option<Result<String, FromUtf8Error>>> {
        loop {
            let mut buf = Vec::new();
            if self.reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(None);
            }
            let line = match String::from_utf8(buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!("Received a line that is not valid UTF-8");
                    return Ok(Some(Err(e)));
                }
            };
            let line = line.trim();
            if !line.is_empty() {
                debug!("Received: {}", line);
                return Ok(Some(Ok(line.to_string())));
            }
        }
    }

    /// Read a single JSON-RPC message sent to the server.
    pub async fn read_message(&mut self) -> io::Result<Option<IncomingMessage>> {
        let message = match self.read_line().await? {
            None => return Ok(None),
            Some(Ok(line)) => classify(&line),
            Some(Err(e)) => IncomingMessage::Malformed(JsonRpcError::parse_error(&e.to_string())),
        };
        Ok(Some(message))
    }

    /// Read the next JSON value from the peer, whatever its shape.
    pub async fn read_value(&mut self) -> io::Result<Option<Value>> {
        let line = match self.read_line().await? {
            None => return Ok(None),
            Some(line) => line.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        };
        serde_json::from_str(&line)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write one message as a single line.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )
        })?;

        debug!("Sending: {}", json);

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Write a JSON-RPC response to the transport.
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        self.send(response).await
    }
}

/// Tell requests, notifications and garbage apart.
fn classify(line: &str) -> IncomingMessage {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse message: {}", line);
            return IncomingMessage::Malformed(JsonRpcError::parse_error(&e.to_string()));
        }
    };

    // Requests carry an id, notifications don't
    let result = if value.get("id").is_some() {
        serde_json::from_value::<JsonRpcRequest>(value).map(IncomingMessage::Request)
    } else {
        serde_json::from_value::<JsonRpcNotification>(value).map(IncomingMessage::Notification)
    };

    result.unwrap_or_else(|e| {
        warn!("Invalid JSON-RPC message: {}", line);
        IncomingMessage::Malformed(JsonRpcError::invalid_request(&e.to_string()))
    })
}
