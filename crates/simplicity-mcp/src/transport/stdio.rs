//! Newline-delimited JSON transport
//!
//! One JSON-RPC message per line. Reading and writing run in their own tasks
//! and talk to the server through channels, so tool calls running
//! concurrently can each write their response when they finish.

use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::protocol::JsonRpcResponse;

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The writer task has stopped
    #[error("Transport closed")]
    Closed,
}

/// Reads one message per line, skipping blank lines
pub struct LineReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Next message, or `None` at end of input
    pub async fn read_message(&mut self) -> io::Result<Option<String>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            trace!("Received: {}", line);
            return Ok(Some(line.to_string()));
        }
    }
}

/// Writes one message per line, flushing after each
pub struct LineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_message(&mut self, message: &str) -> io::Result<()> {
        trace!("Sending: {}", message);
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

/// Incoming side of a channel transport
pub struct MessageReceiver {
    rx: mpsc::Receiver<String>,
}

impl MessageReceiver {
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Outgoing side of a channel transport; cheap to clone into tasks
#[derive(Clone)]
pub struct MessageSender {
    tx: mpsc::Sender<String>,
}

impl MessageSender {
    pub async fn send_response(&self, response: &JsonRpcResponse) -> Result<(), TransportError> {
        let json = serde_json::to_string(response)?;
        self.tx.send(json).await.map_err(|_| TransportError::Closed)
    }
}

/// Channel transport with its background tasks
pub struct Channels {
    pub sender: MessageSender,
    pub receiver: MessageReceiver,
    /// Completes once every sender is dropped and all output is flushed
    pub writer: JoinHandle<()>,
}

/// Spawn reader and writer tasks over an arbitrary byte stream pair
pub fn spawn_channels<R, W>(reader: R, writer: W, buffer_size: usize) -> Channels
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (in_tx, in_rx) = mpsc::channel(buffer_size);
    let (out_tx, mut out_rx) = mpsc::channel::<String>(buffer_size);

    tokio::spawn(async move {
        let mut reader = LineReader::new(reader);
        loop {
            match reader.read_message().await {
                Ok(Some(msg)) => {
                    if in_tx.send(msg).await.is_err() {
                        debug!("Receiver dropped, stopping input reader");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("End of input");
                    break;
                }
                Err(e) => {
                    error!("Error reading input: {}", e);
                    break;
                }
            }
        }
    });

    let writer = tokio::spawn(async move {
        let mut writer = LineWriter::new(writer);
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = writer.write_message(&msg).await {
                error!("Error writing output: {}", e);
                return;
            }
        }
        if let Err(e) = writer.shutdown().await {
            debug!("Error closing output: {}", e);
        }
        debug!("Output writer finished");
    });

    Channels {
        sender: MessageSender { tx: out_tx },
        receiver: MessageReceiver { rx: in_rx },
        writer,
    }
}

/// Channel transport over the process's stdin and stdout
pub fn create_stdio_channels(buffer_size: usize) -> Channels {
    spawn_channels(tokio::io::stdin(), tokio::io::stdout(), buffer_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;

    #[tokio::test]
    async fn test_reader_skips_blank_lines() {
        let input: &[u8] = b"\n  \n{\"a\":1}\r\n\n{\"b\":2}\n";
        let mut reader = LineReader::new(input);

        assert_eq!(reader.read_message().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(reader.read_message().await.unwrap().as_deref(), Some("{\"b\":2}"));
        assert_eq!(reader.read_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writer_frames_lines() {
        let mut out = Vec::new();
        {
            let mut writer = LineWriter::new(&mut out);
            writer.write_message("{}").await.unwrap();
            writer.write_message("[]").await.unwrap();
        }
        assert_eq!(out, b"{}\n[]\n");
    }

    #[tokio::test]
    async fn test_channels_round_trip() {
        let (client, server) = tokio::io::duplex(1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, mut client_write) = tokio::io::split(client);

        let Channels {
            sender,
            mut receiver,
            writer,
        } = spawn_channels(server_read, server_write, 8);

        client_write.write_all(b"{\"ping\":1}\n").await.unwrap();
        assert_eq!(receiver.recv().await.as_deref(), Some("{\"ping\":1}"));

        let response = JsonRpcResponse::success(RequestId::Number(1), serde_json::json!({}));
        sender.send_response(&response).await.unwrap();
        drop(sender);
        writer.await.unwrap();

        let mut client_reader = LineReader::new(client_read);
        let line = client_reader.read_message().await.unwrap().unwrap();
        assert!(line.contains("\"result\":{}"));
    }
}
