//! LSP Transport Layer
//!
//! Handles LSP message framing with Content-Length headers over any async
//! byte stream: a child process's pipes on the session side, the process's
//! own stdin/stdout on the server side.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::protocol::Message;

/// Framed message reader
pub struct Transport<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> Transport<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next message from the peer
    ///
    /// LSP messages are framed with headers:
    /// ```text
    /// Content-Length: 123\r\n
    /// \r\n
    /// {"jsonrpc":"2.0",...}
    /// ```
    ///
    /// A closed stream yields `UnexpectedEof`. A well-framed body that is not
    /// a JSON-RPC message yields `InvalidData` with the frame consumed, so the
    /// caller may keep reading.
    pub async fn read_message(&mut self) -> io::Result<Message> {
        let content_length = self.read_headers().await?;

        let mut body = vec![0u8; content_length];
        self.reader.read_exact(&mut body).await?;

        let json =
            String::from_utf8(body).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        tracing::trace!("LSP <- {}", json);

        Message::parse(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Read headers and return Content-Length
    async fn read_headers(&mut self) -> io::Result<usize> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "Peer closed connection",
                ));
            }

            let line = line.trim();

            // Empty line marks end of headers
            if line.is_empty() {
                if content_length.is_none() {
                    // stray blank line between frames
                    continue;
                }
                break;
            }

            if let Some(value) = line.strip_prefix("Content-Length:") {
                content_length = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
                );
            }
            // Ignore other headers (Content-Type, etc.)
        }

        content_length
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "Missing Content-Length"))
    }
}

/// Serialize and write any JSON-RPC message with LSP framing
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(message)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    tracing::trace!("LSP -> {}", json);

    let framed = format!("Content-Length: {}\r\n\r\n{}", json.len(), json);
    writer.write_all(framed.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::lsp::protocol::{Notification, Request};

    #[tokio::test]
    async fn test_write_then_read() {
        let (mut client, server) = tokio::io::duplex(4096);
        let mut transport = Transport::new(server);

        write_message(&mut client, &Request::new(1, "initialize", None))
            .await
            .unwrap();
        write_message(&mut client, &Notification::new("initialized", None))
            .await
            .unwrap();

        match transport.read_message().await.unwrap() {
            Message::Request(req) => assert_eq!(req.method, "initialize"),
            other => panic!("expected request, got {other:?}"),
        }
        assert!(matches!(
            transport.read_message().await.unwrap(),
            Message::Notification(n) if n.method == "initialized"
        ));
    }

    #[tokio::test]
    async fn test_multibyte_content_length() {
        let (mut client, server) = tokio::io::duplex(4096);
        let mut transport = Transport::new(server);

        let note = Notification::new("x", Some(serde_json::json!({"text": "héllo 😀"})));
        write_message(&mut client, &note).await.unwrap();

        let Message::Notification(read) = transport.read_message().await.unwrap() else {
            panic!("expected notification");
        };
        assert_eq!(read.params.unwrap()["text"], "héllo 😀");
    }

    #[tokio::test]
    async fn test_eof_and_bad_body() {
        let (mut client, server) = tokio::io::duplex(4096);
        let mut transport = Transport::new(server);

        client
            .write_all(b"Content-Length: 7\r\n\r\nnotjson")
            .await
            .unwrap();
        write_message(&mut client, &Notification::new("exit", None))
            .await
            .unwrap();
        drop(client);

        let err = transport.read_message().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(transport.read_message().await.is_ok());
        let err = transport.read_message().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
