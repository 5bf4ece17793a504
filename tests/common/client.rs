//! Test client.
//!
//! Speaks the wire protocol: nickname handshake, then length-prefixed JSON
//! frames in both directions.

#![allow(dead_code)]

use ndfa_proto::{
    ClientMessage, NICK_PROMPT, ServerEvent, ServerMessage, ValidationRequest, ValidationResult,
    read_frame, write_frame,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

const MAX_FRAME: usize = 16 * 1024 * 1024;

/// A test client.
pub struct TestClient {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    pub nick: String,
}

impl TestClient {
    /// Connect without sending a nickname.
    pub async fn connect_raw(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader,
            writer,
            nick: String::new(),
        })
    }

    /// Connect and answer the nickname prompt.
    pub async fn connect(address: &str, nick: &str) -> anyhow::Result<Self> {
        let mut client = Self::connect_raw(address).await?;
        client.expect_prompt().await?;
        client.send_bytes(format!("{nick}\n").as_bytes()).await?;
        client.nick = nick.to_string();
        Ok(client)
    }

    /// Read the `NICK` prompt.
    pub async fn expect_prompt(&mut self) -> anyhow::Result<()> {
        let mut prompt = [0u8; 4];
        timeout(Duration::from_secs(5), self.reader.read_exact(&mut prompt)).await??;
        anyhow::ensure!(prompt == NICK_PROMPT, "unexpected prompt {:?}", prompt);
        Ok(())
    }

    /// Write raw bytes, bypassing framing.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send one frame.
    pub async fn send_frame(&mut self, payload: &[u8]) -> anyhow::Result<()> {
        write_frame(&mut self.writer, payload, MAX_FRAME).await?;
        Ok(())
    }

    /// Send a validation request.
    pub async fn validate(&mut self, request: ValidationRequest) -> anyhow::Result<()> {
        let payload = ClientMessage::Validate(request).to_bytes()?;
        self.send_frame(&payload).await
    }

    /// Send a chat line.
    pub async fn chat(&mut self, text: &str) -> anyhow::Result<()> {
        let payload = ClientMessage::Chat {
            text: text.to_string(),
        }
        .to_bytes()?;
        self.send_frame(&payload).await
    }

    /// Receive a single frame from the server.
    pub async fn recv(&mut self) -> anyhow::Result<ServerMessage> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a frame with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<ServerMessage> {
        let frame = timeout(dur, read_frame(&mut self.reader, MAX_FRAME))
            .await??
            .ok_or_else(|| anyhow::anyhow!("connection closed"))?;
        Ok(ServerMessage::decode(&frame)?)
    }

    /// Receive frames until the predicate matches, returning everything read.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<ServerMessage>>
    where
        F: FnMut(&ServerMessage) -> bool,
    {
        let mut messages = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = predicate(&msg);
            messages.push(msg);
            if done {
                return Ok(messages);
            }
        }
    }

    /// Receive frames until a validation result arrives.
    pub async fn recv_result(&mut self) -> anyhow::Result<ValidationResult> {
        let messages = self
            .recv_until(|m| matches!(m, ServerMessage::Result(_)))
            .await?;
        match messages.into_iter().last() {
            Some(ServerMessage::Result(result)) => Ok(result),
            _ => anyhow::bail!("no result received"),
        }
    }

    /// Receive the next broadcast event, skipping nothing.
    pub async fn recv_event(&mut self) -> anyhow::Result<ServerEvent> {
        match self.recv().await? {
            ServerMessage::Event(event) => Ok(event),
            ServerMessage::Result(result) => anyhow::bail!("expected event, got {result:?}"),
        }
    }

    /// Wait for the join event announcing `nick`.
    pub async fn expect_join(&mut self, nick: &str) -> anyhow::Result<()> {
        self.recv_until(|m| matches!(m, ServerMessage::Event(ServerEvent::Join { nick: n, .. }) if n == nick))
            .await?;
        Ok(())
    }

    /// Assert the server closes the connection within `dur`.
    pub async fn expect_closed(&mut self, dur: Duration) -> anyhow::Result<()> {
        let mut buf = [0u8; 1024];
        let deadline = tokio::time::Instant::now() + dur;
        loop {
            let n = tokio::time::timeout_at(deadline, self.reader.read(&mut buf)).await??;
            if n == 0 {
                return Ok(());
            }
        }
    }

    /// Close the write half.
    pub async fn quit(mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
