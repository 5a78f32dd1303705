//! Length-prefixed bincode frames over any byte stream.
//!
//! Each frame is a big-endian `u32` length followed by that many bytes of a
//! bincode-encoded [`Message`]. A background task decodes inbound frames into
//! a channel so buffered messages can be taken without blocking.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use crate::protocol::Message;
use crate::transport::Transport;

/// Default timeout for a single send.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Frames larger than this (1 MB) are refused in both directions.
pub const MAX_FRAME_SIZE: u32 = 1_000_000;

/// Serialize `msg` into a length-prefixed frame.
pub fn encode_frame(msg: &Message, max_frame_size: u32) -> anyhow::Result<Vec<u8>> {
    let body = bincode::serialize(msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
    if body.len() as u64 > max_frame_size as u64 {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            body.len(),
            max_frame_size
        ));
    }
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Read and decode one frame.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_frame_size: u32,
) -> anyhow::Result<Message> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            anyhow::anyhow!("Connection closed by peer")
        } else {
            anyhow::anyhow!("Read error: {}", e)
        }
    })?;
    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(anyhow::anyhow!("Invalid message length: 0"));
    }
    if len > max_frame_size {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            len,
            max_frame_size
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(|e| anyhow::anyhow!("Read error: {}", e))?;
    bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
}

pub struct FramedTransport<S> {
    writer: WriteHalf<S>,
    inbound: UnboundedReceiver<anyhow::Result<Message>>,
    reader: JoinHandle<()>,
    timeout_duration: Duration,
    max_frame_size: u32,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap `stream`; must be called inside a tokio runtime.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, DEFAULT_TIMEOUT, MAX_FRAME_SIZE)
    }

    pub fn with_config(stream: S, timeout_duration: Duration, max_frame_size: u32) -> Self {
        let (read_half, writer) = tokio::io::split(stream);
        let (tx, inbound) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(read_half, tx, max_frame_size));
        Self {
            writer,
            inbound,
            reader,
            timeout_duration,
            max_frame_size,
        }
    }
}

async fn read_loop<S: AsyncRead>(
    mut read_half: ReadHalf<S>,
    tx: mpsc::UnboundedSender<anyhow::Result<Message>>,
    max_frame_size: u32,
) {
    loop {
        let frame = read_frame(&mut read_half, max_frame_size).await;
        let failed = frame.is_err();
        if let Err(e) = &frame {
            log::warn!("inbound stream stopped: {}", e);
        }
        if tx.send(frame).is_err() || failed {
            break;
        }
    }
}

impl<S> Drop for FramedTransport<S> {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait::async_trait]
impl<S> Transport for FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        let frame = encode_frame(&msg, self.max_frame_size)?;
        let write = async {
            self.writer.write_all(&frame).await?;
            self.writer.flush().await?;
            anyhow::Ok(())
        };
        timeout(self.timeout_duration, write)
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.timeout_duration))?
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        match self.inbound.recv().await {
            Some(frame) => frame,
            None => Err(anyhow::anyhow!("Connection closed by peer")),
        }
    }

    fn try_recv(&mut self) -> anyhow::Result<Option<Message>> {
        match self.inbound.try_recv() {
            Ok(frame) => frame.map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("Connection closed by peer")),
        }
    }
}
