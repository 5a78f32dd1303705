use crate::protocol::Message;

/// Handle to the real-time channel between a client and the authority.
///
/// A session owns its transport, so tests substitute an in-memory pair
/// without touching process-wide state.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()>;

    /// Wait for the next inbound message.
    async fn recv(&mut self) -> anyhow::Result<Message>;

    /// Take an inbound message if one is already buffered.
    fn try_recv(&mut self) -> anyhow::Result<Option<Message>>;
}

pub mod framed;
pub mod in_memory;
