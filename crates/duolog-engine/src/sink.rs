//! Emission seam between the engine and its consumers

use async_trait::async_trait;
use duolog_core::Message;
use tokio::sync::mpsc;

/// Receives each message as the engine produces it
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn emit(&self, message: &Message);
}

/// Sink that discards messages (batch evaluation)
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl MessageSink for NullSink {
    async fn emit(&self, _message: &Message) {}
}

/// Sink forwarding messages over an unbounded channel
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelSink {
    /// Create a sink and the receiving half
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn emit(&self, message: &Message) {
        // Receiver dropping just means nobody is watching anymore
        let _ = self.tx.send(message.clone());
    }
}
