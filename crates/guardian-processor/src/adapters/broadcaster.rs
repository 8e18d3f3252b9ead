//! Gossip broadcaster adapter
//!
//! Hands encoded gossip messages to the p2p task over a bounded channel.

use crate::error::{ProcessorError, ProcessorResult};
use crate::ports::outbound::Broadcaster;
use tokio::sync::mpsc::{self, error::TrySendError};

/// `Broadcaster` backed by an `mpsc` queue drained by the transport.
pub struct ChannelBroadcaster {
    sender: mpsc::Sender<Vec<u8>>,
}

impl ChannelBroadcaster {
    pub fn new(sender: mpsc::Sender<Vec<u8>>) -> Self {
        Self { sender }
    }

    /// Adapter plus the receiving end for the transport.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast(&self, message: Vec<u8>) -> ProcessorResult<()> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => ProcessorError::BroadcastFailed {
                reason: "outbound queue full".to_string(),
            },
            TrySendError::Closed(_) => ProcessorError::BroadcastFailed {
                reason: "transport closed".to_string(),
            },
        })
    }
}
