use std::sync::mpsc;

use serde_json::Value;

use crate::model::event::ChannelOrigin;

/// One subscribed notification channel. The session holds the receiving
/// half; the transport client keeps the sender and pushes raw payloads as
/// they arrive on the wire.
///
/// Dropping a `ChannelSource` is the unsubscribe: the sender's sends start
/// failing and no payload can reach a handler that no longer exists.
#[derive(Debug)]
pub struct ChannelSource {
    origin: ChannelOrigin,
    rx: mpsc::Receiver<Value>,
}

impl ChannelSource {
    pub fn new(origin: ChannelOrigin, rx: mpsc::Receiver<Value>) -> Self {
        ChannelSource { origin, rx }
    }

    pub fn origin(&self) -> ChannelOrigin {
        self.origin
    }

    /// Non-blocking drain of everything queued, in wire-arrival order.
    /// Returns all pending payloads (may be empty).
    pub fn drain(&self) -> Vec<Value> {
        let mut payloads = Vec::new();
        while let Ok(payload) = self.rx.try_recv() {
            payloads.push(payload);
        }
        payloads
    }
}

/// Create a connected sender/source pair for one channel
pub fn channel(origin: ChannelOrigin) -> (mpsc::Sender<Value>, ChannelSource) {
    let (tx, rx) = mpsc::channel();
    (tx, ChannelSource::new(origin, rx))
}
