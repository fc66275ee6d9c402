//! Publish/subscribe message transport
//!
//! The viewer consumes `(topic, payload)` messages through [`MessageSource`].
//! [`channel`] provides an in-process transport; network clients implement
//! the same trait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::frame::encode_points;
use livecloud_core::{Error, PointSet, Result};

/// A message delivered on a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// Trait for subscribing to topics and receiving messages without blocking
pub trait MessageSource {
    /// Start delivering messages published on `topic`
    fn subscribe(&mut self, topic: &str);

    /// Next pending message, or `None` when nothing is waiting or the source is closed
    fn try_next(&mut self) -> Result<Option<Message>>;

    /// Close the connection; later calls to `try_next` return `None`
    fn close(&mut self);

    /// Whether the connection is still open
    fn is_open(&self) -> bool;
}

/// Messages a channel holds before the publisher drops the oldest
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Create a connected in-process publisher/source pair holding at most
/// [`DEFAULT_CHANNEL_CAPACITY`] undelivered messages
pub fn channel() -> (ChannelPublisher, ChannelSource) {
    channel_with_capacity(DEFAULT_CHANNEL_CAPACITY)
}

/// Create a connected pair holding at most `capacity` undelivered messages.
///
/// When the source falls behind, publishing drops the oldest queued message
/// so the newest frame always gets through. A capacity of zero is raised to one.
pub fn channel_with_capacity(capacity: usize) -> (ChannelPublisher, ChannelSource) {
    let (tx, rx) = flume::bounded(capacity.max(1));
    let closed = Arc::new(AtomicBool::new(false));
    (
        ChannelPublisher {
            tx,
            backlog: rx.clone(),
            closed: Arc::clone(&closed),
        },
        ChannelSource {
            rx: Some(rx),
            subscriptions: Vec::new(),
            closed,
        },
    )
}

/// Publishing half of an in-process channel
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: flume::Sender<Message>,
    // Lets the publisher evict the oldest message when the channel is full
    backlog: flume::Receiver<Message>,
    closed: Arc<AtomicBool>,
}

impl ChannelPublisher {
    /// Publish a raw payload on `topic`, evicting the oldest queued message if full
    pub fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let mut message = Message::new(topic, payload);
        loop {
            if self.is_disconnected() {
                return Err(Error::Messaging(format!(
                    "Subscriber disconnected while publishing on '{}'",
                    topic
                )));
            }

            match self.tx.try_send(message) {
                Ok(()) => return Ok(()),
                Err(flume::TrySendError::Full(rejected)) => {
                    if let Ok(dropped) = self.backlog.try_recv() {
                        log::trace!("Channel full, dropped a message on '{}'", dropped.topic);
                    }
                    message = rejected;
                }
                Err(flume::TrySendError::Disconnected(rejected)) => {
                    self.closed.store(true, Ordering::Release);
                    message = rejected;
                }
            }
        }
    }

    /// Encode `points` in the frame wire format and publish them on `topic`
    pub fn publish_points(&self, topic: &str, points: &PointSet) -> Result<()> {
        self.publish(topic, encode_points(points))
    }

    /// Whether the receiving side has gone away
    pub fn is_disconnected(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Messages waiting to be received
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Subscribing half of an in-process channel
#[derive(Debug)]
pub struct ChannelSource {
    rx: Option<flume::Receiver<Message>>,
    subscriptions: Vec<String>,
    closed: Arc<AtomicBool>,
}

impl ChannelSource {
    /// Topics this source delivers
    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl MessageSource for ChannelSource {
    fn subscribe(&mut self, topic: &str) {
        if !self.subscriptions.iter().any(|t| t == topic) {
            log::info!("Subscribed to '{}'", topic);
            self.subscriptions.push(topic.to_string());
        }
    }

    fn try_next(&mut self) -> Result<Option<Message>> {
        loop {
            let Some(rx) = &self.rx else {
                return Ok(None);
            };

            match rx.try_recv() {
                Ok(message) => {
                    if self.subscriptions.iter().any(|t| *t == message.topic) {
                        return Ok(Some(message));
                    }
                }
                Err(flume::TryRecvError::Empty) => return Ok(None),
                Err(flume::TryRecvError::Disconnected) => {
                    log::info!("Publisher disconnected, closing source");
                    self.rx = None;
                    return Ok(None);
                }
            }
        }
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        if self.rx.take().is_some() {
            log::info!("Closed message source");
        }
    }

    fn is_open(&self) -> bool {
        self.rx.is_some()
    }
}
