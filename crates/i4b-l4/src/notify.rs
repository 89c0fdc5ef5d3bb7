//! Message queue towards the userland daemon
//!
//! Messages are only queued while a daemon is attached. The normal queue is
//! bounded and drops its oldest message when full; controller level events
//! go to a separate queue that the reader drains first.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use i4b_msgs::Notification;

struct Queue {
    tx: Sender<Notification>,
    /// Kept to discard the oldest message when the queue is full
    rx: Receiver<Notification>,
}

impl Queue {
    fn new(len: usize) -> Self {
        let (tx, rx) = bounded(len);
        Self { tx, rx }
    }

    /// Returns false if the message was dropped
    fn push(&self, msg: Notification) -> bool {
        let msg = match self.tx.try_send(msg) {
            Ok(()) => return true,
            Err(TrySendError::Full(msg)) => msg,
            Err(TrySendError::Disconnected(_)) => return false,
        };
        if let Ok(old) = self.rx.try_recv() {
            tracing::warn!("queue full, dropped {}", old);
        }
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("queue full, dropped {}", e.into_inner());
                false
            }
        }
    }
}

struct Queues {
    normal: Queue,
    hipri: Queue,
}

pub struct NotificationQueue {
    queue_len: usize,
    /// Present while a daemon is attached
    open: Option<Queues>,
}

impl NotificationQueue {
    pub fn new(queue_len: usize) -> Self {
        Self { queue_len, open: None }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Start accepting messages. Replaces the queues of a previous daemon.
    pub fn open(&mut self) -> DaemonReader {
        let queues = Queues {
            normal: Queue::new(self.queue_len),
            hipri: Queue::new(self.queue_len),
        };
        let reader = DaemonReader {
            normal: queues.normal.rx.clone(),
            hipri: queues.hipri.rx.clone(),
        };
        self.open = Some(queues);
        reader
    }

    /// Stop accepting messages. Readers still get what was queued, then the
    /// end of the stream.
    pub fn close(&mut self) {
        self.open = None;
    }

    /// Queue a message for the daemon. Returns false if it was dropped.
    pub fn push(&mut self, msg: Notification) -> bool {
        let Some(queues) = &self.open else {
            tracing::trace!("no daemon, dropped {}", msg);
            return false;
        };
        tracing::debug!("-> daemon {}", msg);
        if msg.msg.is_hipri() {
            queues.hipri.push(msg)
        } else {
            queues.normal.push(msg)
        }
    }

    /// Number of messages waiting to be read
    pub fn pending(&self) -> usize {
        self.open
            .as_ref()
            .map_or(0, |q| q.normal.rx.len() + q.hipri.rx.len())
    }
}

/// Reading end of the daemon message queue. May be moved to another thread.
#[derive(Clone)]
pub struct DaemonReader {
    normal: Receiver<Notification>,
    hipri: Receiver<Notification>,
}

impl DaemonReader {
    /// Next message if one is waiting, controller events first
    pub fn try_read(&self) -> Option<Notification> {
        match self.hipri.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => self.normal.try_recv().ok(),
        }
    }

    /// Wait up to `timeout` for a message
    pub fn read_timeout(&self, timeout: Duration) -> Option<Notification> {
        if let Some(msg) = self.try_read() {
            return Some(msg);
        }
        let msg = crossbeam_channel::select! {
            recv(self.hipri) -> msg => msg.ok(),
            recv(self.normal) -> msg => msg.ok(),
            default(timeout) => None,
        };
        msg.or_else(|| self.try_read())
    }

    /// Wait for the next message. Returns `None` once the daemon was
    /// detached and all messages were read.
    pub fn read(&self) -> Option<Notification> {
        if let Some(msg) = self.try_read() {
            return Some(msg);
        }
        let msg = crossbeam_channel::select! {
            recv(self.hipri) -> msg => msg.ok(),
            recv(self.normal) -> msg => msg.ok(),
        };
        msg.or_else(|| self.try_read())
    }

    /// Read everything that is currently queued
    pub fn drain(&self) -> Vec<Notification> {
        std::iter::from_fn(|| self.try_read()).collect()
    }
}
