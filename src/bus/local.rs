//! In-process subject bus with queue groups and request/reply.
//!
//! # Responsibilities
//! - Register queue-group subscriptions per subject
//! - Deliver each message to one member of every queue group
//! - Return the first reply to a requester, or fail with no responders / timeout
//!
//! # Design Decisions
//! - Unbounded delivery queues; the publisher's rate is the only bound
//! - Member choice within a group is uniform random
//! - Dropping a subscription unregisters it; queued messages get `{}` replies

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::bus::message::{Message, ReplyHandle};

/// Global counter for subscription IDs.
static SUBSCRIPTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Errors returned to a requester.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("no responders on subject '{0}'")]
    NoResponders(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("reply channel closed without a reply")]
    Closed,
}

#[derive(Debug)]
struct Member {
    id: u64,
    tx: mpsc::UnboundedSender<Message>,
}

/// subject → queue group → members
type SubjectTable = DashMap<String, HashMap<String, Vec<Member>>>;

/// Cheaply cloneable handle to a shared bus.
#[derive(Debug, Clone, Default)]
pub struct Bus {
    subjects: Arc<SubjectTable>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join `queue_group` on `subject`.
    pub fn subscribe(&self, subject: &str, queue_group: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SUBSCRIPTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        self.subjects
            .entry(subject.to_string())
            .or_default()
            .entry(queue_group.to_string())
            .or_default()
            .push(Member { id, tx });

        tracing::debug!(subject = %subject, queue_group = %queue_group, id, "Subscribed");

        Subscription {
            bus: self.clone(),
            subject: subject.to_string(),
            queue_group: queue_group.to_string(),
            id,
            rx,
        }
    }

    /// Number of live subscriptions on `subject`, across groups.
    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.subjects
            .get(subject)
            .map(|groups| groups.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Fire-and-forget publish. Returns the number of copies delivered.
    pub fn publish(&self, subject: &str, data: Vec<u8>) -> usize {
        self.deliver(subject, data, None)
    }

    /// Publish and wait for the first reply.
    pub async fn request(
        &self,
        subject: &str,
        data: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, BusError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        if self.deliver(subject, data, Some(tx)) == 0 {
            return Err(BusError::NoResponders(subject.to_string()));
        }

        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(BusError::Closed),
            Err(_) => Err(BusError::Timeout(timeout)),
        }
    }

    fn deliver(
        &self,
        subject: &str,
        data: Vec<u8>,
        reply: Option<mpsc::UnboundedSender<Vec<u8>>>,
    ) -> usize {
        let Some(mut groups) = self.subjects.get_mut(subject) else {
            return 0;
        };

        let mut delivered = 0;
        for members in groups.values_mut() {
            members.retain(|m| !m.tx.is_closed());
            if members.is_empty() {
                continue;
            }
            let member = &members[fastrand::usize(..members.len())];
            let message = Message::new(subject, data.clone(), ReplyHandle::new(reply.clone()));
            match member.tx.send(message) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::SendError(mut undelivered)) => undelivered.disarm(),
            }
        }
        delivered
    }

    fn remove(&self, subject: &str, queue_group: &str, id: u64) {
        if let Some(mut groups) = self.subjects.get_mut(subject) {
            if let Some(members) = groups.get_mut(queue_group) {
                members.retain(|m| m.id != id);
                if members.is_empty() {
                    groups.remove(queue_group);
                }
            }
        }
        self.subjects.remove_if(subject, |_, groups| groups.is_empty());
    }
}

/// A queue-group membership. Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    bus: Bus,
    subject: String,
    queue_group: String,
    id: u64,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Subscription {
    /// Next delivered message, or `None` once the subscription can receive no more.
    pub async fn next(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn queue_group(&self) -> &str {
        &self.queue_group
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.remove(&self.subject, &self.queue_group, self.id);
        tracing::debug!(subject = %self.subject, id = self.id, "Unsubscribed");
    }
}
