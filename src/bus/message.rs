//! Messages and their reply channel.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::envelope::reply::EMPTY_REPLY;

/// One inbound message delivered to a subscriber.
#[derive(Debug)]
pub struct Message {
    /// Unique per delivered copy, used to correlate log lines.
    pub id: Uuid,
    pub subject: String,
    pub data: Vec<u8>,
    reply: ReplyHandle,
}

impl Message {
    pub(crate) fn new(subject: &str, data: Vec<u8>, reply: ReplyHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            data,
            reply,
        }
    }

    /// A standalone message plus the receiving end of its reply channel.
    pub fn with_reply(subject: &str, data: Vec<u8>) -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(subject, data, ReplyHandle::new(Some(tx))), rx)
    }

    /// Split into the payload and the reply handle.
    pub fn into_parts(self) -> (Vec<u8>, ReplyHandle) {
        (self.data, self.reply)
    }

    pub(crate) fn disarm(&mut self) {
        self.reply.tx = None;
    }
}

/// The implicit reply channel of one message.
///
/// Replies exactly once: either through [`ReplyHandle::respond`], or with `{}`
/// when the handle is dropped unanswered (early return, error, panic unwind).
#[derive(Debug)]
pub struct ReplyHandle {
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl ReplyHandle {
    pub(crate) fn new(tx: Option<mpsc::UnboundedSender<Vec<u8>>>) -> Self {
        Self { tx }
    }

    /// False for fire-and-forget messages.
    pub fn expects_reply(&self) -> bool {
        self.tx.is_some()
    }

    /// Send the reply, consuming the handle.
    pub fn respond(mut self, data: Vec<u8>) {
        if let Some(tx) = self.tx.take() {
            // The requester may have given up; nothing to do then.
            let _ = tx.send(data);
        }
    }
}

impl Drop for ReplyHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            tracing::trace!("Reply handle dropped unanswered, sending empty reply");
            let _ = tx.send(EMPTY_REPLY.to_vec());
        }
    }
}
