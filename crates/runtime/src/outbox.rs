//! Best-effort, ordered command outbox.
//!
//! Key properties:
//! - `send` never blocks and never reports completion.
//! - Payloads are delivered in send order to the currently attached link.
//! - Unbounded: there is no backpressure signal back to the sender.
//! - With no link attached (or a link whose receiver is gone) the payload is
//!   dropped and counted, nothing else happens.
//! - Attaching a new link replaces the previous one.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::metrics::{SharedMetrics, names};

/// Sequence-numbered payload as seen by the draining side.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub seq: u64,
    pub payload: T,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LinkId(u64);

#[derive(Debug)]
struct Inner<T> {
    next_seq: u64,
    next_link: u64,
    link: Option<(LinkId, mpsc::UnboundedSender<Envelope<T>>)>,
}

#[derive(Debug)]
pub struct Outbox<T> {
    inner: Arc<Mutex<Inner<T>>>,
    metrics: SharedMetrics,
}

impl<T> Clone for Outbox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<T> Outbox<T> {
    pub fn new(metrics: SharedMetrics) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_seq: 1,
                next_link: 0,
                link: None,
            })),
            metrics,
        }
    }

    /// Attaches a fresh draining link, replacing any previous one.
    ///
    /// The receiver of a replaced link observes end-of-stream once it has
    /// drained what was already queued.
    pub fn attach(&self) -> (LinkId, mpsc::UnboundedReceiver<Envelope<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        let id = LinkId(inner.next_link);
        inner.next_link += 1;
        inner.link = Some((id, tx));
        (id, rx)
    }

    /// Detaches `link` if it is still the current one.
    pub fn detach(&self, link: LinkId) -> bool {
        let mut inner = self.inner.lock();
        let is_current = inner
            .link
            .as_ref()
            .is_some_and(|(current, _)| *current == link);
        if is_current {
            inner.link = None;
        }
        is_current
    }

    pub fn is_attached(&self) -> bool {
        self.inner.lock().link.is_some()
    }

    /// Enqueues `payload` for the attached link.
    ///
    /// Returns the assigned sequence number, or `None` if the payload was
    /// dropped for lack of a live link.
    pub fn send(&self, payload: T) -> Option<u64> {
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        let delivered = match &inner.link {
            Some((_, tx)) => tx.send(Envelope { seq, payload }).is_ok(),
            None => false,
        };

        if delivered {
            inner.next_seq += 1;
            drop(inner);
            self.metrics.lock().inc_counter(names::OUTBOX_SENT, 1);
            Some(seq)
        } else {
            // A closed receiver means the link is gone for good.
            inner.link = None;
            drop(inner);
            self.metrics.lock().inc_counter(names::OUTBOX_DROPPED, 1);
            None
        }
    }
}
