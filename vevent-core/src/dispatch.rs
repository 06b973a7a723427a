//! Completion mailboxes for coordinator-owned state.
//!
//! Coordinators never let background work touch their fields. Every
//! asynchronous call (geocoding, login) runs as a task on an injected Tokio
//! runtime and finishes by posting a message into the owning coordinator's
//! [`Mailbox`]. The owner then drains the mailbox from its own execution
//! context (typically the UI thread) through a `&mut self` method, which is
//! the only place state is mutated.
//!
//! ```text
//! owner context                 runtime worker
//!     │  dispatch(task) ──────────▶  task.await
//!     │                               │
//!     │  ◀──────────── message ───────┘
//!     ▼
//! pump() / next_update()  →  state transition  →  watch observers
//! ```

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Identifier for one outbound asynchronous request.
///
/// Ids are allocated per mailbox and increase monotonically, so a larger id
/// was always issued later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Wraps a raw id received from the host.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner-side queue of completion messages.
///
/// The mailbox keeps its own sender alive, so [`Mailbox::next`] only
/// returns `None` if the runtime has been shut down underneath it.
pub struct Mailbox<M> {
    runtime: Handle,
    tx: mpsc::UnboundedSender<M>,
    rx: mpsc::UnboundedReceiver<M>,
    next_request: u64,
}

impl<M: Send + 'static> Mailbox<M> {
    /// Creates an empty mailbox whose tasks run on `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            tx,
            rx,
            next_request: 0,
        }
    }

    /// Allocates the next request id.
    pub fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    /// Returns a sender that external event sources can post through.
    #[must_use]
    pub fn sender(&self) -> MailboxSender<M> {
        MailboxSender {
            tx: self.tx.clone(),
        }
    }

    /// Runs `task` on the runtime and posts its output back to this mailbox.
    ///
    /// The task is detached: there is no cancellation, and if the owner is
    /// gone by the time the task finishes the message is dropped.
    pub fn dispatch<F>(&self, task: F)
    where
        F: Future<Output = M> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let message = task.await;
            if tx.send(message).is_err() {
                log::debug!("completion dropped: owner no longer listening");
            }
        });
    }

    /// Takes the next queued message without waiting.
    pub fn try_next(&mut self) -> Option<M> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next message.
    pub async fn next(&mut self) -> Option<M> {
        self.rx.recv().await
    }
}

impl<M> fmt::Debug for Mailbox<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("queued", &self.rx.len())
            .field("next_request", &self.next_request)
            .finish_non_exhaustive()
    }
}

/// Cloneable handle for posting into a [`Mailbox`] from any thread.
pub struct MailboxSender<M> {
    tx: mpsc::UnboundedSender<M>,
}

impl<M> MailboxSender<M> {
    /// Posts a message. Returns `false` if the mailbox has been dropped.
    pub fn post(&self, message: M) -> bool {
        self.tx.send(message).is_ok()
    }
}

impl<M> Clone for MailboxSender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> fmt::Debug for MailboxSender<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
