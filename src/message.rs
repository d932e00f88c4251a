// src/message.rs
//! The notification message and its dismissal lifecycle.
//!
//! A [`Message`] is a value object: the display content is immutable after
//! construction, while the dismissal state lives in a shared [`CloseState`]
//! so that a producer holding a clone of the message can observe (blocking
//! or via callback) when the displayed notification disappears, no matter
//! which thread delivers the dismissal.

use bitflags::bitflags;
use log::trace;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Default on-screen duration when the producer does not request one.
pub const DEFAULT_TIMEOUT_MS: u64 = 6000;

static NEXT_MSG_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique message identifier, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MsgId(pub u64);

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Identifier of the producer-owned notification handle a message belongs
/// to. Assigned by the registration layer; opaque to this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Composite id unique across all producers: owning client + message id.
///
/// Amendment targets use the same composite scheme, so a reference can only
/// ever resolve to a message from the same client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId {
    pub client: ClientId,
    pub msg: MsgId,
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.client, self.msg)
    }
}

bitflags! {
    /// How a message interacts with a prior notification on the same handle.
    ///
    /// The flags are not mutually exclusive: `APPEND` asks the display
    /// service to visually concatenate with a still-visible notification,
    /// `UPDATE` replaces the content of the existing handle in place.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RevisionFlags: u8 {
        const APPEND = 1 << 0;
        const UPDATE = 1 << 1;
    }
}

/// Why (or whether) a displayed notification went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Not dismissed yet.
    Pending,
    /// Timed out or dismissed normally by the user.
    Vanished,
    /// Closed programmatically.
    Explicit,
    /// Any other or unrecognized reason code.
    Unknown,
}

impl CloseReason {
    /// Maps a display-service reason code. `1` is a normal expiry/dismissal,
    /// `3` a programmatic close; everything else (including `-1`) is opaque.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => CloseReason::Vanished,
            3 => CloseReason::Explicit,
            _ => CloseReason::Unknown,
        }
    }
}

/// Callback invoked once with the vanished/not-vanished result.
pub type ClosedCallback = Box<dyn FnOnce(bool) + Send + 'static>;

struct CloseInner {
    reason: CloseReason,
    callbacks: Vec<ClosedCallback>,
}

/// Shared dismissal state of one message.
///
/// `resolve` is called from whatever thread delivers the display service's
/// dismissal event; `wait` and `notify_when_closed` are called from producer
/// threads. Callbacks are snapshotted and cleared before invocation and run
/// with no lock held, so a callback may register further callbacks or call
/// back into the scheduler.
pub struct CloseState {
    inner: Mutex<CloseInner>,
    closed: Condvar,
}

impl CloseState {
    fn new() -> Self {
        CloseState {
            inner: Mutex::new(CloseInner {
                reason: CloseReason::Pending,
                callbacks: Vec::new(),
            }),
            closed: Condvar::new(),
        }
    }

    /// Records the dismissal reason. The transition out of `Pending` happens
    /// exactly once; later calls are ignored.
    pub fn resolve(&self, reason: CloseReason) {
        let callbacks = {
            let mut inner = self.inner.lock().unwrap();
            if inner.reason != CloseReason::Pending {
                trace!("dismissal already resolved ({:?}), ignoring {:?}", inner.reason, reason);
                return;
            }
            inner.reason = reason;
            self.closed.notify_all();
            std::mem::take(&mut inner.callbacks)
        };
        let vanished = reason == CloseReason::Vanished;
        for callback in callbacks {
            callback(vanished);
        }
    }

    /// Blocks until resolved or `timeout` elapses. Returns whether the
    /// reason was [`CloseReason::Vanished`]; returns immediately if the
    /// dismissal already happened.
    pub fn wait(&self, timeout: Duration) -> bool {
        let guard = self.inner.lock().unwrap();
        let (inner, _timed_out) = self
            .closed
            .wait_timeout_while(guard, timeout, |inner| inner.reason == CloseReason::Pending)
            .unwrap();
        inner.reason == CloseReason::Vanished
    }

    /// Runs `callback` with the vanished result - synchronously if already
    /// resolved, otherwise when the dismissal arrives.
    pub fn notify_when_closed(&self, callback: ClosedCallback) {
        let mut inner = self.inner.lock().unwrap();
        if inner.reason == CloseReason::Pending {
            inner.callbacks.push(callback);
            return;
        }
        let vanished = inner.reason == CloseReason::Vanished;
        drop(inner);
        callback(vanished);
    }

    pub fn reason(&self) -> CloseReason {
        self.inner.lock().unwrap().reason
    }
}

/// One notification request plus its evolving lifecycle state.
///
/// Cloning is cheap in spirit: the dismissal state is shared, so a producer
/// keeps a clone while the scheduler owns another, and both observe the same
/// close reason.
#[derive(Clone)]
pub struct Message {
    id: MsgId,
    subject: String,
    body: String,
    icon: String,
    timeout: Duration,
    flags: RevisionFlags,
    reference: Option<MsgId>,
    closed: Arc<CloseState>,
}

impl Message {
    pub fn new(subject: impl Into<String>) -> Self {
        Message {
            id: MsgId(NEXT_MSG_ID.fetch_add(1, Ordering::Relaxed)),
            subject: subject.into(),
            body: String::new(),
            icon: String::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            flags: RevisionFlags::empty(),
            reference: None,
            closed: Arc::new(CloseState::new()),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Duration::from_millis(timeout_ms);
        self
    }

    /// Marks this message as a revision of `reference`. A `None` reference
    /// with non-empty flags is legal and simply never matches anything; the
    /// registration layer is responsible for resolving implicit targets
    /// before the message reaches this core.
    pub fn with_revision(mut self, flags: RevisionFlags, reference: Option<MsgId>) -> Self {
        self.flags = flags;
        self.reference = reference;
        self
    }

    pub fn id(&self) -> MsgId {
        self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn reference(&self) -> Option<MsgId> {
        self.reference
    }

    /// Whether this message wants to revise another one at all.
    pub fn is_revision(&self) -> bool {
        !self.flags.is_empty()
    }

    pub fn is_append(&self) -> bool {
        self.flags.contains(RevisionFlags::APPEND)
    }

    pub fn is_update(&self) -> bool {
        self.flags.contains(RevisionFlags::UPDATE)
    }

    pub(crate) fn close_state(&self) -> Arc<CloseState> {
        Arc::clone(&self.closed)
    }

    pub fn close_reason(&self) -> CloseReason {
        self.closed.reason()
    }

    /// Blocks the calling thread until the displayed notification is
    /// dismissed or the message's own timeout elapses. Returns whether the
    /// notification vanished normally.
    pub fn wait_for_closed(&self) -> bool {
        self.closed.wait(self.timeout)
    }

    /// Invokes `callback` with the vanished result once the notification is
    /// dismissed; synchronously if that already happened.
    pub fn notify_if_closed(&self, callback: impl FnOnce(bool) + Send + 'static) {
        self.closed.notify_when_closed(Box::new(callback));
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("subject", &self.subject)
            .field("timeout", &self.timeout)
            .field("flags", &self.flags)
            .field("reference", &self.reference)
            .finish()
    }
}

/// A message wrapped with routing metadata, as handed to the queue.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub client: ClientId,
    pub message: Message,
}

impl QueueItem {
    pub fn item_id(&self) -> ItemId {
        ItemId {
            client: self.client,
            msg: self.message.id(),
        }
    }

    /// The composite amendment target, scoped to the owning client.
    pub fn ref_id(&self) -> Option<ItemId> {
        self.message.reference().map(|msg| ItemId {
            client: self.client,
            msg,
        })
    }

    /// True iff this item carries a revision flag and targets `other`.
    pub fn revises(&self, other: ItemId) -> bool {
        self.message.is_revision() && self.ref_id() == Some(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Instant;

    #[test]
    fn ids_are_unique() {
        let a = Message::new("a");
        let b = Message::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn reason_code_mapping() {
        assert_eq!(CloseReason::from_code(1), CloseReason::Vanished);
        assert_eq!(CloseReason::from_code(3), CloseReason::Explicit);
        assert_eq!(CloseReason::from_code(-1), CloseReason::Unknown);
        assert_eq!(CloseReason::from_code(2), CloseReason::Unknown);
        assert_eq!(CloseReason::from_code(42), CloseReason::Unknown);
    }

    #[test]
    fn revises_requires_flag_and_matching_reference() {
        let client = ClientId(1);
        let a = QueueItem {
            client,
            message: Message::new("a"),
        };
        let plain = QueueItem {
            client,
            message: Message::new("b").with_revision(RevisionFlags::empty(), Some(a.message.id())),
        };
        assert!(!plain.revises(a.item_id()));

        let append = QueueItem {
            client,
            message: Message::new("b").with_revision(RevisionFlags::APPEND, Some(a.message.id())),
        };
        assert!(append.revises(a.item_id()));

        // same message id, different owning client
        let foreign = QueueItem {
            client: ClientId(2),
            message: Message::new("b").with_revision(RevisionFlags::APPEND, Some(a.message.id())),
        };
        assert!(!foreign.revises(a.item_id()));
    }

    #[test]
    fn unreferenced_revision_matches_nothing() {
        let a = QueueItem {
            client: ClientId(1),
            message: Message::new("a"),
        };
        let b = QueueItem {
            client: ClientId(1),
            message: Message::new("b").with_revision(RevisionFlags::APPEND, None),
        };
        assert!(b.message.is_revision());
        assert!(!b.revises(a.item_id()));
    }

    #[test]
    fn resolve_happens_exactly_once() {
        let message = Message::new("x");
        message.close_state().resolve(CloseReason::Vanished);
        message.close_state().resolve(CloseReason::Explicit);
        assert_eq!(message.close_reason(), CloseReason::Vanished);
    }

    #[test]
    fn wait_for_closed_after_dismissal_returns_stored_reason() {
        let vanished = Message::new("x").with_timeout_ms(50);
        vanished.close_state().resolve(CloseReason::Vanished);
        assert!(vanished.wait_for_closed());

        let explicit = Message::new("y").with_timeout_ms(50);
        explicit.close_state().resolve(CloseReason::Explicit);
        assert!(!explicit.wait_for_closed());

        let unknown = Message::new("z").with_timeout_ms(50);
        unknown.close_state().resolve(CloseReason::Unknown);
        assert!(!unknown.wait_for_closed());
    }

    #[test]
    fn wait_for_closed_blocks_until_resolution() {
        let message = Message::new("x").with_timeout_ms(5000);
        let state = message.close_state();
        let waiter = thread::spawn(move || message.wait_for_closed());
        thread::sleep(Duration::from_millis(50));
        state.resolve(CloseReason::Vanished);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn wait_for_closed_times_out_when_never_dismissed() {
        let message = Message::new("x").with_timeout_ms(50);
        let start = Instant::now();
        assert!(!message.wait_for_closed());
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(message.close_reason(), CloseReason::Pending);
    }

    #[test]
    fn notify_if_closed_after_dismissal_runs_synchronously() {
        let message = Message::new("x");
        message.close_state().resolve(CloseReason::Vanished);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = Arc::clone(&calls);
        message.notify_if_closed(move |vanished| {
            assert!(vanished);
            calls_in_cb.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notify_if_closed_fires_once_on_resolution() {
        let message = Message::new("x");
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = Arc::clone(&calls);
        message.notify_if_closed(move |vanished| {
            assert!(!vanished);
            calls_in_cb.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        message.close_state().resolve(CloseReason::Explicit);
        message.close_state().resolve(CloseReason::Explicit);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callbacks_may_register_further_callbacks() {
        // the listener list is snapshotted before invocation, so re-entrant
        // registration must not deadlock and must run synchronously
        let message = Message::new("x");
        let state = message.close_state();
        let calls = Arc::new(AtomicUsize::new(0));
        let outer_calls = Arc::clone(&calls);
        let inner_message = message.clone();
        message.notify_if_closed(move |_| {
            outer_calls.fetch_add(1, Ordering::SeqCst);
            let inner_calls = Arc::clone(&outer_calls);
            inner_message.notify_if_closed(move |_| {
                inner_calls.fetch_add(1, Ordering::SeqCst);
            });
        });
        state.resolve(CloseReason::Vanished);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
