#![forbid(unsafe_code)]

//! In-memory, single-threaded [`EventSource`].
//!
//! Used when the host drives its own loop (headless hosts, embedding in a
//! foreign loop) and by tests. Events are FIFO. When the queue runs dry the
//! optional idle hook is asked for the next event; this is where a host polls
//! its platform or a test feeds its script. If the hook has nothing either,
//! the queue reports [`FetchError::Closed`] because nothing else on this
//! thread can ever post to it while the caller is blocked.
//!
//! # Invariants
//!
//! 1. Queued events are always delivered before the idle hook is consulted.
//! 2. Events posted while an event is being dispatched are delivered after
//!    every event that was already queued.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use crate::event::{Event, EventSource, FetchError};

type IdleHook = Box<dyn FnMut() -> Option<Event>>;

/// FIFO event queue with an optional idle hook.
#[derive(Default)]
pub struct EventQueue {
    pending: RefCell<VecDeque<Event>>,
    idle: RefCell<Option<IdleHook>>,
    interrupt: Cell<bool>,
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.pending.borrow().len())
            .field("has_idle_hook", &self.idle.borrow().is_some())
            .finish()
    }
}

impl EventQueue {
    /// Create an empty queue without an idle hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the hook consulted when the queue is empty.
    #[must_use]
    pub fn with_idle(self, hook: impl FnMut() -> Option<Event> + 'static) -> Self {
        self.set_idle(hook);
        self
    }

    /// Replace the idle hook.
    pub fn set_idle(&self, hook: impl FnMut() -> Option<Event> + 'static) {
        *self.idle.borrow_mut() = Some(Box::new(hook));
    }

    /// Remove the idle hook.
    pub fn clear_idle(&self) {
        self.idle.borrow_mut().take();
    }

    /// Make the next blocking fetch fail with [`FetchError::Interrupted`].
    pub fn interrupt(&self) {
        self.interrupt.set(true);
    }

    /// Number of queued events (idle hook not counted).
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    fn from_idle(&self) -> Option<Event> {
        // The hook is taken out while it runs so it may post or even replace
        // itself without a double borrow.
        let mut hook = self.idle.borrow_mut().take()?;
        let event = hook();
        let mut slot = self.idle.borrow_mut();
        if slot.is_none() {
            *slot = Some(hook);
        }
        event
    }
}

impl EventSource for EventQueue {
    fn next_event(&self) -> Result<Event, FetchError> {
        if self.interrupt.replace(false) {
            return Err(FetchError::Interrupted);
        }
        match self.poll_event() {
            Some(event) => Ok(event),
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!("event queue drained with no idle event");
                Err(FetchError::Closed)
            }
        }
    }

    fn poll_event(&self) -> Option<Event> {
        let queued = self.pending.borrow_mut().pop_front();
        // Anything the hook posts lands after the event it returns.
        queued.or_else(|| self.from_idle())
    }

    fn post(&self, event: Event) {
        self.pending.borrow_mut().push_back(event);
    }
}
