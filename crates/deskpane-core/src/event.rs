#![forbid(unsafe_code)]

//! Input events and the seams to the host platform's event machinery.
//!
//! The subsystem never owns the platform event loop. It pulls events from an
//! [`EventSource`] and hands non-deferred events to an [`EventTarget`], which
//! is how widgets see exactly the events they would see outside a modal
//! session.
//!
//! Deferred work ("run this after the current event finishes") travels through
//! the same source as an [`Event::Deferred`] task, so it is ordered with
//! respect to input exactly as the platform orders it.

use std::fmt;

use bitflags::bitflags;

use crate::geometry::{Point, Rect};

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const SUPER = 0b1000;
    }
}

/// Key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    F(u8),
}

/// Press vs. release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press without modifiers.
    pub const fn press(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Moved,
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub position: Point,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub const fn new(kind: MouseEventKind, position: Point) -> Self {
        Self {
            kind,
            position,
            modifiers: Modifiers::empty(),
        }
    }
}

/// A unit of work queued to run after the current event.
///
/// Tasks carry a static label so diagnostics can name them.
pub struct DeferredTask {
    label: &'static str,
    run: Box<dyn FnOnce()>,
}

impl DeferredTask {
    pub fn new(label: &'static str, run: impl FnOnce() + 'static) -> Self {
        Self {
            label,
            run: Box::new(run),
        }
    }

    /// Diagnostic label given at construction.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Consume and execute the task.
    pub fn run(self) {
        (self.run)()
    }
}

impl fmt::Debug for DeferredTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeferredTask").field(&self.label).finish()
    }
}

/// An event pulled from the platform source.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Repaint request for a window-space area.
    Paint(Rect),
    /// Timer tick carrying a platform timer id.
    Tick(u64),
    /// Work posted with "invoke later" semantics. Runs itself on dispatch.
    Deferred(DeferredTask),
}

/// Why the next event could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The wait was interrupted. Callers treat this as spurious and retry.
    #[error("event fetch interrupted")]
    Interrupted,
    /// No event will ever arrive again (the platform loop is shutting down).
    #[error("event source closed")]
    Closed,
}

/// A non-fatal failure while dispatching one event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dispatch failed: {message}")]
pub struct DispatchError {
    pub message: String,
}

impl DispatchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The platform's single shared event queue.
pub trait EventSource {
    /// Block until the next event is available.
    ///
    /// # Errors
    ///
    /// [`FetchError::Interrupted`] for a spurious wakeup,
    /// [`FetchError::Closed`] once no further events can arrive.
    fn next_event(&self) -> Result<Event, FetchError>;

    /// Return the next event if one is ready, without blocking.
    fn poll_event(&self) -> Option<Event>;

    /// Append an event to the back of the queue.
    fn post(&self, event: Event);

    /// Queue `run` to execute after every event already queued.
    fn invoke_later(&self, label: &'static str, run: impl FnOnce() + 'static)
    where
        Self: Sized,
    {
        self.post(Event::Deferred(DeferredTask::new(label, run)));
    }
}

/// Queue `run` through a type-erased source.
pub fn invoke_later(source: &dyn EventSource, label: &'static str, run: impl FnOnce() + 'static) {
    source.post(Event::Deferred(DeferredTask::new(label, run)));
}

/// Where non-deferred events go once fetched.
pub trait EventTarget {
    /// Deliver `event` through the platform's normal dispatch path.
    ///
    /// # Errors
    ///
    /// A [`DispatchError`] is logged by the caller and never aborts a loop.
    fn dispatch(&self, event: Event) -> Result<(), DispatchError>;
}

impl<F> EventTarget for F
where
    F: Fn(Event) -> Result<(), DispatchError>,
{
    fn dispatch(&self, event: Event) -> Result<(), DispatchError> {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn deferred_task_runs_once_consumed() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let task = DeferredTask::new("bump", move || h.set(h.get() + 1));
        assert_eq!(task.label(), "bump");
        task.run();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn deferred_debug_shows_label() {
        let event = Event::Deferred(DeferredTask::new("restore-focus", || {}));
        assert_eq!(format!("{event:?}"), "Deferred(DeferredTask(\"restore-focus\"))");
    }

    #[test]
    fn closure_is_an_event_target() {
        let seen = Rc::new(Cell::new(0u64));
        let s = Rc::clone(&seen);
        let target = move |event: Event| {
            if let Event::Tick(id) = event {
                s.set(id);
                Ok(())
            } else {
                Err(DispatchError::new("unexpected"))
            }
        };
        assert!(target.dispatch(Event::Tick(7)).is_ok());
        assert_eq!(seen.get(), 7);
        let err = target.dispatch(Event::Paint(Rect::default())).unwrap_err();
        assert_eq!(err.to_string(), "dispatch failed: unexpected");
    }

    #[test]
    fn key_press_has_no_modifiers() {
        let key = KeyEvent::press(KeyCode::Escape);
        assert_eq!(key.kind, KeyEventKind::Press);
        assert!(key.modifiers.is_empty());
    }
}
