#![forbid(unsafe_code)]

//! Core primitives for deskpane: window-space geometry, input events, the
//! event-source seam to the host platform, and UI-thread affinity.

pub mod event;
pub mod geometry;
pub mod queue;
pub mod ui_thread;

pub use event::{
    DeferredTask, DispatchError, Event, EventSource, EventTarget, FetchError, KeyCode, KeyEvent,
    KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind, invoke_later,
};
pub use geometry::{Point, Rect, Size};
pub use queue::EventQueue;
pub use ui_thread::AffinityError;
