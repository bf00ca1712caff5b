#![forbid(unsafe_code)]

//! Internal dialogs and the per-window modal stack.
//!
//! A [`Dialog`] floats inside its [`HostWindow`](crate::host::HostWindow).
//! Non-modal dialogs share the default layer; modal dialogs are stacked by the
//! window's [`ModalCoordinator`], each with an input blocker directly beneath
//! it. [`Dialog::show`] returns a [`Completion`] that resolves when the dialog
//! is removed; [`Dialog::show_and_wait`] additionally runs a nested
//! [`ModalPump`](deskpane_runtime::ModalPump) so the caller blocks until the
//! dialog closes while the UI stays live.

mod completion;
mod coordinator;
mod dialog;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use completion::Completion;
pub use coordinator::{BlockerObserver, ModalCoordinator, ModalEntry};
pub use dialog::{CloseHandler, Dialog, DialogState, ShowOptions};

static DIALOG_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogId(u64);

impl DialogId {
    pub(crate) fn next() -> Self {
        Self(DIALOG_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuild an id from its raw value, e.g. one read back from a log.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog#{}", self.0)
    }
}

/// Outcome reported by a closed dialog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogResult {
    /// Closed without an explicit outcome.
    #[default]
    Dismissed,
    Ok,
    Cancel,
    /// Custom button pressed, with its id.
    Custom(String),
    /// Prompt submitted with its input value.
    Input(String),
}

impl DialogResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Input value for prompt results.
    pub fn input(&self) -> Option<&str> {
        match self {
            Self::Input(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = DialogId::next();
        let b = DialogId::next();
        assert_ne!(a, b);
        assert!(b.id() > a.id());
        assert_eq!(DialogId::from_raw(a.id()), a);
    }

    #[test]
    fn result_helpers() {
        assert_eq!(DialogResult::default(), DialogResult::Dismissed);
        assert!(DialogResult::Ok.is_ok());
        assert_eq!(DialogResult::Input("x".into()).input(), Some("x"));
        assert_eq!(DialogResult::Cancel.input(), None);
    }
}
