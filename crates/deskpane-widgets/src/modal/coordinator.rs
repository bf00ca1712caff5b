#![forbid(unsafe_code)]

//! Per-window modal stack with layer assignment.
//!
//! Each open modal dialog owns one [`ModalEntry`]. The first entry sits on
//! the configured base modal layer; every nested entry sits
//! `modal_layer_step` above its parent, and its input blocker sits on the
//! layer directly below it. Entries are popped strictly LIFO.
//!
//! # Invariants
//!
//! - `entries` is ordered by layer (lowest to highest).
//! - Layers are strictly increasing along the stack.
//! - `pop` only ever removes the top entry; anything else is an error and
//!   leaves the stack untouched.

use std::fmt;
use std::rc::Rc;

use crate::config::DesktopConfig;
use crate::error::DeskError;
use crate::layers::InputBlocker;
use crate::modal::DialogId;

/// Layer assignment for one modal dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalEntry {
    dialog: DialogId,
    layer: i32,
}

impl ModalEntry {
    pub fn dialog(&self) -> DialogId {
        self.dialog
    }

    /// Layer of the dialog itself.
    pub fn layer(&self) -> i32 {
        self.layer
    }

    /// Layer of the dialog's input blocker.
    pub fn blocker_layer(&self) -> i32 {
        self.layer - 1
    }
}

/// Observer for input blocker lifecycles, e.g. to dim the background.
pub trait BlockerObserver {
    fn blocker_created(&self, blocker: &InputBlocker);
    fn blocker_finished(&self, blocker: &InputBlocker);
}

/// Modal stack for one host window.
pub struct ModalCoordinator {
    entries: Vec<ModalEntry>,
    base_layer: i32,
    step: i32,
    observer: Option<Rc<dyn BlockerObserver>>,
}

impl fmt::Debug for ModalCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalCoordinator")
            .field("entries", &self.entries)
            .field("base_layer", &self.base_layer)
            .field("step", &self.step)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for ModalCoordinator {
    fn default() -> Self {
        Self::new(&DesktopConfig::default())
    }
}

impl ModalCoordinator {
    pub fn new(cfg: &DesktopConfig) -> Self {
        let cfg = cfg.sanitized();
        Self {
            entries: Vec::new(),
            base_layer: cfg.base_modal_layer,
            step: cfg.modal_layer_step,
            observer: None,
        }
    }

    /// Allocate the next entry for `dialog`.
    pub fn push(&mut self, dialog: DialogId) -> ModalEntry {
        let layer = match self.entries.last() {
            Some(parent) => parent.layer + self.step,
            None => self.base_layer,
        };
        let entry = ModalEntry { dialog, layer };
        self.entries.push(entry);
        tracing::debug!(?dialog, layer, depth = self.entries.len(), "modal entry pushed");
        entry
    }

    /// Pop `dialog`'s entry, which must be on top.
    ///
    /// # Errors
    ///
    /// [`DeskError::ModalOrder`] if `dialog` is not the top entry; the stack
    /// is left unchanged.
    pub fn pop(&mut self, dialog: DialogId) -> Result<ModalEntry, DeskError> {
        self.check_top(dialog)?;
        let entry = self.entries.pop().ok_or(DeskError::ModalOrder { dialog, top: None })?;
        tracing::debug!(?dialog, layer = entry.layer, depth = self.entries.len(), "modal entry popped");
        Ok(entry)
    }

    /// Verify `dialog` may end its session now.
    ///
    /// # Errors
    ///
    /// [`DeskError::ModalOrder`] if `dialog` is not the top entry.
    pub fn check_top(&self, dialog: DialogId) -> Result<(), DeskError> {
        match self.entries.last() {
            Some(top) if top.dialog == dialog => Ok(()),
            top => Err(DeskError::ModalOrder {
                dialog,
                top: top.map(|e| e.dialog),
            }),
        }
    }

    pub fn top(&self) -> Option<ModalEntry> {
        self.entries.last().copied()
    }

    pub fn entry(&self, dialog: DialogId) -> Option<ModalEntry> {
        self.entries.iter().find(|e| e.dialog == dialog).copied()
    }

    pub fn contains(&self, dialog: DialogId) -> bool {
        self.entry(dialog).is_some()
    }

    /// Entries from bottom to top.
    pub fn entries(&self) -> &[ModalEntry] {
        &self.entries
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_blocker_observer(&mut self, observer: Option<Rc<dyn BlockerObserver>>) {
        self.observer = observer;
    }

    /// Clone of the observer, for notifying outside any borrow.
    pub fn blocker_observer(&self) -> Option<Rc<dyn BlockerObserver>> {
        self.observer.clone()
    }
}
