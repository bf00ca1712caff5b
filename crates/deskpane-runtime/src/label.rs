#![forbid(unsafe_code)]

//! Diagnostic execution labels.
//!
//! While a modal pump runs, the UI thread is conceptually "inside" that modal
//! session. Rust cannot rename a running thread, so the session name is kept
//! in a thread-local stack instead: [`current_label`] reports the innermost
//! label (or the thread's own name outside any session) and the
//! [`LabelGuard`] restores the previous label when dropped.

use std::cell::RefCell;

use deskpane_core::ui_thread::current_thread_name;

thread_local! {
    static LABELS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// The innermost active label, or the thread name when none is active.
#[must_use]
pub fn current_label() -> String {
    LABELS
        .with(|labels| labels.borrow().last().cloned())
        .unwrap_or_else(current_thread_name)
}

/// Number of labels currently stacked on this thread.
#[must_use]
pub fn depth() -> usize {
    LABELS.with(|labels| labels.borrow().len())
}

/// RAII guard for a pushed label. Dropping it restores the previous label.
#[must_use = "dropping this guard restores the previous label"]
#[derive(Debug)]
pub struct LabelGuard {
    label: String,
}

impl LabelGuard {
    /// Push `label` as the current label.
    pub fn push(label: impl Into<String>) -> Self {
        let label = label.into();
        LABELS.with(|labels| labels.borrow_mut().push(label.clone()));
        Self { label }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for LabelGuard {
    fn drop(&mut self) {
        let popped = LABELS.with(|labels| labels.borrow_mut().pop());
        if let Some(popped) = popped {
            debug_assert_eq!(popped, self.label);
        }
    }
}
