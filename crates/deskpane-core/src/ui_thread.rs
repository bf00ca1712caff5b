#![forbid(unsafe_code)]

//! UI-thread affinity.
//!
//! All dialog and pump state is `Rc`-based and therefore `!Send`, so it cannot
//! migrate between threads once built. What the type system cannot catch is
//! state built on the wrong thread in the first place. The host designates its
//! event thread once at startup; entry points that must run there call
//! [`ensure`] and fail fast otherwise.

use std::cell::Cell;
use std::thread;

thread_local! {
    static IS_UI_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// The calling thread is not the designated UI thread.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not on the UI thread (current thread: {thread})")]
pub struct AffinityError {
    pub thread: String,
}

/// Mark the calling thread as the UI thread.
pub fn designate() {
    IS_UI_THREAD.with(|flag| flag.set(true));
}

/// Whether the calling thread has been designated.
pub fn is_ui_thread() -> bool {
    IS_UI_THREAD.with(Cell::get)
}

/// Fail unless called on the UI thread.
///
/// # Errors
///
/// Returns [`AffinityError`] naming the offending thread.
pub fn ensure() -> Result<(), AffinityError> {
    if is_ui_thread() {
        Ok(())
    } else {
        Err(AffinityError {
            thread: current_thread_name(),
        })
    }
}

/// The calling thread's name, or its id when it has none.
pub fn current_thread_name() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_owned(),
        None => format!("{:?}", current.id()),
    }
}
