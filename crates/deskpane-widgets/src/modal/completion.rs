#![forbid(unsafe_code)]

//! Completion future for a dialog session.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use super::DialogResult;

#[derive(Debug, Default)]
struct Slot {
    result: Option<DialogResult>,
    waker: Option<Waker>,
}

/// Resolves to the dialog's [`DialogResult`] once the dialog is removed.
///
/// Clones observe the same session. Polling after resolution keeps returning
/// the same result.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    slot: Rc<RefCell<Slot>>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resolve the session. Later calls are ignored.
    pub(crate) fn resolve(&self, result: DialogResult) {
        let waker = {
            let mut slot = self.slot.borrow_mut();
            if slot.result.is_some() {
                return;
            }
            slot.result = Some(result);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.borrow().result.is_some()
    }

    /// The result, if the dialog has closed.
    pub fn try_result(&self) -> Option<DialogResult> {
        self.slot.borrow().result.clone()
    }
}

impl Future for Completion {
    type Output = DialogResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match &slot.result {
            Some(result) => Poll::Ready(result.clone()),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
