#![forbid(unsafe_code)]

//! Nested, re-entrant modal event pump.
//!
//! A [`ModalPump`] keeps the UI alive while the code that started it is
//! suspended on the call stack: it repeatedly pulls the next event from the
//! shared [`EventSource`] and dispatches it exactly as the normal loop would,
//! until [`PumpHandle::stop`] clears its running flag.
//!
//! # Invariants
//!
//! 1. `run` only executes on the designated UI thread.
//! 2. Each pump instance has its own running flag; stopping an inner pump
//!    never stops an outer one.
//! 3. An inner `run` returns completely before the outer loop fetches again.
//! 4. An event fetched before a stop is observed is still dispatched, never
//!    re-queued; the loop exits right after it.
//! 5. An escapable pump delivers its ending key or click before stopping.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Called off the UI thread | `Err(PumpError::NotUiThread)`, nothing runs |
//! | Same instance re-entered | `Err(PumpError::AlreadyRunning)` |
//! | Fetch interrupted | Swallowed, loop retries |
//! | Dispatch error | Logged at debug, loop continues |
//! | Source closed | Logged at warn, returns [`PumpExit::SourceClosed`] |

use std::cell::Cell;
use std::rc::Rc;

use deskpane_core::event::{
    DispatchError, Event, EventSource, EventTarget, FetchError, KeyCode, KeyEventKind, Modifiers,
    MouseButton, MouseEventKind,
};
use deskpane_core::ui_thread;

use crate::label::LabelGuard;

/// Errors that prevent a pump from starting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PumpError {
    #[error("modal pump started off the UI thread ({thread})")]
    NotUiThread { thread: String },
    #[error("modal pump Modal-{seq} is already running")]
    AlreadyRunning { seq: u64 },
}

impl From<ui_thread::AffinityError> for PumpError {
    fn from(err: ui_thread::AffinityError) -> Self {
        Self::NotUiThread { thread: err.thread }
    }
}

/// How a pump loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// `stop` was called.
    Stopped,
    /// The event source closed while the pump was still running.
    SourceClosed,
}

/// Cloneable stop switch for one pump instance.
#[derive(Debug, Clone)]
pub struct PumpHandle {
    seq: u64,
    running: Rc<Cell<bool>>,
}

impl PumpHandle {
    /// Request the loop to end. Takes effect after the next event is
    /// delivered; the pump may still be on the stack when this returns.
    pub fn stop(&self) {
        tracing::debug!(seq = self.seq, "modal pump stop requested");
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether both handles control the same pump.
    pub fn same_pump(&self, other: &PumpHandle) -> bool {
        Rc::ptr_eq(&self.running, &other.running)
    }
}

/// A nested event loop bound to one modal session.
#[derive(Debug)]
pub struct ModalPump {
    seq: u64,
    running: Rc<Cell<bool>>,
    active: Cell<bool>,
    escapable: bool,
}

impl ModalPump {
    /// Create an idle pump with the given diagnostic sequence number.
    #[must_use]
    pub fn new(seq: u64) -> Self {
        Self {
            seq,
            running: Rc::new(Cell::new(false)),
            active: Cell::new(false),
            escapable: false,
        }
    }

    /// Also end the loop on Delete, Backspace or Space, or when a
    /// non-primary mouse button is released without Shift or Ctrl.
    #[must_use]
    pub fn escapable(mut self) -> Self {
        self.escapable = true;
        self
    }

    pub fn is_escapable(&self) -> bool {
        self.escapable
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Diagnostic name shown while this pump runs.
    pub fn label(&self) -> String {
        format!("Modal-{}", self.seq)
    }

    #[must_use]
    pub fn handle(&self) -> PumpHandle {
        PumpHandle {
            seq: self.seq,
            running: Rc::clone(&self.running),
        }
    }

    pub fn stop(&self) {
        self.handle().stop();
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Pull and dispatch events until stopped.
    ///
    /// Deferred tasks run inline; every other event goes to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`PumpError`] only when the loop could not start.
    pub fn run(
        &self,
        source: &dyn EventSource,
        target: &dyn EventTarget,
    ) -> Result<PumpExit, PumpError> {
        ui_thread::ensure()?;
        if self.active.replace(true) {
            return Err(PumpError::AlreadyRunning { seq: self.seq });
        }
        self.running.set(true);

        let _label = LabelGuard::push(self.label());
        let _span = tracing::debug_span!("modal_pump", seq = self.seq).entered();
        tracing::debug!("modal pump started");

        let exit = loop {
            if !self.running.get() {
                break PumpExit::Stopped;
            }
            match source.next_event() {
                Ok(event) => {
                    if !self.running.get() {
                        tracing::warn!(?event, "dispatching after the pump was stopped");
                    }
                    let escape = self.escapable && ends_escapable(&event);
                    dispatch_one(event, target);
                    if escape {
                        tracing::debug!("escape input ended modal pump");
                        self.running.set(false);
                    }
                }
                Err(FetchError::Interrupted) => continue,
                Err(FetchError::Closed) => {
                    tracing::warn!("event source closed under a running modal pump");
                    self.running.set(false);
                    break PumpExit::SourceClosed;
                }
            }
        };

        tracing::debug!(?exit, "modal pump ended");
        self.active.set(false);
        Ok(exit)
    }
}

fn ends_escapable(event: &Event) -> bool {
    match event {
        Event::Key(key) => {
            key.kind == KeyEventKind::Press
                && key.modifiers.is_empty()
                && matches!(
                    key.code,
                    KeyCode::Delete | KeyCode::Backspace | KeyCode::Char(' ')
                )
        }
        Event::Mouse(mouse) => {
            matches!(
                mouse.kind,
                MouseEventKind::Up(MouseButton::Right | MouseButton::Middle)
            ) && !mouse.modifiers.intersects(Modifiers::SHIFT | Modifiers::CTRL)
        }
        _ => false,
    }
}

/// Deliver one event: deferred tasks run themselves, the rest go to `target`.
pub fn dispatch_one(event: Event, target: &dyn EventTarget) {
    match event {
        Event::Deferred(task) => {
            tracing::trace!(task = task.label(), "running deferred task");
            task.run();
        }
        other => {
            if let Err(err) = target.dispatch(other) {
                tracing::debug!(%err, "event dispatch failed");
            }
        }
    }
}

/// Dispatch every event that is ready right now, outside any modal session.
///
/// Returns the number of events delivered.
pub fn drain(source: &dyn EventSource, target: &dyn EventTarget) -> usize {
    let mut delivered = 0;
    while let Some(event) = source.poll_event() {
        dispatch_one(event, target);
        delivered += 1;
    }
    delivered
}

/// Target for hosts that route nothing but deferred tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrouted;

impl EventTarget for Unrouted {
    fn dispatch(&self, event: Event) -> Result<(), DispatchError> {
        tracing::warn!(?event, "unable to dispatch event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label;
    use deskpane_core::event::{DeferredTask, EventSource};
    use deskpane_core::queue::EventQueue;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    fn task(label: &'static str, f: impl FnOnce() + 'static) -> Event {
        Event::Deferred(DeferredTask::new(label, f))
    }

    fn scripted(steps: Vec<Event>) -> Rc<EventQueue> {
        let mut steps = VecDeque::from(steps);
        Rc::new(EventQueue::new().with_idle(move || steps.pop_front()))
    }

    #[test]
    fn stops_after_task_requests_stop() {
        ui_thread::designate();
        let pump = ModalPump::new(0);
        let handle = pump.handle();
        let ran = Rc::new(Cell::new(0));
        let r = Rc::clone(&ran);
        let q = scripted(vec![
            task("first", {
                let r = Rc::clone(&r);
                move || r.set(r.get() + 1)
            }),
            task("stop", move || {
                r.set(r.get() + 1);
                handle.stop();
            }),
            task("never", || panic!("pump kept running after stop")),
        ]);

        let exit = pump.run(&*q, &Unrouted).unwrap();
        assert_eq!(exit, PumpExit::Stopped);
        assert_eq!(ran.get(), 2);
        assert!(!pump.is_running());
    }

    #[test]
    fn non_deferred_events_reach_target() {
        ui_thread::designate();
        let pump = ModalPump::new(1);
        let handle = pump.handle();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let target = move |event: Event| {
            if let Event::Tick(id) = event {
                s.borrow_mut().push(id);
            }
            Ok(())
        };
        let q = scripted(vec![
            Event::Tick(4),
            Event::Tick(5),
            task("stop", move || handle.stop()),
        ]);
        pump.run(&*q, &target).unwrap();
        assert_eq!(*seen.borrow(), vec![4, 5]);
    }

    #[test]
    fn dispatch_errors_do_not_end_the_session() {
        ui_thread::designate();
        let pump = ModalPump::new(2);
        let handle = pump.handle();
        let failures = Rc::new(Cell::new(0));
        let f = Rc::clone(&failures);
        let target = move |_event: Event| {
            f.set(f.get() + 1);
            Err(DispatchError::new("malformed"))
        };
        let q = scripted(vec![
            Event::Tick(1),
            Event::Tick(2),
            task("stop", move || handle.stop()),
        ]);
        assert_eq!(pump.run(&*q, &target).unwrap(), PumpExit::Stopped);
        assert_eq!(failures.get(), 2);
    }

    #[test]
    fn interrupted_fetch_is_swallowed() {
        ui_thread::designate();
        let pump = ModalPump::new(3);
        let handle = pump.handle();
        let q = Rc::new(EventQueue::new());
        q.interrupt();
        q.post(task("stop", move || handle.stop()));
        assert_eq!(pump.run(&*q, &Unrouted).unwrap(), PumpExit::Stopped);
    }

    #[test]
    fn closed_source_ends_session() {
        ui_thread::designate();
        let pump = ModalPump::new(4);
        let q = EventQueue::new();
        assert_eq!(pump.run(&q, &Unrouted).unwrap(), PumpExit::SourceClosed);
        assert!(!pump.is_running());
    }

    #[test]
    #[tracing_test::traced_test]
    fn stop_observed_after_fetch_still_dispatches() {
        ui_thread::designate();
        let pump = ModalPump::new(5);
        let handle = pump.handle();
        let dispatched = Rc::new(Cell::new(false));
        let d = Rc::clone(&dispatched);
        // The idle hook runs inside the fetch, so stopping there lands
        // between fetch and dispatch.
        let mut fired = false;
        let q = EventQueue::new().with_idle(move || {
            if fired {
                return None;
            }
            fired = true;
            handle.stop();
            let d = Rc::clone(&d);
            Some(task("late", move || d.set(true)))
        });
        assert_eq!(pump.run(&q, &Unrouted).unwrap(), PumpExit::Stopped);
        assert!(dispatched.get());
        assert!(logs_contain("dispatching after the pump was stopped"));
    }

    #[test]
    fn nested_pumps_have_independent_flags() {
        ui_thread::designate();
        let outer = Rc::new(ModalPump::new(10));
        let outer_handle = outer.handle();
        let trace = Rc::new(RefCell::new(Vec::<String>::new()));
        let q = Rc::new(EventQueue::new());

        let steps: Rc<RefCell<VecDeque<Event>>> = Rc::new(RefCell::new(VecDeque::new()));
        {
            let steps_hook = Rc::clone(&steps);
            q.set_idle(move || steps_hook.borrow_mut().pop_front());
        }

        let inner = Rc::new(ModalPump::new(11));
        let inner_handle = inner.handle();

        let q_inner = Rc::clone(&q);
        let t1 = Rc::clone(&trace);
        let outer_seen = outer.handle();
        steps.borrow_mut().push_back(task("open-inner", move || {
            t1.borrow_mut().push(label::current_label());
            let exit = inner.run(&*q_inner, &Unrouted).unwrap();
            assert_eq!(exit, PumpExit::Stopped);
            // Back in the outer session; its flag was never touched.
            assert!(outer_seen.is_running());
            t1.borrow_mut().push(label::current_label());
        }));
        let t2 = Rc::clone(&trace);
        steps.borrow_mut().push_back(task("stop-inner", move || {
            t2.borrow_mut().push(label::current_label());
            inner_handle.stop();
        }));
        let t3 = Rc::clone(&trace);
        steps.borrow_mut().push_back(task("stop-outer", move || {
            t3.borrow_mut().push(label::current_label());
            outer_handle.stop();
        }));

        assert_eq!(outer.run(&*q, &Unrouted).unwrap(), PumpExit::Stopped);
        assert_eq!(
            *trace.borrow(),
            vec!["Modal-10", "Modal-11", "Modal-10", "Modal-10"]
        );
        assert_eq!(label::depth(), 0);
    }

    #[test]
    fn escapable_pump_ends_on_dismiss_input() {
        use deskpane_core::event::{KeyEvent, MouseEvent};
        use deskpane_core::geometry::Point;

        ui_thread::designate();
        let right_up = |modifiers| {
            Event::Mouse(MouseEvent {
                modifiers,
                ..MouseEvent::new(MouseEventKind::Up(MouseButton::Right), Point::new(3, 3))
            })
        };
        let run = |steps: Vec<Event>| {
            let pump = ModalPump::new(40).escapable();
            let seen = Rc::new(Cell::new(0));
            let s = Rc::clone(&seen);
            let target = move |_event: Event| {
                s.set(s.get() + 1);
                Ok(())
            };
            let exit = pump.run(&*scripted(steps), &target).unwrap();
            (exit, seen.get())
        };

        // The dismissing key is still delivered; the tick after it is not.
        let (exit, seen) = run(vec![
            Event::Key(KeyEvent::press(KeyCode::Enter)),
            Event::Key(KeyEvent::press(KeyCode::Char(' '))),
            Event::Tick(1),
        ]);
        assert_eq!((exit, seen), (PumpExit::Stopped, 2));

        let (exit, seen) = run(vec![right_up(Modifiers::SHIFT), right_up(Modifiers::empty())]);
        assert_eq!((exit, seen), (PumpExit::Stopped, 2));

        let left_up = Event::Mouse(MouseEvent::new(
            MouseEventKind::Up(MouseButton::Left),
            Point::new(3, 3),
        ));
        let (exit, seen) = run(vec![left_up, Event::Key(KeyEvent::press(KeyCode::Escape))]);
        assert_eq!((exit, seen), (PumpExit::SourceClosed, 2));
    }

    #[test]
    fn plain_pump_ignores_dismiss_input() {
        ui_thread::designate();
        let pump = ModalPump::new(41);
        assert!(!pump.is_escapable());
        let q = scripted(vec![Event::Key(
            deskpane_core::event::KeyEvent::press(KeyCode::Delete),
        )]);
        assert_eq!(pump.run(&*q, &Unrouted).unwrap(), PumpExit::SourceClosed);
    }

    #[test]
    fn reentering_same_instance_is_rejected() {
        ui_thread::designate();
        let pump = Rc::new(ModalPump::new(20));
        let q = Rc::new(EventQueue::new());
        let result = Rc::new(RefCell::new(None));
        let (p, qq, res) = (Rc::clone(&pump), Rc::clone(&q), Rc::clone(&result));
        q.post(task("reenter", move || {
            *res.borrow_mut() = Some(p.run(&*qq, &Unrouted));
            p.stop();
        }));
        pump.run(&*q, &Unrouted).unwrap();
        assert_eq!(
            result.borrow_mut().take().unwrap(),
            Err(PumpError::AlreadyRunning { seq: 20 })
        );
    }

    #[test]
    fn off_thread_run_is_rejected() {
        let err = std::thread::Builder::new()
            .name("not-ui".into())
            .spawn(|| {
                let pump = ModalPump::new(30);
                let q = EventQueue::new();
                pump.run(&q, &Unrouted)
            })
            .unwrap()
            .join()
            .unwrap()
            .unwrap_err();
        assert_eq!(
            err,
            PumpError::NotUiThread {
                thread: "not-ui".into()
            }
        );
    }

    #[test]
    fn drain_delivers_ready_events_only() {
        let q = EventQueue::new();
        let count = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let c = Rc::clone(&count);
            q.invoke_later("count", move || c.set(c.get() + 1));
        }
        assert_eq!(drain(&q, &Unrouted), 3);
        assert_eq!(count.get(), 3);
        assert_eq!(drain(&q, &Unrouted), 0);
    }
}
