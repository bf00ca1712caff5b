#![forbid(unsafe_code)]

//! The top-level window that owns dialogs.
//!
//! A [`HostWindow`] keeps the dialog registry (insertion order), the focus
//! owner, the layered pane with its input blockers, and the window's
//! [`ModalCoordinator`]. It is the single entry point for focus changes:
//! [`HostWindow::focus`] records the owner and forwards the request to the
//! component.
//!
//! # Invariants
//!
//! 1. Every registered dialog reports this window as its host.
//! 2. A dialog appears in the registry at most once.
//! 3. Observers are invoked with no internal borrow held, so they may call
//!    back into the window.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use deskpane_core::event::{EventSource, EventTarget};
use deskpane_core::geometry::Point;
use deskpane_core::ui_thread;
use deskpane_runtime::{ModalPump, PumpError, PumpExit, PumpHandle, Unrouted, drain};

use crate::component::{Component, ComponentRef, HostSurface, downgrade};
use crate::config::DesktopConfig;
use crate::layers::{LayerItem, LayeredPane};
use crate::modal::{BlockerObserver, Dialog, DialogId, ModalCoordinator};

/// Observer for dialogs entering and leaving the registry.
pub trait RegistryObserver {
    fn dialog_added(&self, dialog: &Dialog);
    fn dialog_removed(&self, dialog: &Dialog);
}

/// What a pointer at some window position would hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// The window's own content.
    Content,
    Dialog(DialogId),
    /// An input blocker; the input is swallowed.
    Blocked,
}

/// Builder for [`HostWindow`].
pub struct HostWindowBuilder {
    surface: Rc<dyn HostSurface>,
    content: Rc<dyn Component>,
    events: Rc<dyn EventSource>,
    target: Rc<dyn EventTarget>,
    config: DesktopConfig,
}

impl HostWindowBuilder {
    /// Where non-deferred events go while pumping.
    #[must_use]
    pub fn target(mut self, target: Rc<dyn EventTarget>) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn config(mut self, config: DesktopConfig) -> Self {
        self.config = config.sanitized();
        self
    }

    /// Build the window and designate the calling thread as the UI thread.
    pub fn build(self) -> Rc<HostWindow> {
        ui_thread::designate();
        Rc::new(HostWindow {
            coordinator: RefCell::new(ModalCoordinator::new(&self.config)),
            surface: self.surface,
            content: self.content,
            events: self.events,
            target: self.target,
            config: self.config,
            dialogs: RefCell::new(Vec::new()),
            focus_owner: RefCell::new(None),
            window_focus: RefCell::new(None),
            last_focus_before_modal: RefCell::new(None),
            layers: RefCell::new(LayeredPane::new()),
            observers: RefCell::new(Vec::new()),
            pump_seq: Cell::new(0),
            pumps: RefCell::new(Vec::new()),
        })
    }
}

/// A top-level window hosting internal dialogs.
pub struct HostWindow {
    surface: Rc<dyn HostSurface>,
    content: Rc<dyn Component>,
    events: Rc<dyn EventSource>,
    target: Rc<dyn EventTarget>,
    config: DesktopConfig,
    dialogs: RefCell<Vec<Rc<Dialog>>>,
    focus_owner: RefCell<Option<ComponentRef>>,
    window_focus: RefCell<Option<ComponentRef>>,
    last_focus_before_modal: RefCell<Option<ComponentRef>>,
    coordinator: RefCell<ModalCoordinator>,
    layers: RefCell<LayeredPane>,
    observers: RefCell<Vec<Rc<dyn RegistryObserver>>>,
    pump_seq: Cell<u64>,
    pumps: RefCell<Vec<PumpHandle>>,
}

impl fmt::Debug for HostWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostWindow")
            .field("dialogs", &self.dialogs.borrow().len())
            .field("coordinator", &self.coordinator.borrow())
            .field("layers", &self.layers.borrow().len())
            .field("pumps", &self.pumps.borrow().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HostWindow {
    pub fn builder(
        surface: Rc<dyn HostSurface>,
        content: Rc<dyn Component>,
        events: Rc<dyn EventSource>,
    ) -> HostWindowBuilder {
        HostWindowBuilder {
            surface,
            content,
            events,
            target: Rc::new(Unrouted),
            config: DesktopConfig::default(),
        }
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn surface(&self) -> &Rc<dyn HostSurface> {
        &self.surface
    }

    pub fn content(&self) -> &Rc<dyn Component> {
        &self.content
    }

    pub fn events(&self) -> &Rc<dyn EventSource> {
        &self.events
    }

    pub fn target(&self) -> &Rc<dyn EventTarget> {
        &self.target
    }

    pub(crate) fn coordinator(&self) -> &RefCell<ModalCoordinator> {
        &self.coordinator
    }

    pub(crate) fn layers(&self) -> &RefCell<LayeredPane> {
        &self.layers
    }

    // --- registry ---

    /// Registered dialogs, oldest first.
    pub fn dialogs(&self) -> Vec<Rc<Dialog>> {
        self.dialogs.borrow().clone()
    }

    pub fn dialog(&self, id: DialogId) -> Option<Rc<Dialog>> {
        self.dialogs.borrow().iter().find(|d| d.id() == id).cloned()
    }

    pub fn is_registered(&self, id: DialogId) -> bool {
        self.dialogs.borrow().iter().any(|d| d.id() == id)
    }

    /// Number of open modal dialogs.
    pub fn modal_depth(&self) -> usize {
        self.coordinator.borrow().depth()
    }

    /// Add `dialog` unless already present. Returns whether it was added.
    pub(crate) fn register(&self, dialog: &Rc<Dialog>) -> bool {
        {
            let mut dialogs = self.dialogs.borrow_mut();
            if dialogs.iter().any(|d| Rc::ptr_eq(d, dialog)) {
                return false;
            }
            dialogs.push(Rc::clone(dialog));
        }
        for observer in self.observers() {
            observer.dialog_added(dialog);
        }
        true
    }

    /// Drop `id` from the registry. Returns whether it was present.
    pub(crate) fn deregister(&self, id: DialogId) -> bool {
        let mut dialogs = self.dialogs.borrow_mut();
        match dialogs.iter().position(|d| d.id() == id) {
            Some(idx) => {
                dialogs.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn notify_removed(&self, dialog: &Dialog) {
        for observer in self.observers() {
            observer.dialog_removed(dialog);
        }
    }

    fn observers(&self) -> Vec<Rc<dyn RegistryObserver>> {
        self.observers.borrow().clone()
    }

    pub fn add_registry_observer(&self, observer: Rc<dyn RegistryObserver>) {
        self.observers.borrow_mut().push(observer);
    }

    pub fn set_blocker_observer(&self, observer: Option<Rc<dyn BlockerObserver>>) {
        self.coordinator.borrow_mut().set_blocker_observer(observer);
    }

    /// Select `dialog` and deselect every other registered dialog.
    pub fn select(&self, dialog: &Dialog) {
        for other in self.dialogs() {
            if other.id() != dialog.id() {
                other.set_selected(false);
            }
        }
        dialog.set_selected(true);
    }

    pub fn unselect_all_dialogs(&self) {
        for dialog in self.dialogs() {
            dialog.set_selected(false);
        }
    }

    /// Close every dialog: open modal dialogs from the top of the stack
    /// down, then the rest newest first.
    pub fn remove_all_dialogs(&self) {
        loop {
            let top = self.coordinator.borrow().top().map(|e| e.dialog());
            let next = match top {
                Some(id) => self.dialog(id),
                None => self.dialogs.borrow().last().cloned(),
            };
            let Some(dialog) = next else {
                break;
            };
            let before = self.dialogs.borrow().len();
            if let Err(err) = dialog.remove_dialog() {
                tracing::warn!(%err, dialog = %dialog.id(), "unable to remove dialog");
                break;
            }
            if self.dialogs.borrow().len() >= before {
                tracing::warn!(dialog = %dialog.id(), "dialog did not leave the registry");
                break;
            }
        }
    }

    // --- focus ---

    /// Give `component` the keyboard focus.
    pub fn focus(&self, component: &Rc<dyn Component>) {
        tracing::debug!(component = component.id().0, "focus requested");
        *self.focus_owner.borrow_mut() = Some(downgrade(component));
        if component.placement().is_restorable() {
            *self.window_focus.borrow_mut() = Some(downgrade(component));
        }
        component.request_focus();
    }

    pub fn focus_owner(&self) -> Option<Rc<dyn Component>> {
        self.focus_owner.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Most recent focus owner outside every dialog.
    pub fn window_focus_owner(&self) -> Option<Rc<dyn Component>> {
        self.window_focus.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Focus owner when the outermost modal dialog opened.
    pub fn last_focus_before_modal(&self) -> Option<Rc<dyn Component>> {
        self.last_focus_before_modal
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub(crate) fn remember_focus_before_modal(&self) {
        let owner = self
            .focus_owner()
            .filter(|c| c.placement().is_restorable())
            .map(|c| downgrade(&c));
        *self.last_focus_before_modal.borrow_mut() = owner;
    }

    pub(crate) fn forget_focus_before_modal(&self) {
        self.last_focus_before_modal.borrow_mut().take();
    }

    /// Move focus somewhere sensible after a dialog went away.
    ///
    /// The most recent open dialog wins (a selected one first, else the
    /// newest visible and not iconified one). Otherwise `restore_to` gets
    /// focus if it is still visible, else the window content.
    pub fn restore_focus(&self, restore_to: Option<ComponentRef>) {
        if self.restore_focus_last_dialog() {
            return;
        }
        let target = restore_to
            .and_then(|c| c.upgrade())
            .filter(|c| c.is_visible())
            .unwrap_or_else(|| Rc::clone(&self.content));
        tracing::debug!(component = target.id().0, "focus restored to window");
        self.focus(&target);
    }

    fn restore_focus_last_dialog(&self) -> bool {
        let mut backup = None;
        for dialog in self.dialogs().into_iter().rev() {
            if !dialog.is_visible() || dialog.is_iconified() {
                continue;
            }
            if dialog.is_selected() {
                tracing::debug!(dialog = %dialog.id(), "focus restored to selected dialog");
                dialog.move_to_front_selected();
                return true;
            }
            if backup.is_none() {
                backup = Some(dialog);
            }
        }
        match backup {
            Some(dialog) => {
                tracing::debug!(dialog = %dialog.id(), "focus restored to unselected dialog");
                dialog.move_to_front_selected();
                true
            }
            None => false,
        }
    }

    // --- input ---

    /// Topmost thing under `point`.
    pub fn hit_test(&self, point: Point) -> HitTarget {
        match self.layers.borrow().top_at(point) {
            Some(LayerItem::Dialog(id)) => HitTarget::Dialog(id),
            Some(LayerItem::Blocker(_)) => HitTarget::Blocked,
            None => HitTarget::Content,
        }
    }

    /// Run every queued event outside any modal session.
    pub fn dispatch_pending(&self) -> usize {
        drain(&*self.events, &*self.target)
    }

    // --- pumps ---

    /// Create a numbered pump. Nothing tracks it until it runs through
    /// [`run_pump`](Self::run_pump).
    pub fn new_pump(&self) -> ModalPump {
        let seq = self.pump_seq.get() + 1;
        self.pump_seq.set(seq);
        ModalPump::new(seq)
    }

    /// Run a pump that is not bound to any dialog on this window's events.
    ///
    /// The pump is tracked while it runs, so [`end_all_pumps`](Self::end_all_pumps)
    /// can stop it.
    ///
    /// # Errors
    ///
    /// As [`ModalPump::run`].
    pub fn run_pump(&self, pump: &ModalPump) -> Result<PumpExit, PumpError> {
        let handle = pump.handle();
        self.pumps.borrow_mut().push(handle.clone());
        let exit = pump.run(&*self.events, &*self.target);
        self.pumps.borrow_mut().retain(|h| !h.same_pump(&handle));
        exit
    }

    /// Number of tracked pumps still running.
    pub fn running_pumps(&self) -> usize {
        self.pumps.borrow().iter().filter(|h| h.is_running()).count()
    }

    /// Stop every pump started with [`run_pump`](Self::run_pump).
    ///
    /// Dialog sessions are not affected; they end when their dialog is
    /// removed.
    pub fn end_all_pumps(&self) {
        let pumps = self.pumps.borrow().clone();
        for pump in pumps.iter().filter(|h| h.is_running()) {
            tracing::debug!(seq = pump.seq(), "ending modal pump");
            pump.stop();
        }
    }

    /// Close all dialogs, end all pumps, and leave full-screen mode.
    pub fn shutdown(&self) {
        let _span = tracing::debug_span!("host_shutdown").entered();
        self.remove_all_dialogs();
        self.end_all_pumps();
        if self.surface.is_full_screen() {
            if let Err(err) = self.surface.leave_full_screen() {
                tracing::warn!(%err, "unable to leave full screen");
            }
        }
    }
}
