#![forbid(unsafe_code)]

//! Dialog lifecycle.
//!
//! ```text
//!   Closed ──show(faceless)──► Closed (registered)
//!     │                             │
//!     └──────show(visible)──────────┴──► Open ──show_and_wait──► OpenModalPumping
//!                                         ▲                          │
//!     Closed ◄──remove_dialog── Open      └────────pump exits────────┘
//! ```
//!
//! # Invariants
//!
//! 1. A dialog is registered with its host from its first `show` until
//!    `remove_dialog`; registration happens at most once.
//! 2. `previous_focus` never points into a dialog or a dialog's icon.
//! 3. A modal dialog holds a stack entry and an input blocker exactly while
//!    it is visible.
//! 4. `remove_dialog` either fails before touching anything or runs every
//!    cleanup step.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | `show` with no host | `Err(DeskError::NoHostWindow)` |
//! | `show` off the UI thread | `Err(DeskError::NotUiThread)` |
//! | `show_and_wait` while already waiting | `Err(DeskError::Pump(AlreadyRunning))` |
//! | Modal closed while a newer modal is open | `Err(DeskError::ModalOrder)` |
//! | Panel dispose fails | Logged at warn, cleanup continues |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use deskpane_core::event::invoke_later;
use deskpane_core::geometry::Rect;
use deskpane_core::ui_thread;
use deskpane_runtime::{PumpError, PumpExit, PumpHandle};

use super::{Completion, DialogId, DialogResult, ModalEntry};
use crate::component::{Component, ComponentRef, FloatingPanel, downgrade};
use crate::error::DeskError;
use crate::host::HostWindow;
use crate::layers::{InputBlocker, LayerItem};
use crate::position::DialogPosition;

/// Invoked by [`Dialog::request_close`] instead of closing directly.
pub type CloseHandler = Rc<dyn Fn(&Rc<Dialog>)>;

/// Lifecycle state of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Closed,
    Open,
    /// Open, with a nested pump blocking the caller of `show_and_wait`.
    OpenModalPumping,
}

/// How to show a dialog.
#[derive(Clone)]
pub struct ShowOptions {
    pub position: DialogPosition,
    /// Component that receives focus once the dialog is up.
    pub focus: Option<ComponentRef>,
    /// `false` registers the dialog without putting it on screen.
    pub visible: bool,
    pub on_close: Option<CloseHandler>,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            position: DialogPosition::default(),
            focus: None,
            visible: true,
            on_close: None,
        }
    }
}

impl fmt::Debug for ShowOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShowOptions")
            .field("position", &self.position)
            .field("has_focus", &self.focus.is_some())
            .field("visible", &self.visible)
            .field("has_on_close", &self.on_close.is_some())
            .finish()
    }
}

impl ShowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: DialogPosition) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Register only; a later visible `show` puts the dialog on screen.
    pub fn faceless() -> Self {
        Self {
            visible: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn position(mut self, position: DialogPosition) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn focus(mut self, component: &Rc<dyn Component>) -> Self {
        self.focus = Some(downgrade(component));
        self
    }

    #[must_use]
    pub fn on_close(mut self, handler: impl Fn(&Rc<Dialog>) + 'static) -> Self {
        self.on_close = Some(Rc::new(handler));
        self
    }
}

/// A floating dialog inside a host window.
pub struct Dialog {
    id: DialogId,
    name: String,
    modal: bool,
    panel: Box<dyn FloatingPanel>,
    host: RefCell<Weak<HostWindow>>,
    state: Cell<DialogState>,
    visible: Cell<bool>,
    selected: Cell<bool>,
    iconified: Cell<bool>,
    previous_focus: RefCell<Option<ComponentRef>>,
    focus_target: RefCell<Option<ComponentRef>>,
    modal_entry: Cell<Option<ModalEntry>>,
    blocker: Cell<Option<InputBlocker>>,
    pump: RefCell<Option<PumpHandle>>,
    result: RefCell<Option<DialogResult>>,
    completion: RefCell<Completion>,
    close_handler: RefCell<Option<CloseHandler>>,
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("modal", &self.modal)
            .field("state", &self.state.get())
            .field("visible", &self.visible.get())
            .field("selected", &self.selected.get())
            .field("iconified", &self.iconified.get())
            .field("modal_entry", &self.modal_entry.get())
            .finish_non_exhaustive()
    }
}

impl Dialog {
    fn build(name: impl Into<String>, modal: bool, panel: impl FloatingPanel + 'static) -> Rc<Self> {
        Rc::new(Self {
            id: DialogId::next(),
            name: name.into(),
            modal,
            panel: Box::new(panel),
            host: RefCell::new(Weak::new()),
            state: Cell::new(DialogState::Closed),
            visible: Cell::new(false),
            selected: Cell::new(false),
            iconified: Cell::new(false),
            previous_focus: RefCell::new(None),
            focus_target: RefCell::new(None),
            modal_entry: Cell::new(None),
            blocker: Cell::new(None),
            pump: RefCell::new(None),
            result: RefCell::new(None),
            completion: RefCell::new(Completion::new()),
            close_handler: RefCell::new(None),
        })
    }

    /// A dialog that blocks input to everything beneath it while open.
    pub fn modal(name: impl Into<String>, panel: impl FloatingPanel + 'static) -> Rc<Self> {
        Self::build(name, true, panel)
    }

    pub fn modeless(name: impl Into<String>, panel: impl FloatingPanel + 'static) -> Rc<Self> {
        Self::build(name, false, panel)
    }

    #[inline]
    pub fn id(&self) -> DialogId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_modal(&self) -> bool {
        self.modal
    }

    pub fn state(&self) -> DialogState {
        self.state.get()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    pub fn is_iconified(&self) -> bool {
        self.iconified.get()
    }

    pub fn bounds(&self) -> Rect {
        self.panel.bounds()
    }

    /// Stack entry while a modal dialog is open.
    pub fn modal_entry(&self) -> Option<ModalEntry> {
        self.modal_entry.get()
    }

    pub fn blocker(&self) -> Option<InputBlocker> {
        self.blocker.get()
    }

    /// Whether a `show_and_wait` pump is running for this dialog.
    pub fn is_pumping(&self) -> bool {
        self.pump.borrow().as_ref().is_some_and(PumpHandle::is_running)
    }

    pub fn host(&self) -> Option<Rc<HostWindow>> {
        self.host.borrow().upgrade()
    }

    /// Component focus returns to when this dialog goes away.
    pub fn previous_focus(&self) -> Option<Rc<dyn Component>> {
        self.previous_focus.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn focus_target(&self) -> Option<Rc<dyn Component>> {
        self.focus_target.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Completion of the current (or most recent) session.
    pub fn completion(&self) -> Completion {
        self.completion.borrow().clone()
    }

    /// Attach to `host` and remember who has focus right now.
    pub fn set_host(&self, host: &Rc<HostWindow>) {
        *self.host.borrow_mut() = Rc::downgrade(host);
        self.capture_focus(host);
    }

    fn require_host(&self) -> Result<Rc<HostWindow>, DeskError> {
        self.host().ok_or_else(|| DeskError::NoHostWindow {
            dialog: self.name.clone(),
        })
    }

    /// Record the host's focus owner unless it lives inside a dialog.
    ///
    /// When focus is inside another dialog and nothing was captured yet, the
    /// window's last owner outside every dialog is used instead.
    fn capture_focus(&self, host: &HostWindow) {
        let Some(owner) = host.focus_owner() else {
            return;
        };
        if owner.placement().is_restorable() {
            *self.previous_focus.borrow_mut() = Some(downgrade(&owner));
            return;
        }
        if self.previous_focus().is_none() {
            let window_owner = host.window_focus_owner();
            tracing::trace!(
                dialog = %self.id,
                seeded = window_owner.is_some(),
                "focus owner inside a dialog; using window owner"
            );
            *self.previous_focus.borrow_mut() = window_owner.map(|c| downgrade(&c));
        }
    }

    /// Show the dialog without blocking.
    ///
    /// The returned [`Completion`] resolves when the dialog is removed.
    /// Showing an already open dialog is a no-op that returns the current
    /// session's completion.
    ///
    /// # Errors
    ///
    /// [`DeskError::NoHostWindow`] before [`set_host`](Self::set_host), or
    /// [`DeskError::NotUiThread`] off the UI thread.
    pub fn show(self: &Rc<Self>, opts: ShowOptions) -> Result<Completion, DeskError> {
        ui_thread::ensure()?;
        let host = self.require_host()?;
        if self.state.get() != DialogState::Closed {
            tracing::debug!(dialog = %self.id, "dialog already showing");
            return Ok(self.completion());
        }
        if self.completion.borrow().is_resolved() {
            *self.completion.borrow_mut() = Completion::new();
            self.result.borrow_mut().take();
        }

        let _span = tracing::debug_span!("dialog_show", dialog = %self.id, name = %self.name).entered();
        if opts.visible {
            self.open(&host, opts);
        }
        if host.register(self) {
            tracing::debug!(dialog = %self.id, visible = self.visible.get(), "dialog registered");
        }
        Ok(self.completion())
    }

    fn open(self: &Rc<Self>, host: &Rc<HostWindow>, opts: ShowOptions) {
        *self.close_handler.borrow_mut() = opts.on_close;
        *self.focus_target.borrow_mut() = opts.focus;

        let cfg = *host.config();
        let layer = if self.modal {
            let entry = {
                let mut coordinator = host.coordinator().borrow_mut();
                if coordinator.is_empty() {
                    host.remember_focus_before_modal();
                }
                coordinator.push(self.id)
            };
            self.modal_entry.set(Some(entry));
            entry.layer()
        } else {
            cfg.default_layer
        };

        let mut bounds = self.panel.bounds();
        if opts.position.packs() {
            bounds = bounds.with_size(self.panel.preferred_size());
        }
        let surface = host.surface();
        let bounds = opts
            .position
            .resolve(bounds, surface.size(), surface.is_full_screen(), &cfg);
        self.panel.set_bounds(bounds);
        host.layers()
            .borrow_mut()
            .add(LayerItem::Dialog(self.id), layer, bounds);

        if let Some(entry) = self.modal_entry.get() {
            let blocker = InputBlocker::new(
                self.id,
                entry.blocker_layer(),
                Rect::from_size(surface.display_size()),
            );
            host.layers()
                .borrow_mut()
                .add(LayerItem::Blocker(blocker.id()), blocker.layer(), blocker.bounds());
            self.blocker.set(Some(blocker));
            let observer = host.coordinator().borrow().blocker_observer();
            if let Some(observer) = observer {
                observer.blocker_created(&blocker);
            }
        }

        self.capture_focus(host);
        self.panel.show();
        self.visible.set(true);
        self.state.set(DialogState::Open);
        self.panel.paint_immediately(Rect::from_size(bounds.size()));
        host.select(self);
        self.schedule_focus(host);
        tracing::debug!(layer, ?bounds, "dialog opened");
    }

    /// Show, then pump events until the dialog is removed.
    ///
    /// # Errors
    ///
    /// Anything [`show`](Self::show) returns, or [`DeskError::Pump`] when the
    /// nested loop cannot start. A dialog already inside `show_and_wait`
    /// gets [`PumpError::AlreadyRunning`]; await its
    /// [`completion`](Self::completion) instead.
    pub fn show_and_wait(self: &Rc<Self>, opts: ShowOptions) -> Result<DialogResult, DeskError> {
        let completion = self.show(opts)?;
        if let Some(result) = completion.try_result() {
            return Ok(result);
        }
        if let Some(running) = self.pump.borrow().as_ref().filter(|h| h.is_running()) {
            return Err(PumpError::AlreadyRunning { seq: running.seq() }.into());
        }
        let host = self.require_host()?;
        let pump = host.new_pump();
        let handle = pump.handle();
        *self.pump.borrow_mut() = Some(handle.clone());
        self.state.set(DialogState::OpenModalPumping);
        tracing::debug!(dialog = %self.id, pump = %pump.label(), "entering modal session");

        let outcome = pump.run(&**host.events(), &**host.target());

        if self.pump.borrow().as_ref().is_some_and(|h| h.same_pump(&handle)) {
            self.pump.borrow_mut().take();
        }
        if self.state.get() == DialogState::OpenModalPumping {
            self.state.set(DialogState::Open);
        }
        match outcome? {
            PumpExit::Stopped => {}
            PumpExit::SourceClosed => {
                tracing::warn!(dialog = %self.id, "modal session ended with the dialog still open");
            }
        }
        Ok(completion.try_result().unwrap_or_default())
    }

    /// Close the dialog and release everything it holds.
    ///
    /// Does nothing if the dialog is not registered with a host.
    ///
    /// # Errors
    ///
    /// [`DeskError::ModalOrder`] when a modal dialog opened after this one is
    /// still open. Nothing is changed in that case.
    pub fn remove_dialog(self: &Rc<Self>) -> Result<(), DeskError> {
        let Some(host) = self.host() else {
            return Ok(());
        };
        if !host.is_registered(self.id) {
            return Ok(());
        }
        if self.modal_entry.get().is_some() {
            let emptied = {
                let mut coordinator = host.coordinator().borrow_mut();
                coordinator.pop(self.id)?;
                coordinator.is_empty()
            };
            self.modal_entry.set(None);
            if emptied {
                host.forget_focus_before_modal();
            }
        }

        let _span = tracing::debug_span!("dialog_remove", dialog = %self.id, name = %self.name).entered();
        host.deregister(self.id);

        if self.visible.replace(false) {
            self.panel.hide();
            self.schedule_restore(&host);
        }
        if let Some(pump) = self.pump.borrow_mut().take() {
            pump.stop();
        }

        let bounds = self.panel.bounds();
        host.layers().borrow_mut().remove(LayerItem::Dialog(self.id));
        if let Some(blocker) = self.blocker.take() {
            host.layers()
                .borrow_mut()
                .remove(LayerItem::Blocker(blocker.id()));
            let observer = host.coordinator().borrow().blocker_observer();
            if let Some(observer) = observer {
                observer.blocker_finished(&blocker);
            }
        }

        if let Err(err) = self.panel.dispose() {
            tracing::warn!(%err, "dialog dispose failed");
        }
        host.surface().paint_immediately(bounds);

        self.selected.set(false);
        self.state.set(DialogState::Closed);
        host.notify_removed(self);
        let result = self.result.borrow_mut().take().unwrap_or_default();
        tracing::debug!(?result, "dialog removed");
        self.completion.borrow().resolve(result);
        Ok(())
    }

    /// Record `result` as the outcome, then remove the dialog.
    ///
    /// # Errors
    ///
    /// As [`remove_dialog`](Self::remove_dialog); the outcome is discarded.
    pub fn close_with(self: &Rc<Self>, result: DialogResult) -> Result<(), DeskError> {
        let previous = self.result.replace(Some(result));
        let removed = self.remove_dialog();
        if removed.is_err() {
            *self.result.borrow_mut() = previous;
        }
        removed
    }

    /// Close-button path: run the close handler, or remove the dialog.
    ///
    /// # Errors
    ///
    /// As [`remove_dialog`](Self::remove_dialog) when no handler is set.
    pub fn request_close(self: &Rc<Self>) -> Result<(), DeskError> {
        let handler = self.close_handler.borrow().clone();
        match handler {
            Some(handler) => {
                handler(self);
                Ok(())
            }
            None => self.remove_dialog(),
        }
    }

    /// Move the panel and keep hit testing in sync.
    pub fn set_bounds(&self, bounds: Rect) {
        self.panel.set_bounds(bounds);
        if let Some(host) = self.host() {
            host.layers()
                .borrow_mut()
                .set_bounds(LayerItem::Dialog(self.id), bounds);
        }
    }

    /// Select, raise within the layer, and send focus to the focus target.
    pub fn move_to_front_selected(self: &Rc<Self>) {
        let Some(host) = self.host() else {
            return;
        };
        self.schedule_focus(&host);
        host.select(self);
        host.layers()
            .borrow_mut()
            .move_to_front(LayerItem::Dialog(self.id));
        self.panel.move_to_front();
    }

    /// Minimize or restore the dialog.
    ///
    /// Minimizing hands focus back to the window; restoring re-captures the
    /// current owner and focuses the dialog's target.
    pub fn set_iconified(self: &Rc<Self>, iconified: bool) {
        if iconified == self.iconified.get() {
            return;
        }
        if let Some(host) = self.host() {
            if iconified {
                self.schedule_restore(&host);
            } else {
                self.capture_focus(&host);
                self.schedule_focus(&host);
            }
        }
        self.iconified.set(iconified);
        self.panel.set_iconified(iconified);
    }

    pub(crate) fn set_selected(&self, selected: bool) {
        if self.selected.replace(selected) != selected {
            self.panel.set_selected(selected);
        }
    }

    /// After the current event, give focus to the focus target.
    fn schedule_focus(self: &Rc<Self>, host: &HostWindow) {
        let dialog = Rc::downgrade(self);
        invoke_later(&**host.events(), "dialog_focus", move || {
            let Some(dialog) = dialog.upgrade() else {
                return;
            };
            // quickly dismissed dialogs may have nothing to focus
            let (Some(target), Some(host)) = (dialog.focus_target(), dialog.host()) else {
                return;
            };
            host.focus(&target);
        });
    }

    /// After the current event, let the host pick the next focus owner.
    fn schedule_restore(&self, host: &Rc<HostWindow>) {
        let restore_to = self.previous_focus.borrow().clone();
        let host_ref = Rc::downgrade(host);
        invoke_later(&**host.events(), "restore_focus", move || {
            if let Some(host) = host_ref.upgrade() {
                host.restore_focus(restore_to);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentId, HostSurface, Placement};
    use crate::error::PanelError;
    use deskpane_core::geometry::Size;
    use deskpane_core::queue::EventQueue;

    #[derive(Default)]
    struct PanelState {
        bounds: Cell<Rect>,
        shown: Cell<u32>,
        hidden: Cell<u32>,
        disposed: Cell<u32>,
        fail_dispose: Cell<bool>,
    }

    #[derive(Clone, Default)]
    struct TestPanel(Rc<PanelState>);

    impl FloatingPanel for TestPanel {
        fn show(&self) {
            self.0.shown.set(self.0.shown.get() + 1);
        }
        fn hide(&self) {
            self.0.hidden.set(self.0.hidden.get() + 1);
        }
        fn dispose(&self) -> Result<(), PanelError> {
            self.0.disposed.set(self.0.disposed.get() + 1);
            if self.0.fail_dispose.get() {
                return Err(PanelError("gone".into()));
            }
            Ok(())
        }
        fn bounds(&self) -> Rect {
            self.0.bounds.get()
        }
        fn set_bounds(&self, bounds: Rect) {
            self.0.bounds.set(bounds);
        }
        fn preferred_size(&self) -> Size {
            Size::new(200, 100)
        }
    }

    struct Surface;

    impl HostSurface for Surface {
        fn size(&self) -> Size {
            Size::new(800, 600)
        }
    }

    struct Widget {
        id: u64,
        placement: Placement,
    }

    impl Component for Widget {
        fn id(&self) -> ComponentId {
            ComponentId(self.id)
        }
        fn bounds(&self) -> Rect {
            Rect::default()
        }
        fn set_bounds(&self, _bounds: Rect) {}
        fn is_visible(&self) -> bool {
            true
        }
        fn set_visible(&self, _visible: bool) {}
        fn request_focus(&self) {}
        fn placement(&self) -> Placement {
            self.placement
        }
    }

    fn host() -> (Rc<HostWindow>, Rc<EventQueue>) {
        let queue = Rc::new(EventQueue::new());
        let content: Rc<dyn Component> = Rc::new(Widget {
            id: 0,
            placement: Placement::Window,
        });
        let host = HostWindow::builder(Rc::new(Surface), content, queue.clone()).build();
        (host, queue)
    }

    #[test]
    fn show_without_host_is_an_error() {
        ui_thread::designate();
        let d = Dialog::modeless("orphan", TestPanel::default());
        let err = d.show(ShowOptions::new()).unwrap_err();
        assert_eq!(err, DeskError::NoHostWindow {
            dialog: "orphan".into()
        });
        assert_eq!(d.state(), DialogState::Closed);
    }

    #[test]
    fn show_off_the_ui_thread_is_an_error() {
        let err = std::thread::Builder::new()
            .name("loader".into())
            .spawn(|| {
                let d = Dialog::modeless("stray", TestPanel::default());
                let err = d.show(ShowOptions::new()).unwrap_err();
                assert_eq!(d.state(), DialogState::Closed);
                err
            })
            .unwrap()
            .join()
            .unwrap();
        match err {
            DeskError::NotUiThread(affinity) => assert_eq!(affinity.thread, "loader"),
            other => panic!("expected NotUiThread, got {other:?}"),
        }
    }

    #[test]
    fn remove_without_host_is_a_no_op() {
        let d = Dialog::modal("detached", TestPanel::default());
        assert!(d.remove_dialog().is_ok());
    }

    #[test]
    fn show_places_registers_and_opens() {
        let (host, _queue) = host();
        let panel = TestPanel::default();
        let d = Dialog::modeless("about", panel.clone());
        d.set_host(&host);
        d.show(ShowOptions::at(DialogPosition::Center)).unwrap();

        assert_eq!(d.state(), DialogState::Open);
        assert!(d.is_visible() && d.is_selected());
        assert!(host.is_registered(d.id()));
        assert_eq!(panel.0.shown.get(), 1);
        assert_eq!(d.bounds(), Rect::new(300, 235, 200, 100));
        assert!(d.modal_entry().is_none());
    }

    #[test]
    fn modal_show_allocates_entry_and_blocker() {
        let (host, _queue) = host();
        let d = Dialog::modal("confirm", TestPanel::default());
        d.set_host(&host);
        d.show(ShowOptions::new()).unwrap();

        let entry = d.modal_entry().unwrap();
        let blocker = d.blocker().unwrap();
        assert_eq!(entry.layer(), 200);
        assert_eq!(blocker.layer(), 199);
        assert_eq!(blocker.bounds(), Rect::new(0, 0, 800, 600));
        assert_eq!(host.coordinator().borrow().depth(), 1);
    }

    #[test]
    fn remove_twice_cleans_up_once() {
        let (host, _queue) = host();
        let panel = TestPanel::default();
        let d = Dialog::modal("confirm", panel.clone());
        d.set_host(&host);
        let done = d.show(ShowOptions::new()).unwrap();

        d.remove_dialog().unwrap();
        d.remove_dialog().unwrap();
        assert_eq!(panel.0.hidden.get(), 1);
        assert_eq!(panel.0.disposed.get(), 1);
        assert_eq!(d.state(), DialogState::Closed);
        assert!(host.coordinator().borrow().is_empty());
        assert!(host.layers().borrow().is_empty());
        assert_eq!(done.try_result(), Some(DialogResult::Dismissed));
    }

    #[test]
    fn close_with_resolves_completion() {
        let (host, _queue) = host();
        let d = Dialog::modeless("prompt", TestPanel::default());
        d.set_host(&host);
        let done = d.show(ShowOptions::new()).unwrap();
        assert!(!done.is_resolved());
        d.close_with(DialogResult::Input("bob".into())).unwrap();
        assert_eq!(done.try_result(), Some(DialogResult::Input("bob".into())));
    }

    #[test]
    fn reshow_starts_a_fresh_session() {
        let (host, _queue) = host();
        let d = Dialog::modeless("tips", TestPanel::default());
        d.set_host(&host);
        let first = d.show(ShowOptions::new()).unwrap();
        d.close_with(DialogResult::Ok).unwrap();
        let second = d.show(ShowOptions::new()).unwrap();
        assert!(first.is_resolved());
        assert!(!second.is_resolved());
    }

    #[test]
    fn out_of_order_modal_close_changes_nothing() {
        let (host, _queue) = host();
        let outer = Dialog::modal("outer", TestPanel::default());
        let inner = Dialog::modal("inner", TestPanel::default());
        outer.set_host(&host);
        inner.set_host(&host);
        outer.show(ShowOptions::new()).unwrap();
        inner.show(ShowOptions::new()).unwrap();

        let err = outer.close_with(DialogResult::Ok).unwrap_err();
        assert_eq!(err, DeskError::ModalOrder {
            dialog: outer.id(),
            top: Some(inner.id()),
        });
        assert!(outer.is_visible());
        assert!(host.is_registered(outer.id()));
        assert_eq!(host.coordinator().borrow().depth(), 2);
        assert!(outer.modal_entry().is_some());

        inner.remove_dialog().unwrap();
        outer.remove_dialog().unwrap();
        assert_eq!(outer.completion().try_result(), Some(DialogResult::Dismissed));
    }

    #[test]
    #[tracing_test::traced_test]
    fn dispose_failure_is_logged_and_cleanup_continues() {
        let (host, _queue) = host();
        let panel = TestPanel::default();
        panel.0.fail_dispose.set(true);
        let d = Dialog::modal("flaky", panel.clone());
        d.set_host(&host);
        d.show(ShowOptions::new()).unwrap();
        d.remove_dialog().unwrap();
        assert!(!host.is_registered(d.id()));
        assert!(host.coordinator().borrow().is_empty());
        assert!(d.completion().is_resolved());
        assert!(logs_contain("dialog dispose failed"));
    }

    #[test]
    fn close_handler_replaces_default_close() {
        let (host, _queue) = host();
        let d = Dialog::modeless("settings", TestPanel::default());
        d.set_host(&host);
        let asked = Rc::new(Cell::new(0));
        let a = Rc::clone(&asked);
        d.show(ShowOptions::new().on_close(move |_| a.set(a.get() + 1)))
            .unwrap();
        d.request_close().unwrap();
        assert_eq!(asked.get(), 1);
        assert!(d.is_visible());

        let plain = Dialog::modeless("plain", TestPanel::default());
        plain.set_host(&host);
        plain.show(ShowOptions::new()).unwrap();
        plain.request_close().unwrap();
        assert!(!plain.is_visible());
    }

    #[test]
    fn set_host_skips_owner_inside_a_dialog() {
        let (host, _queue) = host();
        let outside: Rc<dyn Component> = Rc::new(Widget {
            id: 1,
            placement: Placement::Window,
        });
        let inside: Rc<dyn Component> = Rc::new(Widget {
            id: 2,
            placement: Placement::Dialog(DialogId::from_raw(99)),
        });
        let d = Dialog::modeless("child", TestPanel::default());

        host.focus(&outside);
        d.set_host(&host);
        host.focus(&inside);
        d.set_host(&host);
        assert_eq!(d.previous_focus().map(|c| c.id()), Some(ComponentId(1)));
    }

    #[test]
    fn dialog_opened_inside_a_dialog_captures_window_owner() {
        let (host, _queue) = host();
        let outside: Rc<dyn Component> = Rc::new(Widget {
            id: 1,
            placement: Placement::Window,
        });
        let inside: Rc<dyn Component> = Rc::new(Widget {
            id: 2,
            placement: Placement::Dialog(DialogId::from_raw(98)),
        });
        host.focus(&outside);
        host.focus(&inside);

        let d = Dialog::modeless("second", TestPanel::default());
        d.set_host(&host);
        assert_eq!(d.previous_focus().map(|c| c.id()), Some(ComponentId(1)));
    }

    #[test]
    fn closing_last_modal_forgets_focus_before_modal() {
        let (host, _queue) = host();
        let owner: Rc<dyn Component> = Rc::new(Widget {
            id: 1,
            placement: Placement::Window,
        });
        host.focus(&owner);
        let d = Dialog::modal("confirm", TestPanel::default());
        d.set_host(&host);
        d.show(ShowOptions::new()).unwrap();
        assert_eq!(host.last_focus_before_modal().map(|c| c.id()), Some(ComponentId(1)));

        d.remove_dialog().unwrap();
        assert!(host.last_focus_before_modal().is_none());
    }
}
