#![forbid(unsafe_code)]

//! deskpane public facade.
//!
//! Re-exports the pieces a host application needs to float dialogs inside a
//! top-level window. Most users only need the [`prelude`].
//!
//! ```ignore
//! use deskpane::prelude::*;
//!
//! let host = HostWindow::builder(surface, content, events).build();
//! let confirm = Dialog::modal("confirm", panel);
//! confirm.set_host(&host);
//! let answer = confirm.show_and_wait(ShowOptions::at(DialogPosition::Center))?;
//! ```

pub use deskpane_core::{Event, EventQueue, EventSource, EventTarget, Point, Rect, Size};
pub use deskpane_runtime::{ModalPump, PumpError, PumpExit, PumpHandle};
pub use deskpane_widgets::{
    Completion, DeskError, DesktopConfig, Dialog, DialogId, DialogPosition, DialogResult,
    DialogState, HitTarget, HostWindow, ShowOptions,
};

/// Result alias for dialog operations.
pub type Result<T, E = DeskError> = std::result::Result<T, E>;

pub mod prelude {
    pub use crate::Result;
    pub use deskpane_core::event::{DeferredTask, invoke_later};
    pub use deskpane_core::{Event, EventQueue, EventSource, EventTarget, Point, Rect, Size};
    pub use deskpane_widgets::{
        BlockerObserver, Component, ComponentId, DeskError, DesktopConfig, Dialog, DialogPosition,
        DialogResult, FloatingPanel, HitTarget, HostSurface, HostWindow, Placement,
        RegistryObserver, ShowOptions,
    };
}
