#![forbid(unsafe_code)]

//! Error types for the dialog subsystem.

use deskpane_core::ui_thread::AffinityError;
use deskpane_runtime::PumpError;

use crate::modal::DialogId;

/// Usage errors. Each is returned before any shared state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeskError {
    /// `show` was called before the dialog was attached to a host window.
    #[error("host window not defined for dialog '{dialog}'; attach it before showing")]
    NoHostWindow { dialog: String },
    /// A modal dialog tried to end its session while another modal dialog
    /// opened after it is still open.
    #[error("modal dialog {dialog:?} closed out of order (top of modal stack is {top:?})")]
    ModalOrder {
        dialog: DialogId,
        top: Option<DialogId>,
    },
    #[error(transparent)]
    NotUiThread(#[from] AffinityError),
    #[error(transparent)]
    Pump(#[from] PumpError),
}

/// A floating panel failed to release its platform resources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("panel error: {0}")]
pub struct PanelError(pub String);

/// The host surface failed a window-state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("surface error: {0}")]
pub struct SurfaceError(pub String);
