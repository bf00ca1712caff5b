#![forbid(unsafe_code)]

//! Event-loop plumbing for deskpane: the nested [`ModalPump`] that keeps the
//! UI responsive while a modal session blocks its caller, the non-modal
//! [`drain`] loop, and the diagnostic labels that name the active session.

pub mod label;
pub mod modal_pump;

pub use label::{LabelGuard, current_label};
pub use modal_pump::{ModalPump, PumpError, PumpExit, PumpHandle, Unrouted, dispatch_one, drain};
