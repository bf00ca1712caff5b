#![forbid(unsafe_code)]

//! Internal dialogs for deskpane host windows.
//!
//! A [`HostWindow`] floats [`Dialog`]s above its content. Modal dialogs are
//! layered by a per-window [`ModalCoordinator`] and guarded by an
//! [`InputBlocker`]; when any dialog closes, keyboard focus goes back to
//! something sensible in the window.

pub mod component;
pub mod config;
pub mod error;
pub mod host;
pub mod layers;
pub mod modal;
pub mod position;

pub use component::{
    Component, ComponentId, ComponentRef, FloatingPanel, HostSurface, Placement, downgrade,
};
#[cfg(feature = "policy-config")]
pub use config::ConfigError;
pub use config::DesktopConfig;
pub use error::{DeskError, PanelError, SurfaceError};
pub use host::{HitTarget, HostWindow, HostWindowBuilder, RegistryObserver};
pub use layers::{BlockerId, InputBlocker, LayerItem, LayeredPane};
pub use modal::{
    BlockerObserver, CloseHandler, Completion, Dialog, DialogId, DialogResult, DialogState,
    ModalCoordinator, ModalEntry, ShowOptions,
};
pub use position::DialogPosition;
