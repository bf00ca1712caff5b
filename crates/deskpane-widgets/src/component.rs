#![forbid(unsafe_code)]

//! Contracts with the host toolkit's visual layer.
//!
//! The subsystem never paints. It sees three capabilities:
//!
//! - [`Component`]: any focusable widget (bounds, visibility, enabled flag,
//!   focus requests, and where it lives).
//! - [`FloatingPanel`]: the platform object backing one dialog.
//! - [`HostSurface`]: the top-level window itself.
//!
//! All methods take `&self`; implementations are shared through `Rc` and use
//! interior mutability, matching how the host toolkit hands out widgets.

use std::rc::{Rc, Weak};

use deskpane_core::geometry::{Rect, Size};

use crate::error::{PanelError, SurfaceError};
use crate::modal::DialogId;

/// Host-assigned widget identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u64);

/// Which container a component lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Placement {
    /// The host window's own content.
    #[default]
    Window,
    /// Inside a dialog.
    Dialog(DialogId),
    /// Inside the minimized representation of an iconified dialog.
    DialogIcon(DialogId),
}

impl Placement {
    /// Whether focus held here is worth restoring to after a dialog closes.
    pub const fn is_restorable(self) -> bool {
        matches!(self, Self::Window)
    }
}

/// A focusable visual component.
pub trait Component {
    fn id(&self) -> ComponentId;

    fn bounds(&self) -> Rect;

    fn set_bounds(&self, bounds: Rect);

    fn is_visible(&self) -> bool;

    fn set_visible(&self, visible: bool);

    fn is_enabled(&self) -> bool {
        true
    }

    /// Ask the platform to move keyboard focus here.
    fn request_focus(&self);

    fn placement(&self) -> Placement {
        Placement::Window
    }
}

/// Weak handle to a component, as held for focus bookkeeping.
pub type ComponentRef = Weak<dyn Component>;

/// Downgrade a shared component for focus bookkeeping.
pub fn downgrade(component: &Rc<dyn Component>) -> ComponentRef {
    Rc::downgrade(component)
}

/// The platform panel that renders one dialog.
pub trait FloatingPanel {
    fn show(&self);

    fn hide(&self);

    /// Release platform resources. Failures are logged by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError`] if resources could not be released.
    fn dispose(&self) -> Result<(), PanelError> {
        Ok(())
    }

    fn bounds(&self) -> Rect;

    fn set_bounds(&self, bounds: Rect);

    /// Natural size after layout ("pack").
    fn preferred_size(&self) -> Size {
        self.bounds().size()
    }

    /// Synchronously repaint `area` (panel-relative).
    fn paint_immediately(&self, _area: Rect) {}

    /// Raise within the panel's layer.
    fn move_to_front(&self) {}

    fn set_iconified(&self, _iconified: bool) {}

    fn set_selected(&self, _selected: bool) {}
}

/// The host's top-level window.
pub trait HostSurface {
    /// Current window size.
    fn size(&self) -> Size;

    /// Size of the display the window is on. Input blockers cover this so a
    /// later window resize cannot expose unblocked area.
    fn display_size(&self) -> Size {
        self.size()
    }

    fn is_full_screen(&self) -> bool {
        false
    }

    /// Synchronously repaint a window-space area.
    fn paint_immediately(&self, _area: Rect) {}

    /// Leave full-screen mode.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the platform refused the change.
    fn leave_full_screen(&self) -> Result<(), SurfaceError> {
        Ok(())
    }
}
