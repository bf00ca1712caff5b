#![forbid(unsafe_code)]

//! Dialog placement policies.

use deskpane_core::geometry::{Point, Rect, Size};

use crate::config::DesktopConfig;

/// Where to put a dialog when it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogPosition {
    /// Centered in the window (nudged up for the title bar when decorated).
    Center,
    /// Horizontally centered, near the top edge.
    CenterTop,
    /// Placed so the dialog does not cover `(x, y)`, keeping `margin` clear.
    AvoidPoint { x: i32, y: i32, margin: i32 },
    /// Centered, then shifted by `(dx, dy)`.
    CenterOffset { dx: i32, dy: i32 },
    /// Use the panel's current bounds untouched.
    Unchanged,
    /// Keep the current position, recentering an axis that has drifted
    /// off-window.
    #[default]
    KeepOnScreen,
}

impl DialogPosition {
    /// Whether the panel is laid out at its preferred size before placing.
    pub const fn packs(self) -> bool {
        matches!(
            self,
            Self::Center | Self::CenterTop | Self::AvoidPoint { .. } | Self::CenterOffset { .. }
        )
    }

    /// Compute the dialog's bounds inside a window of size `window`.
    ///
    /// `current` carries the size to place (already packed if [`packs`]
    /// applies) and the current origin.
    ///
    /// [`packs`]: Self::packs
    pub fn resolve(
        self,
        current: Rect,
        window: Size,
        full_screen: bool,
        cfg: &DesktopConfig,
    ) -> Rect {
        let size = current.size();
        let origin = match self {
            Self::Unchanged => return current,
            Self::Center => center(size, window, full_screen, cfg),
            Self::CenterOffset { dx, dy } => {
                let c = center(size, window, full_screen, cfg);
                Point::new(c.x + dx, c.y + dy)
            }
            Self::CenterTop => Point::new((window.width - size.width) / 2, cfg.center_top_margin),
            Self::AvoidPoint { x, y, margin } => avoid_point(size, window, Point::new(x, y), margin),
            Self::KeepOnScreen => {
                let mut p = current.origin();
                if p.x < 0 || p.x > window.width - cfg.visibility_margin {
                    p.x = window.width / 2;
                }
                if p.y < 0 || p.y > window.height - cfg.visibility_margin {
                    p.y = window.height / 2;
                }
                p
            }
        };
        clamp_into(current.with_origin(origin), window, cfg)
    }
}

fn center(size: Size, window: Size, full_screen: bool, cfg: &DesktopConfig) -> Point {
    let x = (window.width - size.width) / 2;
    let mut y = (window.height - size.height) / 2;
    if !full_screen {
        y -= cfg.title_bar_allowance;
    }
    Point::new(x, y)
}

/// Pick a spot next to `point` in the direction with the most room.
fn avoid_point(size: Size, window: Size, point: Point, margin: i32) -> Point {
    let (bw, bh) = (size.width, size.height);
    let (fw, fh) = (window.width, window.height);
    let Point { mut x, mut y } = point;

    if bh < y - margin {
        // fits above: center in the space above the point
        y = (y - bh) / 2;
        x = (fw - bw) / 2;
    } else if bw < fw - (x + margin) {
        // fits to the right
        y = (fh - bh) / 2;
        x += ((fw - x) - bw) / 2;
    } else if bw < x - margin {
        // fits to the left
        y = (fh - bh) / 2;
        x = (x - bw) / 2;
    } else {
        // too tight everywhere: go the way that hangs off-window the least
        let top = bh - y;
        let bottom = bh - (fh - y);
        let left = bw - x;
        let right = bw - (fw - x);

        if left.min(right) < top.min(bottom) {
            y = (fh - bh) / 2;
            if left < right {
                x -= bw + margin;
            } else {
                x += margin + (((fw - x) - bw) / 2).max(0);
            }
        } else {
            x = (fw - bw) / 2;
            if top < bottom {
                y -= bh + margin;
            } else {
                y += margin + (((fh - y) - bh) / 2).max(0);
            }
        }
    }
    Point::new(x, y)
}

/// Pull a rectangle back inside the window, never to a negative origin.
pub fn clamp_into(rect: Rect, window: Size, cfg: &DesktopConfig) -> Rect {
    let mut x = rect.x;
    let mut y = rect.y;
    if x + rect.width > window.width {
        x = window.width - rect.width - cfg.edge_inset;
    }
    if y + rect.height > window.height {
        y = window.height - rect.height - cfg.edge_inset;
    }
    rect.with_origin(Point::new(x.max(0), y.max(0)))
}
