#![no_main]

use arbitrary::Arbitrary;
use deskpane_core::geometry::{Rect, Size};
use deskpane_widgets::{DesktopConfig, DialogPosition};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Policy {
    Center,
    CenterTop,
    AvoidPoint { x: i16, y: i16, margin: u8 },
    CenterOffset { dx: i16, dy: i16 },
    KeepOnScreen,
}

#[derive(Debug, Arbitrary)]
struct Input {
    policy: Policy,
    x: i16,
    y: i16,
    width: u16,
    height: u16,
    window_width: u16,
    window_height: u16,
    full_screen: bool,
}

fuzz_target!(|input: Input| {
    let position = match input.policy {
        Policy::Center => DialogPosition::Center,
        Policy::CenterTop => DialogPosition::CenterTop,
        Policy::AvoidPoint { x, y, margin } => DialogPosition::AvoidPoint {
            x: i32::from(x),
            y: i32::from(y),
            margin: i32::from(margin),
        },
        Policy::CenterOffset { dx, dy } => DialogPosition::CenterOffset {
            dx: i32::from(dx),
            dy: i32::from(dy),
        },
        Policy::KeepOnScreen => DialogPosition::KeepOnScreen,
    };
    let current = Rect::new(
        i32::from(input.x),
        i32::from(input.y),
        i32::from(input.width),
        i32::from(input.height),
    );
    let window = Size::new(i32::from(input.window_width), i32::from(input.window_height));
    let cfg = DesktopConfig::default();

    let placed = position.resolve(current, window, input.full_screen, &cfg);

    assert_eq!(placed.size(), current.size());
    assert!(placed.x >= 0 && placed.y >= 0, "{placed:?}");
    if placed.width + cfg.edge_inset <= window.width {
        assert!(placed.right() <= window.width, "{placed:?} in {window:?}");
    }
    if placed.height + cfg.edge_inset <= window.height {
        assert!(placed.bottom() <= window.height, "{placed:?} in {window:?}");
    }
});
