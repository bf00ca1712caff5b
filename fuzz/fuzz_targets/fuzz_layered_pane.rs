#![no_main]

use arbitrary::Arbitrary;
use deskpane_core::geometry::{Point, Rect};
use deskpane_widgets::{DialogId, LayerItem, LayeredPane};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Add { dialog: u8, layer: i8, x: u8, y: u8, w: u8, h: u8 },
    Remove { dialog: u8 },
    Raise { dialog: u8 },
    Probe { x: u8, y: u8 },
}

fuzz_target!(|ops: Vec<Op>| {
    let mut pane = LayeredPane::new();
    for op in ops {
        match op {
            Op::Add { dialog, layer, x, y, w, h } => {
                let item = LayerItem::Dialog(DialogId::from_raw(u64::from(dialog)));
                let bounds = Rect::new(x.into(), y.into(), w.into(), h.into());
                pane.add(item, i32::from(layer), bounds);
                assert_eq!(pane.layer_of(item), Some(i32::from(layer)));
            }
            Op::Remove { dialog } => {
                let item = LayerItem::Dialog(DialogId::from_raw(u64::from(dialog)));
                pane.remove(item);
                assert!(!pane.contains(item));
            }
            Op::Raise { dialog } => {
                let item = LayerItem::Dialog(DialogId::from_raw(u64::from(dialog)));
                let before = pane.len();
                pane.move_to_front(item);
                assert_eq!(pane.len(), before);
            }
            Op::Probe { x, y } => {
                let _ = pane.top_at(Point::new(x.into(), y.into()));
            }
        }

        let layers: Vec<i32> = pane.items().map(|(_, layer)| layer).collect();
        assert!(layers.windows(2).all(|w| w[0] <= w[1]), "{layers:?}");
        let mut seen: Vec<LayerItem> = pane.items().map(|(item, _)| item).collect();
        let total = seen.len();
        seen.sort_by_key(|item| match item {
            LayerItem::Dialog(id) => id.id(),
            LayerItem::Blocker(id) => u64::MAX - id.id(),
        });
        seen.dedup();
        assert_eq!(seen.len(), total);
    }
});
