#![forbid(unsafe_code)]

//! Layered z-order for dialogs and input blockers.
//!
//! Every dialog sits on a numeric layer; higher layers are above lower ones
//! and, within a layer, the most recently added or raised item is on top. A
//! modal dialog's [`InputBlocker`] sits one layer below the dialog and covers
//! the whole display, so hit testing anywhere outside the dialog lands on the
//! blocker and the input is swallowed.
//!
//! # Invariants
//!
//! 1. `slots` is ordered bottom to top: by layer, then by raise order.
//! 2. An item appears at most once.

use std::sync::atomic::{AtomicU64, Ordering};

use deskpane_core::geometry::{Point, Rect};

use crate::modal::DialogId;

static BLOCKER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of one input blocker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockerId(u64);

impl BlockerId {
    fn next() -> Self {
        Self(BLOCKER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Transparent overlay that swallows input beneath a modal dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBlocker {
    id: BlockerId,
    owner: DialogId,
    layer: i32,
    bounds: Rect,
}

impl InputBlocker {
    pub(crate) fn new(owner: DialogId, layer: i32, bounds: Rect) -> Self {
        Self {
            id: BlockerId::next(),
            owner,
            layer,
            bounds,
        }
    }

    pub fn id(&self) -> BlockerId {
        self.id
    }

    /// The modal dialog this blocker protects.
    pub fn owner(&self) -> DialogId {
        self.owner
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }
}

/// Something occupying a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerItem {
    Dialog(DialogId),
    Blocker(BlockerId),
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    item: LayerItem,
    layer: i32,
    bounds: Rect,
}

/// Z-ordered stack of layer items.
#[derive(Debug, Default)]
pub struct LayeredPane {
    slots: Vec<Slot>,
}

impl LayeredPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item` on top of `layer`. An item already present is moved.
    pub fn add(&mut self, item: LayerItem, layer: i32, bounds: Rect) {
        self.remove(item);
        let at = self
            .slots
            .iter()
            .position(|slot| slot.layer > layer)
            .unwrap_or(self.slots.len());
        self.slots.insert(at, Slot {
            item,
            layer,
            bounds,
        });
    }

    /// Remove `item`, returning whether it was present.
    pub fn remove(&mut self, item: LayerItem) -> bool {
        match self.slots.iter().position(|slot| slot.item == item) {
            Some(idx) => {
                self.slots.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, item: LayerItem) -> bool {
        self.slots.iter().any(|slot| slot.item == item)
    }

    pub fn layer_of(&self, item: LayerItem) -> Option<i32> {
        self.slots
            .iter()
            .find(|slot| slot.item == item)
            .map(|slot| slot.layer)
    }

    pub fn set_bounds(&mut self, item: LayerItem, bounds: Rect) {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.item == item) {
            slot.bounds = bounds;
        }
    }

    /// Raise `item` to the top of its own layer.
    pub fn move_to_front(&mut self, item: LayerItem) {
        if let Some(slot) = self.slots.iter().find(|slot| slot.item == item).copied() {
            self.add(slot.item, slot.layer, slot.bounds);
        }
    }

    /// Topmost item whose bounds contain `point`.
    pub fn top_at(&self, point: Point) -> Option<LayerItem> {
        self.slots
            .iter()
            .rev()
            .find(|slot| slot.bounds.contains(point))
            .map(|slot| slot.item)
    }

    /// Items from bottom to top.
    pub fn items(&self) -> impl Iterator<Item = (LayerItem, i32)> + '_ {
        self.slots.iter().map(|slot| (slot.item, slot.layer))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
