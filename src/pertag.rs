//! Per-tag layout configuration.
//!
//! Slot 0 belongs to the "all tags" view and slot `n` to tag `n - 1`. The
//! monitor's live fields are authoritative for the current slot; mutators
//! commit them back immediately and a tag switch restores the new slot.

use crate::client::TagMask;
use crate::layout::{AxisConfig, LayoutKind};
use x11rb::protocol::xproto::Window;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSnapshot {
    pub nmaster: usize,
    pub mfact: f32,
    pub axis: AxisConfig,
    pub layouts: [LayoutKind; 2],
    pub selected_layout: usize,
    pub gap: i32,
    pub show_bar: bool,
    pub show_extra_bar: bool,
}

#[derive(Debug, Clone)]
pub struct Pertag {
    current: usize,
    previous: usize,
    slots: Vec<LayoutSnapshot>,
    prev_zooms: Vec<Option<Window>>,
}

impl Pertag {
    pub fn new(tag_count: usize, initial: LayoutSnapshot) -> Self {
        Self {
            current: 1,
            previous: 1,
            slots: vec![initial; tag_count + 1],
            prev_zooms: vec![None; tag_count + 1],
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn previous(&self) -> usize {
        self.previous
    }

    pub fn snapshot(&self) -> &LayoutSnapshot {
        &self.slots[self.current]
    }

    /// Writes the live values back into the current slot.
    pub fn commit(&mut self, snapshot: LayoutSnapshot) {
        self.slots[self.current] = snapshot;
    }

    pub fn switch_to(&mut self, slot: usize) {
        if slot < self.slots.len() {
            self.previous = self.current;
            self.current = slot;
        }
    }

    pub fn swap_with_previous(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
    }

    pub fn prev_zoom(&self) -> Option<Window> {
        self.prev_zooms[self.current]
    }

    pub fn set_prev_zoom(&mut self, window: Option<Window>) {
        self.prev_zooms[self.current] = window;
    }

    /// Drops every remembered zoom target pointing at `window`.
    pub fn forget(&mut self, window: Window) {
        for zoom in &mut self.prev_zooms {
            if *zoom == Some(window) {
                *zoom = None;
            }
        }
    }

    /// Slot for a tag mask: 0 for the full mask, otherwise the lowest tag.
    pub fn slot_for_mask(mask: TagMask, all_tags: TagMask) -> usize {
        if mask & all_tags == all_tags {
            0
        } else {
            mask.trailing_zeros() as usize + 1
        }
    }

    pub fn slot_contains(slot: usize, mask: TagMask) -> bool {
        slot == 0 || mask & (1 << (slot - 1)) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(nmaster: usize) -> LayoutSnapshot {
        LayoutSnapshot {
            nmaster,
            mfact: 0.55,
            axis: AxisConfig::default(),
            layouts: [LayoutKind::Tile, LayoutKind::Floating],
            selected_layout: 0,
            gap: 4,
            show_bar: true,
            show_extra_bar: false,
        }
    }

    #[test]
    fn committed_values_survive_a_round_trip() {
        let mut pertag = Pertag::new(9, snapshot(1));
        pertag.commit(snapshot(3));
        pertag.switch_to(2);
        assert_eq!(pertag.snapshot().nmaster, 1);
        pertag.swap_with_previous();
        assert_eq!(pertag.current(), 1);
        assert_eq!(pertag.snapshot().nmaster, 3);
    }

    #[test]
    fn slot_for_mask_picks_lowest_tag_or_all() {
        assert_eq!(Pertag::slot_for_mask(0b100, 0x1ff), 3);
        assert_eq!(Pertag::slot_for_mask(0b110, 0x1ff), 2);
        assert_eq!(Pertag::slot_for_mask(0x1ff, 0x1ff), 0);
        assert!(Pertag::slot_contains(0, 0b1));
        assert!(Pertag::slot_contains(2, 0b10));
        assert!(!Pertag::slot_contains(3, 0b10));
    }

    #[test]
    fn zoom_targets_are_per_slot() {
        let mut pertag = Pertag::new(9, snapshot(1));
        pertag.set_prev_zoom(Some(42));
        pertag.switch_to(4);
        assert_eq!(pertag.prev_zoom(), None);
        pertag.switch_to(1);
        assert_eq!(pertag.prev_zoom(), Some(42));
        pertag.forget(42);
        assert_eq!(pertag.prev_zoom(), None);
    }

    #[test]
    fn switching_to_unknown_slot_is_ignored() {
        let mut pertag = Pertag::new(3, snapshot(1));
        pertag.switch_to(9);
        assert_eq!(pertag.current(), 1);
    }
}
