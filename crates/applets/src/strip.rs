//! Slot geometry shared by the icon-strip applets (tray, launcher).
//!
//! Sizing, painting and hit-testing all go through [`IconStrip`], so the
//! rectangle a click is matched against is always the one the icon was
//! painted into.

use panel_core::{Allocation, Rect};

/// Gap before the first slot, between slots and after the last one.
pub const PADDING: u32 = 5;

/// Vertical offset of every slot inside the applet.
pub const SLOT_Y: i32 = 1;

/// Panel height assumed before the applet was ever sized.
pub const DEFAULT_HEIGHT: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconStrip {
    /// Edge length of one square slot.
    pub size: u32,
}

impl IconStrip {
    /// Slots for a panel `height` pixels tall: one pixel of air above and
    /// below each icon.
    pub fn new(height: u32) -> Self {
        Self {
            size: height.saturating_sub(2 * SLOT_Y as u32).max(1),
        }
    }

    pub fn for_allocation(allocation: Option<Allocation>) -> Self {
        Self::new(allocation.map_or(DEFAULT_HEIGHT, |a| a.height))
    }

    /// `PADDING + n × (size + PADDING)`.
    pub fn width(&self, n: usize) -> u32 {
        PADDING + n as u32 * (self.size + PADDING)
    }

    /// Rectangle of slot `k`, applet-local.
    pub fn slot(&self, k: usize) -> Rect {
        let x = PADDING as i32 + k as i32 * (self.size + PADDING) as i32;
        Rect::new(x, SLOT_Y, self.size, self.size)
    }

    /// First of the `n` slots containing the point (inclusive edges).
    pub fn slot_at(&self, n: usize, x: i32, y: i32) -> Option<usize> {
        (0..n).find(|&k| self.slot(k).contains(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_panel_gets_22px_slots() {
        let strip = IconStrip::for_allocation(None);
        assert_eq!(strip.size, 22);
        assert_eq!(strip.width(3), 5 + 3 * 27);
        assert_eq!(strip.slot(2), Rect::new(59, 1, 22, 22));
    }

    #[test]
    fn gaps_between_slots_hit_nothing() {
        let strip = IconStrip::new(24);
        // slot 0 spans x 5..=27, slot 1 starts at 32
        assert_eq!(strip.slot_at(2, 27, 23), Some(0));
        assert_eq!(strip.slot_at(2, 30, 10), None);
        assert_eq!(strip.slot_at(2, 32, 1), Some(1));
        assert_eq!(strip.slot_at(2, 32, 0), None);
        assert_eq!(strip.slot_at(1, 40, 10), None);
    }

    #[test]
    fn slots_stay_inside_the_allocation() {
        for height in [16, 24, 32, 48] {
            let strip = IconStrip::new(height);
            let slot = strip.slot(0);
            assert!(slot.bottom() <= height as i32);
        }
    }
}
