use panel_core::Rect;

/// Regions of the panel that need repainting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Damage {
    rects: Vec<Rect>,
}

impl Damage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rect: Rect) {
        if rect.is_empty() || self.rects.iter().any(|r| covers(r, &rect)) {
            return;
        }
        self.rects.retain(|r| !covers(&rect, r));
        self.rects.push(rect);
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn intersects(&self, rect: &Rect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Single rectangle covering every damaged region.
    pub fn bounds(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|a, b| a.union(&b))
    }

    pub fn take(&mut self) -> Damage {
        std::mem::take(self)
    }
}

fn covers(outer: &Rect, inner: &Rect) -> bool {
    outer.x <= inner.x
        && outer.y <= inner.y
        && outer.right() >= inner.right()
        && outer.bottom() >= inner.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covered_rects_collapse() {
        let mut damage = Damage::new();
        damage.add(Rect::new(10, 0, 5, 5));
        damage.add(Rect::new(0, 0, 100, 24));
        damage.add(Rect::new(20, 0, 5, 5));
        assert_eq!(damage.rects(), &[Rect::new(0, 0, 100, 24)]);
    }

    #[test]
    fn empty_rects_are_ignored() {
        let mut damage = Damage::new();
        damage.add(Rect::new(10, 0, 0, 24));
        assert!(damage.is_empty());
        assert_eq!(damage.bounds(), None);
    }

    #[test]
    fn take_leaves_nothing_behind() {
        let mut damage = Damage::new();
        damage.add(Rect::new(1, 1, 1, 1));
        damage.add(Rect::new(5, 1, 1, 1));
        let taken = damage.take();
        assert_eq!(taken.bounds(), Some(Rect::new(1, 1, 5, 1)));
        assert!(damage.is_empty());
    }
}
