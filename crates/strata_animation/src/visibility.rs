//! Region visibility
//!
//! Intersection tracking for trigger regions. A watch reports a change only
//! when its visible ratio crosses the configured threshold in either
//! direction, the way intersection observers fire.

use slotmap::{new_key_type, SlotMap};
use strata_core::Rect;

use crate::progress::RegionGeometry;

/// Per-edge adjustment of the viewport used as the intersection root
///
/// Negative values shrink the root, e.g. `bottom: -100.0` requires a region
/// to be 100 px inside the viewport before it counts as visible.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RootMargin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl RootMargin {
    pub const NONE: RootMargin = RootMargin {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn bottom(bottom: f32) -> Self {
        Self {
            bottom,
            ..Self::NONE
        }
    }

    pub fn all(margin: f32) -> Self {
        Self {
            top: margin,
            right: margin,
            bottom: margin,
            left: margin,
        }
    }

    pub fn apply(&self, root: &Rect) -> Rect {
        root.inset_by(self.top, self.right, self.bottom, self.left)
    }
}

/// Fraction of `region` inside `root` after applying `margin`
///
/// A zero-area region counts as fully visible while it touches the root.
pub fn visible_ratio(region: &Rect, root: &Rect, margin: RootMargin) -> f32 {
    let root = margin.apply(root);
    let area = region.area();
    if area <= 0.0 {
        let inside = region.x >= root.x
            && region.x <= root.right()
            && region.y >= root.y
            && region.y <= root.bottom();
        return if inside { 1.0 } else { 0.0 };
    }
    region
        .intersect(&root)
        .map_or(0.0, |overlap| (overlap.area() / area).clamp(0.0, 1.0))
}

new_key_type! {
    /// Handle to a visibility watch
    pub struct VisibilityId;
}

/// Threshold crossing reported by [`VisibilityObserver::update`]
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityChange {
    pub id: VisibilityId,
    pub region: String,
    pub ratio: f32,
    /// Ratio is at or above the threshold
    pub visible: bool,
}

struct Watch {
    region: String,
    threshold: f32,
    margin: RootMargin,
    visible: bool,
    ratio: f32,
}

/// Watches trigger regions against the viewport
#[derive(Default)]
pub struct VisibilityObserver {
    watches: SlotMap<VisibilityId, Watch>,
}

impl VisibilityObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `region`; a threshold of 0 means "any pixel visible"
    pub fn observe(
        &mut self,
        region: impl Into<String>,
        threshold: f32,
        margin: RootMargin,
    ) -> VisibilityId {
        self.watches.insert(Watch {
            region: region.into(),
            threshold: threshold.clamp(0.0, 1.0),
            margin,
            visible: false,
            ratio: 0.0,
        })
    }

    pub fn unobserve(&mut self, id: VisibilityId) -> bool {
        self.watches.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub fn ratio(&self, id: VisibilityId) -> f32 {
        self.watches.get(id).map_or(0.0, |w| w.ratio)
    }

    /// Recompute every watch; returns the ones that crossed their threshold
    pub fn update<G: RegionGeometry>(
        &mut self,
        scroll: f32,
        viewport_width: f32,
        geometry: &G,
    ) -> Vec<VisibilityChange> {
        let root = Rect::new(0.0, 0.0, viewport_width, geometry.viewport_height());
        let mut changes = Vec::new();
        for (id, watch) in self.watches.iter_mut() {
            let ratio = geometry
                .screen_rect(&watch.region, scroll)
                .map_or(0.0, |rect| visible_ratio(&rect, &root, watch.margin));
            watch.ratio = ratio;

            let visible = if watch.threshold <= 0.0 {
                ratio > 0.0
            } else {
                ratio >= watch.threshold
            };
            if visible != watch.visible {
                watch.visible = visible;
                changes.push(VisibilityChange {
                    id,
                    region: watch.region.clone(),
                    ratio,
                    visible,
                });
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Strip(Rect);

    impl RegionGeometry for Strip {
        fn region_rect(&self, _: &str) -> Option<Rect> {
            Some(self.0)
        }

        fn screen_rect(&self, _: &str, scroll: f32) -> Option<Rect> {
            Some(Rect::new(self.0.x, self.0.y - scroll, self.0.width, self.0.height))
        }

        fn viewport_height(&self) -> f32 {
            1000.0
        }
    }

    #[test]
    fn test_visible_ratio() {
        let root = Rect::new(0.0, 0.0, 1000.0, 1000.0);
        let half = Rect::new(0.0, 900.0, 1000.0, 200.0);
        assert_eq!(visible_ratio(&half, &root, RootMargin::NONE), 0.5);
        assert_eq!(visible_ratio(&half, &root, RootMargin::bottom(-100.0)), 0.0);
        assert_eq!(
            visible_ratio(&Rect::new(0.0, 2000.0, 10.0, 10.0), &root, RootMargin::NONE),
            0.0
        );
    }

    #[test]
    fn test_reports_threshold_crossings_only() {
        // 1000px tall region starting at document y = 1000
        let page = Strip(Rect::new(0.0, 1000.0, 1000.0, 1000.0));
        let mut observer = VisibilityObserver::new();
        let id = observer.observe("section", 0.1, RootMargin::NONE);

        assert!(observer.update(0.0, 1000.0, &page).is_empty());
        // 5% visible: below threshold
        assert!(observer.update(50.0, 1000.0, &page).is_empty());
        // 20% visible: crossed
        let changes = observer.update(200.0, 1000.0, &page);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].visible);
        assert_eq!(changes[0].id, id);
        // Still visible, no new report
        assert!(observer.update(400.0, 1000.0, &page).is_empty());
        // Back out
        let changes = observer.update(0.0, 1000.0, &page);
        assert!(!changes[0].visible);
    }
}
