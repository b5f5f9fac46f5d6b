//! Scroll progress
//!
//! Maps the document scroll offset onto `[0, 1]` for a tracked region. The
//! mapping is defined by a start edge and an end edge, each pairing a point
//! on the region with a point on the viewport:
//!
//! - `"top top"`: region top meets viewport top
//! - `"top bottom"` / `"start end"`: region top enters at the viewport bottom
//! - `"bottom top"`: region bottom leaves through the viewport top
//! - `"center 80%"`: region center crosses 80% down the viewport
//! - `"+=220%"` (end only): 2.2 viewport heights after the start
//! - `"+=600"` (end only): 600 px after the start
//!
//! Region rects are read in document space from the unpinned layout, so a
//! pinned region keeps producing progress while it is held on screen.

use std::str::FromStr;

use slotmap::{new_key_type, SlotMap};
use strata_core::Rect;

use crate::error::AnimationError;

/// Point along a region or viewport, from its top
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    Start,
    Center,
    End,
    /// Fraction of the extent
    Fraction(f32),
    /// Fixed offset in logical pixels
    Pixels(f32),
}

impl Anchor {
    /// Offset from the top of an extent of length `extent`
    pub fn resolve(&self, extent: f32) -> f32 {
        match *self {
            Anchor::Start => 0.0,
            Anchor::Center => extent * 0.5,
            Anchor::End => extent,
            Anchor::Fraction(f) => extent * f,
            Anchor::Pixels(px) => px,
        }
    }
}

impl FromStr for Anchor {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let anchor = match s {
            "top" | "start" => Anchor::Start,
            "center" => Anchor::Center,
            "bottom" | "end" => Anchor::End,
            _ => {
                if let Some(pct) = s.strip_suffix('%') {
                    let value: f32 = pct
                        .parse()
                        .map_err(|_| AnimationError::InvalidEdge(s.to_string()))?;
                    Anchor::Fraction(value / 100.0)
                } else {
                    let px = s.strip_suffix("px").unwrap_or(s);
                    let value: f32 = px
                        .parse()
                        .map_err(|_| AnimationError::InvalidEdge(s.to_string()))?;
                    Anchor::Pixels(value)
                }
            }
        };
        Ok(anchor)
    }
}

/// Region anchor paired with a viewport anchor
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub region: Anchor,
    pub viewport: Anchor,
}

impl Edge {
    pub const fn new(region: Anchor, viewport: Anchor) -> Self {
        Self { region, viewport }
    }

    /// Scroll offset at which the two anchors line up
    pub fn scroll_offset(&self, region: &Rect, viewport_height: f32) -> f32 {
        region.y + self.region.resolve(region.height) - self.viewport.resolve(viewport_height)
    }
}

impl FromStr for Edge {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(region), Some(viewport), None) => {
                Ok(Edge::new(region.parse()?, viewport.parse()?))
            }
            _ => Err(AnimationError::InvalidEdge(s.to_string())),
        }
    }
}

/// End of a scroll span
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EndEdge {
    Edge(Edge),
    /// Viewport heights past the start
    ViewportHeights(f32),
    /// Logical pixels past the start
    Pixels(f32),
}

impl FromStr for EndEdge {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(amount) = s.strip_prefix("+=") else {
            return Ok(EndEdge::Edge(s.parse()?));
        };
        let invalid = || AnimationError::InvalidEdge(s.to_string());
        if let Some(pct) = amount.strip_suffix('%') {
            let value: f32 = pct.parse().map_err(|_| invalid())?;
            Ok(EndEdge::ViewportHeights(value / 100.0))
        } else {
            let px = amount.strip_suffix("px").unwrap_or(amount);
            let value: f32 = px.parse().map_err(|_| invalid())?;
            Ok(EndEdge::Pixels(value))
        }
    }
}

/// Start and end edges of a tracked scroll range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSpan {
    pub start: Edge,
    pub end: EndEdge,
}

impl ScrollSpan {
    pub fn new(start: Edge, end: EndEdge) -> Self {
        Self { start, end }
    }

    /// Parse from authoring strings, e.g. `("top top", "+=220%")`
    pub fn parse(start: &str, end: &str) -> Result<Self, AnimationError> {
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    /// Scroll offsets where progress is 0 and 1
    pub fn resolve(&self, region: &Rect, viewport_height: f32) -> (f32, f32) {
        let start = self.start.scroll_offset(region, viewport_height);
        let end = match self.end {
            EndEdge::Edge(edge) => edge.scroll_offset(region, viewport_height),
            EndEdge::ViewportHeights(n) => start + n * viewport_height,
            EndEdge::Pixels(px) => start + px,
        };
        (start, end)
    }

    /// Scroll distance covered by the span, never negative
    pub fn distance(&self, region: &Rect, viewport_height: f32) -> f32 {
        let (start, end) = self.resolve(region, viewport_height);
        (end - start).max(0.0)
    }

    /// Progress at `scroll`, clamped to `[0, 1]`
    pub fn progress(&self, scroll: f32, region: &Rect, viewport_height: f32) -> f32 {
        let (start, end) = self.resolve(region, viewport_height);
        if end <= start {
            return if scroll >= start { 1.0 } else { 0.0 };
        }
        ((scroll - start) / (end - start)).clamp(0.0, 1.0)
    }
}

/// Layout information the progress and visibility trackers read
pub trait RegionGeometry {
    /// Region rect in document space, unaffected by pinning
    fn region_rect(&self, region: &str) -> Option<Rect>;

    /// Region rect on screen at `scroll`, after pinning
    fn screen_rect(&self, region: &str, scroll: f32) -> Option<Rect>;

    /// Visible viewport height
    fn viewport_height(&self) -> f32;
}

new_key_type! {
    /// Handle to an observed region
    pub struct ProgressId;
}

/// Latest progress for one observed region
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressSample {
    pub value: f32,
    pub region: String,
}

struct Observed {
    region: String,
    span: ScrollSpan,
    last: Option<ProgressSample>,
}

/// Tracks progress for every observed region
#[derive(Default)]
pub struct ScrollProgressSource {
    observed: SlotMap<ProgressId, Observed>,
}

impl ScrollProgressSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `region` over `span`
    pub fn observe(&mut self, region: impl Into<String>, span: ScrollSpan) -> ProgressId {
        self.observed.insert(Observed {
            region: region.into(),
            span,
            last: None,
        })
    }

    pub fn unobserve(&mut self, id: ProgressId) -> bool {
        self.observed.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Recompute every observed region at `scroll`
    pub fn sample_all<G: RegionGeometry>(&mut self, scroll: f32, geometry: &G) {
        let viewport_height = geometry.viewport_height();
        for observed in self.observed.values_mut() {
            match geometry.region_rect(&observed.region) {
                Some(rect) => {
                    observed.last = Some(ProgressSample {
                        value: observed.span.progress(scroll, &rect, viewport_height),
                        region: observed.region.clone(),
                    });
                }
                None => {
                    if observed.last.is_some() {
                        tracing::debug!("progress: region {} is gone", observed.region);
                    }
                    observed.last = None;
                }
            }
        }
    }

    /// Last sample for `id`; `None` until sampled or when the region is missing
    pub fn latest(&self, id: ProgressId) -> Option<&ProgressSample> {
        self.observed.get(id).and_then(|o| o.last.as_ref())
    }

    /// Latest value, 0 when unavailable
    pub fn value(&self, id: ProgressId) -> f32 {
        self.latest(id).map_or(0.0, |s| s.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Page {
        regions: Vec<(&'static str, Rect)>,
        viewport_height: f32,
    }

    impl RegionGeometry for Page {
        fn region_rect(&self, region: &str) -> Option<Rect> {
            self.regions
                .iter()
                .find(|(name, _)| *name == region)
                .map(|(_, r)| *r)
        }

        fn screen_rect(&self, region: &str, scroll: f32) -> Option<Rect> {
            self.region_rect(region).map(|r| Rect::new(r.x, r.y - scroll, r.width, r.height))
        }

        fn viewport_height(&self) -> f32 {
            self.viewport_height
        }
    }

    #[test]
    fn test_midpoint_maps_linearly() {
        // Region top enters the viewport at 1000, mapping ends at 3000
        let page = Page {
            regions: vec![("story", Rect::new(0.0, 1800.0, 1280.0, 2000.0))],
            viewport_height: 800.0,
        };
        let mut source = ScrollProgressSource::new();
        let id = source.observe("story", ScrollSpan::parse("top bottom", "+=2000").unwrap());

        source.sample_all(2000.0, &page);
        let sample = source.latest(id).unwrap();
        assert_eq!(sample.value, 0.5);
        assert_eq!(sample.region, "story");
    }

    #[test]
    fn test_progress_is_clamped_and_monotone() {
        let region = Rect::new(0.0, 1000.0, 1280.0, 2000.0);
        let span = ScrollSpan::parse("top top", "bottom top").unwrap();
        assert_eq!(span.resolve(&region, 800.0), (1000.0, 3000.0));
        assert_eq!(span.progress(2000.0, &region, 800.0), 0.5);

        let mut last = -1.0;
        for scroll in (0..4000).step_by(100) {
            let p = span.progress(scroll as f32, &region, 800.0);
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_relative_end_uses_viewport_height() {
        let region = Rect::new(0.0, 0.0, 1280.0, 800.0);
        let span = ScrollSpan::parse("top top", "+=220%").unwrap();
        assert_eq!(span.resolve(&region, 800.0), (0.0, 1760.0));
        assert_eq!(span.distance(&region, 800.0), 1760.0);
    }

    #[test]
    fn test_degenerate_span_steps() {
        let region = Rect::new(0.0, 500.0, 100.0, 0.0);
        let span = ScrollSpan::parse("top top", "bottom top").unwrap();
        assert_eq!(span.progress(499.0, &region, 800.0), 0.0);
        assert_eq!(span.progress(500.0, &region, 800.0), 1.0);
    }

    #[test]
    fn test_edge_parsing() {
        assert_eq!(
            "center 80%".parse::<Edge>().unwrap(),
            Edge::new(Anchor::Center, Anchor::Fraction(0.8))
        );
        assert_eq!(
            "top 100px".parse::<Edge>().unwrap(),
            Edge::new(Anchor::Start, Anchor::Pixels(100.0))
        );
        assert_eq!("+=600".parse::<EndEdge>().unwrap(), EndEdge::Pixels(600.0));
        assert!("top".parse::<Edge>().is_err());
        assert!("top sideways".parse::<Edge>().is_err());
        assert!("+=lots".parse::<EndEdge>().is_err());
    }

    #[test]
    fn test_missing_region_yields_no_sample() {
        let page = Page {
            regions: vec![],
            viewport_height: 800.0,
        };
        let mut source = ScrollProgressSource::new();
        let id = source.observe("ghost", ScrollSpan::parse("top top", "+=100").unwrap());
        source.sample_all(50.0, &page);
        assert!(source.latest(id).is_none());
        assert_eq!(source.value(id), 0.0);
    }
}
