//! Document model
//!
//! The page is a vertical stack of opaque regions with a few flat elements
//! placed inside them. Nothing here knows about text or content; regions only
//! have heights, elements only have a placement, an optional visual and an
//! animatable [`ElementStyle`].
//!
//! Pinned regions reserve a spacer equal to their pinned scroll distance right
//! after themselves. While the scroll offset is inside the pinned range the
//! region stays put on screen; past it, the region scrolls away normally.

use rustc_hash::FxHashMap;
use thiserror::Error;

use strata_3d::OverlayQuad;
use strata_animation::{PropertyPath, PropertySink, RegionGeometry, ScrollSpan, SinkError, Target};
use strata_core::{Color, Rect};
use strata_platform::Viewport;

/// Pseudo-region spanning the whole document
pub const PAGE: &str = "page";

/// Document construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("duplicate region: {0}")]
    DuplicateRegion(String),

    #[error("duplicate element: {0}")]
    DuplicateElement(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("unknown element: {0}")]
    UnknownElement(String),
}

/// Region height
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Extent {
    /// Multiple of the viewport height
    Viewports(f32),
    Pixels(f32),
}

impl Extent {
    pub fn resolve(&self, viewport_height: f32) -> f32 {
        match *self {
            Extent::Viewports(n) => (n * viewport_height).max(0.0),
            Extent::Pixels(px) => px.max(0.0),
        }
    }
}

/// Where an element sits inside its container
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    Fill,
    /// Fractions of the container
    Relative {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Full width strip along the top edge
    TopBar { height: f32 },
    /// Square centered in the container, at most `max` px per side
    CenteredSquare { max: f32 },
}

impl Placement {
    pub fn resolve(&self, container: &Rect) -> Rect {
        match *self {
            Placement::Fill => *container,
            Placement::Relative {
                x,
                y,
                width,
                height,
            } => Rect::new(
                container.x + x * container.width,
                container.y + y * container.height,
                width * container.width,
                height * container.height,
            ),
            Placement::TopBar { height } => {
                Rect::new(container.x, container.y, container.width, height)
            }
            Placement::CenteredSquare { max } => {
                let side = container.width.min(container.height).min(max).max(0.0);
                Rect::new(
                    container.x + (container.width - side) * 0.5,
                    container.y + (container.height - side) * 0.5,
                    side,
                    side,
                )
            }
        }
    }
}

/// Flat fill drawn in the overlay
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Visual {
    Solid(Color),
    /// Left to right
    Gradient { start: Color, end: Color },
}

/// Point that stays fixed when an element scales
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransformOrigin {
    #[default]
    Center,
    Left,
}

/// Animatable element style
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementStyle {
    pub opacity: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl ElementStyle {
    /// `rect` after translation and scaling about `origin`
    pub fn apply(&self, rect: Rect, origin: TransformOrigin) -> Rect {
        let width = rect.width * self.scale_x.max(0.0);
        let height = rect.height * self.scale_y.max(0.0);
        let x = match origin {
            TransformOrigin::Center => rect.x + (rect.width - width) * 0.5,
            TransformOrigin::Left => rect.x,
        };
        let y = rect.y + (rect.height - height) * 0.5;
        Rect::new(x + self.translate_x, y + self.translate_y, width, height)
    }

    fn get(&self, property: PropertyPath) -> Option<f32> {
        match property {
            PropertyPath::Opacity => Some(self.opacity),
            PropertyPath::TranslateX => Some(self.translate_x),
            PropertyPath::TranslateY => Some(self.translate_y),
            PropertyPath::ScaleX | PropertyPath::Scale => Some(self.scale_x),
            PropertyPath::ScaleY => Some(self.scale_y),
            _ => None,
        }
    }

    fn set(&mut self, property: PropertyPath, value: f32) -> bool {
        match property {
            PropertyPath::Opacity => self.opacity = value.clamp(0.0, 1.0),
            PropertyPath::TranslateX => self.translate_x = value,
            PropertyPath::TranslateY => self.translate_y = value,
            PropertyPath::ScaleX => self.scale_x = value,
            PropertyPath::ScaleY => self.scale_y = value,
            PropertyPath::Scale => {
                self.scale_x = value;
                self.scale_y = value;
            }
            _ => return false,
        }
        true
    }
}

/// Authored element
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSpec {
    pub id: String,
    /// Containing region; `None` pins the element to the viewport
    pub region: Option<String>,
    pub placement: Placement,
    pub visual: Option<Visual>,
    pub origin: TransformOrigin,
}

impl ElementSpec {
    pub fn new(id: impl Into<String>, region: Option<&str>, placement: Placement) -> Self {
        Self {
            id: id.into(),
            region: region.map(str::to_string),
            placement,
            visual: None,
            origin: TransformOrigin::Center,
        }
    }

    pub fn visual(mut self, visual: Visual) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn origin(mut self, origin: TransformOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// Area of an element that swallows pointer presses
#[derive(Clone, Debug, PartialEq)]
pub struct InputMask {
    pub element: String,
    /// Placement relative to the element's screen rect
    pub area: Placement,
}

struct Region {
    id: String,
    extent: Extent,
    pin: Option<ScrollSpan>,
    /// Document-space rect, without the pin spacer
    rect: Rect,
    /// Scroll offsets between which the region is held
    pin_range: Option<(f32, f32)>,
}

struct Element {
    spec: ElementSpec,
    style: ElementStyle,
}

/// Regions, elements and the current scroll offset
pub struct Document {
    regions: Vec<Region>,
    elements: Vec<Element>,
    element_index: FxHashMap<String, usize>,
    masks: Vec<InputMask>,
    surface: Option<String>,
    viewport: Viewport,
    scroll: f32,
    height: f32,
}

impl Document {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            regions: Vec::new(),
            elements: Vec::new(),
            element_index: FxHashMap::default(),
            masks: Vec::new(),
            surface: None,
            viewport,
            scroll: 0.0,
            height: 0.0,
        }
    }

    /// Append a region below the existing ones
    pub fn add_region(&mut self, id: &str, extent: Extent) -> Result<(), DocumentError> {
        if id == PAGE || self.regions.iter().any(|r| r.id == id) {
            return Err(DocumentError::DuplicateRegion(id.to_string()));
        }
        self.regions.push(Region {
            id: id.to_string(),
            extent,
            pin: None,
            rect: Rect::ZERO,
            pin_range: None,
        });
        self.layout();
        Ok(())
    }

    pub fn add_element(&mut self, spec: ElementSpec) -> Result<(), DocumentError> {
        if self.element_index.contains_key(&spec.id) {
            return Err(DocumentError::DuplicateElement(spec.id));
        }
        if let Some(region) = &spec.region {
            if self.region(region).is_none() {
                return Err(DocumentError::UnknownRegion(region.clone()));
            }
        }
        self.element_index.insert(spec.id.clone(), self.elements.len());
        self.elements.push(Element {
            spec,
            style: ElementStyle::default(),
        });
        Ok(())
    }

    pub fn add_mask(&mut self, mask: InputMask) -> Result<(), DocumentError> {
        if !self.element_index.contains_key(&mask.element) {
            return Err(DocumentError::UnknownElement(mask.element));
        }
        self.masks.push(mask);
        Ok(())
    }

    /// Name the element the scene renders into
    pub fn set_surface(&mut self, element: &str) {
        self.surface = Some(element.to_string());
    }

    /// Configured surface id, whether or not the element exists
    pub fn surface_name(&self) -> Option<&str> {
        self.surface.as_deref()
    }

    /// Surface element id, `None` when unset or not present
    pub fn surface(&self) -> Option<&str> {
        self.surface
            .as_deref()
            .filter(|id| self.element_index.contains_key(*id))
    }

    /// Hold `region` on screen across `span`
    pub fn pin(&mut self, region: &str, span: ScrollSpan) -> Result<(), DocumentError> {
        let entry = self
            .regions
            .iter_mut()
            .find(|r| r.id == region)
            .ok_or_else(|| DocumentError::UnknownRegion(region.to_string()))?;
        entry.pin = Some(span);
        self.layout();
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.layout();
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Total document height including pin spacers
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn max_scroll(&self) -> f32 {
        (self.height - self.viewport.height).max(0.0)
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Set the scroll offset, clamped to the document; returns whether it moved
    pub fn set_scroll(&mut self, offset: f32) -> bool {
        if !offset.is_finite() {
            return false;
        }
        let offset = offset.clamp(0.0, self.max_scroll());
        let moved = offset != self.scroll;
        self.scroll = offset;
        moved
    }

    pub fn scroll_by(&mut self, delta: f32) -> bool {
        self.set_scroll(self.scroll + delta)
    }

    pub fn style(&self, id: &str) -> Option<&ElementStyle> {
        self.element_index.get(id).map(|&i| &self.elements[i].style)
    }

    /// Pinned scroll range of `region`
    pub fn pin_range(&self, region: &str) -> Option<(f32, f32)> {
        self.region(region).and_then(|r| r.pin_range)
    }

    /// Element rect on screen after layout, pinning and style
    pub fn element_screen_rect(&self, id: &str) -> Option<Rect> {
        let element = self.element_index.get(id).map(|&i| &self.elements[i])?;
        self.element_rect(element)
    }

    /// Whether a press at `(x, y)` lands on an input mask
    pub fn blocks_press(&self, x: f32, y: f32) -> bool {
        self.masks.iter().any(|mask| {
            self.element_screen_rect(&mask.element)
                .map(|rect| mask.area.resolve(&rect).contains(x, y))
                .unwrap_or(false)
        })
    }

    /// Overlay quads for region-bound (`fixed == false`) or viewport-fixed elements
    pub fn overlay_quads(&self, fixed: bool, out: &mut Vec<OverlayQuad>) {
        let screen = self.viewport_rect();
        for element in &self.elements {
            if element.spec.region.is_none() != fixed {
                continue;
            }
            let Some(visual) = element.spec.visual else {
                continue;
            };
            let opacity = element.style.opacity;
            if opacity <= 0.0 {
                continue;
            }
            let Some(rect) = self.element_rect(element) else {
                continue;
            };
            if rect.intersect(&screen).is_none() {
                continue;
            }
            let quad = match visual {
                Visual::Solid(color) => {
                    OverlayQuad::solid(rect, color.with_alpha(color.a * opacity))
                }
                Visual::Gradient { start, end } => OverlayQuad::gradient(
                    rect,
                    start.with_alpha(start.a * opacity),
                    end.with_alpha(end.a * opacity),
                ),
            };
            out.push(quad);
        }
    }

    fn viewport_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height)
    }

    fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    fn element_rect(&self, element: &Element) -> Option<Rect> {
        let container = match &element.spec.region {
            Some(region) => self.screen_rect(region, self.scroll)?,
            None => self.viewport_rect(),
        };
        let rect = element.spec.placement.resolve(&container);
        Some(element.style.apply(rect, element.spec.origin))
    }

    fn layout(&mut self) {
        let width = self.viewport.width;
        let viewport_height = self.viewport.height;
        let mut y = 0.0;
        for region in &mut self.regions {
            let height = region.extent.resolve(viewport_height);
            region.rect = Rect::new(0.0, y, width, height);
            region.pin_range = region
                .pin
                .map(|span| {
                    let (start, end) = span.resolve(&region.rect, viewport_height);
                    (start, end.max(start))
                });
            let spacer = region.pin_range.map_or(0.0, |(start, end)| end - start);
            y += height + spacer;
        }
        self.height = y;
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
    }
}

impl RegionGeometry for Document {
    fn region_rect(&self, region: &str) -> Option<Rect> {
        if region == PAGE {
            return Some(Rect::new(0.0, 0.0, self.viewport.width, self.height));
        }
        self.region(region).map(|r| r.rect)
    }

    fn screen_rect(&self, region: &str, scroll: f32) -> Option<Rect> {
        if region == PAGE {
            return Some(Rect::new(0.0, -scroll, self.viewport.width, self.height));
        }
        let region = self.region(region)?;
        let held = region
            .pin_range
            .map_or(0.0, |(start, end)| (scroll - start).clamp(0.0, end - start));
        let rect = region.rect;
        Some(Rect::new(rect.x, rect.y - scroll + held, rect.width, rect.height))
    }

    fn viewport_height(&self) -> f32 {
        self.viewport.height
    }
}

impl PropertySink for Document {
    fn write(
        &mut self,
        target: &Target,
        property: PropertyPath,
        value: f32,
    ) -> Result<(), SinkError> {
        let Target::Element(id) = target else {
            return Err(SinkError::UnknownTarget(target.to_string()));
        };
        let index = *self
            .element_index
            .get(id)
            .ok_or_else(|| SinkError::UnknownTarget(target.to_string()))?;
        if self.elements[index].style.set(property, value) {
            Ok(())
        } else {
            Err(SinkError::Unsupported {
                target: target.to_string(),
                property,
            })
        }
    }

    fn read(&self, target: &Target, property: PropertyPath) -> Option<f32> {
        let Target::Element(id) = target else {
            return None;
        };
        self.style(id).and_then(|style| style.get(property))
    }
}
