//! Stage
//!
//! Mounts a [`Page`] against an event bus and a frame scheduler and keeps
//! every component in step:
//!
//! - the viewport classifier decides on every resize whether the desktop-only
//!   effects (pointer glow, smooth scroll) are mounted
//! - native scrolling listens behind smooth scrolling, which stops propagation
//!   while it is mounted
//! - each frame runs viewport sync, scroll glide, progress sampling, timeline
//!   evaluation, pointer springs and rendering, in that order
//!
//! The renderer is the only component allowed to fail at mount. Everything
//! else keeps running without it, so a page with no drawing surface still
//! scrolls and animates its elements.

use strata_3d::{
    build_chip_scene, FrameRenderer, OverlayQuad, RenderQuality, Scene, SceneError, SurfaceSize,
};
use strata_animation::{
    PointerTracker, ProgressId, PropertyPath, PropertySink, ScrollProgressSource, SinkError,
    SmoothScroll, Target, TimelineEngine, TimelineId, TimelineState, VisibilityId,
    VisibilityObserver,
};
use strata_core::{shared, Color, DisposeBag, OnDispose, Shared};
use strata_platform::{
    DispatchOutcome, Event, EventBus, EventKind, FramePhase, FrameScheduler, FrameStats,
    Propagation, Viewport, ViewportClass, ViewportClassifier, ViewportTransition,
};

use crate::authoring::Page;
use crate::config::StrataConfig;
use crate::document::Document;
use crate::error::Result;

/// Priority of the smooth scroll interceptors
const SMOOTH_SCROLL_PRIORITY: i32 = 100;
/// Priority of the input mask; ahead of every press consumer
const INPUT_MASK_PRIORITY: i32 = 100;
/// Native scrolling runs after everything else
const NATIVE_SCROLL_PRIORITY: i32 = -100;

/// Base color of the pointer glow layers
const GLOW_COLOR: Color = Color::WHITE;

/// Ids tying one mounted timeline to its progress and visibility watches
#[derive(Clone, Copy, Debug)]
struct Binding {
    timeline: TimelineId,
    progress: ProgressId,
    visibility: VisibilityId,
}

/// Press routing counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PressStats {
    /// Swallowed by an input mask
    pub blocked: usize,
    /// Reached the page
    pub delivered: usize,
}

/// Routes element writes to the document and object writes to the scene
struct StageSink<'a> {
    document: &'a mut Document,
    scene: &'a mut Scene,
}

impl PropertySink for StageSink<'_> {
    fn write(
        &mut self,
        target: &Target,
        property: PropertyPath,
        value: f32,
    ) -> std::result::Result<(), SinkError> {
        match target {
            Target::Element(_) => self.document.write(target, property, value),
            Target::Object(_) => self.scene.write(target, property, value),
        }
    }

    fn read(&self, target: &Target, property: PropertyPath) -> Option<f32> {
        match target {
            Target::Element(_) => self.document.read(target, property),
            Target::Object(_) => self.scene.read(target, property),
        }
    }
}

/// Everything the listeners and frame callbacks share
pub struct StageState {
    config: StrataConfig,
    classifier: ViewportClassifier,
    document: Document,
    scene: Scene,
    engine: TimelineEngine,
    bindings: Vec<Binding>,
    progress: ScrollProgressSource,
    visibility: VisibilityObserver,
    pointer: Option<PointerTracker>,
    smooth: Option<SmoothScroll>,
    renderer: Option<Box<dyn FrameRenderer>>,
    renderer_error: Option<String>,
    overlay: Vec<OverlayQuad>,
    presses: PressStats,
    /// Scroll or layout changed since the last progress sample
    dirty: bool,
}

impl StageState {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn engine(&self) -> &TimelineEngine {
        &self.engine
    }

    pub fn class(&self) -> ViewportClass {
        self.classifier.class()
    }

    pub fn pointer(&self) -> Option<&PointerTracker> {
        self.pointer.as_ref()
    }

    pub fn smooth_scroll(&self) -> Option<&SmoothScroll> {
        self.smooth.as_ref()
    }

    pub fn presses(&self) -> PressStats {
        self.presses
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Overlay drawn by the last rendered frame
    pub fn overlay(&self) -> &[OverlayQuad] {
        &self.overlay
    }

    /// Mounted timeline by name
    pub fn timeline_id(&self, name: &str) -> Option<TimelineId> {
        self.bindings
            .iter()
            .map(|b| b.timeline)
            .find(|&id| self.engine.timeline(id).map_or(false, |t| t.name() == name))
    }

    pub fn timeline_state(&self, name: &str) -> Option<TimelineState> {
        self.timeline_id(name).and_then(|id| self.engine.state(id))
    }

    /// Resample progress and visibility and feed the engine
    fn sample(&mut self) {
        let scroll = self.document.scroll();
        self.progress.sample_all(scroll, &self.document);
        for binding in &self.bindings {
            let value = self.progress.value(binding.progress);
            self.engine.set_progress(binding.timeline, value);
        }

        let width = self.document.viewport().width;
        for change in self.visibility.update(scroll, width, &self.document) {
            if !change.visible {
                continue;
            }
            let binding = self.bindings.iter().find(|b| b.visibility == change.id);
            if let Some(binding) = binding {
                self.engine.on_visibility(binding.timeline, change.ratio);
            }
        }
        self.dirty = false;
    }

    /// Apply a new viewport; returns the class transition, if any
    fn resize(&mut self, viewport: Viewport) -> Option<ViewportTransition> {
        let transition = self.classifier.observe(viewport);
        self.document.set_viewport(viewport);
        self.scene
            .camera_mut()
            .set_viewport(viewport.width, viewport.height);

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(SurfaceSize::new(
                viewport.width,
                viewport.height,
                viewport.scale_factor,
            ));
            if let Some(transition) = transition {
                renderer.set_quality(self.config.quality(transition.to));
            }
        }
        if let Some(smooth) = self.smooth.as_mut() {
            smooth.set_limit(self.document.max_scroll());
        }
        self.sample();
        transition
    }

    /// Scroll the document directly; marks progress stale when it moved
    fn scroll_by(&mut self, delta: f32) {
        if self.document.scroll_by(delta) {
            self.dirty = true;
        }
    }

    fn advance_timelines(&mut self, time: f64) {
        let mut sink = StageSink {
            document: &mut self.document,
            scene: &mut self.scene,
        };
        self.engine.advance(time, &mut sink);
    }

    fn render(&mut self, time_ms: f64) -> anyhow::Result<()> {
        if self.config.render.idle_oscillation {
            self.scene.tick(time_ms);
        }

        let StageState {
            document,
            scene,
            renderer,
            overlay,
            pointer,
            ..
        } = self;

        overlay.clear();
        document.overlay_quads(false, overlay);
        if let Some(pointer) = pointer {
            for (layer, rect) in pointer.glow_layers() {
                overlay.push(OverlayQuad::glow(
                    rect,
                    GLOW_COLOR.with_alpha(layer.alpha),
                    layer.falloff,
                ));
            }
        }
        document.overlay_quads(true, overlay);

        let Some(renderer) = renderer.as_mut() else {
            return Ok(());
        };
        if renderer.is_disposed() {
            return Ok(());
        }
        renderer.render(scene, overlay)?;
        Ok(())
    }
}

/// Handles cloned into listeners and frame callbacks
#[derive(Clone)]
struct Wiring {
    bus: EventBus,
    frames: FrameScheduler,
    state: Shared<StageState>,
}

/// A mounted page
pub struct Stage {
    wiring: Wiring,
    bag: DisposeBag,
    desktop: Shared<DisposeBag>,
    mounted: bool,
}

impl Stage {
    /// Mount `page` at `viewport`
    ///
    /// `create_renderer` is only called when the document names an existing
    /// drawing surface. A missing surface or a failing renderer is logged and
    /// recorded; the rest of the stage mounts regardless.
    pub fn mount<F>(
        config: &StrataConfig,
        page: Page,
        viewport: Viewport,
        create_renderer: F,
    ) -> Result<Self>
    where
        F: FnOnce(
            &Scene,
            SurfaceSize,
            RenderQuality,
        ) -> std::result::Result<Box<dyn FrameRenderer>, SceneError>,
    {
        let classifier = ViewportClassifier::new(config.viewport.breakpoint, viewport);
        let class = classifier.class();

        let Page {
            mut document,
            timelines,
        } = page;
        document.set_viewport(viewport);

        let aspect = if viewport.height > 0.0 {
            viewport.width / viewport.height
        } else {
            1.0
        };
        let mut scene = build_chip_scene(aspect)?;
        scene
            .camera_mut()
            .set_viewport(viewport.width, viewport.height);
        if !config.render.idle_oscillation {
            scene.set_idle(None);
        }

        let mut engine = TimelineEngine::new();
        let mut progress = ScrollProgressSource::new();
        let mut visibility = VisibilityObserver::new();
        let mut bindings = Vec::with_capacity(timelines.len());
        for timeline in timelines {
            let trigger = timeline.trigger().clone();
            let progress_id = progress.observe(trigger.region.clone(), trigger.span);
            let visibility_id =
                visibility.observe(trigger.region, trigger.threshold, trigger.root_margin);
            bindings.push(Binding {
                timeline: engine.add(timeline),
                progress: progress_id,
                visibility: visibility_id,
            });
        }

        let missing = engine.unresolved(&StageSink {
            document: &mut document,
            scene: &mut scene,
        });
        for (timeline, target, property) in missing {
            tracing::warn!(
                "timeline {}: {} has no {}, writes will be skipped",
                timeline,
                target,
                property
            );
        }

        let quality = config.quality(class);
        let size = SurfaceSize::new(viewport.width, viewport.height, viewport.scale_factor);
        let (renderer, renderer_error) = match document.surface() {
            Some(_) => match create_renderer(&scene, size, quality) {
                Ok(renderer) => (Some(renderer), None),
                Err(err) => {
                    tracing::error!("Failed to mount renderer: {}", err);
                    (None, Some(err.to_string()))
                }
            },
            None => {
                let name = document.surface_name().unwrap_or("<unset>").to_string();
                let err = SceneError::MissingSurface(name);
                tracing::error!("Failed to mount renderer: {}", err);
                (None, Some(err.to_string()))
            }
        };

        let state = shared(StageState {
            config: config.clone(),
            classifier,
            document,
            scene,
            engine,
            bindings,
            progress,
            visibility,
            pointer: None,
            smooth: None,
            renderer,
            renderer_error,
            overlay: Vec::new(),
            presses: PressStats::default(),
            dirty: true,
        });
        state.borrow_mut().sample();

        let wiring = Wiring {
            bus: EventBus::new(),
            frames: FrameScheduler::new(),
            state,
        };
        let desktop = shared(DisposeBag::new("desktop-effects"));
        let mut bag = DisposeBag::new("stage");
        mount_core(&wiring, &desktop, &mut bag);
        if class.is_desktop() {
            mount_desktop(&wiring, &mut desktop.borrow_mut());
        }

        tracing::info!(
            "Stage mounted: {}x{} {:?}, {} timelines, {} listeners, {} frame callbacks",
            viewport.width,
            viewport.height,
            class,
            wiring.state.borrow().engine.len(),
            wiring.bus.listener_count(),
            wiring.frames.len()
        );

        Ok(Self {
            wiring,
            bag,
            desktop,
            mounted: true,
        })
    }

    /// Deliver an input event
    pub fn dispatch(&self, event: &Event) -> DispatchOutcome {
        if !self.mounted {
            return DispatchOutcome::default();
        }
        self.wiring.bus.dispatch(event)
    }

    /// Run one frame at `time` seconds
    pub fn tick(&self, time: f64) -> FrameStats {
        if !self.mounted {
            return FrameStats::default();
        }
        self.wiring.frames.tick(time)
    }

    /// Tear everything down; safe to call repeatedly
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.desktop.borrow_mut().dispose();
        self.bag.dispose();

        let mut state = self.wiring.state.borrow_mut();
        if let Some(renderer) = state.renderer.as_mut() {
            renderer.dispose();
        }
        state.engine.clear();
        state.overlay.clear();
        tracing::info!("Stage unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn listener_count(&self) -> usize {
        self.wiring.bus.listener_count()
    }

    pub fn frame_callback_count(&self) -> usize {
        self.wiring.frames.len()
    }

    pub fn class(&self) -> ViewportClass {
        self.wiring.state.borrow().class()
    }

    pub fn scroll(&self) -> f32 {
        self.wiring.state.borrow().document.scroll()
    }

    /// Why the renderer did not mount, if it did not
    pub fn renderer_error(&self) -> Option<String> {
        self.wiring.state.borrow().renderer_error.clone()
    }

    /// Inspect the shared state
    pub fn with_state<R>(&self, f: impl FnOnce(&StageState) -> R) -> R {
        f(&self.wiring.state.borrow())
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Listeners and frame callbacks that exist for the lifetime of the stage
fn mount_core(wiring: &Wiring, desktop: &Shared<DisposeBag>, bag: &mut DisposeBag) {
    let Wiring { bus, frames, state } = wiring;

    {
        let wiring = wiring.clone();
        let desktop = desktop.clone();
        bag.add(bus.subscribe("viewport", EventKind::Resize, move |event| {
            let Event::Resized {
                width,
                height,
                scale_factor,
            } = *event
            else {
                return Propagation::Continue;
            };
            let viewport = Viewport::new(width, height, scale_factor);
            let transition = wiring.state.borrow_mut().resize(viewport);

            if let Some(transition) = transition {
                tracing::info!("Viewport {:?} -> {:?}", transition.from, transition.to);
                // Dispose before remounting so listener counts never double up
                desktop.borrow_mut().dispose();
                if transition.to.is_desktop() {
                    mount_desktop(&wiring, &mut desktop.borrow_mut());
                }
            }
            Propagation::Continue
        }));
    }

    {
        let state = state.clone();
        bag.add(bus.subscribe_with_priority(
            "native-scroll",
            EventKind::Wheel,
            NATIVE_SCROLL_PRIORITY,
            move |event| {
                if let Event::Wheel { delta_y, .. } = *event {
                    state.borrow_mut().scroll_by(delta_y);
                }
                Propagation::Continue
            },
        ));
    }
    {
        let state = state.clone();
        bag.add(bus.subscribe_with_priority(
            "native-touch-scroll",
            EventKind::Touch,
            NATIVE_SCROLL_PRIORITY,
            move |event| {
                if let Event::Touch { delta_y, .. } = *event {
                    state.borrow_mut().scroll_by(delta_y);
                }
                Propagation::Continue
            },
        ));
    }

    {
        let state = state.clone();
        bag.add(bus.subscribe_with_priority(
            "input-mask",
            EventKind::PointerPress,
            INPUT_MASK_PRIORITY,
            move |event| {
                let Event::PointerPressed { x, y } = *event else {
                    return Propagation::Continue;
                };
                let mut state = state.borrow_mut();
                if state.document.blocks_press(x, y) {
                    state.presses.blocked += 1;
                    tracing::debug!("press at ({}, {}) swallowed by input mask", x, y);
                    return Propagation::Stop;
                }
                Propagation::Continue
            },
        ));
    }
    {
        let state = state.clone();
        bag.add(bus.subscribe("press", EventKind::PointerPress, move |_| {
            state.borrow_mut().presses.delivered += 1;
            Propagation::Continue
        }));
    }

    {
        let state = state.clone();
        bag.add(frames.register("scroll-limit", FramePhase::Viewport, move |_| {
            let mut state = state.borrow_mut();
            let limit = state.document.max_scroll();
            if let Some(smooth) = state.smooth.as_mut() {
                if smooth.limit() != limit {
                    smooth.set_limit(limit);
                }
            }
            Ok(())
        }));
    }
    {
        let state = state.clone();
        bag.add(frames.register("scroll-progress", FramePhase::Progress, move |_| {
            let mut state = state.borrow_mut();
            if state.dirty || state.engine.needs_continuous_sampling() {
                state.sample();
            }
            Ok(())
        }));
    }
    {
        let state = state.clone();
        bag.add(frames.register("timelines", FramePhase::Timeline, move |ctx| {
            state.borrow_mut().advance_timelines(ctx.time);
            Ok(())
        }));
    }
    {
        let state = state.clone();
        bag.add(frames.register("render", FramePhase::Render, move |ctx| {
            state.borrow_mut().render(ctx.time_ms())
        }));
    }
}

/// Pointer glow and smooth scrolling; mounted only on desktop viewports
fn mount_desktop(wiring: &Wiring, bag: &mut DisposeBag) {
    let Wiring { bus, frames, state } = wiring;

    {
        let mut state = state.borrow_mut();
        let mut smooth =
            SmoothScroll::new(state.config.smooth_scroll(), state.document.max_scroll());
        smooth.scroll_to(state.document.scroll(), true);
        state.smooth = Some(smooth);
        state.pointer = Some(PointerTracker::new(state.config.spring()));
    }

    {
        let state = state.clone();
        bag.add(bus.subscribe("pointer-tracker", EventKind::PointerMove, move |event| {
            if let Event::PointerMoved { x, y } = *event {
                if let Some(pointer) = state.borrow_mut().pointer.as_mut() {
                    pointer.on_pointer_move(x, y);
                }
            }
            Propagation::Continue
        }));
    }
    {
        let state = state.clone();
        bag.add(bus.subscribe_with_priority(
            "smooth-wheel",
            EventKind::Wheel,
            SMOOTH_SCROLL_PRIORITY,
            move |event| {
                let Event::Wheel { delta_y, .. } = *event else {
                    return Propagation::Continue;
                };
                match state.borrow_mut().smooth.as_mut() {
                    Some(smooth) => {
                        smooth.on_wheel(delta_y);
                        Propagation::Stop
                    }
                    None => Propagation::Continue,
                }
            },
        ));
    }
    {
        let state = state.clone();
        bag.add(bus.subscribe_with_priority(
            "smooth-touch",
            EventKind::Touch,
            SMOOTH_SCROLL_PRIORITY,
            move |event| {
                let Event::Touch { delta_y, .. } = *event else {
                    return Propagation::Continue;
                };
                let mut state = state.borrow_mut();
                let Some(smooth) = state.smooth.as_mut() else {
                    return Propagation::Continue;
                };
                smooth.on_touch(delta_y);
                let position = smooth.position();
                if state.document.set_scroll(position) {
                    state.dirty = true;
                }
                Propagation::Stop
            },
        ));
    }

    {
        let state = state.clone();
        bag.add(frames.register("smooth-scroll", FramePhase::Scroll, move |ctx| {
            let mut state = state.borrow_mut();
            let Some(smooth) = state.smooth.as_mut() else {
                return Ok(());
            };
            if !smooth.is_animating() {
                return Ok(());
            }
            smooth.advance(ctx.dt);
            let position = smooth.position();
            if state.document.set_scroll(position) {
                state.dirty = true;
            }
            Ok(())
        }));
    }
    {
        let state = state.clone();
        bag.add(frames.register("pointer-spring", FramePhase::Pointer, move |ctx| {
            if let Some(pointer) = state.borrow_mut().pointer.as_mut() {
                pointer.advance(ctx.dt);
            }
            Ok(())
        }));
    }

    let state = state.clone();
    bag.add(OnDispose::new(move || {
        let mut state = state.borrow_mut();
        state.pointer = None;
        state.smooth = None;
        tracing::debug!("desktop effects removed");
    }));
}
