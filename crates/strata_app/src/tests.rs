//! Stage tests
//!
//! Drive a headless stage through mount, input, frames and teardown. The GPU
//! is replaced by a renderer that only records what it was asked to do.

use std::cell::RefCell;
use std::rc::Rc;

use strata_3d::{
    chip, FrameRenderer, OverlayKind, OverlayQuad, RenderError, RenderQuality, Scene, SceneError,
    SurfaceSize,
};
use strata_animation::{PropertyPath, PropertySink, RegionGeometry, Target, TimelineState};
use strata_platform::{Event, ScrollPhase, TouchPhase, Viewport, ViewportClass};

use crate::authoring::{self, heading_id, HERO, SCROLL_PROGRESS};
use crate::config::StrataConfig;
use crate::stage::Stage;

const DESKTOP: Viewport = Viewport {
    width: 1280.0,
    height: 800.0,
    scale_factor: 2.0,
};
const MOBILE: Viewport = Viewport {
    width: 500.0,
    height: 800.0,
    scale_factor: 2.0,
};

/// Listener and callback counts with and without the desktop-only effects
const CORE_LISTENERS: usize = 5;
const DESKTOP_LISTENERS: usize = CORE_LISTENERS + 3;
const CORE_CALLBACKS: usize = 4;
const DESKTOP_CALLBACKS: usize = CORE_CALLBACKS + 2;

#[derive(Default)]
struct Record {
    resizes: Vec<SurfaceSize>,
    qualities: Vec<RenderQuality>,
    frames: usize,
    disposed: usize,
    initial_quality: Option<RenderQuality>,
}

struct RecordingRenderer {
    record: Rc<RefCell<Record>>,
    disposed: bool,
    fail: bool,
}

impl FrameRenderer for RecordingRenderer {
    fn resize(&mut self, size: SurfaceSize) {
        self.record.borrow_mut().resizes.push(size);
    }

    fn set_quality(&mut self, quality: RenderQuality) {
        self.record.borrow_mut().qualities.push(quality);
    }

    fn render(&mut self, _scene: &Scene, _overlay: &[OverlayQuad]) -> Result<(), RenderError> {
        if self.fail {
            return Err(RenderError::OutOfMemory);
        }
        self.record.borrow_mut().frames += 1;
        Ok(())
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.record.borrow_mut().disposed += 1;
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn mount_with(viewport: Viewport, fail: bool) -> (Stage, Rc<RefCell<Record>>) {
    let record = Rc::new(RefCell::new(Record::default()));
    let page = authoring::page(viewport).unwrap();
    let shared = record.clone();
    let stage = Stage::mount(&StrataConfig::default(), page, viewport, move |_, _, quality| {
        shared.borrow_mut().initial_quality = Some(quality);
        Ok(Box::new(RecordingRenderer {
            record: shared,
            disposed: false,
            fail,
        }) as Box<dyn FrameRenderer>)
    })
    .unwrap();
    (stage, record)
}

fn mount(viewport: Viewport) -> (Stage, Rc<RefCell<Record>>) {
    mount_with(viewport, false)
}

fn wheel(delta_y: f32) -> Event {
    Event::Wheel {
        delta_x: 0.0,
        delta_y,
        phase: ScrollPhase::Moved,
    }
}

fn resized(viewport: Viewport) -> Event {
    Event::Resized {
        width: viewport.width,
        height: viewport.height,
        scale_factor: viewport.scale_factor,
    }
}

/// Tick at 60 fps from `from` up to `to` seconds
fn run_frames(stage: &Stage, from: f64, to: f64) {
    let mut t = from;
    while t <= to {
        stage.tick(t);
        t += 1.0 / 60.0;
    }
}

fn read(stage: &Stage, target: Target, property: PropertyPath) -> Option<f32> {
    stage.with_state(|state| match &target {
        Target::Element(_) => state.document().read(&target, property),
        Target::Object(_) => state.scene().read(&target, property),
    })
}

#[test]
fn test_mount_registers_desktop_effects() {
    let (stage, record) = mount(DESKTOP);
    assert!(stage.is_mounted());
    assert_eq!(stage.class(), ViewportClass::Desktop);
    assert_eq!(stage.listener_count(), DESKTOP_LISTENERS);
    assert_eq!(stage.frame_callback_count(), DESKTOP_CALLBACKS);
    assert!(stage.renderer_error().is_none());
    assert_eq!(record.borrow().initial_quality, Some(RenderQuality::desktop()));
    stage.with_state(|state| {
        assert!(state.pointer().is_some());
        assert!(state.smooth_scroll().is_some());
        assert_eq!(state.engine().len(), 10);
    });
}

#[test]
fn test_mobile_mount_skips_desktop_effects() {
    let (stage, record) = mount(MOBILE);
    assert_eq!(stage.class(), ViewportClass::Mobile);
    assert_eq!(stage.listener_count(), CORE_LISTENERS);
    assert_eq!(stage.frame_callback_count(), CORE_CALLBACKS);
    assert_eq!(record.borrow().initial_quality, Some(RenderQuality::mobile()));
    stage.with_state(|state| {
        assert!(state.pointer().is_none());
        assert!(state.smooth_scroll().is_none());
    });
}

#[test]
fn test_unmount_twice_leaves_nothing_behind() {
    let (mut stage, record) = mount(DESKTOP);
    run_frames(&stage, 0.0, 0.1);

    stage.unmount();
    stage.unmount();
    assert!(!stage.is_mounted());
    assert_eq!(stage.listener_count(), 0);
    assert_eq!(stage.frame_callback_count(), 0);
    assert_eq!(record.borrow().disposed, 1);

    // Input and frames after teardown are ignored
    let frames = record.borrow().frames;
    assert_eq!(stage.dispatch(&wheel(100.0)).delivered, 0);
    assert_eq!(stage.tick(1.0).ran, 0);
    assert_eq!(record.borrow().frames, frames);
    stage.with_state(|state| assert!(state.pointer().is_none()));
}

#[test]
fn test_drop_disposes_renderer() {
    let (stage, record) = mount(MOBILE);
    drop(stage);
    assert_eq!(record.borrow().disposed, 1);
}

#[test]
fn test_missing_surface_fails_only_renderer() {
    let mut page = authoring::page(MOBILE).unwrap();
    page.document.set_surface("missing-canvas");
    let called = Rc::new(RefCell::new(false));
    let flag = called.clone();
    let stage = Stage::mount(&StrataConfig::default(), page, MOBILE, move |_, _, _| {
        *flag.borrow_mut() = true;
        Err(SceneError::MissingSurface("unreachable".into()))
    })
    .unwrap();

    assert!(!*called.borrow());
    let error = stage.renderer_error().unwrap();
    assert!(error.contains("missing-canvas"), "{error}");
    stage.with_state(|state| assert!(!state.has_renderer()));

    // Everything else keeps working
    assert_eq!(stage.listener_count(), CORE_LISTENERS);
    stage.dispatch(&wheel(2400.0));
    let stats = stage.tick(0.0);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.ran, CORE_CALLBACKS);
    let bar = read(&stage, Target::element(SCROLL_PROGRESS), PropertyPath::ScaleX).unwrap();
    assert!((bar - 0.5).abs() < 1e-4, "{bar}");
}

#[test]
fn test_failed_renderer_mount_is_recorded() {
    let page = authoring::page(DESKTOP).unwrap();
    let stage = Stage::mount(&StrataConfig::default(), page, DESKTOP, |_, _, _| {
        Err(SceneError::Render(RenderError::AdapterNotFound))
    })
    .unwrap();
    assert!(stage.renderer_error().unwrap().contains("adapter"));
    assert_eq!(stage.listener_count(), DESKTOP_LISTENERS);
    assert_eq!(stage.tick(0.0).failed, 0);
}

#[test]
fn test_render_errors_are_isolated() {
    let (stage, _record) = mount_with(MOBILE, true);
    stage.dispatch(&wheel(880.0));
    let stats = stage.tick(0.0);
    assert_eq!(stats.ran, CORE_CALLBACKS);
    assert_eq!(stats.failed, 1);

    // Timelines still ran before the render phase
    stage.with_state(|state| {
        let chip = state.timeline_id("chip").unwrap();
        assert_eq!(state.engine().evaluated_progress(chip), Some(0.5));
    });
    assert_eq!(stage.tick(0.1).active, CORE_CALLBACKS);
}

#[test]
fn test_viewport_transitions_remount_desktop_effects() {
    let (stage, record) = mount(DESKTOP);

    stage.dispatch(&resized(MOBILE));
    assert_eq!(stage.class(), ViewportClass::Mobile);
    assert_eq!(stage.listener_count(), CORE_LISTENERS);
    assert_eq!(stage.frame_callback_count(), CORE_CALLBACKS);
    stage.with_state(|state| {
        assert!(state.pointer().is_none());
        assert!(state.smooth_scroll().is_none());
    });
    {
        let record = record.borrow();
        assert_eq!(record.qualities, vec![RenderQuality::mobile()]);
        assert_eq!(record.resizes.last(), Some(&SurfaceSize::new(500.0, 800.0, 2.0)));
    }

    // Resizing within a class changes nothing but the size
    stage.dispatch(&resized(Viewport::new(600.0, 900.0, 2.0)));
    assert_eq!(stage.listener_count(), CORE_LISTENERS);
    assert_eq!(record.borrow().qualities.len(), 1);

    stage.dispatch(&resized(DESKTOP));
    assert_eq!(stage.class(), ViewportClass::Desktop);
    assert_eq!(stage.listener_count(), DESKTOP_LISTENERS);
    assert_eq!(stage.frame_callback_count(), DESKTOP_CALLBACKS);
    assert_eq!(record.borrow().qualities.last(), Some(&RenderQuality::desktop()));
    stage.with_state(|state| assert!(state.pointer().is_some()));
}

#[test]
fn test_wheel_returns_to_native_scroll_after_leaving_desktop() {
    let (stage, _record) = mount(DESKTOP);
    stage.dispatch(&wheel(300.0));
    stage.tick(0.0);
    stage.tick(1.0 / 60.0);

    stage.dispatch(&resized(MOBILE));
    let before = stage.scroll();
    assert!(before > 0.0);

    let outcome = stage.dispatch(&wheel(100.0));
    assert!(!outcome.stopped);
    assert!((stage.scroll() - (before + 100.0)).abs() < 1e-3);

    // No glide is left running
    let after = stage.scroll();
    run_frames(&stage, 0.1, 0.5);
    assert_eq!(stage.scroll(), after);
}

#[test]
fn test_smooth_scroll_intercepts_wheel_on_desktop() {
    let (stage, _record) = mount(DESKTOP);

    let outcome = stage.dispatch(&wheel(300.0));
    assert!(outcome.stopped);
    assert_eq!(outcome.delivered, 1);
    // Nothing moves until the glide runs
    assert_eq!(stage.scroll(), 0.0);

    stage.tick(0.0);
    let first = stage.scroll();
    assert!(first > 0.0 && first < 300.0, "{first}");

    run_frames(&stage, 1.0 / 60.0, 2.0);
    assert_eq!(stage.scroll(), 300.0);
}

#[test]
fn test_touch_scroll_is_direct_on_desktop() {
    let (stage, _record) = mount(DESKTOP);
    let outcome = stage.dispatch(&Event::Touch {
        id: 1,
        phase: TouchPhase::Moved,
        x: 100.0,
        y: 100.0,
        delta_y: 50.0,
    });
    assert!(outcome.stopped);
    // Touch multiplier 2, no glide
    assert_eq!(stage.scroll(), 100.0);
}

#[test]
fn test_native_scroll_on_mobile() {
    let (stage, _record) = mount(MOBILE);
    let outcome = stage.dispatch(&wheel(300.0));
    assert!(!outcome.stopped);
    assert_eq!(stage.scroll(), 300.0);

    stage.dispatch(&wheel(-10_000.0));
    assert_eq!(stage.scroll(), 0.0);
}

#[test]
fn test_pinned_hero_scrubs_with_scroll() {
    let (stage, _record) = mount(MOBILE);
    let core = || {
        read(&stage, Target::object(chip::CORE), PropertyPath::EmissiveIntensity).unwrap()
    };

    stage.tick(0.0);
    assert_eq!(core(), 0.0);

    // Hero pins over 220% of the viewport height
    stage.dispatch(&wheel(880.0));
    stage.tick(0.1);
    let halfway = core();
    stage.with_state(|state| {
        let chip = state.timeline_id("chip").unwrap();
        assert_eq!(state.engine().evaluated_progress(chip), Some(0.5));
        assert_eq!(state.timeline_state("chip"), Some(TimelineState::Scrubbing));
        assert_eq!(state.document().screen_rect(HERO, 880.0).unwrap().y, 0.0);
    });

    stage.dispatch(&wheel(880.0));
    stage.tick(0.2);
    assert!((core() - 1.2).abs() < 1e-4);

    // Scrubbing back lands on exactly the same values
    stage.dispatch(&wheel(-880.0));
    stage.tick(0.3);
    assert_eq!(core(), halfway);
    stage.dispatch(&wheel(-880.0));
    stage.tick(0.4);
    assert_eq!(core(), 0.0);
}

#[test]
fn test_section_heading_plays_once() {
    let (stage, _record) = mount(MOBILE);
    let name = format!("{}-heading", authoring::SECTIONS[0].0);
    let heading = Target::element(heading_id(authoring::SECTIONS[0].0));

    stage.tick(0.0);
    stage.with_state(|state| assert_eq!(state.timeline_state(&name), Some(TimelineState::Idle)));
    // First frame applied while waiting
    assert_eq!(read(&stage, heading.clone(), PropertyPath::Opacity), Some(0.0));

    // Section top reaches the top of the viewport: hero 800 + pin spacer 1760
    stage.dispatch(&wheel(2560.0));
    stage.tick(0.1);
    stage.with_state(|state| assert_eq!(state.timeline_state(&name), Some(TimelineState::Playing)));

    stage.tick(1.0);
    stage.with_state(|state| {
        assert_eq!(state.timeline_state(&name), Some(TimelineState::Complete))
    });
    assert_eq!(read(&stage, heading.clone(), PropertyPath::Opacity), Some(1.0));
    assert_eq!(read(&stage, heading.clone(), PropertyPath::TranslateY), Some(0.0));

    // Leaving and re-entering never restarts it
    for (i, delta) in [-2560.0, 2560.0, -2560.0, 2560.0].into_iter().enumerate() {
        stage.dispatch(&wheel(delta));
        stage.tick(1.1 + i as f64 * 0.1);
        stage.with_state(|state| {
            assert_eq!(state.timeline_state(&name), Some(TimelineState::Complete))
        });
        assert_eq!(read(&stage, heading.clone(), PropertyPath::Opacity), Some(1.0));
    }
}

#[test]
fn test_input_mask_swallows_lower_half_presses() {
    let (stage, _record) = mount(DESKTOP);

    // Hero frame is an 800 px square centered horizontally; its lower half is masked
    let outcome = stage.dispatch(&Event::PointerPressed { x: 640.0, y: 600.0 });
    assert!(outcome.stopped);
    let outcome = stage.dispatch(&Event::PointerPressed { x: 640.0, y: 200.0 });
    assert!(!outcome.stopped);
    let outcome = stage.dispatch(&Event::PointerPressed { x: 100.0, y: 600.0 });
    assert!(!outcome.stopped);

    stage.with_state(|state| {
        assert_eq!(state.presses().blocked, 1);
        assert_eq!(state.presses().delivered, 2);
    });
}

#[test]
fn test_overlay_draws_glows_between_page_and_fixed_elements() {
    let (stage, record) = mount(DESKTOP);
    stage.dispatch(&Event::PointerMoved { x: 640.0, y: 400.0 });
    stage.dispatch(&wheel(2400.0));
    run_frames(&stage, 0.0, 2.0);
    assert_eq!(stage.scroll(), 2400.0);
    assert!(record.borrow().frames > 0);

    stage.with_state(|state| {
        let overlay = state.overlay();
        let glows: Vec<usize> = overlay
            .iter()
            .enumerate()
            .filter(|(_, q)| matches!(q.kind, OverlayKind::RadialGlow { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(glows.len(), 2);
        assert!(glows[0] > 0, "page content comes first");

        // Progress bar is the fixed element on top, half filled
        let bar = overlay.last().unwrap();
        assert!(matches!(bar.kind, OverlayKind::HorizontalGradient { .. }));
        assert!((bar.rect.width - 640.0).abs() < 0.5, "{}", bar.rect.width);
        assert!(glows[1] < overlay.len() - 1);

        // The spring has pulled the glow onto the pointer
        let (x, y) = state.pointer().unwrap().position();
        assert!((x - 640.0).abs() < 1.0 && (y - 400.0).abs() < 1.0);
    });
}

#[test]
fn test_mobile_overlay_has_no_glow() {
    let (stage, _record) = mount(MOBILE);
    stage.dispatch(&Event::PointerMoved { x: 100.0, y: 100.0 });
    stage.tick(0.0);
    stage.with_state(|state| {
        assert!(!state
            .overlay()
            .iter()
            .any(|q| matches!(q.kind, OverlayKind::RadialGlow { .. })));
    });
}
