//! Authored page
//!
//! Regions, elements, the drawing surface and every timeline of the page.
//! This is the only place that knows ids; the stage wires whatever it is
//! handed here.

use strata_3d::chip;
use strata_animation::{
    Easing, Position, PropertyPath, RootMargin, ScrollSpan, Target, Timeline, TimelineBuilder,
    Trigger, Tween,
};
use strata_core::math::look_at_euler;
use strata_core::{Color, Vec3};
use strata_platform::Viewport;

use crate::document::{
    Document, ElementSpec, Extent, InputMask, Placement, TransformOrigin, Visual, PAGE,
};
use crate::error::Result;

/// Element the 3D scene renders into
pub const SURFACE: &str = "chip-canvas";

pub const HERO: &str = "hero";
pub const HERO_FRAME: &str = "hero-frame";
pub const FOOTER: &str = "footer";
pub const FOOTER_CONTENT: &str = "footer-content";
pub const SCROLL_PROGRESS: &str = "scroll-progress";

/// Content sections between the hero and the footer, with their heights
pub const SECTIONS: [(&str, Extent); 3] = [
    ("research", Extent::Viewports(1.0)),
    ("projects", Extent::Viewports(1.2)),
    ("team", Extent::Viewports(1.0)),
];

pub fn panel_id(section: &str) -> String {
    format!("{section}-panel")
}

pub fn heading_id(section: &str) -> String {
    format!("{section}-heading")
}

/// Document plus the timelines that animate it
pub struct Page {
    pub document: Document,
    pub timelines: Vec<Timeline>,
}

/// Build the page for `viewport`
pub fn page(viewport: Viewport) -> Result<Page> {
    let timelines = timelines()?;
    let mut document = document(viewport)?;
    for timeline in &timelines {
        let trigger = timeline.trigger();
        if trigger.pinned {
            document.pin(&trigger.region, trigger.span).map_err(config_error)?;
        }
    }
    Ok(Page {
        document,
        timelines,
    })
}

fn config_error(err: crate::document::DocumentError) -> crate::error::StrataError {
    crate::error::StrataError::Config(err.to_string())
}

fn document(viewport: Viewport) -> Result<Document> {
    let mut doc = Document::new(viewport);
    doc.add_region(HERO, Extent::Viewports(1.0)).map_err(config_error)?;
    for (id, extent) in SECTIONS {
        doc.add_region(id, extent).map_err(config_error)?;
    }
    doc.add_region(FOOTER, Extent::Pixels(480.0)).map_err(config_error)?;

    let elements = [
        ElementSpec::new(SURFACE, Some(HERO), Placement::Fill),
        ElementSpec::new(HERO_FRAME, Some(HERO), Placement::CenteredSquare { max: 900.0 })
            .visual(Visual::Solid(Color::from_hex(0x0b0c10).with_alpha(0.35))),
        ElementSpec::new(
            FOOTER_CONTENT,
            Some(FOOTER),
            Placement::Relative {
                x: 0.1,
                y: 0.2,
                width: 0.8,
                height: 0.6,
            },
        )
        .visual(Visual::Solid(Color::from_hex(0x111114))),
        ElementSpec::new(SCROLL_PROGRESS, None, Placement::TopBar { height: 3.0 })
            .visual(Visual::Gradient {
                start: Color::from_hex(0x8a2be2),
                end: Color::from_hex(0x00ffff),
            })
            .origin(TransformOrigin::Left),
    ];
    for element in elements {
        doc.add_element(element).map_err(config_error)?;
    }

    for (id, _) in SECTIONS {
        let panel = ElementSpec::new(
            panel_id(id),
            Some(id),
            Placement::Relative {
                x: 0.1,
                y: 0.2,
                width: 0.8,
                height: 0.6,
            },
        )
        .visual(Visual::Solid(Color::WHITE.with_alpha(0.04)));
        let heading = ElementSpec::new(
            heading_id(id),
            Some(id),
            Placement::Relative {
                x: 0.1,
                y: 0.08,
                width: 0.5,
                height: 0.06,
            },
        )
        .visual(Visual::Solid(Color::WHITE.with_alpha(0.85)));
        doc.add_element(panel).map_err(config_error)?;
        doc.add_element(heading).map_err(config_error)?;
    }

    // Embedded viewer: presses on its lower half never reach it
    doc.add_mask(InputMask {
        element: HERO_FRAME.to_string(),
        area: Placement::Relative {
            x: 0.0,
            y: 0.5,
            width: 1.0,
            height: 0.5,
        },
    })
    .map_err(config_error)?;

    doc.set_surface(SURFACE);
    Ok(doc)
}

/// Every timeline in declaration order
pub fn timelines() -> Result<Vec<Timeline>> {
    let mut timelines = vec![chip_timeline()?, hero_intro()?, progress_bar()?];
    for (id, _) in SECTIONS {
        timelines.push(section_parallax(id)?);
        timelines.push(section_heading(id)?);
    }
    timelines.push(footer_fade()?);
    Ok(timelines)
}

/// Pinned hero: layers rise in, the core pops and glows, the camera tilts
fn chip_timeline() -> Result<Timeline> {
    let trigger = Trigger::scrubbed(HERO, ScrollSpan::parse("top top", "+=220%")?).pinned();
    let mut builder = TimelineBuilder::new("chip", trigger);

    for i in 0..chip::LAYER_COUNT {
        let layer = Target::object(chip::layer(i));
        let rest = i as f32 * 0.04;
        let start = Position::At(i as f32 * 0.2);
        builder = builder
            .add(
                "layers",
                Tween::new(layer.clone(), PropertyPath::PositionY, -0.5 + rest, rest).duration(1.0),
                start,
            )
            .add(
                "layer-opacity",
                Tween::new(layer, PropertyPath::Opacity, 0.0, 1.0).duration(1.0),
                Position::WithPrevious,
            );
    }

    let core = Target::object(chip::CORE);
    let (cx, cy, cz) = chip::CAMERA_POSITION;
    let camera_tilt = look_at_euler(Vec3::new(cx, cy, cz), Vec3::ZERO).x;

    builder
        .add(
            "core-scale",
            Tween::new(core.clone(), PropertyPath::Scale, 0.0, 1.0)
                .duration(0.8)
                .ease("back.out(1.5)".parse()?),
            "-=0.3".parse()?,
        )
        .add(
            "core-glow",
            Tween::new(core, PropertyPath::EmissiveIntensity, 0.0, 1.2)
                .duration(1.0)
                .ease(Easing::EaseInOutCubic),
            "-=0.3".parse()?,
        )
        .add(
            "red-light",
            Tween::new(Target::object(chip::RED_LIGHT), PropertyPath::Intensity, 0.0, 5.0)
                .duration(1.0)
                .ease(Easing::EaseInOutCubic),
            Position::WithPrevious,
        )
        .add(
            "camera",
            Tween::new(
                Target::object(strata_3d::CAMERA),
                PropertyPath::RotationX,
                camera_tilt,
                -0.2,
            )
            .ease(Easing::Linear),
            Position::At(0.0),
        )
        .build()
        .map_err(Into::into)
}

/// Hero frame fades and scales in once on load
fn hero_intro() -> Result<Timeline> {
    let frame = Target::element(HERO_FRAME);
    TimelineBuilder::new("hero-intro", Trigger::once(HERO, 0.0))
        .add(
            "opacity",
            Tween::new(frame.clone(), PropertyPath::Opacity, 0.0, 1.0)
                .duration(1.2)
                .ease(Easing::EaseOut),
            Position::At(0.0),
        )
        .add(
            "scale",
            Tween::new(frame, PropertyPath::Scale, 0.95, 1.0)
                .duration(1.2)
                .ease(Easing::EaseOut),
            Position::At(0.0),
        )
        .build()
        .map_err(Into::into)
}

/// Top bar filling with document progress
fn progress_bar() -> Result<Timeline> {
    let trigger = Trigger::scrubbed(PAGE, ScrollSpan::parse("top top", "bottom bottom")?);
    TimelineBuilder::new("scroll-progress", trigger)
        .add(
            "bar",
            Tween::new(Target::element(SCROLL_PROGRESS), PropertyPath::ScaleX, 0.0, 1.0)
                .duration(1.0)
                .ease(Easing::Linear),
            Position::At(0.0),
        )
        .build()
        .map_err(Into::into)
}

/// Section panel drifts up through the viewport, fading in and out at the ends
fn section_parallax(section: &str) -> Result<Timeline> {
    let panel = Target::element(panel_id(section));
    let trigger = Trigger::scrubbed(section, ScrollSpan::parse("top bottom", "bottom top")?);
    TimelineBuilder::new(format!("{section}-parallax"), trigger)
        .add(
            "opacity",
            Tween::new(panel.clone(), PropertyPath::Opacity, 0.0, 1.0)
                .duration(0.2)
                .ease(Easing::Linear),
            Position::At(0.0),
        )
        .add(
            "opacity",
            Tween::new(panel.clone(), PropertyPath::Opacity, 1.0, 0.0)
                .duration(0.2)
                .ease(Easing::Linear),
            Position::At(0.8),
        )
        .add(
            "parallax",
            Tween::new(panel, PropertyPath::TranslateY, 50.0, -50.0)
                .duration(1.0)
                .ease(Easing::Linear),
            Position::At(0.0),
        )
        .build()
        .map_err(Into::into)
}

/// Heading slides up once a tenth of its section is in view
fn section_heading(section: &str) -> Result<Timeline> {
    let heading = Target::element(heading_id(section));
    let ease: Easing = "cubic-bezier(0.22, 1, 0.36, 1)".parse()?;
    let trigger = Trigger::once(section, 0.1).root_margin(RootMargin::bottom(-100.0));
    TimelineBuilder::new(format!("{section}-heading"), trigger)
        .add(
            "opacity",
            Tween::new(heading.clone(), PropertyPath::Opacity, 0.0, 1.0)
                .duration(0.8)
                .ease(ease),
            Position::At(0.0),
        )
        .add(
            "rise",
            Tween::new(heading, PropertyPath::TranslateY, 30.0, 0.0)
                .duration(0.8)
                .ease(ease),
            Position::At(0.0),
        )
        .build()
        .map_err(Into::into)
}

/// Footer content fades in over the first fifth of its entrance
fn footer_fade() -> Result<Timeline> {
    let content = Target::element(FOOTER_CONTENT);
    let trigger = Trigger::scrubbed(FOOTER, ScrollSpan::parse("top bottom", "bottom bottom")?);
    TimelineBuilder::new("footer-fade", trigger)
        .add(
            "opacity",
            Tween::new(content.clone(), PropertyPath::Opacity, 0.0, 1.0)
                .duration(0.2)
                .ease(Easing::Linear),
            Position::At(0.0),
        )
        .add(
            "opacity",
            Tween::new(content, PropertyPath::Opacity, 1.0, 1.0).duration(0.8),
            Position::At(0.2),
        )
        .build()
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_animation::RegionGeometry;

    #[test]
    fn test_page_builds() {
        let page = page(Viewport::default()).unwrap();
        assert_eq!(page.timelines.len(), 3 + SECTIONS.len() * 2 + 1);
        assert_eq!(page.document.surface(), Some(SURFACE));
    }

    #[test]
    fn test_hero_is_pinned_for_220_percent() {
        let page = page(Viewport::new(1280.0, 1000.0, 1.0)).unwrap();
        assert_eq!(page.document.pin_range(HERO), Some((0.0, 2200.0)));
        assert_eq!(page.document.region_rect("research").unwrap().y, 3200.0);
    }

    #[test]
    fn test_chip_timeline_sequence() {
        let chip = chip_timeline().unwrap();
        assert!(chip.trigger().pinned);
        assert!(chip.is_scrubbed());

        // Layers end at 1.4, core 1.1..1.9, glow and light 1.6..2.6
        let total = 2.6;
        let glow = chip
            .tracks()
            .iter()
            .find(|t| t.name() == "core-glow")
            .unwrap();
        let key = &glow.keyframes()[0];
        assert!((key.start - 1.6 / total).abs() < 1e-5);
        assert!((key.end() - 1.0).abs() < 1e-5);

        let light = chip
            .tracks()
            .iter()
            .find(|t| t.name() == "red-light")
            .unwrap();
        assert!((light.keyframes()[0].start - key.start).abs() < 1e-6);
    }

    #[test]
    fn test_chip_timeline_end_state() {
        let chip = chip_timeline().unwrap();
        let mut writes = Vec::new();
        chip.evaluate(1.0, |target, property, value| {
            writes.push((target.clone(), property, value))
        });
        let last = |target: &Target, property| {
            writes
                .iter()
                .rev()
                .find(|(t, p, _)| t == target && *p == property)
                .map(|(_, _, v)| *v)
        };
        let near = |value: Option<f32>, expected: f32| {
            value.map_or(false, |v| (v - expected).abs() < 1e-4)
        };
        assert!(near(last(&Target::object(chip::CORE), PropertyPath::EmissiveIntensity), 1.2));
        assert!(near(last(&Target::object(chip::RED_LIGHT), PropertyPath::Intensity), 5.0));
        assert!(near(last(&Target::object(strata_3d::CAMERA), PropertyPath::RotationX), -0.2));
        assert!(near(last(&Target::object(chip::layer(2)), PropertyPath::PositionY), 0.08));
        assert!(near(last(&Target::object(chip::CORE), PropertyPath::Scale), 1.0));
    }

    #[test]
    fn test_section_parallax_fades_at_both_ends() {
        let timeline = section_parallax("research").unwrap();
        let opacity_at = |p: f32| {
            let mut value = None;
            timeline.evaluate(p, |_, property, v| {
                if property == PropertyPath::Opacity {
                    value = Some(v);
                }
            });
            value.unwrap()
        };
        assert_eq!(opacity_at(0.0), 0.0);
        assert!((opacity_at(0.1) - 0.5).abs() < 1e-5);
        assert_eq!(opacity_at(0.5), 1.0);
        assert!((opacity_at(0.9) - 0.5).abs() < 1e-5);
        assert_eq!(opacity_at(1.0), 0.0);
    }

    #[test]
    fn test_heading_reveal_is_one_shot() {
        let timeline = section_heading("team").unwrap();
        let trigger = timeline.trigger();
        assert!(!trigger.scrubbed);
        assert_eq!(trigger.threshold, 0.1);
        assert_eq!(trigger.root_margin.bottom, -100.0);
        assert!((timeline.duration_secs() - 0.8).abs() < 1e-6);
    }
}
