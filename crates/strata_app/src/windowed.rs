//! Desktop window runner
//!
//! Opens a winit window, mounts the stage against it once the event loop
//! resumes and translates winit input into logical-pixel [`Event`]s.
//!
//! # Example
//!
//! ```ignore
//! use strata_app::prelude::*;
//!
//! fn main() -> strata_app::Result<()> {
//!     strata_app::windowed::run(StrataConfig::default())
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

use strata_3d::{FrameRenderer, SceneRenderer};
use strata_platform::{Event, PlatformError, ScrollPhase, TouchPhase, Viewport};

use crate::authoring;
use crate::config::StrataConfig;
use crate::error::{Result, StrataError};
use crate::stage::Stage;

/// Run the page in a window until it is closed
pub fn run(config: StrataConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;
    let mut app = StrataWindow::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| PlatformError::Run(e.to_string()))?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct StrataWindow {
    config: StrataConfig,
    window: Option<Arc<Window>>,
    stage: Option<Stage>,
    started: Instant,
    cursor: (f32, f32),
    /// Last logical y of every active touch contact
    touches: FxHashMap<u64, f32>,
    failure: Option<StrataError>,
}

impl StrataWindow {
    fn new(config: StrataConfig) -> Self {
        Self {
            config,
            window: None,
            stage: None,
            started: Instant::now(),
            cursor: (0.0, 0.0),
            touches: FxHashMap::default(),
            failure: None,
        }
    }

    fn scale_factor(&self) -> f32 {
        self.window
            .as_ref()
            .map_or(1.0, |window| window.scale_factor() as f32)
    }

    fn viewport(window: &Window) -> Viewport {
        let scale = window.scale_factor();
        let logical = window.inner_size().to_logical::<f32>(scale);
        Viewport::new(logical.width, logical.height, scale as f32)
    }

    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| PlatformError::WindowCreation(e.to_string()))?,
        );

        let viewport = Self::viewport(&window);
        let page = authoring::page(viewport)?;
        let surface_window = window.clone();
        let stage = Stage::mount(&self.config, page, viewport, move |scene, size, quality| {
            let renderer = pollster::block_on(SceneRenderer::with_surface(
                surface_window,
                size,
                quality,
                scene,
            ))?;
            Ok(Box::new(renderer) as Box<dyn FrameRenderer>)
        })?;

        window.request_redraw();
        self.window = Some(window);
        self.stage = Some(stage);
        tracing::info!("Strata window initialized");
        Ok(())
    }

    fn dispatch(&self, event: Event) {
        if let Some(stage) = &self.stage {
            stage.dispatch(&event);
        }
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(stage) = self.stage.as_mut() {
            stage.unmount();
        }
        self.stage = None;
        event_loop.exit();
    }

    fn on_touch(&mut self, touch: winit::event::Touch) {
        let scale = self.scale_factor();
        let x = touch.location.x as f32 / scale;
        let y = touch.location.y as f32 / scale;
        let (phase, delta_y) = match touch.phase {
            winit::event::TouchPhase::Started => {
                self.touches.insert(touch.id, y);
                (TouchPhase::Started, 0.0)
            }
            winit::event::TouchPhase::Moved => {
                let previous = self.touches.insert(touch.id, y).unwrap_or(y);
                // Finger moving up scrolls the page down
                (TouchPhase::Moved, previous - y)
            }
            winit::event::TouchPhase::Ended => {
                self.touches.remove(&touch.id);
                (TouchPhase::Ended, 0.0)
            }
            winit::event::TouchPhase::Cancelled => {
                self.touches.remove(&touch.id);
                (TouchPhase::Cancelled, 0.0)
            }
        };
        self.dispatch(Event::Touch {
            id: touch.id,
            phase,
            x,
            y,
            delta_y,
        });
    }
}

fn scroll_phase(phase: winit::event::TouchPhase) -> ScrollPhase {
    match phase {
        winit::event::TouchPhase::Started => ScrollPhase::Started,
        winit::event::TouchPhase::Moved => ScrollPhase::Moved,
        winit::event::TouchPhase::Ended | winit::event::TouchPhase::Cancelled => ScrollPhase::Ended,
    }
}

impl ApplicationHandler for StrataWindow {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.open(event_loop) {
            tracing::error!("Failed to start Strata: {}", err);
            self.failure = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.close(event_loop),

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let Some(window) = &self.window else {
                    return;
                };
                let viewport = Self::viewport(window);
                self.dispatch(Event::Resized {
                    width: viewport.width,
                    height: viewport.height,
                    scale_factor: viewport.scale_factor,
                });
            }

            WindowEvent::CursorMoved { position, .. } => {
                let scale = self.scale_factor();
                self.cursor = (position.x as f32 / scale, position.y as f32 / scale);
                let (x, y) = self.cursor;
                self.dispatch(Event::PointerMoved { x, y });
            }

            WindowEvent::CursorLeft { .. } => self.dispatch(Event::PointerLeft),

            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                self.dispatch(Event::PointerPressed { x, y });
            }

            WindowEvent::MouseWheel { delta, phase, .. } => {
                let (delta_x, delta_y) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => {
                        let line = self.config.scroll.line_height;
                        (-x * line, -y * line)
                    }
                    MouseScrollDelta::PixelDelta(pos) => {
                        let scale = self.scale_factor();
                        (-(pos.x as f32) / scale, -(pos.y as f32) / scale)
                    }
                };
                self.dispatch(Event::Wheel {
                    delta_x,
                    delta_y,
                    phase: scroll_phase(phase),
                });
            }

            WindowEvent::Touch(touch) => self.on_touch(touch),

            WindowEvent::RedrawRequested => {
                if let Some(stage) = &self.stage {
                    stage.tick(self.started.elapsed().as_secs_f64());
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}
