//! Desktop viewer.
//!
//! Opens a window and drives the per-frame loop: clock, settings panel,
//! scene tick, GPU sync and render.
//!
//! ```no_run
//! use lumina_tree::{TreeConfig, Viewer};
//!
//! Viewer::new()
//!     .with_config(TreeConfig::default().with_spiral_turns(6.0))
//!     .with_seed(42)
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::clock::FrameClock;
use crate::config::TreeConfig;
use crate::error::ViewerError;
use crate::gpu::Renderer;
#[cfg(feature = "egui")]
use crate::gpu::EguiIntegration;
#[cfg(feature = "egui")]
use crate::panel::SettingsPanel;
use crate::scene::Scene;

/// Window and startup options for the viewer.
#[derive(Debug, Clone)]
pub struct ViewerSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Fixed seed for reproducible trees and snow.
    pub seed: Option<u64>,
    pub config: TreeConfig,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            title: "LuminaTree".to_string(),
            width: 1280,
            height: 720,
            seed: None,
            config: TreeConfig::default(),
        }
    }
}

/// Builder for the interactive tree viewer.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    settings: ViewerSettings,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: TreeConfig) -> Self {
        self.settings.config = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = Some(seed);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.settings.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.settings.width = width;
        self.settings.height = height;
        self
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        self.settings.config.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self.settings);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn make_rng(seed: Option<u64>) -> Box<dyn RngCore> {
    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    }
}

struct App {
    settings: ViewerSettings,
    rng: Box<dyn RngCore>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Option<Scene>,
    /// Configuration being edited by the panel and the reset key.
    draft: TreeConfig,
    /// Set when `draft` was edited since it was last applied.
    draft_dirty: bool,
    clock: FrameClock,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
    #[cfg(feature = "egui")]
    panel: SettingsPanel,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<ViewerError>,
}

impl App {
    fn new(settings: ViewerSettings) -> Self {
        Self {
            rng: make_rng(settings.seed),
            draft: settings.config,
            draft_dirty: false,
            settings,
            window: None,
            renderer: None,
            scene: None,
            clock: FrameClock::new(),
            #[cfg(feature = "egui")]
            egui: None,
            #[cfg(feature = "egui")]
            panel: SettingsPanel::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.settings.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.width,
                self.settings.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let scene = Scene::new(self.settings.config, &mut *self.rng)?;
        let renderer = pollster::block_on(Renderer::new(window.clone(), &scene))?;

        #[cfg(feature = "egui")]
        {
            self.egui = Some(EguiIntegration::new(
                renderer.device(),
                renderer.config.format,
                &window,
            ));
        }

        info!(
            "Viewer started with {} particles{}",
            scene.field().len(),
            match self.settings.seed {
                Some(seed) => format!(" (seed {seed})"),
                None => String::new(),
            }
        );

        self.clock.reset();
        self.window = Some(window);
        self.scene = Some(scene);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ViewerError) {
        error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
            PhysicalKey::Code(KeyCode::KeyR) => {
                info!("Restoring default settings");
                self.draft = TreeConfig::default();
                self.draft_dirty = true;
                if let Some(renderer) = &mut self.renderer {
                    renderer.camera.reset_view();
                }
            }
            #[cfg(feature = "egui")]
            PhysicalKey::Code(KeyCode::KeyH) => self.panel.toggle(),
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else {
            return;
        };

        let (elapsed, _) = self.clock.update();

        #[cfg(feature = "egui")]
        let ui_output = self.egui.as_mut().map(|egui| {
            let panel = &mut self.panel;
            let draft = &mut self.draft;
            let dirty = &mut self.draft_dirty;
            egui.run(&window, |ctx| {
                *dirty |= panel.show(ctx, draft);
            })
        });

        self.apply_draft();

        let (Some(renderer), Some(scene)) = (&mut self.renderer, &mut self.scene) else {
            return;
        };

        scene.advance(elapsed);
        renderer.camera.update();
        renderer.sync(scene);

        let size = renderer.size();
        let bloom_intensity = scene.config().bloom_intensity;

        #[cfg(feature = "egui")]
        let egui = &mut self.egui;
        let result = renderer.render(bloom_intensity, |device, queue, encoder, view| {
            #[cfg(feature = "egui")]
            {
                if let (Some(egui), Some(output)) = (egui.as_mut(), ui_output.as_ref()) {
                    egui.paint(device, queue, encoder, view, size, output);
                }
            }
            #[cfg(not(feature = "egui"))]
            let _ = (device, queue, encoder, view, size);
        });

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => warn!("Render error: {:?}", e),
        }

        if self.clock.fps_refreshed() {
            window.set_title(&format!("{} - {:.0} FPS", self.settings.title, self.clock.fps()));
        }
        window.request_redraw();
    }

    /// Push the draft into the scene if it was edited since the last frame.
    ///
    /// Returns whether the scene regenerated.
    fn apply_draft(&mut self) -> bool {
        let Some(scene) = &mut self.scene else {
            return false;
        };
        if !std::mem::take(&mut self.draft_dirty) {
            return false;
        }
        match scene.apply_config(self.draft, &mut *self.rng) {
            Ok(regenerated) => regenerated,
            Err(err) => {
                warn!("Ignoring invalid settings: {err}");
                self.draft = *scene.config();
                false
            }
        }
    }

    /// Whether egui wants this event for itself.
    #[cfg(feature = "egui")]
    fn ui_consumes(&mut self, event: &WindowEvent) -> bool {
        match (&mut self.egui, &self.window) {
            (Some(egui), Some(window)) => egui.on_window_event(window, event),
            _ => false,
        }
    }

    #[cfg(not(feature = "egui"))]
    fn ui_consumes(&mut self, _event: &WindowEvent) -> bool {
        false
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init(event_loop) {
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let consumed = self.ui_consumes(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if !consumed => {
                self.handle_key(event_loop, &event);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    // Releases always end a drag, even over the panel.
                    self.mouse_pressed = state == ElementState::Pressed && !consumed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;

                        if let Some(renderer) = &mut self.renderer {
                            let height = renderer.config.height as f32;
                            renderer.camera.drag(dx, dy, height);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                if let Some(renderer) = &mut self.renderer {
                    renderer.camera.scroll(notches);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let viewer = Viewer::new();
        let s = viewer.settings();
        assert_eq!(s.title, "LuminaTree");
        assert_eq!((s.width, s.height), (1280, 720));
        assert_eq!(s.seed, None);
        assert_eq!(s.config, TreeConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = TreeConfig::default().with_particle_count(800);
        let viewer = Viewer::new()
            .with_config(config)
            .with_seed(99)
            .with_title("Holiday")
            .with_size(640, 480);
        let s = viewer.settings();
        assert_eq!(s.config.particle_count, 800);
        assert_eq!(s.seed, Some(99));
        assert_eq!(s.title, "Holiday");
        assert_eq!((s.width, s.height), (640, 480));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = make_rng(Some(5));
        let mut b = make_rng(Some(5));
        assert_eq!(a.next_u64(), b.next_u64());
    }

    fn headless_app() -> App {
        let mut app = App::new(ViewerSettings {
            seed: Some(3),
            ..ViewerSettings::default()
        });
        app.scene = Some(Scene::new(app.settings.config, &mut *app.rng).unwrap());
        app
    }

    #[test]
    fn test_clean_draft_never_regenerates() {
        let mut app = headless_app();
        for _ in 0..3 {
            assert!(!app.apply_draft());
        }
        assert_eq!(app.scene.as_ref().unwrap().generation(), 0);
    }

    #[test]
    fn test_edited_draft_is_applied_once() {
        let mut app = headless_app();
        app.draft = app.draft.with_spiral_turns(6.5);
        app.draft_dirty = true;

        assert!(app.apply_draft());
        assert!(!app.apply_draft());
        let scene = app.scene.as_ref().unwrap();
        assert_eq!(scene.generation(), 1);
        assert_eq!(scene.config().spiral_turns, 6.5);
    }

    #[test]
    fn test_invalid_draft_is_rolled_back() {
        let mut app = headless_app();
        app.draft = app.draft.with_particle_count(0);
        app.draft_dirty = true;

        assert!(!app.apply_draft());
        assert_eq!(app.draft, TreeConfig::default());
        assert!(!app.draft_dirty);
    }

    #[test]
    fn test_run_rejects_invalid_config_before_opening_window() {
        let viewer = Viewer::new().with_config(TreeConfig::default().with_tree_height(-1.0));
        assert!(matches!(viewer.run(), Err(ViewerError::Config(_))));
    }
}
