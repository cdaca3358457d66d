//! Windowed demo host.
//!
//! Controls:
//! - pointer: steers the focal mesh
//! - Up / Down: distort ± 0.05
//! - Right / Left: radius ± 0.05
//! - Space: pause
//! - Escape: quit

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

use crate::config::{ControlKey, SceneConfig};
use crate::error::{RunError, SceneError};
use crate::frame::FrameContext;
use crate::gpu::{GpuAssets, GpuContext, Renderer};
use crate::input::Input;
use crate::scene::Scene;
use crate::textures::MaterialAssets;
use crate::time::Time;

const NUDGE: f32 = 0.05;

struct Running {
    window: Arc<Window>,
    renderer: Renderer,
    scene: Scene,
    // Owns the textures the renderer's bind groups reference.
    _assets: GpuAssets,
}

struct App {
    config: SceneConfig,
    running: Option<Running>,
    input: Input,
    time: Time,
    error: Option<RunError>,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        Self {
            config,
            running: None,
            input: Input::default(),
            time: Time::new(),
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Running, RunError> {
        let window_attrs = Window::default_attributes()
            .with_title("Distort")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);

        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        let mut assets = GpuAssets::new(&gpu.device, &gpu.queue);
        let pending = MaterialAssets::load(&mut assets, &self.config.assets).map_err(SceneError::from)?;
        let scene = Scene::new(self.config.clone(), &pending)?;
        let renderer = Renderer::new(gpu, &scene, &assets)?;

        Ok(Running {
            window,
            renderer,
            scene,
            _assets: assets,
        })
    }

    fn handle_keys(&mut self, scene: &mut Scene) {
        let nudges = [
            (KeyCode::ArrowUp, ControlKey::Distort, NUDGE),
            (KeyCode::ArrowDown, ControlKey::Distort, -NUDGE),
            (KeyCode::ArrowRight, ControlKey::Radius, NUDGE),
            (KeyCode::ArrowLeft, ControlKey::Radius, -NUDGE),
        ];
        for (code, key, delta) in nudges {
            if self.input.key_pressed(code) {
                match scene.controls_mut().nudge(key, delta) {
                    Ok(value) => log::info!("{} = {:.2}", key.name(), value),
                    Err(e) => log::warn!("{e}"),
                }
            }
        }
        if self.input.key_pressed(KeyCode::Space) {
            self.time.toggle_pause();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(mut running) = self.running.take() else {
            return;
        };

        self.handle_keys(&mut running.scene);
        let (elapsed, delta) = self.time.update();
        let ctx = FrameContext::new(elapsed, delta, self.input.pointer_ndc(), self.time.frame());
        self.input.end_frame();

        if self.time.is_paused() {
            running.scene.apply_controls();
        } else {
            running.scene.frame(&ctx);
        }

        match running.renderer.render(&running.scene) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                running.renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::error!("Render error: {e:?}"),
        }

        running.window.request_redraw();
        self.running = Some(running);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.error.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { .. } if self.input.key_pressed(KeyCode::Escape) => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(running) = &mut self.running {
                    running.renderer.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window and run the scene until it is closed.
pub fn run(config: SceneConfig) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
