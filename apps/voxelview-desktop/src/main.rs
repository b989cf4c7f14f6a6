mod keys;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::IVec3;
use parking_lot::RwLock;
use tracing_subscriber::EnvFilter;
use voxelview_common::{PrimitiveKind, ViewerConfig};
use voxelview_input::{Action, InputState, KeyBindings};
use voxelview_render::{
    Camera, ChunkMesher, FramebufferHandle, GraphicsBackend, ShaderSources, Vertex, VoxelScene,
};
use voxelview_render_wgpu::{VOXEL_SHADER, WgpuBackend};
use voxelview_tools::{FrameTimer, WorldInspector};
use voxelview_world::{PregenBounds, PregenHandle, SharedWorld, World, spawn_pregeneration};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

/// Longest frame delta fed to movement, in seconds.
const MAX_FRAME_DELTA: f32 = 0.1;
/// Scroll pixels equivalent to one wheel line.
const PIXELS_PER_LINE: f32 = 50.0;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.53,
    g: 0.71,
    b: 0.92,
    a: 1.0,
};

#[derive(Parser)]
#[command(name = "voxelview-desktop", about = "Voxel world viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML viewer configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chunks pregenerated along each axis (odd); overrides the config
    #[arg(long)]
    pregen_size: Option<i32>,
}

/// Viewer state that does not depend on the GPU.
struct AppState {
    config: ViewerConfig,
    world: SharedWorld,
    pregen: Option<PregenHandle>,
    pregen_total: usize,
    camera: Camera,
    input: InputState,
    mesher: ChunkMesher,
    frame_timer: FrameTimer,
    show_overlay: bool,
    cursor_grabbed: bool,
    quit_requested: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(config: ViewerConfig, pregen_size: Option<i32>) -> Result<Self> {
        let size = pregen_size.map_or(IVec3::from_array(config.world.pregen_size), IVec3::splat);
        let bounds = PregenBounds::from_size(size)?;
        let world: SharedWorld = Arc::new(RwLock::new(World::new()));
        let pregen = spawn_pregeneration(Arc::clone(&world), bounds)?;

        let aspect = config.window.width as f32 / config.window.height as f32;
        let camera = Camera::from_config(&config.camera, aspect);

        Ok(Self {
            config,
            world,
            pregen: Some(pregen),
            pregen_total: bounds.len(),
            camera,
            input: InputState::new(KeyBindings::default()),
            mesher: ChunkMesher::default(),
            frame_timer: FrameTimer::default(),
            show_overlay: true,
            cursor_grabbed: false,
            quit_requested: false,
            last_frame: Instant::now(),
        })
    }

    /// Advance one frame: apply input actions to the camera and scene.
    fn update(&mut self, scene: &mut VoxelScene) {
        let now = Instant::now();
        let elapsed = now - self.last_frame;
        self.last_frame = now;
        self.frame_timer.record(elapsed);
        let dt = elapsed.as_secs_f32().min(MAX_FRAME_DELTA);

        for action in self.input.frame_actions(dt) {
            match action {
                Action::Move { direction, delta } => self.camera.apply_impulse(direction, delta),
                Action::Look { dx, dy } => {
                    if self.cursor_grabbed {
                        self.camera.rotate(dx, dy);
                    }
                }
                Action::AdjustSpeed(offset) => self.camera.adjust_speed(offset),
                Action::SetPrimitive(kind) => scene.set_primitive(kind),
                Action::ToggleOverlay => self.show_overlay = !self.show_overlay,
                Action::Quit => self.quit_requested = true,
            }
        }

        if self.pregen.as_ref().is_some_and(PregenHandle::is_finished) {
            if let Some(handle) = self.pregen.take() {
                match handle.join() {
                    Ok(created) => tracing::info!(created, "background pregeneration finished"),
                    Err(e) => tracing::error!("pregeneration failed: {e}"),
                }
            }
        }
    }

    /// A fresh mesh when chunks were generated since the last call.
    fn take_mesh_update(&mut self) -> Option<Vec<Vertex>> {
        let events = self.world.write().drain_events();
        if events.is_empty() {
            return None;
        }
        tracing::debug!(new_chunks = events.len(), "rebuilding world mesh");
        Some(self.mesher.mesh_world(&self.world.read()))
    }

    fn draw_overlay(&self, ctx: &EguiContext, primitive: PrimitiveKind) {
        if !self.show_overlay {
            return;
        }

        let summary = WorldInspector::summary(&self.world.read());
        let pos = self.camera.position();

        egui::Window::new("voxelview")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", pos.x, pos.y, pos.z));
                ui.label(format!(
                    "Yaw: {:.1}  Pitch: {:.1}",
                    self.camera.yaw(),
                    self.camera.pitch()
                ));
                ui.label(format!("Speed: {:.2}", self.camera.speed()));
                ui.label(format!("Draw mode: {primitive:?}"));
                ui.separator();
                ui.label(format!("Chunks: {}", summary.chunk_count));
                match &self.pregen {
                    Some(handle) => {
                        let (done, total) = handle.progress();
                        ui.add(
                            egui::ProgressBar::new(done as f32 / total.max(1) as f32)
                                .text(format!("Pregenerating {done}/{total}")),
                        );
                    }
                    None => {
                        ui.label(format!("Pregeneration done ({} chunks)", self.pregen_total));
                    }
                }
                ui.separator();
                ui.label(format!(
                    "Frame: {:.2} ms ({:.0} fps)",
                    self.frame_timer.average().as_secs_f64() * 1000.0,
                    self.frame_timer.fps()
                ));
                ui.small("WASD/Space/Shift: move | Wheel: speed | 1/2/3: mode | F1: overlay | Esc: quit");
            });
    }
}

/// Everything created once a window exists.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    backend: WgpuBackend,
    framebuffer: FramebufferHandle,
    scene: VoxelScene,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, state: &mut AppState, egui_ctx: &EguiContext) -> Result<Self> {
        let window_cfg = &state.config.window;
        let attrs = Window::default_attributes()
            .with_title(window_cfg.title.clone())
            .with_inner_size(PhysicalSize::new(window_cfg.width, window_cfg.height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("voxelview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .context("surface reports no alpha modes")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        let mut backend = WgpuBackend::new(device, queue, surface_format);
        let framebuffer =
            backend.create_framebuffer_texture(surface_config.width, surface_config.height)?;
        state
            .camera
            .set_aspect(surface_config.width as f32 / surface_config.height as f32);
        let scene = VoxelScene::new(
            &mut backend,
            &ShaderSources::single_module(VOXEL_SHADER),
            &mut state.camera,
        )?;

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(backend.device(), surface_format, None, 1, false);

        Ok(Self {
            window,
            surface,
            surface_config,
            backend,
            framebuffer,
            scene,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>, camera: &mut Camera) {
        self.surface_config.width = size.width.max(1);
        self.surface_config.height = size.height.max(1);
        self.surface
            .configure(self.backend.device(), &self.surface_config);
        if let Err(e) = self.backend.resize_framebuffer_texture(
            self.framebuffer,
            self.surface_config.width,
            self.surface_config.height,
        ) {
            tracing::error!("framebuffer resize failed: {e}");
        }
        camera.set_aspect(self.surface_config.width as f32 / self.surface_config.height as f32);
    }

    /// Grab and hide the cursor so mouse motion only rotates the camera.
    fn grab_cursor(&self) -> bool {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked));
        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                true
            }
            Err(e) => {
                tracing::warn!("cursor grab unavailable: {e}");
                false
            }
        }
    }

    fn render(&mut self, state: &mut AppState, egui_ctx: &EguiContext) -> Result<()> {
        if let Some(mesh) = state.take_mesh_update() {
            self.scene.upload_mesh(&mut self.backend, &mesh)?;
        }
        self.scene.draw(&mut self.backend, &mut state.camera)?;

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface
                    .configure(self.backend.device(), &self.surface_config);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.backend
            .render_frame(&view, self.framebuffer, CLEAR_COLOR)?;

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let primitive = self.scene.primitive();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_overlay(ctx, primitive);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface_config.width, self.surface_config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let device = self.backend.device();
        let queue = self.backend.queue();
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        self.egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
        Ok(())
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &mut self.state, &self.egui_ctx) {
            Ok(gpu) => {
                self.state.cursor_grabbed = gpu.grab_cursor();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size, &mut self.state.camera);
            }
            WindowEvent::Focused(false) => {
                self.state.input.clear();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                if let Some(key) = keys::map_key(code) {
                    self.state
                        .input
                        .key(key, key_state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.state.input.scrolled(lines);
            }
            WindowEvent::RedrawRequested => {
                self.state.update(&mut gpu.scene);
                if self.state.quit_requested {
                    event_loop.exit();
                    return;
                }
                if let Err(e) = gpu.render(&mut self.state, &self.egui_ctx) {
                    tracing::error!("frame failed: {e:#}");
                }
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.input.mouse_moved(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("voxelview-desktop starting");

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    let state = AppState::new(config, cli.pregen_size)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
