//! Standalone preview window backed by winit.
//!
//! Renders an animated test card into an offscreen color image, runs the
//! retro feature over it in place, and presents the result.
//!
//! ```no_run
//! # use retrofx::Viewer;
//! Viewer::builder()
//!     .with_preset("assets/presets/vhs.toml")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```
//!
//! Keys: `Space` toggles the effect, `Up`/`Down` change the bleed radius,
//! `S` toggles the smear, `L` cycles scanline strength, `R` reloads the
//! preset, `Escape` quits.

use std::path::PathBuf;
use std::sync::Arc;

use web_time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::effect::{Knob, RetroParameters};
use crate::error::RetroError;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, filtering_sampler, linear_sampler,
    texture_2d, uniform_buffer_of,
};
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::{ShaderComposer, PRESENT_SHADER};
use crate::gpu::texture::RenderTarget;
use crate::gpu::{BlitBindings, FrameEncoder, RetroProgram, WgpuTargetPool};
use crate::options::Options;
use crate::renderer::postprocess::retro::{CameraKind, Execution, RetroFeature};

/// Format of the offscreen image the effect runs on.
const SOURCE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    preset: Option<PathBuf>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            preset: None,
            options: None,
            title: "Retro".into(),
        }
    }

    /// Load options from a TOML preset (reloadable with `R`).
    #[must_use]
    pub fn with_preset(mut self, path: impl Into<PathBuf>) -> Self {
        self.preset = Some(path.into());
        self
    }

    /// Start from explicit options instead of a preset.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            preset: self.preset,
            options: self.options,
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window previewing the retro effect on a test card.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    preset: Option<PathBuf>,
    options: Option<Options>,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Fails if the preset cannot be loaded or the event loop cannot start.
    pub fn run(self) -> Result<(), RetroError> {
        let options = match (self.options, &self.preset) {
            (Some(options), _) => options,
            (None, Some(path)) => Options::load(path)?,
            (None, None) => Options::default(),
        };

        let event_loop =
            EventLoop::new().map_err(|e| RetroError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            state: None,
            preset: self.preset,
            options,
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| RetroError::Viewer(e.to_string()))
    }
}

// ── GPU state ────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CardUniforms {
    time: f32,
    aspect: f32,
    _pad: [f32; 2],
}

/// Everything the viewer draws with.
struct ViewerState {
    context: RenderContext,
    card_pipeline: wgpu::RenderPipeline,
    card_buffer: wgpu::Buffer,
    card_bind_group: wgpu::BindGroup,
    present_pipeline: wgpu::RenderPipeline,
    present_layout: wgpu::BindGroupLayout,
    present_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    source: RenderTarget,
    pool: WgpuTargetPool,
    bindings: BlitBindings,
    feature: RetroFeature<RetroProgram>,
    params: RetroParameters,
    started: Instant,
    last_depth: usize,
}

impl ViewerState {
    async fn new(
        window: Arc<Window>,
        size: (u32, u32),
        options: &Options,
    ) -> Result<Self, RetroError> {
        let context = RenderContext::new(window, size).await?;
        let device = &context.device;
        let mut composer = ShaderComposer::new()?;

        let program =
            match RetroProgram::new(device, &mut composer, SOURCE_FORMAT) {
                Ok(program) => Some(program),
                Err(e) => {
                    log::error!("{e}");
                    None
                }
            };
        let feature = RetroFeature::create(options.feature.clone(), program);

        let shader = composer.compose(
            device,
            "Present Shader",
            PRESENT_SHADER,
            "present.wgsl",
        )?;
        let card_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Test Card Layout"),
                entries: &[uniform_buffer_of::<CardUniforms>(0)],
            });
        let present_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Present Layout"),
                entries: &[texture_2d(0), filtering_sampler(1)],
            });
        let card_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Test Card Uniforms"),
            size: size_of::<CardUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let card_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Test Card Bind Group"),
                layout: &card_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: card_buffer.as_entire_binding(),
                }],
            });
        let card_pipeline = create_screen_space_pipeline(
            device,
            "Test Card",
            &shader,
            "fs_test_card",
            SOURCE_FORMAT,
            None,
            &[&card_layout],
        );
        let present_pipeline = create_screen_space_pipeline(
            device,
            "Present",
            &shader,
            "fs_present",
            context.format(),
            None,
            &[&card_layout, &present_layout],
        );

        let sampler = linear_sampler(device, "Present Sampler");
        let source = RenderTarget::new(
            device,
            "Retro Source",
            context.width(),
            context.height(),
            SOURCE_FORMAT,
        );
        let present_bind_group =
            present_bind_group(device, &present_layout, &source, &sampler);
        let pool = WgpuTargetPool::new(device);
        let bindings = BlitBindings::new(device);

        Ok(Self {
            context,
            card_pipeline,
            card_buffer,
            card_bind_group,
            present_pipeline,
            present_layout,
            present_bind_group,
            sampler,
            source,
            pool,
            bindings,
            feature,
            params: options.retro.to_parameters(),
            started: Instant::now(),
            last_depth: 0,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.source = RenderTarget::new(
            &self.context.device,
            "Retro Source",
            width,
            height,
            SOURCE_FORMAT,
        );
        self.present_bind_group = present_bind_group(
            &self.context.device,
            &self.present_layout,
            &self.source,
            &self.sampler,
        );
        // Parked targets are sized for the old resolution.
        self.pool.trim();
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.acquire_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let seconds = self.started.elapsed().as_secs_f32();
        let (width, height) = (self.source.width(), self.source.height());

        self.context.queue.write_buffer(
            &self.card_buffer,
            0,
            bytemuck::bytes_of(&CardUniforms {
                time: seconds,
                aspect: width as f32 / height as f32,
                _pad: [0.0; 2],
            }),
        );

        let mut encoder = self.context.create_encoder();
        draw_fullscreen(
            &mut encoder,
            "Test Card",
            &self.source.view,
            &self.card_pipeline,
            &[&self.card_bind_group],
        );

        self.feature.set_time(seconds);
        if self.feature.add_render_passes(&self.params, CameraKind::Game) {
            let mut recorder = FrameEncoder::new(
                &self.context.device,
                &self.context.queue,
                &mut encoder,
                &mut self.pool,
                &mut self.bindings,
                &self.source.view,
            );
            if let Some(Execution::Rendered(stats)) =
                self.feature.execute(&mut recorder, width, height)
            {
                if stats.depth != self.last_depth {
                    log::info!(
                        "retro: {} levels, {} draws, {} targets",
                        stats.depth,
                        stats.blits,
                        stats.targets
                    );
                    self.last_depth = stats.depth;
                }
            }
        }

        draw_fullscreen(
            &mut encoder,
            "Present",
            &view,
            &self.present_pipeline,
            &[&self.card_bind_group, &self.present_bind_group],
        );
        self.context.submit(encoder);
        frame.present();
        Ok(())
    }

    fn nudge(&mut self, knob: Knob, delta: f32) {
        let value = self.params.get(knob) + delta;
        self.params.set(knob, value);
        log::info!("{} = {:.3}", knob.name(), self.params.get(knob));
    }

    fn toggle(&mut self, knob: Knob, on: f32) {
        let value = if self.params.get(knob) > 0.0 { 0.0 } else { on };
        self.params.set(knob, value);
        log::info!("{} = {:.3}", knob.name(), self.params.get(knob));
    }
}

impl Drop for ViewerState {
    fn drop(&mut self) {
        self.feature.dispose();
    }
}

fn present_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    source: &RenderTarget,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Present Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&source.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn draw_fullscreen(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_groups: &[&wgpu::BindGroup],
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        ..Default::default()
    });
    pass.set_pipeline(pipeline);
    for (index, group) in bind_groups.iter().enumerate() {
        pass.set_bind_group(index as u32, *group, &[]);
    }
    pass.draw(0..3, 0..1);
}

// ── Winit app ────────────────────────────────────────────────────────────

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    state: Option<ViewerState>,
    preset: Option<PathBuf>,
    options: Options,
    title: String,
}

impl ViewerApp {
    fn reload_preset(&mut self) {
        let Some(path) = &self.preset else {
            return;
        };
        match Options::load(path) {
            Ok(options) => {
                if let Some(state) = &mut self.state {
                    state.params = options.retro.to_parameters();
                }
                log::info!("reloaded {}", path.display());
                self.options = options;
            }
            Err(e) => log::warn!("preset reload failed: {e}"),
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        if code == KeyCode::KeyR {
            self.reload_preset();
            return;
        }
        let Some(state) = &mut self.state else {
            return;
        };
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Space => {
                state.params.enabled = !state.params.enabled;
                log::info!("retro enabled: {}", state.params.enabled);
            }
            KeyCode::ArrowUp => state.nudge(Knob::BleedRadius, 0.05),
            KeyCode::ArrowDown => state.nudge(Knob::BleedRadius, -0.05),
            KeyCode::KeyS => state.toggle(Knob::SmearIntensity, 0.6),
            KeyCode::KeyL => {
                let next = (state.params.get(Knob::ScanlineIntensity) + 0.25) % 1.25;
                state.params.set(Knob::ScanlineIntensity, next);
                log::info!("scanline_intensity = {next:.2}");
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(960, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let inner = window.inner_size();
        let size = (inner.width.max(1), inner.height.max(1));
        let state = match pollster::block_on(ViewerState::new(
            window.clone(),
            size,
            &self.options,
        )) {
            Ok(state) => state,
            Err(e) => {
                log::error!("Failed to initialize viewer: {e}");
                event_loop.exit();
                return;
            }
        };

        window.request_redraw();
        self.window = Some(window);
        self.state = Some(state);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.resize(size.width, size.height);
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(state) = &mut self.state {
                    match state.render() {
                        Ok(()) => {}
                        Err(
                            wgpu::SurfaceError::Outdated
                            | wgpu::SurfaceError::Lost,
                        ) => {
                            if let Some(w) = &self.window {
                                let inner = w.inner_size();
                                state.resize(inner.width, inner.height);
                            }
                        }
                        Err(e) => log::error!("render error: {e:?}"),
                    }
                }
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(event_loop, code);
                }
            }

            _ => (),
        }
    }
}
