use std::{sync::Arc, time::Instant};
use anyhow::{bail, Context, Result};
use image::{Rgba, RgbaImage};
use log::{error, info, warn};
use pollster::FutureExt as _;

use winit::{
    application::ApplicationHandler, dpi::PhysicalSize, event::WindowEvent, event_loop::{ActiveEventLoop, EventLoop}, window::{Window, WindowId}
};

use wgpu::{Adapter, BindGroup, BindGroupLayout, Device, Instance, MemoryHints, PresentMode, Queue, Surface, SurfaceCapabilities, Texture};

use animbg::{Assets, Background, Camera, ViewGeometry};

const CLEAR_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Loads background `level` and presents it in a window until closed.
pub fn run(assets: Assets, level: u32, geometry: ViewGeometry, camera: Camera) -> Result<()> {
    let clock = Instant::now();

    let mut background = Background::new();
    background.load(level, &assets, &geometry, 0);
    if !background.is_ok() {
        bail!("background {} could not be loaded from {}", level, assets.data_dir().display());
    }

    let event_loop = EventLoop::new()?;
    let mut window_state = StateApplication::new(Scene::new(background, geometry, camera, clock));
    event_loop.run_app(&mut window_state)?;
    Ok(())
}

/// The background and the software canvas it is composited into every redraw.
struct Scene {
    background: Background,
    geometry: ViewGeometry,
    camera: Camera,
    clock: Instant,
    canvas: RgbaImage,
}

impl Scene {
    fn new(background: Background, geometry: ViewGeometry, camera: Camera, clock: Instant) -> Self {
        let canvas = RgbaImage::from_pixel(geometry.screen_width, geometry.screen_height, CLEAR_COLOR);
        Self {
            background,
            geometry,
            camera,
            clock,
            canvas,
        }
    }

    fn compose(&mut self) -> &RgbaImage {
        let now_ms = self.clock.elapsed().as_millis() as u64;

        self.canvas.pixels_mut().for_each(|pixel| *pixel = CLEAR_COLOR);
        self.background.draw(&mut self.canvas, self.camera, &self.geometry, now_ms);
        &self.canvas
    }
}

struct StateApplication {
    state: Option<State>,
    scene: Scene,
}

impl StateApplication {
    fn new(scene: Scene) -> Self {
        Self {
            state: None,
            scene,
        }
    }
}

impl ApplicationHandler for StateApplication {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let size = PhysicalSize::new(self.scene.geometry.screen_width, self.scene.geometry.screen_height);
        let attributes = Window::default_attributes()
            .with_title("animbg")
            .with_inner_size(size);

        let state = event_loop
            .create_window(attributes)
            .context("creating window")
            .and_then(|window| State::new(window, &self.scene.geometry));

        match state {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                error!("cannot set up rendering: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        if state.window().id() == window_id {
            match event {
                WindowEvent::CloseRequested => {
                    info!("close has been requested");
                    event_loop.exit();
                },
                WindowEvent::Resized(physical_size) => {
                    state.resize(physical_size);
                },
                WindowEvent::RedrawRequested => {
                    state.write_texture(self.scene.compose());
                    match state.render() {
                        Ok(()) => {},
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.resize(state.size),
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("out of memory while presenting");
                            event_loop.exit();
                        },
                        Err(err) => warn!("skipping frame: {err}"),
                    }
                },
                _ => {}
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_ref() {
            state.window().request_redraw();
        }
    }
}

struct State {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: wgpu::SurfaceConfiguration,
    texture_bind_group: BindGroup,
    texture: Texture,
    texture_size: wgpu::Extent3d,

    size: PhysicalSize<u32>,
    window: Arc<Window>,
    render_pipeline: wgpu::RenderPipeline,
}

impl State {
    fn new(window: Window, geometry: &ViewGeometry) -> Result<Self> {
        let window_arc = Arc::new(window);
        let size = window_arc.inner_size();
        let instance = Self::create_gpu_instance();
        let surface = instance.create_surface(window_arc.clone())?;
        let adapter = Self::create_adapter(instance, &surface)?;
        let (device, queue) = Self::create_device(&adapter)?;
        let surface_caps = surface.get_capabilities(&adapter);
        let config = Self::create_surface_config(size, surface_caps)?;

        let texture_size = wgpu::Extent3d {
            width: geometry.screen_width,
            height: geometry.screen_height,
            depth_or_array_layers: 1,
        };
        let (texture_bind_group, texture_bind_group_layout, texture) = Self::create_texture_bind_group(&device, texture_size);
        let render_pipeline = Self::create_render_pipeline(&device, &config, &texture_bind_group_layout);

        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            texture_bind_group,
            texture,
            texture_size,
            render_pipeline,
            window: window_arc,
        })
    }

    fn create_texture_bind_group(device: &Device, texture_size: wgpu::Extent3d) -> (BindGroup, BindGroupLayout, Texture) {
        let diffuse_texture = device.create_texture(
            &wgpu::TextureDescriptor {
                size: texture_size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                label: Some("background canvas"),
                view_formats: &[],
            }
        );

        let diffuse_texture_view = diffuse_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let diffuse_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None
                }
            ],
            label: None
        });

        let diffuse_bind_group = device.create_bind_group(
            &wgpu::BindGroupDescriptor {
                layout: &texture_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&diffuse_texture_view)
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&diffuse_sampler)
                    },
                ],
                label: None
            }
        );

        (diffuse_bind_group, texture_bind_group_layout, diffuse_texture)
    }

    fn create_surface_config(size: PhysicalSize<u32>, capabilities: SurfaceCapabilities) -> Result<wgpu::SurfaceConfiguration> {
        let surface_format = capabilities.formats.iter()
            .find(|f| f.is_srgb())
            .or_else(|| capabilities.formats.first())
            .copied()
            .context("surface reports no texture formats")?;

        Ok(wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: PresentMode::AutoVsync,
            alpha_mode: capabilities.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        })
    }

    fn create_device(adapter: &Adapter) -> Result<(Device, Queue)> {
        let device = adapter.request_device(
            &wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: MemoryHints::Performance,
                label: None,
            },
            None
        ).block_on()?;
        Ok(device)
    }

    fn create_adapter(instance: Instance, surface: &Surface) -> Result<Adapter> {
        instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            }
        ).block_on().context("no graphics adapter is compatible with the window surface")
    }

    fn create_gpu_instance() -> Instance {
        Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;

        self.config.width = new_size.width;
        self.config.height = new_size.height;

        self.surface.configure(&self.device, &self.config);
    }

    /// Uploads the composited canvas, which must match the texture size.
    pub fn write_texture(&mut self, canvas: &RgbaImage) {
        debug_assert_eq!((canvas.width(), canvas.height()), (self.texture_size.width, self.texture_size.height));

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::default(),
            },
            canvas.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * canvas.width()),
                rows_per_image: Some(canvas.height()),
            },
            self.texture_size
        );
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    }
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.texture_bind_group, &[]);
            render_pass.draw(0..6, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    fn create_render_pipeline(device: &Device, config: &wgpu::SurfaceConfiguration, bind_group_layout: &BindGroupLayout) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into())
        });

        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: None,
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Cw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }
}
