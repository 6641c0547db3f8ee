// Valley scene with instanced rendering: every prop, enemy, and the
// placeholder player body is an instance of one of five primitive
// meshes, drawn in one call per primitive class.

mod engine;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::{Vec2, Vec3};
use winit::{
    event::{ElementState, Event as WinitEvent, KeyEvent, MouseButton, TouchPhase, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use engine::assets::ModelLoad;
use engine::camera::FollowCamera;
use engine::config::Config;
use engine::hud::{Hud, HudFrame, HudStats};
use engine::joystick::{Joystick, MOUSE_POINTER};
use engine::loadout::Loadout;
use engine::mesh::{self, GpuVertex, RenderMesh};
use engine::sim::Simulation;
use engine::{Color, Primitive, Shape, Transform};

/// Sky, also the fog target and the clear color.
const SKY_HEX: u32 = 0x87ceeb;
/// Fog band in world units from the camera eye.
const FOG_NEAR: f32 = 20.0;
const FOG_FAR: f32 = 150.0;
/// The sun sits high to the south-east, aimed at the origin.
const SUN_POSITION: Vec3 = Vec3::new(50.0, 100.0, 50.0);

const MODEL_PATH: &str = "assets/player.obj";
const MODEL_SCALE: f32 = 5.0;

/// Instances per primitive batch. The whole map needs well under half.
const MAX_INSTANCES: usize = 512;

// ============================================================================
// INSTANCE DATA (per-entity)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    // xyz = world position, w = yaw
    pos_yaw: [f32; 4],
    // xyz = per-axis scale
    scale: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(transform: &Transform, scale: Vec3, color: &Color) -> Self {
        Self {
            pos_yaw: [
                transform.position.x,
                transform.position.y,
                transform.position.z,
                transform.yaw,
            ],
            scale: [scale.x, scale.y, scale.z, 0.0],
            color: [color.r, color.g, color.b, 1.0],
        }
    }

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance, // One per instance, not per vertex
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: (2 * std::mem::size_of::<[f32; 4]>()) as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// ============================================================================
// UNIFORM DATA
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    sun_dir: [f32; 4],
    sky_color: [f32; 4],
    fog: [f32; 4],
}

impl Uniforms {
    fn new(view_proj: glam::Mat4, eye: Vec3) -> Self {
        let sun_dir = (-SUN_POSITION).normalize();
        let sky = Color::from_hex(SKY_HEX);
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: [eye.x, eye.y, eye.z, 0.0],
            sun_dir: [sun_dir.x, sun_dir.y, sun_dir.z, 0.0],
            sky_color: [sky.r, sky.g, sky.b, 1.0],
            fog: [FOG_NEAR, FOG_FAR, 0.0, 0.0],
        }
    }
}

// ============================================================================
// GPU MESH (shared geometry + its instance buffer)
// ============================================================================

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &RenderMesh, label: &str, max_instances: usize) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: mesh.vertex_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: mesh.index_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (max_instances * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: mesh.index_count() as u32,
            instance_buffer,
            capacity: max_instances,
        }
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,
    // One GPU mesh per Primitive, indexed by Primitive::index().
    batches: [GpuMesh; Primitive::COUNT],
    player_mesh: Option<GpuMesh>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    sim: Simulation,
    joystick: Joystick,
    camera: FollowCamera,
    loadout: Loadout,
    model_load: ModelLoad,
    hud: Hud,

    last_update: Instant,
    last_cursor: Vec2,
    draw_calls: u32,

    // Rolling once-per-second frame stats for the HUD panel.
    frames_this_second: u32,
    frame_seconds_accum: f32,
    last_fps_update: Instant,
    fps: u32,
    frame_time_avg_ms: f32,
}

impl State {
    async fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);
        let depth_view = create_depth_texture(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader_instanced.wgsl").into()),
        });

        let uniform_buffer = {
            use wgpu::util::DeviceExt;
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Uniform Buffer"),
                contents: bytemuck::cast_slice(&[Uniforms::new(glam::Mat4::IDENTITY, Vec3::ZERO)]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Render Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GpuVertex::desc(), InstanceData::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
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
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        // Shared geometry, one mesh per primitive class in index order.
        let batches = [
            (mesh::cube(), "cube"),
            (mesh::cone(16), "cone"),
            (mesh::cone(4), "pyramid"),
            (mesh::cylinder(0.5, 0.8, 8), "trunk"),
            (mesh::quad(), "quad"),
        ]
        .map(|(poly, label)| {
            GpuMesh::upload(&device, &mesh::triangulate_smooth(&poly), label, MAX_INSTANCES)
        });

        let sim_config = Config::default();
        let mut joystick = Joystick::new(sim_config.player_speed, sim_config.stick_radius);
        joystick.set_center(stick_center(&joystick, size));
        let camera = FollowCamera::new(&sim_config);
        let sim = Simulation::new(sim_config);

        let hud = Hud::new(&window, &device, surface_format);
        let model_load = ModelLoad::begin(PathBuf::from(MODEL_PATH));

        Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            depth_view,
            batches,
            player_mesh: None,
            uniform_buffer,
            uniform_bind_group,
            sim,
            joystick,
            camera,
            loadout: Loadout::new(),
            model_load,
            hud,
            last_update: Instant::now(),
            last_cursor: Vec2::ZERO,
            draw_calls: 0,
            frames_this_second: 0,
            frame_seconds_accum: 0.0,
            last_fps_update: Instant::now(),
            fps: 0,
            frame_time_avg_ms: 0.0,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_texture(&self.device, &self.config);
            self.joystick
                .set_center(stick_center(&self.joystick, new_size));
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_update).as_secs_f32();
        self.last_update = now;

        // Resolve the asynchronous model load; reports at most once.
        if let Some(result) = self.model_load.poll() {
            match result {
                Ok(model) => {
                    log::info!("player model loaded ({} vertices)", model.vertices.len());
                    self.player_mesh =
                        Some(GpuMesh::upload(&self.device, &model, "player_model", 1));
                    self.sim.replace_placeholder_with_model();
                }
                Err(err) => {
                    log::error!("player model failed to load, keeping placeholder: {err}");
                }
            }
        }

        self.sim.advance(self.joystick.drive(), dt);
        self.camera.follow(self.sim.player_position());

        self.frames_this_second += 1;
        self.frame_seconds_accum += dt;
        if (now - self.last_fps_update).as_secs_f32() >= 1.0 {
            self.fps = self.frames_this_second;
            self.frame_time_avg_ms =
                1000.0 * self.frame_seconds_accum / self.frames_this_second.max(1) as f32;
            self.frames_this_second = 0;
            self.frame_seconds_accum = 0.0;
            self.last_fps_update = now;
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Collect instance data from the ECS before the render pass.
        let mut instances: [Vec<InstanceData>; Primitive::COUNT] = Default::default();
        let mut query = self.sim.world.query::<(&Transform, &Shape, &Color)>();
        for (transform, shape, color) in query.iter(&self.sim.world) {
            instances[shape.primitive.index()].push(InstanceData::new(
                transform,
                shape.scale,
                color,
            ));
        }

        let mut counts = [0u32; Primitive::COUNT];
        for (i, batch) in instances.iter().enumerate() {
            let count = batch.len().min(self.batches[i].capacity);
            counts[i] = count as u32;
            if count > 0 {
                self.queue.write_buffer(
                    &self.batches[i].instance_buffer,
                    0,
                    bytemuck::cast_slice(&batch[..count]),
                );
            }
        }

        // The loaded model draws as a one-instance batch at the player
        // transform, scaled up the way the source asset needs.
        let mut model_instances = 0u32;
        if let Some(model) = &self.player_mesh {
            if let Some(transform) = self.sim.world.get::<Transform>(self.sim.player) {
                let instance = InstanceData::new(
                    transform,
                    Vec3::splat(MODEL_SCALE),
                    &Color { r: 1.0, g: 1.0, b: 1.0 },
                );
                self.queue
                    .write_buffer(&model.instance_buffer, 0, bytemuck::cast_slice(&[instance]));
                model_instances = 1;
            }
        }

        let aspect = self.size.width as f32 / self.size.height as f32;
        let uniforms = Uniforms::new(self.camera.view_projection(aspect), self.camera.eye());
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let sky = Color::from_hex(SKY_HEX);
        self.draw_calls = 0;
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: sky.r as f64,
                            g: sky.g as f64,
                            b: sky.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // One draw call per primitive class with any instances.
            for (i, gpu) in self.batches.iter().enumerate() {
                if counts[i] == 0 {
                    continue;
                }
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
                render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu.num_indices, 0, 0..counts[i]);
                self.draw_calls += 1;
            }

            if let Some(model) = &self.player_mesh {
                if model_instances > 0 {
                    render_pass.set_vertex_buffer(0, model.vertex_buffer.slice(..));
                    render_pass.set_vertex_buffer(1, model.instance_buffer.slice(..));
                    render_pass
                        .set_index_buffer(model.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..model.num_indices, 0, 0..model_instances);
                    self.draw_calls += 1;
                }
            }
        }

        // HUD on top, in egui points (physical pixels / scale factor).
        let pixels_per_point = self.window.scale_factor() as f32;
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.size.width, self.size.height],
            pixels_per_point,
        };
        let stick_center = self.joystick.center() / pixels_per_point;
        let stick_offset = self.joystick.offset() / pixels_per_point;
        let hud_frame = HudFrame {
            alive: self.sim.alive_count(),
            weapon: self.loadout.current().name,
            stick_center: egui::pos2(stick_center.x, stick_center.y),
            stick_offset: egui::vec2(stick_offset.x, stick_offset.y),
            stick_radius: self.joystick.max_radius() / pixels_per_point,
            stats: self.hud.stats_visible.then(|| HudStats {
                fps: self.fps,
                frame_time_avg_ms: self.frame_time_avg_ms,
                entity_count: self.sim.world.entities().len() as usize,
                draw_calls: self.draw_calls,
                resolution: (self.size.width, self.size.height),
            }),
        };

        let hud_response = self.hud.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &self.window,
            &view,
            &screen_descriptor,
            &hud_frame,
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        if hud_response.cycle_clicked {
            let skin = self.loadout.cycle();
            let recolored = self.sim.apply_skin(skin.color);
            log::info!(
                "skin -> {} (recolored placeholder: {recolored})",
                skin.name
            );
        }

        Ok(())
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

/// Stick zone in the lower-left corner, inset enough to fit the ring.
fn stick_center(joystick: &Joystick, size: winit::dpi::PhysicalSize<u32>) -> Vec2 {
    let inset = joystick.max_radius() * 2.5;
    Vec2::new(inset, size.height as f32 - inset)
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    env_logger::init();

    let event_loop = EventLoop::new().unwrap();

    let window_attributes = Window::default_attributes()
        .with_title("Pine Hollow")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

    let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

    let mut state = pollster::block_on(State::new(window.clone()));

    event_loop
        .run(move |event, control_flow| {
            match event {
                WinitEvent::WindowEvent {
                    ref event,
                    window_id,
                } if window_id == window.id() => {
                    // egui gets first refusal so HUD buttons do not
                    // leak presses into the joystick.
                    let egui_consumed = state.hud.handle_window_event(&window, event).consumed;

                    match event {
                        WindowEvent::CloseRequested => control_flow.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    state: ElementState::Pressed,
                                    physical_key: PhysicalKey::Code(code),
                                    ..
                                },
                            ..
                        } => match code {
                            KeyCode::Escape => control_flow.exit(),
                            KeyCode::F3 => state.hud.toggle_stats(),
                            _ => {}
                        },
                        WindowEvent::Resized(physical_size) => {
                            state.resize(*physical_size);
                        }
                        WindowEvent::Touch(touch) => {
                            let at = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                            match touch.phase {
                                TouchPhase::Started if !egui_consumed => {
                                    state.joystick.press(touch.id, at);
                                }
                                TouchPhase::Started => {}
                                TouchPhase::Moved => state.joystick.drag(touch.id, at),
                                // Releases always reach the stick, even
                                // when egui claims the pointer, so the
                                // drag cannot get stuck on.
                                TouchPhase::Ended | TouchPhase::Cancelled => {
                                    state.joystick.release(touch.id)
                                }
                            }
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            state.last_cursor = Vec2::new(position.x as f32, position.y as f32);
                            state.joystick.drag(MOUSE_POINTER, state.last_cursor);
                        }
                        WindowEvent::MouseInput {
                            state: button_state,
                            button: MouseButton::Left,
                            ..
                        } => match button_state {
                            ElementState::Pressed if !egui_consumed => {
                                state.joystick.press(MOUSE_POINTER, state.last_cursor);
                            }
                            ElementState::Pressed => {}
                            ElementState::Released => state.joystick.release(MOUSE_POINTER),
                        },
                        WindowEvent::RedrawRequested => {
                            state.update();
                            match state.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                                Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                                Err(e) => log::warn!("surface error: {e:?}"),
                            }
                        }
                        _ => {}
                    }
                }
                WinitEvent::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .unwrap();
}
