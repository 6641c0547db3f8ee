use egui::epaint::Shadow;

/// Per-frame numbers for the F3 stats panel.
pub struct HudStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub entity_count: usize,
    pub draw_calls: u32,
    pub resolution: (u32, u32),
}

/// Everything the HUD draws this frame, already in egui screen points.
pub struct HudFrame<'a> {
    /// Enemy count + 1, fixed for the whole session.
    pub alive: usize,
    /// Name of the current weapon skin.
    pub weapon: &'a str,
    /// Joystick zone center.
    pub stick_center: egui::Pos2,
    /// Clamped stick deflection from the center.
    pub stick_offset: egui::Vec2,
    /// Maximum deflection radius.
    pub stick_radius: f32,
    /// F3 stats panel contents (`None` = hidden).
    pub stats: Option<HudStats>,
}

/// What the player clicked this frame.
#[derive(Default)]
pub struct HudResponse {
    pub cycle_clicked: bool,
}

pub struct Hud {
    pub stats_visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Hud {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, semi-transparent, small monospace white font
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            stats_visible: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle_stats(&mut self) {
        self.stats_visible = !self.stats_visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Render one egui frame: alive counter, weapon card + swap
    /// button, joystick indicator, and the optional F3 stats panel.
    /// Returns which controls were activated so the caller can react.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        frame: &HudFrame,
    ) -> HudResponse {
        let mut response = HudResponse::default();
        let raw_input = self.egui_state.take_egui_input(window);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let screen = ctx.screen_rect();

            // ── Alive counter, top center ─────────────────────────────────────
            egui::Area::new(egui::Id::new("alive_counter"))
                .fixed_pos(egui::pos2(screen.center().x - 40.0, 10.0))
                .show(ctx, |ui| {
                    hud_frame_style().show(ui, |ui: &mut egui::Ui| {
                        ui.label(
                            egui::RichText::new(format!("ALIVE  {}", frame.alive)).size(18.0),
                        );
                    });
                });

            // ── Weapon card + skin swap, bottom right ─────────────────────────
            egui::Area::new(egui::Id::new("weapon_card"))
                .fixed_pos(egui::pos2(screen.max.x - 170.0, screen.max.y - 90.0))
                .show(ctx, |ui| {
                    hud_frame_style().show(ui, |ui: &mut egui::Ui| {
                        ui.label(egui::RichText::new(frame.weapon).size(16.0));
                        if ui.button("Swap skin").clicked() {
                            response.cycle_clicked = true;
                        }
                    });
                });

            // ── Joystick base ring + stick dot ────────────────────────────────
            let painter = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Background,
                egui::Id::new("joystick_indicator"),
            ));
            painter.circle_stroke(
                frame.stick_center,
                frame.stick_radius,
                egui::Stroke::new(2.0, egui::Color32::from_rgba_unmultiplied(255, 255, 255, 90)),
            );
            painter.circle_filled(
                frame.stick_center + frame.stick_offset,
                frame.stick_radius * 0.45,
                egui::Color32::from_rgba_unmultiplied(255, 255, 255, 150),
            );

            // ── F3: stats panel ──────────────────────────────────────────────
            if let Some(stats) = &frame.stats {
                egui::Area::new(egui::Id::new("stats_panel"))
                    .fixed_pos(egui::pos2(10.0, 10.0))
                    .show(ctx, |ui| {
                        hud_frame_style().show(ui, |ui: &mut egui::Ui| {
                            ui.label(format!("FPS: {}", stats.fps));
                            ui.label(format!("Frame: {:.2} ms", stats.frame_time_avg_ms));
                            ui.label(format!("Entities: {}", stats.entity_count));
                            ui.label(format!("Draw calls: {}", stats.draw_calls));
                            ui.label(format!(
                                "Resolution: {} x {}",
                                stats.resolution.0, stats.resolution.1
                            ));
                        });
                    });
            }
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        response
    }
}

fn hud_frame_style() -> egui::Frame {
    egui::Frame::none()
        .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
        .inner_margin(egui::Margin::same(8.0))
        .rounding(4.0)
}
