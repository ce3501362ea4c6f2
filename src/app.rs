use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::history::commands::{
    CAMERA_EPSILON, CameraMove, DeleteAnnotation, LayerVisibility, SaveAnnotation,
    SelectEquipment,
};
use crate::history::{Command, History};
use crate::input::InputState;
use crate::model::filter::{self, FilterState};
use crate::model::{CameraState, ColorMode, Equipment, ViewState, build_layers};
use crate::render::camera::frame_objects;
use crate::render::renderer::Renderer;
use crate::scene::{SceneObject, SceneSet, sync};
use crate::settings::Settings;
use crate::ui::{UiAction, UiContext};
use crate::util::picking::{Ray, pick_equipment};

/// Frames without wheel input after which a zoom burst counts as finished
/// and is committed to the history as one camera move.
const ZOOM_COMMIT_FRAMES: u8 = 30;

/// Top-level application state.
pub struct App {
    gpu: Option<GpuState>,
    input: InputState,
    settings: Settings,

    /// The equipment dataset — the data layer's source of truth. The
    /// interaction core never creates or destroys items, only reads them.
    equipment: Vec<Equipment>,
    filter: FilterState,
    color_mode: ColorMode,

    view: ViewState,
    history: History,
    scene: SceneSet,

    /// Set whenever data, filters, layers or the color mode changed;
    /// reconciliation runs before the next render, never per frame.
    needs_sync: bool,
    /// Sistema waiting to be framed; cleared once handled, found or not.
    pending_frame_sistema: Option<String>,
    /// True while an orbit/pan drag is in progress; the gesture is committed
    /// as a single command when it ends.
    camera_gesture_active: bool,
    zoom_commit_cooldown: u8,
    /// The live camera must re-adopt the committed pose (after undo/redo or
    /// framing).
    camera_resync: bool,

    pending_action: Option<UiAction>,
    quit_requested: bool,
    status_line: String,
    bg_color: [f32; 3],

    /// Panel drafts for the focused equipment.
    annotation_draft: String,
    product_draft: String,
    draft_tag: Option<String>,

    available_sistemas: Vec<String>,
    available_areas: Vec<String>,
    shown_count: usize,
}

/// Everything that requires the window to exist.
struct GpuState {
    window: Arc<Window>,
    renderer: Renderer,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl App {
    pub fn new(_event_loop: &winit::event_loop::EventLoop<()>) -> Self {
        let settings = Settings::load();
        let equipment = crate::io::default_equipment();
        let view = ViewState::new(build_layers(&equipment));
        let available_sistemas = filter::available_sistemas(&equipment);
        let available_areas = filter::available_areas(&equipment);
        let bg_color = settings.display.bg_color;

        Self {
            gpu: None,
            input: InputState::new(),
            settings,
            equipment,
            filter: FilterState::default(),
            color_mode: ColorMode::Equipamento,
            view,
            history: History::new(),
            scene: SceneSet::new(),
            needs_sync: true,
            pending_frame_sistema: None,
            camera_gesture_active: false,
            zoom_commit_cooldown: 0,
            camera_resync: true,
            pending_action: None,
            quit_requested: false,
            status_line: String::new(),
            bg_color,
            annotation_draft: String::new(),
            product_draft: String::new(),
            draft_tag: None,
            available_sistemas,
            available_areas,
            shown_count: 0,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("Plantview 3D")
            .with_inner_size(winit::dpi::LogicalSize::new(1280u32, 720u32));
        let window = Arc::new(event_loop.create_window(attrs).expect("failed to create window"));

        let mut renderer = pollster::block_on(Renderer::new(window.clone()));
        renderer.selection_color = self.settings.display.selection_color;
        renderer.hover_color = self.settings.display.hover_color;
        renderer.pin_color = self.settings.display.pin_color;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx,
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &renderer.device,
            renderer.surface_format,
            None,
            1,
            false,
        );

        self.gpu = Some(GpuState {
            window,
            renderer,
            egui_state,
            egui_renderer,
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(gpu) = &mut self.gpu else { return };

        // Let egui process the event first
        let egui_response = gpu.egui_state.on_window_event(&gpu.window, &event);
        let egui_consumed = egui_response.consumed;

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.renderer.resize(new_size.width, new_size.height);
                gpu.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }

        // Forward input events to our input system if egui didn't consume them
        if !egui_consumed {
            self.input.handle_event(&event);
        }

        if self.quit_requested {
            event_loop.exit();
            return;
        }

        // Always request redraw to keep the render loop going
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

impl App {
    fn process_input(&mut self) {
        let gesture_now;
        let live_camera;
        {
            let Some(gpu) = &mut self.gpu else { return };
            let cam = &mut gpu.renderer.camera;
            let cam_settings = &self.settings.camera;
            cam.fov_y = cam_settings.fov_degrees.to_radians();
            cam.near = cam_settings.near_plane;
            cam.far = cam_settings.far_plane;

            // Camera orbit (Space + left drag, or middle mouse drag)
            let orbiting = (self.input.space_held() && self.input.left_pressed)
                || (self.input.middle_pressed && !self.input.shift_held());
            // Camera pan (Space + right drag, or Shift + middle mouse drag)
            let panning = (self.input.space_held() && self.input.right_pressed)
                || (self.input.middle_pressed && self.input.shift_held());

            let invert_y = if cam_settings.invert_orbit_y { 1.0 } else { -1.0 };
            if orbiting {
                cam.orbit(
                    -self.input.mouse_delta.x * cam_settings.orbit_sensitivity,
                    invert_y * self.input.mouse_delta.y * cam_settings.orbit_sensitivity,
                );
            } else if panning {
                let pan_sens = cam_settings.pan_sensitivity * cam.distance;
                cam.pan(
                    -self.input.mouse_delta.x * pan_sens,
                    self.input.mouse_delta.y * pan_sens,
                );
            }

            // Camera zoom (scroll wheel)
            if self.input.scroll_delta != 0.0 {
                cam.zoom(self.input.scroll_delta * cam_settings.zoom_speed);
                self.zoom_commit_cooldown = ZOOM_COMMIT_FRAMES;
            }

            gesture_now = orbiting || panning;
            live_camera = cam.state();
        }

        // A finished gesture (or a settled zoom burst) becomes one undoable
        // camera move; intermediate frames never reach the history.
        if gesture_now {
            self.camera_gesture_active = true;
        } else {
            let drag_ended = std::mem::take(&mut self.camera_gesture_active);
            let zoom_settled = self.zoom_commit_cooldown > 0 && {
                self.zoom_commit_cooldown -= 1;
                self.zoom_commit_cooldown == 0
            };
            if drag_ended || zoom_settled {
                self.commit_camera(live_camera, "Câmera movimentada pelo usuário");
            }
        }

        // Undo/redo shortcuts
        if self.input.ctrl_held() && self.input.key_just_pressed(KeyCode::KeyZ) {
            self.pending_action = Some(if self.input.shift_held() {
                UiAction::Redo
            } else {
                UiAction::Undo
            });
        }
        if self.input.ctrl_held() && self.input.key_just_pressed(KeyCode::KeyY) {
            self.pending_action = Some(UiAction::Redo);
        }
        if self.input.key_just_pressed(KeyCode::Escape) {
            self.pending_action = Some(UiAction::ClearSelection);
        }

        // Selection click. Space is the camera modifier, so a plain left
        // click is unambiguous.
        if self.input.left_just_clicked && !self.input.space_held() {
            let multi = self.input.multi_select_held();
            let picked = self.pick_at(self.input.mouse_pos);
            if let Some(cmd) =
                SelectEquipment::from_click(&self.view, &self.equipment, picked.as_deref(), multi)
            {
                let desc = cmd.description().to_string();
                self.history.push(Box::new(cmd), &mut self.view);
                self.status_line = desc;
            }
        }

        // Hover polling: side-effect free, never recorded.
        self.view.hovered_tag = self.pick_at(self.input.mouse_pos);

        self.input.begin_frame();
    }

    /// Map a pointer position to the equipment tag beneath it, if any.
    /// Silently a no-op while the GPU surface is not ready.
    fn pick_at(&self, pos: Vec2) -> Option<String> {
        let gpu = self.gpu.as_ref()?;
        let size = Vec2::new(
            gpu.renderer.config.width as f32,
            gpu.renderer.config.height as f32,
        );
        if size.x < 1.0 || size.y < 1.0 {
            return None;
        }
        let ray = Ray::from_screen(pos, size, gpu.renderer.camera.view_projection());
        pick_equipment(&ray, &self.scene.objects).map(str::to_string)
    }

    fn commit_camera(&mut self, pose: CameraState, description: &str) {
        if let Some(cmd) = CameraMove::from_change(&self.view, pose, description) {
            let desc = cmd.description().to_string();
            self.history.push(Box::new(cmd), &mut self.view);
            self.status_line = desc;
        }
    }

    fn handle_action(&mut self, action: UiAction) {
        match action {
            UiAction::None => {}
            UiAction::Quit => {
                self.settings.display.bg_color = self.bg_color;
                self.settings.save();
                self.quit_requested = true;
            }
            UiAction::Undo => {
                if let Some(desc) = self.history.undo_description().map(str::to_string) {
                    self.history.undo(&mut self.view);
                    self.status_line = format!("Desfeito: {desc}");
                    self.needs_sync = true;
                    self.camera_resync = true;
                }
            }
            UiAction::Redo => {
                if let Some(desc) = self.history.redo_description().map(str::to_string) {
                    self.history.redo(&mut self.view);
                    self.status_line = format!("Refeito: {desc}");
                    self.needs_sync = true;
                    self.camera_resync = true;
                }
            }
            UiAction::OpenDataset => {
                let file = rfd::FileDialog::new()
                    .add_filter("Equipment dataset", &["json"])
                    .set_title("Open Equipment Dataset")
                    .pick_file();
                if let Some(path) = file {
                    match crate::io::load_equipment(&path) {
                        Ok(equipment) => self.adopt_dataset(equipment),
                        Err(e) => {
                            log::error!("{e}");
                            self.status_line = e;
                        }
                    }
                }
            }
            UiAction::LoadAnnotations => {
                let file = rfd::FileDialog::new()
                    .add_filter("Annotations", &["json"])
                    .set_title("Load Annotations")
                    .pick_file();
                if let Some(path) = file {
                    match crate::io::load_annotations(&path) {
                        Ok(annotations) => {
                            self.status_line =
                                format!("{} anotações carregadas.", annotations.len());
                            self.view.annotations = annotations;
                            self.draft_tag = None;
                        }
                        Err(e) => {
                            log::error!("{e}");
                            self.status_line = e;
                        }
                    }
                }
            }
            UiAction::SaveAnnotations => {
                let file = rfd::FileDialog::new()
                    .add_filter("Annotations", &["json"])
                    .set_title("Save Annotations")
                    .save_file();
                if let Some(path) = file {
                    match crate::io::save_annotations(&self.view.annotations, &path) {
                        Ok(()) => {
                            self.status_line =
                                format!("Anotações salvas em {}.", path.display());
                        }
                        Err(e) => {
                            log::error!("{e}");
                            self.status_line = e;
                        }
                    }
                }
            }
            UiAction::ToggleLayer(layer_id) => {
                if let Some(cmd) = LayerVisibility::toggle(&self.view, &layer_id) {
                    let desc = cmd.description().to_string();
                    self.history.push(Box::new(cmd), &mut self.view);
                    self.status_line = desc;
                    self.needs_sync = true;
                }
            }
            UiAction::FocusSistema(sistema) => {
                self.pending_frame_sistema = Some(sistema);
            }
            UiAction::ClearSelection => {
                if let Some(cmd) =
                    SelectEquipment::from_click(&self.view, &self.equipment, None, false)
                {
                    let desc = cmd.description().to_string();
                    self.history.push(Box::new(cmd), &mut self.view);
                    self.status_line = desc;
                }
            }
            UiAction::SetOperationalState { tag, state } => {
                if let Some(item) = self.equipment.iter_mut().find(|e| e.tag == tag) {
                    item.operational_state = state.clone();
                    self.status_line =
                        format!("Estado de {} alterado para {state}.", item.name);
                    self.needs_sync = true;
                }
            }
            UiAction::SetProduct { tag, product } => {
                if let Some(item) = self.equipment.iter_mut().find(|e| e.tag == tag) {
                    item.product = product.clone();
                    self.status_line =
                        format!("Produto de {} alterado para {product}.", item.name);
                    self.needs_sync = true;
                }
            }
            UiAction::SaveAnnotation { tag, text } => {
                let cmd = SaveAnnotation::new(&self.view, &self.equipment, &tag, text);
                let desc = cmd.description().to_string();
                self.history.push(Box::new(cmd), &mut self.view);
                self.status_line = desc;
            }
            UiAction::DeleteAnnotation(tag) => {
                if let Some(cmd) = DeleteAnnotation::new(&self.view, &self.equipment, &tag) {
                    let desc = cmd.description().to_string();
                    self.history.push(Box::new(cmd), &mut self.view);
                    self.status_line = desc;
                    self.annotation_draft.clear();
                }
            }
        }
    }

    /// Swap in a freshly loaded dataset. Layers are rebuilt from its kinds;
    /// selection and history refer to the old data and are reset.
    fn adopt_dataset(&mut self, equipment: Vec<Equipment>) {
        self.status_line = format!("{} equipamentos carregados.", equipment.len());
        self.available_sistemas = filter::available_sistemas(&equipment);
        self.available_areas = filter::available_areas(&equipment);

        let camera = self.view.camera;
        self.view = ViewState::new(build_layers(&equipment));
        self.view.camera = camera;
        self.equipment = equipment;
        self.history = History::new();
        self.filter = FilterState::default();
        self.draft_tag = None;
        self.needs_sync = true;
    }

    /// Run reconciliation against the filtered dataset and upload fresh
    /// meshes. Called only when something relevant changed.
    fn sync_scene(&mut self) {
        let filtered = filter::apply(&self.equipment, &self.filter);
        self.shown_count = filtered.len();
        sync::reconcile(&mut self.scene, &filtered, &self.view.layers, self.color_mode);
        if let Some(gpu) = &self.gpu {
            self.scene.upload_missing(&gpu.renderer.device);
        }

        // Hover may reference an object reconciliation just removed.
        if let Some(tag) = &self.view.hovered_tag
            && self.scene.object_by_tag(tag).is_none()
        {
            self.view.hovered_tag = None;
        }
    }

    /// Frame the pending sistema: batch-select its members and move the
    /// camera through the regular command path. Completion is signaled by
    /// clearing the request, whether or not anything matched.
    fn process_framing(&mut self) {
        let Some(sistema) = self.pending_frame_sistema.take() else { return };
        let Some(gpu) = &self.gpu else { return };

        let objects: Vec<&SceneObject> = self
            .scene
            .objects
            .iter()
            .filter(|o| o.sistema == sistema && o.visible)
            .collect();
        if objects.is_empty() {
            log::warn!("no visible objects to frame for sistema {sistema}");
            self.status_line = format!("Nenhum equipamento visível no sistema {sistema}.");
            return;
        }

        let tags: Vec<String> = objects.iter().map(|o| o.tag.clone()).collect();
        let pose = frame_objects(&objects, &gpu.renderer.camera);

        let batch_desc = format!(
            "Sistema {sistema} em foco: {} equipamento(s) selecionado(s).",
            tags.len()
        );
        if let Some(cmd) = SelectEquipment::from_batch(&self.view, &tags, Some(batch_desc)) {
            let desc = cmd.description().to_string();
            self.history.push(Box::new(cmd), &mut self.view);
            self.status_line = desc;
        }

        if let Some(pose) = pose
            && let Some(cmd) = CameraMove::from_change(
                &self.view,
                pose,
                format!("Câmera enquadrou o sistema {sistema}."),
            )
        {
            self.history.push(Box::new(cmd), &mut self.view);
            self.camera_resync = true;
        }
    }

    /// Re-adopt the committed camera pose after undo/redo or framing. User
    /// input does not reach the camera during this assignment — the gesture
    /// path only reads input in `process_input`.
    fn apply_camera_resync(&mut self) {
        if !std::mem::take(&mut self.camera_resync) {
            return;
        }
        let target = self.view.camera;
        if let Some(gpu) = &mut self.gpu
            && !gpu.renderer.camera.state().approx_eq(&target, CAMERA_EPSILON)
        {
            gpu.renderer.camera.apply_state(&target);
        }
    }

    /// Keep the details-panel drafts following the focused equipment.
    fn refresh_drafts(&mut self) {
        let focus = self.view.selected_tags.first().cloned();
        if focus == self.draft_tag {
            return;
        }
        self.draft_tag = focus.clone();
        self.annotation_draft = focus
            .as_deref()
            .and_then(|t| self.view.annotation_for(t))
            .map(|a| a.text.clone())
            .unwrap_or_default();
        self.product_draft = focus
            .as_deref()
            .and_then(|t| self.equipment.iter().find(|e| e.tag == *t))
            .map(|e| e.product.clone())
            .unwrap_or_default();
    }

    fn redraw(&mut self) {
        self.process_input();
        self.refresh_drafts();

        let Some(gpu) = &mut self.gpu else { return };

        let output = match gpu.renderer.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = gpu.window.inner_size();
                gpu.renderer.resize(size.width, size.height);
                return;
            }
            Err(e) => {
                log::error!("surface error: {e}");
                return;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Run egui
        let raw_input = gpu.egui_state.take_egui_input(&gpu.window);
        let egui_ctx = gpu.egui_state.egui_ctx().clone();
        let filter_before = self.filter.clone();
        let color_mode_before = self.color_mode;
        let mut ui_action = UiAction::None;
        let full_output = egui_ctx.run(raw_input, |ctx| {
            let mut ui_ctx = UiContext {
                view: &self.view,
                equipment: &self.equipment,
                history: &self.history,
                filter: &mut self.filter,
                color_mode: &mut self.color_mode,
                bg_color: &mut self.bg_color,
                available_sistemas: &self.available_sistemas,
                available_areas: &self.available_areas,
                annotation_draft: &mut self.annotation_draft,
                product_draft: &mut self.product_draft,
                shown_count: self.shown_count,
                status_line: &self.status_line,
            };
            ui_action = crate::ui::draw_ui(ctx, &mut ui_ctx);
        });

        gpu.egui_state.handle_platform_output(&gpu.window, full_output.platform_output);

        // Filter and color-mode edits bypass the history; they only mark the
        // scene stale.
        if filter_before != self.filter || color_mode_before != self.color_mode {
            self.needs_sync = true;
        }

        // Keyboard-triggered action takes precedence over the UI action
        let action = match self.pending_action.take() {
            Some(pending) => pending,
            None => ui_action,
        };
        self.handle_action(action);

        if std::mem::take(&mut self.needs_sync) {
            self.sync_scene();
        }
        self.process_framing();
        self.apply_camera_resync();

        let Some(gpu) = &mut self.gpu else { return };
        gpu.renderer.prepare_frame();

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.renderer.config.width, gpu.renderer.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        // Update egui textures
        for (id, delta) in &full_output.textures_delta.set {
            gpu.egui_renderer.update_texture(&gpu.renderer.device, &gpu.renderer.queue, *id, delta);
        }

        // Main 3D render pass
        {
            let mut encoder = gpu.renderer.device.create_command_encoder(
                &wgpu::CommandEncoderDescriptor { label: Some("scene_encoder") },
            );
            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("main_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: self.bg_color[0] as f64,
                                g: self.bg_color[1] as f64,
                                b: self.bg_color[2] as f64,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &gpu.renderer.depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                });

                gpu.renderer.render_scene(&mut pass, &self.scene);
                if self.view.annotations_visible() {
                    gpu.renderer.render_annotation_pins(
                        &mut pass,
                        &self.scene,
                        &self.view.annotations,
                    );
                }
                gpu.renderer.render_highlights(
                    &mut pass,
                    &self.scene,
                    &self.view.selected_tags,
                    self.view.hovered_tag.as_deref(),
                );
            }
            gpu.renderer.queue.submit(std::iter::once(encoder.finish()));
        }

        // Egui render pass (separate encoder so egui owns the pass)
        {
            let mut encoder = gpu.renderer.device.create_command_encoder(
                &wgpu::CommandEncoderDescriptor { label: Some("egui_encoder") },
            );

            gpu.egui_renderer.update_buffers(
                &gpu.renderer.device,
                &gpu.renderer.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );

            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
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
                });
                // SAFETY: The render pass is dropped before encoder.finish() is called.
                let pass_static: &mut wgpu::RenderPass<'static> =
                    unsafe { std::mem::transmute(&mut pass) };
                gpu.egui_renderer.render(pass_static, &paint_jobs, &screen_descriptor);
            }

            gpu.renderer.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();

        // Free egui textures
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }
    }
}
