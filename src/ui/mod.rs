mod details_panel;
mod filter_panel;
mod layers_panel;

use crate::history::History;
use crate::model::filter::FilterState;
use crate::model::{ColorMode, Equipment, ViewState};

/// Actions the UI wants the app to execute (can't borrow mutably inside egui
/// closures). State changes that must be undoable travel as actions and are
/// turned into commands by the app; the UI never mutates ViewState.
pub enum UiAction {
    None,
    Quit,
    Undo,
    Redo,
    OpenDataset,
    LoadAnnotations,
    SaveAnnotations,
    ToggleLayer(String),
    FocusSistema(String),
    ClearSelection,
    SetOperationalState { tag: String, state: String },
    SetProduct { tag: String, product: String },
    SaveAnnotation { tag: String, text: String },
    DeleteAnnotation(String),
}

/// Everything the panels need to read or edit this frame.
pub struct UiContext<'a> {
    pub view: &'a ViewState,
    pub equipment: &'a [Equipment],
    pub history: &'a History,
    pub filter: &'a mut FilterState,
    pub color_mode: &'a mut ColorMode,
    pub bg_color: &'a mut [f32; 3],
    pub available_sistemas: &'a [String],
    pub available_areas: &'a [String],
    /// Annotation text being edited for the focused equipment.
    pub annotation_draft: &'a mut String,
    pub product_draft: &'a mut String,
    /// Equipment count after filtering / total.
    pub shown_count: usize,
    /// Last executed command description, shown in the status bar.
    pub status_line: &'a str,
}

/// Draw all egui UI panels. Called each frame within the egui context.
pub fn draw_ui(ctx: &egui::Context, ui_ctx: &mut UiContext) -> UiAction {
    let mut action = UiAction::None;

    // Menu bar
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Dataset...").clicked() {
                    action = UiAction::OpenDataset;
                    ui.close();
                }
                ui.separator();
                if ui.button("Load Annotations...").clicked() {
                    action = UiAction::LoadAnnotations;
                    ui.close();
                }
                if ui.button("Save Annotations...").clicked() {
                    action = UiAction::SaveAnnotations;
                    ui.close();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    action = UiAction::Quit;
                    ui.close();
                }
            });
            ui.menu_button("Edit", |ui| {
                let undo_label = match ui_ctx.history.undo_description() {
                    Some(desc) => format!("Undo: {desc}  Ctrl+Z"),
                    None => "Undo  Ctrl+Z".to_string(),
                };
                if ui
                    .add_enabled(ui_ctx.history.can_undo(), egui::Button::new(undo_label))
                    .clicked()
                {
                    action = UiAction::Undo;
                    ui.close();
                }
                let redo_label = match ui_ctx.history.redo_description() {
                    Some(desc) => format!("Redo: {desc}  Ctrl+Y"),
                    None => "Redo  Ctrl+Y".to_string(),
                };
                if ui
                    .add_enabled(ui_ctx.history.can_redo(), egui::Button::new(redo_label))
                    .clicked()
                {
                    action = UiAction::Redo;
                    ui.close();
                }
                ui.separator();
                if ui.button("Clear Selection  Esc").clicked() {
                    action = UiAction::ClearSelection;
                    ui.close();
                }
            });
            ui.menu_button("View", |ui| {
                ui.label("Color mode:");
                for mode in ColorMode::ALL {
                    if ui
                        .selectable_label(*ui_ctx.color_mode == mode, mode.label())
                        .clicked()
                    {
                        *ui_ctx.color_mode = mode;
                        ui.close();
                    }
                }
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label("Background:");
                    ui.color_edit_button_rgb(ui_ctx.bg_color);
                });
            });
        });
    });

    // Filters + sistema focus (left)
    let filter_action = filter_panel::draw_filter_panel(ctx, ui_ctx);
    if !matches!(filter_action, UiAction::None) {
        action = filter_action;
    }

    // Layers + equipment details (right)
    egui::SidePanel::right("inspector_panel")
        .default_width(260.0)
        .show(ctx, |ui| {
            let layer_action = layers_panel::draw_layers_section(ui, ui_ctx.view);
            if !matches!(layer_action, UiAction::None) {
                action = layer_action;
            }

            ui.separator();
            let details_action = details_panel::draw_details_section(ui, ui_ctx);
            if !matches!(details_action, UiAction::None) {
                action = details_action;
            }
        });

    // Status bar
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(format!(
                "Equipamentos: {}/{}",
                ui_ctx.shown_count,
                ui_ctx.equipment.len()
            ));
            ui.separator();
            let selected = ui_ctx.view.selected_tags.len();
            if selected > 0 {
                ui.label(format!("Selecionados: {selected}"));
                ui.separator();
            }
            if let Some(tag) = &ui_ctx.view.hovered_tag {
                ui.label(format!("Sob o cursor: {tag}"));
                ui.separator();
            }
            if ui_ctx.history.len() > 0 {
                ui.label(format!("Histórico: {}", ui_ctx.history.len()));
                ui.separator();
            }
            if !ui_ctx.status_line.is_empty() {
                ui.label(ui_ctx.status_line);
            }
        });
    });

    action
}
