use crate::model::filter::ALL;
use super::{UiAction, UiContext};

/// Search, sistema/area filters and the sistema focus list (left panel).
/// Filter edits mutate FilterState directly — they are not undoable — while
/// focusing a sistema is reported as an action so the app can frame and
/// batch-select through the command history.
pub fn draw_filter_panel(ctx: &egui::Context, ui_ctx: &mut UiContext) -> UiAction {
    let mut action = UiAction::None;

    egui::SidePanel::left("filter_panel")
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.heading("Filtros");

            ui.horizontal(|ui| {
                ui.label("Buscar:");
                ui.text_edit_singleline(&mut ui_ctx.filter.search);
            });

            egui::ComboBox::from_label("Sistema")
                .selected_text(ui_ctx.filter.sistema.clone())
                .show_ui(ui, |ui| {
                    for sistema in ui_ctx.available_sistemas {
                        ui.selectable_value(
                            &mut ui_ctx.filter.sistema,
                            sistema.clone(),
                            sistema,
                        );
                    }
                });

            egui::ComboBox::from_label("Área")
                .selected_text(ui_ctx.filter.area.clone())
                .show_ui(ui, |ui| {
                    for area in ui_ctx.available_areas {
                        ui.selectable_value(&mut ui_ctx.filter.area, area.clone(), area);
                    }
                });

            ui.separator();
            ui.heading("Sistemas");
            for sistema in ui_ctx.available_sistemas.iter().filter(|s| *s != ALL) {
                ui.horizontal(|ui| {
                    ui.label(sistema);
                    if ui.small_button("Focar").clicked() {
                        action = UiAction::FocusSistema(sistema.clone());
                    }
                });
            }
        });

    action
}
