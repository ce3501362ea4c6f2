use crate::model::ViewState;
use super::UiAction;

/// Layer visibility checkboxes. Toggles are reported as actions so the app
/// can route them through the command history instead of flipping the flag
/// in place.
pub fn draw_layers_section(ui: &mut egui::Ui, view: &ViewState) -> UiAction {
    let mut action = UiAction::None;

    ui.heading("Camadas");
    for layer in &view.layers {
        let mut visible = layer.visible;
        if ui.checkbox(&mut visible, &layer.name).changed() {
            action = UiAction::ToggleLayer(layer.id.clone());
        }
    }

    action
}
