use crate::model::NOT_APPLICABLE;
use super::{UiAction, UiContext};

const OPERATIONAL_STATES: [&str; 5] = [
    "operando",
    "não operando",
    "manutenção",
    "em falha",
    NOT_APPLICABLE,
];

/// Details of the focused equipment (first of the selection): attributes,
/// operational state / product editing, and the annotation editor.
pub fn draw_details_section(ui: &mut egui::Ui, ui_ctx: &mut UiContext) -> UiAction {
    let mut action = UiAction::None;

    ui.heading("Detalhes");

    let Some(tag) = ui_ctx.view.selected_tags.first() else {
        ui.label("Nenhum equipamento selecionado.");
        return action;
    };
    let Some(item) = ui_ctx.equipment.iter().find(|e| e.tag == *tag) else {
        // Selection can reference a tag the current dataset no longer has.
        ui.label(format!("{tag} não está no conjunto de dados atual."));
        return action;
    };

    egui::Grid::new("equipment_details").num_columns(2).show(ui, |ui| {
        ui.label("Tag:");
        ui.label(&item.tag);
        ui.end_row();
        ui.label("Nome:");
        ui.label(&item.name);
        ui.end_row();
        ui.label("Tipo:");
        ui.label(&item.kind);
        ui.end_row();
        ui.label("Sistema:");
        ui.label(&item.sistema);
        ui.end_row();
        ui.label("Área:");
        ui.label(&item.area);
        ui.end_row();
    });

    ui.add_space(4.0);
    egui::ComboBox::from_label("Estado")
        .selected_text(item.operational_state.clone())
        .show_ui(ui, |ui| {
            for state in OPERATIONAL_STATES {
                if ui
                    .selectable_label(item.operational_state == state, state)
                    .clicked()
                {
                    action = UiAction::SetOperationalState {
                        tag: item.tag.clone(),
                        state: state.to_string(),
                    };
                }
            }
        });

    ui.horizontal(|ui| {
        ui.label("Produto:");
        ui.text_edit_singleline(&mut *ui_ctx.product_draft);
        if ui.button("Aplicar").clicked() {
            action = UiAction::SetProduct {
                tag: item.tag.clone(),
                product: ui_ctx.product_draft.clone(),
            };
        }
    });

    ui.separator();
    ui.heading("Anotação");
    let existing = ui_ctx.view.annotation_for(&item.tag);
    if let Some(annotation) = existing {
        ui.small(format!(
            "Última edição: {}",
            annotation.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    ui.text_edit_multiline(&mut *ui_ctx.annotation_draft);
    ui.horizontal(|ui| {
        if ui.button("Salvar").clicked() && !ui_ctx.annotation_draft.trim().is_empty() {
            action = UiAction::SaveAnnotation {
                tag: item.tag.clone(),
                text: ui_ctx.annotation_draft.trim().to_string(),
            };
        }
        if existing.is_some() && ui.button("Excluir").clicked() {
            action = UiAction::DeleteAnnotation(item.tag.clone());
        }
    });

    action
}
