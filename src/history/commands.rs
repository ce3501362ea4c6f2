use chrono::Utc;

use crate::history::{Command, CommandKind};
use crate::model::{Annotation, CameraState, Equipment, ViewState};

/// Epsilon for suppressing camera-move commands, in world units.
pub const CAMERA_EPSILON: f32 = 0.01;

fn sorted(tags: &[String]) -> Vec<&str> {
    let mut v: Vec<&str> = tags.iter().map(String::as_str).collect();
    v.sort_unstable();
    v
}

/// Order-independent equality of two tag lists.
fn same_tag_set(a: &[String], b: &[String]) -> bool {
    sorted(a) == sorted(b)
}

fn equipment_name<'a>(equipment: &'a [Equipment], tag: &'a str) -> &'a str {
    equipment
        .iter()
        .find(|e| e.tag == tag)
        .map(|e| e.name.as_str())
        .unwrap_or(tag)
}

/// Replace the equipment selection (undoable). Captures the full before/after
/// tag lists; the constructors return `None` for no-op transitions so that
/// trivial clicks never pollute the history.
pub struct SelectEquipment {
    before: Vec<String>,
    after: Vec<String>,
    description: String,
}

impl SelectEquipment {
    /// Selection change for a scene click on `tag` (or empty space), with or
    /// without the multi-select modifier.
    pub fn from_click(
        state: &ViewState,
        equipment: &[Equipment],
        tag: Option<&str>,
        multi: bool,
    ) -> Option<Self> {
        let before = state.selected_tags.clone();

        let (after, description) = match (tag, multi) {
            (Some(tag), true) => {
                let name = equipment_name(equipment, tag);
                if state.is_selected(tag) {
                    let after: Vec<String> =
                        before.iter().filter(|t| *t != tag).cloned().collect();
                    let description = format!("Equipamento {name} removido da seleção.");
                    (after, description)
                } else {
                    let mut after = before.clone();
                    after.push(tag.to_string());
                    let description = format!(
                        "Equipamento {name} adicionado à seleção. {} itens selecionados.",
                        after.len()
                    );
                    (after, description)
                }
            }
            (Some(tag), false) => {
                let name = equipment_name(equipment, tag);
                (vec![tag.to_string()], format!("{name} selecionado."))
            }
            // Clicking empty space with the modifier held changes nothing.
            (None, true) => return None,
            (None, false) => (Vec::new(), "Seleção limpa.".to_string()),
        };

        if same_tag_set(&before, &after) {
            return None;
        }
        Some(Self { before, after, description })
    }

    /// Programmatic batch selection (e.g. "select everything in the framed
    /// system"). Incoming tags are deduplicated and sorted.
    pub fn from_batch(
        state: &ViewState,
        tags: &[String],
        description: Option<String>,
    ) -> Option<Self> {
        let mut after: Vec<String> = tags.to_vec();
        after.sort_unstable();
        after.dedup();

        let before = state.selected_tags.clone();
        if same_tag_set(&before, &after) {
            return None;
        }

        let description = description.unwrap_or_else(|| {
            format!("Selecionados {} equipamentos em lote.", after.len())
        });
        Some(Self { before, after, description })
    }
}

impl Command for SelectEquipment {
    fn kind(&self) -> CommandKind {
        CommandKind::Selection
    }

    fn apply(&mut self, state: &mut ViewState) {
        state.selected_tags = self.after.clone();
    }

    fn undo(&mut self, state: &mut ViewState) {
        state.selected_tags = self.before.clone();
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Toggle one layer's visibility (undoable).
pub struct LayerVisibility {
    layer_id: String,
    before: bool,
    after: bool,
    description: String,
}

impl LayerVisibility {
    /// `None` (with a diagnostic) when no layer carries the given id.
    pub fn toggle(state: &ViewState, layer_id: &str) -> Option<Self> {
        let Some(layer) = state.layer_by_id(layer_id) else {
            log::warn!("toggle requested for unknown layer id: {layer_id}");
            return None;
        };

        let after = !layer.visible;
        let status = if after { "ativada" } else { "desativada" };
        Some(Self {
            layer_id: layer_id.to_string(),
            before: layer.visible,
            after,
            description: format!("Visibilidade da camada \"{}\" {status}.", layer.name),
        })
    }

    fn set(&self, state: &mut ViewState, visible: bool) {
        // A vanished layer is tolerated: layers are never deleted at runtime,
        // but a stale command must not fault.
        if let Some(layer) = state.layers.iter_mut().find(|l| l.id == self.layer_id) {
            layer.visible = visible;
        }
    }
}

impl Command for LayerVisibility {
    fn kind(&self) -> CommandKind {
        CommandKind::LayerVisibility
    }

    fn apply(&mut self, state: &mut ViewState) {
        self.set(state, self.after);
    }

    fn undo(&mut self, state: &mut ViewState) {
        self.set(state, self.before);
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Move the committed camera pose (undoable). One command per completed user
/// gesture or framing request, never per frame.
pub struct CameraMove {
    before: CameraState,
    after: CameraState,
    description: String,
}

impl CameraMove {
    /// `None` when the new pose is within [`CAMERA_EPSILON`] of the committed
    /// one, so trivial jitter never reaches the history.
    pub fn from_change(
        state: &ViewState,
        after: CameraState,
        description: impl Into<String>,
    ) -> Option<Self> {
        if state.camera.approx_eq(&after, CAMERA_EPSILON) {
            return None;
        }
        Some(Self {
            before: state.camera,
            after,
            description: description.into(),
        })
    }
}

impl Command for CameraMove {
    fn kind(&self) -> CommandKind {
        CommandKind::CameraMove
    }

    fn apply(&mut self, state: &mut ViewState) {
        state.camera = self.after;
    }

    fn undo(&mut self, state: &mut ViewState) {
        state.camera = self.before;
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Create or replace the annotation of one equipment item (undoable).
pub struct SaveAnnotation {
    tag: String,
    before: Option<Annotation>,
    after: Annotation,
    description: String,
}

impl SaveAnnotation {
    pub fn new(state: &ViewState, equipment: &[Equipment], tag: &str, text: String) -> Self {
        let name = equipment_name(equipment, tag);
        let before = state.annotation_for(tag).cloned();
        let description = if before.is_some() {
            format!("Anotação para {name} atualizada.")
        } else {
            format!("Anotação para {name} adicionada.")
        };
        Self {
            tag: tag.to_string(),
            before,
            after: Annotation {
                equipment_tag: tag.to_string(),
                text,
                created_at: Utc::now(),
            },
            description,
        }
    }
}

impl Command for SaveAnnotation {
    fn kind(&self) -> CommandKind {
        CommandKind::Annotation
    }

    fn apply(&mut self, state: &mut ViewState) {
        state.annotations.retain(|a| a.equipment_tag != self.tag);
        state.annotations.push(self.after.clone());
    }

    fn undo(&mut self, state: &mut ViewState) {
        state.annotations.retain(|a| a.equipment_tag != self.tag);
        if let Some(previous) = &self.before {
            state.annotations.push(previous.clone());
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Delete the annotation of one equipment item (undoable).
pub struct DeleteAnnotation {
    tag: String,
    before: Annotation,
    description: String,
}

impl DeleteAnnotation {
    /// `None` when the item carries no annotation.
    pub fn new(state: &ViewState, equipment: &[Equipment], tag: &str) -> Option<Self> {
        let before = state.annotation_for(tag)?.clone();
        let name = equipment_name(equipment, tag);
        Some(Self {
            tag: tag.to_string(),
            before,
            description: format!("Anotação para {name} excluída."),
        })
    }
}

impl Command for DeleteAnnotation {
    fn kind(&self) -> CommandKind {
        CommandKind::Annotation
    }

    fn apply(&mut self, state: &mut ViewState) {
        state.annotations.retain(|a| a.equipment_tag != self.tag);
    }

    fn undo(&mut self, state: &mut ViewState) {
        state.annotations.retain(|a| a.equipment_tag != self.tag);
        state.annotations.push(self.before.clone());
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::model::{NOT_APPLICABLE, build_layers};
    use glam::Vec3;

    fn item(tag: &str) -> Equipment {
        Equipment {
            tag: tag.to_string(),
            name: format!("Name {tag}"),
            kind: "Tank".to_string(),
            sistema: "GA".to_string(),
            area: "Área 31".to_string(),
            position: Vec3::ZERO,
            rotation: None,
            color: [0.5, 0.5, 0.5],
            size: None,
            product: NOT_APPLICABLE.to_string(),
            operational_state: NOT_APPLICABLE.to_string(),
        }
    }

    fn fixture() -> (ViewState, Vec<Equipment>) {
        let equipment = vec![item("A"), item("B")];
        let state = ViewState::new(build_layers(&equipment));
        (state, equipment)
    }

    fn click(
        state: &mut ViewState,
        history: &mut History,
        equipment: &[Equipment],
        tag: Option<&str>,
        multi: bool,
    ) -> bool {
        match SelectEquipment::from_click(state, equipment, tag, multi) {
            Some(cmd) => {
                history.push(Box::new(cmd), state);
                true
            }
            None => false,
        }
    }

    #[test]
    fn click_selects_single_tag() {
        let (mut state, equipment) = fixture();
        let mut history = History::new();

        assert!(click(&mut state, &mut history, &equipment, Some("A"), false));
        assert_eq!(state.selected_tags, vec!["A"]);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn reclick_on_sole_selection_records_nothing() {
        let (mut state, equipment) = fixture();
        let mut history = History::new();
        click(&mut state, &mut history, &equipment, Some("A"), false);

        assert!(!click(&mut state, &mut history, &equipment, Some("A"), false));
        assert_eq!(state.selected_tags, vec!["A"]);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn multi_click_adds_then_removes() {
        let (mut state, equipment) = fixture();
        let mut history = History::new();
        click(&mut state, &mut history, &equipment, Some("A"), false);

        assert!(click(&mut state, &mut history, &equipment, Some("B"), true));
        assert_eq!(state.selected_tags, vec!["A", "B"]);

        assert!(click(&mut state, &mut history, &equipment, Some("A"), true));
        assert_eq!(state.selected_tags, vec!["B"]);
    }

    #[test]
    fn empty_click_clears_and_records_once() {
        let (mut state, equipment) = fixture();
        let mut history = History::new();
        click(&mut state, &mut history, &equipment, Some("A"), false);

        assert!(click(&mut state, &mut history, &equipment, None, false));
        assert!(state.selected_tags.is_empty());
        assert_eq!(history.undo_description(), Some("Seleção limpa."));

        // Clearing an already empty selection is a no-op.
        assert!(!click(&mut state, &mut history, &equipment, None, false));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn empty_click_with_modifier_changes_nothing() {
        let (mut state, equipment) = fixture();
        let mut history = History::new();
        click(&mut state, &mut history, &equipment, Some("A"), false);

        assert!(!click(&mut state, &mut history, &equipment, None, true));
        assert_eq!(state.selected_tags, vec!["A"]);
    }

    #[test]
    fn single_click_replaces_multi_selection() {
        let (mut state, equipment) = fixture();
        let mut history = History::new();
        click(&mut state, &mut history, &equipment, Some("A"), false);
        click(&mut state, &mut history, &equipment, Some("B"), true);

        assert!(click(&mut state, &mut history, &equipment, Some("A"), false));
        assert_eq!(state.selected_tags, vec!["A"]);
    }

    #[test]
    fn batch_select_suppresses_equal_sets() {
        let (mut state, _equipment) = fixture();
        let mut history = History::new();

        let tags = vec!["B".to_string(), "A".to_string(), "A".to_string()];
        let cmd = SelectEquipment::from_batch(&state, &tags, None).expect("changes selection");
        history.push(Box::new(cmd), &mut state);
        assert_eq!(state.selected_tags, vec!["A", "B"]);

        // Same set in a different order: no command.
        let again = vec!["A".to_string(), "B".to_string()];
        assert!(SelectEquipment::from_batch(&state, &again, None).is_none());
    }

    #[test]
    fn layer_toggle_roundtrip() {
        let (mut state, _equipment) = fixture();
        let mut history = History::new();

        let id = state.layers[0].id.clone();
        let cmd = LayerVisibility::toggle(&state, &id).expect("layer exists");
        history.push(Box::new(cmd), &mut state);
        assert!(!state.layers[0].visible);

        history.undo(&mut state);
        assert!(state.layers[0].visible);
    }

    #[test]
    fn layer_toggle_unknown_id_is_none() {
        let (state, _equipment) = fixture();
        assert!(LayerVisibility::toggle(&state, "layer-nonexistent").is_none());
    }

    #[test]
    fn camera_move_suppressed_within_epsilon() {
        let (state, _equipment) = fixture();
        let mut nudged = state.camera;
        nudged.position.x += CAMERA_EPSILON * 0.5;
        assert!(CameraMove::from_change(&state, nudged, "orbit").is_none());

        nudged.position.x += 1.0;
        assert!(CameraMove::from_change(&state, nudged, "orbit").is_some());
    }

    #[test]
    fn camera_move_undo_restores_pose() {
        let (mut state, _equipment) = fixture();
        let mut history = History::new();
        let original = state.camera;

        let mut moved = original;
        moved.position = Vec3::new(5.0, 5.0, 5.0);
        moved.look_at = Vec3::ZERO;
        let cmd = CameraMove::from_change(&state, moved, "orbit").expect("real move");
        history.push(Box::new(cmd), &mut state);
        assert_eq!(state.camera, moved);

        history.undo(&mut state);
        assert_eq!(state.camera, original);
    }

    #[test]
    fn annotation_save_update_delete_roundtrip() {
        let (mut state, equipment) = fixture();
        let mut history = History::new();

        let cmd = SaveAnnotation::new(&state, &equipment, "A", "verificar vazamento".to_string());
        history.push(Box::new(cmd), &mut state);
        assert_eq!(state.annotation_for("A").unwrap().text, "verificar vazamento");

        let cmd = SaveAnnotation::new(&state, &equipment, "A", "ok".to_string());
        history.push(Box::new(cmd), &mut state);
        assert_eq!(state.annotation_for("A").unwrap().text, "ok");
        assert_eq!(state.annotations.len(), 1);

        let cmd = DeleteAnnotation::new(&state, &equipment, "A").expect("annotation exists");
        history.push(Box::new(cmd), &mut state);
        assert!(state.annotation_for("A").is_none());

        history.undo(&mut state);
        assert_eq!(state.annotation_for("A").unwrap().text, "ok");
        history.undo(&mut state);
        assert_eq!(state.annotation_for("A").unwrap().text, "verificar vazamento");

        // Deleting a never-annotated item is a no-op, not a command.
        assert!(DeleteAnnotation::new(&state, &equipment, "B").is_none());
    }
}
