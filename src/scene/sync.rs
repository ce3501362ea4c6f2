use std::collections::{HashMap, HashSet};

use crate::model::{ColorMode, Equipment, Layer, TERRAIN_LAYER_ID, layer_visible_for};
use super::{SceneObject, SceneSet, factory};

/// Synchronize the owned object set with the (already filtered) equipment
/// data and the layer configuration.
///
/// Every visible item is rebuilt wholesale through the factory — no partial
/// mutation — so the rendered object can never drift from what the factory
/// would produce for the current data and color mode. This runs only when
/// data, filters, layers or the color mode change, never per frame.
///
/// Afterwards the set holds exactly one object per (tag, visible-layer) pair;
/// dropped objects release their GPU buffers with them. Items whose kind has
/// no matching layer are treated as visible on both the remove and the create
/// path (fail-open).
pub fn reconcile(
    scene: &mut SceneSet,
    equipment: &[&Equipment],
    layers: &[Layer],
    color_mode: ColorMode,
) {
    let tags_in_data: HashSet<&str> = equipment.iter().map(|e| e.tag.as_str()).collect();

    // Remove objects whose equipment disappeared or whose layer went hidden.
    let mut existing: HashMap<String, SceneObject> = scene
        .objects
        .drain(..)
        .map(|o| (o.tag.clone(), o))
        .collect();
    existing.retain(|tag, obj| {
        tags_in_data.contains(tag.as_str()) && layer_visible_for(layers, &obj.kind)
    });

    // Recreate every item whose layer is visible; hidden items are neither
    // created nor retained.
    let mut updated = Vec::with_capacity(equipment.len());
    for item in equipment {
        if !layer_visible_for(layers, &item.kind) {
            continue;
        }
        // Recreate-on-any-change: the surviving object for this tag, if any,
        // is dropped here and replaced by a fresh one.
        existing.remove(&item.tag);
        let mut obj = factory::build_object(item, color_mode);
        obj.visible = true;
        updated.push(obj);
    }
    scene.objects = updated;

    // The ground plane is governed by the dedicated terrain layer, outside
    // the equipment loop.
    if let Some(terrain) = layers.iter().find(|l| l.id == TERRAIN_LAYER_ID) {
        scene.ground_in_scene = terrain.visible;
        scene.ground.visible = terrain.visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_layers;
    use glam::Vec3;

    fn item(tag: &str, kind: &str) -> Equipment {
        Equipment {
            tag: tag.to_string(),
            name: tag.to_string(),
            kind: kind.to_string(),
            sistema: "GA".to_string(),
            area: "Área 31".to_string(),
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: None,
            color: [0.5, 0.5, 0.5],
            size: None,
            product: "OC1".to_string(),
            operational_state: "operando".to_string(),
        }
    }

    fn tags(scene: &SceneSet) -> Vec<&str> {
        scene.objects.iter().map(|o| o.tag.as_str()).collect()
    }

    fn run(scene: &mut SceneSet, data: &[Equipment], layers: &[Layer], mode: ColorMode) {
        let refs: Vec<&Equipment> = data.iter().collect();
        reconcile(scene, &refs, layers, mode);
    }

    #[test]
    fn creates_one_object_per_visible_item() {
        let data = vec![item("A", "Tank"), item("B", "Building")];
        let layers = build_layers(&data);
        let mut scene = SceneSet::new();

        run(&mut scene, &data, &layers, ColorMode::Equipamento);
        assert_eq!(tags(&scene), vec!["A", "B"]);
        assert!(scene.objects.iter().all(|o| o.visible));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let data = vec![item("A", "Tank"), item("B", "Building")];
        let layers = build_layers(&data);
        let mut scene = SceneSet::new();

        run(&mut scene, &data, &layers, ColorMode::Equipamento);
        let first: Vec<(String, bool)> = scene
            .objects
            .iter()
            .map(|o| (o.tag.clone(), o.visible))
            .collect();

        run(&mut scene, &data, &layers, ColorMode::Equipamento);
        let second: Vec<(String, bool)> = scene
            .objects
            .iter()
            .map(|o| (o.tag.clone(), o.visible))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn hidden_layer_removes_and_blocks_objects() {
        let data = vec![item("A", "Tank"), item("B", "Building")];
        let mut layers = build_layers(&data);
        let mut scene = SceneSet::new();
        run(&mut scene, &data, &layers, ColorMode::Equipamento);

        let tank_layer = layers.iter_mut().find(|l| l.name == "Tank").unwrap();
        tank_layer.visible = false;
        run(&mut scene, &data, &layers, ColorMode::Equipamento);

        assert_eq!(tags(&scene), vec!["B"]);
    }

    #[test]
    fn items_gone_from_data_are_removed() {
        let data = vec![item("A", "Tank"), item("B", "Tank")];
        let layers = build_layers(&data);
        let mut scene = SceneSet::new();
        run(&mut scene, &data, &layers, ColorMode::Equipamento);

        let shrunk = vec![item("B", "Tank")];
        run(&mut scene, &shrunk, &layers, ColorMode::Equipamento);
        assert_eq!(tags(&scene), vec!["B"]);
    }

    #[test]
    fn kind_without_layer_is_fail_open() {
        // Layers built for tanks only; the crane kind has no configuration.
        let data = vec![item("A", "Tank")];
        let layers = build_layers(&data);

        let with_crane = vec![item("A", "Tank"), item("C", "Crane")];
        let mut scene = SceneSet::new();
        run(&mut scene, &with_crane, &layers, ColorMode::Equipamento);
        assert_eq!(tags(&scene), vec!["A", "C"]);

        // And the unconfigured object survives the removal pass too.
        run(&mut scene, &with_crane, &layers, ColorMode::Equipamento);
        assert_eq!(tags(&scene), vec!["A", "C"]);
    }

    #[test]
    fn color_mode_change_recreates_with_new_colors() {
        let data = vec![item("A", "Tank")];
        let layers = build_layers(&data);
        let mut scene = SceneSet::new();

        run(&mut scene, &data, &layers, ColorMode::Equipamento);
        assert_eq!(scene.objects[0].color, [0.5, 0.5, 0.5, 1.0]);

        run(&mut scene, &data, &layers, ColorMode::EstadoOperacional);
        assert_eq!(scene.objects[0].color, [1.0, 0.0, 0.0, 1.0]); // operando
    }

    #[test]
    fn terrain_layer_toggles_ground_membership() {
        let data = vec![item("A", "Tank")];
        let mut layers = build_layers(&data);
        let mut scene = SceneSet::new();
        run(&mut scene, &data, &layers, ColorMode::Equipamento);
        assert!(scene.ground_in_scene);
        assert!(scene.ground.visible);

        layers.iter_mut().find(|l| l.id == TERRAIN_LAYER_ID).unwrap().visible = false;
        run(&mut scene, &data, &layers, ColorMode::Equipamento);
        assert!(!scene.ground_in_scene);
        assert!(!scene.ground.visible);

        layers.iter_mut().find(|l| l.id == TERRAIN_LAYER_ID).unwrap().visible = true;
        run(&mut scene, &data, &layers, ColorMode::Equipamento);
        assert!(scene.ground_in_scene);
        assert!(scene.ground.visible);
    }
}
