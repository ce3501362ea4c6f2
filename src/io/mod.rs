use std::path::Path;

use crate::model::{Annotation, Equipment};

/// Equipment dataset bundled with the binary, used until the user opens one.
pub fn default_equipment() -> Vec<Equipment> {
    serde_json::from_str(include_str!("../../data/plant.json"))
        .expect("bundled dataset is valid")
}

/// Load an equipment dataset from a JSON file.
pub fn load_equipment(path: &Path) -> Result<Vec<Equipment>, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let equipment: Vec<Equipment> = serde_json::from_str(&data)
        .map_err(|e| format!("Invalid equipment dataset: {e}"))?;

    // Duplicate tags would break the tag → object mapping downstream.
    let mut tags: Vec<&str> = equipment.iter().map(|e| e.tag.as_str()).collect();
    tags.sort_unstable();
    for pair in tags.windows(2) {
        if pair[0] == pair[1] {
            return Err(format!("Duplicate equipment tag in dataset: {}", pair[0]));
        }
    }
    Ok(equipment)
}

/// Load annotations from a JSON file.
pub fn load_annotations(path: &Path) -> Result<Vec<Annotation>, String> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("Invalid annotations file: {e}"))
}

/// Save annotations to a JSON file.
pub fn save_annotations(annotations: &[Annotation], path: &Path) -> Result<(), String> {
    let data = serde_json::to_string_pretty(annotations)
        .map_err(|e| format!("Failed to serialize annotations: {e}"))?;
    std::fs::write(path, data)
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dataset_parses_and_has_unique_tags() {
        let equipment = default_equipment();
        assert!(!equipment.is_empty());

        let mut tags: Vec<&str> = equipment.iter().map(|e| e.tag.as_str()).collect();
        let total = tags.len();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), total);
    }

    #[test]
    fn annotations_roundtrip_through_disk() {
        let annotations = vec![Annotation {
            equipment_tag: "TQ-101".to_string(),
            text: "inspecionar na próxima parada".to_string(),
            created_at: chrono::Utc::now(),
        }];

        let dir = std::env::temp_dir().join("plantview3d-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("annotations.json");

        save_annotations(&annotations, &path).unwrap();
        let loaded = load_annotations(&path).unwrap();
        assert_eq!(loaded, annotations);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_a_readable_error() {
        let err = load_equipment(Path::new("/nonexistent/plant.json")).unwrap_err();
        assert!(err.contains("Failed to read"));
    }
}
