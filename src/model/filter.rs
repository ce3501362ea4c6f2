use super::Equipment;

/// Filter option sentinel meaning "no filter".
pub const ALL: &str = "All";

/// Current filter criteria. Filter changes are not undoable; they narrow the
/// data handed to reconciliation, they do not mutate it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub sistema: String,
    pub area: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            sistema: ALL.to_string(),
            area: ALL.to_string(),
        }
    }
}

/// Equipment matching all active criteria. The search term matches tag or
/// name, case-insensitively.
pub fn apply<'a>(equipment: &'a [Equipment], filter: &FilterState) -> Vec<&'a Equipment> {
    let term = filter.search.trim().to_lowercase();
    equipment
        .iter()
        .filter(|e| filter.sistema == ALL || e.sistema == filter.sistema)
        .filter(|e| filter.area == ALL || e.area == filter.area)
        .filter(|e| {
            term.is_empty()
                || e.tag.to_lowercase().contains(&term)
                || e.name.to_lowercase().contains(&term)
        })
        .collect()
}

/// Distinct sistema values, sorted, with "All" first.
pub fn available_sistemas(equipment: &[Equipment]) -> Vec<String> {
    available_values(equipment.iter().map(|e| e.sistema.as_str()))
}

/// Distinct area values, sorted, with "All" first.
pub fn available_areas(equipment: &[Equipment]) -> Vec<String> {
    available_values(equipment.iter().map(|e| e.area.as_str()))
}

fn available_values<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = values
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    out.sort_unstable();
    out.dedup();
    out.insert(0, ALL.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NOT_APPLICABLE;
    use glam::Vec3;

    fn item(tag: &str, sistema: &str, area: &str) -> Equipment {
        Equipment {
            tag: tag.to_string(),
            name: format!("Name of {tag}"),
            kind: "Tank".to_string(),
            sistema: sistema.to_string(),
            area: area.to_string(),
            position: Vec3::ZERO,
            rotation: None,
            color: [0.5, 0.5, 0.5],
            size: None,
            product: NOT_APPLICABLE.to_string(),
            operational_state: NOT_APPLICABLE.to_string(),
        }
    }

    fn dataset() -> Vec<Equipment> {
        vec![
            item("TQ-101", "GA", "Área 31"),
            item("TQ-102", "GA", "Área 32"),
            item("BM-201", "ODB", "Área 31"),
        ]
    }

    #[test]
    fn no_filter_passes_everything() {
        let data = dataset();
        assert_eq!(apply(&data, &FilterState::default()).len(), 3);
    }

    #[test]
    fn sistema_and_area_combine() {
        let data = dataset();
        let filter = FilterState {
            sistema: "GA".to_string(),
            area: "Área 31".to_string(),
            ..Default::default()
        };
        let out = apply(&data, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tag, "TQ-101");
    }

    #[test]
    fn search_matches_tag_and_name_case_insensitive() {
        let data = dataset();
        let filter = FilterState { search: "tq-10".to_string(), ..Default::default() };
        assert_eq!(apply(&data, &filter).len(), 2);

        let filter = FilterState { search: "name of bm".to_string(), ..Default::default() };
        let out = apply(&data, &filter);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].tag, "BM-201");
    }

    #[test]
    fn available_lists_sorted_with_all_first() {
        let data = dataset();
        assert_eq!(available_sistemas(&data), vec!["All", "GA", "ODB"]);
        assert_eq!(available_areas(&data), vec!["All", "Área 31", "Área 32"]);
    }
}
