pub mod filter;

use glam::Vec3;
use serde::{Serialize, Deserialize};

pub const TERRAIN_LAYER_ID: &str = "layer-terrain";
pub const ANNOTATIONS_LAYER_ID: &str = "layer-annotations";

/// Sentinel used by the dataset for "no product" / "no operational state".
pub const NOT_APPLICABLE: &str = "Não aplicável";

pub const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(25.0, 20.0, 25.0);
pub const DEFAULT_CAMERA_LOOK_AT: Vec3 = Vec3::new(0.0, 2.0, 0.0);

/// One plant item, uniquely identified by `tag`. Items are owned by the data
/// layer and replaced wholesale on change; the interaction core only reads them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Equipment {
    pub tag: String,
    pub name: String,
    /// Equipment category ("Building", "Tank", ...). Governs layer visibility
    /// and which geometry the factory builds.
    #[serde(rename = "type")]
    pub kind: String,
    pub sistema: String,
    pub area: String,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Option<Vec3>,
    /// Base color, linear RGB.
    pub color: [f32; 3],
    /// Footprint override; the factory uses per-kind defaults when absent.
    #[serde(default)]
    pub size: Option<Vec3>,
    #[serde(default = "not_applicable")]
    pub product: String,
    #[serde(rename = "operationalState", default = "not_applicable")]
    pub operational_state: String,
}

fn not_applicable() -> String {
    NOT_APPLICABLE.to_string()
}

/// What a visibility layer governs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    /// All equipment of one category (matched against `Equipment::kind`).
    Equipment(String),
    Terrain,
    Annotations,
}

/// A named visibility toggle. Layers are created once at startup and only ever
/// mutated through `LayerVisibility` commands.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub kind: LayerKind,
    pub visible: bool,
}

/// Free-text note attached to one equipment item. At most one per tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "equipmentTag")]
    pub equipment_tag: String,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Camera pose as seen by the command history: where the camera sits and what
/// it looks at. The live orbit camera is derived from this on undo/redo.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl CameraState {
    /// Component-wise comparison used to suppress no-op camera commands.
    pub fn approx_eq(&self, other: &CameraState, epsilon: f32) -> bool {
        (self.position - other.position).abs().max_element() < epsilon
            && (self.look_at - other.look_at).abs().max_element() < epsilon
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: DEFAULT_CAMERA_POSITION,
            look_at: DEFAULT_CAMERA_LOOK_AT,
        }
    }
}

/// How equipment meshes are colored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// Base color from the dataset.
    Equipamento,
    /// Operational state palette (operando, manutenção, ...).
    EstadoOperacional,
    /// Procedural color derived from the product code.
    Produto,
}

impl ColorMode {
    pub const ALL: [ColorMode; 3] = [
        ColorMode::Equipamento,
        ColorMode::EstadoOperacional,
        ColorMode::Produto,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColorMode::Equipamento => "Equipamento",
            ColorMode::EstadoOperacional => "Estado Operacional",
            ColorMode::Produto => "Produto",
        }
    }
}

/// The mutable state slice that commands operate on. Selection, layers,
/// annotations and the committed camera pose each have exactly one writer:
/// the history engine replaying apply/undo. Hover is transient and never
/// enters the history.
pub struct ViewState {
    /// Ordered for determinism; compared order-insensitively.
    pub selected_tags: Vec<String>,
    pub hovered_tag: Option<String>,
    pub layers: Vec<Layer>,
    pub annotations: Vec<Annotation>,
    pub camera: CameraState,
}

impl ViewState {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            selected_tags: Vec::new(),
            hovered_tag: None,
            layers,
            annotations: Vec::new(),
            camera: CameraState::default(),
        }
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected_tags.iter().any(|t| t == tag)
    }

    pub fn annotation_for(&self, tag: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.equipment_tag == tag)
    }

    pub fn layer_by_id(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn annotations_visible(&self) -> bool {
        self.layer_by_id(ANNOTATIONS_LAYER_ID).map_or(true, |l| l.visible)
    }
}

/// Visibility of the layer governing an equipment kind. Items whose kind has
/// no layer configuration are treated as visible (fail-open), on both the
/// create and the remove path of reconciliation.
pub fn layer_visible_for(layers: &[Layer], kind: &str) -> bool {
    layers
        .iter()
        .find(|l| matches!(&l.kind, LayerKind::Equipment(k) if k == kind))
        .map_or(true, |l| l.visible)
}

/// Build the layer list for a dataset: one layer per distinct equipment kind
/// (sorted for a stable panel order), plus the terrain and annotation layers.
/// Everything starts visible.
pub fn build_layers(equipment: &[Equipment]) -> Vec<Layer> {
    let mut kinds: Vec<&str> = equipment.iter().map(|e| e.kind.as_str()).collect();
    kinds.sort_unstable();
    kinds.dedup();

    let mut layers: Vec<Layer> = kinds
        .into_iter()
        .map(|kind| Layer {
            id: format!("layer-{}", kind.to_lowercase()),
            name: kind.to_string(),
            kind: LayerKind::Equipment(kind.to_string()),
            visible: true,
        })
        .collect();

    layers.push(Layer {
        id: TERRAIN_LAYER_ID.to_string(),
        name: "Terreno".to_string(),
        kind: LayerKind::Terrain,
        visible: true,
    });
    layers.push(Layer {
        id: ANNOTATIONS_LAYER_ID.to_string(),
        name: "Anotações".to_string(),
        kind: LayerKind::Annotations,
        visible: true,
    });
    layers
}
