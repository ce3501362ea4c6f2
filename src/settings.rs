use serde::{Serialize, Deserialize};

/// All user-configurable settings, persisted to JSON.
#[derive(Default, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraSettings,
    pub display: DisplaySettings,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub orbit_sensitivity: f32,
    pub pan_sensitivity: f32,
    pub zoom_speed: f32,
    pub invert_orbit_y: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 2000.0,
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.01,
            zoom_speed: 1.0,
            invert_orbit_y: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DisplaySettings {
    pub bg_color: [f32; 3],
    pub selection_color: [f32; 4],
    pub hover_color: [f32; 4],
    pub pin_color: [f32; 4],
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            // Pale blue-gray sky, like the plant on an overcast day.
            bg_color: [0.663, 0.757, 0.820],
            selection_color: [1.0, 0.85, 0.2, 1.0],
            hover_color: [0.5, 0.7, 1.0, 1.0],
            pin_color: [1.0, 0.55, 0.15, 1.0],
        }
    }
}

impl Settings {
    /// Load settings from config file. Falls back to defaults on error.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists()
            && let Ok(data) = std::fs::read_to_string(&path)
            && let Ok(settings) = serde_json::from_str::<Settings>(&data)
        {
            return settings;
        }
        Self::default()
    }

    /// Save settings to config file.
    pub fn save(&self) {
        let path = config_path();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(data) = serde_json::to_string_pretty(self) {
            let _ = std::fs::write(&path, data);
        }
    }
}

fn config_path() -> std::path::PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    std::path::PathBuf::from(home).join(".config/plantview3d/settings.json")
}
