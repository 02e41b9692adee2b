use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings applied when packing shapes into GPU buffers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackSettings {
    /// Global factor applied to every position attribute.
    pub unit_scale: f32,
    /// Route bone indices through the skeleton's remap table.
    pub apply_skin_remap: bool,
    /// Restore the bind pose and rebuild inverse binds right after import.
    pub reset_pose_on_load: bool,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            unit_scale: 1.0,
            apply_skin_remap: true,
            reset_pose_on_load: true,
        }
    }
}

/// Save pack settings to a JSON file.
pub fn save_pack_settings(path: &Path, settings: &PackSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)
        .context("failed to serialize pack settings as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save pack settings: {}", path.display()))?;
    Ok(())
}

/// Load pack settings from a JSON file. Missing fields take their defaults.
pub fn load_pack_settings(path: &Path) -> Result<PackSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load pack settings: {}", path.display()))?;
    let settings: PackSettings =
        serde_json::from_str(&content).context("failed to parse pack settings JSON")?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_when_serialize_then_json_contains_unit_scale() {
        let settings = PackSettings::default();
        let json = serde_json::to_string(&settings).expect("serialize settings");
        assert!(json.contains("unit_scale"));
    }

    #[test]
    fn given_partial_json_when_parsing_then_missing_fields_use_defaults() {
        let settings: PackSettings =
            serde_json::from_str(r#"{"unit_scale": 0.01}"#).expect("parse settings");
        assert_eq!(settings.unit_scale, 0.01);
        assert!(settings.apply_skin_remap);
        assert!(settings.reset_pose_on_load);
    }

    #[test]
    fn given_saved_settings_when_loading_then_values_match() {
        let path = std::env::temp_dir().join(format!(
            "rigpack-settings-{}.json",
            std::process::id()
        ));
        let settings = PackSettings {
            unit_scale: 2.5,
            apply_skin_remap: false,
            reset_pose_on_load: true,
        };

        save_pack_settings(&path, &settings).expect("save settings");
        let loaded = load_pack_settings(&path).expect("load settings");
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, settings);
    }
}
