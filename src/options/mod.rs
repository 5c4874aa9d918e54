//! Retro effect configuration with TOML preset support.
//!
//! The effect knobs and the feature's host settings serialize to/from TOML
//! so looks can be stored as presets (see `assets/presets/`).

mod feature;
mod retro;

use std::path::Path;

pub use feature::{FeatureOptions, InjectionPoint};
pub use retro::RetroOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::RetroError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[retro]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Effect knobs.
    pub retro: RetroOptions,
    /// Render feature settings.
    pub feature: FeatureOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Parse options from a TOML string. Missing fields use defaults.
    pub fn from_toml(content: &str) -> Result<Self, RetroError> {
        toml::from_str(content)
            .map_err(|e| RetroError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, RetroError> {
        let content = std::fs::read_to_string(path).map_err(RetroError::Io)?;
        Self::from_toml(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), RetroError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RetroError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(RetroError::Io)?;
        }
        std::fs::write(path, content).map_err(RetroError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Knob;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed = Options::from_toml(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[retro]
enabled = true
bleed_radius = 0.4
";
        let opts = Options::from_toml(toml_str).unwrap();
        assert!(opts.retro.enabled);
        assert_eq!(opts.retro.bleed_radius, 0.4);
        // Everything else should be default
        assert_eq!(opts.retro.scanline_frequency, 240.0);
        assert_eq!(opts.feature, FeatureOptions::default());
    }

    #[test]
    fn injection_point_parses_snake_case() {
        let opts = Options::from_toml(
            "[feature]\ninjection_point = \"after_post_processing\"\n",
        )
        .unwrap();
        assert_eq!(
            opts.feature.injection_point,
            InjectionPoint::AfterPostProcessing
        );
    }

    #[test]
    fn out_of_range_values_clamp_on_conversion() {
        let opts = Options::from_toml(
            "[retro]\nsmear_intensity = 7.0\nbleed_direction = -3.0\n",
        )
        .unwrap();
        let params = opts.retro.to_parameters();
        assert_eq!(params.get(Knob::SmearIntensity), 1.0);
        assert_eq!(params.get(Knob::BleedDirection), -1.0);
    }

    #[test]
    fn bundled_preset_parses() {
        let opts =
            Options::from_toml(include_str!("../../assets/presets/vhs.toml"))
                .unwrap();
        assert!(opts.retro.enabled);
        assert!(opts.retro.smear_intensity > 0.0);
    }

    #[test]
    fn save_load_and_list_presets() {
        let dir = std::env::temp_dir()
            .join(format!("retrofx-presets-{}", std::process::id()));
        let mut opts = Options::default();
        opts.retro.enabled = true;
        opts.retro.scanline_intensity = 0.3;
        opts.save(&dir.join("crisp.toml")).unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        assert_eq!(Options::list_presets(&dir), vec!["crisp".to_owned()]);
        assert_eq!(Options::load(&dir.join("crisp.toml")).unwrap(), opts);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn schema_ranges_match_runtime_clamps() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();
        assert!(props.contains_key("retro"));
        assert!(props.contains_key("feature"));

        let retro = &props["retro"]["properties"];
        for knob in Knob::ALL {
            let field = &retro[knob.name()];
            let (min, max) = knob.range();
            assert_eq!(
                field["minimum"].as_f64().unwrap() as f32,
                min,
                "{}",
                knob.name()
            );
            assert_eq!(
                field["maximum"].as_f64().unwrap() as f32,
                max,
                "{}",
                knob.name()
            );
        }

        // Skipped fields should be absent
        assert!(props["feature"]["properties"].get("name").is_none());
    }
}
