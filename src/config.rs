//! Configuration of the structural checks.
//!
//! Every heuristic threshold is a parameter with the default the checks
//! were calibrated with. Configuration is read from TOML:
//!
//! ```toml
//! [walls]
//! footing_markers = ["footing", "fundament"]
//! wall_type = "Basic Wall:Wall_200Concrete"
//!
//! [classify.beam]
//! min_plan_area = 2.5
//!
//! [placement]
//! storey_height_fraction = 0.02
//! ```
//!
//! Search order (first match wins):
//! 1. Explicit `--config` path
//! 2. `ifc-audit.toml` in the working directory
//! 3. `config.toml` in the platform configuration directory
//! 4. Built-in defaults

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;

use crate::error::ConfigError;

pub const LOCAL_CONFIG_FILE: &str = "ifc-audit.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub walls: WallConfig,
    pub classify: ClassifyConfig,
    pub placement: PlacementConfig,
    pub bcf: BcfConfig,
}

/// Wall tally filters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WallConfig {
    /// Case-insensitive substrings marking a wall as a footing.
    pub footing_markers: Vec<String>,
    /// Only count walls whose type name equals this.
    pub wall_type: Option<String>,
    /// Only count walls whose `LoadBearing` property is true.
    pub require_load_bearing: bool,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            footing_markers: vec![
                "footing".to_string(),
                "fundament".to_string(),
                "foundation".to_string(),
            ],
            wall_type: None,
            require_load_bearing: false,
        }
    }
}

/// Aspect-ratio thresholds, grouped by the class being questioned.
///
/// Ratios compare the sorted bounding-box extents: thickness `t`,
/// breadth `b` and length `l`, with `t <= b <= l`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifyConfig {
    pub beam: BeamRules,
    pub slab: SlabRules,
    pub column: ColumnRules,
    pub wall: WallRules,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BeamRules {
    /// Slab-like when `t < slab_thickness_to_breadth * b` ...
    pub slab_thickness_to_breadth: f64,
    /// ... and `t < slab_thickness_to_length * l` ...
    pub slab_thickness_to_length: f64,
    /// ... and `b * l > min_plan_area` (m²).
    pub min_plan_area: f64,
    /// Wall-like when `b > wall_breadth_to_thickness * t && l > wall_length_to_breadth * b`
    pub wall_breadth_to_thickness: f64,
    pub wall_length_to_breadth: f64,
    /// or when `l > wall_length_to_thickness * t && b > t`.
    pub wall_length_to_thickness: f64,
}

impl Default for BeamRules {
    fn default() -> Self {
        Self {
            slab_thickness_to_breadth: 0.3,
            slab_thickness_to_length: 0.2,
            min_plan_area: 2.0,
            wall_breadth_to_thickness: 4.0,
            wall_length_to_breadth: 2.0,
            wall_length_to_thickness: 8.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlabRules {
    /// Beam-like when `b > beam_breadth_to_thickness * t` ...
    pub beam_breadth_to_thickness: f64,
    /// ... and `l > beam_length_to_thickness * t` ...
    pub beam_length_to_thickness: f64,
    /// ... and `l / b > beam_length_to_breadth`.
    pub beam_length_to_breadth: f64,
    /// Column-like when `b / t < column_breadth_to_thickness && l / b < column_length_to_breadth`.
    pub column_breadth_to_thickness: f64,
    pub column_length_to_breadth: f64,
}

impl Default for SlabRules {
    fn default() -> Self {
        Self {
            beam_breadth_to_thickness: 3.0,
            beam_length_to_thickness: 4.0,
            beam_length_to_breadth: 2.0,
            column_breadth_to_thickness: 2.0,
            column_length_to_breadth: 3.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnRules {
    /// Slab-like when `t < slab_thickness_to_breadth * b && t < slab_thickness_to_length * l`.
    pub slab_thickness_to_breadth: f64,
    pub slab_thickness_to_length: f64,
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self {
            slab_thickness_to_breadth: 0.3,
            slab_thickness_to_length: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WallRules {
    /// Beam-like when `b < beam_breadth_to_thickness * t && l > beam_length_to_thickness * t`
    pub beam_breadth_to_thickness: f64,
    pub beam_length_to_thickness: f64,
    /// or when `l / b > beam_length_to_breadth`.
    pub beam_length_to_breadth: f64,
}

impl Default for WallRules {
    fn default() -> Self {
        Self {
            beam_breadth_to_thickness: 3.0,
            beam_length_to_thickness: 4.0,
            beam_length_to_breadth: 8.0,
        }
    }
}

/// Floor placement tolerances, lengths in metres.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    /// Tolerance as a fraction of the storey height.
    pub storey_height_fraction: f64,
    /// Tolerance as a fraction of the element height; the larger tolerance wins.
    pub element_height_fraction: f64,
    /// Margin around a storey range when checking element mid-height.
    pub floating_margin: f64,
    /// Height given to the topmost storey's range.
    pub top_storey_height: f64,
    /// Minimum storey height used when a range is degenerate.
    pub fallback_storey_height: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            storey_height_fraction: 0.02,
            element_height_fraction: 0.2,
            floating_margin: 0.01,
            top_storey_height: 10.0,
            fallback_storey_height: 3.0,
        }
    }
}

/// BCF authoring settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BcfConfig {
    pub author: String,
    /// Overrides the IFC project name in `project.bcfp`.
    pub project_name: Option<String>,
    pub field_of_view: f64,
    /// Camera sits at the element's maximum corner scaled by this factor.
    pub camera_offset: f64,
}

impl Default for BcfConfig {
    fn default() -> Self {
        Self {
            author: "Structural-Checker".to_string(),
            project_name: None,
            field_of_view: 60.0,
            camera_offset: 1.04,
        }
    }
}

impl AuditConfig {
    /// Rejects thresholds the checks cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classify;
        let p = &self.placement;
        let ratios = [
            ("classify.beam.slab_thickness_to_breadth", c.beam.slab_thickness_to_breadth),
            ("classify.beam.slab_thickness_to_length", c.beam.slab_thickness_to_length),
            ("classify.beam.min_plan_area", c.beam.min_plan_area),
            ("classify.beam.wall_breadth_to_thickness", c.beam.wall_breadth_to_thickness),
            ("classify.beam.wall_length_to_breadth", c.beam.wall_length_to_breadth),
            ("classify.beam.wall_length_to_thickness", c.beam.wall_length_to_thickness),
            ("classify.slab.beam_breadth_to_thickness", c.slab.beam_breadth_to_thickness),
            ("classify.slab.beam_length_to_thickness", c.slab.beam_length_to_thickness),
            ("classify.slab.beam_length_to_breadth", c.slab.beam_length_to_breadth),
            ("classify.slab.column_breadth_to_thickness", c.slab.column_breadth_to_thickness),
            ("classify.slab.column_length_to_breadth", c.slab.column_length_to_breadth),
            ("classify.column.slab_thickness_to_breadth", c.column.slab_thickness_to_breadth),
            ("classify.column.slab_thickness_to_length", c.column.slab_thickness_to_length),
            ("classify.wall.beam_breadth_to_thickness", c.wall.beam_breadth_to_thickness),
            ("classify.wall.beam_length_to_thickness", c.wall.beam_length_to_thickness),
            ("classify.wall.beam_length_to_breadth", c.wall.beam_length_to_breadth),
            ("placement.top_storey_height", p.top_storey_height),
            ("placement.fallback_storey_height", p.fallback_storey_height),
            ("bcf.field_of_view", self.bcf.field_of_view),
            ("bcf.camera_offset", self.bcf.camera_offset),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let tolerances = [
            ("placement.storey_height_fraction", p.storey_height_fraction),
            ("placement.element_height_fraction", p.element_height_fraction),
            ("placement.floating_margin", p.floating_margin),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        Ok(())
    }
}

/// Find and load configuration from the locations listed in the module docs.
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or fails validation
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AuditConfig, ConfigError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new(LOCAL_CONFIG_FILE);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("org", "ifc-audit", "ifc-audit") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AuditConfig::default())
}

/// Load and validate configuration from a TOML file.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<AuditConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: PathBuf::from(path),
        source,
    })?;

    parse_config(&content)
}

/// Parse and validate TOML configuration content.
pub fn parse_config(content: &str) -> Result<AuditConfig, ConfigError> {
    let config: AuditConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.classify.beam.min_plan_area, 2.0);
        assert_eq!(config.placement.storey_height_fraction, 0.02);
        assert_eq!(config.bcf.author, "Structural-Checker");
        assert_eq!(config.walls.wall_type, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
[walls]
wall_type = "Basic Wall:Wall_200Concrete"

[classify.beam]
min_plan_area = 5.0
"#,
        )
        .unwrap();
        assert_eq!(
            config.walls.wall_type.as_deref(),
            Some("Basic Wall:Wall_200Concrete")
        );
        assert_eq!(config.walls.footing_markers.len(), 3);
        assert_eq!(config.classify.beam.min_plan_area, 5.0);
        assert_eq!(config.classify.beam.slab_thickness_to_breadth, 0.3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = parse_config("[placement]\ntolerance = 1.0\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn non_positive_ratio_is_rejected() {
        let result = parse_config("[classify.slab]\nbeam_length_to_breadth = 0.0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config(Some("no/such/config.toml"));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }
}
