//! Shared configuration for the sculpting kernel
//!
//! This crate provides the single source of truth for tunables shared by the
//! mesh kernel and the action layer: octree partitioning, undo depth and the
//! default carve brush.

use serde::{Deserialize, Serialize};

/// Default number of faces a node holds before it splits into octants
pub const DEFAULT_MAX_FACES_PER_NODE: usize = 8;

/// Default smallest node width the octree subdivides to
pub const DEFAULT_MIN_NODE_WIDTH: f32 = 0.01;

/// Default relative padding added around a mesh's bounds for its root node
pub const DEFAULT_ROOT_MARGIN: f32 = 0.1;

/// Default number of actions kept on the undo stack
pub const DEFAULT_UNDO_DEPTH: usize = 15;

/// Default carve brush radius in world units
pub const DEFAULT_BRUSH_RADIUS: f32 = 0.2;

/// Default carve intensity, relative to the brush radius
pub const DEFAULT_INTENSITY_FACTOR: f32 = 0.1;

/// Default falloff flatness exponent
pub const DEFAULT_FLATNESS: u32 = 4;

/// Errors raised while loading or storing configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Spatial index partitioning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Faces a node may hold before it is split
    pub max_faces_per_node: usize,
    /// Nodes narrower than this are never split further
    pub min_node_width: f32,
    /// Padding around the mesh bounds when sizing a new root, as a fraction
    /// of the largest extent
    pub root_margin: f32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_faces_per_node: DEFAULT_MAX_FACES_PER_NODE,
            min_node_width: DEFAULT_MIN_NODE_WIDTH,
            root_margin: DEFAULT_ROOT_MARGIN,
        }
    }
}

/// Undo/redo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of actions kept on the undo stack (0 = unbounded)
    pub undo_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

/// Default carve brush parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Brush radius in world units
    pub radius: f32,
    /// Intensity as a fraction of the radius
    pub intensity_factor: f32,
    /// Shoulder exponent of the falloff profile (values below 3 act as 3)
    pub flatness: u32,
    /// Carve inwards instead of outwards
    pub invert: bool,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BRUSH_RADIUS,
            intensity_factor: DEFAULT_INTENSITY_FACTOR,
            flatness: DEFAULT_FLATNESS,
            invert: false,
        }
    }
}

/// Complete kernel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub octree: OctreeConfig,
    pub history: HistoryConfig,
    pub brush: BrushConfig,
}

impl KernelConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the kernel cannot operate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.octree.max_faces_per_node == 0 {
            return Err(ConfigError::Invalid(
                "octree.max_faces_per_node must be positive".to_string(),
            ));
        }
        if !(self.octree.min_node_width > 0.0) {
            return Err(ConfigError::Invalid(
                "octree.min_node_width must be positive".to_string(),
            ));
        }
        if !(self.octree.root_margin >= 0.0) {
            return Err(ConfigError::Invalid(
                "octree.root_margin must not be negative".to_string(),
            ));
        }
        if !(self.brush.radius > 0.0) {
            return Err(ConfigError::Invalid(
                "brush.radius must be positive".to_string(),
            ));
        }
        if !(self.brush.intensity_factor >= 0.0) {
            return Err(ConfigError::Invalid(
                "brush.intensity_factor must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KernelConfig::default();
        assert_eq!(config.octree.max_faces_per_node, DEFAULT_MAX_FACES_PER_NODE);
        assert_eq!(config.history.undo_depth, DEFAULT_UNDO_DEPTH);
        assert_eq!(config.brush.flatness, DEFAULT_FLATNESS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            KernelConfig::from_json(r#"{ "history": { "undo_depth": 3 } }"#).unwrap();
        assert_eq!(config.history.undo_depth, 3);
        assert_eq!(config.octree, OctreeConfig::default());
        assert_eq!(config.brush, BrushConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = KernelConfig::default();
        config.brush.invert = true;
        config.octree.max_faces_per_node = 32;

        let json = config.to_json().unwrap();
        assert_eq!(KernelConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = KernelConfig::from_json(r#"{ "brush": { "radius": 0.0 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = KernelConfig::from_json("{ not json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
