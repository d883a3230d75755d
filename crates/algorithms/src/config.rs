//! Model selection and run configuration
//!
//! The pipeline is parameterized by the target hydrologic model. Each
//! model carries its own routing-slope floor, roughness coefficient and
//! channel threshold; everything else is shared. Configuration is
//! validated before any grid work starts.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use catchflow_core::{Error, GeoTransform, Result};

/// Target hydrologic model for the run.
///
/// The single extension point for additional output formats: adding a
/// model means a new variant here, a `ModelConfig` row and an assembler
/// arm in `output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HydroModel {
    Mydro,
    Urbs,
}

impl HydroModel {
    pub fn name(&self) -> &'static str {
        match self {
            HydroModel::Mydro => "Mydro",
            HydroModel::Urbs => "URBS",
        }
    }
}

impl FromStr for HydroModel {
    type Err = Error;

    /// Case-insensitive model name lookup. Unknown names fail before any
    /// grid is touched.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mydro" => Ok(HydroModel::Mydro),
            "urbs" => Ok(HydroModel::Urbs),
            _ => Err(Error::UnknownModel(s.to_string())),
        }
    }
}

/// Per-model routing configuration.
///
/// `channel_threshold` and areas are in physical map-area units
/// (cell area = dx * dy), consistently with the partition target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Floor applied to every routing slope
    pub min_slope: f64,
    /// Manning's roughness coefficient; `None` for models that carry no
    /// conveyance parameter (URBS)
    pub roughness: Option<f64>,
    /// Accumulation threshold above which a cell is a channel cell
    pub channel_threshold: f64,
}

impl ModelConfig {
    /// Built-in configuration for a model
    pub fn for_model(model: HydroModel) -> Self {
        match model {
            HydroModel::Mydro => Self {
                min_slope: 0.0005,
                roughness: Some(0.03),
                channel_threshold: 0.125,
            },
            HydroModel::Urbs => Self {
                min_slope: 0.0005,
                roughness: None,
                channel_threshold: 1.0,
            },
        }
    }
}

/// Policy for interior cells with no strictly-lower neighbor that flat
/// resolution could not drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PitPolicy {
    /// Fail the run: an unresolved sink would corrupt the flow forest
    #[default]
    Fail,
    /// Treat the pit as a synthetic domain exit (logged)
    SyntheticExit,
}

/// Outlet carving configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarveParams {
    /// Whether to lower elevations along rasterized outlet lines
    pub enabled: bool,
    /// Vertical step carved below the lowest original neighbor
    pub depth: f64,
}

impl Default for CarveParams {
    fn default() -> Self {
        Self {
            enabled: true,
            depth: 0.01,
        }
    }
}

/// Full configuration for a delineation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelineationParams {
    /// Target output model
    pub model: HydroModel,
    /// Target subcatchment area (map-area units)
    pub target_area: f64,
    /// Minimum viable area for opening a new subcatchment at a branch.
    /// 0.0 disables the guard, letting single-cell remainders split.
    pub min_split_area: f64,
    /// Outlet carving behavior
    pub carve: CarveParams,
    /// Handling of unresolved interior pits
    pub pit_policy: PitPolicy,
    /// Override for the built-in per-model configuration
    pub model_config: Option<ModelConfig>,
}

impl DelineationParams {
    pub fn new(model: HydroModel, target_area: f64) -> Self {
        Self {
            model,
            target_area,
            min_split_area: 0.0,
            carve: CarveParams::default(),
            pit_policy: PitPolicy::default(),
            model_config: None,
        }
    }

    /// Build params from a model name string; unknown names fail fast
    pub fn for_model_name(name: &str, target_area: f64) -> Result<Self> {
        Ok(Self::new(name.parse()?, target_area))
    }

    pub fn with_pit_policy(mut self, policy: PitPolicy) -> Self {
        self.pit_policy = policy;
        self
    }

    /// Effective model configuration (override or built-in)
    pub fn model_config(&self) -> ModelConfig {
        self.model_config
            .unwrap_or_else(|| ModelConfig::for_model(self.model))
    }

    /// Validate the configuration against the grid's transform.
    ///
    /// Must be called (and pass) before any processing starts.
    pub fn validate(&self, transform: &GeoTransform) -> Result<()> {
        if !(self.target_area > 0.0) {
            return Err(Error::InvalidParameter {
                name: "target_area",
                value: self.target_area.to_string(),
                reason: "target subcatchment area must be positive".to_string(),
            });
        }
        if !(transform.cell_width() > 0.0) {
            return Err(Error::InvalidParameter {
                name: "cell_width",
                value: transform.cell_width().to_string(),
                reason: "cell width must be positive".to_string(),
            });
        }
        if !(transform.cell_height() > 0.0) {
            return Err(Error::InvalidParameter {
                name: "cell_height",
                value: transform.cell_height().to_string(),
                reason: "cell height must be positive".to_string(),
            });
        }
        let config = self.model_config();
        if !(config.min_slope > 0.0) {
            return Err(Error::InvalidParameter {
                name: "min_slope",
                value: config.min_slope.to_string(),
                reason: "slope floor must be positive".to_string(),
            });
        }
        if !(config.channel_threshold > 0.0) {
            return Err(Error::InvalidParameter {
                name: "channel_threshold",
                value: config.channel_threshold.to_string(),
                reason: "channel threshold must be positive".to_string(),
            });
        }
        Ok(())
    }
}
