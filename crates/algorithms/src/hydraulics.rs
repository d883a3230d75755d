//! Hydraulic parameter derivation
//!
//! Pure functions of the extracted reaches and subcatchments: nothing
//! here mutates upstream entities. The conveyance factor follows
//! Manning's relation, `sqrt(slope) / n`; models without a roughness
//! coefficient (URBS) carry no conveyance.

use serde::Serialize;

use crate::channel::Reach;
use crate::config::ModelConfig;
use crate::partition::Subcatchment;

/// Hydraulic attributes of a reach
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReachHydraulics {
    pub length: f64,
    /// Routing slope (already floored during extraction)
    pub slope: f64,
    /// `sqrt(slope) / n` where the model configures a roughness
    pub conveyance: Option<f64>,
}

/// Hydraulic attributes of a subcatchment
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubcatchmentHydraulics {
    pub area: f64,
    /// Length of the subcatchment's outlet reach
    pub flow_length: f64,
    /// Slope of the subcatchment's outlet reach
    pub slope: f64,
}

/// Derive hydraulic attributes for a reach
pub fn reach_hydraulics(reach: &Reach, config: &ModelConfig) -> ReachHydraulics {
    let slope = reach.slope.max(config.min_slope);
    ReachHydraulics {
        length: reach.length,
        slope,
        conveyance: config.roughness.map(|n| slope.sqrt() / n),
    }
}

/// Derive hydraulic attributes for a subcatchment and its outlet reach
pub fn subcatchment_hydraulics(
    sub: &Subcatchment,
    reach: &Reach,
    config: &ModelConfig,
) -> SubcatchmentHydraulics {
    SubcatchmentHydraulics {
        area: sub.area,
        flow_length: reach.length,
        slope: reach.slope.max(config.min_slope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HydroModel;
    use approx::assert_relative_eq;

    fn reach(slope: f64, length: f64) -> Reach {
        Reach {
            subcatchment: 0,
            downstream: Some(1),
            length,
            drop: slope * length,
            slope,
            channel_cells: 0,
            path_cells: 1,
        }
    }

    #[test]
    fn test_mydro_conveyance() {
        let config = ModelConfig::for_model(HydroModel::Mydro);
        let h = reach_hydraulics(&reach(0.04, 120.0), &config);
        assert_relative_eq!(h.conveyance.unwrap(), 0.04_f64.sqrt() / 0.03);
        assert_relative_eq!(h.length, 120.0);
    }

    #[test]
    fn test_urbs_has_no_conveyance() {
        let config = ModelConfig::for_model(HydroModel::Urbs);
        let h = reach_hydraulics(&reach(0.04, 120.0), &config);
        assert!(h.conveyance.is_none());
    }

    #[test]
    fn test_slope_floor_applied() {
        let config = ModelConfig::for_model(HydroModel::Mydro);
        let h = reach_hydraulics(&reach(0.0, 50.0), &config);
        assert_relative_eq!(h.slope, config.min_slope);
    }
}
