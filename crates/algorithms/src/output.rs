//! Model output assembly
//!
//! Maps subcatchments, reaches and hydraulic attributes into the record
//! schema of the selected model. The records are handed to an external
//! writer; they are plain `Serialize` structs with no geometry beyond
//! the outlet cell.
//!
//! Adding a model format: new `HydroModel` variant, a `ModelConfig` row,
//! and an arm here.

use serde::Serialize;

use catchflow_core::{Error, Result};

use crate::channel::Reach;
use crate::config::{HydroModel, ModelConfig};
use crate::hydraulics::{reach_hydraulics, subcatchment_hydraulics};
use crate::partition::Partition;

/// One Mydro subcatchment/reach record
#[derive(Debug, Clone, Serialize)]
pub struct MydroRecord {
    pub id: usize,
    pub downstream: Option<usize>,
    pub outlet: (usize, usize),
    pub area: f64,
    pub reach_length: f64,
    pub reach_slope: f64,
    pub mannings_n: f64,
    pub conveyance: f64,
}

/// One URBS subcatchment/reach record (no roughness parameter)
#[derive(Debug, Clone, Serialize)]
pub struct UrbsRecord {
    pub id: usize,
    pub downstream: Option<usize>,
    pub outlet: (usize, usize),
    pub area: f64,
    pub reach_length: f64,
    pub reach_slope: f64,
}

/// Assembled records in the selected model's schema
#[derive(Debug, Clone, Serialize)]
pub enum ModelOutput {
    Mydro(Vec<MydroRecord>),
    Urbs(Vec<UrbsRecord>),
}

impl ModelOutput {
    pub fn model(&self) -> HydroModel {
        match self {
            ModelOutput::Mydro(_) => HydroModel::Mydro,
            ModelOutput::Urbs(_) => HydroModel::Urbs,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ModelOutput::Mydro(records) => records.len(),
            ModelOutput::Urbs(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assemble the per-model records. `reaches` must be indexed by
/// subcatchment id, as produced by channel extraction.
pub fn assemble(
    model: HydroModel,
    partition: &Partition,
    reaches: &[Reach],
    config: &ModelConfig,
) -> Result<ModelOutput> {
    if reaches.len() != partition.subcatchments.len() {
        return Err(Error::Other(format!(
            "{} reaches for {} subcatchments",
            reaches.len(),
            partition.subcatchments.len()
        )));
    }

    match model {
        HydroModel::Mydro => {
            let n = config.roughness.ok_or_else(|| Error::InvalidParameter {
                name: "roughness",
                value: "None".to_string(),
                reason: "Mydro output requires a Manning's n".to_string(),
            })?;

            let records = partition
                .subcatchments
                .iter()
                .zip(reaches)
                .map(|(sub, reach)| {
                    let rh = reach_hydraulics(reach, config);
                    let sh = subcatchment_hydraulics(sub, reach, config);
                    MydroRecord {
                        id: sub.id,
                        downstream: sub.downstream,
                        outlet: sub.outlet,
                        area: sh.area,
                        reach_length: rh.length,
                        reach_slope: rh.slope,
                        mannings_n: n,
                        conveyance: rh.conveyance.unwrap_or_default(),
                    }
                })
                .collect();
            Ok(ModelOutput::Mydro(records))
        }
        HydroModel::Urbs => {
            let records = partition
                .subcatchments
                .iter()
                .zip(reaches)
                .map(|(sub, reach)| {
                    let rh = reach_hydraulics(reach, config);
                    let sh = subcatchment_hydraulics(sub, reach, config);
                    UrbsRecord {
                        id: sub.id,
                        downstream: sub.downstream,
                        outlet: sub.outlet,
                        area: sh.area,
                        reach_length: rh.length,
                        reach_slope: rh.slope,
                    }
                })
                .collect();
            Ok(ModelOutput::Urbs(records))
        }
    }
}
