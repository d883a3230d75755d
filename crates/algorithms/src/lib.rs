//! # Catchflow Algorithms
//!
//! Drainage delineation stages for Catchflow.
//!
//! ## Stages
//!
//! - **outlet**: outlet placement and DEM carving
//! - **flow_direction**: deterministic D8 assignment with flat and pit handling
//! - **flow_accumulation**: contributing cell-count / area totals
//! - **partition**: subcatchment partitioning to a target area
//! - **channel**: channel mask and reach extraction
//! - **hydraulics**: reach and subcatchment hydraulic parameters
//! - **output**: hydrologic-model record assembly
//! - **pipeline**: the end-to-end [`pipeline::delineate`] entry point

pub mod channel;
pub mod config;
pub mod flow_accumulation;
pub mod flow_direction;
pub mod hydraulics;
pub mod outlet;
pub mod output;
pub mod partition;
pub mod pipeline;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::channel::{
        extract_channels, ChannelNetwork, ChannelParams, Reach,
    };
    pub use crate::config::{
        CarveParams, DelineationParams, HydroModel, ModelConfig, PitPolicy,
    };
    pub use crate::flow_accumulation::{
        flow_accumulation, flow_accumulation_batched, AccumulationParams,
        AccumulationWeight,
    };
    pub use crate::flow_direction::{
        flow_direction, FlowDirectionParams, FlowField,
    };
    pub use crate::hydraulics::{
        reach_hydraulics, subcatchment_hydraulics, ReachHydraulics,
        SubcatchmentHydraulics,
    };
    pub use crate::outlet::{carve_outlets, OutletSpec};
    pub use crate::output::{
        assemble, ModelOutput, MydroRecord, UrbsRecord,
    };
    pub use crate::partition::{
        partition, Partition, PartitionParams, Subcatchment,
    };
    pub use crate::pipeline::{delineate, Delineation};
    pub use catchflow_core::prelude::*;
}
