//! End-to-end delineation pipeline
//!
//! Runs the stages strictly in order, each consuming the previous
//! stage's immutable output:
//!
//! 1. outlet carving (the only in-place DEM mutation)
//! 2. flow direction
//! 3. flow accumulation (area-weighted)
//! 4. subcatchment partitioning
//! 5. channel network extraction
//! 6. model output assembly
//!
//! Configuration is validated before the grid is touched; a failing stage
//! fails the whole run, no partial results survive.

use tracing::info;

use catchflow_core::{Raster, Result};

use crate::channel::{extract_channels, ChannelParams, Reach};
use crate::config::DelineationParams;
use crate::flow_accumulation::{
    flow_accumulation, AccumulationParams, AccumulationWeight,
};
use crate::flow_direction::{flow_direction, FlowDirectionParams};
use crate::outlet::{carve_outlets, OutletSpec};
use crate::output::{assemble, ModelOutput};
use crate::partition::{partition, PartitionParams, Subcatchment};

/// Everything a delineation run produces.
#[derive(Debug, Clone)]
pub struct Delineation {
    /// D8 direction codes (0 = exit / no-data)
    pub flow_directions: Raster<u8>,
    /// Domain-exit mask (1 = exit)
    pub exits: Raster<u8>,
    /// Area-weighted flow accumulation
    pub accumulation: Raster<f64>,
    /// Subcatchment labels (id + 1; 0 = no-data)
    pub subcatchment_labels: Raster<i32>,
    /// Channel-cell mask (1 = channel)
    pub channel_cells: Raster<u8>,
    /// Subcatchment arena, indexed by id
    pub subcatchments: Vec<Subcatchment>,
    /// One reach per subcatchment, indexed by id
    pub reaches: Vec<Reach>,
    /// Records in the selected model's schema
    pub output: ModelOutput,
}

/// Delineate catchments and the routing network from an elevation grid.
///
/// Takes the DEM by value: outlet carving mutates it in place before any
/// flow computation, and the pipeline owns the grid for the run.
pub fn delineate(
    mut dem: Raster<f64>,
    outlets: &OutletSpec,
    params: &DelineationParams,
) -> Result<Delineation> {
    params.validate(dem.transform())?;
    let config = params.model_config();

    let (rows, cols) = dem.shape();
    info!(
        model = params.model.name(),
        rows,
        cols,
        target_area = params.target_area,
        "delineation started"
    );

    carve_outlets(&mut dem, outlets, &params.carve)?;

    let field = flow_direction(
        &dem,
        outlets,
        FlowDirectionParams {
            pit_policy: params.pit_policy,
        },
    )?;
    info!("flow direction assigned");

    let accumulation = flow_accumulation(
        &dem,
        &field,
        AccumulationParams {
            weight: AccumulationWeight::Area,
        },
    )?;
    info!("flow accumulation resolved");

    let parts = partition(
        &dem,
        &field,
        &accumulation,
        PartitionParams {
            target_area: params.target_area,
            min_split_area: params.min_split_area,
        },
    )?;
    info!(subcatchments = parts.subcatchments.len(), "partitioning done");

    let network = extract_channels(
        &dem,
        &field,
        &accumulation,
        &parts,
        ChannelParams {
            threshold: config.channel_threshold,
            min_slope: config.min_slope,
        },
    )?;
    info!(reaches = network.reaches.len(), "channel network extracted");

    let output = assemble(params.model, &parts, &network.reaches, &config)?;
    info!("model records assembled");

    Ok(Delineation {
        flow_directions: field.directions,
        exits: field.exits,
        accumulation,
        subcatchment_labels: parts.labels,
        channel_cells: network.channel_cells,
        subcatchments: parts.subcatchments,
        reaches: network.reaches,
        output,
    })
}
