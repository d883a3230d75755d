//! Channel network extraction
//!
//! Thresholds area-weighted flow accumulation to classify channel cells,
//! then builds the routing graph: one reach per subcatchment, following
//! the flow-direction path from its outlet cell to the downstream
//! subcatchment's outlet cell (or to the domain exit for roots). Reach
//! geometry is dx/dy-weighted; slopes are floored so downstream routing
//! never sees zero or negative values.

use ndarray::Array2;
use serde::Serialize;

use catchflow_core::raster::d8;
use catchflow_core::{Error, Raster, Result};

use crate::flow_direction::FlowField;
use crate::partition::Partition;

/// Parameters for channel extraction
#[derive(Debug, Clone, Copy)]
pub struct ChannelParams {
    /// Accumulation above which a cell is a channel cell (area units)
    pub threshold: f64,
    /// Floor applied to reach slopes
    pub min_slope: f64,
}

/// A channel segment routing one subcatchment into the next.
/// Read-only after extraction.
#[derive(Debug, Clone, Serialize)]
pub struct Reach {
    /// Owning (upstream) subcatchment id
    pub subcatchment: usize,
    /// Receiving subcatchment id; `None` for a domain exit
    pub downstream: Option<usize>,
    /// Along-path length in map units (0 for roots sitting on an exit)
    pub length: f64,
    /// Elevation drop over the path, clamped at 0
    pub drop: f64,
    /// Routing slope, floored at `min_slope`
    pub slope: f64,
    /// Channel cells along the path (including the outlet cell)
    pub channel_cells: usize,
    /// Total cells along the path
    pub path_cells: usize,
}

/// Channel cells plus the inter-subcatchment routing graph.
#[derive(Debug, Clone)]
pub struct ChannelNetwork {
    /// 1 = channel cell, 0 = hillslope
    pub channel_cells: Raster<u8>,
    /// One reach per subcatchment, indexed by subcatchment id
    pub reaches: Vec<Reach>,
}

/// Extract the channel network.
///
/// `accumulation` must be area-weighted, matching the model's
/// channel-threshold units.
pub fn extract_channels(
    dem: &Raster<f64>,
    field: &FlowField,
    accumulation: &Raster<f64>,
    partition: &Partition,
    params: ChannelParams,
) -> Result<ChannelNetwork> {
    let (rows, cols) = dem.shape();
    if accumulation.shape() != (rows, cols) {
        let (ar, ac) = accumulation.shape();
        return Err(Error::SizeMismatch { er: rows, ec: cols, ar, ac });
    }

    let dx = dem.cell_width();
    let dy = dem.cell_height();

    let mut mask = Array2::<u8>::zeros((rows, cols));
    for row in 0..rows {
        for col in 0..cols {
            let acc = unsafe { accumulation.get_unchecked(row, col) };
            if !acc.is_nan() && acc > params.threshold {
                mask[(row, col)] = 1;
            }
        }
    }

    let mut reaches = Vec::with_capacity(partition.subcatchments.len());
    for sub in &partition.subcatchments {
        let (start_row, start_col) = sub.outlet;

        let Some(parent) = sub.downstream else {
            // Root: the outlet cell is the domain exit itself
            reaches.push(Reach {
                subcatchment: sub.id,
                downstream: None,
                length: 0.0,
                drop: 0.0,
                slope: params.min_slope,
                channel_cells: mask[(start_row, start_col)] as usize,
                path_cells: 1,
            });
            continue;
        };

        let target = partition.subcatchments[parent].outlet;
        let mut cell = (start_row, start_col);
        let mut length = 0.0;
        let mut channel_cells = mask[cell] as usize;
        let mut path_cells = 1usize;

        while cell != target {
            let dir = field.direction(cell.0, cell.1);
            let Some(next) = field.downstream(cell.0, cell.1) else {
                return Err(Error::Other(format!(
                    "reach from subcatchment {} ended at ({}, {}) before its parent outlet",
                    sub.id, cell.0, cell.1
                )));
            };
            length += d8::step_distance(dir, dx, dy);
            cell = next;
            channel_cells += mask[cell] as usize;
            path_cells += 1;
            if path_cells > rows * cols {
                return Err(Error::Other(
                    "reach path exceeds grid size; flow field is corrupt".to_string(),
                ));
            }
        }

        let start_z = dem.get(start_row, start_col)?;
        let end_z = dem.get(target.0, target.1)?;
        let drop = (start_z - end_z).max(0.0);
        let slope = if length > 0.0 {
            (drop / length).max(params.min_slope)
        } else {
            params.min_slope
        };

        reaches.push(Reach {
            subcatchment: sub.id,
            downstream: Some(parent),
            length,
            drop,
            slope,
            channel_cells,
            path_cells,
        });
    }

    let mut channel_raster = dem.with_same_meta::<u8>(rows, cols);
    *channel_raster.data_mut() = mask;

    Ok(ChannelNetwork {
        channel_cells: channel_raster,
        reaches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow_accumulation::{
        flow_accumulation, AccumulationParams, AccumulationWeight,
    };
    use crate::flow_direction::{flow_direction, FlowDirectionParams};
    use crate::outlet::OutletSpec;
    use crate::partition::{partition, PartitionParams};
    use approx::assert_relative_eq;
    use catchflow_core::GeoTransform;

    fn dem_from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
        let mut dem = Raster::new(rows, cols);
        dem.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        for row in 0..rows {
            for col in 0..cols {
                dem.set(row, col, f(row, col)).unwrap();
            }
        }
        dem
    }

    fn network(dem: &Raster<f64>, target: f64, threshold: f64) -> (ChannelNetwork, Partition) {
        let fld = flow_direction(dem, &OutletSpec::none(), FlowDirectionParams::default()).unwrap();
        let acc = flow_accumulation(
            dem,
            &fld,
            AccumulationParams {
                weight: AccumulationWeight::Area,
            },
        )
        .unwrap();
        let part = partition(
            dem,
            &fld,
            &acc,
            PartitionParams {
                target_area: target,
                min_split_area: 0.0,
            },
        )
        .unwrap();
        let net = extract_channels(
            dem,
            &fld,
            &acc,
            &part,
            ChannelParams {
                threshold,
                min_slope: 0.0005,
            },
        )
        .unwrap();
        (net, part)
    }

    #[test]
    fn test_channel_mask_thresholding() {
        // Single column, accumulation grows downslope: only the lower
        // cells exceed the threshold
        let dem = dem_from_fn(6, 1, |row, _| (6 - row) as f64);
        let (net, _) = network(&dem, 100.0, 3.0);

        assert_eq!(net.channel_cells.get(0, 0).unwrap(), 0);
        assert_eq!(net.channel_cells.get(3, 0).unwrap(), 1); // acc = 4
        assert_eq!(net.channel_cells.get(5, 0).unwrap(), 1);
    }

    #[test]
    fn test_chain_reach_geometry() {
        // 6-cell column, target 2 cells: subcatchments {5,4} {3,2} {1,0};
        // each child reach walks 2 cardinal steps to its parent outlet
        let dem = dem_from_fn(6, 1, |row, _| (6 - row) as f64 * 2.0);
        let (net, part) = network(&dem, 2.0, 100.0);

        assert_eq!(part.subcatchments.len(), 3);
        assert_eq!(net.reaches.len(), 3);

        let root = &net.reaches[0];
        assert_eq!(root.downstream, None);
        assert_relative_eq!(root.length, 0.0);

        for reach in &net.reaches[1..] {
            assert_eq!(reach.downstream, Some(reach.subcatchment - 1));
            assert_relative_eq!(reach.length, 2.0);
            // drop = 2 units per cell * 2 cells over length 2
            assert_relative_eq!(reach.slope, 2.0);
        }
    }

    #[test]
    fn test_slope_floor() {
        // Nearly flat column: raw slope far below the floor
        let dem = dem_from_fn(6, 1, |row, _| (6 - row) as f64 * 1e-6);
        let (net, _) = network(&dem, 2.0, 100.0);

        for reach in &net.reaches {
            assert!(
                reach.slope >= 0.0005,
                "slope {} below floor",
                reach.slope
            );
        }
    }

    #[test]
    fn test_reach_indexed_by_subcatchment() {
        let dem = dem_from_fn(8, 8, |row, col| (16 - row - col) as f64);
        let (net, part) = network(&dem, 6.0, 4.0);

        assert_eq!(net.reaches.len(), part.subcatchments.len());
        for (i, reach) in net.reaches.iter().enumerate() {
            assert_eq!(reach.subcatchment, i);
        }
    }
}
