//! Adaptive subcatchment partitioning
//!
//! Splits the flow forest into area-bounded subcatchments. Growth starts
//! at each domain-exit root and walks upstream; a subcatchment keeps
//! absorbing member cells until the next cell would push it over the
//! target area, at which point a child subcatchment opens at the branch.
//! Child/parent links mirror the flow forest coarsened to subcatchment
//! granularity: every subcatchment has at most one downstream neighbor.
//!
//! Subcatchments live in an arena indexed by integer id; the label grid
//! stores id + 1 with 0 for unlabeled (no-data) cells.

use std::collections::VecDeque;

use ndarray::Array2;
use serde::Serialize;
use tracing::warn;

use catchflow_core::{Error, Raster, Result};

use crate::flow_direction::FlowField;

/// A bounded drainage sub-unit with one outlet cell and at most one
/// downstream subcatchment. Immutable once partitioning finishes.
#[derive(Debug, Clone, Serialize)]
pub struct Subcatchment {
    /// Arena index; the label grid stores `id + 1`
    pub id: usize,
    /// Representative outlet cell (most downstream member)
    pub outlet: (usize, usize),
    /// Downstream subcatchment id; `None` for roots draining off-domain
    pub downstream: Option<usize>,
    /// Upstream subcatchment ids (0..N children)
    pub upstream: Vec<usize>,
    /// Aggregate member area in map units
    pub area: f64,
    /// Number of member cells
    pub cell_count: usize,
}

/// Partition result: label grid plus the subcatchment arena.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Subcatchment labels (id + 1); 0 = no-data / unlabeled
    pub labels: Raster<i32>,
    pub subcatchments: Vec<Subcatchment>,
}

impl Partition {
    /// Subcatchment id of a cell; `None` for unlabeled or out-of-bounds
    pub fn id_at(&self, row: usize, col: usize) -> Option<usize> {
        let label = self.labels.get(row, col).ok()?;
        if label > 0 {
            Some(label as usize - 1)
        } else {
            None
        }
    }
}

/// Parameters for partitioning
#[derive(Debug, Clone, Copy)]
pub struct PartitionParams {
    /// Target subcatchment area (map units)
    pub target_area: f64,
    /// Minimum subtree area for opening a new child at a full branch;
    /// smaller remainders join the current subcatchment instead,
    /// preferring one oversized piece over two undersized ones.
    /// 0.0 disables the guard.
    pub min_split_area: f64,
}

/// Partition the flow forest into area-bounded subcatchments.
///
/// `accumulation` must be area-weighted (same units as
/// `params.target_area`). A target below the area of a cell pair cannot
/// produce any meaningful split; it is reported and the run falls back to
/// one unsplit subcatchment per root.
pub fn partition(
    dem: &Raster<f64>,
    field: &FlowField,
    accumulation: &Raster<f64>,
    params: PartitionParams,
) -> Result<Partition> {
    let (rows, cols) = dem.shape();
    if field.shape() != (rows, cols) || accumulation.shape() != (rows, cols) {
        let (ar, ac) = field.shape();
        return Err(Error::SizeMismatch { er: rows, ec: cols, ar, ac });
    }

    let cell_area = dem.cell_area();
    let splitting = if params.target_area < 2.0 * cell_area {
        warn!(
            target_area = params.target_area,
            cell_area, "target below cell-pair area; emitting one subcatchment per root"
        );
        false
    } else {
        true
    };

    let mut labels = Array2::<i32>::zeros((rows, cols));
    let mut subcatchments: Vec<Subcatchment> = Vec::new();
    let mut queue: VecDeque<((usize, usize), usize)> = VecDeque::new();

    // Roots in row-major order keep the labeling reproducible
    for row in 0..rows {
        for col in 0..cols {
            if !field.is_exit(row, col) || dem.is_nodata_at(row, col) {
                continue;
            }
            let id = subcatchments.len();
            subcatchments.push(Subcatchment {
                id,
                outlet: (row, col),
                downstream: None,
                upstream: Vec::new(),
                area: cell_area,
                cell_count: 1,
            });
            labels[(row, col)] = (id + 1) as i32;
            queue.push_back(((row, col), id));
        }
    }

    while let Some(((row, col), sid)) = queue.pop_front() {
        for (ur, uc) in field.upstream(row, col) {
            if labels[(ur, uc)] != 0 || dem.is_nodata_at(ur, uc) {
                continue;
            }

            let fits = subcatchments[sid].area + cell_area <= params.target_area;
            if !splitting || fits {
                labels[(ur, uc)] = (sid + 1) as i32;
                subcatchments[sid].area += cell_area;
                subcatchments[sid].cell_count += 1;
                queue.push_back(((ur, uc), sid));
                continue;
            }

            // Current subcatchment is full. Open a child at the branch
            // unless the remaining subtree is below the viable minimum.
            let subtree_area = unsafe { accumulation.get_unchecked(ur, uc) };
            if subtree_area >= params.min_split_area {
                let id = subcatchments.len();
                subcatchments.push(Subcatchment {
                    id,
                    outlet: (ur, uc),
                    downstream: Some(sid),
                    upstream: Vec::new(),
                    area: cell_area,
                    cell_count: 1,
                });
                subcatchments[sid].upstream.push(id);
                labels[(ur, uc)] = (id + 1) as i32;
                queue.push_back(((ur, uc), id));
            } else {
                labels[(ur, uc)] = (sid + 1) as i32;
                subcatchments[sid].area += cell_area;
                subcatchments[sid].cell_count += 1;
                queue.push_back(((ur, uc), sid));
            }
        }
    }

    // Every valid cell drains to some exit, so the upstream walk must
    // have labeled all of them.
    let labeled = labels.iter().filter(|&&l| l != 0).count();
    let valid = dem.valid_count();
    if labeled != valid {
        return Err(Error::Partition(format!(
            "{} of {} valid cells labeled",
            labeled, valid
        )));
    }

    let mut label_raster = dem.with_same_meta::<i32>(rows, cols);
    label_raster.set_nodata(Some(0));
    *label_raster.data_mut() = labels;

    Ok(Partition {
        labels: label_raster,
        subcatchments,
    })
}
