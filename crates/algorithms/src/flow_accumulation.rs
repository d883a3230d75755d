//! Flow accumulation over the D8 flow forest
//!
//! Propagates contributing drainage upstream-to-downstream. Each cell's
//! accumulation is its own weight (one cell, or one cell area) plus the
//! accumulation of every direct upstream contributor, so a domain exit
//! carries the total contribution of its tree.
//!
//! The primary traversal uses an explicit priority queue keyed by
//! elevation (highest first, ties by insertion sequence); a cell enters
//! the queue only once all of its contributors are resolved, so the
//! topological precondition can never be violated. The batched variant
//! processes ready cells level by level: all cells ready at the same time
//! are mutually independent, so their contributions may be computed in
//! any order or in parallel, and are then applied in a fixed sequence.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::Array2;
use tracing::debug;

use catchflow_core::{Error, Raster, Result};

use crate::flow_direction::FlowField;
use crate::maybe_rayon::*;

/// What a single cell contributes to its own accumulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccumulationWeight {
    /// Each cell counts 1 (contributing cell count)
    #[default]
    CellCount,
    /// Each cell counts dx * dy (contributing area in map units)
    Area,
}

/// Parameters for flow accumulation
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumulationParams {
    pub weight: AccumulationWeight,
}

/// A cell ready for processing, ordered by elevation (max-heap), ties by
/// insertion sequence so the traversal is reproducible.
#[derive(Debug, Clone)]
struct ReadyCell {
    elevation: f64,
    seq: u64,
    row: usize,
    col: usize,
}

impl PartialEq for ReadyCell {
    fn eq(&self, other: &Self) -> bool {
        self.elevation == other.elevation && self.seq == other.seq
    }
}

impl Eq for ReadyCell {}

impl PartialOrd for ReadyCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyCell {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher elevation first; earlier insertion wins ties
        self.elevation
            .partial_cmp(&other.elevation)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Calculate flow accumulation with the elevation-keyed priority
/// traversal.
///
/// No-data cells hold NaN in the output. Fails if the direction graph
/// turns out not to be a forest (a cycle leaves cells unprocessed).
pub fn flow_accumulation(
    dem: &Raster<f64>,
    field: &FlowField,
    params: AccumulationParams,
) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();
    check_shapes(dem, field)?;
    let weight = cell_weight(dem, params.weight);

    let (mut acc, mut in_degree, valid) = seed(dem, field, weight);

    let mut heap: BinaryHeap<ReadyCell> = BinaryHeap::new();
    let mut seq = 0u64;
    for row in 0..rows {
        for col in 0..cols {
            if valid[(row, col)] && in_degree[(row, col)] == 0 {
                heap.push(ReadyCell {
                    elevation: unsafe { dem.get_unchecked(row, col) },
                    seq,
                    row,
                    col,
                });
                seq += 1;
            }
        }
    }

    let mut processed = 0usize;
    while let Some(cell) = heap.pop() {
        processed += 1;
        let Some((dr, dc)) = field.downstream(cell.row, cell.col) else {
            continue;
        };
        acc[(dr, dc)] += acc[(cell.row, cell.col)];
        in_degree[(dr, dc)] -= 1;
        if in_degree[(dr, dc)] == 0 {
            heap.push(ReadyCell {
                elevation: unsafe { dem.get_unchecked(dr, dc) },
                seq,
                row: dr,
                col: dc,
            });
            seq += 1;
        }
    }

    finish(dem, field, acc, processed, &valid)
}

/// Calculate flow accumulation in independent ready-batches.
///
/// All cells ready at the same level share no ancestor/descendant
/// relationship, so the per-cell work runs under `maybe_rayon`;
/// contributions are applied in batch order, keeping the output
/// deterministic.
pub fn flow_accumulation_batched(
    dem: &Raster<f64>,
    field: &FlowField,
    params: AccumulationParams,
) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();
    check_shapes(dem, field)?;
    let weight = cell_weight(dem, params.weight);

    let (mut acc, mut in_degree, valid) = seed(dem, field, weight);

    let mut batch: Vec<(usize, usize)> = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            if valid[(row, col)] && in_degree[(row, col)] == 0 {
                batch.push((row, col));
            }
        }
    }

    let mut processed = 0usize;
    let mut levels = 0usize;
    while !batch.is_empty() {
        processed += batch.len();
        levels += 1;

        // Ready cells are independent: their accumulations are final and
        // none drains into another member of the batch.
        let contributions: Vec<Option<((usize, usize), f64)>> = batch
            .par_iter()
            .map(|&(row, col)| {
                field
                    .downstream(row, col)
                    .map(|target| (target, acc[(row, col)]))
            })
            .collect();

        let mut next: Vec<(usize, usize)> = Vec::new();
        for contribution in contributions.into_iter().flatten() {
            let (target, value) = contribution;
            acc[target] += value;
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                next.push(target);
            }
        }
        batch = next;
    }
    debug!(levels, "accumulation ready-batches drained");

    finish(dem, field, acc, processed, &valid)
}

fn check_shapes(dem: &Raster<f64>, field: &FlowField) -> Result<()> {
    if dem.shape() != field.shape() {
        let (er, ec) = dem.shape();
        let (ar, ac) = field.shape();
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }
    Ok(())
}

fn cell_weight(dem: &Raster<f64>, weight: AccumulationWeight) -> f64 {
    match weight {
        AccumulationWeight::CellCount => 1.0,
        AccumulationWeight::Area => dem.cell_area(),
    }
}

/// Initial accumulation (own weight), in-degree of every cell, and the
/// validity mask.
fn seed(
    dem: &Raster<f64>,
    field: &FlowField,
    weight: f64,
) -> (Array2<f64>, Array2<u32>, Array2<bool>) {
    let (rows, cols) = dem.shape();
    let mut acc = Array2::<f64>::from_elem((rows, cols), f64::NAN);
    let mut in_degree = Array2::<u32>::zeros((rows, cols));
    let mut valid = Array2::<bool>::from_elem((rows, cols), false);

    for row in 0..rows {
        for col in 0..cols {
            if dem.is_nodata_at(row, col) {
                continue;
            }
            valid[(row, col)] = true;
            acc[(row, col)] = weight;
        }
    }
    for row in 0..rows {
        for col in 0..cols {
            if !valid[(row, col)] {
                continue;
            }
            if let Some(target) = field.downstream(row, col) {
                in_degree[target] += 1;
            }
        }
    }
    (acc, in_degree, valid)
}

fn finish(
    dem: &Raster<f64>,
    field: &FlowField,
    acc: Array2<f64>,
    processed: usize,
    valid: &Array2<bool>,
) -> Result<Raster<f64>> {
    let expected = valid.iter().filter(|&&v| v).count();
    if processed != expected {
        // Left-over cells mean the direction graph has a cycle; the run
        // must fail whole rather than emit a partially resolved grid.
        return Err(Error::Other(format!(
            "flow-direction graph is not a forest: {} of {} cells resolved",
            processed, expected
        )));
    }

    let (rows, cols) = field.shape();
    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = acc;
    Ok(output)
}
