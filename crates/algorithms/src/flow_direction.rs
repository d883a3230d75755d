//! D8 flow direction with domain exits and deterministic flat resolution
//!
//! Assigns each valid cell one of 8 discrete flow directions (steepest
//! descent, dx/dy-weighted) or marks it as a domain exit. The result is a
//! forest: every non-exit cell has exactly one downstream neighbor of
//! lower-or-equal elevation, and every path terminates at an exit.
//!
//! Exits come from three sources:
//! - rasterized outlet cells (always exits, whatever their elevation),
//! - boundary or no-data-adjacent cells that nothing in-grid can drain,
//! - interior pits tolerated as synthetic exits under
//!   [`PitPolicy::SyntheticExit`].
//!
//! Ties on steepest slope are broken by the fixed scan order
//! ([`d8::SCAN_ORDER`]: cardinal before diagonal, clockwise from north).
//! Flat regions are resolved by a BFS from all draining cells across
//! equal elevation, i.e. each flat cell flows toward its nearest
//! already-draining neighbor; seeds are enqueued in row-major order so
//! the resolution is reproducible.

use std::collections::VecDeque;

use ndarray::Array2;
use tracing::{debug, warn};

use catchflow_core::raster::d8;
use catchflow_core::{Error, Raster, Result};

use crate::config::PitPolicy;
use crate::maybe_rayon::*;
use crate::outlet::OutletSpec;

/// Per-cell flow directions plus the domain-exit mask.
#[derive(Debug, Clone)]
pub struct FlowField {
    /// Direction codes (0 = no outgoing flow; exits and no-data)
    pub directions: Raster<u8>,
    /// 1 where the cell is a domain exit, 0 elsewhere
    pub exits: Raster<u8>,
}

impl FlowField {
    pub fn shape(&self) -> (usize, usize) {
        self.directions.shape()
    }

    /// Direction code at (row, col); 0 for exits, no-data and
    /// out-of-bounds queries
    pub fn direction(&self, row: usize, col: usize) -> u8 {
        self.directions.get(row, col).unwrap_or(0)
    }

    pub fn is_exit(&self, row: usize, col: usize) -> bool {
        matches!(self.exits.get(row, col), Ok(1))
    }

    /// The cell this cell drains into, if it has an outgoing direction
    pub fn downstream(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        let dir = self.direction(row, col);
        if dir == 0 {
            return None;
        }
        let (dr, dc) = d8::offset(dir);
        Some(((row as isize + dr) as usize, (col as isize + dc) as usize))
    }

    /// Cells draining directly into (row, col), in scan order
    pub fn upstream(&self, row: usize, col: usize) -> Vec<(usize, usize)> {
        let (rows, cols) = self.shape();
        let mut result = Vec::new();
        for &dir in &d8::SCAN_ORDER {
            let (dr, dc) = d8::offset(dir);
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if self.direction(nr, nc) == d8::opposite(dir) {
                result.push((nr, nc));
            }
        }
        result
    }
}

/// Parameters for flow direction assignment
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowDirectionParams {
    /// Handling of interior cells no drainage can reach
    pub pit_policy: PitPolicy,
}

/// Assign D8 flow directions over a prepared (carved) DEM.
///
/// `outlets` cells are forced to domain exits. Interior pits fail the run
/// under the default [`PitPolicy::Fail`]; see module docs for the full
/// exit and flat-resolution rules.
pub fn flow_direction(
    dem: &Raster<f64>,
    outlets: &OutletSpec,
    params: FlowDirectionParams,
) -> Result<FlowField> {
    let (rows, cols) = dem.shape();
    let dx = dem.cell_width();
    let dy = dem.cell_height();

    let mut exits = Array2::<bool>::from_elem((rows, cols), false);
    for (row, col) in outlets.cell_set() {
        if row < rows && col < cols && !dem.is_nodata_at(row, col) {
            exits[(row, col)] = true;
        }
    }

    // Pass 1: steepest strict descent per cell. Rows are independent, so
    // this scan parallelizes freely.
    let directions_flat: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for col in 0..cols {
                if dem.is_nodata_at(row, col) || exits[(row, col)] {
                    continue;
                }
                let center = unsafe { dem.get_unchecked(row, col) };

                let mut best_slope = 0.0_f64;
                let mut best_dir = 0u8;
                for &dir in &d8::SCAN_ORDER {
                    let (dr, dc) = d8::offset(dir);
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if dem.is_nodata_at(nr, nc) {
                        continue;
                    }
                    let neighbor = unsafe { dem.get_unchecked(nr, nc) };
                    let slope = (center - neighbor) / d8::step_distance(dir, dx, dy);
                    // Strict > keeps the first direction in scan order on ties
                    if slope > best_slope {
                        best_slope = slope;
                        best_dir = dir;
                    }
                }
                row_data[col] = best_dir;
            }
            row_data
        })
        .collect();

    let mut directions = Array2::from_shape_vec((rows, cols), directions_flat)
        .map_err(|e| Error::Other(e.to_string()))?;

    let mut resolved = Array2::<bool>::from_elem((rows, cols), false);
    for row in 0..rows {
        for col in 0..cols {
            if directions[(row, col)] != 0 || exits[(row, col)] {
                resolved[(row, col)] = true;
            }
        }
    }

    // Passes 2..: flat resolution, then promote undrainable boundary
    // cells to exits and resolve again, until a fixed point.
    loop {
        resolve_flats(dem, &mut directions, &mut resolved, &exits);

        let mut promoted = 0usize;
        for row in 0..rows {
            for col in 0..cols {
                if resolved[(row, col)] || dem.is_nodata_at(row, col) {
                    continue;
                }
                if touches_domain_edge(dem, row, col) {
                    exits[(row, col)] = true;
                    resolved[(row, col)] = true;
                    promoted += 1;
                }
            }
        }
        if promoted == 0 {
            break;
        }
        debug!(promoted, "promoted undrainable edge cells to domain exits");
    }

    // Whatever is still unresolved is an interior pit
    let mut pits = 0usize;
    loop {
        let first_pit = first_unresolved(dem, &resolved);
        let Some((row, col)) = first_pit else { break };

        match params.pit_policy {
            PitPolicy::Fail => return Err(Error::UnresolvedPit { row, col }),
            PitPolicy::SyntheticExit => {
                exits[(row, col)] = true;
                resolved[(row, col)] = true;
                pits += 1;
                // The new exit may drain a whole flat depression
                resolve_flats(dem, &mut directions, &mut resolved, &exits);
            }
        }
    }
    if pits > 0 {
        warn!(pits, "tolerated interior pits as synthetic exits");
    }

    let mut dir_raster = dem.with_same_meta::<u8>(rows, cols);
    *dir_raster.data_mut() = directions;

    let mut exit_raster = dem.with_same_meta::<u8>(rows, cols);
    *exit_raster.data_mut() = exits.mapv(u8::from);

    Ok(FlowField {
        directions: dir_raster,
        exits: exit_raster,
    })
}

/// Drain flat regions: BFS from every draining (resolved) cell across
/// unresolved neighbors of greater-or-equal elevation, pointing each flat
/// cell at its BFS parent. Row-major seeding and fixed neighbor order
/// make the result deterministic.
fn resolve_flats(
    dem: &Raster<f64>,
    directions: &mut Array2<u8>,
    resolved: &mut Array2<bool>,
    exits: &Array2<bool>,
) {
    let (rows, cols) = dem.shape();
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    for row in 0..rows {
        for col in 0..cols {
            if resolved[(row, col)] && !dem.is_nodata_at(row, col) {
                queue.push_back((row, col));
            }
        }
    }

    while let Some((row, col)) = queue.pop_front() {
        let center = unsafe { dem.get_unchecked(row, col) };
        for &dir in &d8::SCAN_ORDER {
            let (dr, dc) = d8::offset(dir);
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if resolved[(nr, nc)] || exits[(nr, nc)] || dem.is_nodata_at(nr, nc) {
                continue;
            }
            let neighbor = unsafe { dem.get_unchecked(nr, nc) };
            // Flow may only cross to lower-or-equal terrain
            if center <= neighbor {
                directions[(nr, nc)] = d8::opposite(dir);
                resolved[(nr, nc)] = true;
                queue.push_back((nr, nc));
            }
        }
    }
}

/// Whether the cell sits on the array boundary or next to a no-data hole
fn touches_domain_edge(dem: &Raster<f64>, row: usize, col: usize) -> bool {
    let (rows, cols) = dem.shape();
    if row == 0 || col == 0 || row == rows - 1 || col == cols - 1 {
        return true;
    }
    for &dir in &d8::SCAN_ORDER {
        let (dr, dc) = d8::offset(dir);
        if dem.is_nodata_at((row as isize + dr) as usize, (col as isize + dc) as usize) {
            return true;
        }
    }
    false
}

/// First unresolved valid cell in row-major order
fn first_unresolved(dem: &Raster<f64>, resolved: &Array2<bool>) -> Option<(usize, usize)> {
    let (rows, cols) = dem.shape();
    for row in 0..rows {
        for col in 0..cols {
            if !resolved[(row, col)] && !dem.is_nodata_at(row, col) {
                return Some((row, col));
            }
        }
    }
    None
}
