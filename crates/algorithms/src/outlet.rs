//! Outlet line preparation
//!
//! User-supplied outlet polylines are rasterized onto the grid and
//! optionally "carved": elevations along the lines are lowered so that
//! the drainage pattern aligns with the drawn outlets. Every rasterized
//! outlet cell becomes a domain exit regardless of its elevation.
//!
//! Carving is the only in-place mutation of the elevation grid and runs
//! strictly before flow-direction computation.

use std::collections::HashSet;

use geo_types::LineString;

use catchflow_core::raster::d8;
use catchflow_core::vector::rasterize_polyline;
use catchflow_core::{Raster, Result};

use crate::config::CarveParams;

/// Rasterized outlet lines: ordered cell runs, one per input line.
#[derive(Debug, Clone, Default)]
pub struct OutletSpec {
    runs: Vec<Vec<(usize, usize)>>,
}

impl OutletSpec {
    /// No outlets; exits come from grid boundaries and no-data edges only.
    pub fn none() -> Self {
        Self::default()
    }

    /// Rasterize geo-space outlet lines onto a grid.
    pub fn from_lines(dem: &Raster<f64>, lines: &[LineString<f64>]) -> Self {
        let (rows, cols) = dem.shape();
        let runs = lines
            .iter()
            .map(|line| rasterize_polyline(dem.transform(), rows, cols, line))
            .filter(|run| !run.is_empty())
            .collect();
        Self { runs }
    }

    /// Use pre-rasterized cell runs (for callers that rasterize upstream).
    pub fn from_cells(runs: Vec<Vec<(usize, usize)>>) -> Self {
        Self {
            runs: runs.into_iter().filter(|r| !r.is_empty()).collect(),
        }
    }

    /// Iterate the per-line cell runs
    pub fn runs(&self) -> &[Vec<(usize, usize)>] {
        &self.runs
    }

    /// All outlet cells, deduplicated across lines
    pub fn cell_set(&self) -> HashSet<(usize, usize)> {
        self.runs.iter().flatten().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Lower elevations along outlet lines to force drainage alignment.
///
/// Each outlet cell ends up below the minimum of its *original* valid
/// neighbors by `carve.depth`, and successive cells along a line are
/// forced monotonically non-increasing, so flow traced later follows the
/// drawn line. Cells already lower than both targets keep their
/// elevation. No-data outlet cells are skipped.
pub fn carve_outlets(
    dem: &mut Raster<f64>,
    outlets: &OutletSpec,
    carve: &CarveParams,
) -> Result<()> {
    if !carve.enabled || outlets.is_empty() {
        return Ok(());
    }

    let (rows, cols) = dem.shape();
    // Neighbor minima come from the pre-carve surface
    let original = dem.clone();

    for run in outlets.runs() {
        let mut running_floor = f64::INFINITY;

        for &(row, col) in run {
            let current = dem.get(row, col)?;
            if dem.is_nodata(current) {
                continue;
            }

            let mut neighbor_min = f64::INFINITY;
            for &dir in &d8::SCAN_ORDER {
                let (dr, dc) = d8::offset(dir);
                let nr = row as isize + dr;
                let nc = col as isize + dc;
                if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                    continue;
                }
                let value = unsafe { original.get_unchecked(nr as usize, nc as usize) };
                if original.is_nodata(value) {
                    continue;
                }
                neighbor_min = neighbor_min.min(value);
            }

            let mut target = current;
            if neighbor_min.is_finite() {
                target = target.min(neighbor_min - carve.depth);
            }
            if running_floor.is_finite() {
                target = target.min(running_floor);
            }

            dem.set(row, col, target)?;
            running_floor = target - carve.depth;
        }
    }

    Ok(())
}
