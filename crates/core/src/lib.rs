//! # Catchflow Core
//!
//! Core types for the catchflow catchment delineation library.
//!
//! This crate provides:
//! - `Raster<T>`: generic in-memory raster grid
//! - `GeoTransform`: affine transformation for georeferencing
//! - `RasterElement`: trait bounding raster cell types
//! - `d8`: the D8 direction tables shared by every traversal
//! - Polyline rasterization for outlet lines
//! - The workspace error type

pub mod error;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{d8, GeoTransform, Raster, RasterElement};
    pub use crate::vector::rasterize_polyline;
}
