//! Raster data structures and the shared D8 direction tables

pub mod d8;
mod element;
mod geotransform;
mod grid;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
