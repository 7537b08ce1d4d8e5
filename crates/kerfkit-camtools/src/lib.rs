//! CAM tooling for KerfKit: turns design content into executable cutcode.
//!
//! A [`LaserOperation`] pairs a kind (cut, engrave, raster, image, dots,
//! hatch) with the nodes it consumes and a shared settings handle, and
//! [`LaserOperation::compile`] lowers it into the cut objects of
//! `kerfkit-core`. Vector kinds walk path segments directly; raster
//! kinds go through the [`RasterCompiler`] render/trim/resample
//! pipeline.

pub mod error;
pub mod operation;
pub mod raster;

pub use error::{CompileError, CompileResult};
pub use operation::{ImageNode, LaserOperation, OpKind, OpNode, PathNode};
pub use raster::RasterCompiler;
