//! # KerfKit Core
//!
//! Core types for the KerfKit CutCode pipeline: laser settings, vector
//! path geometry, the cut-object primitives (line, quadratic curve,
//! raster scan), and the ordered CutCode container that downstream
//! motion controllers and preview renderers consume.
//!
//! CutCode is deliberately transient: operations are compiled into it on
//! demand and it is discarded after consumption. Settings and raster
//! buffers are shared by reference-counted handle, never deep-copied.

pub mod cutcode;
pub mod cutobject;
pub mod error;
pub mod geometry;
pub mod settings;

pub use cutcode::{CutCode, CutNode, FlatIter};
pub use cutobject::{CutObject, LineCut, QuadCut, RasterCut};
pub use error::{PathError, PathResult};
pub use geometry::{Point, Segment, VectorPath};
pub use settings::{LaserSettings, RasterDirection, ScanAxis, SharedSettings};
