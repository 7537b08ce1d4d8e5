//! Laser operations and their compilation entry point.
//!
//! A [`LaserOperation`] is a typed group of op-nodes (vector paths and
//! images) plus one shared settings record. [`LaserOperation::compile`]
//! dispatches on the operation kind: vector kinds decompose paths into
//! line/quad cuts, raster kinds hand content to the raster compiler.
//! Compilation is a pure function of its inputs at call time and may be
//! repeated; the resulting CutCode is always transient.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use kerfkit_core::{
    CutCode, CutObject, LaserSettings, LineCut, QuadCut, RasterDirection, Segment, SharedSettings,
    VectorPath,
};

use crate::error::{CompileError, CompileResult};
use crate::raster::RasterCompiler;

/// Step size used for an image node that carries no usable step attribute.
pub const DEFAULT_IMAGE_STEP: u32 = 1;

/// The kind of laser work an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpKind {
    /// Vector cut along path outlines.
    Cut,
    /// Vector engrave along path outlines.
    Engrave,
    /// One raster pass over the composited content of all op-nodes.
    Raster,
    /// One independent raster pass per image op-node.
    Image,
    /// Dot firing along path segments.
    Dots,
    /// Hatch fill passes, grouped per source node.
    Hatch,
    /// No kind assigned yet; compiles to nothing.
    #[default]
    Unset,
}

/// An RGB paint color for raster rendering of vector content.
pub type Rgb = [u8; 3];

/// A vector path op-node with optional paint attributes.
///
/// Paint only matters to raster compilation: an unpainted path marks no
/// pixels on the canvas, though it still cuts and engraves as vectors.
#[derive(Debug, Clone)]
pub struct PathNode {
    pub path: VectorPath,
    pub stroke: Option<Rgb>,
    pub fill: Option<Rgb>,
}

impl PathNode {
    pub fn new(path: VectorPath) -> Self {
        Self {
            path,
            stroke: None,
            fill: None,
        }
    }

    pub fn with_fill(mut self, fill: Rgb) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: Rgb) -> Self {
        self.stroke = Some(stroke);
        self
    }
}

/// An image op-node: a pixel buffer placed at a device-space position,
/// with a free-form attribute map in the legacy string encoding.
#[derive(Debug, Clone)]
pub struct ImageNode {
    pub image: RgbaImage,
    /// Device-space X of the image's left edge.
    pub x: f64,
    /// Device-space Y of the image's top edge.
    pub y: f64,
    /// Free-form attributes (`raster_step`, `raster_direction`, ...).
    pub values: BTreeMap<String, String>,
}

impl ImageNode {
    pub fn new(image: RgbaImage, x: f64, y: f64) -> Self {
        Self {
            image,
            x,
            y,
            values: BTreeMap::new(),
        }
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_value(key, value);
        self
    }

    /// The image's own step size, defaulting to [`DEFAULT_IMAGE_STEP`]
    /// when the attribute is missing, non-numeric, zero, or negative.
    pub fn resolved_step(&self) -> u32 {
        self.values
            .get("raster_step")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v > 0)
            .map(|v| v as u32)
            .unwrap_or(DEFAULT_IMAGE_STEP)
    }

    /// The image's own raster direction, if it carries a valid one.
    pub fn raster_direction(&self) -> Option<RasterDirection> {
        self.values
            .get("raster_direction")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .and_then(RasterDirection::from_code)
    }
}

/// A reference to a single element participating in an operation.
#[derive(Debug, Clone)]
pub enum OpNode {
    Path(PathNode),
    Image(ImageNode),
}

impl From<PathNode> for OpNode {
    fn from(node: PathNode) -> Self {
        OpNode::Path(node)
    }
}

impl From<ImageNode> for OpNode {
    fn from(node: ImageNode) -> Self {
        OpNode::Image(node)
    }
}

impl From<VectorPath> for OpNode {
    fn from(path: VectorPath) -> Self {
        OpNode::Path(PathNode::new(path))
    }
}

/// A typed group of op-nodes plus one shared settings record.
#[derive(Debug, Clone)]
pub struct LaserOperation {
    pub kind: OpKind,
    nodes: Vec<OpNode>,
    pub settings: SharedSettings,
}

impl LaserOperation {
    pub fn new(kind: OpKind) -> Self {
        Self::with_settings(kind, LaserSettings::default())
    }

    pub fn with_settings(kind: OpKind, settings: LaserSettings) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            settings: settings.into_shared(),
        }
    }

    pub fn add(&mut self, node: impl Into<OpNode>) {
        self.nodes.push(node.into());
    }

    pub fn nodes(&self) -> &[OpNode] {
        &self.nodes
    }

    /// Compile this operation into a fresh CutCode.
    ///
    /// Vector kinds decompose each path op-node into line/quad cuts that
    /// share the operation's settings handle; nodes of an irrelevant type
    /// are silently skipped. `Raster` composites every op-node onto one
    /// canvas and requires the operation-level step. `Image` compiles each
    /// image independently with the image's own step, ignoring the
    /// operation-level step entirely. `Unset` compiles to an empty
    /// CutCode.
    pub fn compile(&self) -> CompileResult<CutCode> {
        debug!(kind = ?self.kind, nodes = self.nodes.len(), "compiling operation");
        match self.kind {
            OpKind::Cut | OpKind::Engrave | OpKind::Dots => {
                let mut code = CutCode::new();
                for node in &self.nodes {
                    if let OpNode::Path(path_node) = node {
                        code.extend(self.extract_segments(&path_node.path));
                    }
                }
                Ok(code)
            }
            OpKind::Hatch => {
                let mut code = CutCode::new();
                for node in &self.nodes {
                    if let OpNode::Path(path_node) = node {
                        let cuts: Vec<CutObject> =
                            self.extract_segments(&path_node.path).collect();
                        if !cuts.is_empty() {
                            code.append_group(cuts);
                        }
                    }
                }
                Ok(code)
            }
            OpKind::Raster => {
                let (step, direction) = {
                    let settings = self.settings.read();
                    (settings.raster_step, settings.raster_direction)
                };
                if step == 0 {
                    return Err(CompileError::MissingRasterStep);
                }
                let cuts =
                    RasterCompiler::new(step, direction).compile(&self.nodes, &self.settings)?;
                Ok(cuts.into_iter().collect())
            }
            OpKind::Image => {
                let op_direction = self.settings.read().raster_direction;
                let mut code = CutCode::new();
                for node in &self.nodes {
                    if let OpNode::Image(image_node) = node {
                        let step = image_node.resolved_step();
                        let direction = image_node.raster_direction().unwrap_or(op_direction);
                        let cuts = RasterCompiler::new(step, direction)
                            .compile(std::slice::from_ref(node), &self.settings)?;
                        code.extend(cuts);
                    }
                }
                Ok(code)
            }
            OpKind::Unset => Ok(CutCode::new()),
        }
    }

    fn extract_segments<'a>(
        &'a self,
        path: &'a VectorPath,
    ) -> impl Iterator<Item = CutObject> + 'a {
        path.segments().map(move |segment| match segment {
            Segment::Line { start, end } => {
                CutObject::Line(LineCut::new(start, end, self.settings.clone()))
            }
            Segment::Quad { start, ctrl, end } => {
                CutObject::Quad(QuadCut::new(start, ctrl, end, self.settings.clone()))
            }
        })
    }
}
