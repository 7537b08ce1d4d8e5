//! Primitive motion units emitted by compilation.
//!
//! Each cut object carries a clone of its operation's [`SharedSettings`]
//! handle. Raster cuts additionally hold a reference-counted grayscale
//! buffer; cross-hatch compilation clones the handle, never the pixels.

use image::GrayImage;
use std::sync::Arc;

use crate::geometry::Point;
use crate::settings::{ScanAxis, SharedSettings};

/// Number of chords used to approximate a quadratic curve's length.
const QUAD_LENGTH_CHORDS: u32 = 16;

/// A straight cut segment.
#[derive(Debug, Clone)]
pub struct LineCut {
    pub start: Point,
    pub end: Point,
    pub settings: SharedSettings,
}

impl LineCut {
    pub fn new(start: Point, end: Point, settings: SharedSettings) -> Self {
        Self {
            start,
            end,
            settings,
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// A quadratic Bezier cut segment.
#[derive(Debug, Clone)]
pub struct QuadCut {
    pub start: Point,
    pub ctrl: Point,
    pub end: Point,
    pub settings: SharedSettings,
}

impl QuadCut {
    pub fn new(start: Point, ctrl: Point, end: Point, settings: SharedSettings) -> Self {
        Self {
            start,
            ctrl,
            end,
            settings,
        }
    }

    /// Curve point at parameter `t`.
    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        Point::new(
            mt * mt * self.start.x + 2.0 * mt * t * self.ctrl.x + t * t * self.end.x,
            mt * mt * self.start.y + 2.0 * mt * t * self.ctrl.y + t * t * self.end.y,
        )
    }

    /// Arc length by chord summation.
    pub fn length(&self) -> f64 {
        let mut total = 0.0;
        let mut prev = self.start;
        for i in 1..=QUAD_LENGTH_CHORDS {
            let next = self.eval(f64::from(i) / f64::from(QUAD_LENGTH_CHORDS));
            total += prev.distance_to(&next);
            prev = next;
        }
        total
    }
}

/// A rectangular grayscale scan region addressed at a device-space
/// origin, swept at `step` pixel spacing along the tagged axis.
///
/// The pixel buffer is read-only once shared; the two cuts of a
/// cross-hatch pass hold the identical buffer instance.
#[derive(Debug, Clone)]
pub struct RasterCut {
    /// Shared grayscale buffer; 0 is darkest, 255 is background.
    pub image: Arc<GrayImage>,
    /// Device-space X of the buffer's left edge.
    pub tx: f64,
    /// Device-space Y of the buffer's top edge.
    pub ty: f64,
    /// Scan spacing in device pixels per buffer pixel.
    pub step: u32,
    /// Which axis this pass sweeps along.
    pub axis: ScanAxis,
    pub settings: SharedSettings,
}

impl RasterCut {
    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// True when both cuts scan the identical buffer instance.
    pub fn shares_buffer_with(&self, other: &RasterCut) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }

    /// Total scan sweep length, rows (or columns) times extent.
    pub fn length(&self) -> f64 {
        let w = f64::from(self.width()) * f64::from(self.step);
        let h = f64::from(self.height()) * f64::from(self.step);
        match self.axis {
            ScanAxis::Horizontal => w * f64::from(self.height()),
            ScanAxis::Vertical => h * f64::from(self.width()),
        }
    }
}

/// One primitive unit of motion or scan output by compilation.
#[derive(Debug, Clone)]
pub enum CutObject {
    Line(LineCut),
    Quad(QuadCut),
    Raster(RasterCut),
}

impl CutObject {
    /// Where the laser head enters this object.
    pub fn start(&self) -> Point {
        match self {
            CutObject::Line(c) => c.start,
            CutObject::Quad(c) => c.start,
            CutObject::Raster(c) => Point::new(c.tx, c.ty),
        }
    }

    /// Where the laser head exits this object.
    pub fn end(&self) -> Point {
        match self {
            CutObject::Line(c) => c.end,
            CutObject::Quad(c) => c.end,
            CutObject::Raster(c) => Point::new(
                c.tx + f64::from(c.width()) * f64::from(c.step),
                c.ty + f64::from(c.height()) * f64::from(c.step),
            ),
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        match self {
            CutObject::Line(c) => &c.settings,
            CutObject::Quad(c) => &c.settings,
            CutObject::Raster(c) => &c.settings,
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            CutObject::Line(c) => c.length(),
            CutObject::Quad(c) => c.length(),
            CutObject::Raster(c) => c.length(),
        }
    }
}

impl From<LineCut> for CutObject {
    fn from(cut: LineCut) -> Self {
        CutObject::Line(cut)
    }
}

impl From<QuadCut> for CutObject {
    fn from(cut: QuadCut) -> Self {
        CutObject::Quad(cut)
    }
}

impl From<RasterCut> for CutObject {
    fn from(cut: RasterCut) -> Self {
        CutObject::Raster(cut)
    }
}
