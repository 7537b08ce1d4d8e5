//! Raster compilation: content to trimmed, resampled scan buffers.
//!
//! The pipeline renders the contributing op-nodes onto a white grayscale
//! canvas covering their combined nominal bounds, trims the canvas to the
//! tight bounding box of non-background pixels, resamples the trimmed
//! region at the step spacing, and emits one raster cut per scan pass.
//! Cross-hatch emits two passes over the identical buffer instance.

use image::{GrayImage, Luma, Pixel, Rgba};
use std::sync::Arc;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::trace;

use kerfkit_core::{CutObject, RasterCut, RasterDirection, ScanAxis, SharedSettings};

use crate::error::{CompileError, CompileResult};
use crate::operation::{ImageNode, OpNode, Rgb};

/// Pixels at or above this luma count as background (white/transparent)
/// and never survive trimming; this also swallows near-white
/// antialiasing residue at rendered edges.
pub const BACKGROUND_CUTOFF: u8 = 250;

/// Upper bound on canvas pixels, guarding runaway nominal bounds.
const MAX_CANVAS_PIXELS: u64 = 1 << 26;

/// Compiles a group of op-nodes into raster cuts at one step spacing.
#[derive(Debug, Clone, Copy)]
pub struct RasterCompiler {
    step: u32,
    direction: RasterDirection,
}

struct Canvas {
    image: GrayImage,
    origin_x: f64,
    origin_y: f64,
}

struct Trim {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl RasterCompiler {
    pub fn new(step: u32, direction: RasterDirection) -> Self {
        Self { step, direction }
    }

    /// Render, trim, and resample the nodes into zero, one, or two
    /// raster cuts.
    ///
    /// Zero cuts means the content was entirely background. Cross-hatch
    /// directions yield a horizontal-axis pass followed by a
    /// vertical-axis pass holding the same buffer handle.
    pub fn compile(
        &self,
        nodes: &[OpNode],
        settings: &SharedSettings,
    ) -> CompileResult<Vec<CutObject>> {
        if self.step == 0 {
            return Err(CompileError::InvalidParameters(
                "step size must be positive".to_string(),
            ));
        }

        let Some(canvas) = render_nodes(nodes)? else {
            return Ok(Vec::new());
        };
        let Some(trim) = trim_to_content(&canvas.image) else {
            trace!("raster canvas is all background, emitting nothing");
            return Ok(Vec::new());
        };

        let output = resample(&canvas.image, &trim, self.step);
        let image = Arc::new(output);
        let tx = canvas.origin_x + f64::from(trim.min_x);
        let ty = canvas.origin_y + f64::from(trim.min_y);
        trace!(
            tx,
            ty,
            width = image.width(),
            height = image.height(),
            step = self.step,
            "emitting raster cut"
        );

        let mut cuts = vec![CutObject::Raster(RasterCut {
            image: image.clone(),
            tx,
            ty,
            step: self.step,
            axis: self.direction.primary_axis(),
            settings: settings.clone(),
        })];
        if self.direction.is_crosshatch() {
            cuts.push(CutObject::Raster(RasterCut {
                image,
                tx,
                ty,
                step: self.step,
                axis: ScanAxis::Vertical,
                settings: settings.clone(),
            }));
        }
        Ok(cuts)
    }
}

/// Render every contributing node onto one white grayscale canvas.
///
/// Returns `None` when no node has usable bounds. Painted vector content
/// goes down first, then images composite over it in node order.
fn render_nodes(nodes: &[OpNode]) -> CompileResult<Option<Canvas>> {
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for node in nodes {
        let node_bounds = match node {
            OpNode::Path(path_node) => path_node.path.bounds(),
            OpNode::Image(image_node) => Some((
                image_node.x,
                image_node.y,
                image_node.x + f64::from(image_node.image.width()),
                image_node.y + f64::from(image_node.image.height()),
            )),
        };
        if let Some((nx0, ny0, nx1, ny1)) = node_bounds {
            bounds = Some(match bounds {
                None => (nx0, ny0, nx1, ny1),
                Some((x0, y0, x1, y1)) => {
                    (x0.min(nx0), y0.min(ny0), x1.max(nx1), y1.max(ny1))
                }
            });
        }
    }
    let Some((min_x, min_y, max_x, max_y)) = bounds else {
        return Ok(None);
    };

    let origin_x = min_x.floor();
    let origin_y = min_y.floor();
    let width = ((max_x.ceil() - origin_x).max(1.0)) as u32;
    let height = ((max_y.ceil() - origin_y).max(1.0)) as u32;
    if u64::from(width) * u64::from(height) > MAX_CANVAS_PIXELS {
        return Err(CompileError::InvalidParameters(format!(
            "raster canvas {}x{} exceeds the pixel budget",
            width, height
        )));
    }

    let mut gray = render_vector_layer(nodes, origin_x, origin_y, width, height)?;
    for node in nodes {
        if let OpNode::Image(image_node) = node {
            composite_image(&mut gray, image_node, origin_x, origin_y);
        }
    }

    Ok(Some(Canvas {
        image: gray,
        origin_x,
        origin_y,
    }))
}

/// Rasterize painted path nodes onto a white canvas and grayscale it.
///
/// Unpainted paths mark nothing; when no node carries paint the pixmap
/// render is skipped entirely.
fn render_vector_layer(
    nodes: &[OpNode],
    origin_x: f64,
    origin_y: f64,
    width: u32,
    height: u32,
) -> CompileResult<GrayImage> {
    let has_paint = nodes.iter().any(|node| {
        matches!(node, OpNode::Path(p) if p.fill.is_some() || p.stroke.is_some())
    });
    if !has_paint {
        return Ok(GrayImage::from_pixel(width, height, Luma([255])));
    }

    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        CompileError::RenderError(format!("pixmap allocation failed for {}x{}", width, height))
    })?;
    pixmap.fill(Color::WHITE);
    let transform = Transform::from_translate(-(origin_x as f32), -(origin_y as f32));

    for node in nodes {
        let OpNode::Path(path_node) = node else {
            continue;
        };
        if path_node.fill.is_none() && path_node.stroke.is_none() {
            continue;
        }
        let Some(sk_path) = to_skia_path(path_node.path.as_lyon()) else {
            continue;
        };
        if let Some(fill) = path_node.fill {
            pixmap.fill_path(&sk_path, &paint_for(fill), FillRule::Winding, transform, None);
        }
        if let Some(stroke_color) = path_node.stroke {
            let stroke = Stroke {
                width: 1.0,
                ..Default::default()
            };
            pixmap.stroke_path(&sk_path, &paint_for(stroke_color), &stroke, transform, None);
        }
    }

    let data = pixmap.data();
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let idx = ((y * width + x) * 4) as usize;
        Rgba([data[idx], data[idx + 1], data[idx + 2], 255]).to_luma()
    }))
}

fn paint_for(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(color[0], color[1], color[2], 255));
    paint.anti_alias = true;
    paint
}

fn to_skia_path(path: &lyon::path::Path) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for event in path.iter() {
        match event {
            lyon::path::Event::Begin { at } => pb.move_to(at.x, at.y),
            lyon::path::Event::Line { to, .. } => pb.line_to(to.x, to.y),
            lyon::path::Event::Quadratic { ctrl, to, .. } => {
                pb.quad_to(ctrl.x, ctrl.y, to.x, to.y)
            }
            lyon::path::Event::Cubic {
                ctrl1, ctrl2, to, ..
            } => pb.cubic_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y),
            lyon::path::Event::End { close, .. } => {
                if close {
                    pb.close();
                }
            }
        }
    }
    pb.finish()
}

/// Alpha-composite an image node over the canvas in luma space.
fn composite_image(canvas: &mut GrayImage, node: &ImageNode, origin_x: f64, origin_y: f64) {
    let offset_x = (node.x - origin_x).round() as i64;
    let offset_y = (node.y - origin_y).round() as i64;
    let (canvas_w, canvas_h) = (i64::from(canvas.width()), i64::from(canvas.height()));

    for (px, py, pixel) in node.image.enumerate_pixels() {
        let cx = offset_x + i64::from(px);
        let cy = offset_y + i64::from(py);
        if cx < 0 || cy < 0 || cx >= canvas_w || cy >= canvas_h {
            continue;
        }
        let Rgba([r, g, b, a]) = *pixel;
        if a == 0 {
            continue;
        }
        let src = u32::from(Rgba([r, g, b, 255]).to_luma()[0]);
        let alpha = u32::from(a);
        let dst = u32::from(canvas.get_pixel(cx as u32, cy as u32)[0]);
        let blended = (src * alpha + dst * (255 - alpha) + 127) / 255;
        canvas.put_pixel(cx as u32, cy as u32, Luma([blended as u8]));
    }
}

/// Tight bounding box of non-background pixels, or `None` when the
/// canvas holds nothing mark-able.
fn trim_to_content(image: &GrayImage) -> Option<Trim> {
    let mut trim: Option<Trim> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[0] >= BACKGROUND_CUTOFF {
            continue;
        }
        match &mut trim {
            None => {
                trim = Some(Trim {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                });
            }
            Some(t) => {
                t.min_x = t.min_x.min(x);
                t.min_y = t.min_y.min(y);
                t.max_x = t.max_x.max(x);
                t.max_y = t.max_y.max(y);
            }
        }
    }
    trim
}

/// Resample the trimmed region at `step` spacing.
///
/// Output dimensions are the ceiling of the inclusive trimmed extent
/// divided by the step. Each output pixel takes the darkest source pixel
/// of its block, which keeps intensity monotone in source darkness.
fn resample(src: &GrayImage, trim: &Trim, step: u32) -> GrayImage {
    let ext_w = trim.max_x - trim.min_x + 1;
    let ext_h = trim.max_y - trim.min_y + 1;
    let out_w = ext_w.div_ceil(step);
    let out_h = ext_h.div_ceil(step);

    GrayImage::from_fn(out_w, out_h, |ox, oy| {
        let x0 = trim.min_x + ox * step;
        let y0 = trim.min_y + oy * step;
        let x1 = (x0 + step).min(trim.max_x + 1);
        let y1 = (y0 + step).min(trim.max_y + 1);
        let mut darkest = 255u8;
        for y in y0..y1 {
            for x in x0..x1 {
                darkest = darkest.min(src.get_pixel(x, y)[0]);
            }
        }
        Luma([darkest])
    })
}
