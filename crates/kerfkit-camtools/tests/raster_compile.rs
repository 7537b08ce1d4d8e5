//! End-to-end raster compilation: trim, step resampling, scan passes,
//! and per-image step/direction resolution.

use image::{Rgba, RgbaImage};
use kerfkit_camtools::{CompileError, ImageNode, LaserOperation, OpKind, PathNode};
use kerfkit_core::{CutObject, LaserSettings, RasterCut, RasterDirection, ScanAxis, VectorPath};

const OUTLINE: &str = "M 0,0 L 100,100 L 0,0 M 50,-50 L 100,-100 M 0,0 Q 100,100 200,0";

/// A 256x256 transparent buffer with an opaque white square covering
/// 50..=150 and an opaque black square covering `mark0..=mark1`.
fn marked_image(mark0: u32, mark1: u32) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(256, 256, Rgba([255, 255, 255, 0]));
    for y in 50..=150 {
        for x in 50..=150 {
            image.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }
    for y in mark0..=mark1 {
        for x in mark0..=mark1 {
            image.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    image
}

fn raster_settings(step: u32, direction: RasterDirection) -> LaserSettings {
    LaserSettings {
        raster_step: step,
        raster_direction: direction,
        ..LaserSettings::default()
    }
}

fn rasters(code: &kerfkit_core::CutCode) -> Vec<&RasterCut> {
    code.flat()
        .filter_map(|cut| match cut {
            CutObject::Raster(raster) => Some(raster),
            _ => None,
        })
        .collect()
}

#[test]
fn test_raster_without_step_fails() {
    let mut op = LaserOperation::new(OpKind::Raster);
    op.add(ImageNode::new(marked_image(100, 105), 0.0, 0.0));
    let err = op.compile().unwrap_err();
    assert!(matches!(err, CompileError::MissingRasterStep));
}

#[test]
fn test_raster_trims_to_mark_and_applies_step() {
    let mut op = LaserOperation::with_settings(
        OpKind::Raster,
        raster_settings(2, RasterDirection::TopToBottom),
    );
    // The unpainted outline contributes bounds but marks nothing, and the
    // white square trims away; only the 6px black mark survives.
    op.add(VectorPath::from_svg(OUTLINE).unwrap());
    op.add(ImageNode::new(marked_image(100, 105), 0.0, 0.0));

    let code = op.compile().unwrap();
    let cuts = rasters(&code);
    assert_eq!(cuts.len(), 1);
    let raster = cuts[0];
    assert_eq!((raster.width(), raster.height()), (3, 3));
    assert_eq!((raster.tx, raster.ty), (100.0, 100.0));
    assert_eq!(raster.step, 2);
    assert_eq!(raster.axis, ScanAxis::Horizontal);
}

#[test]
fn test_raster_origin_tracks_image_placement() {
    let mut op = LaserOperation::with_settings(
        OpKind::Raster,
        raster_settings(3, RasterDirection::TopToBottom),
    );
    op.add(ImageNode::new(marked_image(100, 105), -20.0, -20.0));

    let code = op.compile().unwrap();
    let cuts = rasters(&code);
    assert_eq!(cuts.len(), 1);
    assert_eq!((cuts[0].width(), cuts[0].height()), (2, 2));
    assert_eq!((cuts[0].tx, cuts[0].ty), (80.0, 80.0));
}

#[test]
fn test_crosshatch_emits_two_passes_over_one_buffer() {
    let mut op = LaserOperation::with_settings(
        OpKind::Raster,
        raster_settings(2, RasterDirection::Crosshatch),
    );
    op.add(ImageNode::new(marked_image(100, 105), 0.0, 0.0));

    let code = op.compile().unwrap();
    let cuts = rasters(&code);
    assert_eq!(cuts.len(), 2);
    assert_eq!(cuts[0].axis, ScanAxis::Horizontal);
    assert_eq!(cuts[1].axis, ScanAxis::Vertical);
    assert!(cuts[0].shares_buffer_with(cuts[1]));
    assert_eq!((cuts[0].tx, cuts[0].ty), (cuts[1].tx, cuts[1].ty));
}

#[test]
fn test_image_kind_uses_per_image_step() {
    // The operation-level step is 2, but image compilation ignores it:
    // the first image carries its own step attribute, the second falls
    // back to the default step of 1.
    let mut op = LaserOperation::with_settings(
        OpKind::Image,
        raster_settings(2, RasterDirection::TopToBottom),
    );
    op.add(ImageNode::new(marked_image(100, 105), 0.0, 0.0).with_value("raster_step", "3"));
    op.add(ImageNode::new(marked_image(100, 105), 300.0, 0.0));

    let code = op.compile().unwrap();
    let cuts = rasters(&code);
    assert_eq!(cuts.len(), 2);
    assert_eq!((cuts[0].width(), cuts[0].height()), (2, 2));
    assert_eq!(cuts[0].step, 3);
    assert_eq!((cuts[1].width(), cuts[1].height()), (6, 6));
    assert_eq!(cuts[1].step, 1);
    assert_eq!((cuts[1].tx, cuts[1].ty), (400.0, 100.0));
}

#[test]
fn test_image_kind_tolerates_malformed_step_attribute() {
    let mut op = LaserOperation::new(OpKind::Image);
    op.add(ImageNode::new(marked_image(100, 105), 0.0, 0.0).with_value("raster_step", "-2"));

    let code = op.compile().unwrap();
    let cuts = rasters(&code);
    assert_eq!(cuts.len(), 1);
    assert_eq!(cuts[0].step, 1);
    assert_eq!((cuts[0].width(), cuts[0].height()), (6, 6));
}

#[test]
fn test_image_kind_direction_attribute_wins() {
    let mut op = LaserOperation::with_settings(
        OpKind::Image,
        raster_settings(0, RasterDirection::TopToBottom),
    );
    op.add(
        ImageNode::new(marked_image(80, 120), 0.0, 0.0)
            .with_value("raster_step", "2")
            .with_value("raster_direction", "4"),
    );

    let code = op.compile().unwrap();
    let cuts = rasters(&code);
    assert_eq!(cuts.len(), 2);
    assert_eq!((cuts[0].width(), cuts[0].height()), (21, 21));
    assert!(cuts[0].shares_buffer_with(cuts[1]));
}

#[test]
fn test_unpainted_vectors_compile_to_nothing() {
    let mut op = LaserOperation::with_settings(
        OpKind::Raster,
        raster_settings(2, RasterDirection::TopToBottom),
    );
    op.add(VectorPath::from_svg(OUTLINE).unwrap());

    let code = op.compile().unwrap();
    assert!(code.is_empty());
}

#[test]
fn test_filled_vector_rasterizes() {
    let mut op = LaserOperation::with_settings(
        OpKind::Raster,
        raster_settings(2, RasterDirection::TopToBottom),
    );
    op.add(
        PathNode::new(VectorPath::from_svg("M 10,10 L 30,10 L 30,30 L 10,30 Z").unwrap())
            .with_fill([0, 0, 0]),
    );

    let code = op.compile().unwrap();
    let cuts = rasters(&code);
    assert_eq!(cuts.len(), 1);
    assert_eq!((cuts[0].width(), cuts[0].height()), (10, 10));
    assert_eq!((cuts[0].tx, cuts[0].ty), (10.0, 10.0));
}

#[test]
fn test_left_to_right_scans_vertically() {
    let mut op = LaserOperation::with_settings(
        OpKind::Raster,
        raster_settings(1, RasterDirection::LeftToRight),
    );
    op.add(ImageNode::new(marked_image(100, 105), 0.0, 0.0));

    let code = op.compile().unwrap();
    let cuts = rasters(&code);
    assert_eq!(cuts.len(), 1);
    assert_eq!(cuts[0].axis, ScanAxis::Vertical);
}
