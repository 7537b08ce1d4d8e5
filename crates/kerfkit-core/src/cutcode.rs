//! The ordered CutCode container.
//!
//! CutCode is an append-ordered tree of cut objects. Groups exist so a
//! hatch pass or a multi-object burst can travel as a unit; flattening
//! walks the tree depth-first and yields every leaf in order. The
//! container is transient by design: it is rebuilt from operations on
//! demand and never persisted.

use lyon::math::point;
use lyon::path::Path;
use std::sync::Arc;

use crate::cutobject::CutObject;
use crate::geometry::{Point, VectorPath};
use crate::settings::SharedSettings;

/// A leaf cut object or an ordered sub-group.
#[derive(Debug, Clone)]
pub enum CutNode {
    Cut(CutObject),
    Group(Vec<CutNode>),
}

/// Ordered, possibly nested sequence of cut objects.
#[derive(Debug, Clone, Default)]
pub struct CutCode {
    nodes: Vec<CutNode>,
}

impl CutCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one cut object at the top level.
    pub fn append(&mut self, cut: impl Into<CutObject>) {
        self.nodes.push(CutNode::Cut(cut.into()));
    }

    /// Append a sub-group holding the given cuts in order.
    pub fn append_group(&mut self, cuts: impl IntoIterator<Item = CutObject>) {
        self.nodes
            .push(CutNode::Group(cuts.into_iter().map(CutNode::Cut).collect()));
    }

    /// Number of top-level nodes (leaves and groups alike).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[CutNode] {
        &self.nodes
    }

    /// Depth-first iterator over every leaf cut object.
    ///
    /// Restartable and side-effect free; call it as many times as needed.
    pub fn flat(&self) -> FlatIter<'_> {
        FlatIter {
            stack: vec![self.nodes.iter()],
        }
    }

    /// Sum of cut lengths over all leaves.
    pub fn length_cut(&self) -> f64 {
        self.flat().map(CutObject::length).sum()
    }

    /// Sum of the travel gaps between consecutive leaves.
    pub fn length_travel(&self) -> f64 {
        let mut distance = 0.0;
        let mut prev_end: Option<Point> = None;
        for cut in self.flat() {
            if let Some(prev) = prev_end {
                distance += prev.distance_to(&cut.start());
            }
            prev_end = Some(cut.end());
        }
        distance
    }

    /// Reconstruct drawable geometry for preview.
    ///
    /// Consecutive objects whose end point equals the next start point are
    /// joined into one continuous subpath; any discontinuity inserts a
    /// subpath move. A change of settings handle starts a new path, and
    /// raster cuts contribute no geometry (the preview draws their buffers
    /// separately) but do break continuity.
    pub fn as_geometry(&self) -> Vec<VectorPath> {
        let mut paths = Vec::new();
        let mut builder = Path::builder();
        let mut subpath_active = false;
        let mut has_content = false;
        let mut last: Option<Point> = None;
        let mut prev_settings: Option<SharedSettings> = None;

        let mut flush =
            |builder: &mut lyon::path::path::Builder, subpath_active: &mut bool, paths: &mut Vec<VectorPath>| {
                if *subpath_active {
                    builder.end(false);
                    *subpath_active = false;
                }
                let finished = std::mem::replace(builder, Path::builder());
                paths.push(VectorPath::from_lyon(finished.build()));
            };

        for cut in self.flat() {
            if matches!(cut, CutObject::Raster(_)) {
                last = None;
                continue;
            }

            if let Some(prev) = &prev_settings {
                if !Arc::ptr_eq(prev, cut.settings()) && has_content {
                    flush(&mut builder, &mut subpath_active, &mut paths);
                    has_content = false;
                    last = None;
                }
            }

            let start = cut.start();
            if last != Some(start) {
                if subpath_active {
                    builder.end(false);
                }
                builder.begin(point(start.x as f32, start.y as f32));
                subpath_active = true;
            }

            let end = cut.end();
            match cut {
                CutObject::Line(_) => {
                    builder.line_to(point(end.x as f32, end.y as f32));
                }
                CutObject::Quad(quad) => {
                    builder.quadratic_bezier_to(
                        point(quad.ctrl.x as f32, quad.ctrl.y as f32),
                        point(end.x as f32, end.y as f32),
                    );
                }
                CutObject::Raster(_) => unreachable!("raster cuts are skipped above"),
            }

            has_content = true;
            last = Some(end);
            prev_settings = Some(cut.settings().clone());
        }

        if has_content {
            flush(&mut builder, &mut subpath_active, &mut paths);
        }
        paths
    }
}

impl Extend<CutObject> for CutCode {
    fn extend<T: IntoIterator<Item = CutObject>>(&mut self, iter: T) {
        self.nodes.extend(iter.into_iter().map(CutNode::Cut));
    }
}

impl FromIterator<CutObject> for CutCode {
    fn from_iter<T: IntoIterator<Item = CutObject>>(iter: T) -> Self {
        let mut code = CutCode::new();
        code.extend(iter);
        code
    }
}

/// Depth-first traversal over the leaves of a [`CutCode`] tree.
pub struct FlatIter<'a> {
    stack: Vec<std::slice::Iter<'a, CutNode>>,
}

impl<'a> Iterator for FlatIter<'a> {
    type Item = &'a CutObject;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.last_mut() {
            match top.next() {
                Some(CutNode::Cut(cut)) => return Some(cut),
                Some(CutNode::Group(children)) => self.stack.push(children.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutobject::{LineCut, QuadCut};
    use crate::settings::LaserSettings;

    fn line(settings: &SharedSettings, x0: f64, y0: f64, x1: f64, y1: f64) -> CutObject {
        LineCut::new(Point::new(x0, y0), Point::new(x1, y1), settings.clone()).into()
    }

    #[test]
    fn test_flatten_preserves_depth_first_order() {
        let settings = LaserSettings::default().into_shared();
        let mut code = CutCode::new();
        code.append(line(&settings, 0.0, 0.0, 1.0, 0.0));
        code.append_group(vec![
            line(&settings, 1.0, 0.0, 2.0, 0.0),
            line(&settings, 2.0, 0.0, 3.0, 0.0),
        ]);
        code.append(line(&settings, 3.0, 0.0, 4.0, 0.0));

        let ends: Vec<f64> = code.flat().map(|c| c.end().x).collect();
        assert_eq!(ends, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(code.len(), 3);
    }

    #[test]
    fn test_flatten_is_restartable() {
        let settings = LaserSettings::default().into_shared();
        let mut code = CutCode::new();
        code.append_group(vec![
            line(&settings, 0.0, 0.0, 1.0, 0.0),
            line(&settings, 1.0, 0.0, 2.0, 0.0),
        ]);

        assert_eq!(code.flat().count(), 2);
        assert_eq!(code.flat().count(), 2);
    }

    #[test]
    fn test_empty_flattens_to_nothing() {
        let code = CutCode::new();
        assert_eq!(code.flat().count(), 0);
        assert!(code.as_geometry().is_empty());
    }

    #[test]
    fn test_as_geometry_joins_and_breaks_subpaths() {
        let settings = LaserSettings::default().into_shared();
        let mut code = CutCode::new();
        code.append(line(&settings, 0.0, 0.0, 100.0, 100.0));
        code.append(line(&settings, 100.0, 100.0, 0.0, 0.0));
        code.append(line(&settings, 50.0, -50.0, 100.0, -100.0));
        code.append(CutObject::Quad(QuadCut::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(200.0, 0.0),
            settings.clone(),
        )));

        let paths = code.as_geometry();
        assert_eq!(paths.len(), 1);
        assert_eq!(
            paths[0].to_svg(),
            "M 0,0 L 100,100 L 0,0 M 50,-50 L 100,-100 M 0,0 Q 100,100 200,0"
        );
    }

    #[test]
    fn test_as_geometry_splits_on_settings_change() {
        let first = LaserSettings::default().into_shared();
        let second = LaserSettings::default().into_shared();
        let mut code = CutCode::new();
        code.append(line(&first, 0.0, 0.0, 10.0, 0.0));
        code.append(line(&second, 10.0, 0.0, 20.0, 0.0));

        let paths = code.as_geometry();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].to_svg(), "M 0,0 L 10,0");
        assert_eq!(paths[1].to_svg(), "M 10,0 L 20,0");
    }

    #[test]
    fn test_lengths() {
        let settings = LaserSettings::default().into_shared();
        let mut code = CutCode::new();
        code.append(line(&settings, 0.0, 0.0, 3.0, 4.0));
        code.append(line(&settings, 3.0, 4.0, 3.0, 10.0));
        code.append(line(&settings, 3.0, 14.0, 3.0, 20.0));

        assert!((code.length_cut() - 17.0).abs() < 1e-9);
        assert!((code.length_travel() - 4.0).abs() < 1e-9);
    }
}
