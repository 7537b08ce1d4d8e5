//! Laser settings shared across the cut objects of one operation.
//!
//! Every cut object produced from a single operation holds a clone of the
//! same [`SharedSettings`] handle. Retuning an operation (power, speed,
//! passes) through any handle is visible to all holders without
//! recompiling; only a change that affects geometry (step size, raster
//! direction) requires a fresh compile.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Scan order for raster passes.
///
/// The numeric codes mirror the legacy device attribute values, which is
/// what image nodes carry in their free-form attribute maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RasterDirection {
    /// Sweep rows left-right, advancing downward.
    #[default]
    TopToBottom,
    /// Sweep rows left-right, advancing upward.
    BottomToTop,
    /// Sweep columns top-bottom, advancing leftward.
    RightToLeft,
    /// Sweep columns top-bottom, advancing rightward.
    LeftToRight,
    /// Two passes over the same buffer, one per axis.
    Crosshatch,
}

impl RasterDirection {
    /// Decode the legacy numeric attribute value (0-4).
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::TopToBottom),
            1 => Some(Self::BottomToTop),
            2 => Some(Self::RightToLeft),
            3 => Some(Self::LeftToRight),
            4 => Some(Self::Crosshatch),
            _ => None,
        }
    }

    pub fn is_crosshatch(self) -> bool {
        matches!(self, Self::Crosshatch)
    }

    /// The scan axis of the first (or only) raster pass.
    pub fn primary_axis(self) -> ScanAxis {
        match self {
            Self::TopToBottom | Self::BottomToTop | Self::Crosshatch => ScanAxis::Horizontal,
            Self::RightToLeft | Self::LeftToRight => ScanAxis::Vertical,
        }
    }
}

/// Scan-axis tag carried by each raster cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanAxis {
    /// Row-by-row sweeps along X.
    Horizontal,
    /// Column-by-column sweeps along Y.
    Vertical,
}

/// How a cut or scan is executed: power, speed, step size, direction,
/// and pass count, plus a free-form extension map for device-specific
/// attributes.
///
/// A `raster_step` of 0 means "not specified"; Raster-kind operations
/// refuse to compile without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserSettings {
    /// Laser power in device-relative units.
    pub power: f64,
    /// Cut/scan speed in device units per second.
    pub speed: f64,
    /// Raster step spacing in pixels; 0 = unset.
    pub raster_step: u32,
    /// Scan order for raster passes.
    pub raster_direction: RasterDirection,
    /// Number of times the compiled output should be executed.
    pub passes: u32,
    /// Free-form device-specific extension attributes.
    pub extras: BTreeMap<String, String>,
}

impl Default for LaserSettings {
    fn default() -> Self {
        Self {
            power: 1000.0,
            speed: 20.0,
            raster_step: 0,
            raster_direction: RasterDirection::default(),
            passes: 1,
            extras: BTreeMap::new(),
        }
    }
}

impl LaserSettings {
    /// Wrap these settings in a shared handle.
    pub fn into_shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }
}

/// A reference-counted, lock-guarded settings record.
///
/// Mutation through any clone of the handle is visible to every cut
/// object still holding one.
pub type SharedSettings = Arc<RwLock<LaserSettings>>;
