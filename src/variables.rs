//! # Variable Catalog
//!
//! Fixed menu of physical variables that a session can bin against, each
//! carrying the dataset variable name, unit label, display format, a
//! unit-conversion multiplier applied at load time, and the hand-tuned
//! histogram bin edges for that quantity.
//!
//! The edges are non-uniform and the two outermost edges of every entry are
//! intentionally wide so that outliers still land in a bin instead of being
//! dropped from the histogram.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of histogram bins per axis.
pub const BIN_COUNT: usize = 12;

/// Number of bin edges per axis (one more than the bin count).
pub const EDGE_COUNT: usize = BIN_COUNT + 1;

/// The physical quantities known to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    /// Surface precipitation rate
    Precip,
    /// Vertical velocity at 500 hPa
    #[serde(rename = "W500")]
    W500,
    /// Vertical eddy momentum flux
    #[serde(rename = "wPuP")]
    WPuP,
    /// Total eddy energy flux
    #[serde(rename = "TEEF")]
    Teef,
    /// Horizontal eddy momentum variance
    #[serde(rename = "HMV")]
    Hmv,
    /// Vertically integrated eddy kinetic energy tendency
    #[serde(rename = "ZSKEDot")]
    ZSkeDot,
}

/// Display metadata and load-time conversion for one catalog variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableSpec {
    /// Display name used in prompts, metadata strings and the case log
    pub name: &'static str,
    /// Variable name as addressed in the dataset
    pub dataset_name: &'static str,
    /// Unit label after the multiplier has been applied
    pub units: &'static str,
    /// Multiplier applied to raw dataset values during load
    pub scale: f64,
    /// Minimum printed width and decimal places for displayed values
    pub width: usize,
    /// Decimal places for displayed values
    pub precision: usize,
    /// Histogram bin edges, strictly increasing
    pub edges: [f64; EDGE_COUNT],
}

impl VariableSpec {
    /// Formats a value with this variable's display width and precision.
    pub fn format_value(&self, value: f64) -> String {
        format!("{:w$.p$}", value, w = self.width, p = self.precision)
    }

    /// Labelled value, e.g. `" 42 mm day-1"`.
    pub fn format_with_units(&self, value: f64) -> String {
        format!("{} {}", self.format_value(value), self.units)
    }
}

const PRECIP: VariableSpec = VariableSpec {
    name: "Precip",
    dataset_name: "PREC",
    units: "mm day-1",
    // kg m-2 s-1 to mm day-1
    scale: 86400.0,
    width: 3,
    precision: 0,
    edges: [
        0.0, 1.0, 11.0, 21.0, 31.0, 41.0, 51.0, 61.0, 71.0, 81.0, 91.0, 101.0, 250.0,
    ],
};

const W500: VariableSpec = VariableSpec {
    name: "W500",
    dataset_name: "W",
    units: "m s-1",
    scale: 1.0,
    width: 0,
    precision: 3,
    edges: [
        -0.5, -0.135, -0.105, -0.075, -0.045, -0.015, 0.015, 0.045, 0.075, 0.105, 0.135, 0.165,
        0.5,
    ],
};

const WPUP: VariableSpec = VariableSpec {
    name: "wPuP",
    dataset_name: "WPUP",
    units: "m2 s-2",
    scale: 1.0,
    width: 0,
    precision: 2,
    edges: [
        -0.5, -0.18, -0.14, -0.10, -0.06, -0.02, 0.02, 0.06, 0.10, 0.14, 0.18, 0.22, 0.5,
    ],
};

const TEEF: VariableSpec = VariableSpec {
    name: "TEEF",
    dataset_name: "TEEF",
    units: "J m kg-1 s-1",
    scale: 1.0,
    width: 3,
    precision: 0,
    edges: [
        -20.0, 20.0, 60.0, 100.0, 140.0, 180.0, 220.0, 260.0, 300.0, 340.0, 380.0, 420.0, 1000.0,
    ],
};

const HMV: VariableSpec = VariableSpec {
    name: "HMV",
    dataset_name: "HMV",
    units: "m2 s-2",
    scale: 1.0,
    width: 2,
    precision: 0,
    edges: [
        0.0, 4.0, 8.0, 12.0, 16.0, 20.0, 24.0, 28.0, 32.0, 36.0, 40.0, 44.0, 100.0,
    ],
};

// Base edges scaled by 1.5 to match the dataset's observed dynamic range.
const ZSKEDOT: VariableSpec = VariableSpec {
    name: "ZSKEDot",
    dataset_name: "ZSKEDOT",
    units: "m2 s-3 (x 10^-3)",
    scale: 1000.0,
    width: 0,
    precision: 3,
    edges: [
        -7.5, -1.65, -1.35, -1.05, -0.75, -0.45, -0.15, 0.15, 0.45, 0.75, 1.05, 1.35, 7.5,
    ],
};

impl VarKind {
    /// Returns the catalog entry for this variable.
    pub fn spec(&self) -> &'static VariableSpec {
        match self {
            VarKind::Precip => &PRECIP,
            VarKind::W500 => &W500,
            VarKind::WPuP => &WPUP,
            VarKind::Teef => &TEEF,
            VarKind::Hmv => &HMV,
            VarKind::ZSkeDot => &ZSKEDOT,
        }
    }

    /// All catalog variables in menu order.
    pub fn all() -> [VarKind; 6] {
        [
            VarKind::Precip,
            VarKind::W500,
            VarKind::WPuP,
            VarKind::Teef,
            VarKind::Hmv,
            VarKind::ZSkeDot,
        ]
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

impl FromStr for VarKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        VarKind::all()
            .into_iter()
            .find(|kind| kind.spec().name.to_ascii_lowercase() == lowered)
            .ok_or_else(|| {
                let options: Vec<&str> = VarKind::all().iter().map(|k| k.spec().name).collect();
                format!(
                    "Unknown variable '{}'. Options: {}",
                    s,
                    options.join(", ")
                )
            })
    }
}
