//! # Session Configuration Module
//!
//! Configuration parsing and validation for exploration sessions. A session
//! configuration specifies the dataset to load, the two catalog variables to
//! bin against each other, the lon/lat bounding box, the time coordinate
//! system, the bundle template used when picking events, and the layout
//! parameters handed to downstream display consumers.
//!
//! ## Configuration Structure
//!
//! - **dataset**: path or `s3://` URL of the NetCDF dataset
//! - **x_var / y_var**: catalog variable names (see [`crate::variables`])
//! - **region**: lon/lat bounding box, degrees E (0..360) and degrees N
//! - **coords**: dataset names of the coordinate variables
//! - **time_base**: reference start datetime plus per-sample scaling
//! - **bundle**: template path, case name and event window sizes
//! - **layout**: figure size, DPI and the per-bin event cap
//! - **x_edges / y_edges**: optional manual bin-edge overrides
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use clickhist::input::SessionConfig;
//!
//! // Load from file (JSON or YAML by extension)
//! let config = SessionConfig::from_file("session.json")?;
//!
//! // Load from a JSON string
//! let json = r#"
//! {
//!   "dataset": "allVars_r90x45_3.nc4",
//!   "x_var": "Precip",
//!   "y_var": "TEEF",
//!   "bundle": { "template": "template_smallarea.xidv" }
//! }"#;
//! let config = SessionConfig::from_json(json)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::variables::VarKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for an exploration session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path or S3 URL of the input NetCDF dataset
    pub dataset: String,
    /// Catalog variable binned on the x axis
    pub x_var: VarKind,
    /// Catalog variable binned on the y axis
    pub y_var: VarKind,
    /// Lon/lat bounding box to load
    #[serde(default)]
    pub region: RegionConfig,
    /// Names of the coordinate variables in the dataset
    #[serde(default)]
    pub coords: CoordsConfig,
    /// Time coordinate system of the dataset
    #[serde(default)]
    pub time_base: TimeBaseConfig,
    /// Bundle template and event window parameters
    pub bundle: BundleConfig,
    /// Display layout parameters
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Manual x bin edges, overriding the catalog edges
    #[serde(default)]
    pub x_edges: Option<Vec<f64>>,
    /// Manual y bin edges, overriding the catalog edges
    #[serde(default)]
    pub y_edges: Option<Vec<f64>>,
}

/// Lon/lat bounding box, degrees E (0 to 360) and degrees N (-90 to 90).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegionConfig {
    pub lon_low: f64,
    pub lon_high: f64,
    pub lat_low: f64,
    pub lat_high: f64,
}

impl Default for RegionConfig {
    /// Tropical central Pacific box.
    fn default() -> Self {
        RegionConfig {
            lon_low: 360.0 - 160.0,
            lon_high: 360.0 - 120.0,
            lat_low: -25.0,
            lat_high: 15.0,
        }
    }
}

/// Dataset names of the coordinate variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordsConfig {
    pub lon: String,
    pub lat: String,
    pub time: String,
}

impl Default for CoordsConfig {
    fn default() -> Self {
        CoordsConfig {
            lon: "lon".to_string(),
            lat: "lat".to_string(),
            time: "time".to_string(),
        }
    }
}

/// Coordinate system for raw time values pulled from the dataset.
///
/// Raw values are converted to seconds since `start` as
/// `raw * scale + offset`. A dataset with time stored in minutes uses
/// `scale = 60`; `offset` corrects datasets whose first sample is not at
/// raw value zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeBaseConfig {
    /// Reference datetime of raw time value zero
    pub start: NaiveDateTime,
    /// Multiplier taking raw time values to seconds
    pub scale: f64,
    /// Additive correction in seconds
    pub offset: f64,
}

impl Default for TimeBaseConfig {
    fn default() -> Self {
        TimeBaseConfig {
            start: chrono::NaiveDate::from_ymd_opt(2005, 5, 16)
                .expect("static date")
                .and_hms_opt(0, 30, 0)
                .expect("static time"),
            scale: 60.0,
            offset: 0.0,
        }
    }
}

/// Bundle template and per-pick output parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Path of the template bundle rewritten per pick
    pub template: String,
    /// Session name used for the case directory and file stems
    #[serde(default = "default_case_name")]
    pub case_name: String,
    /// Directory receiving the rewritten bundles and the case log
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Half-width of the bundle's longitude window, degrees
    #[serde(default = "default_deg_offset")]
    pub lon_offset: f64,
    /// Half-width of the bundle's latitude window, degrees
    #[serde(default = "default_deg_offset")]
    pub lat_offset: f64,
    /// Half-width of the bundle's time window, seconds
    #[serde(default = "default_seconds_from_center")]
    pub seconds_from_center: i64,
}

fn default_case_name() -> String {
    "session".to_string()
}

fn default_output_dir() -> String {
    "cases".to_string()
}

fn default_deg_offset() -> f64 {
    1.0
}

fn default_seconds_from_center() -> i64 {
    3 * 3600
}

/// Display layout parameters carried through to downstream consumers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Figure x resolution in pixels
    pub figure_x: u32,
    /// Figure y resolution in pixels
    pub figure_y: u32,
    /// Figure DPI
    pub dpi: u32,
    /// Maximum number of events kept per bin when sampling.
    /// Large values make finding an individual event prohibitive.
    pub max_per_bin: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            figure_x: 800,
            figure_y: 800,
            dpi: 150,
            max_per_bin: 1000,
        }
    }
}

impl SessionConfig {
    /// Loads a session configuration from a JSON or YAML file, dispatched on
    /// the file extension (`.yaml`/`.yml` parse as YAML, everything else as
    /// JSON).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Parses a session configuration from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: SessionConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    /// Parses a session configuration from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: SessionConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    /// Validates the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        if self.dataset.trim().is_empty() {
            problems.push("dataset path must not be empty".to_string());
        }
        if self.region.lon_low >= self.region.lon_high {
            problems.push(format!(
                "region lon_low ({}) must be less than lon_high ({})",
                self.region.lon_low, self.region.lon_high
            ));
        }
        if self.region.lat_low >= self.region.lat_high {
            problems.push(format!(
                "region lat_low ({}) must be less than lat_high ({})",
                self.region.lat_low, self.region.lat_high
            ));
        }
        if self.time_base.scale <= 0.0 {
            problems.push("time_base scale must be positive".to_string());
        }
        if self.bundle.template.trim().is_empty() {
            problems.push("bundle template path must not be empty".to_string());
        }
        if self.bundle.lon_offset <= 0.0 || self.bundle.lat_offset <= 0.0 {
            problems.push("bundle lon/lat offsets must be positive".to_string());
        }
        if self.bundle.seconds_from_center <= 0 {
            problems.push("bundle seconds_from_center must be positive".to_string());
        }
        if self.layout.max_per_bin == 0 {
            problems.push("layout max_per_bin must be at least 1".to_string());
        }
        if let Some(edges) = &self.x_edges {
            validate_edges("x_edges", edges, &mut problems);
        }
        if let Some(edges) = &self.y_edges {
            validate_edges("y_edges", edges, &mut problems);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Effective x bin edges: the manual override, or the catalog edges.
    pub fn x_bin_edges(&self) -> Vec<f64> {
        self.x_edges
            .clone()
            .unwrap_or_else(|| self.x_var.spec().edges.to_vec())
    }

    /// Effective y bin edges: the manual override, or the catalog edges.
    pub fn y_bin_edges(&self) -> Vec<f64> {
        self.y_edges
            .clone()
            .unwrap_or_else(|| self.y_var.spec().edges.to_vec())
    }

    /// Human-readable session descriptor recorded in the case log.
    pub fn metadata(&self) -> String {
        format!(
            "{} vs {}: {} to {} E, {} to {} N",
            self.x_var.spec().name,
            self.y_var.spec().name,
            self.region.lon_low,
            self.region.lon_high,
            self.region.lat_low,
            self.region.lat_high
        )
    }
}

fn validate_edges(label: &str, edges: &[f64], problems: &mut Vec<String>) {
    if edges.len() < 2 {
        problems.push(format!("{} must contain at least two edges", label));
        return;
    }
    for pair in edges.windows(2) {
        if pair[0] >= pair[1] {
            problems.push(format!(
                "{} must be strictly increasing ({} then {})",
                label, pair[0], pair[1]
            ));
            return;
        }
    }
}
