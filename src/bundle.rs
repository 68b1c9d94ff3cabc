//! # Case Bundle Writer
//!
//! Rewrites a template visualization-session file (bundle) so that it
//! centers on a picked event. The template carries `%token%` placeholders
//! for the spatial and temporal window; each pick substitutes the window
//! computed from the event's position and writes a numbered bundle into the
//! session's case directory.
//!
//! Recognized tokens: `%centerLon%`, `%centerLat%`, `%centerTime%`,
//! `%minLon%`, `%maxLon%`, `%minLat%`, `%maxLat%`, `%startTime%`,
//! `%endTime%` and `%caseName%`. Substitution is pure text replacement;
//! unrecognized tokens are left untouched.

use chrono::{Duration, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors from template loading and case writing
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Failed to read bundle template '{path}': {source}")]
    TemplateRead {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write case bundle '{path}': {source}")]
    CaseWrite {
        path: String,
        source: std::io::Error,
    },

    #[error("Time window overflowed around {0}")]
    TimeWindow(NaiveDateTime),
}

/// Result type for bundle operations
pub type BundleResult<T> = Result<T, BundleError>;

/// Writes numbered case bundles from a shared template.
#[derive(Debug, Clone)]
pub struct CaseWriter {
    template: String,
    out_dir: PathBuf,
    case_name: String,
    lon_offset: f64,
    lat_offset: f64,
    seconds_from_center: i64,
    written: usize,
}

impl CaseWriter {
    /// Reads the template from disk.
    pub fn new(
        template_path: &str,
        out_dir: impl Into<PathBuf>,
        case_name: &str,
        lon_offset: f64,
        lat_offset: f64,
        seconds_from_center: i64,
    ) -> BundleResult<Self> {
        let template = fs::read_to_string(template_path).map_err(|source| {
            BundleError::TemplateRead {
                path: template_path.to_string(),
                source,
            }
        })?;
        Ok(Self::from_template_text(
            template,
            out_dir,
            case_name,
            lon_offset,
            lat_offset,
            seconds_from_center,
        ))
    }

    /// Builds a writer around template text already in memory.
    pub fn from_template_text(
        template: String,
        out_dir: impl Into<PathBuf>,
        case_name: &str,
        lon_offset: f64,
        lat_offset: f64,
        seconds_from_center: i64,
    ) -> Self {
        CaseWriter {
            template,
            out_dir: out_dir.into(),
            case_name: case_name.to_string(),
            lon_offset,
            lat_offset,
            seconds_from_center,
            written: 0,
        }
    }

    /// Number of bundles written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Directory receiving the case bundles.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Renders the template for an event without touching disk.
    pub fn render(&self, lon: f64, lat: f64, center: NaiveDateTime) -> BundleResult<String> {
        let half = Duration::seconds(self.seconds_from_center);
        let start = center
            .checked_sub_signed(half)
            .ok_or(BundleError::TimeWindow(center))?;
        let end = center
            .checked_add_signed(half)
            .ok_or(BundleError::TimeWindow(center))?;

        Ok(self
            .template
            .replace("%caseName%", &self.case_name)
            .replace("%centerLon%", &format!("{}", lon))
            .replace("%centerLat%", &format!("{}", lat))
            .replace("%centerTime%", &center.format(TIME_FORMAT).to_string())
            .replace("%minLon%", &format!("{}", lon - self.lon_offset))
            .replace("%maxLon%", &format!("{}", lon + self.lon_offset))
            .replace("%minLat%", &format!("{}", lat - self.lat_offset))
            .replace("%maxLat%", &format!("{}", lat + self.lat_offset))
            .replace("%startTime%", &start.format(TIME_FORMAT).to_string())
            .replace("%endTime%", &end.format(TIME_FORMAT).to_string()))
    }

    /// Renders and writes the next numbered case bundle, returning its path.
    pub fn write_case(
        &mut self,
        lon: f64,
        lat: f64,
        center: NaiveDateTime,
    ) -> BundleResult<PathBuf> {
        let rendered = self.render(lon, lat, center)?;
        let path = self
            .out_dir
            .join(format!("{}_{:03}.xidv", self.case_name, self.written + 1));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| BundleError::CaseWrite {
                path: path.display().to_string(),
                source,
            })?;
        }
        fs::write(&path, rendered).map_err(|source| BundleError::CaseWrite {
            path: path.display().to_string(),
            source,
        })?;

        self.written += 1;
        Ok(path)
    }
}
