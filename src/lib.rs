//! # clickhist
//!
//! A Rust library and CLI for exploring regional subsets of gridded
//! atmospheric datasets through a clickable 2-D histogram.
//!
//! ## Features
//!
//! - **Regional loading**: slice a NetCDF dataset to a lon/lat bounding box
//!   with nearest-neighbor edge resolution, preserving the
//!   `[time, latitude, longitude]` axis order
//! - **Variable catalog**: precipitation and derived thermodynamic
//!   quantities with per-variable units, display formats, unit multipliers
//!   and hand-tuned histogram bin edges
//! - **Event selection**: every histogram bin carries its membership list,
//!   so a selected bin expands back into the underlying spatiotemporal
//!   events
//! - **Case bundles**: picking an event rewrites a template visualization
//!   bundle centered on the event and records it in a Parquet case log
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clickhist::input::SessionConfig;
//! use clickhist::session::Session;
//!
//! let config = SessionConfig::from_file("session.json")?;
//! let mut session = Session::build(&config, &config.dataset)?;
//!
//! let stdin = std::io::stdin();
//! session.run_interactive(stdin.lock(), std::io::stdout())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration Example
//!
//! ```json
//! {
//!   "dataset": "allVars_r90x45_3.nc4",
//!   "x_var": "Precip",
//!   "y_var": "TEEF",
//!   "region": { "lon_low": 200.0, "lon_high": 240.0,
//!               "lat_low": -25.0, "lat_high": 15.0 },
//!   "bundle": { "template": "template_smallarea.xidv" }
//! }
//! ```

pub mod bundle;
pub mod cli;
pub mod grid;
pub mod hist;
pub mod info;
pub mod input;
pub mod log;
pub mod output;
pub mod session;
pub mod storage;
pub mod variables;

#[cfg(test)]
mod tests;

pub use hist::{BinId, Event, Histogram2d};
pub use input::SessionConfig;
pub use session::{CaseRecord, Session};
pub use variables::{VarKind, VariableSpec};

use crate::grid::LoadedGrid;

/// Builds a session from a configuration, echoing the loaded grid.
///
/// This is the library-level counterpart of `clickhist explore`: it loads
/// the regional grid from a local dataset path, bins it, and returns the
/// wired session ready for [`Session::run_interactive`] or programmatic
/// selection.
pub fn open_session(
    config: &SessionConfig,
    dataset_path: &str,
) -> Result<Session, Box<dyn std::error::Error>> {
    let session = Session::build(config, dataset_path)?;
    log_grid(session.grid());
    Ok(session)
}

fn log_grid(grid: &LoadedGrid) {
    let (nt, ny, nx) = grid.shape();
    ::log::info!(
        "Loaded {} x {}: {} times x {} lats x {} lons",
        grid.x_spec.name,
        grid.y_spec.name,
        nt,
        ny,
        nx
    );
}
