//! # Regional Grid Loading
//!
//! Coordinate handling and regional loading of the two session variables
//! from a NetCDF dataset. Bounding-box edges are resolved to grid indices by
//! nearest-neighbor lookup against the coordinate variables, the value grids
//! are read with the `[time, latitude, longitude]` axis order preserved, and
//! the catalog unit multipliers and the time coordinate scaling are applied
//! during the load.

use crate::input::SessionConfig;
use crate::variables::VariableSpec;
use log::debug;
use ndarray::{Array3, Ix3};

/// A regional subset of the dataset, ready for binning.
///
/// Both value grids share the shape `(time, lat, lon)`, and the coordinate
/// vectors match the corresponding axes in length. Values carry the catalog
/// unit multipliers; time values are seconds since the session start.
#[derive(Debug, Clone)]
pub struct LoadedGrid {
    pub x_spec: &'static VariableSpec,
    pub y_spec: &'static VariableSpec,
    pub x: Array3<f64>,
    pub y: Array3<f64>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Seconds since the session start datetime
    pub time: Vec<f64>,
}

impl LoadedGrid {
    /// Grid shape as `(time, lat, lon)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        let s = self.x.shape();
        (s[0], s[1], s[2])
    }

    /// Checks that both grids and all coordinate vectors agree in length.
    pub fn axes_consistent(&self) -> bool {
        let (nt, ny, nx) = self.shape();
        self.y.shape() == [nt, ny, nx]
            && self.time.len() == nt
            && self.lat.len() == ny
            && self.lon.len() == nx
    }
}

/// Index of the coordinate value closest to `target`; ties resolve to the
/// lower index. Returns `None` only for an empty coordinate array.
///
/// A target outside the coordinate range resolves to the nearest endpoint,
/// so out-of-range bounds clamp rather than fail.
pub fn nearest_index(coords: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in coords.iter().enumerate() {
        let distance = (value - target).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((idx, distance)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Inclusive index window covering `low..=high` on a coordinate axis.
///
/// Both bounds are resolved by [`nearest_index`] and the result is
/// normalized to `start <= end`, so the window is well-formed for axes
/// stored in either direction.
pub fn slice_bounds(coords: &[f64], low: f64, high: f64) -> Option<(usize, usize)> {
    let a = nearest_index(coords, low)?;
    let b = nearest_index(coords, high)?;
    Some((a.min(b), a.max(b)))
}

/// Loads the session's regional grid from a local NetCDF file.
///
/// Remote datasets are fetched to a local path first (see
/// [`crate::storage::fetch_to_local`]); this function only deals with paths
/// the `netcdf` crate can open directly.
pub fn load_grid(
    path: &str,
    config: &SessionConfig,
) -> Result<LoadedGrid, Box<dyn std::error::Error>> {
    let file = netcdf::open(path)?;
    let grid = load_grid_from(&file, config)?;
    file.close()?;
    Ok(grid)
}

/// Loads the regional grid from an already-open dataset.
pub fn load_grid_from(
    file: &netcdf::File,
    config: &SessionConfig,
) -> Result<LoadedGrid, Box<dyn std::error::Error>> {
    let lon = read_coord(file, &config.coords.lon)?;
    let lat = read_coord(file, &config.coords.lat)?;
    let raw_time = read_coord(file, &config.coords.time)?;

    let (lon_start, lon_end) = slice_bounds(&lon, config.region.lon_low, config.region.lon_high)
        .ok_or_else(|| format!("Coordinate variable '{}' is empty", config.coords.lon))?;
    let (lat_start, lat_end) = slice_bounds(&lat, config.region.lat_low, config.region.lat_high)
        .ok_or_else(|| format!("Coordinate variable '{}' is empty", config.coords.lat))?;

    debug!(
        "Region window: lon {}..={} of {}, lat {}..={} of {}",
        lon_start,
        lon_end,
        lon.len(),
        lat_start,
        lat_end,
        lat.len()
    );

    let x_spec = config.x_var.spec();
    let y_spec = config.y_var.spec();
    let x = read_region(file, x_spec, lat_start..=lat_end, lon_start..=lon_end)?;
    let y = read_region(file, y_spec, lat_start..=lat_end, lon_start..=lon_end)?;

    let time: Vec<f64> = raw_time
        .iter()
        .map(|&t| t * config.time_base.scale + config.time_base.offset)
        .collect();

    let grid = LoadedGrid {
        x_spec,
        y_spec,
        x,
        y,
        lon: lon[lon_start..=lon_end].to_vec(),
        lat: lat[lat_start..=lat_end].to_vec(),
        time,
    };

    if !grid.axes_consistent() {
        return Err(format!(
            "Loaded grid axes disagree: values {:?}, time {}, lat {}, lon {}",
            grid.x.shape(),
            grid.time.len(),
            grid.lat.len(),
            grid.lon.len()
        )
        .into());
    }

    Ok(grid)
}

fn read_coord(file: &netcdf::File, name: &str) -> Result<Vec<f64>, Box<dyn std::error::Error>> {
    if let Some(var) = file.variable(name) {
        let values = var.get::<f64, _>(..)?;
        Ok(values.iter().cloned().collect())
    } else {
        Err(format!("Coordinate variable '{}' not found", name).into())
    }
}

fn read_region(
    file: &netcdf::File,
    spec: &VariableSpec,
    lat_window: std::ops::RangeInclusive<usize>,
    lon_window: std::ops::RangeInclusive<usize>,
) -> Result<Array3<f64>, Box<dyn std::error::Error>> {
    let var = file
        .variable(spec.dataset_name)
        .ok_or_else(|| format!("Variable '{}' not found in dataset", spec.dataset_name))?;

    if var.dimensions().len() != 3 {
        return Err(format!(
            "Variable '{}' has {} dimensions, expected [time, latitude, longitude]",
            spec.dataset_name,
            var.dimensions().len()
        )
        .into());
    }

    let values = var.get::<f64, _>((.., lat_window, lon_window))?;
    let mut values = values.into_dimensionality::<Ix3>().map_err(|e| {
        format!(
            "Variable '{}' did not slice to three dimensions: {}",
            spec.dataset_name, e
        )
    })?;

    if spec.scale != 1.0 {
        values.mapv_inplace(|v| v * spec.scale);
    }

    Ok(values)
}
