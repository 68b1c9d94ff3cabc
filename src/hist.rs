//! # 2-D Histogram and Event Selection
//!
//! The binning engine behind the interactive session: two equal-shaped value
//! grids are binned against per-axis edge tables, and every in-range sample
//! is recorded as a spatiotemporal event in its bin's membership list, so a
//! selected bin can be expanded back into the underlying `(time, lat, lon)`
//! points.
//!
//! Bin semantics: `edges[i] <= v < edges[i+1]`, with the last bin closed on
//! its upper edge. Values outside the outer edges are not binned at all;
//! the catalog edges keep their outermost bins wide so this only drops true
//! outliers.

use ndarray::Array3;
use thiserror::Error;

/// Errors from histogram construction and bin addressing
#[derive(Error, Debug)]
pub enum HistError {
    #[error("Bin edges must contain at least two values, got {0}")]
    TooFewEdges(usize),

    #[error("Bin edges must be strictly increasing ({left} then {right})")]
    NotIncreasing { left: f64, right: f64 },

    #[error("Value grids disagree in shape: x {x:?}, y {y:?}")]
    ShapeMismatch { x: Vec<usize>, y: Vec<usize> },

    #[error("Bin ({x}, {y}) outside histogram of {x_bins} x {y_bins} bins")]
    BinOutOfRange {
        x: usize,
        y: usize,
        x_bins: usize,
        y_bins: usize,
    },
}

/// Result type for histogram operations
pub type HistResult<T> = Result<T, HistError>;

/// Address of one histogram bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinId {
    pub x: usize,
    pub y: usize,
}

/// One spatiotemporal sample, as indices into the loaded grid axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: usize,
    pub lat: usize,
    pub lon: usize,
}

/// Two-dimensional histogram with per-bin event membership.
#[derive(Debug, Clone)]
pub struct Histogram2d {
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    // row-major: members[x_bin * y_bins + y_bin]
    members: Vec<Vec<Event>>,
    dropped: usize,
}

/// Bin index for a value against an edge table, `None` outside the outer
/// edges. The final bin is closed on its upper edge so the table's maximum
/// still bins.
pub fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let last = *edges.last()?;
    if value < edges[0] || value > last {
        return None;
    }
    let bins = edges.len() - 1;
    let idx = edges.partition_point(|e| *e <= value);
    Some(if idx > bins { bins - 1 } else { idx - 1 })
}

fn validate_edges(edges: &[f64]) -> HistResult<()> {
    if edges.len() < 2 {
        return Err(HistError::TooFewEdges(edges.len()));
    }
    for pair in edges.windows(2) {
        if pair[0] >= pair[1] {
            return Err(HistError::NotIncreasing {
                left: pair[0],
                right: pair[1],
            });
        }
    }
    Ok(())
}

impl Histogram2d {
    /// Bins two equal-shaped grids against the given edge tables.
    pub fn build(
        x_values: &Array3<f64>,
        y_values: &Array3<f64>,
        x_edges: Vec<f64>,
        y_edges: Vec<f64>,
    ) -> HistResult<Self> {
        validate_edges(&x_edges)?;
        validate_edges(&y_edges)?;
        if x_values.shape() != y_values.shape() {
            return Err(HistError::ShapeMismatch {
                x: x_values.shape().to_vec(),
                y: y_values.shape().to_vec(),
            });
        }

        let x_bins = x_edges.len() - 1;
        let y_bins = y_edges.len() - 1;
        let mut members = vec![Vec::new(); x_bins * y_bins];
        let mut dropped = 0usize;

        for ((t, j, i), &xv) in x_values.indexed_iter() {
            let yv = y_values[[t, j, i]];
            match (bin_index(&x_edges, xv), bin_index(&y_edges, yv)) {
                (Some(bx), Some(by)) => members[bx * y_bins + by].push(Event {
                    time: t,
                    lat: j,
                    lon: i,
                }),
                _ => dropped += 1,
            }
        }

        Ok(Histogram2d {
            x_edges,
            y_edges,
            members,
            dropped,
        })
    }

    pub fn x_bins(&self) -> usize {
        self.x_edges.len() - 1
    }

    pub fn y_bins(&self) -> usize {
        self.y_edges.len() - 1
    }

    pub fn x_edges(&self) -> &[f64] {
        &self.x_edges
    }

    pub fn y_edges(&self) -> &[f64] {
        &self.y_edges
    }

    /// Samples that fell outside the outer edges on either axis.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Total number of binned events.
    pub fn total(&self) -> usize {
        self.members.iter().map(|m| m.len()).sum()
    }

    fn slot(&self, bin: BinId) -> HistResult<usize> {
        if bin.x >= self.x_bins() || bin.y >= self.y_bins() {
            return Err(HistError::BinOutOfRange {
                x: bin.x,
                y: bin.y,
                x_bins: self.x_bins(),
                y_bins: self.y_bins(),
            });
        }
        Ok(bin.x * self.y_bins() + bin.y)
    }

    /// Event count in one bin.
    pub fn count(&self, bin: BinId) -> HistResult<usize> {
        Ok(self.members[self.slot(bin)?].len())
    }

    /// Full membership list of one bin, in grid iteration order.
    pub fn events_in(&self, bin: BinId) -> HistResult<&[Event]> {
        let slot = self.slot(bin)?;
        Ok(&self.members[slot])
    }

    /// Deterministic subsample of a bin capped at `max` events.
    ///
    /// A fixed stride over the membership list keeps the subsample spread
    /// across the full time range rather than front-loaded, and keeps picks
    /// reproducible between runs.
    pub fn sampled_events_in(&self, bin: BinId, max: usize) -> HistResult<Vec<Event>> {
        let all = self.events_in(bin)?;
        if max == 0 || all.is_empty() {
            return Ok(Vec::new());
        }
        if all.len() <= max {
            return Ok(all.to_vec());
        }
        let stride = all.len().div_ceil(max);
        Ok(all.iter().step_by(stride).cloned().collect())
    }

    /// Bin counts as rows of `(BinId, count)`, x-major.
    pub fn counts(&self) -> Vec<(BinId, usize)> {
        let y_bins = self.y_bins();
        self.members
            .iter()
            .enumerate()
            .map(|(slot, m)| {
                (
                    BinId {
                        x: slot / y_bins,
                        y: slot % y_bins,
                    },
                    m.len(),
                )
            })
            .collect()
    }
}
