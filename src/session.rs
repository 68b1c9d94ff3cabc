//! # Exploration Session
//!
//! Wires the loaded grid, the histogram and the case writer into one
//! interactive object: select a bin, list the events behind it, pick one,
//! and a bundle centered on that event lands in the case directory along
//! with a row in the session's case log.
//!
//! The interactive loop reads commands from any `BufRead`, so it drives the
//! same way from a terminal, a script file, or a test.

use crate::bundle::CaseWriter;
use crate::grid::{self, LoadedGrid};
use crate::hist::{BinId, Event, Histogram2d};
use crate::input::SessionConfig;
use chrono::{Duration, NaiveDateTime};
use log::info;
use polars::prelude::{DataFrame, NamedFrom, PolarsResult, Series};
use std::io::{BufRead, Write};

/// One picked event, as recorded in the case log.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    pub case: usize,
    pub lon: f64,
    pub lat: f64,
    pub time: NaiveDateTime,
    pub x_value: f64,
    pub y_value: f64,
    pub bundle: String,
}

/// A fully wired exploration session.
pub struct Session {
    grid: LoadedGrid,
    hist: Histogram2d,
    writer: CaseWriter,
    start: NaiveDateTime,
    max_per_bin: usize,
    metadata: String,
    cases: Vec<CaseRecord>,
}

impl Session {
    /// Builds a session from a configuration and a local dataset path.
    ///
    /// Remote datasets must be resolved to a local path first (see
    /// [`crate::storage::fetch_to_local`]).
    pub fn build(
        config: &SessionConfig,
        dataset_path: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let grid = grid::load_grid(dataset_path, config)?;
        Self::from_grid(config, grid)
    }

    /// Builds a session around an already-loaded grid.
    pub fn from_grid(
        config: &SessionConfig,
        grid: LoadedGrid,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let hist = Histogram2d::build(
            &grid.x,
            &grid.y,
            config.x_bin_edges(),
            config.y_bin_edges(),
        )?;
        info!(
            "Histogram built: {} events binned, {} outliers dropped",
            hist.total(),
            hist.dropped()
        );

        let writer = CaseWriter::new(
            &config.bundle.template,
            &config.bundle.output_dir,
            &config.bundle.case_name,
            config.bundle.lon_offset,
            config.bundle.lat_offset,
            config.bundle.seconds_from_center,
        )?;

        Ok(Session {
            grid,
            hist,
            writer,
            start: config.time_base.start,
            max_per_bin: config.layout.max_per_bin,
            metadata: config.metadata(),
            cases: Vec::new(),
        })
    }

    pub fn grid(&self) -> &LoadedGrid {
        &self.grid
    }

    pub fn hist(&self) -> &Histogram2d {
        &self.hist
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn case_log(&self) -> &[CaseRecord] {
        &self.cases
    }

    /// Values of both session variables at an event.
    pub fn event_values(&self, event: Event) -> (f64, f64) {
        (
            self.grid.x[[event.time, event.lat, event.lon]],
            self.grid.y[[event.time, event.lat, event.lon]],
        )
    }

    /// Physical position of an event: lon, lat and wall-clock time.
    pub fn event_position(&self, event: Event) -> (f64, f64, NaiveDateTime) {
        let seconds = self.grid.time[event.time].round() as i64;
        (
            self.grid.lon[event.lon],
            self.grid.lat[event.lat],
            self.start + Duration::seconds(seconds),
        )
    }

    /// The capped, deterministic event list shown for a selected bin.
    pub fn select(&self, bin: BinId) -> Result<Vec<Event>, Box<dyn std::error::Error>> {
        Ok(self.hist.sampled_events_in(bin, self.max_per_bin)?)
    }

    /// Picks the `index`-th listed event of a bin: writes its bundle and
    /// appends a case record.
    pub fn pick(
        &mut self,
        bin: BinId,
        index: usize,
    ) -> Result<CaseRecord, Box<dyn std::error::Error>> {
        let listed = self.select(bin)?;
        let event = *listed.get(index).ok_or_else(|| {
            format!(
                "Event index {} out of range: bin ({}, {}) lists {} events",
                index,
                bin.x,
                bin.y,
                listed.len()
            )
        })?;

        let (lon, lat, when) = self.event_position(event);
        let (x_value, y_value) = self.event_values(event);
        let path = self.writer.write_case(lon, lat, when)?;
        info!("Case {} written to {}", self.writer.written(), path.display());

        let record = CaseRecord {
            case: self.writer.written(),
            lon,
            lat,
            time: when,
            x_value,
            y_value,
            bundle: path.display().to_string(),
        };
        self.cases.push(record.clone());
        Ok(record)
    }

    /// Case log as a DataFrame, one row per pick.
    pub fn case_log_dataframe(&self) -> PolarsResult<DataFrame> {
        let cases: Vec<u32> = self.cases.iter().map(|c| c.case as u32).collect();
        let lons: Vec<f64> = self.cases.iter().map(|c| c.lon).collect();
        let lats: Vec<f64> = self.cases.iter().map(|c| c.lat).collect();
        let times: Vec<String> = self
            .cases
            .iter()
            .map(|c| c.time.format("%Y-%m-%d %H:%M:%S").to_string())
            .collect();
        let xs: Vec<f64> = self.cases.iter().map(|c| c.x_value).collect();
        let ys: Vec<f64> = self.cases.iter().map(|c| c.y_value).collect();
        let bundles: Vec<String> = self.cases.iter().map(|c| c.bundle.clone()).collect();

        DataFrame::new(vec![
            Series::new("case".into(), cases).into(),
            Series::new("lon".into(), lons).into(),
            Series::new("lat".into(), lats).into(),
            Series::new("time".into(), times).into(),
            Series::new(self.grid.x_spec.name.into(), xs).into(),
            Series::new(self.grid.y_spec.name.into(), ys).into(),
            Series::new("bundle".into(), bundles).into(),
        ])
    }

    /// Writes the case log as Parquet.
    pub fn save_case_log(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let df = self.case_log_dataframe()?;
        crate::output::write_case_log(&df, path)?;
        Ok(())
    }

    /// Text rendering of the histogram: y bins as rows (top down), x bins
    /// as columns.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.metadata));
        out.push_str(&format!(
            "{} events binned, {} outliers dropped\n",
            self.hist.total(),
            self.hist.dropped()
        ));
        out.push_str(&format!(
            "rows: {} bins of {}, columns: {} bins of {}\n\n",
            self.hist.y_bins(),
            self.grid.y_spec.name,
            self.hist.x_bins(),
            self.grid.x_spec.name
        ));

        for y in (0..self.hist.y_bins()).rev() {
            let edge = self.grid.y_spec.format_value(self.hist.y_edges()[y]);
            out.push_str(&format!("{:>10} |", edge));
            for x in 0..self.hist.x_bins() {
                let count = self
                    .hist
                    .count(BinId { x, y })
                    .expect("bin addresses enumerate the histogram");
                out.push_str(&format!(" {:>6}", count));
            }
            out.push('\n');
        }

        out.push_str(&format!("{:>10} +", ""));
        for _ in 0..self.hist.x_bins() {
            out.push_str("-------");
        }
        out.push('\n');
        out.push_str(&format!("{:>10}  ", ""));
        for x in 0..self.hist.x_bins() {
            out.push_str(&format!(
                " {:>6}",
                self.grid.x_spec.format_value(self.hist.x_edges()[x])
            ));
        }
        out.push('\n');
        out
    }

    /// Blocking prompt loop over arbitrary input/output streams.
    ///
    /// Commands: `show`, `bin X Y`, `pick X Y K`, `save PATH`, `help`,
    /// `quit`. Command errors are reported and the loop continues; the loop
    /// ends on `quit` or end of input.
    pub fn run_interactive<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<(), Box<dyn std::error::Error>> {
        writeln!(output, "{}", self.metadata)?;
        writeln!(output, "Type 'help' for commands.")?;

        for line in input.lines() {
            let line = line?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [] => {}
                ["quit"] | ["exit"] => break,
                ["help"] => {
                    writeln!(output, "Commands:")?;
                    writeln!(output, "  show            histogram counts")?;
                    writeln!(output, "  bin X Y         list events in bin (X, Y)")?;
                    writeln!(output, "  pick X Y K      write a bundle for event K of bin (X, Y)")?;
                    writeln!(output, "  save PATH       write the case log as Parquet")?;
                    writeln!(output, "  quit            end the session")?;
                }
                ["show"] => {
                    write!(output, "{}", self.summary())?;
                }
                ["bin", x, y] => match parse_bin(x, y) {
                    Ok(bin) => match self.select(bin) {
                        Ok(events) => {
                            writeln!(
                                output,
                                "Bin ({}, {}): {} events listed",
                                bin.x,
                                bin.y,
                                events.len()
                            )?;
                            for (idx, event) in events.iter().enumerate() {
                                let (lon, lat, when) = self.event_position(*event);
                                let (xv, yv) = self.event_values(*event);
                                writeln!(
                                    output,
                                    "  [{}] {} E, {} N, {}  {}={} {}={}",
                                    idx,
                                    lon,
                                    lat,
                                    when.format("%Y-%m-%d %H:%M:%S"),
                                    self.grid.x_spec.name,
                                    self.grid.x_spec.format_value(xv),
                                    self.grid.y_spec.name,
                                    self.grid.y_spec.format_value(yv),
                                )?;
                            }
                        }
                        Err(e) => writeln!(output, "error: {}", e)?,
                    },
                    Err(e) => writeln!(output, "error: {}", e)?,
                },
                ["pick", x, y, k] => {
                    let picked = parse_bin(x, y).and_then(|bin| {
                        let index: usize =
                            k.parse().map_err(|_| format!("Invalid event index '{}'", k))?;
                        self.pick(bin, index).map_err(|e| e.to_string())
                    });
                    match picked {
                        Ok(record) => writeln!(
                            output,
                            "Case {} -> {} ({} E, {} N, {})",
                            record.case,
                            record.bundle,
                            record.lon,
                            record.lat,
                            record.time.format("%Y-%m-%d %H:%M:%S")
                        )?,
                        Err(e) => writeln!(output, "error: {}", e)?,
                    }
                }
                ["save", path] => match self.save_case_log(path) {
                    Ok(()) => writeln!(output, "Case log written to {}", path)?,
                    Err(e) => writeln!(output, "error: {}", e)?,
                },
                _ => writeln!(output, "Unknown command '{}'. Type 'help'.", line.trim())?,
            }
        }
        Ok(())
    }
}

fn parse_bin(x: &str, y: &str) -> Result<BinId, String> {
    let x = x.parse().map_err(|_| format!("Invalid bin index '{}'", x))?;
    let y = y.parse().map_err(|_| format!("Invalid bin index '{}'", y))?;
    Ok(BinId { x, y })
}
