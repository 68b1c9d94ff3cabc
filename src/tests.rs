use crate::bundle::CaseWriter;
use crate::grid::{self, nearest_index, slice_bounds};
use crate::hist::{bin_index, BinId, Histogram2d};
use crate::input::{BundleConfig, RegionConfig, SessionConfig};
use crate::session::Session;
use crate::variables::{VarKind, EDGE_COUNT};
use std::path::Path;
use tempfile::TempDir;

const NT: usize = 4;
const NY: usize = 6;
const NX: usize = 8;

/// Writes a small dataset with the session's expected layout:
/// `PREC` and `TEEF` as `[time, lat, lon]` grids over a 45x5-degree box,
/// time stored in minutes.
fn write_test_dataset(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let lon: Vec<f64> = (0..NX).map(|i| 180.0 + i as f64 * 5.0).collect();
    let lat: Vec<f64> = (0..NY).map(|j| -10.0 + j as f64 * 5.0).collect();
    let time: Vec<f64> = (0..NT).map(|t| t as f64 * 180.0).collect();

    let mut prec = Vec::with_capacity(NT * NY * NX);
    let mut teef = Vec::with_capacity(NT * NY * NX);
    for t in 0..NT {
        for j in 0..NY {
            for i in 0..NX {
                let s = (t + j + i) as f64;
                // Scales to s * 8.64 mm day-1 after the catalog multiplier
                prec.push(s * 1.0e-4);
                teef.push(10.0 * s - 25.0);
            }
        }
    }

    let mut file = netcdf::create(path)?;
    file.add_attribute("title", "clickhist test dataset")?;
    file.add_dimension("time", NT)?;
    file.add_dimension("lat", NY)?;
    file.add_dimension("lon", NX)?;

    {
        let mut var = file.add_variable::<f64>("lon", &["lon"])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_values(&lon, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("lat", &["lat"])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_values(&lat, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("units", "minutes since 2005-05-16 00:30:00")?;
        var.put_values(&time, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("PREC", &["time", "lat", "lon"])?;
        var.put_attribute("units", "kg m-2 s-1")?;
        var.put_values(&prec, ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("TEEF", &["time", "lat", "lon"])?;
        var.put_attribute("units", "J m kg-1 s-1")?;
        var.put_values(&teef, ..)?;
    }

    Ok(())
}

const TEST_TEMPLATE: &str = "\
<bundle name=\"%caseName%\">\n\
  <area minLon=\"%minLon%\" maxLon=\"%maxLon%\" minLat=\"%minLat%\" maxLat=\"%maxLat%\"/>\n\
  <window start=\"%startTime%\" end=\"%endTime%\"/>\n\
  <center lon=\"%centerLon%\" lat=\"%centerLat%\" time=\"%centerTime%\"/>\n\
  <display mode=\"%displayMode%\"/>\n\
</bundle>\n";

/// A session configuration over the middle of the test dataset:
/// lon window 185..=205 (5 points), lat window -5..=10 (4 points).
fn test_config(dataset: String, template: String, out_dir: String) -> SessionConfig {
    SessionConfig {
        dataset,
        x_var: VarKind::Precip,
        y_var: VarKind::Teef,
        region: RegionConfig {
            lon_low: 185.0,
            lon_high: 205.0,
            lat_low: -5.0,
            lat_high: 10.0,
        },
        coords: Default::default(),
        time_base: Default::default(),
        bundle: BundleConfig {
            template,
            case_name: "session".to_string(),
            output_dir: out_dir,
            lon_offset: 1.0,
            lat_offset: 1.0,
            seconds_from_center: 3 * 3600,
        },
        layout: Default::default(),
        x_edges: None,
        y_edges: None,
    }
}

/// Generates the dataset and template under `dir` and wires a session.
fn build_test_session(dir: &TempDir) -> Session {
    let dataset = dir.path().join("test_data.nc");
    write_test_dataset(&dataset).unwrap();
    let template = dir.path().join("template.xidv");
    std::fs::write(&template, TEST_TEMPLATE).unwrap();

    let config = test_config(
        dataset.to_str().unwrap().to_string(),
        template.to_str().unwrap().to_string(),
        dir.path().join("cases").to_str().unwrap().to_string(),
    );
    Session::build(&config, &config.dataset).unwrap()
}

#[cfg(test)]
mod variable_tests {
    use super::*;

    #[test]
    fn test_catalog_edges_strictly_increasing() {
        for kind in VarKind::all() {
            let spec = kind.spec();
            assert_eq!(spec.edges.len(), EDGE_COUNT);
            for pair in spec.edges.windows(2) {
                assert!(
                    pair[0] < pair[1],
                    "{} edges not strictly increasing: {} then {}",
                    spec.name,
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn test_catalog_dataset_names_and_scales() {
        assert_eq!(VarKind::Precip.spec().dataset_name, "PREC");
        assert_eq!(VarKind::Precip.spec().scale, 86400.0);
        assert_eq!(VarKind::W500.spec().dataset_name, "W");
        assert_eq!(VarKind::ZSkeDot.spec().scale, 1000.0);
        assert_eq!(VarKind::Teef.spec().units, "J m kg-1 s-1");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(VarKind::Precip.spec().format_value(42.0), " 42");
        assert_eq!(VarKind::W500.spec().format_value(0.1234), "0.123");
        assert_eq!(VarKind::WPuP.spec().format_value(-0.456), "-0.46");
        assert_eq!(VarKind::Hmv.spec().format_value(8.0), " 8");
    }

    #[test]
    fn test_parse_variable_names() {
        assert_eq!("Precip".parse::<VarKind>().unwrap(), VarKind::Precip);
        assert_eq!("teef".parse::<VarKind>().unwrap(), VarKind::Teef);
        assert_eq!("wPuP".parse::<VarKind>().unwrap(), VarKind::WPuP);
        assert_eq!("ZSKEDot".parse::<VarKind>().unwrap(), VarKind::ZSkeDot);

        let err = "Vorticity".parse::<VarKind>().unwrap_err();
        assert!(err.contains("Precip"));
    }
}

#[cfg(test)]
mod input_tests {
    use super::*;

    #[test]
    fn test_session_config_from_json() {
        let json = r#"
        {
            "dataset": "allVars_r90x45_3.nc4",
            "x_var": "Precip",
            "y_var": "TEEF",
            "region": { "lon_low": 200.0, "lon_high": 240.0,
                        "lat_low": -25.0, "lat_high": 15.0 },
            "bundle": { "template": "template_smallarea.xidv" }
        }"#;

        let config = SessionConfig::from_json(json).unwrap();
        assert_eq!(config.dataset, "allVars_r90x45_3.nc4");
        assert_eq!(config.x_var, VarKind::Precip);
        assert_eq!(config.y_var, VarKind::Teef);
        assert_eq!(config.region.lon_low, 200.0);
        assert_eq!(config.bundle.template, "template_smallarea.xidv");
    }

    #[test]
    fn test_defaults_applied() {
        let json = r#"
        {
            "dataset": "data.nc4",
            "x_var": "W500",
            "y_var": "HMV",
            "bundle": { "template": "t.xidv" }
        }"#;

        let config = SessionConfig::from_json(json).unwrap();
        assert_eq!(config.region.lon_low, 200.0);
        assert_eq!(config.region.lon_high, 240.0);
        assert_eq!(config.coords.lon, "lon");
        assert_eq!(config.time_base.scale, 60.0);
        assert_eq!(
            config.time_base.start.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2005-05-16 00:30:00"
        );
        assert_eq!(config.bundle.case_name, "session");
        assert_eq!(config.bundle.seconds_from_center, 3 * 3600);
        assert_eq!(config.layout.max_per_bin, 1000);
        assert_eq!(config.layout.dpi, 150);
    }

    #[test]
    fn test_session_config_from_yaml() {
        let yaml = "
dataset: data.nc4
x_var: Precip
y_var: wPuP
bundle:
  template: t.xidv
  case_name: storms
";
        let config = SessionConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.y_var, VarKind::WPuP);
        assert_eq!(config.bundle.case_name, "storms");
    }

    #[test]
    fn test_validate_collects_problems() {
        let mut config = test_config("d.nc4".into(), "t.xidv".into(), "cases".into());
        config.region.lon_low = 250.0; // above lon_high
        config.layout.max_per_bin = 0;
        config.x_edges = Some(vec![1.0, 1.0, 2.0]);

        let problems = config.validate().unwrap_err();
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("lon_low")));
        assert!(problems.iter().any(|p| p.contains("max_per_bin")));
        assert!(problems.iter().any(|p| p.contains("x_edges")));
    }

    #[test]
    fn test_metadata_string() {
        let config = test_config("d.nc4".into(), "t.xidv".into(), "cases".into());
        assert_eq!(config.metadata(), "Precip vs TEEF: 185 to 205 E, -5 to 10 N");
    }

    #[test]
    fn test_manual_edge_override() {
        let mut config = test_config("d.nc4".into(), "t.xidv".into(), "cases".into());
        assert_eq!(config.x_bin_edges(), VarKind::Precip.spec().edges.to_vec());

        config.x_edges = Some(vec![0.0, 10.0, 20.0]);
        assert_eq!(config.x_bin_edges(), vec![0.0, 10.0, 20.0]);
        assert!(config.validate().is_ok());
    }
}

#[cfg(test)]
mod grid_tests {
    use super::*;

    #[test]
    fn test_nearest_index_is_closest() {
        let coords = [0.0, 5.0, 10.0, 15.0];
        for target in [-3.0, 0.0, 2.4, 6.0, 9.9, 14.0, 99.0] {
            let idx = nearest_index(&coords, target).unwrap();
            let best = (coords[idx] - target).abs();
            for &c in &coords {
                assert!(best <= (c - target).abs());
            }
        }
    }

    #[test]
    fn test_nearest_index_tie_takes_lower() {
        let coords = [0.0, 5.0, 10.0];
        assert_eq!(nearest_index(&coords, 2.5), Some(0));
        assert_eq!(nearest_index(&coords, 7.5), Some(1));
    }

    #[test]
    fn test_nearest_index_empty_and_clamping() {
        assert_eq!(nearest_index(&[], 1.0), None);

        let coords = [0.0, 5.0, 10.0];
        assert_eq!(nearest_index(&coords, -100.0), Some(0));
        assert_eq!(nearest_index(&coords, 100.0), Some(2));
    }

    #[test]
    fn test_slice_bounds_normalized_for_descending_axes() {
        let descending = [15.0, 10.0, 5.0, 0.0];
        let (start, end) = slice_bounds(&descending, 4.0, 11.0).unwrap();
        assert!(start <= end);
        assert_eq!((start, end), (1, 2));
    }

    #[test]
    fn test_load_grid_region_and_axis_order() {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("test_data.nc");
        write_test_dataset(&dataset).unwrap();

        let config = test_config(
            dataset.to_str().unwrap().to_string(),
            "t.xidv".into(),
            "cases".into(),
        );
        let grid = grid::load_grid(&config.dataset, &config).unwrap();

        assert_eq!(grid.shape(), (NT, 4, 5));
        assert!(grid.axes_consistent());
        assert_eq!(grid.lon, vec![185.0, 190.0, 195.0, 200.0, 205.0]);
        assert_eq!(grid.lat, vec![-5.0, 0.0, 5.0, 10.0]);
        // minutes scaled to seconds
        assert_eq!(grid.time, vec![0.0, 10800.0, 21600.0, 32400.0]);

        // [time, lat, lon] order: sliced (t, j, i) maps to raw (t, j+1, i+1)
        for ((t, j, i), &value) in grid.x.indexed_iter() {
            let expected = (t + j + i + 2) as f64 * 8.64;
            assert!(
                (value - expected).abs() < 1.0e-9,
                "x[{},{},{}] = {}, expected {}",
                t,
                j,
                i,
                value,
                expected
            );
        }
        assert!((grid.y[[1, 2, 3]] - (10.0 * 8.0 - 25.0)).abs() < 1.0e-9);
    }

    #[test]
    fn test_unit_multiplier_inverts() {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("test_data.nc");
        write_test_dataset(&dataset).unwrap();

        let config = test_config(
            dataset.to_str().unwrap().to_string(),
            "t.xidv".into(),
            "cases".into(),
        );
        let grid = grid::load_grid(&config.dataset, &config).unwrap();

        let inverse = 1.0 / grid.x_spec.scale;
        for ((t, j, i), &value) in grid.x.indexed_iter() {
            let raw = (t + j + i + 2) as f64 * 1.0e-4;
            assert!((value * inverse - raw).abs() < 1.0e-12);
        }
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("test_data.nc");
        write_test_dataset(&dataset).unwrap();

        let mut config = test_config(
            dataset.to_str().unwrap().to_string(),
            "t.xidv".into(),
            "cases".into(),
        );
        config.y_var = VarKind::Hmv; // not present in the test dataset

        let err = grid::load_grid(&config.dataset, &config).unwrap_err();
        assert!(err.to_string().contains("HMV"));
    }
}

#[cfg(test)]
mod hist_tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_bin_index_semantics() {
        let edges = VarKind::Precip.spec().edges;

        assert_eq!(bin_index(&edges, -0.1), None);
        assert_eq!(bin_index(&edges, 0.0), Some(0));
        assert_eq!(bin_index(&edges, 0.5), Some(0));
        assert_eq!(bin_index(&edges, 1.0), Some(1));
        assert_eq!(bin_index(&edges, 95.0), Some(10));
        assert_eq!(bin_index(&edges, 200.0), Some(11));
        // last bin closes on its upper edge
        assert_eq!(bin_index(&edges, 250.0), Some(11));
        assert_eq!(bin_index(&edges, 250.1), None);
    }

    fn small_grids() -> (Array3<f64>, Array3<f64>) {
        // 2 x 1 x 3: x values spread over bins 0/1/11, one y outlier
        let x = Array3::from_shape_vec((2, 1, 3), vec![0.5, 5.0, 200.0, 0.5, 5.0, 200.0]).unwrap();
        let y = Array3::from_shape_vec((2, 1, 3), vec![0.0, 100.0, 400.0, 9999.0, 100.0, 400.0])
            .unwrap();
        (x, y)
    }

    #[test]
    fn test_build_counts_match_membership() {
        let (x, y) = small_grids();
        let hist = Histogram2d::build(
            &x,
            &y,
            VarKind::Precip.spec().edges.to_vec(),
            VarKind::Teef.spec().edges.to_vec(),
        )
        .unwrap();

        assert_eq!(hist.total() + hist.dropped(), 6);
        assert_eq!(hist.dropped(), 1);

        for (bin, count) in hist.counts() {
            assert_eq!(hist.events_in(bin).unwrap().len(), count);
        }

        // the y outlier at (1, 0, 0) leaves only the first time step here
        let first_bin = BinId { x: 0, y: 0 };
        assert_eq!(hist.count(first_bin).unwrap(), 1);
    }

    #[test]
    fn test_event_indices_preserve_axis_order() {
        let (x, y) = small_grids();
        let hist = Histogram2d::build(
            &x,
            &y,
            VarKind::Precip.spec().edges.to_vec(),
            VarKind::Teef.spec().edges.to_vec(),
        )
        .unwrap();

        let events = hist.events_in(BinId { x: 1, y: 3 }).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!((events[0].time, events[0].lat, events[0].lon), (0, 0, 1));
        assert_eq!((events[1].time, events[1].lat, events[1].lon), (1, 0, 1));
    }

    #[test]
    fn test_sampled_events_deterministic_ordered_subset() {
        let x = Array3::from_elem((30, 1, 1), 5.0);
        let y = Array3::from_elem((30, 1, 1), 100.0);
        let hist = Histogram2d::build(
            &x,
            &y,
            VarKind::Precip.spec().edges.to_vec(),
            VarKind::Teef.spec().edges.to_vec(),
        )
        .unwrap();

        let bin = BinId { x: 1, y: 3 };
        assert_eq!(hist.count(bin).unwrap(), 30);

        let sampled = hist.sampled_events_in(bin, 10).unwrap();
        assert!(sampled.len() <= 10);
        assert!(!sampled.is_empty());

        // order-preserving subset of the full membership
        let all = hist.events_in(bin).unwrap();
        let mut cursor = 0;
        for event in &sampled {
            let pos = all[cursor..].iter().position(|e| e == event);
            assert!(pos.is_some(), "sampled event not found in order");
            cursor += pos.unwrap() + 1;
        }

        // deterministic between calls
        assert_eq!(sampled, hist.sampled_events_in(bin, 10).unwrap());

        // caps respect small limits
        assert_eq!(hist.sampled_events_in(bin, 1).unwrap().len(), 1);
        assert_eq!(hist.sampled_events_in(bin, 0).unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_inputs() {
        let (x, y) = small_grids();

        assert!(Histogram2d::build(&x, &y, vec![1.0], vec![0.0, 1.0]).is_err());
        assert!(Histogram2d::build(&x, &y, vec![1.0, 1.0], vec![0.0, 1.0]).is_err());

        let wrong = Array3::from_elem((1, 1, 1), 0.0);
        assert!(Histogram2d::build(&x, &wrong, vec![0.0, 1.0], vec![0.0, 1.0]).is_err());

        let hist = Histogram2d::build(
            &x,
            &y,
            VarKind::Precip.spec().edges.to_vec(),
            VarKind::Teef.spec().edges.to_vec(),
        )
        .unwrap();
        assert!(hist.events_in(BinId { x: 12, y: 0 }).is_err());
    }
}

#[cfg(test)]
mod bundle_tests {
    use super::*;
    use chrono::NaiveDate;

    fn center() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2005, 5, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_render_substitutes_documented_tokens() {
        let writer = CaseWriter::from_template_text(
            TEST_TEMPLATE.to_string(),
            "cases",
            "storms",
            1.0,
            1.5,
            3 * 3600,
        );

        let rendered = writer.render(220.0, -12.5, center()).unwrap();
        assert!(rendered.contains("name=\"storms\""));
        assert!(rendered.contains("minLon=\"219\""));
        assert!(rendered.contains("maxLon=\"221\""));
        assert!(rendered.contains("minLat=\"-14\""));
        assert!(rendered.contains("maxLat=\"-11\""));
        assert!(rendered.contains("start=\"2005-05-17 09:00:00\""));
        assert!(rendered.contains("end=\"2005-05-17 15:00:00\""));
        assert!(rendered.contains("lon=\"220\" lat=\"-12.5\" time=\"2005-05-17 12:00:00\""));
        // unrecognized tokens pass through untouched
        assert!(rendered.contains("%displayMode%"));
    }

    #[test]
    fn test_write_case_numbers_files() {
        let dir = TempDir::new().unwrap();
        let mut writer = CaseWriter::from_template_text(
            TEST_TEMPLATE.to_string(),
            dir.path().join("cases"),
            "session",
            1.0,
            1.0,
            3600,
        );

        let first = writer.write_case(200.0, 0.0, center()).unwrap();
        let second = writer.write_case(205.0, 5.0, center()).unwrap();

        assert!(first.ends_with("session_001.xidv"));
        assert!(second.ends_with("session_002.xidv"));
        assert!(first.exists());
        assert!(second.exists());
        assert_eq!(writer.written(), 2);
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;
    use std::io::Cursor;

    fn populated_bin(session: &Session, min_count: usize) -> BinId {
        session
            .hist()
            .counts()
            .into_iter()
            .find(|(_, count)| *count >= min_count)
            .map(|(bin, _)| bin)
            .expect("test dataset fills enough bins")
    }

    #[test]
    fn test_session_build_bins_every_sample() {
        let dir = TempDir::new().unwrap();
        let session = build_test_session(&dir);

        // 4 times x 4 lats x 5 lons, all values inside the outer edges
        assert_eq!(session.hist().total(), 80);
        assert_eq!(session.hist().dropped(), 0);
        assert_eq!(session.metadata(), "Precip vs TEEF: 185 to 205 E, -5 to 10 N");
    }

    #[test]
    fn test_open_session_builds_from_config() {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("test_data.nc");
        write_test_dataset(&dataset).unwrap();
        let template = dir.path().join("template.xidv");
        std::fs::write(&template, TEST_TEMPLATE).unwrap();

        let config = test_config(
            dataset.to_str().unwrap().to_string(),
            template.to_str().unwrap().to_string(),
            dir.path().join("cases").to_str().unwrap().to_string(),
        );
        let session = crate::open_session(&config, &config.dataset).unwrap();
        assert_eq!(session.grid().shape(), (NT, 4, 5));
    }

    #[test]
    fn test_pick_writes_bundle_and_records_case() {
        let dir = TempDir::new().unwrap();
        let mut session = build_test_session(&dir);

        let bin = populated_bin(&session, 1);
        let events = session.select(bin).unwrap();
        assert!(!events.is_empty());

        let record = session.pick(bin, 0).unwrap();
        assert_eq!(record.case, 1);
        assert!(Path::new(&record.bundle).exists());

        let (x_value, y_value) = session.event_values(events[0]);
        assert_eq!(record.x_value, x_value);
        assert_eq!(record.y_value, y_value);

        let (lon, lat, when) = session.event_position(events[0]);
        assert_eq!(record.lon, lon);
        assert_eq!(record.lat, lat);
        assert_eq!(record.time, when);

        let rendered = std::fs::read_to_string(&record.bundle).unwrap();
        assert!(rendered.contains(&format!("lon=\"{}\"", lon)));

        assert!(session.pick(bin, events.len()).is_err());
        assert_eq!(session.case_log().len(), 1);
    }

    #[test]
    fn test_event_position_uses_time_base() {
        let dir = TempDir::new().unwrap();
        let session = build_test_session(&dir);

        let event = crate::hist::Event {
            time: 2,
            lat: 0,
            lon: 0,
        };
        let (lon, lat, when) = session.event_position(event);
        assert_eq!(lon, 185.0);
        assert_eq!(lat, -5.0);
        // start 2005-05-16 00:30:00 plus 360 minutes
        assert_eq!(
            when.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2005-05-16 06:30:00"
        );
    }

    #[test]
    fn test_interactive_script_matches_direct_picks() {
        let dir_a = TempDir::new().unwrap();
        let mut scripted = build_test_session(&dir_a);
        let bin = populated_bin(&scripted, 1);

        let script = format!(
            "show\nbin {x} {y}\npick {x} {y} 0\nquit\n",
            x = bin.x,
            y = bin.y
        );
        let mut transcript = Vec::new();
        scripted
            .run_interactive(Cursor::new(script), &mut transcript)
            .unwrap();

        let dir_b = TempDir::new().unwrap();
        let mut direct = build_test_session(&dir_b);
        let expected = direct.pick(bin, 0).unwrap();

        assert_eq!(scripted.case_log().len(), 1);
        let got = &scripted.case_log()[0];
        assert_eq!(got.case, expected.case);
        assert_eq!(got.lon, expected.lon);
        assert_eq!(got.lat, expected.lat);
        assert_eq!(got.time, expected.time);
        assert_eq!(got.x_value, expected.x_value);
        assert_eq!(got.y_value, expected.y_value);

        let transcript = String::from_utf8(transcript).unwrap();
        assert!(transcript.contains("events binned"));
        assert!(transcript.contains("Case 1"));
    }

    #[test]
    fn test_interactive_reports_errors_and_continues() {
        let dir = TempDir::new().unwrap();
        let mut session = build_test_session(&dir);

        let script = "bin 99 99\nnonsense\nquit\n";
        let mut transcript = Vec::new();
        session
            .run_interactive(Cursor::new(script.to_string()), &mut transcript)
            .unwrap();

        let transcript = String::from_utf8(transcript).unwrap();
        assert!(transcript.contains("error:"));
        assert!(transcript.contains("Unknown command"));
    }

    #[test]
    fn test_case_log_dataframe_and_parquet() {
        let dir = TempDir::new().unwrap();
        let mut session = build_test_session(&dir);

        let bin = populated_bin(&session, 1);
        session.pick(bin, 0).unwrap();
        session.pick(bin, 1).unwrap();

        let df = session.case_log_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 7));
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert!(names.contains(&"Precip".to_string()));
        assert!(names.contains(&"TEEF".to_string()));
        assert!(names.contains(&"bundle".to_string()));

        let log_path = dir.path().join("cases.parquet");
        session
            .save_case_log(log_path.to_str().unwrap())
            .unwrap();
        let written = std::fs::metadata(&log_path).unwrap();
        assert!(written.len() > 0);
    }
}
