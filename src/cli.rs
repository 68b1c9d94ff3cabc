//! # CLI Module
//!
//! Command-line interface for clickhist, including:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML) with inline overrides
//! - Environment variable support with the CLICKHIST_ prefix
//! - Subcommands for exploring, inspecting, templating and validation
//! - Shell completion generation

use crate::info::{dataset_info, print_info_human, print_info_json, print_info_yaml};
use crate::input::{BundleConfig, RegionConfig, SessionConfig};
use crate::session::Session;
use crate::storage::fetch_to_local;
use crate::variables::VarKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::time::Instant;

/// Bin-and-inspect explorer for regional subsets of gridded atmospheric datasets
#[derive(Parser, Debug)]
#[command(name = "clickhist")]
#[command(about = "Explore gridded atmospheric data through a clickable 2-D histogram")]
#[command(version)]
#[command(long_about = "
clickhist loads a regional subset of a gridded climate dataset (two catalog
variables over a lon/lat bounding box), bins the values into a 2-D histogram
with hand-tuned edges, and opens an interactive session where selecting a
histogram bin expands it into the underlying spatiotemporal events. Picking
an event rewrites a template visualization bundle centered on that event and
records it in the session's case log.

EXAMPLES:
  # Run a session from a configuration file
  clickhist explore --config session.json

  # Override the variable pair and region inline
  clickhist explore --config session.json -x Precip -y W500 \\
    --region '200:240:-25:15'

  # Drive a session from a command script and save the case log
  clickhist explore --config session.json --script picks.txt \\
    --save-log cases.parquet

  # Inspect a dataset before configuring a session
  clickhist info allVars_r90x45_3.nc4 --detailed

  # Generate a starter configuration
  clickhist template pacific --format yaml > session.yaml

  # Generate completions
  clickhist completions bash > ~/.bash_completion.d/clickhist
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for structured data
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "CLICKHIST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an interactive exploration session
    #[command(long_about = "
Run an interactive exploration session.

A configuration file provides the session parameters; every inline argument
overrides its configuration counterpart. Without a configuration file the
dataset and bundle template must be given inline.

The session prompt accepts: show, bin X Y, pick X Y K, save PATH, quit.

EXAMPLES:
  # From a configuration file
  clickhist explore --config session.json

  # Inline, against the default tropical Pacific region
  clickhist explore --dataset allVars_r90x45_3.nc4 \\
    --template template_smallarea.xidv -x Precip -y TEEF

  # Scripted, for batch picks
  clickhist explore --config session.json --script picks.txt
")]
    Explore {
        /// Input NetCDF dataset (local or S3)
        #[arg(long, env = "CLICKHIST_DATASET")]
        dataset: Option<String>,

        /// Variable binned on the x axis
        #[arg(short = 'x', long, value_parser = parse_var_kind)]
        x_var: Option<VarKind>,

        /// Variable binned on the y axis
        #[arg(short = 'y', long, value_parser = parse_var_kind)]
        y_var: Option<VarKind>,

        /// Region override: lon_low:lon_high:lat_low:lat_high
        #[arg(long, value_parser = parse_region, env = "CLICKHIST_REGION")]
        region: Option<RegionArg>,

        /// Bundle template path override
        #[arg(long, env = "CLICKHIST_TEMPLATE")]
        template: Option<String>,

        /// Case name override
        #[arg(long)]
        case_name: Option<String>,

        /// Maximum events listed per bin
        #[arg(long)]
        max_per_bin: Option<usize>,

        /// Read session commands from a file instead of stdin
        #[arg(long)]
        script: Option<PathBuf>,

        /// Write the case log here when the session ends (local or S3)
        #[arg(long)]
        save_log: Option<String>,
    },

    /// Show information about a NetCDF dataset
    #[command(long_about = "
Inspect a NetCDF dataset (local or S3) and display its dimensions,
variables and attributes.

EXAMPLES:
  clickhist info allVars_r90x45_3.nc4
  clickhist info allVars_r90x45_3.nc4 --detailed
  clickhist info s3://archive/allVars_r90x45_3.nc4 -n PREC --format json
")]
    Info {
        /// Dataset path (local or S3)
        file: String,

        /// Include global attributes
        #[arg(long)]
        detailed: bool,

        /// Show only this variable
        #[arg(short = 'n', long)]
        variable: Option<String>,

        /// Output format for dataset information
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate configuration templates
    #[command(long_about = "
Generate starter configuration files.

Available templates:
  pacific: the default precipitation vs TEEF session over the tropical
           central Pacific
  custom:  a skeleton with placeholders to fill in

EXAMPLES:
  clickhist template pacific
  clickhist template custom --format yaml -o session.yaml
")]
    Template {
        /// Template type to generate
        #[arg(value_enum)]
        template_type: TemplateType,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateType {
    /// Default tropical Pacific precipitation session
    Pacific,
    /// Skeleton with placeholders
    Custom,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}

/// Region argument from the command line
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionArg {
    pub lon_low: f64,
    pub lon_high: f64,
    pub lat_low: f64,
    pub lat_high: f64,
}

impl From<RegionArg> for RegionConfig {
    fn from(arg: RegionArg) -> Self {
        RegionConfig {
            lon_low: arg.lon_low,
            lon_high: arg.lon_high,
            lat_low: arg.lat_low,
            lat_high: arg.lat_high,
        }
    }
}

/// Parse a region from the command line
/// Format: lon_low:lon_high:lat_low:lat_high
fn parse_region(s: &str) -> Result<RegionArg, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 4 {
        return Err("Region must be in format 'lon_low:lon_high:lat_low:lat_high'".to_string());
    }

    let mut values = [0.0f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid coordinate value '{}'", part))?;
    }

    let [lon_low, lon_high, lat_low, lat_high] = values;
    if lon_low >= lon_high {
        return Err("Region lon_low must be less than lon_high".to_string());
    }
    if lat_low >= lat_high {
        return Err("Region lat_low must be less than lat_high".to_string());
    }

    Ok(RegionArg {
        lon_low,
        lon_high,
        lat_low,
        lat_high,
    })
}

/// Parse a catalog variable name from the command line
fn parse_var_kind(s: &str) -> Result<VarKind, String> {
    s.parse()
}

/// Builds the starter configuration for a template type.
pub fn template_config(template_type: TemplateType) -> SessionConfig {
    let (dataset, template, case_name, x_var, y_var) = match template_type {
        TemplateType::Pacific => (
            "allVars_r90x45_3.nc4",
            "template_smallarea.xidv",
            "my_first_session",
            VarKind::Precip,
            VarKind::Teef,
        ),
        TemplateType::Custom => (
            "path/to/dataset.nc4",
            "path/to/template.xidv",
            "session",
            VarKind::Precip,
            VarKind::W500,
        ),
    };

    SessionConfig {
        dataset: dataset.to_string(),
        x_var,
        y_var,
        region: RegionConfig::default(),
        coords: Default::default(),
        time_base: Default::default(),
        bundle: BundleConfig {
            template: template.to_string(),
            case_name: case_name.to_string(),
            output_dir: "cases".to_string(),
            lon_offset: 1.0,
            lat_offset: 1.0,
            seconds_from_center: 3 * 3600,
        },
        layout: Default::default(),
        x_edges: None,
        y_edges: None,
    }
}

/// Resolves the effective session configuration from the configuration file
/// and the inline overrides.
#[allow(clippy::too_many_arguments)]
fn resolve_session_config(
    config_path: Option<&PathBuf>,
    dataset: Option<String>,
    x_var: Option<VarKind>,
    y_var: Option<VarKind>,
    region: Option<RegionArg>,
    template: Option<String>,
    case_name: Option<String>,
    max_per_bin: Option<usize>,
) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => SessionConfig::from_file(path)?,
        None => {
            let dataset = dataset
                .clone()
                .ok_or("Either --config or --dataset is required")?;
            let template = template
                .clone()
                .ok_or("Either --config or --template is required")?;
            let mut base = template_config(TemplateType::Custom);
            base.dataset = dataset;
            base.bundle.template = template;
            base.bundle.case_name = "session".to_string();
            base
        }
    };

    if let Some(dataset) = dataset {
        config.dataset = dataset;
    }
    if let Some(x) = x_var {
        config.x_var = x;
    }
    if let Some(y) = y_var {
        config.y_var = y;
    }
    if let Some(region) = region {
        config.region = region.into();
    }
    if let Some(template) = template {
        config.bundle.template = template;
    }
    if let Some(case_name) = case_name {
        config.bundle.case_name = case_name;
    }
    if let Some(max) = max_per_bin {
        config.layout.max_per_bin = max;
    }

    if let Err(problems) = config.validate() {
        return Err(format!("Invalid session configuration:\n  {}", problems.join("\n  ")).into());
    }

    Ok(config)
}

/// Executes a parsed command line.
pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Explore {
            dataset,
            x_var,
            y_var,
            region,
            template,
            case_name,
            max_per_bin,
            script,
            save_log,
        } => {
            let start_time = Instant::now();
            let config = resolve_session_config(
                cli.config.as_ref(),
                dataset,
                x_var,
                y_var,
                region,
                template,
                case_name,
                max_per_bin,
            )?;

            if !cli.quiet {
                if let Some(path) = cli.config.as_ref() {
                    crate::log::show_greeting(&path.display().to_string());
                }
                crate::log::config_echo(&config);
            }

            let spinner = if cli.quiet {
                ProgressBar::hidden()
            } else {
                ProgressBar::new_spinner()
            };
            spinner.set_message(format!("Loading {}", config.dataset));
            spinner.enable_steady_tick(std::time::Duration::from_millis(120));

            // Keep the temp file handle alive while the dataset is open.
            let (_temp, local_path) = fetch_to_local(&config.dataset).await?;
            let mut session = Session::build(&config, &local_path)?;
            spinner.finish_and_clear();

            if !cli.quiet {
                crate::log::show_grid_info(session.grid());
            }

            match script {
                Some(path) => {
                    let file = std::fs::File::open(&path)
                        .map_err(|e| format!("Failed to open script '{}': {}", path.display(), e))?;
                    session.run_interactive(BufReader::new(file), std::io::stdout())?;
                }
                None => {
                    let stdin = std::io::stdin();
                    session.run_interactive(stdin.lock(), std::io::stdout())?;
                }
            }

            if let Some(path) = save_log {
                let df = session.case_log_dataframe()?;
                crate::output::write_case_log_async(&df, &path).await?;
                if !cli.quiet {
                    println!("Case log written to {}", path);
                }
            }

            if !cli.quiet {
                crate::log::show_farewell_with_timing(start_time.elapsed());
            }
            Ok(())
        }

        Commands::Info {
            file,
            detailed,
            variable,
            format,
        } => {
            let info = dataset_info(&file, variable.as_deref(), detailed).await?;
            match format.unwrap_or(cli.output_format) {
                OutputFormat::Human => print_info_human(&info),
                OutputFormat::Json => print_info_json(&info)?,
                OutputFormat::Yaml => print_info_yaml(&info)?,
            }
            Ok(())
        }

        Commands::Template {
            template_type,
            output,
            format,
        } => {
            let config = template_config(template_type);
            let rendered = match format {
                ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
                ConfigFormat::Yaml => serde_yaml::to_string(&config)?,
            };
            match output {
                Some(path) => std::fs::write(&path, rendered)?,
                None => println!("{}", rendered),
            }
            Ok(())
        }

        Commands::Validate { config_file } => {
            let path = config_file
                .or(cli.config)
                .ok_or("No configuration file given")?;
            let config = SessionConfig::from_file(&path)?;
            match config.validate() {
                Ok(()) => {
                    println!("{} is a valid session configuration", path.display());
                    println!("  {}", config.metadata());
                    Ok(())
                }
                Err(problems) => Err(format!(
                    "{} is invalid:\n  {}",
                    path.display(),
                    problems.join("\n  ")
                )
                .into()),
            }
        }

        Commands::Completions { shell, output } => {
            let mut cmd = Cli::command();
            match output {
                Some(path) => {
                    let mut file = std::fs::File::create(path)?;
                    clap_complete::generate(shell, &mut cmd, "clickhist", &mut file);
                    file.flush()?;
                }
                None => {
                    clap_complete::generate(shell, &mut cmd, "clickhist", &mut std::io::stdout());
                }
            }
            Ok(())
        }
    }
}
