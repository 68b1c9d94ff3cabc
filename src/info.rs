//! # Dataset Inspection Module
//!
//! Extracts and displays the structure of a NetCDF dataset: dimensions,
//! variables, attributes and shapes. Used by the `info` subcommand to check
//! that a dataset carries the coordinate and catalog variables a session
//! expects before loading it.

use crate::storage::fetch_to_local;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One dataset dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub name: String,
    pub length: usize,
    pub is_unlimited: bool,
}

/// One dataset variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub shape: Vec<usize>,
}

/// Complete structural description of a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub path: String,
    pub dimensions: Vec<DimensionInfo>,
    pub variables: Vec<VariableInfo>,
    pub global_attributes: HashMap<String, String>,
    pub file_size: Option<u64>,
    pub total_variables: usize,
    pub total_dimensions: usize,
}

/// Reads the structure of a dataset, optionally restricted to one variable.
///
/// Remote (`s3://`) datasets are spooled to a temporary file first.
pub async fn dataset_info(
    path: &str,
    variable: Option<&str>,
    detailed: bool,
) -> Result<DatasetInfo> {
    let (temp_file, local_path) = fetch_to_local(path)
        .await
        .with_context(|| format!("Failed to fetch dataset: {}", path))?;

    debug!("Opening dataset: {}", local_path);
    let file = netcdf::open(&local_path)
        .with_context(|| format!("Failed to open NetCDF dataset: {}", path))?;

    let file_size = if temp_file.is_some() {
        None
    } else {
        tokio::fs::metadata(&local_path)
            .await
            .ok()
            .map(|metadata| metadata.len())
    };

    let mut dimensions = Vec::new();
    for dim in file.dimensions() {
        dimensions.push(DimensionInfo {
            name: dim.name().to_string(),
            length: dim.len(),
            is_unlimited: dim.is_unlimited(),
        });
    }

    let mut variables = Vec::new();
    for var in file.variables() {
        if let Some(wanted) = variable {
            if var.name() != wanted {
                continue;
            }
        }

        let mut attributes = HashMap::new();
        for attr in var.attributes() {
            if let Ok(value) = attr.value() {
                attributes.insert(attr.name().to_string(), format!("{:?}", value));
            }
        }

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        variables.push(VariableInfo {
            name: var.name().to_string(),
            data_type: format!("{:?}", var.vartype()),
            dimensions: var
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
            attributes,
            shape,
        });
    }

    let mut global_attributes = HashMap::new();
    if detailed {
        for attr in file.attributes() {
            if let Ok(value) = attr.value() {
                global_attributes.insert(attr.name().to_string(), format!("{:?}", value));
            }
        }
    }

    file.close().context("Failed to close NetCDF dataset")?;
    drop(temp_file);

    Ok(DatasetInfo {
        path: path.to_string(),
        total_dimensions: dimensions.len(),
        total_variables: variables.len(),
        dimensions,
        variables,
        global_attributes,
        file_size,
    })
}

/// Prints dataset info in human-readable form.
pub fn print_info_human(info: &DatasetInfo) {
    println!("Dataset Information:");
    println!("  Path: {}", info.path);
    if let Some(size) = info.file_size {
        println!("  File Size: {:.2} MB", size as f64 / 1_048_576.0);
    }
    println!("  Dimensions: {} total", info.total_dimensions);
    for dim in &info.dimensions {
        println!(
            "    {} ({}{})",
            dim.name,
            dim.length,
            if dim.is_unlimited { ", unlimited" } else { "" }
        );
    }
    println!("  Variables: {} total", info.total_variables);
    for var in &info.variables {
        println!(
            "    {} ({}) - dimensions: [{}]",
            var.name,
            var.data_type,
            var.dimensions.join(", ")
        );
        for (name, value) in &var.attributes {
            println!("      @{}: {}", name, value);
        }
    }
    if !info.global_attributes.is_empty() {
        println!("  Global Attributes:");
        for (name, value) in &info.global_attributes {
            println!("    @{}: {}", name, value);
        }
    }
}

/// Prints dataset info as JSON.
pub fn print_info_json(info: &DatasetInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

/// Prints dataset info as YAML.
pub fn print_info_yaml(info: &DatasetInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize dataset info to YAML")?;
    println!("{}", yaml);
    Ok(())
}
