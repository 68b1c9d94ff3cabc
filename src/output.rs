//! # Case Log Output
//!
//! Persists the session's case log (one row per picked event) as Parquet,
//! locally or on S3. S3 targets are written to a temporary file first and
//! uploaded whole.

use crate::storage::{ObjectStore, Store};
use log::debug;
use polars::prelude::*;
use std::fs::File;

/// Writes the case log DataFrame to a local Parquet file.
pub fn write_case_log(df: &DataFrame, output_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    debug!("Writing case log to {}", output_path);
    debug!("Case log shape: {:?}", df.shape());
    debug!("Case log schema:\n{:?}", df.schema());

    let file = File::create(output_path)?;
    let writer = ParquetWriter::new(file);
    let mut df_clone = df.clone();
    writer.finish(&mut df_clone)?;
    Ok(())
}

/// Writes the case log to a local path or an `s3://` target.
pub async fn write_case_log_async(
    df: &DataFrame,
    output_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if crate::storage::is_remote(output_path) {
        let temp_file = tempfile::NamedTempFile::new()?;
        let temp_path = temp_file
            .path()
            .to_str()
            .ok_or("Temporary path is not valid UTF-8")?;

        write_case_log(df, temp_path)?;

        let store = Store::for_path(output_path).await;
        let data = tokio::fs::read(temp_file.path()).await?;
        store.write(output_path, &data).await?;
        debug!("Case log uploaded to {}", output_path);
    } else {
        write_case_log(df, output_path)?;
    }
    Ok(())
}
