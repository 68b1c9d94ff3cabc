use crate::grid::LoadedGrid;
use crate::input::SessionConfig;
use std::time::Duration;

pub fn show_greeting(config_path: &str) {
    println!("=== Clickable Histogram Session ===");
    println!("Loading configuration from: {}", config_path);
}

pub fn config_echo(config: &SessionConfig) {
    println!("\nConfiguration:");
    println!("  Dataset: {}", config.dataset);
    println!(
        "  Variables: {} vs {}",
        config.x_var.spec().name,
        config.y_var.spec().name
    );
    println!(
        "  Region: {} to {} E, {} to {} N",
        config.region.lon_low, config.region.lon_high, config.region.lat_low, config.region.lat_high
    );
    println!("  Start: {}", config.time_base.start);
    println!("  Bundle template: {}", config.bundle.template);
    println!("  Case name: {}", config.bundle.case_name);
}

pub fn show_grid_info(grid: &LoadedGrid) {
    let (nt, ny, nx) = grid.shape();
    println!("\nLoaded Grid:");
    println!("  Shape: {} times x {} lats x {} lons", nt, ny, nx);
    println!(
        "  {}: {} ({})",
        grid.x_spec.name, grid.x_spec.dataset_name, grid.x_spec.units
    );
    println!(
        "  {}: {} ({})",
        grid.y_spec.name, grid.y_spec.dataset_name, grid.y_spec.units
    );
}

pub fn show_farewell_with_timing(elapsed: Duration) {
    println!("\n=== Session closed after {:.1?} ===", elapsed);
}
