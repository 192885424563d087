pub mod annual;
pub mod area;
pub mod baseline;
pub mod extent;
pub mod update;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
pub use annual::annual;
pub use area::area;
pub use baseline::baseline;
pub use extent::extent;
pub use update::update;

use crate::{
    extent::{extent_series, threshold, ExtentSeries, EXTENT_THRESHOLD},
    grid::{AreaGrid, ConcGrid},
    regions::{clip_area, clip_conc, Region},
};

/// Resolves an output file in the chosen data directory, defaulting to the
/// home directory.
pub fn output_path(data_dir: &Option<PathBuf>, file_name: &str) -> PathBuf {
    match data_dir {
        Some(dir) => dir.join(file_name),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(file_name),
    }
}

/// Clips both grids to the region boundary, blanking cells outside it.
pub fn clip_to_region(region: Region, grid: &mut ConcGrid, areas: &mut AreaGrid) -> Result<()> {
    check_coords(&grid.y, &areas.y)?;
    check_coords(&grid.x, &areas.x)?;

    let mask = region.mask(&grid.y, &grid.x);
    clip_conc(&mut grid.values, &mask);
    clip_area(&mut areas.values, &mask);

    Ok(())
}

/// The full per-region pipeline: clip to the boundary, threshold to a
/// binary ice mask, multiply by cell area and sum per day.
pub fn compute_region_series(
    region: Region,
    mut grid: ConcGrid,
    mut areas: AreaGrid,
) -> Result<ExtentSeries> {
    clip_to_region(region, &mut grid, &mut areas)?;

    let binary = threshold(&grid.values, EXTENT_THRESHOLD);
    extent_series(&grid.dates, &binary, &areas.values)
}

// The concentration and area grids come from different datasets; both sit on
// the 25 km grid, so their subsets must line up cell for cell.
fn check_coords(a: &[f64], b: &[f64]) -> Result<()> {
    let aligned = a.len() == b.len()
        && a.iter().zip(b.iter()).all(|(av, bv)| (av - bv).abs() < 1.0);

    if !aligned {
        return Err(anyhow!(
            "Concentration and cell-area grids are not on the same cells"
        ));
    }
    Ok(())
}

// -- Tests -------------------------------------------------------------------
