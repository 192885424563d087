use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use futures::future::join_all;
use indicatif::MultiProgress;
use tempfile::TempDir;

use crate::{
    cli::{create_multi_spinner, DataOpts},
    erddap::{SicDataset, CDR_DAILY_ID, CELL_AREA_ID, CONC_VARIABLE},
    export,
    regions::Region,
};

use super::{compute_region_series, output_path};

/// Computes the daily extent series from the CDR product and writes one
/// `extent_<region>.csv` per region. Regions are processed concurrently.
pub async fn extent(
    start: NaiveDate,
    end: NaiveDate,
    region: Option<Region>,
    opts: &DataOpts,
) -> Result<String> {
    if end < start {
        return Err(anyhow!("End date {} is before start date {}", end, start));
    }

    let regions: Vec<Region> = match region {
        Some(r) => vec![r],
        None => Region::all().to_vec(),
    };

    let progress = MultiProgress::new();
    let tasks: Vec<_> = regions
        .into_iter()
        .map(|region| {
            let server = opts.server.clone();
            let data_dir = opts.data_dir.clone();
            let progress = progress.clone();
            tokio::spawn(async move {
                process_region(region, server, data_dir, start, end, progress).await
            })
        })
        .collect();

    let mut saved = Vec::new();
    for result in join_all(tasks).await {
        match result {
            Ok(Ok(path)) => saved.push(path.to_string_lossy().to_string()),
            Ok(Err(e)) => eprintln!("Error processing region: {:?}", e),
            Err(e) => eprintln!("Task join error: {:?}", e),
        }
    }

    if saved.is_empty() {
        return Err(anyhow!("No region produced an extent series"));
    }

    Ok(saved.join(", "))
}

async fn process_region(
    region: Region,
    server: String,
    data_dir: Option<PathBuf>,
    start: NaiveDate,
    end: NaiveDate,
    progress: MultiProgress,
) -> Result<PathBuf> {
    let work_dir = TempDir::new()?;
    let dataset = SicDataset::new(&server, CDR_DAILY_ID, CONC_VARIABLE);
    let bbox = region.bounding_box();

    let bar = create_multi_spinner(
        &progress,
        format!("{}: downloading concentration...", region.name()),
    );
    let grid = dataset.fetch_range(start, end, &bbox, &work_dir).await?;
    if grid.is_empty() {
        bar.finish_with_message(format!("{}: no data in range", region.name()));
        return Err(anyhow!(
            "{} holds no data between {} and {}",
            dataset.id(),
            start,
            end
        ));
    }

    bar.set_message(format!("{}: downloading cell areas...", region.name()));
    let areas = dataset
        .fetch_cell_areas(CELL_AREA_ID, &bbox, &work_dir)
        .await?;

    bar.set_message(format!("{}: computing extent...", region.name()));
    let series = compute_region_series(region, grid, areas)?;
    bar.finish_with_message(format!(
        "{}: {} days computed",
        region.name(),
        series.points.len()
    ));

    let path = output_path(&data_dir, &format!("extent_{}.csv", region.slug()));
    export::write_extent_csv(&path, &series)?;

    Ok(path)
}
