use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tempfile::TempDir;

use crate::{
    cli::{create_spinner, DataOpts},
    erddap::{SicDataset, CDR_DAILY_ID, CELL_AREA_ID, CONC_VARIABLE},
    export,
    regions::Region,
    stats,
};

use super::{compute_region_series, output_path};

/// Computes the month/day extent climatology over a baseline period and
/// writes one `baseline_<region>.csv` per region, with mean and standard
/// deviation per calendar day.
pub async fn baseline(
    start_year: i32,
    end_year: i32,
    region: Option<Region>,
    opts: &DataOpts,
) -> Result<String> {
    if end_year < start_year {
        return Err(anyhow!(
            "End year {} is before start year {}",
            end_year,
            start_year
        ));
    }

    let start = NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(end_year, 12, 31).unwrap();

    let regions: Vec<Region> = match region {
        Some(r) => vec![r],
        None => Region::all().to_vec(),
    };

    let work_dir = TempDir::new()?;
    let dataset = SicDataset::new(&opts.server, CDR_DAILY_ID, CONC_VARIABLE);

    let mut saved = Vec::new();
    for region in regions {
        let bbox = region.bounding_box();

        let bar = create_spinner(format!(
            "{}: downloading {}-{} concentration...",
            region.name(),
            start_year,
            end_year
        ));
        let grid = dataset
            .fetch_range_with_progress(start, end, &bbox, &work_dir, bar.clone())
            .await?;
        if grid.is_empty() {
            bar.finish_with_message(format!("{}: no data in period", region.name()));
            continue;
        }

        let areas = dataset
            .fetch_cell_areas(CELL_AREA_ID, &bbox, &work_dir)
            .await?;

        bar.set_message(format!("{}: computing climatology...", region.name()));
        let series = compute_region_series(region, grid, areas)?;
        let stats = stats::baseline(&series);
        bar.finish_with_message(format!(
            "{}: {} calendar days",
            region.name(),
            stats.len()
        ));

        let path = output_path(&opts.data_dir, &format!("baseline_{}.csv", region.slug()));
        export::write_baseline_csv(&path, &stats)?;
        saved.push(path.to_string_lossy().to_string());
    }

    if saved.is_empty() {
        return Err(anyhow!("No region produced a climatology"));
    }

    Ok(saved.join(", "))
}
