use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use tempfile::TempDir;

use crate::{
    cli::{create_spinner, DataOpts},
    erddap::{SicDataset, CELL_AREA_ID, CONC_VARIABLE, NRT_DAILY_ID},
    export,
    regions::Region,
};

use super::{compute_region_series, output_path};

/// Appends the days after the last recorded date to each region's
/// `nrt_extent_<region>.csv`, from the near-real-time product. Meant for a
/// daily cron-style run; finding no new data is a normal outcome.
pub async fn update(opts: &DataOpts) -> Result<String> {
    let work_dir = TempDir::new()?;
    let dataset = SicDataset::new(&opts.server, NRT_DAILY_ID, CONC_VARIABLE);

    let latest = dataset.latest_date(&work_dir).await?;
    let end = latest.min(Local::now().date_naive());

    let mut updated = Vec::new();
    for region in Region::all() {
        let path = output_path(&opts.data_dir, &format!("nrt_extent_{}.csv", region.slug()));

        // A missing or empty file is seeded from the start of the year.
        let seeding = !path.exists();
        let start = if seeding {
            year_start(end)
        } else {
            match export::last_recorded_date(&path)? {
                Some(last) => last + Duration::days(1),
                None => year_start(end),
            }
        };

        if start > end {
            println!("{}: no new data", region.name());
            continue;
        }

        let bar = create_spinner(format!(
            "{}: fetching {} through {}...",
            region.name(),
            start,
            end
        ));
        let bbox = region.bounding_box();
        let grid = dataset.fetch_range(start, end, &bbox, &work_dir).await?;
        if grid.is_empty() {
            bar.finish_with_message(format!("{}: no new data", region.name()));
            continue;
        }

        let areas = dataset
            .fetch_cell_areas(CELL_AREA_ID, &bbox, &work_dir)
            .await?;
        let series = compute_region_series(region, grid, areas)?;

        if seeding {
            export::write_extent_csv(&path, &series)?;
        } else {
            export::append_extent_csv(&path, &series)?;
        }
        bar.finish_with_message(format!(
            "{}: appended {} days",
            region.name(),
            series.points.len()
        ));
        updated.push(path.to_string_lossy().to_string());
    }

    if updated.is_empty() {
        Ok("No new data available".to_string())
    } else {
        Ok(updated.join(", "))
    }
}

fn year_start(date: NaiveDate) -> NaiveDate {
    use chrono::Datelike;
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_seed_from_start_of_year() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 7).unwrap();
        assert_eq!(year_start(date), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
