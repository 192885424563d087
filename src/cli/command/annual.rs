use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tempfile::TempDir;

use crate::{
    cli::{create_progress_bar, DataOpts},
    erddap::{SicDataset, CDR_DAILY_ID, CELL_AREA_ID, CONC_VARIABLE, NRT_DAILY_ID},
    export,
    extent::ExtentSeries,
    grid::{AreaGrid, ConcGrid},
    regions::Region,
    stats,
};

use super::{compute_region_series, output_path};

/// Computes the mean extent per ice year (September 1 through August 31)
/// for every region. Historical years come from the CDR product; years past
/// its coverage fall through to the near-real-time product.
pub async fn annual(start_year: i32, end_year: i32, opts: &DataOpts) -> Result<String> {
    if end_year < start_year {
        return Err(anyhow!(
            "End year {} is before start year {}",
            end_year,
            start_year
        ));
    }

    let work_dir = TempDir::new()?;
    let cdr = SicDataset::new(&opts.server, CDR_DAILY_ID, CONC_VARIABLE);
    let nrt = SicDataset::new(&opts.server, NRT_DAILY_ID, CONC_VARIABLE);

    let cdr_latest = cdr.latest_date(&work_dir).await?;
    let nrt_latest = nrt.latest_date(&work_dir).await?;

    let mut saved = Vec::new();
    for region in Region::all() {
        let bbox = region.bounding_box();
        let areas = cdr
            .fetch_cell_areas(CELL_AREA_ID, &bbox, &work_dir)
            .await?;

        let years = (end_year - start_year + 1) as u64;
        let pb = create_progress_bar(years, format!("{}: ice years", region.name()));

        let mut daily = ExtentSeries::default();
        for year in start_year..=end_year {
            let start = ice_year_start(year);
            let end = ice_year_end(year);

            // Years beyond the CDR come from the NRT product, clamped to
            // its most recent day.
            let fetched = if end <= cdr_latest {
                cdr.fetch_range(start, end, &bbox, &work_dir).await
            } else if start <= nrt_latest {
                nrt.fetch_range(start, end.min(nrt_latest), &bbox, &work_dir)
                    .await
            } else {
                eprintln!("{}: ice year {} not yet observed, skipping", region.name(), year);
                pb.inc(1);
                continue;
            };

            let grid = match fetched {
                Ok(grid) => grid,
                Err(e) => {
                    eprintln!("{}: ice year {}: {}", region.name(), year, e);
                    pb.inc(1);
                    continue;
                }
            };

            if !grid.is_empty() {
                let series = ice_year_series(region, &grid, areas.clone(), year)?;
                daily.points.extend(series.points);
            }
            pb.inc(1);
        }

        let entries = stats::annual_means(&daily);
        pb.finish_with_message(format!("{}: {} ice years", region.name(), entries.len()));

        let path = output_path(&opts.data_dir, &format!("annual_extent_{}.csv", region.slug()));
        export::write_annual_csv(&path, region.name(), &entries)?;
        saved.push(path.to_string_lossy().to_string());
    }

    Ok(saved.join(", "))
}

/// One ice year of daily extents, trimmed to the September-August window
/// regardless of what the server returned.
fn ice_year_series(
    region: Region,
    grid: &ConcGrid,
    areas: AreaGrid,
    year: i32,
) -> Result<ExtentSeries> {
    let window = grid.select_dates(ice_year_start(year), ice_year_end(year));
    compute_region_series(region, window, areas)
}

fn ice_year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year - 1, 9, 1).unwrap()
}

fn ice_year_end(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 8, 31).unwrap()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use chrono::Duration;
    use ndarray::{Array2, Array3};

    use super::*;

    #[test]
    fn should_span_september_to_august() {
        assert_eq!(
            ice_year_start(2024),
            NaiveDate::from_ymd_opt(2023, 9, 1).unwrap()
        );
        assert_eq!(
            ice_year_end(2024),
            NaiveDate::from_ymd_opt(2024, 8, 31).unwrap()
        );
    }

    #[test]
    fn should_trim_each_series_to_its_ice_year() {
        // Four days straddling the August/September boundary on one cell
        // inside the Northern Bering boundary; the last day is open water.
        let dates: Vec<NaiveDate> = (0..4)
            .map(|d| NaiveDate::from_ymd_opt(2023, 8, 30).unwrap() + Duration::days(d))
            .collect();
        let grid = ConcGrid {
            dates,
            y: vec![1_500_000.0],
            x: vec![-2_500_000.0],
            values: Array3::from_shape_vec((4, 1, 1), vec![0.9, 0.9, 0.9, 0.05]).unwrap(),
        };
        let areas = AreaGrid {
            y: vec![1_500_000.0],
            x: vec![-2_500_000.0],
            values: Array2::from_elem((1, 1), 625_000_000.0),
        };

        let y2023 = ice_year_series(Region::NorthernBering, &grid, areas.clone(), 2023).unwrap();
        let y2024 = ice_year_series(Region::NorthernBering, &grid, areas, 2024).unwrap();

        assert_eq!(y2023.points.len(), 2);
        assert_eq!(y2024.points.len(), 2);

        let mut daily = ExtentSeries::default();
        daily.points.extend(y2023.points);
        daily.points.extend(y2024.points);
        let annual = stats::annual_means(&daily);

        assert_eq!(annual.len(), 2);
        assert_eq!(annual[0].year, 2023);
        assert_eq!(annual[0].extent_km2, 625.0);
        assert_eq!(annual[1].year, 2024);
        assert_eq!(annual[1].extent_km2, 312.5);
    }
}
