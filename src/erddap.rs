//! Remote gridded dataset access via ERDDAP griddap.
//!
//! PolarWatch serves the NSIDC sea ice concentration products as griddap
//! datasets addressed by identifier. A subset request names the variable and
//! an inclusive `(start):stride:(stop)` range per dimension, and the `.csv`
//! response type returns one row per cell.

use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate};
use indicatif::ProgressBar;
use tempfile::TempDir;

use crate::{
    download::{download_csv, download_csv_with_progress},
    grid::{AreaGrid, ConcGrid},
    regions::BoundingBox,
};

pub const SERVER: &str = "https://polarwatch.noaa.gov/erddap/griddap";

/// NOAA/NSIDC Climate Data Record, daily, northern hemisphere, 25 km.
pub const CDR_DAILY_ID: &str = "nsidcG02202v4nh1day";

/// Near-real-time daily product covering the days the CDR has not reached.
pub const NRT_DAILY_ID: &str = "nsidcG10016v2nh1day";

/// Grid cell areas for the 25 km polar stereographic grid, in m².
pub const CELL_AREA_ID: &str = "pstere_gridcell_N25k";

pub const CONC_VARIABLE: &str = "cdr_seaice_conc";
pub const AREA_VARIABLE: &str = "cell_area";

/// A remote sea ice concentration dataset, addressed by ERDDAP identifier.
#[derive(Debug, Clone)]
pub struct SicDataset {
    server: String,
    dataset_id: String,
    variable: String,
}

impl SicDataset {
    pub fn new(server: &str, dataset_id: &str, variable: &str) -> Self {
        SicDataset {
            server: server.to_string(),
            dataset_id: dataset_id.to_string(),
            variable: variable.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.dataset_id
    }

    /// Fetches the concentration variable for a date range, spatially
    /// restricted to the bounding box. An empty grid means the server holds
    /// no data in the range.
    pub async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        bbox: &BoundingBox,
        work_dir: &TempDir,
    ) -> Result<ConcGrid> {
        let url = self.subset_url(start, end, bbox);
        let file_path = work_dir
            .path()
            .join(format!("{}_{}_{}.csv", self.dataset_id, start, end));

        download_csv(&url, &file_path).await?;
        ConcGrid::from_csv_file(&file_path)
    }

    /// As [`fetch_range`](Self::fetch_range), reporting download progress on
    /// the given bar. Multi-decade subsets run to hundreds of megabytes.
    pub async fn fetch_range_with_progress(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        bbox: &BoundingBox,
        work_dir: &TempDir,
        progress_bar: ProgressBar,
    ) -> Result<ConcGrid> {
        let url = self.subset_url(start, end, bbox);
        let file_path = work_dir
            .path()
            .join(format!("{}_{}_{}.csv", self.dataset_id, start, end));

        download_csv_with_progress(&url, file_path.clone(), progress_bar).await?;
        ConcGrid::from_csv_file(&file_path)
    }

    /// Fetches the static per-cell area grid for the bounding box.
    pub async fn fetch_cell_areas(
        &self,
        area_id: &str,
        bbox: &BoundingBox,
        work_dir: &TempDir,
    ) -> Result<AreaGrid> {
        let url = format!(
            "{}/{}.csv?{}[({}):1:({})][({}):1:({})]",
            self.server, area_id, AREA_VARIABLE, bbox.y_max, bbox.y_min, bbox.x_min, bbox.x_max
        );
        let file_path = work_dir.path().join(format!("{}.csv", area_id));

        download_csv(&url, &file_path).await?;
        AreaGrid::from_csv_file(&file_path)
    }

    /// Queries the most recent timestamp the dataset holds.
    pub async fn latest_date(&self, work_dir: &TempDir) -> Result<NaiveDate> {
        let url = format!("{}/{}.csv?time[last]", self.server, self.dataset_id);
        let file_path = work_dir
            .path()
            .join(format!("{}_time_last.csv", self.dataset_id));

        download_csv(&url, &file_path).await?;
        parse_latest_time(&file_path)
    }

    // The ygrid axis of the 25 km grids runs north to south, so the range
    // start is the northern edge.
    fn subset_url(&self, start: NaiveDate, end: NaiveDate, bbox: &BoundingBox) -> String {
        format!(
            "{}/{}.csv?{}[({}T00:00:00Z):1:({}T00:00:00Z)][({}):1:({})][({}):1:({})]",
            self.server,
            self.dataset_id,
            self.variable,
            start,
            end,
            bbox.y_max,
            bbox.y_min,
            bbox.x_min,
            bbox.x_max
        )
    }
}

fn parse_latest_time(file_path: &Path) -> Result<NaiveDate> {
    let contents = std::fs::read_to_string(file_path)?;

    // Header row, units row, then the single timestamp.
    let line = contents
        .lines()
        .nth(2)
        .ok_or_else(|| anyhow!("Empty time[last] response"))?;

    let timestamp = DateTime::parse_from_rfc3339(line.trim())
        .map_err(|e| anyhow!("Bad timestamp `{}` in time[last] response: {}", line, e))?;

    Ok(timestamp.date_naive())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox {
            x_min: -2800000.0,
            x_max: -1300000.0,
            y_min: 100000.0,
            y_max: 1600000.0,
        }
    }

    #[test]
    fn should_build_subset_url() {
        let dataset = SicDataset::new(SERVER, CDR_DAILY_ID, CONC_VARIABLE);
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();

        let url = dataset.subset_url(start, end, &bbox());

        assert_eq!(
            url,
            "https://polarwatch.noaa.gov/erddap/griddap/nsidcG02202v4nh1day.csv?\
             cdr_seaice_conc[(2023-01-01T00:00:00Z):1:(2023-01-31T00:00:00Z)]\
             [(1600000):1:(100000)][(-2800000):1:(-1300000)]"
        );
    }

    #[test]
    fn should_parse_latest_time_response() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"time\nUTC\n2024-10-07T00:00:00Z\n").unwrap();

        let date = parse_latest_time(file.path()).unwrap();

        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 10, 7).unwrap());
    }
}
