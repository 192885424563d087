//! CSV export of extent series and derived statistics, plus the read-back
//! needed by the incremental update flow.

use std::{fs::OpenOptions, path::Path};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    extent::ExtentSeries,
    stats::{AnnualExtent, BaselineStat},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize)]
struct ExtentRow {
    date: String,
    extent_km2: f64,
}

#[derive(Debug, Serialize)]
struct BaselineRow {
    month: u32,
    day: u32,
    mean_km2: f64,
    std_km2: Option<f64>,
    date: String,
}

#[derive(Debug, Serialize)]
struct AnnualRow {
    region: String,
    year: i32,
    extent_km2: f64,
}

#[derive(Debug, Serialize)]
struct AreaRow {
    region: String,
    total_area_km2: f64,
}

/// Writes a daily extent series, with header.
pub fn write_extent_csv(path: &Path, series: &ExtentSeries) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in &series.points {
        writer.serialize(ExtentRow {
            date: point.date.format(DATE_FORMAT).to_string(),
            extent_km2: point.extent_km2,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Appends daily extent rows to an existing file, without repeating the
/// header.
pub fn append_extent_csv(path: &Path, series: &ExtentSeries) -> Result<()> {
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    for point in &series.points {
        writer.serialize(ExtentRow {
            date: point.date.format(DATE_FORMAT).to_string(),
            extent_km2: point.extent_km2,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// The most recent date recorded in an extent file, `None` for a file with
/// no data rows.
pub fn last_recorded_date(path: &Path) -> Result<Option<NaiveDate>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut last: Option<NaiveDate> = None;

    for row in reader.deserialize::<ExtentRow>() {
        let row = row?;
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
            .map_err(|e| anyhow!("Bad date `{}` in {}: {}", row.date, path.display(), e))?;
        last = Some(last.map_or(date, |d| d.max(date)));
    }

    Ok(last)
}

/// Writes month/day climatology statistics, values rounded to 2 decimals.
pub fn write_baseline_csv(path: &Path, stats: &[BaselineStat]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for stat in stats {
        writer.serialize(BaselineRow {
            month: stat.month,
            day: stat.day,
            mean_km2: round2(stat.mean_km2),
            std_km2: stat.std_km2.map(round2),
            date: stat.date_label(),
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes ice-year mean extents for one region.
pub fn write_annual_csv(path: &Path, region: &str, annual: &[AnnualExtent]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for entry in annual {
        writer.serialize(AnnualRow {
            region: region.to_string(),
            year: entry.year,
            extent_km2: entry.extent_km2,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the total valid ocean area per region.
pub fn write_area_csv(path: &Path, areas: &[(String, f64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (region, total_area_km2) in areas {
        writer.serialize(AreaRow {
            region: region.clone(),
            total_area_km2: *total_area_km2,
        })?;
    }
    writer.flush()?;

    Ok(())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use crate::extent::ExtentPoint;

    use super::*;

    fn series() -> ExtentSeries {
        ExtentSeries {
            points: vec![
                ExtentPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    extent_km2: 1250.0,
                },
                ExtentPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    extent_km2: 625.0,
                },
            ],
        }
    }

    #[test]
    fn should_write_extent_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extent.csv");

        write_extent_csv(&path, &series()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "date,extent_km2\n2024-01-01,1250.0\n2024-01-02,625.0\n"
        );
    }

    #[test]
    fn should_append_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extent.csv");
        write_extent_csv(&path, &series()).unwrap();

        let more = ExtentSeries {
            points: vec![ExtentPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                extent_km2: 300.0,
            }],
        };
        append_extent_csv(&path, &more).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "date,extent_km2\n2024-01-01,1250.0\n2024-01-02,625.0\n2024-01-03,300.0\n"
        );
    }

    #[test]
    fn should_find_last_recorded_date() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extent.csv");
        write_extent_csv(&path, &series()).unwrap();

        let last = last_recorded_date(&path).unwrap();

        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn should_report_none_for_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extent.csv");
        write_extent_csv(&path, &ExtentSeries::default()).unwrap();

        assert_eq!(last_recorded_date(&path).unwrap(), None);
    }

    #[test]
    fn should_write_baseline_with_blank_std_for_single_year() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baseline.csv");

        let stats = vec![
            BaselineStat {
                month: 1,
                day: 1,
                mean_km2: 1234.5678,
                std_km2: Some(10.016),
            },
            BaselineStat {
                month: 1,
                day: 2,
                mean_km2: 500.0,
                std_km2: None,
            },
        ];
        write_baseline_csv(&path, &stats).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "month,day,mean_km2,std_km2,date\n1,1,1234.57,10.02,01-01\n1,2,500.0,,01-02\n"
        );
    }
}
