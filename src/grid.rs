//! In-memory grids parsed from ERDDAP griddap CSV responses.
//!
//! A griddap CSV response carries a header row, a units row, then one row
//! per cell: `time,ygrid,xgrid,<var>` for time-varying variables and
//! `ygrid,xgrid,<var>` for static ones. Coordinates are polar stereographic
//! (EPSG:3413) cell-center positions in meters.

use std::{collections::HashMap, path::Path};

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate};
use ndarray::{Array2, Array3};

/// Sea ice concentration over time, y and x.
#[derive(Debug, Clone)]
pub struct ConcGrid {
    pub dates: Vec<NaiveDate>,
    pub y: Vec<f64>,
    pub x: Vec<f64>,
    /// Concentration fraction in [0, 1], NaN where the sensor has no value.
    pub values: Array3<f32>,
}

/// Per-cell area over y and x, in square meters.
#[derive(Debug, Clone)]
pub struct AreaGrid {
    pub y: Vec<f64>,
    pub x: Vec<f64>,
    pub values: Array2<f64>,
}

impl ConcGrid {
    /// Parses a time-varying concentration response. Values are clamped to
    /// the valid range [0, 1]; the products flag the pole hole, coast and
    /// land with values outside it.
    pub fn from_csv_file(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

        let headers = reader.headers()?.clone();
        if headers.len() < 4 {
            return Err(anyhow!(
                "Expected time,y,x,value columns, got {} columns",
                headers.len()
            ));
        }

        let mut rows: Vec<(NaiveDate, f64, f64, f32)> = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;

            // The second line of a griddap response carries units, not data.
            let date = match parse_erddap_time(field(&record, 0)?) {
                Ok(date) => date,
                Err(_) if i == 0 => continue,
                Err(e) => return Err(e),
            };
            let y: f64 = field(&record, 1)?.parse()?;
            let x: f64 = field(&record, 2)?.parse()?;
            let value = parse_value(record.get(3).unwrap_or("")).clamp(0.0, 1.0);
            rows.push((date, y, x, value));
        }

        if rows.is_empty() {
            return Ok(ConcGrid {
                dates: vec![],
                y: vec![],
                x: vec![],
                values: Array3::zeros((0, 0, 0)),
            });
        }

        let mut dates = Vec::new();
        let mut date_index: HashMap<NaiveDate, usize> = HashMap::new();
        let (y, y_index) = build_axis(rows.iter().map(|r| r.1));
        let (x, x_index) = build_axis(rows.iter().map(|r| r.2));

        for (date, _, _, _) in &rows {
            if !date_index.contains_key(date) {
                date_index.insert(*date, dates.len());
                dates.push(*date);
            }
        }

        let mut values = Array3::from_elem((dates.len(), y.len(), x.len()), f32::NAN);
        for (date, yv, xv, value) in rows {
            let t = date_index[&date];
            let j = y_index[&yv.to_bits()];
            let i = x_index[&xv.to_bits()];
            values[[t, j, i]] = value;
        }

        Ok(ConcGrid { dates, y, x, values })
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Restricts the grid to dates in `[start, end]` inclusive.
    pub fn select_dates(&self, start: NaiveDate, end: NaiveDate) -> ConcGrid {
        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start && **d <= end)
            .map(|(t, _)| t)
            .collect();

        let mut values = Array3::from_elem((keep.len(), self.y.len(), self.x.len()), f32::NAN);
        for (t_new, t_old) in keep.iter().enumerate() {
            values
                .index_axis_mut(ndarray::Axis(0), t_new)
                .assign(&self.values.index_axis(ndarray::Axis(0), *t_old));
        }

        ConcGrid {
            dates: keep.iter().map(|t| self.dates[*t]).collect(),
            y: self.y.clone(),
            x: self.x.clone(),
            values,
        }
    }
}

impl AreaGrid {
    /// Parses a static cell-area response (`ygrid,xgrid,cell_area`).
    pub fn from_csv_file(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

        let headers = reader.headers()?.clone();
        if headers.len() < 3 {
            return Err(anyhow!(
                "Expected y,x,area columns, got {} columns",
                headers.len()
            ));
        }

        let mut rows: Vec<(f64, f64, f64)> = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;

            let y: f64 = match field(&record, 0)?.parse() {
                Ok(y) => y,
                // Units row.
                Err(_) if i == 0 => continue,
                Err(e) => return Err(e.into()),
            };
            let x: f64 = field(&record, 1)?.parse()?;
            let area = parse_value(record.get(2).unwrap_or("")) as f64;
            rows.push((y, x, area));
        }

        if rows.is_empty() {
            return Err(anyhow!("Cell area response contained no rows"));
        }

        let (y, y_index) = build_axis(rows.iter().map(|r| r.0));
        let (x, x_index) = build_axis(rows.iter().map(|r| r.1));

        let mut values = Array2::from_elem((y.len(), x.len()), f64::NAN);
        for (yv, xv, area) in rows {
            values[[y_index[&yv.to_bits()], x_index[&xv.to_bits()]]] = area;
        }

        Ok(AreaGrid { y, x, values })
    }
}

// Axis values arrive in scan order and repeat per row. First-seen order
// preserves the dataset's orientation (ygrid runs north to south).
fn build_axis(values: impl Iterator<Item = f64>) -> (Vec<f64>, HashMap<u64, usize>) {
    let mut axis = Vec::new();
    let mut index = HashMap::new();

    for v in values {
        index.entry(v.to_bits()).or_insert_with(|| {
            axis.push(v);
            axis.len() - 1
        });
    }

    (axis, index)
}

fn field<'r>(record: &'r csv::StringRecord, i: usize) -> Result<&'r str> {
    record
        .get(i)
        .map(str::trim)
        .ok_or_else(|| anyhow!("Missing column {} in griddap row", i))
}

fn parse_erddap_time(s: &str) -> Result<NaiveDate> {
    let timestamp = DateTime::parse_from_rfc3339(s)
        .map_err(|e| anyhow!("Bad griddap timestamp `{}`: {}", s, e))?;
    Ok(timestamp.date_naive())
}

fn parse_value(s: &str) -> f32 {
    match s.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => v,
        _ => f32::NAN,
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const CONC_CSV: &str = "\
time,ygrid,xgrid,cdr_seaice_conc
UTC,m,m,1
2023-01-01T00:00:00Z,1012500.0,-2212500.0,0.92
2023-01-01T00:00:00Z,1012500.0,-2187500.0,0.04
2023-01-01T00:00:00Z,987500.0,-2212500.0,NaN
2023-01-01T00:00:00Z,987500.0,-2187500.0,2.54
2023-01-02T00:00:00Z,1012500.0,-2212500.0,0.88
2023-01-02T00:00:00Z,1012500.0,-2187500.0,0.16
2023-01-02T00:00:00Z,987500.0,-2212500.0,NaN
2023-01-02T00:00:00Z,987500.0,-2187500.0,0.0
";

    const AREA_CSV: &str = "\
ygrid,xgrid,cell_area
m,m,m2
1012500.0,-2212500.0,625000000.0
1012500.0,-2187500.0,625000000.0
987500.0,-2212500.0,624000000.0
987500.0,-2187500.0,624000000.0
";

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn should_parse_concentration_grid() {
        let file = write_temp(CONC_CSV);
        let grid = ConcGrid::from_csv_file(file.path()).unwrap();

        assert_eq!(grid.dates.len(), 2);
        assert_eq!(grid.y, vec![1012500.0, 987500.0]);
        assert_eq!(grid.x, vec![-2212500.0, -2187500.0]);
        assert_eq!(grid.values[[0, 0, 0]], 0.92);
        assert_eq!(grid.values[[1, 0, 1]], 0.16);
        assert!(grid.values[[0, 1, 0]].is_nan());
    }

    #[test]
    fn should_clamp_flag_values_to_valid_range() {
        let file = write_temp(CONC_CSV);
        let grid = ConcGrid::from_csv_file(file.path()).unwrap();

        // 2.54 is a flag value in the source product.
        assert_eq!(grid.values[[0, 1, 1]], 1.0);
    }

    #[test]
    fn should_parse_empty_response_as_empty_grid() {
        let file = write_temp("time,ygrid,xgrid,cdr_seaice_conc\nUTC,m,m,1\n");
        let grid = ConcGrid::from_csv_file(file.path()).unwrap();

        assert!(grid.is_empty());
    }

    #[test]
    fn should_select_date_range() {
        let file = write_temp(CONC_CSV);
        let grid = ConcGrid::from_csv_file(file.path()).unwrap();

        let day2 = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let subset = grid.select_dates(day2, day2);

        assert_eq!(subset.dates, vec![day2]);
        assert_eq!(subset.values[[0, 0, 0]], 0.88);
    }

    #[test]
    fn should_parse_area_grid() {
        let file = write_temp(AREA_CSV);
        let grid = AreaGrid::from_csv_file(file.path()).unwrap();

        assert_eq!(grid.values[[0, 0]], 625_000_000.0);
        assert_eq!(grid.values[[1, 1]], 624_000_000.0);
    }
}
