//! Sea ice extent from concentration and per-cell area.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use ndarray::{Array2, Array3, Axis};

/// Concentration at or above this fraction counts a cell as ice covered.
/// The 15% cutoff is the NSIDC convention for extent.
pub const EXTENT_THRESHOLD: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtentPoint {
    pub date: NaiveDate,
    pub extent_km2: f64,
}

/// Daily sea ice extent for one region, in km².
#[derive(Debug, Clone, Default)]
pub struct ExtentSeries {
    pub points: Vec<ExtentPoint>,
}

/// Thresholds concentration to a binary ice/no-ice grid. Cells without a
/// valid observation stay NaN so they drop out of area sums.
pub fn threshold(values: &Array3<f32>, cutoff: f32) -> Array3<f32> {
    values.mapv(|v| {
        if v.is_nan() {
            f32::NAN
        } else if v >= cutoff {
            1.0
        } else {
            0.0
        }
    })
}

/// Multiplies the binary grid by per-cell area (m²) and sums over space per
/// time step, returning extent in km².
pub fn extent_series(
    dates: &[NaiveDate],
    binary: &Array3<f32>,
    areas: &Array2<f64>,
) -> Result<ExtentSeries> {
    check_alignment(binary, areas)?;
    if dates.len() != binary.len_of(Axis(0)) {
        return Err(anyhow!(
            "Time axis has {} dates but grid has {} steps",
            dates.len(),
            binary.len_of(Axis(0))
        ));
    }

    let points = dates
        .iter()
        .zip(binary.outer_iter())
        .map(|(date, slice)| {
            let mut total_m2 = 0.0;
            for ((j, i), v) in slice.indexed_iter() {
                let area = areas[[j, i]];
                if !v.is_nan() && !area.is_nan() {
                    total_m2 += *v as f64 * area;
                }
            }
            ExtentPoint {
                date: *date,
                extent_km2: total_m2 / 1e6,
            }
        })
        .collect();

    Ok(ExtentSeries { points })
}

/// Total area of cells with a valid observation at the first time step, in
/// km². Pole hole, land, lake and coast cells carry no observation and are
/// excluded.
pub fn total_area_km2(conc: &Array3<f32>, areas: &Array2<f64>) -> Result<f64> {
    check_alignment(conc, areas)?;
    if conc.len_of(Axis(0)) == 0 {
        return Err(anyhow!("Cannot compute total area of an empty grid"));
    }

    let first = conc.index_axis(Axis(0), 0);
    let mut total_m2 = 0.0;
    for ((j, i), v) in first.indexed_iter() {
        let area = areas[[j, i]];
        if !v.is_nan() && !area.is_nan() {
            total_m2 += area;
        }
    }

    Ok(total_m2 / 1e6)
}

fn check_alignment(values: &Array3<f32>, areas: &Array2<f64>) -> Result<()> {
    let spatial = (values.len_of(Axis(1)), values.len_of(Axis(2)));
    if spatial != areas.dim() {
        return Err(anyhow!(
            "Concentration grid {:?} does not align with area grid {:?}",
            spatial,
            areas.dim()
        ));
    }
    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn dates(n: u64) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        (0..n)
            .map(|d| start + chrono::Duration::days(d as i64))
            .collect()
    }

    #[test]
    fn should_threshold_concentration() {
        let conc =
            Array3::from_shape_vec((1, 2, 2), vec![0.92, 0.15, 0.1499, f32::NAN]).unwrap();

        let binary = threshold(&conc, EXTENT_THRESHOLD);

        assert_eq!(binary[[0, 0, 0]], 1.0);
        assert_eq!(binary[[0, 0, 1]], 1.0);
        assert_eq!(binary[[0, 1, 0]], 0.0);
        assert!(binary[[0, 1, 1]].is_nan());
    }

    #[test]
    fn should_compute_extent_series() {
        // Two days over a 2x2 grid of 625 km² cells.
        let binary = Array3::from_shape_vec(
            (2, 2, 2),
            vec![1.0, 1.0, 0.0, f32::NAN, 1.0, 0.0, 0.0, f32::NAN],
        )
        .unwrap();
        let areas = Array2::from_elem((2, 2), 625_000_000.0);

        let series = extent_series(&dates(2), &binary, &areas).unwrap();

        assert_eq!(series.points[0].extent_km2, 1250.0);
        assert_eq!(series.points[1].extent_km2, 625.0);
    }

    #[test]
    fn should_skip_cells_without_area() {
        let binary = Array3::from_elem((1, 1, 2), 1.0f32);
        let areas = Array2::from_shape_vec((1, 2), vec![625_000_000.0, f64::NAN]).unwrap();

        let series = extent_series(&dates(1), &binary, &areas).unwrap();

        assert_eq!(series.points[0].extent_km2, 625.0);
    }

    #[test]
    fn should_compute_total_valid_area() {
        let conc =
            Array3::from_shape_vec((1, 2, 2), vec![0.0, 0.5, f32::NAN, 1.0]).unwrap();
        let areas = Array2::from_elem((2, 2), 625_000_000.0);

        let total = total_area_km2(&conc, &areas).unwrap();

        assert_eq!(total, 1875.0);
    }

    #[test]
    fn should_reject_misaligned_grids() {
        let binary = Array3::from_elem((1, 2, 2), 1.0f32);
        let areas = Array2::from_elem((3, 3), 625_000_000.0);

        assert!(extent_series(&dates(1), &binary, &areas).is_err());
    }
}
