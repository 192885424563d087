//! The Alaskan marine regions extents are reported for.
//!
//! Boundaries are simplified from the Alaska marine ecosystem region
//! shapefiles, expressed directly in the grid projection (EPSG:3413,
//! meters) so clipping needs no reprojection step.

use clap::ValueEnum;
use geo::{polygon, Contains, Point, Polygon};
use ndarray::{Array2, Array3};

/// Spatial subset bounds in projected meters, used to restrict griddap
/// requests before the polygon clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Region {
    AlaskanArctic,
    NorthernBering,
    EasternBering,
    SoutheasternBering,
}

impl Region {
    pub fn all() -> [Region; 4] {
        [
            Region::AlaskanArctic,
            Region::NorthernBering,
            Region::EasternBering,
            Region::SoutheasternBering,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Region::AlaskanArctic => "Alaskan Arctic",
            Region::NorthernBering => "Northern Bering Sea",
            Region::EasternBering => "Eastern Bering Sea",
            Region::SoutheasternBering => "Southeastern Bering Sea",
        }
    }

    /// Short name used in output file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Region::AlaskanArctic => "AlaskanArctic",
            Region::NorthernBering => "NorthernBering",
            Region::EasternBering => "EasternBering",
            Region::SoutheasternBering => "SoutheasternBering",
        }
    }

    pub fn polygon(&self) -> Polygon<f64> {
        match self {
            // Beaufort and Chukchi seas off the north coast.
            Region::AlaskanArctic => polygon![
                (x: -2_150_000.0, y: 1_510_000.0),
                (x: -2_610_000.0, y: 275_000.0),
                (x: -1_670_000.0, y: 176_000.0),
                (x: -1_370_000.0, y: 960_000.0),
            ],
            Region::NorthernBering => polygon![
                (x: -2_520_000.0, y: 2_120_000.0),
                (x: -2_960_000.0, y: 1_440_000.0),
                (x: -2_430_000.0, y: 1_180_000.0),
                (x: -2_070_000.0, y: 1_740_000.0),
            ],
            Region::EasternBering => polygon![
                (x: -2_800_000.0, y: 2_800_000.0),
                (x: -3_680_000.0, y: 1_490_000.0),
                (x: -3_060_000.0, y: 1_240_000.0),
                (x: -2_330_000.0, y: 2_330_000.0),
            ],
            Region::SoutheasternBering => polygon![
                (x: -3_250_000.0, y: 2_280_000.0),
                (x: -3_680_000.0, y: 1_490_000.0),
                (x: -3_260_000.0, y: 1_320_000.0),
                (x: -2_880_000.0, y: 2_020_000.0),
            ],
        }
    }

    /// Envelope of the boundary, padded by one 25 km cell so edge cells
    /// survive the server-side subset.
    pub fn bounding_box(&self) -> BoundingBox {
        let pad = 25_000.0;
        let polygon = self.polygon();

        let xs: Vec<f64> = polygon.exterior().coords().map(|c| c.x).collect();
        let ys: Vec<f64> = polygon.exterior().coords().map(|c| c.y).collect();

        BoundingBox {
            x_min: xs.iter().copied().fold(f64::INFINITY, f64::min) - pad,
            x_max: xs.iter().copied().fold(f64::NEG_INFINITY, f64::max) + pad,
            y_min: ys.iter().copied().fold(f64::INFINITY, f64::min) - pad,
            y_max: ys.iter().copied().fold(f64::NEG_INFINITY, f64::max) + pad,
        }
    }

    /// Boolean y × x mask of cell centers inside the region boundary.
    pub fn mask(&self, y: &[f64], x: &[f64]) -> Array2<bool> {
        let polygon = self.polygon();
        let mut mask = Array2::from_elem((y.len(), x.len()), false);

        for (j, yv) in y.iter().enumerate() {
            for (i, xv) in x.iter().enumerate() {
                if polygon.contains(&Point::new(*xv, *yv)) {
                    mask[[j, i]] = true;
                }
            }
        }

        mask
    }
}

/// Clips a concentration grid to the mask by blanking outside cells.
pub fn clip_conc(values: &mut Array3<f32>, mask: &Array2<bool>) {
    for mut slice in values.outer_iter_mut() {
        for ((j, i), v) in slice.indexed_iter_mut() {
            if !mask[[j, i]] {
                *v = f32::NAN;
            }
        }
    }
}

/// Clips an area grid to the mask by blanking outside cells.
pub fn clip_area(values: &mut Array2<f64>, mask: &Array2<bool>) {
    for ((j, i), v) in values.indexed_iter_mut() {
        if !mask[[j, i]] {
            *v = f64::NAN;
        }
    }
}

// -- Tests -------------------------------------------------------------------
