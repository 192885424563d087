//! Climatology statistics over extent series.

use std::collections::BTreeMap;

use chrono::Datelike;

use crate::extent::ExtentSeries;

/// Mean and spread of extent for one calendar (month, day) across years.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineStat {
    pub month: u32,
    pub day: u32,
    pub mean_km2: f64,
    /// Sample standard deviation; `None` when only one year contributes.
    pub std_km2: Option<f64>,
}

impl BaselineStat {
    /// `MM-DD` label used in the exported baseline files.
    pub fn date_label(&self) -> String {
        format!("{:02}-{:02}", self.month, self.day)
    }
}

/// Mean extent for one ice year (September 1 through August 31).
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualExtent {
    pub year: i32,
    pub extent_km2: f64,
}

/// Groups a multi-year daily series by (month, day) and reports mean and
/// sample standard deviation per group, ordered by calendar day.
pub fn baseline(series: &ExtentSeries) -> Vec<BaselineStat> {
    let mut groups: BTreeMap<(u32, u32), Vec<f64>> = BTreeMap::new();
    for point in &series.points {
        groups
            .entry((point.date.month(), point.date.day()))
            .or_default()
            .push(point.extent_km2);
    }

    groups
        .into_iter()
        .map(|((month, day), values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let std = sample_std(&values, mean);
            BaselineStat {
                month,
                day,
                mean_km2: mean,
                std_km2: std,
            }
        })
        .collect()
}

/// The ice year a date belongs to: September through December count toward
/// the following year, so ice year Y spans Y-1-09-01 through Y-08-31.
pub fn ice_year(date: chrono::NaiveDate) -> i32 {
    if date.month() >= 9 {
        date.year() + 1
    } else {
        date.year()
    }
}

/// Mean daily extent per ice year, ordered by year.
pub fn annual_means(series: &ExtentSeries) -> Vec<AnnualExtent> {
    let mut groups: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for point in &series.points {
        groups
            .entry(ice_year(point.date))
            .or_default()
            .push(point.extent_km2);
    }

    groups
        .into_iter()
        .map(|(year, values)| AnnualExtent {
            year,
            extent_km2: values.iter().sum::<f64>() / values.len() as f64,
        })
        .collect()
}

fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

// -- Tests -------------------------------------------------------------------
