use crate::math::stats::StatsHelper;
use crate::model::{MeasurementStatus, MeasurementTable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Corpus-level statistics over a measurement table.
///
/// `mean_residual` and `max_residual` are NaN for an empty table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub n_points: usize,
    pub n_measures: usize,
    pub n_images: usize,
    pub n_registered: usize,
    pub n_unregistered: usize,
    pub n_ignored: usize,
    pub mean_residual: f64,
    pub max_residual: f64,
}

pub fn summarize(table: &MeasurementTable) -> NetworkSummary {
    let mut points = HashSet::new();
    let mut images = HashSet::new();
    let mut residuals = Vec::with_capacity(table.len());
    let (mut registered, mut unregistered, mut ignored) = (0, 0, 0);

    for row in table {
        points.insert(row.point_id.as_str());
        images.insert(row.serial_number.as_str());
        residuals.push(row.residual_magnitude);
        match row.status {
            MeasurementStatus::Registered => registered += 1,
            MeasurementStatus::Unregistered => unregistered += 1,
            MeasurementStatus::Ignored => ignored += 1,
        }
    }

    NetworkSummary {
        n_points: points.len(),
        n_measures: table.len(),
        n_images: images.len(),
        n_registered: registered,
        n_unregistered: unregistered,
        n_ignored: ignored,
        mean_residual: StatsHelper::mean(&residuals),
        max_residual: StatsHelper::max(&residuals),
    }
}
