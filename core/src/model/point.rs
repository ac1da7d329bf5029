use crate::model::MeasurementStatus;
use serde::{Deserialize, Serialize};

/// Longitude/latitude location of a control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

/// One row per distinct point id, derived from the measurement table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPoint {
    pub point_id: String,
    pub status: MeasurementStatus,
    pub geometry: GeoPoint,
    pub n_measures: usize,
    pub residual_magnitude: f64,
    pub point_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointTable {
    points: Vec<ControlPoint>,
}

impl PointTable {
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ControlPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, point_id: &str) -> Option<&ControlPoint> {
        self.points.iter().find(|point| point.point_id == point_id)
    }

    pub fn count_with_status(&self, status: MeasurementStatus) -> usize {
        self.points.iter().filter(|p| p.status == status).count()
    }
}
