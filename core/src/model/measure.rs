use crate::model::floats;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const POINT_ID: &str = "pointId";
pub const SERIAL_NUMBER: &str = "serialNumber";
pub const SAMPLE: &str = "sample";
pub const LINE: &str = "line";
pub const RESIDUAL_SAMPLE: &str = "residualSample";
pub const RESIDUAL_LINE: &str = "residualLine";
pub const RESIDUAL_MAGNITUDE: &str = "residualMagnitude";
pub const MEASURE_TYPE: &str = "measureType";
pub const POINT_TYPE: &str = "pointType";
pub const POINT_IGNORE: &str = "pointIgnore";
pub const MEASURE_IGNORE: &str = "measureIgnore";
pub const STATUS: &str = "status";
pub const ADJUSTED_X: &str = "adjustedX";
pub const ADJUSTED_Y: &str = "adjustedY";
pub const ADJUSTED_LON: &str = "adjustedLon";
pub const ADJUSTED_LAT: &str = "adjustedLat";
pub const APRIORI_X: &str = "aprioriX";
pub const APRIORI_Y: &str = "aprioriY";
pub const APRIORI_LON: &str = "aprioriLon";
pub const APRIORI_LAT: &str = "aprioriLat";
pub const CAMPT_LON: &str = "campt_lon";
pub const CAMPT_LAT: &str = "campt_lat";

/// Columns a loaded measurement table may carry, in output order.
pub const CANONICAL_COLUMNS: [&str; 20] = [
    POINT_ID,
    SERIAL_NUMBER,
    SAMPLE,
    LINE,
    RESIDUAL_SAMPLE,
    RESIDUAL_LINE,
    RESIDUAL_MAGNITUDE,
    MEASURE_TYPE,
    POINT_TYPE,
    POINT_IGNORE,
    MEASURE_IGNORE,
    STATUS,
    ADJUSTED_X,
    ADJUSTED_Y,
    ADJUSTED_LON,
    ADJUSTED_LAT,
    APRIORI_X,
    APRIORI_Y,
    APRIORI_LON,
    APRIORI_LAT,
];

/// Measure kinds as recorded by ISIS control networks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MeasureType {
    Candidate,
    Manual,
    RegisteredPixel,
    RegisteredSubPixel,
}

impl MeasureType {
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(MeasureType::Candidate),
            1 => Some(MeasureType::Manual),
            2 => Some(MeasureType::RegisteredPixel),
            3 => Some(MeasureType::RegisteredSubPixel),
            _ => None,
        }
    }

    pub fn ordinal(self) -> i64 {
        match self {
            MeasureType::Candidate => 0,
            MeasureType::Manual => 1,
            MeasureType::RegisteredPixel => 2,
            MeasureType::RegisteredSubPixel => 3,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "candidate" => Some(MeasureType::Candidate),
            "manual" => Some(MeasureType::Manual),
            "registeredpixel" => Some(MeasureType::RegisteredPixel),
            "registeredsubpixel" => Some(MeasureType::RegisteredSubPixel),
            _ => None,
        }
    }

    /// True for the kinds produced by an automatic registration pass.
    pub fn is_registered(self) -> bool {
        matches!(
            self,
            MeasureType::RegisteredPixel | MeasureType::RegisteredSubPixel
        )
    }
}

impl FromStr for MeasureType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let parsed = match trimmed.parse::<i64>() {
            Ok(ordinal) => MeasureType::from_ordinal(ordinal),
            Err(_) => MeasureType::from_name(trimmed),
        };
        parsed.ok_or_else(|| format!("unknown measure type '{}'", trimmed))
    }
}

/// Registration status assigned to every measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementStatus {
    Ignored,
    Registered,
    Unregistered,
}

impl MeasurementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementStatus::Ignored => "ignored",
            MeasurementStatus::Registered => "registered",
            MeasurementStatus::Unregistered => "unregistered",
        }
    }
}

impl fmt::Display for MeasurementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One image's observation of a tie point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub point_id: String,
    pub serial_number: String,
    #[serde(with = "floats")]
    pub sample: f64,
    #[serde(with = "floats")]
    pub line: f64,
    #[serde(default, with = "floats::optional")]
    pub residual_sample: Option<f64>,
    #[serde(default, with = "floats::optional")]
    pub residual_line: Option<f64>,
    #[serde(with = "floats")]
    pub residual_magnitude: f64,
    pub measure_type: Option<MeasureType>,
    pub point_type: Option<String>,
    pub point_ignore: bool,
    pub measure_ignore: bool,
    pub status: MeasurementStatus,
    #[serde(default, with = "floats::optional")]
    pub adjusted_x: Option<f64>,
    #[serde(default, with = "floats::optional")]
    pub adjusted_y: Option<f64>,
    #[serde(default, with = "floats::optional")]
    pub adjusted_lon: Option<f64>,
    #[serde(default, with = "floats::optional")]
    pub adjusted_lat: Option<f64>,
    #[serde(default, with = "floats::optional")]
    pub apriori_x: Option<f64>,
    #[serde(default, with = "floats::optional")]
    pub apriori_y: Option<f64>,
    #[serde(default, with = "floats::optional")]
    pub apriori_lon: Option<f64>,
    #[serde(default, with = "floats::optional")]
    pub apriori_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "floats::optional")]
    pub campt_lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "floats::optional")]
    pub campt_lat: Option<f64>,
}

impl Measurement {
    /// Bare measurement with no residuals, flags or ground coordinates.
    pub fn new(
        point_id: impl Into<String>,
        serial_number: impl Into<String>,
        sample: f64,
        line: f64,
    ) -> Self {
        Self {
            point_id: point_id.into(),
            serial_number: serial_number.into(),
            sample,
            line,
            residual_sample: None,
            residual_line: None,
            residual_magnitude: 0.0,
            measure_type: None,
            point_type: None,
            point_ignore: false,
            measure_ignore: false,
            status: MeasurementStatus::Unregistered,
            adjusted_x: None,
            adjusted_y: None,
            adjusted_lon: None,
            adjusted_lat: None,
            apriori_x: None,
            apriori_y: None,
            apriori_lon: None,
            apriori_lat: None,
            campt_lon: None,
            campt_lat: None,
        }
    }
}

/// Hypotenuse of the two residual components, missing components count as zero.
pub fn residual_magnitude(residual_sample: Option<f64>, residual_line: Option<f64>) -> f64 {
    let sample = residual_sample.filter(|v| !v.is_nan()).unwrap_or(0.0);
    let line = residual_line.filter(|v| !v.is_nan()).unwrap_or(0.0);
    sample.hypot(line)
}

/// Candidate ground-coordinate column pairs, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundPair {
    AdjustedXY,
    AdjustedLonLat,
    AprioriXY,
    AprioriLonLat,
    Campt,
}

impl GroundPair {
    /// Pairs a loaded network can carry; `Campt` is only ever derived.
    pub const NETWORK_ORDER: [GroundPair; 4] = [
        GroundPair::AdjustedXY,
        GroundPair::AdjustedLonLat,
        GroundPair::AprioriXY,
        GroundPair::AprioriLonLat,
    ];

    pub fn columns(self) -> (&'static str, &'static str) {
        match self {
            GroundPair::AdjustedXY => (ADJUSTED_X, ADJUSTED_Y),
            GroundPair::AdjustedLonLat => (ADJUSTED_LON, ADJUSTED_LAT),
            GroundPair::AprioriXY => (APRIORI_X, APRIORI_Y),
            GroundPair::AprioriLonLat => (APRIORI_LON, APRIORI_LAT),
            GroundPair::Campt => (CAMPT_LON, CAMPT_LAT),
        }
    }

    /// (longitude, latitude) values of this pair on one measurement.
    pub fn values(self, measurement: &Measurement) -> (Option<f64>, Option<f64>) {
        match self {
            GroundPair::AdjustedXY => (measurement.adjusted_x, measurement.adjusted_y),
            GroundPair::AdjustedLonLat => (measurement.adjusted_lon, measurement.adjusted_lat),
            GroundPair::AprioriXY => (measurement.apriori_x, measurement.apriori_y),
            GroundPair::AprioriLonLat => (measurement.apriori_lon, measurement.apriori_lat),
            GroundPair::Campt => (measurement.campt_lon, measurement.campt_lat),
        }
    }
}

/// Flat measurement table, one row per measurement in reader order.
///
/// `columns` records which canonical columns the source network actually
/// carried, so callers can tell an absent column from a column of zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementTable {
    columns: Vec<String>,
    rows: Vec<Measurement>,
}

impl MeasurementTable {
    pub fn new(columns: Vec<String>, rows: Vec<Measurement>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Measurement] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Distinct serial numbers in first-seen order.
    pub fn distinct_serials(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| seen.insert(row.serial_number.as_str()))
            .map(|row| row.serial_number.clone())
            .collect()
    }

    /// Measurements taken on a single image.
    pub fn for_serial(&self, serial_number: &str) -> MeasurementTable {
        MeasurementTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| row.serial_number == serial_number)
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Measurement] {
        &mut self.rows
    }

    pub(crate) fn add_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }
}

impl<'a> IntoIterator for &'a MeasurementTable {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residual_magnitude_matches_hypot_identity() {
        assert_eq!(residual_magnitude(Some(3.0), Some(4.0)), 5.0);
        assert_eq!(residual_magnitude(None, None), 0.0);
        assert_eq!(residual_magnitude(Some(-3.0), None), 3.0);
    }

    #[test]
    fn measure_type_parses_ordinals_and_names() {
        assert_eq!("2".parse::<MeasureType>(), Ok(MeasureType::RegisteredPixel));
        assert_eq!(
            "RegisteredSubPixel".parse::<MeasureType>(),
            Ok(MeasureType::RegisteredSubPixel)
        );
        assert!("7".parse::<MeasureType>().is_err());
        assert!(!MeasureType::Manual.is_registered());
        assert!(MeasureType::RegisteredSubPixel.is_registered());
    }

    #[test]
    fn distinct_serials_keep_first_seen_order() {
        let table = MeasurementTable::new(
            vec![POINT_ID.into(), SERIAL_NUMBER.into()],
            vec![
                Measurement::new("p1", "B", 1.0, 1.0),
                Measurement::new("p1", "A", 1.0, 1.0),
                Measurement::new("p2", "B", 1.0, 1.0),
            ],
        );
        assert_eq!(table.distinct_serials(), vec!["B", "A"]);
        assert_eq!(table.for_serial("B").len(), 2);
    }
}
