//! Adapter boundary for raw control-network readers.
//!
//! Readers hand back a [`RawTable`] with their own column names and loosely
//! typed cells. Nothing reader-specific travels past the loader.

use crate::model::measure::*;
use crate::model::{MeasureType, Measurement, MeasurementTable};
use crate::prelude::{CnetError, CnetResult};
use std::path::Path;

/// Reader-native column names and their canonical counterparts.
pub const NATIVE_RENAMES: [(&str, &str); 4] = [
    ("id", POINT_ID),
    ("serialnumber", SERIAL_NUMBER),
    ("sampleResidual", RESIDUAL_SAMPLE),
    ("lineResidual", RESIDUAL_LINE),
];

pub fn canonical_name(native: &str) -> &str {
    NATIVE_RENAMES
        .iter()
        .find(|(from, _)| *from == native)
        .map_or(native, |(_, to)| *to)
}

pub fn native_name(canonical: &str) -> &str {
    NATIVE_RENAMES
        .iter()
        .find(|(_, to)| *to == canonical)
        .map_or(canonical, |(from, _)| *from)
}

/// One loosely typed cell as produced by a reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Reader-internal payload with no portable representation.
    Opaque,
}

impl RawValue {
    /// Text cell from a delimited file; blank cells are null.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            RawValue::Null
        } else {
            RawValue::Text(trimmed.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Int(value) => Some(*value as f64),
            RawValue::Float(value) => Some(*value),
            RawValue::Text(text) => text.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(value) => Some(*value),
            RawValue::Int(value) => Some(*value != 0),
            RawValue::Text(text) => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Text(text) => Some(text.clone()),
            RawValue::Int(value) => Some(value.to_string()),
            RawValue::Float(value) => Some(value.to_string()),
            RawValue::Bool(value) => Some(value.to_string()),
            RawValue::Null | RawValue::Opaque => None,
        }
    }

    pub fn as_measure_type(&self) -> Option<MeasureType> {
        match self {
            RawValue::Int(ordinal) => MeasureType::from_ordinal(*ordinal),
            RawValue::Text(text) => text.parse().ok(),
            _ => None,
        }
    }
}

/// Column-named rows exactly as a reader produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding short rows with nulls and rejecting long ones.
    pub fn push_row(&mut self, mut row: Vec<RawValue>) -> CnetResult<()> {
        if row.len() > self.columns.len() {
            return Err(CnetError::invalid_input(
                format!("row has {} cells for {} columns", row.len(), self.columns.len()),
                &self.columns,
            ));
        }
        row.resize(self.columns.len(), RawValue::Null);
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(index) = self.column_index(from) {
            self.columns[index] = to.to_string();
        }
    }
}

/// Reads and writes control networks in some on-disk format.
pub trait NetworkReader {
    fn read(&self, path: &Path) -> CnetResult<RawTable>;

    /// Writes the canonical columns back using reader-native names.
    fn write(&self, table: &MeasurementTable, path: &Path) -> CnetResult<()>;
}

/// Flat CSV export of a control network, one row per measure.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvNetworkReader;

impl CsvNetworkReader {
    pub fn new() -> Self {
        Self
    }
}

impl NetworkReader for CsvNetworkReader {
    fn read(&self, path: &Path) -> CnetResult<RawTable> {
        let reader_error = |err: csv::Error| CnetError::Reader {
            path: path.to_path_buf(),
            message: err.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(reader_error)?;
        let columns = reader
            .headers()
            .map_err(reader_error)?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();

        let mut table = RawTable::new(columns);
        for record in reader.records() {
            let record = record.map_err(reader_error)?;
            table.push_row(record.iter().map(RawValue::from_cell).collect())?;
        }
        Ok(table)
    }

    fn write(&self, table: &MeasurementTable, path: &Path) -> CnetResult<()> {
        let columns: Vec<&str> = CANONICAL_COLUMNS
            .iter()
            .copied()
            .filter(|column| table.has_column(column))
            .collect();

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(columns.iter().map(|column| native_name(column)))?;
        for row in table {
            writer.write_record(columns.iter().map(|column| canonical_cell(row, column)))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn canonical_cell(row: &Measurement, column: &str) -> String {
    match column {
        POINT_ID => row.point_id.clone(),
        SERIAL_NUMBER => row.serial_number.clone(),
        SAMPLE => row.sample.to_string(),
        LINE => row.line.to_string(),
        RESIDUAL_SAMPLE => optional(row.residual_sample),
        RESIDUAL_LINE => optional(row.residual_line),
        RESIDUAL_MAGNITUDE => row.residual_magnitude.to_string(),
        MEASURE_TYPE => row
            .measure_type
            .map(|kind| kind.ordinal().to_string())
            .unwrap_or_default(),
        POINT_TYPE => row.point_type.clone().unwrap_or_default(),
        POINT_IGNORE => row.point_ignore.to_string(),
        MEASURE_IGNORE => row.measure_ignore.to_string(),
        STATUS => row.status.to_string(),
        ADJUSTED_X => optional(row.adjusted_x),
        ADJUSTED_Y => optional(row.adjusted_y),
        ADJUSTED_LON => optional(row.adjusted_lon),
        ADJUSTED_LAT => optional(row.adjusted_lat),
        APRIORI_X => optional(row.apriori_x),
        APRIORI_Y => optional(row.apriori_y),
        APRIORI_LON => optional(row.apriori_lon),
        APRIORI_LAT => optional(row.apriori_lat),
        _ => String::new(),
    }
}
