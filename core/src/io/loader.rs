use crate::io::cache::{CacheKey, TableCache};
use crate::io::reader::{canonical_name, NetworkReader, RawTable, RawValue};
use crate::model::measure::*;
use crate::model::{Measurement, MeasurementTable};
use crate::prelude::{CnetError, CnetResult};
use crate::processing::classify::classify;
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use std::path::Path;

/// Loads control networks into canonical measurement tables.
pub struct NetworkLoader<R: NetworkReader> {
    reader: R,
    cache: Option<Box<dyn TableCache>>,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl<R: NetworkReader> NetworkLoader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            cache: None,
            logger: LogManager::new("loader"),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn with_cache(mut self, cache: Box<dyn TableCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Loads, classifies and normalizes the network at `path`.
    ///
    /// A cached table for the same path and modification time is returned
    /// verbatim without invoking the reader.
    pub fn load(&self, path: &Path) -> CnetResult<MeasurementTable> {
        if !path.exists() {
            return Err(CnetError::NotFound(path.to_path_buf()));
        }

        let key = match CacheKey::for_file(path) {
            Ok(key) => Some(key),
            Err(err) => {
                self.logger
                    .warn(&format!("no cache key for {}: {}", path.display(), err));
                None
            }
        };

        if let (Some(cache), Some(key)) = (self.cache.as_ref(), key.as_ref()) {
            if let Some(table) = cache.get(key) {
                self.metrics.record_cache_hit();
                self.logger
                    .detail(&format!("cache hit for {}", key.as_string()));
                return Ok(table);
            }
            self.metrics.record_cache_miss();
        }

        let raw = self.reader.read(path)?;
        let table = normalize(raw)?;
        self.logger.record(&format!(
            "loaded {} measures from {}",
            table.len(),
            path.display()
        ));

        if let (Some(cache), Some(key)) = (self.cache.as_ref(), key.as_ref()) {
            if let Err(err) = cache.set(key, &table) {
                self.logger
                    .warn(&format!("cache write failed for {}: {}", key.as_string(), err));
            }
        }

        Ok(table)
    }

    pub fn save(&self, table: &MeasurementTable, path: &Path) -> CnetResult<()> {
        self.reader.write(table, path)
    }
}

/// Renames reader columns, derives residual magnitude and status, and keeps
/// only the canonical columns.
pub fn normalize(mut raw: RawTable) -> CnetResult<MeasurementTable> {
    let natives: Vec<String> = raw.columns().to_vec();
    for native in &natives {
        let canonical = canonical_name(native);
        if canonical != native {
            raw.rename_column(native, canonical);
        }
    }

    for required in [POINT_ID, SERIAL_NUMBER] {
        if raw.column_index(required).is_none() {
            return Err(CnetError::invalid_input(
                format!("network has no '{}' column", required),
                raw.columns(),
            ));
        }
    }

    let columns: Vec<String> = CANONICAL_COLUMNS
        .iter()
        .filter(|column| {
            **column == RESIDUAL_MAGNITUDE
                || **column == STATUS
                || raw.column_index(column).is_some()
        })
        .map(|column| column.to_string())
        .collect();

    let index = |name: &str| raw.column_index(name);
    let lookup = ColumnLookup {
        point_id: index(POINT_ID),
        serial_number: index(SERIAL_NUMBER),
        sample: index(SAMPLE),
        line: index(LINE),
        residual_sample: index(RESIDUAL_SAMPLE),
        residual_line: index(RESIDUAL_LINE),
        measure_type: index(MEASURE_TYPE),
        point_type: index(POINT_TYPE),
        point_ignore: index(POINT_IGNORE),
        measure_ignore: index(MEASURE_IGNORE),
        ground: [
            index(ADJUSTED_X),
            index(ADJUSTED_Y),
            index(ADJUSTED_LON),
            index(ADJUSTED_LAT),
            index(APRIORI_X),
            index(APRIORI_Y),
            index(APRIORI_LON),
            index(APRIORI_LAT),
        ],
    };

    let rows = raw.rows().iter().map(|row| lookup.measurement(row)).collect();
    Ok(MeasurementTable::new(columns, rows))
}

struct ColumnLookup {
    point_id: Option<usize>,
    serial_number: Option<usize>,
    sample: Option<usize>,
    line: Option<usize>,
    residual_sample: Option<usize>,
    residual_line: Option<usize>,
    measure_type: Option<usize>,
    point_type: Option<usize>,
    point_ignore: Option<usize>,
    measure_ignore: Option<usize>,
    ground: [Option<usize>; 8],
}

impl ColumnLookup {
    fn measurement(&self, row: &[RawValue]) -> Measurement {
        let cell = |index: Option<usize>| index.and_then(|i| row.get(i));
        let float = |index: Option<usize>| cell(index).and_then(RawValue::as_f64);
        let flag = |index: Option<usize>| cell(index).and_then(RawValue::as_bool).unwrap_or(false);
        let text = |index: Option<usize>| cell(index).and_then(RawValue::as_text);

        let mut measurement = Measurement::new(
            text(self.point_id).unwrap_or_default(),
            text(self.serial_number).unwrap_or_default(),
            float(self.sample).unwrap_or(f64::NAN),
            float(self.line).unwrap_or(f64::NAN),
        );
        measurement.residual_sample = float(self.residual_sample);
        measurement.residual_line = float(self.residual_line);
        measurement.residual_magnitude =
            residual_magnitude(measurement.residual_sample, measurement.residual_line);
        measurement.measure_type = cell(self.measure_type).and_then(RawValue::as_measure_type);
        measurement.point_type = text(self.point_type);
        measurement.point_ignore = flag(self.point_ignore);
        measurement.measure_ignore = flag(self.measure_ignore);

        let [ax, ay, alon, alat, px, py, plon, plat] = self.ground.map(float);
        measurement.adjusted_x = ax;
        measurement.adjusted_y = ay;
        measurement.adjusted_lon = alon;
        measurement.adjusted_lat = alat;
        measurement.apriori_x = px;
        measurement.apriori_y = py;
        measurement.apriori_lon = plon;
        measurement.apriori_lat = plat;

        measurement.status = classify(&measurement);
        measurement
    }
}
