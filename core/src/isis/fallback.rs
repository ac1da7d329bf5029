use crate::isis::campt::CoordinateConverter;
use crate::isis::serial::ClockLookup;
use crate::model::measure::{CAMPT_LAT, CAMPT_LON};
use crate::model::MeasurementTable;
use crate::prelude::{CnetError, CnetResult};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::path::PathBuf;

/// Fills `campt_lon`/`campt_lat` by converting each image's pixels on its cube.
///
/// Images run one after another. An image whose serial does not resolve, or
/// whose conversion fails or returns the wrong number of rows, leaves its
/// rows without coordinates. Only when no image converts does this fail.
pub fn convert_coordinates(
    table: &MeasurementTable,
    lookup: &ClockLookup,
    converter: &dyn CoordinateConverter,
    metrics: &MetricsRecorder,
) -> CnetResult<MeasurementTable> {
    let logger = LogManager::new("fallback");
    let mut converted = table.clone();
    converted.add_column(CAMPT_LON);
    converted.add_column(CAMPT_LAT);

    let mut attempted: Vec<PathBuf> = Vec::new();
    let mut unresolved: Vec<String> = Vec::new();
    let mut succeeded = 0usize;

    for serial in table.distinct_serials() {
        let image = match lookup.resolve(&serial) {
            Some(image) => image,
            None => {
                logger.warn(&format!("no cube for serial {}", serial));
                unresolved.push(serial);
                continue;
            }
        };

        let indices: Vec<usize> = table
            .iter()
            .enumerate()
            .filter(|(_, row)| row.serial_number == serial)
            .map(|(index, _)| index)
            .collect();
        let pixels: Vec<(f64, f64)> = indices
            .iter()
            .map(|&index| {
                let row = &table.rows()[index];
                (row.sample, row.line)
            })
            .collect();

        attempted.push(image.to_path_buf());
        match converter.convert(image, &pixels) {
            Ok(coordinates) if coordinates.len() == pixels.len() => {
                let rows = converted.rows_mut();
                for (&index, (lon, lat)) in indices.iter().zip(coordinates) {
                    rows[index].campt_lon = Some(lon);
                    rows[index].campt_lat = Some(lat);
                }
                succeeded += 1;
                metrics.record_conversion(true);
            }
            Ok(coordinates) => {
                logger.warn(&format!(
                    "discarding {}: submitted {} pixels, got {} coordinates",
                    image.display(),
                    pixels.len(),
                    coordinates.len()
                ));
                metrics.record_conversion(false);
            }
            Err(err) => {
                logger.warn(&format!("conversion failed on {}: {}", image.display(), err));
                metrics.record_conversion(false);
            }
        }
    }

    if succeeded == 0 {
        return Err(CnetError::Conversion {
            attempted,
            unresolved,
        });
    }

    logger.record(&format!(
        "converted {} of {} images ({} unresolved)",
        succeeded,
        attempted.len(),
        unresolved.len()
    ));
    Ok(converted)
}
