use crate::model::{MeasureType, Measurement, MeasurementStatus};

/// Residuals at or below this magnitude count as "never adjusted".
pub const RESIDUAL_EPSILON: f64 = 1e-10;

/// Registration status of one measurement.
pub fn classify(measurement: &Measurement) -> MeasurementStatus {
    classify_fields(
        measurement.point_ignore,
        measurement.measure_ignore,
        measurement.measure_type,
        measurement.residual_sample,
        measurement.residual_line,
    )
}

/// Classification over the raw inputs; absent values count as false/zero.
///
/// Ignore flags win over everything. A registered measure type, or any
/// non-zero residual left behind by a bundle adjustment, marks the
/// measurement registered.
pub fn classify_fields(
    point_ignore: bool,
    measure_ignore: bool,
    measure_type: Option<MeasureType>,
    residual_sample: Option<f64>,
    residual_line: Option<f64>,
) -> MeasurementStatus {
    if point_ignore || measure_ignore {
        return MeasurementStatus::Ignored;
    }

    if measure_type.map_or(false, MeasureType::is_registered) {
        return MeasurementStatus::Registered;
    }

    let adjusted = |residual: Option<f64>| residual.map_or(false, |r| r.abs() > RESIDUAL_EPSILON);
    if adjusted(residual_sample) || adjusted(residual_line) {
        return MeasurementStatus::Registered;
    }

    MeasurementStatus::Unregistered
}

/// Aggregate status of a point from its measurements' statuses.
///
/// All-ignored points stay ignored; a single registered measurement
/// establishes the point's location and wins over unregistered ones.
pub fn point_status<I>(statuses: I) -> MeasurementStatus
where
    I: IntoIterator<Item = MeasurementStatus>,
{
    let mut all_ignored = true;
    let mut any_registered = false;
    for status in statuses {
        match status {
            MeasurementStatus::Ignored => {}
            MeasurementStatus::Registered => {
                all_ignored = false;
                any_registered = true;
            }
            MeasurementStatus::Unregistered => all_ignored = false,
        }
    }

    if any_registered {
        MeasurementStatus::Registered
    } else if all_ignored {
        MeasurementStatus::Ignored
    } else {
        MeasurementStatus::Unregistered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MeasurementStatus::*;

    #[test]
    fn ignore_flags_take_priority() {
        assert_eq!(
            classify_fields(true, false, Some(MeasureType::RegisteredSubPixel), Some(2.0), None),
            Ignored
        );
        assert_eq!(classify_fields(false, true, None, None, None), Ignored);
    }

    #[test]
    fn registered_measure_type_is_registered() {
        assert_eq!(
            classify_fields(false, false, Some(MeasureType::RegisteredPixel), None, None),
            Registered
        );
    }

    #[test]
    fn residuals_mark_candidate_registered() {
        assert_eq!(
            classify_fields(false, false, Some(MeasureType::Candidate), Some(0.5), Some(-0.3)),
            Registered
        );
    }

    #[test]
    fn zero_residual_candidate_is_unregistered() {
        assert_eq!(
            classify_fields(false, false, Some(MeasureType::Candidate), Some(0.0), Some(0.0)),
            Unregistered
        );
        assert_eq!(classify_fields(false, false, None, None, None), Unregistered);
        assert_eq!(
            classify_fields(false, false, Some(MeasureType::Manual), Some(1e-12), None),
            Unregistered
        );
    }

    #[test]
    fn classify_reads_measurement_fields() {
        let mut measurement = Measurement::new("p1", "S1", 10.0, 20.0);
        assert_eq!(classify(&measurement), Unregistered);
        measurement.residual_line = Some(0.25);
        assert_eq!(classify(&measurement), Registered);
        measurement.point_ignore = true;
        assert_eq!(classify(&measurement), Ignored);
    }

    #[test]
    fn point_status_tie_break() {
        assert_eq!(point_status([Ignored, Unregistered]), Unregistered);
        assert_eq!(point_status([Ignored, Ignored]), Ignored);
        assert_eq!(point_status([Unregistered, Registered]), Registered);
        assert_eq!(point_status([Ignored, Registered]), Registered);
    }
}
