use crate::io::label::{LabelReader, PvlLabelReader};
use crate::isis::campt::{CamptConverter, CoordinateConverter};
use crate::isis::fallback::convert_coordinates;
use crate::isis::serial::ClockLookup;
use crate::math::stats::StatsHelper;
use crate::model::{ControlPoint, GeoPoint, GroundPair, Measurement, MeasurementTable, PointTable};
use crate::prelude::{CnetError, CnetResult};
use crate::processing::classify::point_status;
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Derives one ground location and status per control point.
pub struct PointAggregator {
    labels: Box<dyn LabelReader>,
    converter: Box<dyn CoordinateConverter>,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl PointAggregator {
    pub fn new(labels: Box<dyn LabelReader>, converter: Box<dyn CoordinateConverter>) -> Self {
        Self {
            labels,
            converter,
            logger: LogManager::new("aggregate"),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Point table from the network's own ground coordinates, or from
    /// camera-model conversion on `image_paths` when it has none.
    pub fn to_points(
        &self,
        table: &MeasurementTable,
        image_paths: Option<&[PathBuf]>,
    ) -> CnetResult<PointTable> {
        if table.is_empty() {
            return Ok(PointTable::default());
        }
        if let Some(pair) = select_ground_pair(table) {
            return Ok(self.aggregate(table, pair));
        }

        match image_paths {
            Some(paths) => {
                let lookup = ClockLookup::build(paths, self.labels.as_ref());
                self.convert_and_aggregate(table, &lookup)
            }
            None => Err(CnetError::invalid_input(
                "no ground coordinates in network and no images for conversion",
                table.columns(),
            )),
        }
    }

    /// As [`to_points`](Self::to_points), reusing clock ids already read
    /// from the cubes (for example while loading footprints).
    pub fn to_points_with_lookup(
        &self,
        table: &MeasurementTable,
        lookup: &ClockLookup,
    ) -> CnetResult<PointTable> {
        if table.is_empty() {
            return Ok(PointTable::default());
        }
        match select_ground_pair(table) {
            Some(pair) => Ok(self.aggregate(table, pair)),
            None => self.convert_and_aggregate(table, lookup),
        }
    }

    fn convert_and_aggregate(
        &self,
        table: &MeasurementTable,
        lookup: &ClockLookup,
    ) -> CnetResult<PointTable> {
        self.logger.record(&format!(
            "no ground coordinates; converting {} serials through {} cubes",
            table.distinct_serials().len(),
            lookup.len()
        ));
        let converted =
            convert_coordinates(table, lookup, self.converter.as_ref(), &self.metrics)?;
        Ok(self.aggregate(&converted, GroundPair::Campt))
    }

    fn aggregate(&self, table: &MeasurementTable, pair: GroundPair) -> PointTable {
        let points = aggregate_points(table, pair);
        let groups: HashSet<&str> = table.iter().map(|row| row.point_id.as_str()).collect();
        let dropped = groups.len().saturating_sub(points.len());
        if dropped > 0 {
            self.logger.warn(&format!(
                "dropped {} points without finite {:?} coordinates",
                dropped, pair
            ));
        }
        points
    }
}

impl Default for PointAggregator {
    fn default() -> Self {
        Self::new(
            Box::new(PvlLabelReader::new()),
            Box::new(CamptConverter::default()),
        )
    }
}

/// First coordinate pair carrying any non-zero value in the table.
pub fn select_ground_pair(table: &MeasurementTable) -> Option<GroundPair> {
    let non_zero = |value: Option<f64>| value.map_or(false, |v| v != 0.0 && !v.is_nan());
    GroundPair::NETWORK_ORDER.into_iter().find(|pair| {
        table.iter().any(|row| {
            let (lon, lat) = pair.values(row);
            non_zero(lon) || non_zero(lat)
        })
    })
}

/// Groups measurements by point id (sorted) and averages `pair` per point.
/// Points whose mean location is not finite are left out.
pub fn aggregate_points(table: &MeasurementTable, pair: GroundPair) -> PointTable {
    let mut groups: BTreeMap<&str, Vec<&Measurement>> = BTreeMap::new();
    for row in table {
        groups.entry(row.point_id.as_str()).or_default().push(row);
    }

    let points = groups
        .into_iter()
        .filter_map(|(point_id, rows)| {
            let lon = StatsHelper::mean_present(rows.iter().map(|row| pair.values(row).0));
            let lat = StatsHelper::mean_present(rows.iter().map(|row| pair.values(row).1));
            if !lon.is_finite() || !lat.is_finite() {
                return None;
            }

            let residuals: Vec<f64> = rows.iter().map(|row| row.residual_magnitude).collect();
            Some(ControlPoint {
                point_id: point_id.to_string(),
                status: point_status(rows.iter().map(|row| row.status)),
                geometry: GeoPoint { lon, lat },
                n_measures: rows.len(),
                residual_magnitude: StatsHelper::mean(&residuals),
                point_type: rows.first().and_then(|row| row.point_type.clone()),
            })
        })
        .collect();

    PointTable::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::label::Label;
    use crate::model::MeasurementStatus;
    use std::path::Path;

    struct ClockLabels;

    impl LabelReader for ClockLabels {
        fn read_label(&self, path: &Path) -> CnetResult<Label> {
            let clock = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| CnetError::NotFound(path.to_path_buf()))?;
            Label::parse(&format!(
                "Object = IsisCube\nGroup = Instrument\nSpacecraftClockCount = {}\nEnd_Group\nEnd_Object\nEnd\n",
                clock
            ))
        }
    }

    /// Echoes pixels back as coordinates; the cube for clock 333 has no SPICE.
    struct EchoConverter;

    impl CoordinateConverter for EchoConverter {
        fn convert(&self, image: &Path, pixels: &[(f64, f64)]) -> CnetResult<Vec<(f64, f64)>> {
            if image.ends_with("333.cub") {
                return Err(CnetError::Tool("no SPICE".into()));
            }
            Ok(pixels.iter().map(|(s, l)| (*s, *l)).collect())
        }
    }

    fn aggregator() -> PointAggregator {
        PointAggregator::new(Box::new(ClockLabels), Box::new(EchoConverter))
    }

    fn measure(point: &str, serial: &str, status: MeasurementStatus) -> Measurement {
        let mut m = Measurement::new(point, serial, 1.0, 2.0);
        m.status = status;
        m
    }

    fn with_apriori(mut m: Measurement, lon: f64, lat: f64) -> Measurement {
        m.apriori_lon = Some(lon);
        m.apriori_lat = Some(lat);
        m
    }

    #[test]
    fn point_status_follows_tie_break() {
        use MeasurementStatus::*;
        let rows = vec![
            with_apriori(measure("a", "S1", Ignored), 1.0, 1.0),
            with_apriori(measure("a", "S2", Unregistered), 1.0, 1.0),
            with_apriori(measure("b", "S1", Ignored), 2.0, 2.0),
            with_apriori(measure("b", "S2", Ignored), 2.0, 2.0),
            with_apriori(measure("c", "S1", Unregistered), 3.0, 3.0),
            with_apriori(measure("c", "S2", Registered), 3.0, 3.0),
        ];
        let points = aggregate_points(
            &MeasurementTable::new(Vec::new(), rows),
            GroundPair::AprioriLonLat,
        );
        assert_eq!(points.get("a").map(|p| p.status), Some(Unregistered));
        assert_eq!(points.get("b").map(|p| p.status), Some(Ignored));
        assert_eq!(points.get("c").map(|p| p.status), Some(Registered));
    }

    #[test]
    fn coordinates_and_residuals_are_group_means() {
        use MeasurementStatus::Registered;
        let mut first = with_apriori(measure("p", "S1", Registered), 10.0, -5.0);
        first.residual_magnitude = 1.0;
        first.point_type = Some("Free".into());
        let mut second = with_apriori(measure("p", "S2", Registered), 12.0, -7.0);
        second.residual_magnitude = 3.0;
        second.point_type = Some("Fixed".into());
        let mut third = measure("p", "S3", Registered);
        third.residual_magnitude = 2.0;

        let points = aggregate_points(
            &MeasurementTable::new(Vec::new(), vec![first, second, third]),
            GroundPair::AprioriLonLat,
        );
        let point = &points.points()[0];
        assert_eq!(point.geometry, GeoPoint { lon: 11.0, lat: -6.0 });
        assert_eq!(point.n_measures, 3);
        assert_eq!(point.residual_magnitude, 2.0);
        assert_eq!(point.point_type.as_deref(), Some("Free"));
    }

    #[test]
    fn ground_pair_selection_prefers_adjusted_and_skips_zeros() {
        let mut m = measure("p", "S1", MeasurementStatus::Registered);
        m.adjusted_x = Some(0.0);
        m.adjusted_y = Some(0.0);
        m.apriori_x = Some(5.0);
        m.apriori_lon = Some(6.0);
        let table = MeasurementTable::new(Vec::new(), vec![m.clone()]);
        assert_eq!(select_ground_pair(&table), Some(GroundPair::AprioriXY));

        m.adjusted_lat = Some(1.0);
        let table = MeasurementTable::new(Vec::new(), vec![m]);
        assert_eq!(select_ground_pair(&table), Some(GroundPair::AdjustedLonLat));
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let mut partial = measure("q", "S1", MeasurementStatus::Registered);
        partial.apriori_lon = Some(4.0);
        let rows = vec![
            with_apriori(measure("p", "S1", MeasurementStatus::Registered), 1.0, 1.0),
            partial,
        ];
        let points = aggregator()
            .to_points(&MeasurementTable::new(Vec::new(), rows), None)
            .unwrap();
        assert_eq!(points.len(), 1);
        assert!(points.get("q").is_none());
    }

    #[test]
    fn empty_table_yields_empty_points() {
        let points = aggregator().to_points(&MeasurementTable::default(), None).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn missing_coordinates_without_images_is_invalid_input() {
        let table = MeasurementTable::new(
            vec!["pointId".into(), "serialNumber".into()],
            vec![measure("p", "S1", MeasurementStatus::Unregistered)],
        );
        match aggregator().to_points(&table, None) {
            Err(CnetError::InvalidInput { available, .. }) => {
                assert_eq!(available, vec!["pointId".to_string(), "serialNumber".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn fallback_converts_resolved_images() {
        let rows = vec![
            measure("p1", "SC/111", MeasurementStatus::Registered),
            measure("p1", "SC/222", MeasurementStatus::Unregistered),
            measure("p2", "SC/333", MeasurementStatus::Unregistered),
        ];
        let table = MeasurementTable::new(Vec::new(), rows);
        let images = vec![
            PathBuf::from("/cubes/111.cub"),
            PathBuf::from("/cubes/222.cub"),
            PathBuf::from("/cubes/333.cub"),
        ];

        let aggregator = aggregator();
        let points = aggregator.to_points(&table, Some(&images[..])).unwrap();
        assert_eq!(points.len(), 1);
        let point = points.get("p1").unwrap();
        assert_eq!(point.geometry, GeoPoint { lon: 1.0, lat: 2.0 });
        assert_eq!(point.status, MeasurementStatus::Registered);
        assert_eq!(aggregator.metrics().conversions_ok, 2);
        assert_eq!(aggregator.metrics().conversions_failed, 1);
    }

    #[test]
    fn fallback_with_no_matching_images_fails() {
        let table = MeasurementTable::new(
            Vec::new(),
            vec![measure("p1", "SC/999", MeasurementStatus::Unregistered)],
        );
        let err = aggregator()
            .to_points(&table, Some(&[PathBuf::from("/cubes/111.cub")][..]))
            .unwrap_err();
        assert!(matches!(err, CnetError::Conversion { .. }));
    }

    #[test]
    fn precomputed_lookup_skips_label_reads() {
        let mut lookup = ClockLookup::new();
        lookup.insert("111", "/cubes/111.cub");
        let table = MeasurementTable::new(
            Vec::new(),
            vec![measure("p1", "SC/111", MeasurementStatus::Unregistered)],
        );
        let points = aggregator().to_points_with_lookup(&table, &lookup).unwrap();
        assert_eq!(points.count_with_status(MeasurementStatus::Unregistered), 1);
    }
}
