pub(crate) mod floats;
pub mod measure;
pub mod point;

pub use measure::{
    GroundPair, MeasureType, Measurement, MeasurementStatus, MeasurementTable, CANONICAL_COLUMNS,
};
pub use point::{ControlPoint, GeoPoint, PointTable};
