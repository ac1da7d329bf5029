pub mod campt;
pub mod fallback;
pub mod serial;

pub use campt::{CamptConverter, CoordinateConverter};
pub use fallback::convert_coordinates;
pub use serial::{build_lookup, clock_id, match_serials, ClockLookup};
