//! Control-network data model and derivation pipeline for planetary image review.
//!
//! A binary tie-point network is flattened into a measurement table, every
//! measurement is classified by registration status, and point-level,
//! summary and image-pair views are derived from that table without
//! mutating it. Ground coordinates fall back to camera-model conversion
//! through ISIS `campt` when the network carries none.

pub mod io;
pub mod isis;
pub mod math;
pub mod model;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use io::{NetworkLoader, TableCache};
pub use isis::{ClockLookup, CoordinateConverter};
pub use prelude::{CnetError, CnetResult};
pub use processing::{classify, find_pairs, summarize, PointAggregator};
