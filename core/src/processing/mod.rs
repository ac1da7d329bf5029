pub mod aggregate;
pub mod classify;
pub mod pairs;
pub mod summary;

pub use aggregate::PointAggregator;
pub use classify::{classify, classify_fields, point_status};
pub use pairs::{find_pairs, ImagePair};
pub use summary::{summarize, NetworkSummary};
