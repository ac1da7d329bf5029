pub mod cache;
pub mod label;
pub mod loader;
pub mod reader;

pub use cache::{CacheKey, DiskCache, MemoryCache, TableCache};
pub use label::{Label, LabelGroup, LabelReader, PvlLabelReader};
pub use loader::NetworkLoader;
pub use reader::{CsvNetworkReader, NetworkReader, RawTable, RawValue};
