use crate::utils::error::Result;
use std::path::Path;

/// Process-wide geospatial runtime. Dropping the engine tears it down.
pub trait GeoEngine {
    type Database: Geodatabase;

    /// Opens the geodatabase directory at `path` read-only.
    fn open(&self, path: &Path) -> Result<Self::Database>;
}

pub trait Geodatabase {
    /// Layer names in the driver's enumeration order.
    fn layer_names(&self) -> Vec<String>;

    /// The layer's raw metadata payload, or `None` when the layer has none.
    fn raw_metadata(&self, layer_name: &str) -> Result<Option<String>>;
}

pub trait Storage {
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;
}
