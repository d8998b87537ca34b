pub mod extractor;
pub mod fields;
pub mod metadata;

pub use crate::domain::model::{LayerOutcome, Notice, PathSummary, RunSummary};
pub use crate::domain::ports::{GeoEngine, Geodatabase, Storage};
pub use crate::utils::error::Result;
