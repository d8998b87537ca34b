pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "gdal")]
pub use adapters::gdal_engine::GdalEngine;

pub use adapters::storage::LocalStorage;
pub use config::{EngineSettings, Settings};
pub use core::{
    extractor::MetadataExtractor,
    fields::{FieldRule, PostProcess},
    metadata::MetadataDocument,
};
pub use domain::model::{Notice, RunSummary};
pub use utils::error::{ExtractError, Result};
