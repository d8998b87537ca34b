// Adapters layer: concrete implementations of the domain ports.

#[cfg(feature = "gdal")]
pub mod gdal_engine;
pub mod storage;
