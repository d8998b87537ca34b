use crate::config::EngineSettings;
use crate::domain::ports::{GeoEngine, Geodatabase};
use crate::utils::error::{ExtractError, Result};
use gdal::vector::sql::Dialect;
use gdal::vector::LayerAccess;
use gdal::{Dataset, DatasetOptions, Driver, DriverManager, GdalOpenFlags};
use std::path::Path;

impl From<gdal::errors::GdalError> for ExtractError {
    fn from(e: gdal::errors::GdalError) -> Self {
        ExtractError::DriverError {
            message: e.to_string(),
        }
    }
}

/// Handle on the process-wide GDAL runtime.
///
/// Create exactly one per process; dropping it deregisters the vector driver it
/// resolved, after which no further geodatabase can be opened through it.
pub struct GdalEngine {
    driver: Driver,
    driver_name: String,
}

impl GdalEngine {
    pub fn initialize(settings: &EngineSettings) -> Result<Self> {
        if let Some(gdal_data) = &settings.gdal_data {
            let value = gdal_data.to_str().ok_or_else(|| ExtractError::EngineError {
                message: format!("GDAL data path is not valid UTF-8: {}", gdal_data.display()),
            })?;
            gdal::config::set_config_option("GDAL_DATA", value).map_err(|e| {
                ExtractError::EngineError {
                    message: format!("could not set GDAL_DATA: {}", e),
                }
            })?;
            tracing::debug!("GDAL_DATA set to {}", value);
        }

        DriverManager::register_all();

        let driver = DriverManager::get_driver_by_name(&settings.driver).map_err(|e| {
            ExtractError::EngineError {
                message: format!("vector driver '{}' is not available: {}", settings.driver, e),
            }
        })?;

        tracing::info!(
            "GDAL engine ready ({} drivers registered, using {})",
            DriverManager::count(),
            driver.long_name()
        );

        Ok(Self {
            driver,
            driver_name: settings.driver.clone(),
        })
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }
}

impl Drop for GdalEngine {
    fn drop(&mut self) {
        DriverManager::deregister_driver(&self.driver);
        tracing::debug!("GDAL engine torn down ({} deregistered)", self.driver_name);
    }
}

impl GeoEngine for GdalEngine {
    type Database = GdalGeodatabase;

    fn open(&self, path: &Path) -> Result<GdalGeodatabase> {
        let allowed_drivers = [self.driver_name.as_str()];
        let dataset = Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags: GdalOpenFlags::GDAL_OF_READONLY | GdalOpenFlags::GDAL_OF_VECTOR,
                allowed_drivers: Some(&allowed_drivers[..]),
                ..Default::default()
            },
        )?;

        tracing::debug!(
            "Opened {} with {} ({} layers)",
            path.display(),
            self.driver_name,
            dataset.layer_count()
        );

        Ok(GdalGeodatabase { dataset })
    }
}

pub struct GdalGeodatabase {
    dataset: Dataset,
}

impl Geodatabase for GdalGeodatabase {
    fn layer_names(&self) -> Vec<String> {
        self.dataset.layers().map(|layer| layer.name()).collect()
    }

    fn raw_metadata(&self, layer_name: &str) -> Result<Option<String>> {
        // OpenFileGDB special SQL: one record, one string field
        let query = format!("GetLayerMetadata {}", layer_name);

        let Some(mut result_set) = self.dataset.execute_sql(&query, None, Dialect::DEFAULT)? else {
            return Ok(None);
        };

        let Some(feature) = result_set.features().next() else {
            return Ok(None);
        };

        let metadata = feature.field_as_string(0)?;
        Ok(metadata.filter(|payload| !payload.is_empty()))
    }
}
