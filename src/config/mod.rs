#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::core::fields::FieldRule;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_element_path, validate_file_suffix, validate_non_empty_string, validate_path,
    validate_unique, Validate,
};
use std::path::PathBuf;

pub const DEFAULT_DRIVER: &str = "OpenFileGDB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// GDAL short driver name used to open geodatabases.
    pub driver: String,
    /// Optional `GDAL_DATA` directory, the engine's prefix path.
    pub gdal_data: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            gdal_data: None,
        }
    }
}

/// Fully resolved run settings: defaults, then the config file, then flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub engine: EngineSettings,
    /// Sidecars go next to each geodatabase unless this is set.
    pub output_dir: Option<PathBuf>,
    pub fields: Vec<FieldRule>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            output_dir: None,
            fields: FieldRule::defaults(),
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("engine.driver", &self.engine.driver)?;

        if let Some(gdal_data) = &self.engine.gdal_data {
            validate_path("engine.gdal_data", &gdal_data.to_string_lossy())?;
        }

        if let Some(output_dir) = &self.output_dir {
            validate_path("output.directory", &output_dir.to_string_lossy())?;
        }

        for rule in &self.fields {
            validate_non_empty_string("fields.name", &rule.name)?;
            validate_element_path("fields.path", &rule.path)?;
            validate_file_suffix("fields.suffix", &rule.suffix)?;
        }

        validate_unique(
            "fields.suffix",
            self.fields
                .iter()
                .map(|rule| rule.suffix.as_str())
                .chain(std::iter::once("xml")),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::PostProcess;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.engine.driver, "OpenFileGDB");
        assert_eq!(settings.fields.len(), 3);
    }

    #[test]
    fn test_rule_cannot_shadow_raw_payload() {
        let mut settings = Settings::default();
        settings
            .fields
            .push(FieldRule::new("raw", "dataIdInfo", PostProcess::Verbatim, "xml"));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_driver_is_rejected() {
        let mut settings = Settings::default();
        settings.engine.driver = " ".to_string();
        assert!(settings.validate().is_err());
    }
}
