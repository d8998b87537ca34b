use crate::config::Settings;
use crate::core::fields::FieldRule;
use crate::utils::error::{ExtractError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional settings file, e.g.
///
/// ```toml
/// [engine]
/// driver = "OpenFileGDB"
/// gdal_data = "${GDAL_HOME}/share/gdal"
///
/// [output]
/// directory = "./metadata"
///
/// [[fields]]
/// name = "purpose"
/// path = "dataIdInfo/idPurp"
/// post_process = "html_to_text"
/// suffix = "purpose.txt"
/// ```
///
/// When `[[fields]]` is present it replaces the built-in rule set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub engine: Option<EngineConfig>,
    pub output: Option<OutputConfig>,
    pub fields: Option<Vec<FieldRule>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub driver: Option<String>,
    pub gdal_data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: Option<String>,
}

impl TomlConfig {
    /// Loads settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ExtractError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ExtractError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ExtractError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Layers this file over `base`; absent keys keep the base value.
    pub fn apply_to(&self, mut base: Settings) -> Settings {
        if let Some(engine) = &self.engine {
            if let Some(driver) = &engine.driver {
                base.engine.driver = driver.clone();
            }
            if let Some(gdal_data) = &engine.gdal_data {
                base.engine.gdal_data = Some(PathBuf::from(gdal_data));
            }
        }

        if let Some(directory) = self.output.as_ref().and_then(|o| o.directory.as_ref()) {
            base.output_dir = Some(PathBuf::from(directory));
        }

        if let Some(fields) = &self.fields {
            base.fields = fields.clone();
        }

        base
    }

    pub fn into_settings(self) -> Settings {
        self.apply_to(Settings::default())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.clone().into_settings().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::PostProcess;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[engine]
driver = "FileGDB"
gdal_data = "/opt/gdal/share"

[output]
directory = "./metadata"

[[fields]]
name = "purpose"
path = "dataIdInfo/idPurp"
post_process = "html_to_text"
suffix = "purpose.txt"
"#;

        let settings = TomlConfig::from_toml_str(toml_content)
            .unwrap()
            .into_settings();

        assert_eq!(settings.engine.driver, "FileGDB");
        assert_eq!(
            settings.engine.gdal_data,
            Some(PathBuf::from("/opt/gdal/share"))
        );
        assert_eq!(settings.output_dir, Some(PathBuf::from("./metadata")));
        assert_eq!(
            settings.fields,
            vec![FieldRule::new(
                "purpose",
                "dataIdInfo/idPurp",
                PostProcess::HtmlToText,
                "purpose.txt"
            )]
        );
    }

    #[test]
    fn test_empty_config_keeps_defaults() {
        let settings = TomlConfig::from_toml_str("").unwrap().into_settings();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FGDB_METADATA_TEST_DRIVER", "FileGDB");

        let config = TomlConfig::from_toml_str(
            r#"
[engine]
driver = "${FGDB_METADATA_TEST_DRIVER}"
gdal_data = "${FGDB_METADATA_UNSET_VARIABLE}/gdal"
"#,
        )
        .unwrap();

        let engine = config.engine.unwrap();
        assert_eq!(engine.driver.as_deref(), Some("FileGDB"));
        assert_eq!(
            engine.gdal_data.as_deref(),
            Some("${FGDB_METADATA_UNSET_VARIABLE}/gdal")
        );

        std::env::remove_var("FGDB_METADATA_TEST_DRIVER");
    }

    #[test]
    fn test_unknown_post_process_is_rejected() {
        let result = TomlConfig::from_toml_str(
            r#"
[[fields]]
name = "title"
path = "dataIdInfo/idCitation/resTitle"
post_process = "uppercase"
suffix = "title.txt"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[[fields]]
name = "title"
path = "dataIdInfo//resTitle"
post_process = "verbatim"
suffix = "title.txt"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[output]\ndirectory = \"/srv/metadata\"\n")
            .unwrap();

        let settings = TomlConfig::from_file(temp_file.path())
            .unwrap()
            .into_settings();
        assert_eq!(settings.output_dir, Some(PathBuf::from("/srv/metadata")));
    }
}
