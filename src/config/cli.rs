use crate::config::toml_config::TomlConfig;
use crate::config::Settings;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: extract-metadata fgdb_path [fgdb_path2 ...]";

#[derive(Debug, Clone, Parser)]
#[command(name = "extract-metadata")]
#[command(about = "Extract abstract, title and revision date from File Geodatabase layer metadata")]
pub struct CliConfig {
    /// File Geodatabase directories to process, in order
    #[arg(value_name = "FGDB_PATH")]
    pub fgdb_paths: Vec<PathBuf>,

    /// Path to a TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// GDAL vector driver used to open geodatabases
    #[arg(long)]
    pub driver: Option<String>,

    /// Directory with GDAL support files (sets GDAL_DATA)
    #[arg(long)]
    pub gdal_data: Option<PathBuf>,

    /// Write sidecar files here instead of next to each geodatabase
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit diagnostic logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl CliConfig {
    /// Defaults, then the settings file, then command-line flags.
    pub fn resolve_settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                let file_config = TomlConfig::from_file(path)?;
                file_config.validate()?;
                file_config.into_settings()
            }
            None => Settings::default(),
        };

        if let Some(driver) = &self.driver {
            settings.engine.driver = driver.clone();
        }
        if let Some(gdal_data) = &self.gdal_data {
            settings.engine.gdal_data = Some(gdal_data.clone());
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output_dir = Some(output_dir.clone());
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_paths_in_order() {
        let cli = CliConfig::parse_from(["extract-metadata", "b.gdb", "a.gdb"]);
        assert_eq!(
            cli.fgdb_paths,
            vec![PathBuf::from("b.gdb"), PathBuf::from("a.gdb")]
        );
        assert!(!cli.verbose);
    }

    #[test]
    fn test_no_paths_is_accepted() {
        let cli = CliConfig::try_parse_from(["extract-metadata"]).unwrap();
        assert!(cli.fgdb_paths.is_empty());
    }

    #[test]
    fn test_flags_override_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[engine]\ndriver = \"FileGDB\"\ngdal_data = \"/from/file\"\n")
            .unwrap();

        let config_path = temp_file.path().to_string_lossy().to_string();
        let cli = CliConfig::parse_from([
            "extract-metadata",
            "--config",
            config_path.as_str(),
            "--driver",
            "OpenFileGDB",
            "city.gdb",
        ]);

        let settings = cli.resolve_settings().unwrap();
        assert_eq!(settings.engine.driver, "OpenFileGDB");
        assert_eq!(settings.engine.gdal_data, Some(PathBuf::from("/from/file")));
        assert_eq!(settings.output_dir, None);
    }

    #[test]
    fn test_invalid_config_file_is_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                b"[[fields]]\nname = \"title\"\npath = \"dataIdInfo//resTitle\"\npost_process = \"verbatim\"\nsuffix = \"title.txt\"\n",
            )
            .unwrap();

        let config_path = temp_file.path().to_string_lossy().to_string();
        let cli = CliConfig::parse_from(["extract-metadata", "--config", config_path.as_str()]);

        let err = cli.resolve_settings().unwrap_err();
        assert!(err.to_string().contains("fields.path"), "{err}");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = CliConfig::parse_from([
            "extract-metadata",
            "--config",
            "/nonexistent/settings.toml",
        ]);
        assert!(cli.resolve_settings().is_err());
    }
}
