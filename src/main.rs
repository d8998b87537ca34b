use anyhow::Context;
use clap::Parser;
use fgdb_metadata::config::cli::USAGE;
use fgdb_metadata::utils::error::ErrorSeverity;
use fgdb_metadata::utils::{logger, validation::Validate};
use fgdb_metadata::{
    CliConfig, ExtractError, GdalEngine, LocalStorage, MetadataExtractor, Notice,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.json_logs);

    tracing::info!("Starting extract-metadata");
    tracing::debug!("CLI config: {:?}", config);

    match run(&config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);

            let source = e.downcast_ref::<ExtractError>();
            if let Some(err) = source {
                eprintln!("Suggestion: {}", err.recovery_suggestion());
            }
            let severity = source
                .map(ExtractError::severity)
                .unwrap_or(ErrorSeverity::High);

            match severity {
                ErrorSeverity::Critical => ExitCode::from(3),
                ErrorSeverity::Medium => ExitCode::from(2),
                ErrorSeverity::Low | ErrorSeverity::High => ExitCode::from(1),
            }
        }
    }
}

fn run(config: &CliConfig) -> anyhow::Result<ExitCode> {
    let settings = config
        .resolve_settings()
        .context("Failed to load settings")?;
    settings.validate().context("Invalid settings")?;

    // The engine is torn down when it goes out of scope, on every return below.
    let engine = GdalEngine::initialize(&settings.engine)?;

    if config.fgdb_paths.is_empty() {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let extractor = MetadataExtractor::from_settings(&engine, LocalStorage::new(), &settings);
    let summary = extractor.run(&config.fgdb_paths, &mut |notice: &Notice| println!("{}", notice));

    if summary.has_failures() {
        tracing::warn!(
            "{} layer(s) could not be processed with {}",
            summary.layers_failed,
            engine.driver_name()
        );
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}
