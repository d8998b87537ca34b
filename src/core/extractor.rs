use crate::config::Settings;
use crate::core::fields::{Extraction, FieldRule};
use crate::core::metadata::MetadataDocument;
use crate::domain::model::{LayerOutcome, Notice, PathSummary, RunSummary};
use crate::domain::ports::{GeoEngine, Geodatabase, Storage};
use crate::utils::error::Result;
use std::path::{Component, Path, PathBuf};

/// Walks geodatabases layer by layer, writing the raw payload and one sidecar
/// per present field.
///
/// Report lines are handed to `on_notice` as they happen. A failing layer
/// only ends that layer.
pub struct MetadataExtractor<'e, E: GeoEngine, S: Storage> {
    engine: &'e E,
    storage: S,
    rules: Vec<FieldRule>,
    output_dir: Option<PathBuf>,
}

impl<'e, E: GeoEngine, S: Storage> MetadataExtractor<'e, E, S> {
    pub fn new(engine: &'e E, storage: S, rules: Vec<FieldRule>) -> Self {
        Self {
            engine,
            storage,
            rules,
            output_dir: None,
        }
    }

    pub fn from_settings(engine: &'e E, storage: S, settings: &Settings) -> Self {
        Self::new(engine, storage, settings.fields.clone()).with_output_dir(settings.output_dir.clone())
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn run(&self, fgdb_paths: &[PathBuf], on_notice: &mut dyn FnMut(&Notice)) -> RunSummary {
        let mut run = RunSummary::default();
        for fgdb_path in fgdb_paths {
            let summary = self.process_path(fgdb_path, on_notice);
            run.absorb(&summary);
        }

        tracing::info!(
            "Processed {} geodatabase(s), {} missing: {} layer(s) complete, {} skipped, {} failed, {} file(s) written",
            run.paths_processed,
            run.paths_missing,
            run.layers_completed,
            run.layers_skipped,
            run.layers_failed,
            run.files_written
        );
        run
    }

    pub fn process_path(&self, fgdb_path: &Path, on_notice: &mut dyn FnMut(&Notice)) -> PathSummary {
        let mut summary = PathSummary::default();

        if !fgdb_path.is_dir() {
            emit(
                on_notice,
                Notice::FgdbNotFound {
                    path: fgdb_path.to_path_buf(),
                },
            );
            return summary;
        }
        summary.found = true;

        let opened = self
            .target_dir(fgdb_path)
            .and_then(|target_dir| Ok((target_dir, self.engine.open(fgdb_path)?)));
        let (target_dir, database) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                emit(
                    on_notice,
                    Notice::OpenFailed {
                        path: fgdb_path.to_path_buf(),
                        reason: e.to_string(),
                    },
                );
                return summary;
            }
        };

        let layer_names = database.layer_names();
        tracing::info!(
            "{}: {} layer(s), writing to {}",
            fgdb_path.display(),
            layer_names.len(),
            target_dir.display()
        );

        for layer_name in &layer_names {
            let outcome = match self.process_layer(
                &database,
                fgdb_path,
                &target_dir,
                layer_name,
                &mut summary.files_written,
                on_notice,
            ) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let notice = if e.is_malformed_metadata() {
                        Notice::MalformedMetadata {
                            layer: layer_name.clone(),
                            path: fgdb_path.to_path_buf(),
                            reason: e.reason(),
                        }
                    } else {
                        Notice::LayerFailed {
                            layer: layer_name.clone(),
                            path: fgdb_path.to_path_buf(),
                            reason: e.to_string(),
                        }
                    };
                    tracing::debug!("Suggestion: {}", e.recovery_suggestion());
                    emit(on_notice, notice);
                    LayerOutcome::Failed
                }
            };
            summary.record(outcome);
        }

        tracing::debug!(
            "{}: {} of {} layer(s) complete",
            fgdb_path.display(),
            summary.layers_completed,
            summary.layers_seen()
        );
        summary
    }

    fn process_layer<D: Geodatabase>(
        &self,
        database: &D,
        fgdb_path: &Path,
        target_dir: &Path,
        layer_name: &str,
        files_written: &mut Vec<PathBuf>,
        on_notice: &mut dyn FnMut(&Notice),
    ) -> Result<LayerOutcome> {
        let Some(raw_metadata) = database
            .raw_metadata(layer_name)?
            .filter(|payload| !payload.is_empty())
        else {
            emit(
                on_notice,
                Notice::NoMetadata {
                    layer: layer_name.to_string(),
                    path: fgdb_path.to_path_buf(),
                },
            );
            return Ok(LayerOutcome::Skipped);
        };

        // the raw payload is kept even if it turns out not to parse
        let xml_path = sidecar_path(target_dir, layer_name, "xml");
        self.storage.write_file(&xml_path, raw_metadata.as_bytes())?;
        files_written.push(xml_path);

        let document = MetadataDocument::parse(&raw_metadata)?;

        for rule in &self.rules {
            match rule.extract(&document) {
                Extraction::Value(value) => {
                    let path = sidecar_path(target_dir, layer_name, &rule.suffix);
                    self.storage.write_file(&path, value.as_bytes())?;
                    files_written.push(path);
                }
                Extraction::MissingElement => emit(
                    on_notice,
                    Notice::NoElement {
                        field: rule.name.clone(),
                        layer: layer_name.to_string(),
                        path: fgdb_path.to_path_buf(),
                    },
                ),
                Extraction::MissingText => emit(
                    on_notice,
                    Notice::NoText {
                        field: rule.name.clone(),
                        layer: layer_name.to_string(),
                        path: fgdb_path.to_path_buf(),
                    },
                ),
            }
        }

        emit(
            on_notice,
            Notice::Complete {
                layer: layer_name.to_string(),
            },
        );
        Ok(LayerOutcome::Complete)
    }

    /// The configured output directory, or the directory containing the
    /// geodatabase.
    fn target_dir(&self, fgdb_path: &Path) -> Result<PathBuf> {
        if let Some(output_dir) = &self.output_dir {
            return Ok(output_dir.clone());
        }

        parent_dir(fgdb_path)
    }
}

/// Directory containing `path`, worked out on the path text alone: symlinks
/// are not followed, `.` and `..` are folded lexically.
pub fn parent_dir(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    // the root is its own parent
    normalized.pop();
    Ok(normalized)
}

pub fn sidecar_path(target_dir: &Path, layer_name: &str, suffix: &str) -> PathBuf {
    target_dir.join(format!("{}.{}", layer_name, suffix))
}

fn emit(on_notice: &mut dyn FnMut(&Notice), notice: Notice) {
    if notice.is_error() {
        tracing::warn!("{}", notice);
    } else {
        tracing::debug!("{}", notice);
    }
    on_notice(&notice);
}
