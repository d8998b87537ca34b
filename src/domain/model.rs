use std::fmt;
use std::path::PathBuf;

/// One line of the console report.
///
/// `Display` renders the exact text printed to stdout; the path is shown as the
/// operator supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FgdbNotFound {
        path: PathBuf,
    },
    OpenFailed {
        path: PathBuf,
        reason: String,
    },
    NoMetadata {
        layer: String,
        path: PathBuf,
    },
    NoElement {
        field: String,
        layer: String,
        path: PathBuf,
    },
    NoText {
        field: String,
        layer: String,
        path: PathBuf,
    },
    MalformedMetadata {
        layer: String,
        path: PathBuf,
        reason: String,
    },
    LayerFailed {
        layer: String,
        path: PathBuf,
        reason: String,
    },
    Complete {
        layer: String,
    },
}

impl Notice {
    /// Error notices are worth a `warn!` in the diagnostic log as well.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::FgdbNotFound { .. }
                | Notice::OpenFailed { .. }
                | Notice::MalformedMetadata { .. }
                | Notice::LayerFailed { .. }
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::FgdbNotFound { path } => {
                write!(f, "Error: FGDB not found at {}", path.display())
            }
            Notice::OpenFailed { path, reason } => {
                write!(f, "Error: could not open FGDB at {}: {}", path.display(), reason)
            }
            Notice::NoMetadata { layer, path } => {
                write!(f, "No metadata found for {} in {}", layer, path.display())
            }
            Notice::NoElement { field, layer, path } => {
                write!(f, "No {} element for {} in {}", field, layer, path.display())
            }
            Notice::NoText { field, layer, path } => {
                write!(f, "No {} text for {} in {}", field, layer, path.display())
            }
            Notice::MalformedMetadata {
                layer,
                path,
                reason,
            } => write!(
                f,
                "Error: malformed metadata for {} in {}: {}",
                layer,
                path.display(),
                reason
            ),
            Notice::LayerFailed {
                layer,
                path,
                reason,
            } => write!(
                f,
                "Error: failed to process {} in {}: {}",
                layer,
                path.display(),
                reason
            ),
            Notice::Complete { layer } => write!(f, "Complete: {}", layer),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerOutcome {
    /// Every field rule ran, whether or not its field was present.
    Complete,
    /// The layer carries no metadata payload.
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSummary {
    pub found: bool,
    pub layers_completed: usize,
    pub layers_skipped: usize,
    pub layers_failed: usize,
    pub files_written: Vec<PathBuf>,
}

impl PathSummary {
    pub fn record(&mut self, outcome: LayerOutcome) {
        match outcome {
            LayerOutcome::Complete => self.layers_completed += 1,
            LayerOutcome::Skipped => self.layers_skipped += 1,
            LayerOutcome::Failed => self.layers_failed += 1,
        }
    }

    pub fn layers_seen(&self) -> usize {
        self.layers_completed + self.layers_skipped + self.layers_failed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub paths_processed: usize,
    pub paths_missing: usize,
    pub layers_completed: usize,
    pub layers_skipped: usize,
    pub layers_failed: usize,
    pub files_written: usize,
}

impl RunSummary {
    pub fn absorb(&mut self, summary: &PathSummary) {
        if summary.found {
            self.paths_processed += 1;
        } else {
            self.paths_missing += 1;
        }
        self.layers_completed += summary.layers_completed;
        self.layers_skipped += summary.layers_skipped;
        self.layers_failed += summary.layers_failed;
        self.files_written += summary.files_written.len();
    }

    pub fn has_failures(&self) -> bool {
        self.layers_failed > 0
    }
}
