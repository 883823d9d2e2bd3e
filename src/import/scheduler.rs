//! Background imports
//!
//! [`ImportScheduler`] runs orchestrator jobs on the tokio blocking pool so
//! decoding and validation never run on the caller's context. Progress
//! reaches the caller through whatever [`ProgressReporter`] is attached,
//! usually a [`ChannelProgress`](crate::import::ChannelProgress).

use crate::import::orchestrator::ImportOrchestrator;
use crate::import::progress::ProgressReporter;
use crate::io::tabular::TabularReader;
use crate::types::{Catalog, ImportError, MovementKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a submitted import
#[derive(Debug)]
pub struct ImportTask {
    kinds: Vec<MovementKind>,
    handle: JoinHandle<Result<usize, ImportError>>,
}

impl ImportTask {
    /// Kinds of the sheets in this import, in validation order
    pub fn kinds(&self) -> &[MovementKind] {
        &self.kinds
    }

    /// Wait for the import to finish
    ///
    /// A task that panicked or was cancelled reports
    /// `ImportError::BackgroundTask`.
    pub async fn wait(self) -> Result<usize, ImportError> {
        self.handle.await.map_err(|e| ImportError::BackgroundTask {
            reason: e.to_string(),
        })?
    }
}

/// Submits imports to a tokio runtime
pub struct ImportScheduler<R: TabularReader + 'static> {
    orchestrator: Arc<ImportOrchestrator<R>>,
    runtime: Handle,
}

impl<R: TabularReader + 'static> ImportScheduler<R> {
    pub fn new(orchestrator: Arc<ImportOrchestrator<R>>, runtime: Handle) -> Self {
        Self {
            orchestrator,
            runtime,
        }
    }

    /// Start importing `path` as `kind` in the background
    pub fn submit(
        &self,
        kind: MovementKind,
        path: PathBuf,
        catalog: Arc<Catalog>,
        progress: Arc<dyn ProgressReporter>,
    ) -> ImportTask {
        debug!(kind = %kind, path = %path.display(), "import submitted");
        let orchestrator = Arc::clone(&self.orchestrator);
        let handle = self.runtime.spawn_blocking(move || {
            orchestrator.run(kind, &path, &catalog, progress.as_ref())
        });
        ImportTask {
            kinds: vec![kind],
            handle,
        }
    }

    /// Start importing `sheets` in the background as one all-or-nothing batch
    pub fn submit_batch(
        &self,
        sheets: Vec<(MovementKind, PathBuf)>,
        catalog: Arc<Catalog>,
        progress: Arc<dyn ProgressReporter>,
    ) -> ImportTask {
        debug!(sheets = sheets.len(), "batch import submitted");
        let kinds = sheets.iter().map(|(kind, _)| *kind).collect();
        let orchestrator = Arc::clone(&self.orchestrator);
        let handle = self.runtime.spawn_blocking(move || {
            let sheets: Vec<(MovementKind, &Path)> = sheets
                .iter()
                .map(|(kind, path)| (*kind, path.as_path()))
                .collect();
            orchestrator.run_batch(&sheets, &catalog, progress.as_ref())
        });
        ImportTask { kinds, handle }
    }
}
