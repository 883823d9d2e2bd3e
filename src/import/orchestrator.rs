//! Import orchestration
//!
//! [`ImportOrchestrator::run_batch`] carries a set of spreadsheets from file to
//! store as one unit:
//!
//! 1. decode every file through the [`TabularReader`]
//! 2. load the committed ledger the balance checks start from
//! 3. parse and validate every row of every sheet, in the order given, with
//!    the kind's [`RowParser`](crate::parse::RowParser) against one set of
//!    running balances
//! 4. stage every movement in one [`ChangeSet`] and commit it
//!
//! Any failure before or during the commit leaves the store untouched.
//! [`ImportOrchestrator::run`] is the single-sheet form. Steps 2 to 4 run
//! under one ledger lock, so no two imports validate against the same
//! snapshot.

use crate::core::ledger::{Ledger, RunningBalances};
use crate::core::store::ChangeSet;
use crate::core::traits::Store;
use crate::import::config::ImportConfig;
use crate::import::progress::ProgressReporter;
use crate::io::tabular::{Table, TabularReader};
use crate::parse::{parse_table, parser_for};
use crate::types::{Catalog, ImportError, Movement, MovementKind};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};

/// Runs imports against a store
pub struct ImportOrchestrator<R: TabularReader> {
    store: Arc<dyn Store>,
    reader: R,
    config: ImportConfig,
    /// Held from ledger load to commit
    ledger_lock: Mutex<()>,
}

impl<R: TabularReader> ImportOrchestrator<R> {
    pub fn new(store: Arc<dyn Store>, reader: R, config: ImportConfig) -> Self {
        Self {
            store,
            reader,
            config,
            ledger_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Import the `kind` spreadsheet at `path`
    ///
    /// Blocks while another import is validating or committing. Progress is
    /// reported every `progress_every` accepted rows, then completion or the
    /// error.
    ///
    /// # Returns
    ///
    /// The number of movements committed.
    pub fn run(
        &self,
        kind: MovementKind,
        path: &Path,
        catalog: &Catalog,
        progress: &dyn ProgressReporter,
    ) -> Result<usize, ImportError> {
        match self.import(&[(kind, path)], catalog, progress) {
            Ok(totals) => {
                let total = totals.iter().sum();
                info!(kind = %kind, path = %path.display(), total, "import committed");
                progress.on_task_complete(kind.label(), total);
                Ok(total)
            }
            Err(e) => {
                let e = e.into_sheet_source();
                error!(kind = %kind, path = %path.display(), error = %e, "import failed");
                progress.on_error(&e);
                Err(e)
            }
        }
    }

    /// Import several spreadsheets all or nothing
    ///
    /// Sheets are validated in the order given, each against the committed
    /// ledger plus every row accepted from the sheets before it. Completion
    /// is reported per sheet once everything is committed.
    ///
    /// # Errors
    ///
    /// A failure tied to one sheet is an `ImportError::Sheet` naming its
    /// kind. Nothing is committed.
    pub fn run_batch(
        &self,
        sheets: &[(MovementKind, &Path)],
        catalog: &Catalog,
        progress: &dyn ProgressReporter,
    ) -> Result<usize, ImportError> {
        match self.import(sheets, catalog, progress) {
            Ok(totals) => {
                for (&(kind, path), &total) in sheets.iter().zip(&totals) {
                    info!(kind = %kind, path = %path.display(), total, "import committed");
                    progress.on_task_complete(kind.label(), total);
                }
                Ok(totals.iter().sum())
            }
            Err(e) => {
                error!(sheets = sheets.len(), error = %e, "batch import failed");
                progress.on_error(&e);
                Err(e)
            }
        }
    }

    /// Movements committed per sheet
    fn import(
        &self,
        sheets: &[(MovementKind, &Path)],
        catalog: &Catalog,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<usize>, ImportError> {
        let tables = sheets
            .iter()
            .map(|&(kind, path)| {
                self.reader
                    .decode(path)
                    .map(|table| (kind, table))
                    .map_err(|e| ImportError::sheet(kind, e.into()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // A panic in another import cannot have committed anything.
        let _guard = self
            .ledger_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let ledger = Ledger::load(self.store.as_ref())?;
        let mut balances = RunningBalances::from_ledger(&ledger)?;

        let mut changes = ChangeSet::new();
        let mut totals = Vec::with_capacity(tables.len());
        for (kind, table) in &tables {
            let movements = self
                .validate(*kind, table, catalog, &mut balances, progress)
                .map_err(|e| ImportError::sheet(*kind, e))?;
            totals.push(movements.len());
            for movement in movements {
                changes.insert(movement.into());
            }
        }

        if !changes.is_empty() {
            self.store.commit(changes)?;
        }
        Ok(totals)
    }

    fn validate(
        &self,
        kind: MovementKind,
        table: &Table,
        catalog: &Catalog,
        balances: &mut RunningBalances,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<Movement>, ImportError> {
        let total = table.data_row_count();
        let every = self.config.progress_every.max(1);
        let parser = parser_for(kind);

        let movements = parse_table(parser.as_ref(), table, catalog, balances, |accepted| {
            if accepted % every == 0 {
                debug!(kind = %kind, accepted, total, "rows validated");
                progress.on_progress(&format!(
                    "Validated {} of {} {}",
                    accepted,
                    total,
                    kind.label()
                ));
            }
        })?;
        Ok(movements)
    }
}
