//! Import configuration

use tracing::warn;

/// Configuration for spreadsheet imports
///
/// Controls how often progress is reported, how many worker threads the
/// background scheduler may use, and the delimiter of CSV sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportConfig {
    /// Accepted rows between two progress messages
    pub progress_every: usize,
    /// Worker threads of the background runtime
    pub worker_threads: usize,
    /// Field delimiter of CSV sources
    pub delimiter: u8,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            progress_every: 100,
            worker_threads: num_cpus::get(),
            delimiter: b',',
        }
    }
}

impl ImportConfig {
    /// Create an ImportConfig with custom values
    ///
    /// Zero counts and a NUL delimiter fall back to the defaults with a
    /// warning.
    pub fn new(progress_every: usize, worker_threads: usize, delimiter: u8) -> Self {
        let default = Self::default();

        let progress_every = if progress_every == 0 {
            warn!(
                progress_every,
                default = default.progress_every,
                "invalid progress interval, using default"
            );
            default.progress_every
        } else {
            progress_every
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                worker_threads,
                default = default.worker_threads,
                "invalid worker thread count, using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        let delimiter = if delimiter == 0 {
            warn!("invalid delimiter, using ','");
            default.delimiter
        } else {
            delimiter
        };

        Self {
            progress_every,
            worker_threads,
            delimiter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::all_custom(50, 4, b';', 50, 4, b';')]
    #[case::zero_progress(0, 4, b',', 100, 4, b',')]
    #[case::zero_threads(10, 0, b',', 10, num_cpus::get(), b',')]
    #[case::nul_delimiter(10, 2, 0, 10, 2, b',')]
    fn test_import_config_new(
        #[case] progress_every: usize,
        #[case] worker_threads: usize,
        #[case] delimiter: u8,
        #[case] expected_progress: usize,
        #[case] expected_threads: usize,
        #[case] expected_delimiter: u8,
    ) {
        let config = ImportConfig::new(progress_every, worker_threads, delimiter);
        assert_eq!(config.progress_every, expected_progress);
        assert_eq!(config.worker_threads, expected_threads);
        assert_eq!(config.delimiter, expected_delimiter);
    }
}
