//! Runtime configuration for QC routines.

use crate::error::{QcError, QcResult};

/// Configuration applied when the module is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QcConfig {
    /// Number of worker threads in the kernel pool.
    pub worker_count: usize,
    /// Minimum number of cells before kernels fan out across workers.
    pub parallel_threshold: usize,
}

impl QcConfig {
    pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

    /// Build the thread pool kernels run inside.
    pub fn build_pool(&self) -> QcResult<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .thread_name(|i| format!("scaterrs-worker-{}", i))
            .build()
            .map_err(|e| QcError::invalid(format!("failed to build worker pool: {}", e)))
    }
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            parallel_threshold: Self::DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = QcConfig::default();
        assert!(cfg.worker_count >= 1);
        assert_eq!(cfg.parallel_threshold, QcConfig::DEFAULT_PARALLEL_THRESHOLD);
    }

    #[test]
    fn test_build_pool() {
        let cfg = QcConfig {
            worker_count: 2,
            ..QcConfig::default()
        };
        let pool = cfg.build_pool().unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
