pub mod fixtures;
pub mod pipeline;
pub mod types;

use modeling_ops::KernelBundle;
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::types::{EngineConfig, EngineError, FixtureDef, FixtureOutput};

pub use pipeline::build_fixture;

/// Builds fixtures from their definitions.
///
/// A single fixture runs sequentially on one kernel. Independent fixtures
/// run in parallel, each on a kernel of its own.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub config: EngineConfig,
}

/// A finished fixture together with the kernel that owns its solid.
pub type Built<K> = (FixtureOutput, K);

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Build one fixture on `kb`.
    pub fn build(
        &self,
        kb: &mut dyn KernelBundle,
        def: &FixtureDef,
    ) -> Result<FixtureOutput, EngineError> {
        pipeline::build_fixture(kb, def, &self.config)
    }

    /// Build every fixture in parallel.
    ///
    /// `factory` creates a fresh kernel on the worker thread for each
    /// fixture. Results come back in the order of `defs`; one fixture
    /// failing does not stop the others.
    #[instrument(skip_all, fields(fixtures = defs.len()))]
    pub fn build_all<K, F>(
        &self,
        defs: &[FixtureDef],
        factory: F,
    ) -> Result<Vec<Result<Built<K>, EngineError>>, EngineError>
    where
        K: KernelBundle + Send,
        F: Fn() -> K + Sync,
    {
        let run = || -> Vec<Result<Built<K>, EngineError>> {
            defs.par_iter()
                .map(|def| {
                    let mut kernel = factory();
                    let output = self.build(&mut kernel, def)?;
                    Ok((output, kernel))
                })
                .collect()
        };

        let results = match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| EngineError::Config {
                        reason: format!("cannot start {threads} worker threads: {e}"),
                    })?;
                pool.install(run)
            }
            None => run(),
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(built = results.len() - failed, failed, "batch finished");
        Ok(results)
    }
}
