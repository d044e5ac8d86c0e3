//! Calculation: one sweep function bound to a store stage
//!
//! A [`Calculation`] wraps a pure function of keyword arguments, validates
//! it against a [`ParameterGroup`], expands the group into bindings,
//! invokes the function once per binding and persists every result through
//! the shared [`ResultStore`].
//!
//! Function invocation may run on a rayon worker pool (`parallel` feature);
//! store writes always happen afterwards, serialized on the calling thread.
//! A failing function call aborts the whole run before anything is written
//! for that stage (fail-fast, no partial writes, no retries).

use std::sync::{Arc, Mutex};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::params::{ExpansionStrategy, ParameterGroup};
use crate::store::ResultStore;
use crate::table::{SummaryRow, SummaryTable};
use crate::value::{binding_to_fields, Binding, Fields};
use crate::{Error, Result};

/// A sweep function: keyword arguments in, named result fields out.
pub type SweepFn = dyn Fn(&Fields) -> Result<Fields> + Send + Sync;

/// Execution options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Evaluate bindings on a worker pool instead of sequentially
    pub parallel: bool,
    /// Worker count for the pool; ignored when running sequentially
    pub n_jobs: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            n_jobs: 4,
        }
    }
}

impl RunOptions {
    /// Parallel execution with `n_jobs` workers.
    #[must_use]
    pub const fn parallel(n_jobs: usize) -> Self {
        Self {
            parallel: true,
            n_jobs,
        }
    }
}

/// One sweep function bound to a stage of the result store.
pub struct Calculation {
    func: Arc<SweepFn>,
    required: Vec<String>,
    stage: usize,
    store: Arc<Mutex<ResultStore>>,
    params: Option<ParameterGroup>,
}

impl Calculation {
    /// Wrap `func` with its required argument names, targeting `stage` of
    /// `store`.
    ///
    /// `required` lists the argument names the function consumes; binding a
    /// parameter group later checks that every one of them is covered. An
    /// empty list skips that check entirely, for functions whose arguments
    /// are synthesized at call time rather than drawn from the group.
    pub fn new<F, I, S>(func: F, required: I, stage: usize, store: Arc<Mutex<ResultStore>>) -> Self
    where
        F: Fn(&Fields) -> Result<Fields> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            func: Arc::new(func),
            required: required.into_iter().map(Into::into).collect(),
            stage,
            store,
            params: None,
        }
    }

    /// Bind a parameter group, validating coverage of the required
    /// argument names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the missing arguments. The
    /// group may declare extra axes; those flow through as metadata only.
    pub fn bind(&mut self, params: ParameterGroup) -> Result<()> {
        if !self.required.is_empty() {
            let names = params.param_names();
            let missing: Vec<&str> = self
                .required
                .iter()
                .map(String::as_str)
                .filter(|r| !names.contains(r))
                .collect();
            if !missing.is_empty() {
                return Err(Error::Validation(format!(
                    "parameter group is missing required arguments: {}",
                    missing.join(", ")
                )));
            }
        }
        self.params = Some(params);
        Ok(())
    }

    /// Stage index this calculation writes to.
    #[must_use]
    pub const fn stage(&self) -> usize {
        self.stage
    }

    /// Declared required argument names.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Shared handle on the wrapped function, for pipeline wrapping.
    pub(crate) fn func_handle(&self) -> Arc<SweepFn> {
        Arc::clone(&self.func)
    }

    /// Shared handle on the store.
    pub(crate) fn store_handle(&self) -> Arc<Mutex<ResultStore>> {
        Arc::clone(&self.store)
    }

    /// Expand the bound group, evaluate every binding, persist each result
    /// as one run and return the summary table (binding columns plus
    /// `run_index`).
    ///
    /// Run indices are assigned densely from 0 in expansion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if no group is bound, expansion
    /// errors from the group, the first error of the wrapped function
    /// (fail-fast, nothing is written for this stage), or store errors
    /// from the writes.
    pub fn run(&self, strategy: ExpansionStrategy, options: &RunOptions) -> Result<SummaryTable> {
        let params = self.params.as_ref().ok_or_else(|| {
            Error::Validation("no parameter group bound to calculation".to_string())
        })?;
        let bindings = params.expand(strategy)?;
        tracing::info!(
            stage = self.stage,
            bindings = bindings.len(),
            parallel = options.parallel,
            "running calculation"
        );

        let results = self.evaluate(&bindings, options)?;

        let mut store = lock_store(&self.store)?;
        let mut table = SummaryTable::new();
        for (run, (binding, fields)) in bindings.into_iter().zip(results).enumerate() {
            store.write_run(self.stage, run, binding.clone(), fields)?;
            table.push(SummaryRow {
                stage_index: None,
                run_index: run,
                columns: binding,
            });
        }
        Ok(table)
    }

    /// Invoke the function once per binding. Parallel when requested and
    /// available; an unavailable worker pool degrades to the sequential
    /// map with a warning, never an error.
    fn evaluate(&self, bindings: &[Binding], options: &RunOptions) -> Result<Vec<Fields>> {
        let inputs: Vec<Fields> = bindings.iter().map(binding_to_fields).collect();

        #[cfg(feature = "parallel")]
        if options.parallel {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(options.n_jobs)
                .build()
            {
                Ok(pool) => {
                    let func = self.func.as_ref();
                    return pool.install(|| {
                        inputs.par_iter().map(|kwargs| func(kwargs)).collect()
                    });
                }
                Err(err) => {
                    tracing::warn!(%err, "worker pool unavailable, falling back to sequential map");
                }
            }
        }

        #[cfg(not(feature = "parallel"))]
        if options.parallel {
            tracing::debug!("parallel feature disabled, running sequentially");
        }

        inputs.iter().map(|kwargs| self.func.as_ref()(kwargs)).collect()
    }
}

pub(crate) fn lock_store(
    store: &Arc<Mutex<ResultStore>>,
) -> Result<std::sync::MutexGuard<'_, ResultStore>> {
    store
        .lock()
        .map_err(|_| Error::Store("result store lock poisoned".to_string()))
}
