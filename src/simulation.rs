//! Pipeline of calculations over one shared store
//!
//! A [`Simulation`] chains calculations into a fixed linear sequence of
//! stages. Stage 0 runs its function directly on the declared bindings.
//! Every later stage runs a synthesized wrapper instead: the wrapper takes
//! the stage's own binding, looks up the predecessor stage's run with the
//! exactly matching binding, and feeds the retrieved fields to the true
//! function as keyword arguments. A binding with no predecessor match is
//! fatal; nothing is substituted.
//!
//! Stages execute strictly in order, because stage `i` reads what stage
//! `i-1` wrote. Parallel function evaluation is force-disabled for any
//! stage that performs predecessor lookups, so the shared store never sees
//! concurrent readers during a stage's writes.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::calculation::{lock_store, Calculation, RunOptions};
use crate::params::{ExpansionStrategy, ParameterGroup};
use crate::store::ResultStore;
use crate::table::{SummaryRow, SummaryTable};
use crate::value::{fields_to_binding, Fields};
use crate::{Error, Result};

/// Outcome of a completed pipeline run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    table: SummaryTable,
    duration: Duration,
}

impl SimulationResult {
    /// Concatenated per-stage summary rows, each tagged with its stage.
    #[must_use]
    pub const fn table(&self) -> &SummaryTable {
        &self.table
    }

    /// Wall-clock duration of the whole run.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

struct Stage {
    calc: Calculation,
    depends_on_predecessor: bool,
}

/// Ordered pipeline of calculations bound to successive store stages.
pub struct Simulation {
    stages: Vec<Stage>,
    store: Arc<Mutex<ResultStore>>,
    result: Option<SimulationResult>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("stages", &self.stages.len())
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Assemble a pipeline from calculations and their parameter groups.
    ///
    /// Calculations must target stages `0..n` in order, all on `store`.
    /// `groups` holds one parameter group per stage, or a single group
    /// that is broadcast to every stage.
    ///
    /// Stage 0 is bound as declared (its required arguments are validated
    /// against its group). Every later calculation is replaced by a
    /// lookup wrapper and bound without argument validation, since its
    /// arguments come from the predecessor's stored fields rather than
    /// from the group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on an empty pipeline, stage
    /// indices out of order, a mismatched group count, or a calculation
    /// not sharing `store`; [`Error::Validation`] if stage 0's required
    /// arguments are not covered by its group.
    pub fn new(
        store: Arc<Mutex<ResultStore>>,
        calculations: Vec<Calculation>,
        groups: Vec<ParameterGroup>,
    ) -> Result<Self> {
        if calculations.is_empty() {
            return Err(Error::Configuration(
                "pipeline needs at least one calculation".to_string(),
            ));
        }
        for (i, calc) in calculations.iter().enumerate() {
            if calc.stage() != i {
                return Err(Error::Configuration(format!(
                    "calculation at position {i} targets stage {}, stages must be 0..n in order",
                    calc.stage()
                )));
            }
            if !Arc::ptr_eq(&calc.store_handle(), &store) {
                return Err(Error::Configuration(format!(
                    "calculation for stage {i} does not share the pipeline store"
                )));
            }
        }

        let n_stages = calculations.len();
        let groups: Vec<ParameterGroup> = if groups.len() == 1 {
            std::iter::repeat(groups[0].clone()).take(n_stages).collect()
        } else if groups.len() == n_stages {
            groups
        } else {
            return Err(Error::Configuration(format!(
                "expected 1 or {n_stages} parameter groups, got {}",
                groups.len()
            )));
        };

        let mut stages = Vec::with_capacity(n_stages);
        for (i, (calc, group)) in calculations.into_iter().zip(groups).enumerate() {
            let stage = if i == 0 {
                let mut calc = calc;
                calc.bind(group)?;
                Stage {
                    calc,
                    depends_on_predecessor: false,
                }
            } else {
                let mut wrapped = Self::wrap_stage(&store, &calc, i);
                wrapped.bind(group)?;
                Stage {
                    calc: wrapped,
                    depends_on_predecessor: true,
                }
            };
            stages.push(stage);
        }

        Ok(Self {
            stages,
            store,
            result: None,
        })
    }

    /// Build the lookup wrapper for stage `stage`: resolve the binding
    /// against stage `stage - 1`, then call the true function on the
    /// retrieved fields.
    fn wrap_stage(
        store: &Arc<Mutex<ResultStore>>,
        calc: &Calculation,
        stage: usize,
    ) -> Calculation {
        let predecessor = stage - 1;
        let lookup_store = Arc::clone(store);
        let inner = calc.func_handle();
        let func = move |kwargs: &Fields| -> Result<Fields> {
            let binding = fields_to_binding(kwargs)?;
            let fields = {
                let store = lock_store(&lookup_store)?;
                store
                    .lookup(predecessor, &binding)
                    .cloned()
                    .ok_or_else(|| ResultStore::missing_dependency(predecessor, &binding))?
            };
            inner.as_ref()(&fields)
        };
        let no_required: [&str; 0] = [];
        Calculation::new(func, no_required, stage, Arc::clone(store))
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Whether `stage` performs predecessor lookups (and therefore always
    /// evaluates sequentially).
    #[must_use]
    pub fn stage_depends_on_predecessor(&self, stage: usize) -> bool {
        self.stages
            .get(stage)
            .is_some_and(|s| s.depends_on_predecessor)
    }

    /// Run every stage in order against a freshly overwritten store.
    ///
    /// `options.parallel` applies to stages without predecessor lookups
    /// only; dependent stages run sequentially regardless.
    ///
    /// # Errors
    ///
    /// Propagates the first stage failure unchanged. Stages already
    /// completed remain fully written in the store.
    pub fn run(
        &mut self,
        strategy: ExpansionStrategy,
        options: &RunOptions,
    ) -> Result<&SimulationResult> {
        lock_store(&self.store)?.prepare(true)?;

        let start = Instant::now();
        let mut table = SummaryTable::new();
        for (i, stage) in self.stages.iter().enumerate() {
            let mut stage_options = options.clone();
            if stage.depends_on_predecessor && stage_options.parallel {
                tracing::debug!(
                    stage = i,
                    "stage performs predecessor lookups, disabling parallel map"
                );
                stage_options.parallel = false;
            }
            tracing::info!(stage = i, "running pipeline stage");
            let mut stage_table = stage.calc.run(strategy, &stage_options)?;
            stage_table.tag_stage(i);
            table.concat(stage_table);
        }
        let duration = start.elapsed();
        tracing::info!(
            rows = table.len(),
            duration = %format_duration(duration.as_secs_f64()),
            "pipeline complete"
        );

        Ok(self.result.insert(SimulationResult { table, duration }))
    }

    /// Result of the last completed run, if any.
    #[must_use]
    pub const fn result(&self) -> Option<&SimulationResult> {
        self.result.as_ref()
    }

    /// One-line description of the last run: row count, stage count,
    /// bindings per stage and formatted duration. `None` before any run.
    #[must_use]
    pub fn describe_result(&self) -> Option<String> {
        let result = self.result.as_ref()?;
        Some(format!(
            "{} rows across {} stages, {} bindings per stage, completed in {}",
            result.table.len(),
            result.table.stage_count(),
            result.table.runs_in_first_stage(),
            format_duration(result.duration.as_secs_f64())
        ))
    }

    /// Rebuild a table for one stage from the store, joining each run's
    /// binding with its result fields as columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] on the first non-scalar field; array
    /// fields have no single-cell representation in this retrieval path.
    pub fn stage_table(&self, stage: usize) -> Result<SummaryTable> {
        let store = lock_store(&self.store)?;
        let mut table = SummaryTable::new();
        for (run, entry) in store.iterate_stage(stage) {
            let mut columns = entry.params().clone();
            for (name, field) in entry.fields() {
                let scalar = field.as_scalar().ok_or_else(|| Error::Shape {
                    stage,
                    run,
                    field: name.clone(),
                })?;
                columns.insert(name.clone(), scalar.clone());
            }
            table.push(SummaryRow {
                stage_index: Some(stage),
                run_index: run,
                columns,
            });
        }
        Ok(table)
    }
}

/// Format a duration in seconds for reporting: minutes at or above one
/// minute, milliseconds below half a second, seconds otherwise, always
/// with two decimals.
#[must_use]
pub fn format_duration(secs: f64) -> String {
    if secs >= 60.0 {
        format!("{:.2} min", secs / 60.0)
    } else if secs < 0.5 {
        format!("{:.2} ms", secs * 1000.0)
    } else {
        format!("{secs:.2} s")
    }
}
