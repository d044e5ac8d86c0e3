//! # Sweep-DB: parameter-sweep execution engine
//!
//! Sweep-db expands declarative parameter ranges into concrete argument
//! sets, executes a pure function once per set, and persists every result
//! in an embedded, append-only, key-addressable store next to the
//! parameters that produced it. Chained calculations form a pipeline in
//! which each stage's inputs are looked up from the previous stage's
//! stored outputs by exact parameter match.
//!
//! ## Core pieces
//!
//! - [`Parameter`] / [`ParameterGroup`]: named axes with value generators
//!   and the `single` / `zip` / `outer` expansion strategies
//! - [`ResultStore`]: one container file per pipeline, addressed by
//!   (stage, run), append-only
//! - [`Calculation`]: one function bound to a store stage
//! - [`Simulation`]: the linear pipeline with cross-stage result lookup
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use sweep_db::{
//!     Calculation, ExpansionStrategy, FieldValue, Fields, Generator, Parameter,
//!     ParameterGroup, ResultStore, RunOptions, Value,
//! };
//!
//! # fn main() -> sweep_db::Result<()> {
//! let group = ParameterGroup::with_params([
//!     Parameter::with_generator("a", 2i64, Generator::linspace(1.0, 6.0, 10)),
//!     Parameter::new("b", 30i64),
//! ])?;
//!
//! let store = Arc::new(Mutex::new(ResultStore::new("sweep.json")));
//! store.lock().unwrap().prepare(true)?;
//!
//! let mut calc = Calculation::new(
//!     |kwargs: &Fields| {
//!         let a = kwargs["a"].as_scalar().and_then(Value::as_f64).unwrap_or(0.0);
//!         let b = kwargs["b"].as_scalar().and_then(Value::as_f64).unwrap_or(0.0);
//!         let mut out = Fields::new();
//!         out.insert("sum".to_string(), FieldValue::from(a + b));
//!         Ok(out)
//!     },
//!     ["a", "b"],
//!     0,
//!     Arc::clone(&store),
//! );
//! calc.bind(group)?;
//!
//! let table = calc.run(ExpansionStrategy::Outer, &RunOptions::default())?;
//! assert_eq!(table.len(), 10);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod calculation;
pub mod error;
pub mod params;
pub mod simulation;
pub mod store;
pub mod table;
pub mod value;

pub use calculation::{Calculation, RunOptions, SweepFn};
pub use error::{Error, Result};
pub use params::{ExpansionStrategy, Generator, Parameter, ParameterGroup};
pub use simulation::{format_duration, Simulation, SimulationResult};
pub use store::{ResultStore, RunEntry};
pub use table::{SummaryRow, SummaryTable};
pub use value::{binding_to_fields, fields_to_binding, Binding, FieldValue, Fields, Value};
