//! Single parameter axis and its value generators

use serde::{Deserialize, Serialize};

use crate::value::Value;
use crate::{Error, Result};

/// Rule producing the value sequence of one axis.
///
/// Generators are tagged variants rather than dynamically dispatched names;
/// an unknown kind is rejected when the axis is constructed, never at
/// expansion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Generator {
    /// `count` evenly spaced floats from `start` to `stop`, both inclusive
    Linspace {
        /// First value of the range
        start: f64,
        /// Last value of the range (inclusive)
        stop: f64,
        /// Number of points
        count: usize,
    },
    /// Integer stride range `[start, stop)` with step `step`
    Arange {
        /// First value of the range
        start: i64,
        /// End of the range (exclusive)
        stop: i64,
        /// Stride between values, non-zero
        step: i64,
    },
    /// Explicit list of values, used verbatim
    List(Vec<Value>),
}

impl Generator {
    /// Evenly spaced float range, endpoints inclusive.
    #[must_use]
    pub const fn linspace(start: f64, stop: f64, count: usize) -> Self {
        Self::Linspace { start, stop, count }
    }

    /// Integer stride range over `[start, stop)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `step` is zero.
    pub fn arange(start: i64, stop: i64, step: i64) -> Result<Self> {
        if step == 0 {
            return Err(Error::Configuration(
                "arange step must be non-zero".to_string(),
            ));
        }
        Ok(Self::Arange { start, stop, step })
    }

    /// Explicit list of values.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Resolve a generator from its kind name and argument list.
    ///
    /// Valid kinds are `linspace`, `arange` and `list`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unknown kind or arguments
    /// that do not fit the kind.
    pub fn from_name(kind: &str, args: &[Value]) -> Result<Self> {
        match kind {
            "linspace" => {
                let (start, stop, count) = three_args(kind, args)?;
                let start = numeric_arg(kind, "start", &start)?;
                let stop = numeric_arg(kind, "stop", &stop)?;
                let count = count_arg(kind, &count)?;
                Ok(Self::linspace(start, stop, count))
            }
            "arange" => {
                let (start, stop, step) = three_args(kind, args)?;
                let start = integer_arg(kind, "start", &start)?;
                let stop = integer_arg(kind, "stop", &stop)?;
                let step = integer_arg(kind, "step", &step)?;
                Self::arange(start, stop, step)
            }
            "list" => Ok(Self::List(args.to_vec())),
            other => Err(Error::Configuration(format!(
                "unknown generator kind '{other}', valid kinds: linspace, arange, list"
            ))),
        }
    }

    /// Materialize the value sequence.
    #[must_use]
    pub fn expand(&self) -> Vec<Value> {
        match self {
            Self::Linspace { start, stop, count } => match count {
                0 => Vec::new(),
                1 => vec![Value::Float(*start)],
                n => {
                    let step = (stop - start) / (*n as f64 - 1.0);
                    (0..*n)
                        .map(|i| Value::Float(start + step * i as f64))
                        .collect()
                }
            },
            Self::Arange { start, stop, step } => {
                let mut values = Vec::new();
                let mut v = *start;
                while (*step > 0 && v < *stop) || (*step < 0 && v > *stop) {
                    values.push(Value::Int(v));
                    // The next stride past i64 range cannot be < stop either.
                    match v.checked_add(*step) {
                        Some(next) => v = next,
                        None => break,
                    }
                }
                values
            }
            Self::List(values) => values.clone(),
        }
    }

    /// Number of values [`expand`](Self::expand) will yield.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Linspace { count, .. } => *count,
            Self::Arange { start, stop, step } => {
                // Widen: the span of two i64 bounds can itself overflow i64.
                let span = i128::from(*stop) - i128::from(*start);
                if span.signum() != i128::from(step.signum()) {
                    0
                } else {
                    span.unsigned_abs()
                        .div_ceil(u128::from(step.unsigned_abs())) as usize
                }
            }
            Self::List(values) => values.len(),
        }
    }

    /// Whether the generator yields no values at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn three_args(kind: &str, args: &[Value]) -> Result<(Value, Value, Value)> {
    match args {
        [a, b, c] => Ok((a.clone(), b.clone(), c.clone())),
        _ => Err(Error::Configuration(format!(
            "generator '{kind}' takes exactly 3 arguments, got {}",
            args.len()
        ))),
    }
}

fn numeric_arg(kind: &str, name: &str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        Error::Configuration(format!("generator '{kind}' argument '{name}' must be numeric"))
    })
}

fn integer_arg(kind: &str, name: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Int(v) => Ok(*v),
        _ => Err(Error::Configuration(format!(
            "generator '{kind}' argument '{name}' must be an integer"
        ))),
    }
}

fn count_arg(kind: &str, value: &Value) -> Result<usize> {
    match value {
        Value::Int(v) if *v >= 0 => Ok(*v as usize),
        _ => Err(Error::Configuration(format!(
            "generator '{kind}' argument 'count' must be a non-negative integer"
        ))),
    }
}

/// One named parameter axis: a constant value plus an optional generator.
///
/// Immutable after construction. Without a generator the axis expands to
/// exactly its constant value regardless of strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    value: Value,
    generator: Option<Generator>,
}

impl Parameter {
    /// Constant axis without a generator.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            generator: None,
        }
    }

    /// Axis with an explicit generator.
    pub fn with_generator(
        name: impl Into<String>,
        value: impl Into<Value>,
        generator: Generator,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            generator: Some(generator),
        }
    }

    /// Axis with a generator resolved by kind name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the kind is unknown or its
    /// arguments are malformed.
    pub fn generated(
        name: impl Into<String>,
        value: impl Into<Value>,
        kind: &str,
        args: &[Value],
    ) -> Result<Self> {
        Ok(Self::with_generator(
            name,
            value,
            Generator::from_name(kind, args)?,
        ))
    }

    /// Axis name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constant value, used by the `single` strategy and as the broadcast
    /// fallback.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// The generator, if any.
    #[must_use]
    pub const fn generator(&self) -> Option<&Generator> {
        self.generator.as_ref()
    }

    /// Value sequence of this axis: the generator's expansion, or the
    /// constant value alone.
    #[must_use]
    pub fn expand(&self) -> Vec<Value> {
        match &self.generator {
            Some(generator) => generator.expand(),
            None => vec![self.value.clone()],
        }
    }

    /// Length of [`expand`](Self::expand) without materializing it.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generator.as_ref().map_or(1, Generator::len)
    }

    /// Whether the axis expands to no values (only possible with an empty
    /// generator).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
