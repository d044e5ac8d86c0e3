//! Ordered parameter group and expansion strategies

use serde::{Deserialize, Serialize};

use crate::value::Binding;
use crate::{Error, Result};

use super::Parameter;

/// How a [`ParameterGroup`] turns axis generators into bindings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpansionStrategy {
    /// One binding of constant values; generators are ignored
    #[default]
    Single,
    /// Parallel iteration truncated to the shortest multi-value axis
    Zip,
    /// Full Cartesian product across all axes
    Outer,
}

impl ExpansionStrategy {
    /// Resolve a strategy from its name.
    ///
    /// Unrecognized names fall back to [`Single`](Self::Single). This is a
    /// deliberate permissive default, not an error: callers that pass no
    /// strategy (or a stale one) get the plain constant-value run.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "zip" => Self::Zip,
            "outer" => Self::Outer,
            _ => Self::Single,
        }
    }
}

/// Ordered set of parameter axes with unique names.
///
/// Built incrementally via [`add`](Self::add); expansion never mutates the
/// group, so the same group can drive any number of runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterGroup {
    params: Vec<Parameter>,
}

impl ParameterGroup {
    /// Empty group.
    #[must_use]
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Group built from an iterator of axes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] on a duplicate axis name.
    pub fn with_params<I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = Parameter>,
    {
        let mut group = Self::new();
        for param in params {
            group.add(param)?;
        }
        Ok(group)
    }

    /// Append one axis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if an axis with the same name is
    /// already present. Duplicate names would collapse silently when a
    /// binding dictionary is built, so they are rejected up front.
    pub fn add(&mut self, param: Parameter) -> Result<()> {
        if self.params.iter().any(|p| p.name() == param.name()) {
            return Err(Error::Configuration(format!(
                "duplicate parameter name '{}'",
                param.name()
            )));
        }
        self.params.push(param);
        Ok(())
    }

    /// Axis names in insertion order.
    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(Parameter::name).collect()
    }

    /// Number of axes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the group has no axes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Expand with the given strategy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Expansion`] from [`zip`](Self::zip); the other
    /// strategies cannot fail.
    pub fn expand(&self, strategy: ExpansionStrategy) -> Result<Vec<Binding>> {
        match strategy {
            ExpansionStrategy::Single => Ok(self.single()),
            ExpansionStrategy::Zip => self.zip(),
            ExpansionStrategy::Outer => Ok(self.outer_product()),
        }
    }

    /// One binding carrying each axis's constant value. Generators are
    /// ignored entirely.
    #[must_use]
    pub fn single(&self) -> Vec<Binding> {
        let binding: Binding = self
            .params
            .iter()
            .map(|p| (p.name().to_string(), p.value().clone()))
            .collect();
        vec![binding]
    }

    /// Cartesian product across axes in insertion order.
    ///
    /// Yields one binding per cross-combination; the last axis varies
    /// fastest. Output length is the product of the per-axis sequence
    /// lengths, so any axis expanding to no values empties the product.
    #[must_use]
    pub fn outer_product(&self) -> Vec<Binding> {
        let sequences: Vec<Vec<_>> = self.params.iter().map(Parameter::expand).collect();
        let total: usize = sequences.iter().map(Vec::len).product();
        if total == 0 && !sequences.is_empty() {
            return Vec::new();
        }

        let mut bindings = Vec::with_capacity(total);
        let mut indices = vec![0usize; sequences.len()];
        loop {
            let binding: Binding = self
                .params
                .iter()
                .zip(sequences.iter().zip(&indices))
                .map(|(p, (seq, &i))| (p.name().to_string(), seq[i].clone()))
                .collect();
            bindings.push(binding);

            // Odometer increment, last axis fastest.
            let mut pos = sequences.len();
            loop {
                if pos == 0 {
                    return bindings;
                }
                pos -= 1;
                indices[pos] += 1;
                if indices[pos] < sequences[pos].len() {
                    break;
                }
                indices[pos] = 0;
            }
        }
    }

    /// Parallel iteration over multi-value axes, truncated to the shortest
    /// of them. Length-1 axes are broadcast as constants.
    ///
    /// When two multi-value axes disagree on length, the longer one is
    /// silently truncated. That truncation is the designed-in policy of
    /// this strategy, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Expansion`] if no axis expands to more than one
    /// value (there is no well-defined zip length), or if any axis expands
    /// to no values at all.
    pub fn zip(&self) -> Result<Vec<Binding>> {
        let sequences: Vec<Vec<_>> = self.params.iter().map(Parameter::expand).collect();

        if let Some(pos) = sequences.iter().position(Vec::is_empty) {
            return Err(Error::Expansion(format!(
                "cannot zip: axis '{}' expands to no values",
                self.params[pos].name()
            )));
        }

        let min_len = sequences
            .iter()
            .map(Vec::len)
            .filter(|&len| len > 1)
            .min()
            .ok_or_else(|| {
                Error::Expansion(
                    "cannot zip: no axis expands to more than one value".to_string(),
                )
            })?;

        let bindings = (0..min_len)
            .map(|i| {
                self.params
                    .iter()
                    .zip(&sequences)
                    .map(|(p, seq)| {
                        let value = if seq.len() == 1 { &seq[0] } else { &seq[i] };
                        (p.name().to_string(), value.clone())
                    })
                    .collect()
            })
            .collect();
        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Generator;
    use crate::value::Value;

    fn abc_group() -> ParameterGroup {
        ParameterGroup::with_params([
            Parameter::with_generator("a", 2i64, Generator::linspace(1.0, 6.0, 10)),
            Parameter::new("b", 30i64),
            Parameter::with_generator("c", 2i64, Generator::arange(1, 10, 1).unwrap()),
        ])
        .unwrap()
    }

    #[test]
    fn test_param_names_in_order() {
        assert_eq!(abc_group().param_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut group = ParameterGroup::new();
        group.add(Parameter::new("a", 1i64)).unwrap();
        let err = group.add(Parameter::new("a", 2i64)).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_single_ignores_generators() {
        let bindings = abc_group().single();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0]["a"], Value::Int(2));
        assert_eq!(bindings[0]["b"], Value::Int(30));
        assert_eq!(bindings[0]["c"], Value::Int(2));
    }

    #[test]
    fn test_outer_product_length_and_order() {
        let bindings = abc_group().outer_product();
        assert_eq!(bindings.len(), 90);

        // Last axis varies fastest: first two bindings share 'a', differ in 'c'.
        assert_eq!(bindings[0]["a"], bindings[1]["a"]);
        assert_eq!(bindings[0]["c"], Value::Int(1));
        assert_eq!(bindings[1]["c"], Value::Int(2));
        // Constant axis appears in every binding.
        assert!(bindings.iter().all(|b| b["b"] == Value::Int(30)));
    }

    #[test]
    fn test_zip_truncates_and_broadcasts() {
        let bindings = abc_group().zip().unwrap();
        // a has 10 values, c has 9: truncated to 9.
        assert_eq!(bindings.len(), 9);
        let a = Generator::linspace(1.0, 6.0, 10).expand();
        for (i, binding) in bindings.iter().enumerate() {
            assert_eq!(binding["a"], a[i]);
            assert_eq!(binding["b"], Value::Int(30));
            assert_eq!(binding["c"], Value::Int(i as i64 + 1));
        }
    }

    #[test]
    fn test_zip_all_constant_fails() {
        let group = ParameterGroup::with_params([
            Parameter::new("a", 1i64),
            Parameter::new("b", 2i64),
        ])
        .unwrap();
        let err = group.zip().unwrap_err();
        assert!(matches!(err, Error::Expansion(_)));
    }

    #[test]
    fn test_zip_empty_axis_fails() {
        let group = ParameterGroup::with_params([
            Parameter::with_generator("a", 0i64, Generator::linspace(0.0, 1.0, 5)),
            Parameter::with_generator("b", 0i64, Generator::list(Vec::<Value>::new())),
        ])
        .unwrap();
        assert!(group.zip().is_err());
    }

    #[test]
    fn test_outer_with_empty_axis_is_empty() {
        let group = ParameterGroup::with_params([
            Parameter::with_generator("a", 0i64, Generator::linspace(0.0, 1.0, 5)),
            Parameter::with_generator("b", 0i64, Generator::list(Vec::<Value>::new())),
        ])
        .unwrap();
        assert!(group.outer_product().is_empty());
    }

    #[test]
    fn test_strategy_from_name_permissive_default() {
        assert_eq!(ExpansionStrategy::from_name("zip"), ExpansionStrategy::Zip);
        assert_eq!(
            ExpansionStrategy::from_name("outer"),
            ExpansionStrategy::Outer
        );
        assert_eq!(
            ExpansionStrategy::from_name("anything-else"),
            ExpansionStrategy::Single
        );
    }

    #[test]
    fn test_expand_dispatch() {
        let group = abc_group();
        assert_eq!(group.expand(ExpansionStrategy::Single).unwrap().len(), 1);
        assert_eq!(group.expand(ExpansionStrategy::Zip).unwrap().len(), 9);
        assert_eq!(group.expand(ExpansionStrategy::Outer).unwrap().len(), 90);
    }
}
