//! Property-based tests for the expansion algebra
//!
//! Invariants over arbitrary axis shapes: output lengths, axis coverage,
//! and broadcast behavior.

use proptest::prelude::*;

use sweep_db::{Generator, Parameter, ParameterGroup, Value};

/// Arbitrary group: 1-4 axes, each an explicit list of 1-5 integers.
fn arb_axes() -> impl Strategy<Value = Vec<Vec<i64>>> {
    proptest::collection::vec(proptest::collection::vec(-100i64..100, 1..=5), 1..=4)
}

fn group_from(axes: &[Vec<i64>]) -> ParameterGroup {
    ParameterGroup::with_params(axes.iter().enumerate().map(|(i, values)| {
        Parameter::with_generator(
            format!("p{i}"),
            values[0],
            Generator::list(values.iter().copied().map(Value::Int)),
        )
    }))
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Outer product length is the product of per-axis lengths.
    #[test]
    fn prop_outer_length_is_product(axes in arb_axes()) {
        let group = group_from(&axes);
        let expected: usize = axes.iter().map(Vec::len).product();
        prop_assert_eq!(group.outer_product().len(), expected);
    }

    /// Every outer binding covers every axis name.
    #[test]
    fn prop_outer_bindings_cover_all_axes(axes in arb_axes()) {
        let group = group_from(&axes);
        for binding in group.outer_product() {
            prop_assert_eq!(binding.len(), axes.len());
            for i in 0..axes.len() {
                let key = format!("p{i}");
                prop_assert!(binding.contains_key(&key));
            }
        }
    }

    /// Every value in an outer binding comes from its own axis.
    #[test]
    fn prop_outer_values_drawn_from_own_axis(axes in arb_axes()) {
        let group = group_from(&axes);
        for binding in group.outer_product() {
            for (i, values) in axes.iter().enumerate() {
                let Some(&Value::Int(v)) = binding.get(&format!("p{i}")) else {
                    return Err(TestCaseError::fail("non-integer value"));
                };
                prop_assert!(values.contains(&v));
            }
        }
    }

    /// Zip truncates to the minimum length among multi-value axes, or
    /// fails when every axis is singular.
    #[test]
    fn prop_zip_length_is_min_of_multivalue_axes(axes in arb_axes()) {
        let group = group_from(&axes);
        let min_multi = axes.iter().map(Vec::len).filter(|&l| l > 1).min();
        match (group.zip(), min_multi) {
            (Ok(bindings), Some(expected)) => prop_assert_eq!(bindings.len(), expected),
            (Err(_), None) => {}
            (Ok(_), None) => return Err(TestCaseError::fail("zip succeeded with no multi-value axis")),
            (Err(e), Some(_)) => return Err(TestCaseError::fail(format!("zip failed: {e}"))),
        }
    }

    /// Length-1 axes are broadcast unchanged into every zip binding.
    #[test]
    fn prop_zip_broadcasts_singular_axes(axes in arb_axes()) {
        let group = group_from(&axes);
        if let Ok(bindings) = group.zip() {
            for binding in &bindings {
                for (i, values) in axes.iter().enumerate() {
                    if values.len() == 1 {
                        prop_assert_eq!(&binding[&format!("p{i}")], &Value::Int(values[0]));
                    }
                }
            }
        }
    }

    /// Single always yields exactly one binding of constant values,
    /// regardless of generators.
    #[test]
    fn prop_single_yields_constants(axes in arb_axes()) {
        let group = group_from(&axes);
        let bindings = group.single();
        prop_assert_eq!(bindings.len(), 1);
        for (i, values) in axes.iter().enumerate() {
            prop_assert_eq!(&bindings[0][&format!("p{i}")], &Value::Int(values[0]));
        }
    }
}
