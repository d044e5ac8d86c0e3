//! Parameter axes and expansion
//!
//! A [`Parameter`] is one named axis of a sweep: a constant value plus an
//! optional [`Generator`] producing a sequence of concrete values. A
//! [`ParameterGroup`] is an ordered set of axes and owns the three
//! expansion strategies that turn generators into flat name-to-value
//! bindings:
//!
//! - `single`: one binding of constant values, generators ignored
//! - `outer`: full Cartesian product in axis-insertion order
//! - `zip`: parallel iteration truncated to the shortest multi-value axis,
//!   with length-1 axes broadcast as constants
//!
//! Expansion is pure: a group can be expanded repeatedly and never mutates.

mod group;
mod parameter;

pub use group::{ExpansionStrategy, ParameterGroup};
pub use parameter::{Generator, Parameter};
