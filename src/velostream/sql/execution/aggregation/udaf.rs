//! The statically typed aggregate function contract.
//!
//! Every built-in aggregate is a [`Udaf`]: a stateless value that turns
//! `(input, previous state)` into a new state, merges two partial states, and
//! projects a state into the emitted result. State is never mutated in place;
//! the owning engine stores whatever state the last call returned.

use crate::velostream::sql::execution::types::GenericKey;
use serde::{Deserialize, Serialize};

/// Per-key, per-window accumulator.
///
/// `Uninitialized` means nothing has been observed in this window yet. It is
/// the identity element of both `update` and `merge`, and once a state turns
/// `Active` it never goes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregateState<S> {
    Uninitialized,
    Active(S),
}

impl<S> AggregateState<S> {
    pub fn is_active(&self) -> bool {
        matches!(self, AggregateState::Active(_))
    }

    pub fn as_active(&self) -> Option<&S> {
        match self {
            AggregateState::Active(s) => Some(s),
            AggregateState::Uninitialized => None,
        }
    }

    pub fn into_active(self) -> Option<S> {
        match self {
            AggregateState::Active(s) => Some(s),
            AggregateState::Uninitialized => None,
        }
    }

    pub fn map<T, F: FnOnce(S) -> T>(self, f: F) -> AggregateState<T> {
        match self {
            AggregateState::Active(s) => AggregateState::Active(f(s)),
            AggregateState::Uninitialized => AggregateState::Uninitialized,
        }
    }

    /// Combine two states, treating `Uninitialized` as the identity on both sides.
    #[inline]
    pub fn combine_with<F>(self, other: Self, combine: F) -> Self
    where
        F: FnOnce(S, S) -> S,
    {
        match (self, other) {
            (AggregateState::Active(a), AggregateState::Active(b)) => {
                AggregateState::Active(combine(a, b))
            }
            (AggregateState::Uninitialized, s) | (s, AggregateState::Uninitialized) => s,
        }
    }
}

impl<S> Default for AggregateState<S> {
    fn default() -> Self {
        AggregateState::Uninitialized
    }
}

impl<S> From<Option<S>> for AggregateState<S> {
    fn from(value: Option<S>) -> Self {
        match value {
            Some(s) => AggregateState::Active(s),
            None => AggregateState::Uninitialized,
        }
    }
}

/// An aggregate function bound to concrete input, state and output types.
///
/// Contract:
/// - `update(None, s) == s` for every `s`
/// - `update(Some(v), Uninitialized)` starts the state from `v`
/// - `merge` is commutative and associative, with `Uninitialized` as identity
/// - all methods are pure; implementations hold configuration only
pub trait Udaf: Send + Sync + 'static {
    type Input;
    type State: Clone;
    type Output;

    /// State of a window that has seen no records.
    fn initial_state(&self) -> AggregateState<Self::State> {
        AggregateState::Uninitialized
    }

    /// Fold one input value into the state. `None` is an absent (NULL) input.
    fn update(
        &self,
        value: Option<Self::Input>,
        state: AggregateState<Self::State>,
    ) -> AggregateState<Self::State>;

    /// Combine two independently computed partial states.
    fn merge(
        &self,
        key: &GenericKey,
        left: AggregateState<Self::State>,
        right: AggregateState<Self::State>,
    ) -> AggregateState<Self::State>;

    /// Project the state into the emitted result. `None` is SQL NULL.
    fn output(&self, state: &AggregateState<Self::State>) -> Option<Self::Output>;

    /// Fold a sequence of inputs, starting from [`Udaf::initial_state`].
    fn aggregate_all<I>(&self, values: I) -> AggregateState<Self::State>
    where
        I: IntoIterator<Item = Option<Self::Input>>,
        Self: Sized,
    {
        values
            .into_iter()
            .fold(self.initial_state(), |state, value| self.update(value, state))
    }
}
