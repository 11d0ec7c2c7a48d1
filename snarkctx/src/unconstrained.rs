//! Out-of-circuit values carried through provable code.
//!
//! An [`Unconstrained`] holds a value that is never constrained by the
//! circuit. It can be read only where no constraints are being generated:
//! outside checked computation, or inside a prover block (a `witness` or
//! `as_prover` computation).
//!
//! It may be empty while the circuit shape is traced, but is never empty when
//! running as the prover, because no public constructor creates an empty one.

use ark_ff::PrimeField;

use crate::backend::{Backend, Var};
use crate::context::ExecutionContext;
use crate::error::ProvableError;
use crate::provable::{expect_len, Provable};
use crate::runner::CircuitRunner;

/// Where an [`Unconstrained`] read happens.
pub trait ProverScope {
    fn in_checked_computation(&self) -> bool;
    fn in_prover_block(&self) -> bool;
}

impl ProverScope for ExecutionContext {
    fn in_checked_computation(&self) -> bool {
        ExecutionContext::in_checked_computation(self)
    }

    /// Prover blocks are opened by a backend; a bare context never has one.
    fn in_prover_block(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State<T> {
    Empty,
    Present(T),
}

/// Container for a value living outside the circuit.
///
/// ```
/// use snarkctx::{ExecutionContext, Unconstrained};
///
/// let ctx = ExecutionContext::new();
/// let x = Unconstrained::from(5u64);
/// assert_eq!(*x.get(&ctx).unwrap(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unconstrained<T> {
    state: State<T>,
}

impl<T> Unconstrained<T> {
    fn empty() -> Self {
        Self { state: State::Empty }
    }

    /// Wrap `value` directly.
    ///
    /// If `T` holds values computed inside circuit code this is an
    /// anti-pattern: they end up in a space meant for data that is not part of
    /// the proof. Use [`witness`](Self::witness) for those.
    pub fn from(value: T) -> Self {
        Self {
            state: State::Present(value),
        }
    }

    pub fn is_some(&self) -> bool {
        matches!(self.state, State::Present(_))
    }

    /// Read the value. Fails with [`ProvableError::AccessViolation`] in
    /// provable code outside a prover block.
    pub fn get(&self, scope: &impl ProverScope) -> Result<&T, ProvableError> {
        if scope.in_checked_computation() && !scope.in_prover_block() {
            return Err(ProvableError::AccessViolation);
        }
        match &self.state {
            State::Present(value) => Ok(value),
            // unreachable while proving, the backend never hands out empty containers there
            State::Empty => Err(ProvableError::InvariantViolation),
        }
    }

    pub fn set(&mut self, value: T) {
        self.state = State::Present(value);
    }

    pub fn set_to(&mut self, other: &Unconstrained<T>)
    where
        T: Clone,
    {
        self.state = other.state.clone();
    }

    /// Create a container from a computation run outside the circuit.
    pub fn witness<B>(
        runner: &CircuitRunner<B>,
        compute: impl FnOnce() -> anyhow::Result<T>,
    ) -> Result<Self, ProvableError>
    where
        B: Backend,
    {
        runner.witness::<Self, _>(compute)
    }

    /// Replace the value by `compute(current)` when running as the prover;
    /// does nothing while the circuit shape is traced.
    pub fn update_as_prover<B>(
        &mut self,
        runner: &CircuitRunner<B>,
        compute: impl FnOnce(&T) -> T,
    ) -> Result<(), ProvableError>
    where
        B: Backend,
    {
        runner.as_prover(|| {
            let next = compute(self.get(runner)?);
            self.set(next);
            Ok::<_, ProvableError>(())
        })?;
        Ok(())
    }
}

impl<F: PrimeField, T> Provable<F> for Unconstrained<T> {
    type Value = T;
    type Auxiliary = Unconstrained<T>;

    fn size_in_fields() -> usize {
        0
    }

    fn to_fields(_value: &T) -> Vec<F> {
        Vec::new()
    }

    fn to_auxiliary(value: Option<T>) -> Vec<Unconstrained<T>> {
        vec![value.map_or_else(Self::empty, Self::from)]
    }

    fn from_fields(fields: Vec<Var>, mut aux: Vec<Unconstrained<T>>) -> Result<Self, ProvableError> {
        expect_len("field", &fields, 0)?;
        expect_len("auxiliary slot", &aux, 1)?;
        Ok(aux.remove(0))
    }
}
