//! Values that can be passed through a circuit.
//!
//! A provable type splits into field elements, which become circuit
//! variables, and an auxiliary payload that never enters the circuit. The
//! generic witness allocation in [`CircuitRunner::witness`] works on any
//! implementor.

use ark_ff::PrimeField;

use crate::backend::{Backend, Var};
use crate::error::ProvableError;
use crate::runner::CircuitRunner;

pub trait Provable<F: PrimeField>: Sized {
    /// What a witness computation produces.
    type Value;
    /// Non-field payload carried next to the variables.
    type Auxiliary;

    fn size_in_fields() -> usize;

    fn to_fields(value: &Self::Value) -> Vec<F>;

    /// `None` while tracing, when no value has been computed.
    fn to_auxiliary(value: Option<Self::Value>) -> Vec<Self::Auxiliary>;

    fn from_fields(fields: Vec<Var>, aux: Vec<Self::Auxiliary>) -> Result<Self, ProvableError>;

    /// Extra constraints asserting the value is well formed.
    fn check<B: Backend<Field = F>>(&self, _runner: &CircuitRunner<B>) -> Result<(), ProvableError> {
        Ok(())
    }
}

pub(crate) fn expect_len<T>(kind: &'static str, items: &[T], expected: usize) -> Result<(), ProvableError> {
    if items.len() == expected {
        Ok(())
    } else {
        Err(ProvableError::Layout {
            kind,
            expected,
            actual: items.len(),
        })
    }
}

impl<F: PrimeField> Provable<F> for Var {
    type Value = F;
    type Auxiliary = ();

    fn size_in_fields() -> usize {
        1
    }

    fn to_fields(value: &F) -> Vec<F> {
        vec![*value]
    }

    fn to_auxiliary(_value: Option<F>) -> Vec<()> {
        Vec::new()
    }

    fn from_fields(fields: Vec<Var>, aux: Vec<()>) -> Result<Self, ProvableError> {
        expect_len("field", &fields, 1)?;
        expect_len("auxiliary slot", &aux, 0)?;
        Ok(fields[0])
    }
}
