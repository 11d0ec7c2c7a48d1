//! Circuits shared by the integration tests

#![allow(dead_code)]

use ark_bls12_381::Fr;
use snarkctx::backend::PlonkishBackend;
use snarkctx::{CircuitRunner, Var};

pub type Runner = CircuitRunner<PlonkishBackend<Fr>>;

pub fn runner() -> Runner {
    let _ = env_logger::builder().is_test(true).try_init();
    CircuitRunner::new(PlonkishBackend::new())
}

/// `x + y == expected`, with `x` public.
pub fn adder(runner: &Runner, x: Fr, y: Fr, expected: Fr) -> anyhow::Result<()> {
    let x_var = runner.backend_mut().public_input(x)?;
    let y_var = runner.witness::<Var, _>(|| Ok(y))?;
    let sum = runner.backend_mut().add(x_var, y_var)?;
    let expected = runner.witness::<Var, _>(|| Ok(expected))?;
    runner.backend_mut().assert_equal(sum, expected)?;
    Ok(())
}

/// Three half-gates, so the last one is pending until finalization.
pub fn odd_circuit(runner: &Runner) -> anyhow::Result<()> {
    let x = runner.witness::<Var, _>(|| Ok(Fr::from(2u64)))?;
    let square = runner.backend_mut().mul(x, x)?;
    let four = runner.backend_mut().constant(Fr::from(4u64))?;
    runner.backend_mut().assert_equal(square, four)?;
    Ok(())
}
