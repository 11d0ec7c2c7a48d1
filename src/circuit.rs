use ark_ff::PrimeField;
use snarkctx::backend::PlonkishBackend;
use snarkctx::{CircuitRunner, Unconstrained, Var};

/// Proves knowledge of `y` with `x + y = sum`, where `x` and `sum` are public.
#[derive(Clone)]
pub struct AdderCircuit<F: PrimeField> {
    pub x: F,
    pub y: F,
    pub sum: F,
}

impl<F: PrimeField> AdderCircuit<F> {
    /// The values do not affect the constraint system, only the witness.
    pub fn blank() -> Self {
        Self {
            x: F::zero(),
            y: F::zero(),
            sum: F::zero(),
        }
    }

    pub fn synthesize(&self, runner: &CircuitRunner<PlonkishBackend<F>>) -> anyhow::Result<()> {
        let x_var = runner.backend_mut().public_input(self.x)?;
        let sum_var = runner.backend_mut().public_input(self.sum)?;
        let y_var = runner.witness::<Var, _>(|| Ok(self.y))?;

        let computed = runner.backend_mut().add(x_var, y_var)?;
        runner.backend_mut().assert_equal(computed, sum_var)?;

        let mut steps = Unconstrained::from(0usize);
        steps.update_as_prover(runner, |n| n + 1)?;
        runner.as_prover(|| {
            log::debug!("Adder checked after {} step(s)", steps.get(runner)?);
            Ok::<_, snarkctx::ProvableError>(())
        })?;
        Ok(())
    }
}
