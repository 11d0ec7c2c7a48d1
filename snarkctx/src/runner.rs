//! Running circuit bodies against a backend.
//!
//! A [`CircuitRunner`] owns an [`ExecutionContext`] and a [`Backend`]. Circuit
//! bodies borrow the runner, so the context and the backend are shared by
//! reference rather than through global state. All entry points follow the
//! same protocol:
//!
//! 1. enter a context frame describing the phase,
//! 2. open a backend session,
//! 3. run the body (synchronously, or by awaiting it),
//! 4. finish the session,
//! 5. restore backend toggles and leave the frame on every exit path.
//!
//! The runner is `!Sync`; run one body at a time per runner.

use std::cell::{Ref, RefCell, RefMut};
use std::future::Future;

use log::{debug, error, warn};

use crate::backend::{Backend, BackendError};
use crate::config::WitnessOptions;
use crate::constraint_system::ConstraintSystemSnapshot;
use crate::context::{ContextGuard, ExecutionContext, Frame};
use crate::error::{prettify, ProvableError};
use crate::provable::Provable;
use crate::unconstrained::ProverScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionMode {
    GenerateWitness { check_constraints: bool },
    /// Legacy synchronous witness generation; never touches the check toggle.
    RunAndCheck,
    ConstraintSystem,
}

impl SessionMode {
    fn frame(self) -> Frame {
        match self {
            SessionMode::GenerateWitness { .. } | SessionMode::RunAndCheck => Frame {
                in_checked_computation: true,
                ..Frame::default()
            },
            SessionMode::ConstraintSystem => Frame {
                in_analyze: true,
                in_checked_computation: true,
                ..Frame::default()
            },
        }
    }

    fn disables_checks(self) -> bool {
        matches!(
            self,
            SessionMode::GenerateWitness {
                check_constraints: false
            }
        )
    }
}

#[derive(Debug)]
pub struct CircuitRunner<B> {
    context: ExecutionContext,
    backend: RefCell<B>,
}

/// An open backend session. Dropping it restores the check toggle and then
/// leaves the context frame, also when the body panicked.
struct ActiveSession<'a, B: Backend> {
    backend: &'a RefCell<B>,
    restore_checks: bool,
    guard: Option<ContextGuard<'a>>,
}

impl<B: Backend> ActiveSession<'_, B> {
    fn restore(&mut self) {
        if !self.restore_checks {
            return;
        }
        match self.backend.try_borrow_mut() {
            Ok(mut backend) => {
                backend.set_eval_constraints(true);
                self.restore_checks = false;
            }
            Err(_) => error!("Backend is borrowed, constraint checks could not be re-enabled"),
        }
    }

    fn finish<R>(
        mut self,
        outcome: anyhow::Result<()>,
        finalize: impl FnOnce(&mut B) -> Result<R, BackendError>,
    ) -> Result<R, ProvableError> {
        let result = match outcome {
            Ok(()) => finalize(&mut self.backend.borrow_mut()).map_err(ProvableError::from),
            Err(e) => Err(prettify(e).into()),
        };
        self.restore();
        if let Some(guard) = self.guard.take() {
            guard.close()?;
        }
        result
    }
}

impl<B: Backend> Drop for ActiveSession<'_, B> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Restores the backend's prover-block flag when dropped.
struct ProverBlock<'a, B: Backend> {
    backend: &'a RefCell<B>,
    previous: bool,
}

impl<B: Backend> Drop for ProverBlock<'_, B> {
    fn drop(&mut self) {
        match self.backend.try_borrow_mut() {
            Ok(mut backend) => {
                backend.set_prover_block(self.previous);
            }
            Err(_) => error!("Backend is borrowed, prover block could not be closed"),
        }
    }
}

impl<B: Backend> CircuitRunner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            context: ExecutionContext::new(),
            backend: RefCell::new(backend),
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn backend(&self) -> Ref<'_, B> {
        self.backend.borrow()
    }

    /// Mutable access for circuit bodies that record gates. Do not hold the
    /// borrow across an `await` or a call back into the runner.
    pub fn backend_mut(&self) -> RefMut<'_, B> {
        self.backend.borrow_mut()
    }

    pub fn into_backend(self) -> B {
        self.backend.into_inner()
    }

    fn open(&self, mode: SessionMode) -> Result<ActiveSession<'_, B>, ProvableError> {
        let guard = self.context.scope(mode.frame());
        {
            let mut backend = self.backend.borrow_mut();
            match mode {
                SessionMode::GenerateWitness { .. } | SessionMode::RunAndCheck => {
                    backend.enter_generate_witness()?
                }
                SessionMode::ConstraintSystem => backend.enter_constraint_system()?,
            }
        }
        debug!("Opened {:?} session", mode);

        let mut session = ActiveSession {
            backend: &self.backend,
            restore_checks: false,
            guard: Some(guard),
        };
        if mode.disables_checks() {
            warn!("Constraint checks disabled for this witness generation");
            self.backend.borrow_mut().set_eval_constraints(false);
            session.restore_checks = true;
        }
        Ok(session)
    }

    /// Run `body` to produce a witness.
    ///
    /// With `check_constraints: false` the backend skips per-gate satisfaction
    /// checks while the body runs; checks are re-enabled afterwards whether the
    /// body succeeded or not. A body error comes back as
    /// [`ProvableError::CircuitExecution`].
    pub async fn generate_witness<Fut>(
        &self,
        body: Fut,
        options: WitnessOptions,
    ) -> Result<B::Witness, ProvableError>
    where
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let session = self.open(SessionMode::GenerateWitness {
            check_constraints: options.check_constraints,
        })?;
        let outcome = body.await;
        session.finish(outcome, |backend| backend.finish_generate_witness())
    }

    /// Synchronous witness generation, kept for callers that cannot await.
    #[deprecated(note = "use `generate_witness` instead")]
    pub fn run_and_check_sync(
        &self,
        body: impl FnOnce() -> anyhow::Result<()>,
    ) -> Result<B::Witness, ProvableError> {
        let session = self.open(SessionMode::RunAndCheck)?;
        let outcome = body();
        session.finish(outcome, |backend| backend.finish_generate_witness())
    }

    /// Trace `body` and extract the constraint system it describes.
    pub async fn constraint_system<Fut>(&self, body: Fut) -> Result<ConstraintSystemSnapshot, ProvableError>
    where
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let session = self.open(SessionMode::ConstraintSystem)?;
        let outcome = body.await;
        let mut cs = session.finish(outcome, |backend| backend.finish_constraint_system())?;
        ConstraintSystemSnapshot::extract(&*self.backend(), &mut cs)
    }

    pub fn constraint_system_sync(
        &self,
        body: impl FnOnce() -> anyhow::Result<()>,
    ) -> Result<ConstraintSystemSnapshot, ProvableError> {
        let session = self.open(SessionMode::ConstraintSystem)?;
        let outcome = body();
        let mut cs = session.finish(outcome, |backend| backend.finish_constraint_system())?;
        ConstraintSystemSnapshot::extract(&*self.backend(), &mut cs)
    }

    fn run_in_prover_block<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = self.backend.borrow_mut().set_prover_block(true);
        let _block = ProverBlock {
            backend: &self.backend,
            previous,
        };
        f()
    }

    /// Run `f` out of circuit.
    ///
    /// Outside checked computation `f` runs directly. Inside, it runs in a
    /// prover block when the backend computes concrete values and is skipped
    /// (`Ok(None)`) while the circuit shape is traced.
    pub fn as_prover<R, E>(&self, f: impl FnOnce() -> Result<R, E>) -> Result<Option<R>, E> {
        if !self.context.in_checked_computation() {
            return f().map(Some);
        }
        if !self.backend.borrow().in_prover() {
            return Ok(None);
        }
        self.run_in_prover_block(f).map(Some)
    }

    /// Allocate a provable value from an out-of-circuit computation.
    ///
    /// `compute` runs only when concrete values exist (as the prover, or
    /// outside checked computation); while tracing, the value is allocated
    /// without one.
    pub fn witness<T, C>(&self, compute: C) -> Result<T, ProvableError>
    where
        T: Provable<B::Field>,
        C: FnOnce() -> anyhow::Result<T::Value>,
    {
        let guard = self.context.scope(Frame {
            in_witness_block: true,
            ..self.context.current()
        });

        let concrete = !self.context.in_checked_computation() || self.backend.borrow().in_prover();
        let value = if concrete {
            Some(self.run_in_prover_block(compute).map_err(ProvableError::Witness)?)
        } else {
            None
        };

        let size = T::size_in_fields();
        let vars = if size == 0 {
            Vec::new()
        } else {
            let fields = value.as_ref().map(T::to_fields);
            self.backend.borrow_mut().exists(size, fields)?
        };
        let result = T::from_fields(vars, T::to_auxiliary(value))?;
        result.check(self)?;

        guard.close()?;
        Ok(result)
    }
}

impl<B: Backend> ProverScope for CircuitRunner<B> {
    fn in_checked_computation(&self) -> bool {
        self.context.in_checked_computation()
    }

    fn in_prover_block(&self) -> bool {
        self.backend.borrow().in_prover_block()
    }
}
