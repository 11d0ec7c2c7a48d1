//! The proving-backend contract.
//!
//! A backend owns constraint generation and witness storage. The execution
//! context layer drives it only through [`Backend`]: opening and finishing
//! sessions, toggling per-gate checks, asking whether a prover block is
//! active, allocating variables, and exporting finalized constraint systems.
//!
//! At most one session may be open on a backend instance at a time.

pub mod plonkish;

use ark_ff::PrimeField;

use crate::gate::{GateType, JsonConstraintSystem};

pub use plonkish::{PlonkishBackend, PlonkishConstraintSystem, PlonkishWitness};

/// A circuit variable allocated by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(pub(crate) usize);

impl Var {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    GenerateWitness,
    ConstraintSystem,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("no session is open")]
    NoActiveSession,

    #[error("a {0:?} session is already open on this backend")]
    SessionInProgress(SessionKind),

    #[error("expected a {expected:?} session, found {actual:?}")]
    WrongSession {
        expected: SessionKind,
        actual: SessionKind,
    },

    #[error("witness values are required while generating a witness")]
    MissingWitnessValues,

    #[error("expected {expected} witness value(s), got {actual}")]
    WitnessLength { expected: usize, actual: usize },

    #[error("{gate_type} gate at row {row} is not satisfied")]
    ConstraintUnsatisfied { row: usize, gate_type: GateType },

    #[error("public inputs must be allocated before the first gate")]
    PublicInputAfterGates,

    #[error("unknown variable {0}")]
    UnknownVariable(usize),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

pub trait Backend {
    type Field: PrimeField;
    /// Concrete satisfying assignment produced by a witness session.
    type Witness;
    /// Opaque handle to a recorded constraint system.
    type ConstraintSystem;

    fn enter_generate_witness(&mut self) -> Result<(), BackendError>;
    fn finish_generate_witness(&mut self) -> Result<Self::Witness, BackendError>;

    fn enter_constraint_system(&mut self) -> Result<(), BackendError>;
    fn finish_constraint_system(&mut self) -> Result<Self::ConstraintSystem, BackendError>;

    /// Enable or disable per-gate satisfaction checks during witness generation.
    fn set_eval_constraints(&mut self, enabled: bool);
    fn eval_constraints(&self) -> bool;

    /// True while the backend computes concrete values, as opposed to tracing shape.
    fn in_prover(&self) -> bool;
    fn in_prover_block(&self) -> bool;
    /// Returns the previous state.
    fn set_prover_block(&mut self, active: bool) -> bool;

    /// Allocate `size` variables; `values` must be given exactly when
    /// [`in_prover`](Self::in_prover) holds.
    fn exists(&mut self, size: usize, values: Option<Vec<Self::Field>>)
        -> Result<Vec<Var>, BackendError>;

    /// Export the gate list. Finalizes the constraint system on first call,
    /// which locks in any pending gate.
    fn constraint_system_to_json(
        &self,
        cs: &mut Self::ConstraintSystem,
    ) -> Result<JsonConstraintSystem, BackendError>;
    fn constraint_system_rows(&self, cs: &Self::ConstraintSystem) -> usize;
    fn constraint_system_digest(&self, cs: &Self::ConstraintSystem) -> Result<String, BackendError>;
}
