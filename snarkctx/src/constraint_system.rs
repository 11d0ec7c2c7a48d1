//! Structured constraint-system snapshots.

use std::collections::BTreeMap;

use ark_ff::PrimeField;
use log::info;

use crate::backend::{Backend, BackendError};
use crate::error::ProvableError;
use crate::format::GateFormatter;
use crate::gate::{digest_gates, gates_from_json, gates_to_json, Gate, JsonConstraintSystem};

/// Label of the synthetic row-count entry in [`ConstraintSystemSnapshot::summary`].
pub const TOTAL_ROWS: &str = "Total rows";

/// A finalized constraint system with coefficients in decimal text.
#[derive(Debug, Clone)]
pub struct ConstraintSystemSnapshot {
    rows: usize,
    digest: String,
    gates: Vec<Gate>,
    public_input_size: usize,
    formatter: GateFormatter,
}

impl ConstraintSystemSnapshot {
    /// Convert a backend handle. The first export finalizes `cs`, locking in
    /// a pending gate; later extractions from the same handle see the same
    /// gates.
    pub fn extract<B: Backend>(backend: &B, cs: &mut B::ConstraintSystem) -> Result<Self, ProvableError> {
        let json = backend.constraint_system_to_json(cs)?;
        let rows = backend.constraint_system_rows(cs);
        let digest = backend.constraint_system_digest(cs)?;
        let (gates, public_input_size) = gates_from_json::<B::Field>(&json)?;
        info!(
            "Extracted constraint system: {} rows, {} public inputs, digest {}",
            rows, public_input_size, digest
        );
        Ok(Self {
            rows,
            digest,
            gates,
            public_input_size,
            formatter: GateFormatter::for_field::<B::Field>(),
        })
    }

    /// Rebuild a snapshot from exported JSON. Rows are the gate count and the
    /// digest is recomputed from the gates.
    pub fn from_json<F: PrimeField>(json: &JsonConstraintSystem) -> Result<Self, ProvableError> {
        let digest =
            digest_gates(&json.gates).map_err(|e| BackendError::Serialization(e.to_string()))?;
        let (gates, public_input_size) = gates_from_json::<F>(json)?;
        Ok(Self {
            rows: gates.len(),
            digest,
            gates,
            public_input_size,
            formatter: GateFormatter::for_field::<F>(),
        })
    }

    pub fn to_json<F: PrimeField>(&self) -> Result<JsonConstraintSystem, ProvableError> {
        gates_to_json::<F>(&self.gates, self.public_input_size)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn public_input_size(&self) -> usize {
        self.public_input_size
    }

    /// Gate count per type name, plus [`TOTAL_ROWS`].
    pub fn summary(&self) -> BTreeMap<String, usize> {
        let mut summary = BTreeMap::new();
        for gate in &self.gates {
            *summary.entry(gate.gate_type.name().to_string()).or_insert(0) += 1;
        }
        summary.insert(TOTAL_ROWS.to_string(), self.rows);
        summary
    }

    pub fn formatted(&self) -> String {
        self.formatter.format_gates(&self.gates)
    }

    /// Print the gate listing to stdout.
    pub fn print(&self) {
        self.formatter.print_gates(&self.gates);
    }
}
