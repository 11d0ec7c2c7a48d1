//! Reference in-process backend recording Plonkish `Generic` gates.
//!
//! Every arithmetic operation emits one generic half-gate
//! `l·a + r·b + o·c + m·a·b + c = 0` over three wires. Halves are packed two
//! per row; an odd half waits in a pending slot until the next half arrives or
//! the constraint system is finalized. Public inputs occupy the first rows.

use ark_ff::{One, PrimeField, Zero};
use log::debug;

use super::{Backend, BackendError, SessionKind, Var};
use crate::gate::{digest_gates, GateType, JsonConstraintSystem, JsonGate, Wire};
use crate::utils::field_to_hex;

/// Witness columns per row.
pub const COLUMNS: usize = 15;
/// Leading columns taking part in the copy-constraint permutation.
pub const PERMUTS: usize = 7;

/// `[l, r, o, m, c]` over the wires `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericHalf<F> {
    pub coeffs: [F; 5],
    pub vars: [Option<Var>; 3],
}

impl<F: PrimeField> GenericHalf<F> {
    fn is_satisfied(&self, values: &[Option<F>]) -> bool {
        let value = |i: usize| {
            self.vars[i]
                .and_then(|var| values.get(var.0).copied().flatten())
                .unwrap_or_else(F::zero)
        };
        let (a, b, c) = (value(0), value(1), value(2));
        let [l, r, o, m, constant] = self.coeffs;
        (l * a + r * b + o * c + m * a * b + constant).is_zero()
    }
}

#[derive(Debug, Clone)]
struct Row<F> {
    gate_type: GateType,
    coeffs: Vec<F>,
    vars: [Option<Var>; PERMUTS],
}

#[derive(Debug, Clone)]
struct Circuit<F> {
    public_input_size: usize,
    rows: Vec<Row<F>>,
    pending: Option<GenericHalf<F>>,
}

impl<F: PrimeField> Circuit<F> {
    fn accepts_public_input(&self) -> bool {
        self.rows.len() == self.public_input_size && self.pending.is_none()
    }

    fn push_public_input(&mut self, var: Var) {
        let mut vars = [None; PERMUTS];
        vars[0] = Some(var);
        let mut coeffs = vec![F::zero(); 5];
        coeffs[0] = F::one();
        self.rows.push(Row {
            gate_type: GateType::Generic,
            coeffs,
            vars,
        });
        self.public_input_size += 1;
    }

    fn push_half(&mut self, half: GenericHalf<F>) {
        match self.pending.take() {
            Some(first) => {
                let mut vars = [None; PERMUTS];
                vars[..3].copy_from_slice(&first.vars);
                vars[3..6].copy_from_slice(&half.vars);
                let coeffs = first.coeffs.iter().chain(half.coeffs.iter()).copied().collect();
                self.rows.push(Row {
                    gate_type: GateType::Generic,
                    coeffs,
                    vars,
                });
            }
            None => self.pending = Some(half),
        }
    }

    fn flush_pending(&mut self) {
        if let Some(half) = self.pending.take() {
            let mut vars = [None; PERMUTS];
            vars[..3].copy_from_slice(&half.vars);
            self.rows.push(Row {
                gate_type: GateType::Generic,
                coeffs: half.coeffs.to_vec(),
                vars,
            });
        }
    }

    /// Copy constraints: every slot holding a variable points to the next
    /// slot holding the same variable, cyclically.
    fn wires(&self) -> Vec<[Wire; PERMUTS]> {
        let mut wires: Vec<[Wire; PERMUTS]> = (0..self.rows.len())
            .map(|row| std::array::from_fn(|col| Wire { row, col }))
            .collect();

        let mut positions: Vec<(Var, Wire)> = self
            .rows
            .iter()
            .enumerate()
            .flat_map(|(row, r)| {
                r.vars
                    .iter()
                    .enumerate()
                    .filter_map(move |(col, var)| var.map(|v| (v, Wire { row, col })))
            })
            .collect();
        positions.sort_by_key(|(var, _)| *var);

        for cycle in positions.chunk_by(|a, b| a.0 == b.0) {
            for (i, (_, slot)) in cycle.iter().enumerate() {
                let (_, next) = cycle[(i + 1) % cycle.len()];
                wires[slot.row][slot.col] = next;
            }
        }
        wires
    }

    fn export(&self) -> Result<JsonConstraintSystem, BackendError> {
        let gates = self
            .rows
            .iter()
            .zip(self.wires())
            .map(|(row, wires)| {
                let coeffs = row
                    .coeffs
                    .iter()
                    .map(field_to_hex)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| BackendError::Serialization(e.to_string()))?;
                Ok(JsonGate {
                    typ: row.gate_type,
                    wires: wires.to_vec(),
                    coeffs,
                })
            })
            .collect::<Result<Vec<_>, BackendError>>()?;
        Ok(JsonConstraintSystem {
            gates,
            public_input_size: self.public_input_size,
        })
    }
}

#[derive(Debug)]
struct Session<F> {
    kind: SessionKind,
    circuit: Circuit<F>,
    values: Vec<Option<F>>,
}

impl<F: PrimeField> Session<F> {
    fn value(&self, var: Var) -> Result<Option<F>, BackendError> {
        self.values
            .get(var.0)
            .copied()
            .ok_or(BackendError::UnknownVariable(var.0))
    }

    fn fresh(&mut self, value: Option<F>) -> Var {
        let value = match self.kind {
            SessionKind::GenerateWitness => value,
            SessionKind::ConstraintSystem => None,
        };
        self.values.push(value);
        Var(self.values.len() - 1)
    }
}

/// A recorded, not yet exported constraint system.
#[derive(Debug, Clone)]
pub struct PlonkishConstraintSystem<F> {
    circuit: Circuit<F>,
    finalized: bool,
}

impl<F> PlonkishConstraintSystem<F> {
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn has_pending_gate(&self) -> bool {
        self.circuit.pending.is_some()
    }
}

/// Row-major witness table of a finished witness session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlonkishWitness<F> {
    pub public_inputs: Vec<F>,
    pub rows: Vec<[F; COLUMNS]>,
}

#[derive(Debug)]
pub struct PlonkishBackend<F> {
    session: Option<Session<F>>,
    eval_constraints: bool,
    prover_block: bool,
}

impl<F: PrimeField> Default for PlonkishBackend<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PrimeField> PlonkishBackend<F> {
    pub fn new() -> Self {
        Self {
            session: None,
            eval_constraints: true,
            prover_block: false,
        }
    }

    pub fn session_kind(&self) -> Option<SessionKind> {
        self.session.as_ref().map(|s| s.kind)
    }

    fn session(&self) -> Result<&Session<F>, BackendError> {
        self.session.as_ref().ok_or(BackendError::NoActiveSession)
    }

    fn session_mut(&mut self) -> Result<&mut Session<F>, BackendError> {
        self.session.as_mut().ok_or(BackendError::NoActiveSession)
    }

    fn open(&mut self, kind: SessionKind) -> Result<(), BackendError> {
        if let Some(session) = &self.session {
            return Err(BackendError::SessionInProgress(session.kind));
        }
        debug!("Opening {:?} session", kind);
        self.session = Some(Session {
            kind,
            circuit: Circuit {
                public_input_size: 0,
                rows: Vec::new(),
                pending: None,
            },
            values: Vec::new(),
        });
        Ok(())
    }

    fn close(&mut self, kind: SessionKind) -> Result<Session<F>, BackendError> {
        match self.session.take() {
            None => Err(BackendError::NoActiveSession),
            Some(session) if session.kind != kind => {
                let actual = session.kind;
                self.session = Some(session);
                Err(BackendError::WrongSession {
                    expected: kind,
                    actual,
                })
            }
            Some(session) => {
                debug!(
                    "Closing {:?} session: {} variables, {} rows",
                    kind,
                    session.values.len(),
                    session.circuit.rows.len()
                );
                Ok(session)
            }
        }
    }

    fn record(&mut self, half: GenericHalf<F>) -> Result<(), BackendError> {
        let check = self.eval_constraints;
        let session = self.session_mut()?;
        for var in half.vars.iter().flatten() {
            session.value(*var)?;
        }
        if check
            && session.kind == SessionKind::GenerateWitness
            && !half.is_satisfied(&session.values)
        {
            return Err(BackendError::ConstraintUnsatisfied {
                row: session.circuit.rows.len(),
                gate_type: GateType::Generic,
            });
        }
        session.circuit.push_half(half);
        Ok(())
    }

    fn derive(&mut self, x: Var, y: Var, op: impl FnOnce(F, F) -> F) -> Result<Var, BackendError> {
        let session = self.session_mut()?;
        let value = match (session.value(x)?, session.value(y)?) {
            (Some(a), Some(b)) => Some(op(a, b)),
            _ => None,
        };
        Ok(session.fresh(value))
    }

    /// The concrete value of `var`; `None` while tracing.
    pub fn value(&self, var: Var) -> Result<Option<F>, BackendError> {
        self.session()?.value(var)
    }

    pub fn public_input(&mut self, value: F) -> Result<Var, BackendError> {
        let session = self.session_mut()?;
        if !session.circuit.accepts_public_input() {
            return Err(BackendError::PublicInputAfterGates);
        }
        let var = session.fresh(Some(value));
        session.circuit.push_public_input(var);
        Ok(var)
    }

    /// Record a raw generic half-gate.
    pub fn generic(&mut self, coeffs: [F; 5], vars: [Option<Var>; 3]) -> Result<(), BackendError> {
        self.record(GenericHalf { coeffs, vars })
    }

    pub fn constant(&mut self, value: F) -> Result<Var, BackendError> {
        let var = self.session_mut()?.fresh(Some(value));
        self.generic(
            [F::one(), F::zero(), F::zero(), F::zero(), -value],
            [Some(var), None, None],
        )?;
        Ok(var)
    }

    pub fn add(&mut self, x: Var, y: Var) -> Result<Var, BackendError> {
        let z = self.derive(x, y, |a, b| a + b)?;
        self.generic(
            [F::one(), F::one(), -F::one(), F::zero(), F::zero()],
            [Some(x), Some(y), Some(z)],
        )?;
        Ok(z)
    }

    pub fn mul(&mut self, x: Var, y: Var) -> Result<Var, BackendError> {
        let z = self.derive(x, y, |a, b| a * b)?;
        self.assert_mul(x, y, z)?;
        Ok(z)
    }

    pub fn assert_mul(&mut self, x: Var, y: Var, z: Var) -> Result<(), BackendError> {
        self.generic(
            [F::zero(), F::zero(), -F::one(), F::one(), F::zero()],
            [Some(x), Some(y), Some(z)],
        )
    }

    pub fn assert_equal(&mut self, x: Var, y: Var) -> Result<(), BackendError> {
        self.generic(
            [F::one(), -F::one(), F::zero(), F::zero(), F::zero()],
            [Some(x), Some(y), None],
        )
    }
}

impl<F: PrimeField> Backend for PlonkishBackend<F> {
    type Field = F;
    type Witness = PlonkishWitness<F>;
    type ConstraintSystem = PlonkishConstraintSystem<F>;

    fn enter_generate_witness(&mut self) -> Result<(), BackendError> {
        self.open(SessionKind::GenerateWitness)
    }

    fn finish_generate_witness(&mut self) -> Result<PlonkishWitness<F>, BackendError> {
        let mut session = self.close(SessionKind::GenerateWitness)?;
        session.circuit.flush_pending();
        let value = |var: Option<Var>| {
            var.and_then(|v| session.values[v.0])
                .ok_or(BackendError::MissingWitnessValues)
        };

        let public_inputs = session.circuit.rows[..session.circuit.public_input_size]
            .iter()
            .map(|row| value(row.vars[0]))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(session.circuit.rows.len());
        for row in &session.circuit.rows {
            let mut columns = [F::zero(); COLUMNS];
            for (col, var) in row.vars.iter().enumerate() {
                if var.is_some() {
                    columns[col] = value(*var)?;
                }
            }
            rows.push(columns);
        }
        Ok(PlonkishWitness {
            public_inputs,
            rows,
        })
    }

    fn enter_constraint_system(&mut self) -> Result<(), BackendError> {
        self.open(SessionKind::ConstraintSystem)
    }

    fn finish_constraint_system(&mut self) -> Result<PlonkishConstraintSystem<F>, BackendError> {
        let session = self.close(SessionKind::ConstraintSystem)?;
        Ok(PlonkishConstraintSystem {
            circuit: session.circuit,
            finalized: false,
        })
    }

    fn set_eval_constraints(&mut self, enabled: bool) {
        self.eval_constraints = enabled;
    }

    fn eval_constraints(&self) -> bool {
        self.eval_constraints
    }

    fn in_prover(&self) -> bool {
        self.session_kind() == Some(SessionKind::GenerateWitness)
    }

    fn in_prover_block(&self) -> bool {
        self.prover_block
    }

    fn set_prover_block(&mut self, active: bool) -> bool {
        std::mem::replace(&mut self.prover_block, active)
    }

    fn exists(&mut self, size: usize, values: Option<Vec<F>>) -> Result<Vec<Var>, BackendError> {
        let session = self.session_mut()?;
        match (session.kind, values) {
            (SessionKind::GenerateWitness, None) => Err(BackendError::MissingWitnessValues),
            (SessionKind::GenerateWitness, Some(values)) if values.len() != size => {
                Err(BackendError::WitnessLength {
                    expected: size,
                    actual: values.len(),
                })
            }
            (SessionKind::GenerateWitness, Some(values)) => {
                Ok(values.into_iter().map(|v| session.fresh(Some(v))).collect())
            }
            (SessionKind::ConstraintSystem, _) => {
                Ok((0..size).map(|_| session.fresh(None)).collect())
            }
        }
    }

    fn constraint_system_to_json(
        &self,
        cs: &mut PlonkishConstraintSystem<F>,
    ) -> Result<JsonConstraintSystem, BackendError> {
        if !cs.finalized {
            cs.circuit.flush_pending();
            cs.finalized = true;
        }
        cs.circuit.export()
    }

    fn constraint_system_rows(&self, cs: &PlonkishConstraintSystem<F>) -> usize {
        cs.circuit.rows.len()
    }

    fn constraint_system_digest(&self, cs: &PlonkishConstraintSystem<F>) -> Result<String, BackendError> {
        let json = cs.circuit.export()?;
        digest_gates(&json.gates).map_err(|e| BackendError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;

    fn tracing() -> PlonkishBackend<Fr> {
        let mut backend = PlonkishBackend::new();
        backend.enter_constraint_system().unwrap();
        backend
    }

    fn proving() -> PlonkishBackend<Fr> {
        let mut backend = PlonkishBackend::new();
        backend.enter_generate_witness().unwrap();
        backend
    }

    #[test]
    fn packs_two_halves_per_row() {
        let mut backend = tracing();
        let x = backend.exists(2, None).unwrap();
        let sum = backend.add(x[0], x[1]).unwrap();
        backend.mul(sum, x[0]).unwrap();
        backend.assert_equal(sum, x[1]).unwrap();

        let mut cs = backend.finish_constraint_system().unwrap();
        assert_eq!(backend.constraint_system_rows(&cs), 1);
        assert!(cs.has_pending_gate());

        let json = backend.constraint_system_to_json(&mut cs).unwrap();
        assert_eq!(json.gates.len(), 2);
        assert_eq!(json.gates[0].coeffs.len(), 10);
        assert_eq!(json.gates[1].coeffs.len(), 5);
        assert!(json.gates.iter().all(|g| g.typ == GateType::Generic && g.wires.len() == PERMUTS));
        assert!(!cs.has_pending_gate());
        assert_eq!(backend.constraint_system_rows(&cs), 2);
    }

    #[test]
    fn exporting_twice_locks_the_pending_gate_once() {
        let mut backend = tracing();
        let x = backend.exists(1, None).unwrap();
        backend.constant(Fr::from(3u64)).unwrap();
        backend.assert_equal(x[0], x[0]).unwrap();
        backend.constant(Fr::from(4u64)).unwrap();

        let mut cs = backend.finish_constraint_system().unwrap();
        let first = backend.constraint_system_to_json(&mut cs).unwrap();
        let digest = backend.constraint_system_digest(&cs).unwrap();
        let second = backend.constraint_system_to_json(&mut cs).unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.constraint_system_rows(&cs), 2);
        assert_eq!(backend.constraint_system_digest(&cs).unwrap(), digest);
        assert!(matches!(
            backend.finish_constraint_system(),
            Err(BackendError::NoActiveSession)
        ));
    }

    #[test]
    fn public_inputs_lead_and_are_wired_to_their_uses() {
        let mut backend = tracing();
        let a = backend.public_input(Fr::from(0u64)).unwrap();
        let b = backend.public_input(Fr::from(0u64)).unwrap();
        backend.add(a, b).unwrap();
        assert_eq!(
            backend.public_input(Fr::from(0u64)),
            Err(BackendError::PublicInputAfterGates)
        );

        let mut cs = backend.finish_constraint_system().unwrap();
        let json = backend.constraint_system_to_json(&mut cs).unwrap();
        assert_eq!(json.public_input_size, 2);
        assert_eq!(json.gates.len(), 3);
        // public input a: row 0 col 0 <-> row 2 col 0
        assert_eq!(json.gates[0].wires[0], Wire { row: 2, col: 0 });
        assert_eq!(json.gates[2].wires[0], Wire { row: 0, col: 0 });
        assert_eq!(json.gates[1].wires[0], Wire { row: 2, col: 1 });
        // the sum is used once: unconnected
        assert_eq!(json.gates[2].wires[2], Wire { row: 2, col: 2 });
        assert_eq!(json.gates[0].wires[6], Wire { row: 0, col: 6 });
    }

    #[test]
    fn wiring_forms_one_cycle_per_variable() {
        let mut backend = tracing();
        let x = backend.exists(1, None).unwrap()[0];
        for _ in 0..3 {
            backend.assert_equal(x, x).unwrap();
        }
        let mut cs = backend.finish_constraint_system().unwrap();
        let json = backend.constraint_system_to_json(&mut cs).unwrap();

        // x occupies six slots; following the wires from one of them visits all six
        let mut slot = Wire { row: 0, col: 0 };
        let mut visited = vec![slot];
        loop {
            slot = json.gates[slot.row].wires[slot.col];
            if slot == visited[0] {
                break;
            }
            visited.push(slot);
        }
        assert_eq!(visited.len(), 6);
    }

    #[test]
    fn witness_table_holds_values() {
        let mut backend = proving();
        let x = backend.public_input(Fr::from(3u64)).unwrap();
        let y = backend.exists(1, Some(vec![Fr::from(5u64)])).unwrap()[0];
        let sum = backend.add(x, y).unwrap();
        let product = backend.mul(sum, y).unwrap();
        assert_eq!(backend.value(product).unwrap(), Some(Fr::from(40u64)));

        let witness = backend.finish_generate_witness().unwrap();
        assert_eq!(witness.public_inputs, vec![Fr::from(3u64)]);
        assert_eq!(witness.rows.len(), 2);
        assert_eq!(witness.rows[1][..6], [
            Fr::from(3u64),
            Fr::from(5u64),
            Fr::from(8u64),
            Fr::from(8u64),
            Fr::from(5u64),
            Fr::from(40u64),
        ]);
    }

    #[test]
    fn unsatisfied_gates_are_rejected_unless_checks_are_off() {
        let mut backend = proving();
        let v = backend.exists(2, Some(vec![Fr::from(1u64), Fr::from(2u64)])).unwrap();
        assert_eq!(
            backend.assert_equal(v[0], v[1]),
            Err(BackendError::ConstraintUnsatisfied {
                row: 0,
                gate_type: GateType::Generic
            })
        );

        backend.set_eval_constraints(false);
        assert!(backend.assert_equal(v[0], v[1]).is_ok());
    }

    #[test]
    fn exists_requires_values_exactly_when_proving() {
        let mut backend = proving();
        assert_eq!(backend.exists(1, None), Err(BackendError::MissingWitnessValues));
        assert_eq!(
            backend.exists(2, Some(vec![Fr::from(1u64)])),
            Err(BackendError::WitnessLength { expected: 2, actual: 1 })
        );

        let mut backend = tracing();
        let vars = backend.exists(2, Some(vec![Fr::from(1u64), Fr::from(2u64)])).unwrap();
        assert_eq!(backend.value(vars[0]).unwrap(), None);
        assert!(!backend.in_prover());
    }

    #[test]
    fn one_session_at_a_time() {
        let mut backend = tracing();
        assert_eq!(
            backend.enter_generate_witness(),
            Err(BackendError::SessionInProgress(SessionKind::ConstraintSystem))
        );
        assert!(matches!(
            backend.finish_generate_witness(),
            Err(BackendError::WrongSession { .. })
        ));
        assert_eq!(backend.session_kind(), Some(SessionKind::ConstraintSystem));
        assert_eq!(
            PlonkishBackend::<Fr>::new().add(Var(0), Var(1)),
            Err(BackendError::NoActiveSession)
        );
    }

    #[test]
    fn digest_tracks_circuit_shape() {
        let digest_of = |extra_gate: bool| {
            let mut backend = tracing();
            let x = backend.exists(2, None).unwrap();
            backend.add(x[0], x[1]).unwrap();
            if extra_gate {
                backend.mul(x[0], x[1]).unwrap();
            }
            let mut cs = backend.finish_constraint_system().unwrap();
            backend.constraint_system_to_json(&mut cs).unwrap();
            backend.constraint_system_digest(&cs).unwrap()
        };
        assert_eq!(digest_of(false), digest_of(false));
        assert_ne!(digest_of(false), digest_of(true));
        assert_eq!(digest_of(false).len(), 64);
    }
}
