//! Gate model and the JSON shape a backend exports constraint systems in.
//!
//! The exported JSON carries coefficients as fixed-width little-endian hex;
//! the structured [`Gate`] carries them as canonical decimal text. The two
//! conversions are exact inverses of each other.

use std::fmt;

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ProvableError;
use crate::utils::{decimal_to_hex, hex_to_decimal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GateType {
    Zero,
    Generic,
    Poseidon,
    CompleteAdd,
    VarBaseMul,
    EndoMul,
    EndoMulScalar,
    Lookup,
    CairoClaim,
    CairoInstruction,
    CairoFlags,
    CairoTransition,
    RangeCheck0,
    RangeCheck1,
    ForeignFieldAdd,
    ForeignFieldMul,
    Xor16,
    Rot64,
}

impl GateType {
    pub fn name(self) -> &'static str {
        match self {
            GateType::Zero => "Zero",
            GateType::Generic => "Generic",
            GateType::Poseidon => "Poseidon",
            GateType::CompleteAdd => "CompleteAdd",
            GateType::VarBaseMul => "VarBaseMul",
            GateType::EndoMul => "EndoMul",
            GateType::EndoMulScalar => "EndoMulScalar",
            GateType::Lookup => "Lookup",
            GateType::CairoClaim => "CairoClaim",
            GateType::CairoInstruction => "CairoInstruction",
            GateType::CairoFlags => "CairoFlags",
            GateType::CairoTransition => "CairoTransition",
            GateType::RangeCheck0 => "RangeCheck0",
            GateType::RangeCheck1 => "RangeCheck1",
            GateType::ForeignFieldAdd => "ForeignFieldAdd",
            GateType::ForeignFieldMul => "ForeignFieldMul",
            GateType::Xor16 => "Xor16",
            GateType::Rot64 => "Rot64",
        }
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A wire slot. A gate's wire at column `c` of row `r` points to the next
/// slot whose value must be equal; `Wire { row: r, col: c }` means unconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wire {
    pub row: usize,
    pub col: usize,
}

/// One row of a constraint system, coefficients as decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    #[serde(rename = "type")]
    pub gate_type: GateType,
    pub wires: Vec<Wire>,
    pub coeffs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonGate {
    #[serde(alias = "type")]
    pub typ: GateType,
    pub wires: Vec<Wire>,
    pub coeffs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonConstraintSystem {
    pub gates: Vec<JsonGate>,
    pub public_input_size: usize,
}

/// Decode an exported constraint system into gates and its public input size.
pub fn gates_from_json<F: PrimeField>(
    json: &JsonConstraintSystem,
) -> Result<(Vec<Gate>, usize), ProvableError> {
    let gates = json
        .gates
        .iter()
        .map(|gate| {
            Ok(Gate {
                gate_type: gate.typ,
                wires: gate.wires.clone(),
                coeffs: gate
                    .coeffs
                    .iter()
                    .map(|hex| hex_to_decimal::<F>(hex))
                    .collect::<Result<_, _>>()?,
            })
        })
        .collect::<Result<Vec<_>, ProvableError>>()?;
    Ok((gates, json.public_input_size))
}

pub fn gates_to_json<F: PrimeField>(
    gates: &[Gate],
    public_input_size: usize,
) -> Result<JsonConstraintSystem, ProvableError> {
    let gates = gates
        .iter()
        .map(|gate| {
            Ok(JsonGate {
                typ: gate.gate_type,
                wires: gate.wires.clone(),
                coeffs: gate
                    .coeffs
                    .iter()
                    .map(|decimal| decimal_to_hex::<F>(decimal))
                    .collect::<Result<_, _>>()?,
            })
        })
        .collect::<Result<Vec<_>, ProvableError>>()?;
    Ok(JsonConstraintSystem {
        gates,
        public_input_size,
    })
}

/// SHA-256 over the canonical JSON encoding of `gates`, hex encoded.
pub fn digest_gates(gates: &[JsonGate]) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(gates)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{field_to_hex, field_to_string};
    use ark_bls12_381::Fr;
    use ark_ff::One;
    use ark_std::UniformRand;
    use rand::Rng;

    const ALL_TYPES: [GateType; 18] = [
        GateType::Zero,
        GateType::Generic,
        GateType::Poseidon,
        GateType::CompleteAdd,
        GateType::VarBaseMul,
        GateType::EndoMul,
        GateType::EndoMulScalar,
        GateType::Lookup,
        GateType::CairoClaim,
        GateType::CairoInstruction,
        GateType::CairoFlags,
        GateType::CairoTransition,
        GateType::RangeCheck0,
        GateType::RangeCheck1,
        GateType::ForeignFieldAdd,
        GateType::ForeignFieldMul,
        GateType::Xor16,
        GateType::Rot64,
    ];

    fn random_gates(count: usize) -> Vec<Gate> {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|row| Gate {
                gate_type: ALL_TYPES[rng.gen_range(0..ALL_TYPES.len())],
                wires: (0..7)
                    .map(|col| Wire {
                        row: if rng.gen_bool(0.5) { row } else { rng.gen_range(0..count) },
                        col: if rng.gen_bool(0.5) { col } else { rng.gen_range(0..7) },
                    })
                    .collect(),
                coeffs: (0..rng.gen_range(0..16))
                    .map(|_| field_to_string(Fr::rand(&mut rng)))
                    .collect(),
            })
            .collect()
    }

    #[test]
    fn type_names_match_serde_names() {
        for typ in ALL_TYPES {
            let json = serde_json::to_string(&typ).unwrap();
            assert_eq!(json, format!("\"{}\"", typ.name()));
        }
    }

    #[test]
    fn decodes_hex_coefficients_to_decimal() {
        let json = JsonConstraintSystem {
            gates: vec![JsonGate {
                typ: GateType::Generic,
                wires: vec![Wire { row: 0, col: 0 }],
                coeffs: vec![
                    field_to_hex(&Fr::one()).unwrap(),
                    field_to_hex(&-Fr::one()).unwrap(),
                ],
            }],
            public_input_size: 1,
        };
        let (gates, public_input_size) = gates_from_json::<Fr>(&json).unwrap();
        assert_eq!(public_input_size, 1);
        assert_eq!(gates[0].coeffs[0], "1");
        assert_eq!(gates[0].coeffs[1], field_to_string(-Fr::one()));
    }

    #[test]
    fn random_gate_lists_survive_encoding() {
        for count in [0, 1, 7, 40] {
            let gates = random_gates(count);
            let json = gates_to_json::<Fr>(&gates, 3).unwrap();
            let (decoded, public_input_size) = gates_from_json::<Fr>(&json).unwrap();
            assert_eq!(decoded, gates);
            assert_eq!(public_input_size, 3);
        }
    }

    #[test]
    fn exported_json_round_trips_byte_for_byte() {
        let json = gates_to_json::<Fr>(&random_gates(12), 2).unwrap();
        let text = serde_json::to_string(&json).unwrap();

        let parsed: JsonConstraintSystem = serde_json::from_str(&text).unwrap();
        let (gates, public_input_size) = gates_from_json::<Fr>(&parsed).unwrap();
        let again = gates_to_json::<Fr>(&gates, public_input_size).unwrap();

        assert_eq!(serde_json::to_string(&again).unwrap(), text);
    }

    #[test]
    fn accepts_type_as_an_alias_for_typ() {
        let text = r#"{"gates":[{"type":"Poseidon","wires":[],"coeffs":[]}],"public_input_size":0}"#;
        let parsed: JsonConstraintSystem = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.gates[0].typ, GateType::Poseidon);
        assert!(serde_json::to_string(&parsed).unwrap().contains("\"typ\":\"Poseidon\""));
    }
}
