//! Human-readable gate listings.
//!
//! Coefficients near the top of the field are shown as small negative
//! numbers, long numbers are cut to four characters, and wires are listed
//! only when they connect to another slot.

use std::fmt::{self, Write};

use ark_ff::PrimeField;
use num_bigint::{BigInt, BigUint, Sign};

use crate::gate::{Gate, GateType, Wire};
use crate::utils::modulus;

const SHOWN_CHARS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateFormatter {
    modulus: BigInt,
    /// Coefficients above this are shown as `c - p`.
    minus_range: BigInt,
}

impl GateFormatter {
    pub fn new(modulus: BigUint) -> Self {
        let modulus = BigInt::from_biguint(Sign::Plus, modulus);
        let minus_range = &modulus - (BigInt::from(1u8) << 64);
        Self {
            modulus,
            minus_range,
        }
    }

    pub fn for_field<F: PrimeField>() -> Self {
        Self::new(modulus::<F>())
    }

    pub fn print_gates(&self, gates: &[Gate]) {
        print!("{}", self.format_gates(gates));
    }

    /// One line per gate followed by a blank line.
    pub fn format_gates(&self, gates: &[Gate]) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_gates(&mut out, gates);
        out
    }

    pub fn write_gates<W: Write>(&self, out: &mut W, gates: &[Gate]) -> fmt::Result {
        for (row, gate) in gates.iter().enumerate() {
            writeln!(out, "{}", self.format_row(row, gate))?;
        }
        writeln!(out)
    }

    pub fn format_row(&self, row: usize, gate: &Gate) -> String {
        format!(
            "{:<4} {:<15} {:<30} {}",
            row,
            gate.gate_type.name(),
            self.coeffs_to_pretty(gate.gate_type, &gate.coeffs),
            wires_to_pretty(&gate.wires, row)
        )
    }

    pub fn coeffs_to_pretty(&self, gate_type: GateType, coeffs: &[String]) -> String {
        if coeffs.is_empty() {
            return String::new();
        }
        if gate_type == GateType::Generic && coeffs.len() > 5 {
            let (first, rest) = coeffs.split_at(5);
            return format!(
                "{} {}",
                self.coeffs_to_pretty(gate_type, first),
                self.coeffs_to_pretty(gate_type, rest)
            );
        }
        if gate_type == GateType::Poseidon && coeffs.len() > 3 {
            let mut head = self.coeffs_to_pretty(gate_type, &coeffs[..3]);
            head.pop();
            return format!("{} ...]", head);
        }
        let shown: Vec<String> = coeffs.iter().map(|c| self.coeff_to_pretty(c)).collect();
        format!("[{}]", shown.join(" "))
    }

    fn coeff_to_pretty(&self, coeff: &str) -> String {
        let text = match coeff.parse::<BigInt>() {
            Ok(value) if value > self.minus_range => (value - &self.modulus).to_string(),
            Ok(value) => value.to_string(),
            Err(_) => coeff.to_string(),
        };
        if text.chars().count() > SHOWN_CHARS {
            format!("{}..", text.chars().take(SHOWN_CHARS).collect::<String>())
        } else {
            text
        }
    }
}

/// Connected wires of the gate at `row`, as `col->col` within the row and
/// `col->(row,col)` across rows.
pub fn wires_to_pretty(wires: &[Wire], row: usize) -> String {
    wires
        .iter()
        .enumerate()
        .filter(|(col, wire)| !(wire.row == row && wire.col == *col))
        .map(|(col, wire)| {
            if wire.row == row {
                format!("{}->{}", col, wire.col)
            } else {
                format!("{}->({},{})", col, wire.row, wire.col)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
