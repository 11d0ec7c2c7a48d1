use ark_ff::{BigInteger, One, PrimeField, Zero};
use ark_serialize::{CanonicalSerialize, SerializationError};
use num_bigint::BigUint;

use crate::error::ProvableError;

pub fn field_to_biguint<F: PrimeField>(f: F) -> BigUint {
    BigUint::from_bytes_le(&f.into_repr().to_bytes_le())
}

pub fn field_to_string<F: PrimeField>(f: F) -> String {
    field_to_biguint(f).to_string()
}

pub fn modulus<F: PrimeField>() -> BigUint {
    field_to_biguint(-F::one()) + 1u32
}

/// Length in bytes of a serialized field element.
pub fn field_byte_width<F: PrimeField>() -> usize {
    F::zero().serialized_size()
}

/// Fixed-width little-endian hex, the coefficient encoding of the gate JSON.
pub fn field_to_hex<F: PrimeField>(f: &F) -> Result<String, SerializationError> {
    let mut bytes = Vec::with_capacity(field_byte_width::<F>());
    f.serialize(&mut bytes)?;
    Ok(hex::encode(bytes))
}

pub fn hex_to_decimal<F: PrimeField>(encoded: &str) -> Result<String, ProvableError> {
    let invalid = |reason| ProvableError::InvalidCoefficient {
        coefficient: encoded.to_string(),
        reason,
    };
    let bytes = hex::decode(encoded).map_err(|_| invalid("not a hex string"))?;
    if bytes.len() != field_byte_width::<F>() {
        return Err(invalid("wrong width for a field element"));
    }
    Ok(BigUint::from_bytes_le(&bytes).to_string())
}

pub fn decimal_to_hex<F: PrimeField>(decimal: &str) -> Result<String, ProvableError> {
    let invalid = |reason| ProvableError::InvalidCoefficient {
        coefficient: decimal.to_string(),
        reason,
    };
    let value = BigUint::parse_bytes(decimal.as_bytes(), 10)
        .ok_or_else(|| invalid("not a decimal string"))?;
    let width = field_byte_width::<F>();
    let mut bytes = value.to_bytes_le();
    if bytes.len() > width {
        return Err(invalid("too large for a field element"));
    }
    bytes.resize(width, 0);
    Ok(hex::encode(bytes))
}
