use serde::{Deserialize, Serialize};

/// Options for [`CircuitRunner::generate_witness`](crate::runner::CircuitRunner::generate_witness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WitnessOptions {
    /// Check every gate while the witness is generated. Turning this off
    /// speeds up generation but lets unsatisfiable circuits through.
    pub check_constraints: bool,
}

impl Default for WitnessOptions {
    fn default() -> Self {
        Self {
            check_constraints: true,
        }
    }
}

impl WitnessOptions {
    pub fn unchecked() -> Self {
        Self {
            check_constraints: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checks_are_on_by_default() {
        assert!(WitnessOptions::default().check_constraints);
        let parsed: WitnessOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, WitnessOptions::default());
        let parsed: WitnessOptions = serde_json::from_str(r#"{"check_constraints":false}"#).unwrap();
        assert_eq!(parsed, WitnessOptions::unchecked());
    }
}
