//! Failure outcomes of a simulation request.
//!
//! Unknown modes and unknown override keys are not errors; they are resolved
//! by ignoring them. Everything that does surface here is fatal for the request.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Simulation settings outside their domain (`t_end`, `n_points`).
    #[error("Invalid simulation settings: {0}")]
    InvalidSettings(String),
    /// Initial state length does not match the system dimension.
    #[error("Initial state dimension mismatch. Expected {expected}, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },
    /// The adaptive solver could not advance within tolerance.
    #[error("Solver failed ({scenario} scenario): {message}")]
    Integration { scenario: String, message: String },
}

impl SimulationError {
    pub(crate) fn integration(message: impl Into<String>) -> Self {
        SimulationError::Integration {
            scenario: String::new(),
            message: message.into(),
        }
    }

    pub(crate) fn in_scenario(self, scenario: &str) -> Self {
        match self {
            SimulationError::Integration { message, .. } => SimulationError::Integration {
                scenario: scenario.to_string(),
                message,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::SimulationError;

    #[test]
    fn integration_error_is_tagged_with_scenario() {
        let err = SimulationError::integration("step size underflow").in_scenario("treated");
        assert_eq!(
            err.to_string(),
            "Solver failed (treated scenario): step size underflow"
        );
    }

    #[test]
    fn in_scenario_leaves_other_variants_alone() {
        let err = SimulationError::InvalidSettings("t_end must be positive".into());
        assert_eq!(err.clone().in_scenario("control"), err);
    }
}
