use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Geometry error: {0}")]
    GeometryError(String),

    #[error("Chamber pressure out of burn rate bounds: {:.2} MPa", .pressure * 1e-6)]
    BurnRateOutOfBounds { pressure: f64 },

    #[error("Numerical divergence in {subsystem} at t = {time:.4} s (d_t = {step} s): {state}")]
    NumericalDivergence {
        subsystem: &'static str,
        time: f64,
        step: f64,
        state: String,
    },

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SimulationError {
    /// Name of the subsystem that raised the error.
    pub fn subsystem(&self) -> &'static str {
        match self {
            SimulationError::GeometryError(_) => "grain",
            SimulationError::BurnRateOutOfBounds { .. } => "propellant",
            SimulationError::NumericalDivergence { subsystem, .. } => subsystem,
            SimulationError::InitializationError(_) => "simulation",
            SimulationError::ConfigError(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burn_rate_message_reports_megapascals() {
        let err = SimulationError::BurnRateOutOfBounds { pressure: 12.5e6 };
        assert_eq!(
            err.to_string(),
            "Chamber pressure out of burn rate bounds: 12.50 MPa"
        );
        assert_eq!(err.subsystem(), "propellant");
    }

    #[test]
    fn test_divergence_names_subsystem() {
        let err = SimulationError::NumericalDivergence {
            subsystem: "chamber",
            time: 0.25,
            step: 0.5,
            state: "P0 = -1.0 Pa".to_string(),
        };
        assert_eq!(err.subsystem(), "chamber");
        assert!(err.to_string().contains("d_t = 0.5 s"));
    }
}
