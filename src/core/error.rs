use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl SimulationError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        SimulationError::InvalidParameter {
            name,
            value,
            reason,
        }
    }

    pub fn parameter(&self) -> &'static str {
        match self {
            SimulationError::InvalidParameter { name, .. } => name,
        }
    }
}
