use thiserror::Error;

/// Failures raised by the simulation core.
///
/// Every variant is a deterministic contract violation by the caller; none of
/// them are transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A denominator evaluated to zero.
    #[error("division by zero: {context}")]
    DivisionByZero {
        /// Where the zero denominator was found.
        context: &'static str,
    },

    /// A value left the domain of a function (e.g. `ln(0)`).
    #[error("domain error: {context}")]
    DomainError {
        /// Which function rejected its input.
        context: &'static str,
    },

    /// A numeric parameter is outside its accepted range.
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A configuration entry could not be parsed.
    #[error("invalid config value for {key}: {value:?}")]
    InvalidConfig {
        /// Configuration key.
        key: String,
        /// Raw value as found in the environment.
        value: String,
    },

    /// An environment file could not be read.
    #[error("failed to read environment file: {0}")]
    EnvFile(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SimError>;
