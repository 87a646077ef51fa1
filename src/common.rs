/// Initial source level of the reference dialogue
pub static DEFAULT_SOURCE: f64 = 1.028842;

/// Initial noise level of the reference dialogue
pub static DEFAULT_NOISE: f64 = 0.0669942;

/// Source growth rate
pub static DEFAULT_ALPHA: f64 = 0.1;

/// Source self-limitation
pub static DEFAULT_BETA: f64 = 0.015;

/// Noise growth rate
pub static DEFAULT_GAMMA: f64 = 0.2;

/// Noise self-limitation
pub static DEFAULT_DELTA: f64 = 0.02;

/// Source volatility
pub static DEFAULT_SIGMA_X: f64 = 0.3;

/// Noise volatility
pub static DEFAULT_SIGMA_Y: f64 = 0.15;

/// Words sent by the source
pub static DEFAULT_WORD_COUNT: i64 = 7;

/// Words decoded by the receiver
pub static DEFAULT_RECEIVER_WORD_COUNT: i64 = 7;

/// Integration time step
pub static DEFAULT_DT: f64 = 0.01;
