//! Rank-correlation style metric shared by the feedback and receiver stages.

use crate::error::{Result, SimError};

/// Spearman-like correlation between `x` and `y` for a sample size `n`.
///
/// Computes `1 - 6 (y - x)^2 / (n (n^2 - 1))`. The denominator vanishes for
/// `n` in `{-1, 0, 1}`, which is reported as [`SimError::DivisionByZero`]
/// instead of letting an infinity or NaN escape.
pub fn correlation(x: f64, y: f64, n: i64) -> Result<f64> {
    let n = n as f64;
    let denominator = n * (n * n - 1.0);

    if denominator == 0.0 {
        return Err(SimError::DivisionByZero {
            context: "correlation sample size must not be -1, 0 or 1",
        });
    }

    let d = y - x;
    Ok(1.0 - 6.0 * d * d / denominator)
}
