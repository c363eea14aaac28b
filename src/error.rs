//! Error type shared by the filter, the simulator and the output sinks.

use thiserror::Error;

/// Errors produced by [`crate`] operations.
///
/// The numeric core has no recoverable failure modes, every variant except
/// [`FusionError::Io`] (and `Toml` with the `cli` feature) reports a violated
/// precondition rather than producing a meaningless angle.
#[derive(Debug, Error)]
pub enum FusionError {
    /// The filter weight is outside `[0, 1]`, which inverts the trust balance
    /// between gyroscope and accelerometer.
    #[error("alpha must be within [0, 1], got {0}")]
    InvalidAlpha(f32),
    /// The cycle period is zero, negative or not finite.
    #[error("time step must be finite and strictly positive, got {0} s")]
    InvalidTimeStep(f32),
    /// The cycle period is valid for the filter but too long to advance a
    /// clock by, i.e. above `u64::MAX` seconds.
    #[error("time step of {0} s exceeds the representable clock range")]
    TimeStepOutOfRange(f32),
    /// A simulator parameter is not usable.
    #[error("invalid simulator parameter `{name}`: {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },
    /// The run configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Writing cycle output failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed.
    #[cfg(feature = "cli")]
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Check that `dt` is usable as a cycle period.
pub(crate) fn check_time_step(dt: f32) -> Result<(), FusionError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(FusionError::InvalidTimeStep(dt))
    }
}

/// Check that `alpha` is a valid filter weight.
pub(crate) fn check_alpha(alpha: f32) -> Result<(), FusionError> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(FusionError::InvalidAlpha(alpha))
    }
}
