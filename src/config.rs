//! Run configuration for the simulation binary.

use std::{path::PathBuf, time::Duration};

use crate::{
    clock::TimeBase,
    error::{check_alpha, FusionError},
    simulator::SimulatorParameters,
};

/// Settings for a fixed-rate simulation run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// Complementary filter weight of the gyroscope path.
    pub alpha: f32,
    /// Initial fused angle, in degrees.
    pub starting_angle: f32,
    /// Length of the run, in seconds.
    pub duration_secs: u64,
    /// Nominal cycle period, in milliseconds.
    pub loop_delay_ms: u64,
    /// The time base for the simulated ground truth.
    pub time_base: TimeBase,
    /// Seed for reproducible noise. Process entropy is used when unset.
    pub seed: Option<u64>,
    /// Where to write the CSV log, if anywhere.
    pub csv_path: Option<PathBuf>,
    /// Colour the console output.
    pub color: bool,
    /// Parameters of the sensor simulator.
    pub simulator: SimulatorParameters,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha: 0.98,
            starting_angle: 0.0,
            duration_secs: 10,
            loop_delay_ms: 100,
            time_base: TimeBase::WallClock,
            seed: None,
            csv_path: Some(PathBuf::from("log.csv")),
            color: true,
            simulator: SimulatorParameters::default(),
        }
    }
}

impl SimulationConfig {
    /// The nominal cycle period.
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.loop_delay_ms)
    }

    /// The nominal cycle period in seconds, as used by the filter.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.period().as_secs_f32()
    }

    /// Number of cycles that fit into [`Self::duration_secs`].
    ///
    /// Returns `0` for a zero loop delay, which [`Self::validate`] rejects.
    #[must_use]
    pub fn total_cycles(&self) -> u32 {
        let total_ms = self.duration_secs.saturating_mul(1000);
        let cycles = total_ms.checked_div(self.loop_delay_ms).unwrap_or(0);
        u32::try_from(cycles).unwrap_or(u32::MAX)
    }

    /// Check that the configuration describes a runnable simulation.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidAlpha`] for a weight outside `[0, 1]`,
    /// [`FusionError::InvalidConfig`] for a zero loop delay or a non-finite
    /// starting angle, and [`FusionError::InvalidParameter`] for bad
    /// simulator parameters.
    pub fn validate(&self) -> Result<(), FusionError> {
        check_alpha(self.alpha)?;
        if self.loop_delay_ms == 0 {
            return Err(FusionError::InvalidConfig(
                "loop_delay_ms must be greater than zero".to_owned(),
            ));
        }
        if !self.starting_angle.is_finite() {
            return Err(FusionError::InvalidConfig(format!(
                "starting_angle must be finite, got {}",
                self.starting_angle
            )));
        }
        self.simulator.validate()
    }

    /// Parse a TOML document. Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Toml`] if the document is malformed.
    #[cfg(feature = "cli")]
    pub fn from_toml_str(source: &str) -> Result<Self, FusionError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Io`] if the file cannot be read and
    /// [`FusionError::Toml`] if it is malformed.
    #[cfg(feature = "cli")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, FusionError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
