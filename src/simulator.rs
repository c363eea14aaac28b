//! Synthetic gyroscope and accelerometer readings.
//!
//! The ground truth is a sine wave in time. The simulated gyroscope rate is
//! derived from the difference between that ground truth and the filter's
//! *previous output*, not the previous ground truth, which closes the loop
//! between sensor and filter.

use std::{sync::OnceLock, time::Instant};

use crate::{
    clock::{Clock, MonotonicClock},
    error::{check_time_step, FusionError},
    noise::{NoiseSource, UniformNoise},
};

/// One cycle's worth of raw sensor data.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorReading {
    /// Absolute angle reported by the accelerometer, in degrees.
    pub accel_angle: f32,
    /// Angular rate reported by the gyroscope, in degrees per second.
    pub gyro_rate: f32,
}

/// Parameters of the simulated trajectory and sensor imperfections.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulatorParameters {
    /// Amplitude $A$ of the ground-truth sine wave, in degrees.
    pub amplitude: f32,
    /// Angular frequency $\omega$ of the ground-truth sine wave, in rad/s.
    pub angular_frequency: f32,
    /// Maximum accelerometer noise, in degrees.
    pub accel_noise_amplitude: f32,
    /// Maximum gyroscope noise, in degrees per second.
    pub gyro_noise_amplitude: f32,
    /// Constant gyroscope drift, in degrees per second.
    pub gyro_bias: f32,
}

impl Default for SimulatorParameters {
    fn default() -> Self {
        Self {
            amplitude: 30.0,
            angular_frequency: 0.5,
            accel_noise_amplitude: 2.0,
            gyro_noise_amplitude: 0.5,
            gyro_bias: 0.1,
        }
    }
}

impl SimulatorParameters {
    /// Parameters for a perfect, motionless sensor: no trajectory, no noise
    /// and no bias.
    #[must_use]
    pub fn ideal_at_rest() -> Self {
        Self {
            amplitude: 0.0,
            angular_frequency: 0.0,
            accel_noise_amplitude: 0.0,
            gyro_noise_amplitude: 0.0,
            gyro_bias: 0.0,
        }
    }

    /// Reject non-finite values and negative noise amplitudes.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidParameter`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), FusionError> {
        let finite = [
            ("amplitude", self.amplitude),
            ("angular_frequency", self.angular_frequency),
            ("gyro_bias", self.gyro_bias),
        ];
        let amplitudes = [
            ("accel_noise_amplitude", self.accel_noise_amplitude),
            ("gyro_noise_amplitude", self.gyro_noise_amplitude),
        ];

        for (name, value) in finite {
            if !value.is_finite() {
                return Err(FusionError::InvalidParameter { name, value });
            }
        }
        for (name, value) in amplitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(FusionError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Generates noisy readings that follow a sinusoidal ground truth.
#[derive(Debug, Clone)]
pub struct SensorSimulator<C, N> {
    parameters: SimulatorParameters,
    clock: C,
    noise: N,
}

impl<C: Clock, N: NoiseSource> SensorSimulator<C, N> {
    /// Create a simulator from validated parameters.
    ///
    /// # Errors
    ///
    /// Fails if [`SimulatorParameters::validate`] does.
    pub fn new(parameters: SimulatorParameters, clock: C, noise: N) -> Result<Self, FusionError> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            clock,
            noise,
        })
    }

    /// The ground-truth angle $A \sin(\omega t)$ at the clock's current time,
    /// in degrees.
    #[must_use]
    pub fn true_angle(&self) -> f32 {
        let t = self.clock.elapsed().as_secs_f32();
        self.parameters.amplitude * (self.parameters.angular_frequency * t).sin()
    }

    /// Produce the readings for one cycle.
    ///
    /// `previous_fused_angle` is the filter output of the previous cycle, or
    /// the starting angle before the first cycle.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidTimeStep`] if `dt` is not strictly
    /// positive.
    pub fn simulate(
        &mut self,
        previous_fused_angle: f32,
        dt: f32,
    ) -> Result<SensorReading, FusionError> {
        check_time_step(dt)?;

        let true_angle = self.true_angle();
        let accel_angle =
            true_angle + self.noise.generate_noise(self.parameters.accel_noise_amplitude);

        let gyro_true_rate = (true_angle - previous_fused_angle) / dt;
        let gyro_rate = gyro_true_rate
            + self.noise.generate_noise(self.parameters.gyro_noise_amplitude)
            + self.parameters.gyro_bias;

        Ok(SensorReading {
            accel_angle,
            gyro_rate,
        })
    }

    /// The simulation parameters.
    #[must_use]
    pub fn parameters(&self) -> &SimulatorParameters {
        &self.parameters
    }

    /// The clock driving the ground truth.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable access to the clock, used to advance simulated time.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Fix the origin of the ground-truth time used by [`simulate_sensors`] and
/// return it.
///
/// Call this first thing in `main` so that `t` is measured from process
/// start. Later calls return the origin already set. Without it the origin
/// is taken lazily on the first [`simulate_sensors`] call, which then sees
/// `t = 0`.
pub fn mark_process_start() -> Instant {
    *PROCESS_START.get_or_init(Instant::now)
}

/// Simulate one reading with the default parameters, wall-clock time since
/// [`mark_process_start`], and thread-local entropy.
///
/// # Errors
///
/// Returns [`FusionError::InvalidTimeStep`] if `dt` is not strictly positive.
pub fn simulate_sensors(previous_fused_angle: f32, dt: f32) -> Result<SensorReading, FusionError> {
    let mut simulator = SensorSimulator::new(
        SimulatorParameters::default(),
        MonotonicClock::from_origin(mark_process_start()),
        UniformNoise::from_entropy(),
    )?;
    simulator.simulate(previous_fused_angle, dt)
}
