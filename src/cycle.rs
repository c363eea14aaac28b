//! One simulate-then-fuse step, with the filter output fed back into the
//! next simulation.

use std::time::Duration;

use log::debug;

use crate::{
    clock::Clock,
    complementary::FusionState,
    error::{check_time_step, FusionError},
    noise::NoiseSource,
    simulator::{SensorReading, SensorSimulator},
};

/// Everything produced by a single cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleRecord {
    /// 1-based index of the cycle.
    pub cycle: u32,
    /// The simulated sensor readings.
    pub reading: SensorReading,
    /// The filter output after fusing `reading`.
    pub fused_angle: f32,
}

/// Advance the closed loop by one cycle.
///
/// The simulator sees `state`'s fused angle from the previous cycle; the
/// returned state holds the new estimate. `state` itself is not modified.
///
/// # Errors
///
/// Returns [`FusionError::InvalidTimeStep`] if `dt` is not strictly positive.
pub fn closed_loop_cycle<C: Clock, N: NoiseSource>(
    simulator: &mut SensorSimulator<C, N>,
    state: FusionState,
    dt: f32,
) -> Result<(SensorReading, FusionState), FusionError> {
    let reading = simulator.simulate(state.fused_angle(), dt)?;
    let mut next = state;
    next.update(reading, dt)?;
    Ok((reading, next))
}

/// A sensor simulator and a complementary filter wired into a feedback loop.
#[derive(Debug, Clone)]
pub struct ClosedLoop<C, N> {
    simulator: SensorSimulator<C, N>,
    state: FusionState,
    cycles: u32,
}

impl<C: Clock, N: NoiseSource> ClosedLoop<C, N> {
    /// Wire `simulator` to a filter starting from `state`.
    #[must_use]
    pub fn new(simulator: SensorSimulator<C, N>, state: FusionState) -> Self {
        Self {
            simulator,
            state,
            cycles: 0,
        }
    }

    /// Run one cycle of length `dt` seconds and advance the clock by `dt`.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidTimeStep`] if `dt` is not strictly
    /// positive, and [`FusionError::TimeStepOutOfRange`] if it does not fit a
    /// [`Duration`] (above `u64::MAX` seconds). The loop is left unchanged in
    /// both cases.
    pub fn step(&mut self, dt: f32) -> Result<CycleRecord, FusionError> {
        check_time_step(dt)?;
        let period =
            Duration::try_from_secs_f32(dt).map_err(|_| FusionError::TimeStepOutOfRange(dt))?;

        let (reading, state) = closed_loop_cycle(&mut self.simulator, self.state, dt)?;
        self.state = state;
        self.cycles += 1;
        self.simulator.clock_mut().tick(period);

        debug!(
            "cycle {}: accel {:.3} deg, gyro {:.3} deg/s, fused {:.3} deg",
            self.cycles,
            reading.accel_angle,
            reading.gyro_rate,
            state.fused_angle()
        );

        Ok(CycleRecord {
            cycle: self.cycles,
            reading,
            fused_angle: state.fused_angle(),
        })
    }

    /// The current filter state.
    #[must_use]
    pub fn state(&self) -> &FusionState {
        &self.state
    }

    /// Number of completed cycles.
    #[must_use]
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// The simulator feeding the filter.
    #[must_use]
    pub fn simulator(&self) -> &SensorSimulator<C, N> {
        &self.simulator
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{clock::SimulatedClock, noise::ZeroNoise, simulator::SimulatorParameters};

    fn noiseless_loop(alpha: f32) -> ClosedLoop<SimulatedClock, ZeroNoise> {
        let parameters = SimulatorParameters {
            accel_noise_amplitude: 0.0,
            gyro_noise_amplitude: 0.0,
            gyro_bias: 0.0,
            ..SimulatorParameters::default()
        };
        let simulator =
            SensorSimulator::new(parameters, SimulatedClock::new(), ZeroNoise).unwrap();
        ClosedLoop::new(simulator, FusionState::new(alpha, 0.0).unwrap())
    }

    #[test]
    fn cycle_is_a_pure_function_of_its_inputs() {
        let parameters = SimulatorParameters {
            accel_noise_amplitude: 0.0,
            gyro_noise_amplitude: 0.0,
            ..SimulatorParameters::default()
        };
        let mut simulator =
            SensorSimulator::new(parameters, SimulatedClock::at(Duration::from_secs(1)), ZeroNoise)
                .unwrap();
        let state = FusionState::new(0.9, 4.0).unwrap();

        let first = closed_loop_cycle(&mut simulator, state, 0.1).unwrap();
        let second = closed_loop_cycle(&mut simulator, state, 0.1).unwrap();

        assert_eq!(first, second);
        assert_eq!(state.fused_angle(), 4.0);
    }

    #[test]
    fn fused_angle_is_fed_back() {
        let mut closed_loop = noiseless_loop(0.98);
        closed_loop.step(0.1).unwrap();
        let previous = closed_loop.state().fused_angle();

        let truth = closed_loop.simulator().true_angle();
        let record = closed_loop.step(0.1).unwrap();

        assert_relative_eq!(
            record.reading.gyro_rate,
            (truth - previous) / 0.1,
            epsilon = 1e-3
        );
        assert_eq!(record.cycle, 2);
        assert_eq!(closed_loop.cycles(), 2);
    }

    #[test]
    fn noiseless_loop_tracks_ground_truth() {
        let mut closed_loop = noiseless_loop(0.98);

        for _ in 0..100 {
            let truth = closed_loop.simulator().true_angle();
            let record = closed_loop.step(0.1).unwrap();
            // the gyro rate integrates exactly onto the truth, so does the blend
            assert_relative_eq!(record.fused_angle, truth, epsilon = 1e-3);
        }
    }

    #[test]
    fn simulated_clock_advances_per_cycle() {
        let mut closed_loop = noiseless_loop(0.98);
        for _ in 0..10 {
            closed_loop.step(0.1).unwrap();
        }
        let elapsed = closed_loop.simulator().clock().elapsed().as_secs_f32();
        assert_relative_eq!(elapsed, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn invalid_dt_does_not_count_a_cycle() {
        let mut closed_loop = noiseless_loop(0.98);
        assert!(closed_loop.step(0.0).is_err());
        assert_eq!(closed_loop.cycles(), 0);
        assert_eq!(closed_loop.simulator().clock().elapsed(), Duration::ZERO);
    }

    #[test]
    fn oversized_dt_is_out_of_range() {
        let mut closed_loop = noiseless_loop(0.98);
        assert!(matches!(
            closed_loop.step(1e20),
            Err(FusionError::TimeStepOutOfRange(_))
        ));
        assert_eq!(closed_loop.cycles(), 0);
        assert_eq!(closed_loop.state().fused_angle(), 0.0);
    }
}
