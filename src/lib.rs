//! A single-axis complementary filter that fuses a gyroscope rate with an
//! accelerometer angle, together with a closed-loop sensor simulator to
//! exercise it.
//!
//! The gyroscope is responsive but drifts, the accelerometer is stable but
//! noisy. The [`FusionState`] trusts the integrated gyroscope rate over short
//! horizons and the accelerometer over long horizons, weighted by `alpha`.
//!
//! # Example
//!
//! ```
//! use complementary_fusion::{
//!     clock::SimulatedClock, noise::ZeroNoise, ClosedLoop, FusionState, SensorSimulator,
//!     SimulatorParameters,
//! };
//!
//! let simulator = SensorSimulator::new(
//!     SimulatorParameters::ideal_at_rest(),
//!     SimulatedClock::new(),
//!     ZeroNoise,
//! )?;
//! let mut closed_loop = ClosedLoop::new(simulator, FusionState::new(0.98, 0.0)?);
//!
//! for _ in 0..100 {
//!     closed_loop.step(0.1)?;
//! }
//! assert_eq!(closed_loop.state().fused_angle(), 0.0);
//! # Ok::<(), complementary_fusion::FusionError>(())
//! ```

pub mod clock;
pub mod complementary;
pub mod config;
pub mod cycle;
mod error;
pub mod logger;
pub mod noise;
pub mod runner;
pub mod simulator;

pub use complementary::{init_fusion, update_fusion, FusionState};
pub use config::SimulationConfig;
pub use cycle::{closed_loop_cycle, ClosedLoop, CycleRecord};
pub use error::FusionError;
pub use noise::generate_noise;
pub use simulator::{
    mark_process_start, simulate_sensors, SensorReading, SensorSimulator, SimulatorParameters,
};
