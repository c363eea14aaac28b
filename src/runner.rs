//! The fixed-rate simulation loop: simulate, fuse, record, sleep.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{info, warn};

use crate::{
    clock::{Clock, MonotonicClock, SimulatedClock, Sleeper, TimeBase},
    complementary::FusionState,
    config::SimulationConfig,
    cycle::ClosedLoop,
    error::FusionError,
    logger::CycleSink,
    noise::{NoiseSource, UniformNoise},
    simulator::SensorSimulator,
};

/// A [`ClosedLoop`] whose clock and noise are chosen at runtime.
pub type DynClosedLoop = ClosedLoop<Box<dyn Clock>, Box<dyn NoiseSource>>;

/// Build the closed loop described by `config`.
///
/// # Errors
///
/// Fails if the configuration does not pass [`SimulationConfig::validate`].
pub fn closed_loop_from_config(config: &SimulationConfig) -> Result<DynClosedLoop, FusionError> {
    config.validate()?;

    let clock: Box<dyn Clock> = match config.time_base {
        TimeBase::WallClock => Box::new(MonotonicClock::start()),
        TimeBase::Simulated => Box::new(SimulatedClock::new()),
    };
    let noise: Box<dyn NoiseSource> = match config.seed {
        Some(seed) => Box::new(UniformNoise::seeded(seed)),
        None => Box::new(UniformNoise::from_entropy()),
    };

    let simulator = SensorSimulator::new(config.simulator.clone(), clock, noise)?;
    let state = FusionState::new(config.alpha, config.starting_angle)?;
    Ok(ClosedLoop::new(simulator, state))
}

/// Outcome of [`Runner::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Number of cycles that ran to completion.
    pub cycles_completed: u32,
    /// The filter output after the last completed cycle.
    pub final_angle: f32,
    /// Whether the run was stopped through the cancellation token.
    pub cancelled: bool,
}

/// Drives a [`ClosedLoop`] for a fixed number of cycles.
pub struct Runner<C, N, S> {
    closed_loop: ClosedLoop<C, N>,
    sleeper: S,
    period: Duration,
    sinks: Vec<Box<dyn CycleSink>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<C: Clock, N: NoiseSource, S: Sleeper> Runner<C, N, S> {
    /// Run `closed_loop` with a nominal cycle `period`, blocking on `sleeper`
    /// after each cycle.
    #[must_use]
    pub fn new(closed_loop: ClosedLoop<C, N>, period: Duration, sleeper: S) -> Self {
        Self {
            closed_loop,
            sleeper,
            period,
            sinks: Vec::new(),
            cancel: None,
        }
    }

    /// Send every cycle record to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: impl CycleSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Stop before the next cycle once `token` is set.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The loop being driven.
    #[must_use]
    pub fn closed_loop(&self) -> &ClosedLoop<C, N> {
        &self.closed_loop
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }

    /// Run `cycles` cycles, or fewer if cancelled, then finish every sink.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the loop or by a sink. Sinks are
    /// not finished after an error.
    pub fn run(&mut self, cycles: u32) -> Result<RunSummary, FusionError> {
        let dt = self.period.as_secs_f32();
        info!(
            "running {cycles} cycles, dt {dt} s, alpha {}",
            self.closed_loop.state().alpha()
        );

        let mut cancelled = false;
        for _ in 0..cycles {
            if self.is_cancelled() {
                warn!(
                    "run cancelled after {} of {cycles} cycles",
                    self.closed_loop.cycles()
                );
                cancelled = true;
                break;
            }

            let record = self.closed_loop.step(dt)?;
            for sink in &mut self.sinks {
                sink.record(&record)?;
            }
            self.sleeper.sleep(self.period);
        }

        for sink in &mut self.sinks {
            sink.finish()?;
        }

        let summary = RunSummary {
            cycles_completed: self.closed_loop.cycles(),
            final_angle: self.closed_loop.state().fused_angle(),
            cancelled,
        };
        info!(
            "finished {} cycles, final angle {:.4} deg",
            summary.cycles_completed, summary.final_angle
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{
        clock::NoDelay, cycle::CycleRecord, noise::ZeroNoise, simulator::SimulatorParameters,
    };

    #[derive(Clone, Default)]
    struct Collect(Rc<RefCell<Vec<CycleRecord>>>);

    impl CycleSink for Collect {
        fn record(&mut self, record: &CycleRecord) -> Result<(), FusionError> {
            self.0.borrow_mut().push(*record);
            Ok(())
        }
    }

    /// Counts sleeps and cancels the run after `limit` of them.
    struct CancelAfter {
        limit: u32,
        slept: u32,
        token: Arc<AtomicBool>,
    }

    impl Sleeper for CancelAfter {
        fn sleep(&mut self, _period: Duration) {
            self.slept += 1;
            if self.slept >= self.limit {
                self.token.store(true, Ordering::Relaxed);
            }
        }
    }

    fn at_rest(alpha: f32) -> ClosedLoop<SimulatedClock, ZeroNoise> {
        let simulator = SensorSimulator::new(
            SimulatorParameters::ideal_at_rest(),
            SimulatedClock::new(),
            ZeroNoise,
        )
        .unwrap();
        ClosedLoop::new(simulator, FusionState::new(alpha, 0.0).unwrap())
    }

    #[test]
    fn records_every_cycle_in_order() {
        let records = Collect::default();
        let mut runner = Runner::new(at_rest(0.98), Duration::from_millis(100), NoDelay)
            .with_sink(records.clone());

        let summary = runner.run(25).unwrap();

        assert_eq!(summary.cycles_completed, 25);
        assert!(!summary.cancelled);
        let records = records.0.borrow();
        assert_eq!(records.len(), 25);
        assert!(records.iter().zip(1..).all(|(r, i)| r.cycle == i));
    }

    #[test]
    fn cancellation_stops_before_next_cycle() {
        let token = Arc::new(AtomicBool::new(false));
        let sleeper = CancelAfter {
            limit: 3,
            slept: 0,
            token: Arc::clone(&token),
        };
        let mut runner = Runner::new(at_rest(0.98), Duration::from_millis(100), sleeper)
            .with_cancellation(token);

        let summary = runner.run(100).unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.cycles_completed, 3);
    }

    #[test]
    fn config_builds_a_reproducible_loop() {
        let config = SimulationConfig {
            time_base: TimeBase::Simulated,
            seed: Some(99),
            ..SimulationConfig::default()
        };

        let mut a = closed_loop_from_config(&config).unwrap();
        let mut b = closed_loop_from_config(&config).unwrap();
        for _ in 0..20 {
            assert_eq!(a.step(config.dt()).unwrap(), b.step(config.dt()).unwrap());
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimulationConfig {
            alpha: 2.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            closed_loop_from_config(&config),
            Err(FusionError::InvalidAlpha(_))
        ));
    }
}
