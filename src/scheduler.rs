//! # Scheduler
//!
//! Drives [`Circuit::tick`] at a fixed cadence on the calling thread. All
//! mutation of the circuit happens between ticks, so no locking is needed;
//! the only shared piece is the stop flag.

use crate::circuit::Circuit;
use crate::config::SimulationConfig;
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Raised from anywhere to end [`Scheduler::run`] after the current tick.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Scheduler {
    period: Duration,
    stop: StopHandle,
    ticks_per_second: f64,
    last_tick: Option<Instant>,
}

impl Scheduler {
    pub fn new(config: &SimulationConfig) -> Self {
        Self::with_period(Duration::from_secs_f64(1.0 / config.tick_hz.max(1) as f64))
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            stop: StopHandle::default(),
            ticks_per_second: 0.0,
            last_tick: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Achieved tick rate, measured between the last two ticks.
    pub fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    /// Tick until the stop handle is raised. Returns the number of ticks run.
    pub fn run(&mut self, circuit: &mut Circuit) -> Result<u64> {
        tracing::info!("[SCHEDULER] Running every {:?}", self.period);
        let mut count = 0;
        while !self.stop.is_stopped() {
            self.step(circuit)?;
            count += 1;
        }
        tracing::info!("[SCHEDULER] Stopped after {} ticks", count);
        Ok(count)
    }

    /// Run exactly `n` paced ticks, unless stopped earlier.
    pub fn run_ticks(&mut self, circuit: &mut Circuit, n: u64) -> Result<u64> {
        let mut count = 0;
        while count < n && !self.stop.is_stopped() {
            self.step(circuit)?;
            count += 1;
        }
        Ok(count)
    }

    fn step(&mut self, circuit: &mut Circuit) -> Result<()> {
        let started = Instant::now();
        if let Some(last) = self.last_tick {
            let since = started.duration_since(last).as_secs_f64();
            if since > 0.0 {
                self.ticks_per_second = 1.0 / since;
            }
        }
        self.last_tick = Some(started);

        circuit.tick()?;
        if circuit.ticks() % 120 == 0 {
            tracing::debug!("[SCHEDULER] {:.0} ticks/s", self.ticks_per_second);
        }

        if let Some(rest) = self.period.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
        Ok(())
    }
}
