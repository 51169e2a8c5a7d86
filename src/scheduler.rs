//! Cooperative periodic timers, driven by whoever owns the frame loop

use std::time::Duration;
use crate::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct PeriodicTimer {
	/// Seconds, 0 never fires
	period: f32,
	elapsed: f32
}

impl PeriodicTimer {
	pub fn new(period: Duration) -> Self {
		Self {
			period: period.as_secs_f32(),
			elapsed: 0.0
		}
	}
	pub fn from_millis(period_ms: u64) -> Self {
		Self::new(Duration::from_millis(period_ms))
	}
	/// Adds `dt` seconds, returns how many periods completed
	pub fn poll(&mut self, dt: f32) -> u32 {
		if self.period <= 0.0 || dt <= 0.0 {
			return 0;
		}
		self.elapsed += dt;
		let mut fires: u32 = 0;
		while self.elapsed >= self.period {
			self.elapsed -= self.period;
			fires += 1;
			if fires >= TIMER_MAX_CATCH_UP_FIRES {
				self.elapsed = 0.0;
				break;
			}
		}
		fires
	}
	pub fn reset(&mut self) {
		self.elapsed = 0.0;
	}
	pub fn period(&self) -> f32 {
		self.period
	}
}

/// The three independent periodic sources
#[derive(Clone, Debug)]
pub struct Timers {
	/// Flips CLOCK gates
	pub clock: PeriodicTimer,
	pub scope: PeriodicTimer,
	pub flow_spawn: PeriodicTimer
}

impl Timers {
	pub fn new(config: &SimConfig) -> Self {
		Self {
			clock: PeriodicTimer::from_millis(config.clock_period_ms),
			scope: PeriodicTimer::from_millis(config.scope_sample_period_ms),
			flow_spawn: PeriodicTimer::from_millis(config.flow_spawn_period_ms)
		}
	}
}
