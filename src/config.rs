//! Simulation and editor tuning, loaded from /resources/config.json

use serde::{Deserialize, Serialize};
use crate::prelude::*;
#[cfg(feature = "using_filesystem")]
use crate::{error::Result, resource_interface};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
	/// Cap on fixed-point rounds per propagation
	pub max_propagation_rounds: usize,
	pub history_limit: usize,
	/// World units per grid cell
	pub grid_size: f32,
	pub clock_period_ms: u64,
	pub scope_sample_period_ms: u64,
	pub scope_capacity: usize,
	pub flow_spawn_period_ms: u64,
	/// Wire lengths per second
	pub flow_packet_speed: f32,
	pub min_zoom: f32,
	pub max_zoom: f32,
	/// World units
	pub port_hit_radius: f32,
	/// Screen pixels a wire drag can move and still count as a click
	pub click_wire_threshold: f32
}

impl SimConfig {
	#[cfg(feature = "using_filesystem")]
	pub fn load() -> Result<Self> {
		let raw_string: String = load_file_with_better_error(resource_interface::CONFIG_FILE)?;
		Ok(Self::from_json(&raw_string)?)
	}
	/// Missing fields take their defaults
	pub fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
		serde_json::from_str(raw)
	}
}

impl Default for SimConfig {
	fn default() -> Self {
		Self {
			max_propagation_rounds: DEFAULT_MAX_PROPAGATION_ROUNDS,
			history_limit: DEFAULT_HISTORY_LIMIT,
			grid_size: 20.0,
			clock_period_ms: 1000,
			scope_sample_period_ms: 20,
			scope_capacity: 500,
			flow_spawn_period_ms: 300,
			flow_packet_speed: 1.5,
			min_zoom: 0.1,
			max_zoom: 5.0,
			port_hit_radius: 8.0,
			click_wire_threshold: 4.0
		}
	}
}
