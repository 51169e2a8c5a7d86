//! Probe waveform recording and the signal-flow overlay
//! Both only read the circuit

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use crate::prelude::*;
use crate::graphics;

/// Every PROBE's stored value at one sampling instant
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScopeSample {
	pub values: BTreeMap<GateId, bool>
}

impl ScopeSample {
	pub fn capture(circuit: &Circuit) -> Self {
		Self {
			values: circuit.gates_of_kind(GateKind::Probe).map(|probe| (probe.id, probe.state.level().unwrap_or(false))).collect()
		}
	}
}

/// Ring buffer of samples, oldest evicted first
#[derive(Clone, Debug)]
pub struct Oscilloscope {
	samples: VecDeque<ScopeSample>,
	capacity: usize,
	paused: bool
}

impl Oscilloscope {
	pub fn new(capacity: usize) -> Self {
		Self {
			samples: VecDeque::with_capacity(capacity),
			capacity: capacity.max(1),
			paused: false
		}
	}
	/// Records the current probe values unless paused, returns whether a sample was taken
	pub fn sample(&mut self, circuit: &Circuit) -> bool {
		if self.paused {
			return false;
		}
		if self.samples.len() >= self.capacity {
			self.samples.pop_front();
		}
		self.samples.push_back(ScopeSample::capture(circuit));
		true
	}
	/// Stops sampling, buffered history is kept
	pub fn pause(&mut self) {
		self.paused = true;
	}
	pub fn resume(&mut self) {
		self.paused = false;
	}
	pub fn is_paused(&self) -> bool {
		self.paused
	}
	pub fn clear(&mut self) {
		self.samples.clear();
	}
	pub fn len(&self) -> usize {
		self.samples.len()
	}
	pub fn is_empty(&self) -> bool {
		self.samples.is_empty()
	}
	pub fn capacity(&self) -> usize {
		self.capacity
	}
	pub fn samples(&self) -> impl Iterator<Item = &ScopeSample> + '_ {
		self.samples.iter()
	}
	/// Oldest first, `None` where the probe did not exist yet or anymore
	pub fn trace(&self, probe: GateId) -> Vec<Option<bool>> {
		self.samples.iter().map(|sample| sample.values.get(&probe).copied()).collect()
	}
	/// Every probe appearing anywhere in the buffer
	pub fn probes(&self) -> BTreeSet<GateId> {
		self.samples.iter().flat_map(|sample| sample.values.keys().copied()).collect()
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowPacket {
	pub connection: Connection,
	/// 0 at the source port, 1 at the target port
	pub progress: f32
}

/// Cosmetic packets travelling along wires that currently carry a 1
#[derive(Clone, Debug)]
pub struct FlowAnimator {
	enabled: bool,
	packets: Vec<FlowPacket>,
	/// Wire lengths per second
	speed: f32
}

impl FlowAnimator {
	pub fn new(speed: f32) -> Self {
		Self {
			enabled: false,
			packets: Vec::new(),
			speed
		}
	}
	/// Disabling drops every packet in flight
	pub fn set_enabled(&mut self, enabled: bool) {
		self.enabled = enabled;
		if !enabled {
			self.clear();
		}
	}
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}
	pub fn clear(&mut self) {
		self.packets.clear();
	}
	pub fn packets(&self) -> &[FlowPacket] {
		&self.packets
	}
	/// Starts a packet at the source of every high wire, returns how many were added
	pub fn spawn(&mut self, circuit: &Circuit) -> usize {
		if !self.enabled {
			return 0;
		}
		let before = self.packets.len();
		for conn in circuit.connections.iter() {
			let high = circuit.gate(conn.from.gate_id).map(|gate| gate.output(conn.from.port_index)).unwrap_or(false);
			if high {
				self.packets.push(FlowPacket {
					connection: *conn,
					progress: 0.0
				});
			}
		}
		self.packets.len() - before
	}
	/// Moves packets along, dropping ones that arrived or whose wire is gone
	pub fn advance(&mut self, circuit: &Circuit, dt: f32) {
		let step = self.speed * dt;
		self.packets.retain_mut(|packet| {
			packet.progress += step;
			packet.progress < 1.0 && circuit.connections.contains(&packet.connection)
		});
	}
	/// World positions interpolated between the wire's two ports
	pub fn positions(&self, circuit: &Circuit, grid_size: f32) -> Vec<V2> {
		self.packets.iter().filter_map(|packet| {
			let (start, end) = graphics::connection_endpoints(circuit, &packet.connection, grid_size)?;
			Some(start + (end - start) * packet.progress.clamp(0.0, 1.0))
		}).collect()
	}
}
