//! The circuit graph and the fixed-point propagation that settles it

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use log::debug;
use crate::prelude::*;
use crate::graphics;

/// Monotonic, never reused while the circuit is alive
pub type GateId = u64;

/// Placed instance of a catalog device
#[derive(Clone, Debug, PartialEq)]
pub struct Gate {
	pub id: GateId,
	pub kind: GateKind,
	/// World position of the top-left corner
	pub position: V2,
	pub inputs: Vec<bool>,
	pub outputs: Vec<bool>,
	pub state: GateState
}

impl Gate {
	pub fn new(id: GateId, kind: GateKind, position: V2) -> Self {
		Self {
			id,
			kind,
			position,
			inputs: vec![false; kind.input_count()],
			outputs: vec![false; kind.output_count()],
			state: GateState::for_kind(kind)
		}
	}
	pub fn def(&self) -> &'static GateTypeDef {
		self.kind.def()
	}
	pub fn input(&self, index: usize) -> bool {
		self.inputs.get(index).copied().unwrap_or(false)
	}
	pub fn output(&self, index: usize) -> bool {
		self.outputs.get(index).copied().unwrap_or(false)
	}
	pub fn port_value(&self, side: PortSide, index: usize) -> bool {
		match side {
			PortSide::Input => self.input(index),
			PortSide::Output => self.output(index)
		}
	}
	/// Runs the gate's logic once over its current inputs, returns whether any output changed
	pub fn evaluate(&mut self) -> bool {
		let writes = self.kind.evaluate(&self.inputs, &mut self.state);
		let mut changed = false;
		for (slot, write) in self.outputs.iter_mut().zip(writes) {
			if let Some(value) = write {
				if *slot != value {
					*slot = value;
					changed = true;
				}
			}
		}
		changed
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
	pub gate_id: GateId,
	pub port_index: usize
}

impl PortRef {
	pub fn new(gate_id: GateId, port_index: usize) -> Self {
		Self {
			gate_id,
			port_index
		}
	}
}

/// Wire from an output port to an input port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
	pub from: PortRef,
	pub to: PortRef
}

impl Connection {
	pub fn new(from: PortRef, to: PortRef) -> Self {
		Self {
			from,
			to
		}
	}
	pub fn touches(&self, gate_id: GateId) -> bool {
		self.from.gate_id == gate_id || self.to.gate_id == gate_id
	}
}

/// A port of either kind, what the user grabs when wiring
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
	pub gate_id: GateId,
	pub side: PortSide,
	pub index: usize
}

impl Endpoint {
	pub fn new(gate_id: GateId, side: PortSide, index: usize) -> Self {
		Self {
			gate_id,
			side,
			index
		}
	}
	pub fn port_ref(&self) -> PortRef {
		PortRef::new(self.gate_id, self.index)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireRejection {
	SameGate,
	/// Input to input or output to output
	SamePortKind,
	MissingGate(GateId),
	PortOutOfRange(PortRef)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireOutcome {
	Added,
	/// The input was already driven, contains the connection that got removed
	Replaced(Connection),
	Rejected(WireRejection)
}

impl WireOutcome {
	pub fn changed(&self) -> bool {
		!matches!(self, Self::Rejected(_))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropagationReport {
	pub rounds: usize,
	/// False when the round cap was hit before a quiet round
	pub converged: bool
}

impl Default for PropagationReport {
	fn default() -> Self {
		Self {
			rounds: 0,
			converged: true
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Circuit {
	/// Insertion order is evaluation order
	pub gates: Vec<Gate>,
	pub connections: Vec<Connection>,
	pub next_id: GateId
}

impl Circuit {
	pub fn new() -> Self {
		Self {
			gates: Vec::new(),
			connections: Vec::new(),
			next_id: INITIAL_GATE_ID
		}
	}
	pub fn gate(&self, id: GateId) -> Option<&Gate> {
		self.gates.iter().find(|gate| gate.id == id)
	}
	pub fn gate_mut(&mut self, id: GateId) -> Option<&mut Gate> {
		self.gates.iter_mut().find(|gate| gate.id == id)
	}
	pub fn contains_gate(&self, id: GateId) -> bool {
		self.gate(id).is_some()
	}
	pub fn gates_of_kind(&self, kind: GateKind) -> impl Iterator<Item = &Gate> + '_ {
		self.gates.iter().filter(move |gate| gate.kind == kind)
	}
	/// Places a new gate with zeroed ports and default state, position is snapped to the grid
	pub fn add_gate(&mut self, kind: GateKind, position: V2, grid_size: f32) -> GateId {
		let id = self.next_id;
		self.next_id += 1;
		self.gates.push(Gate::new(id, kind, graphics::snap_to_grid(position, grid_size)));
		id
	}
	/// Inserts an already built gate, used when loading, returns false if the ID is taken or out of range
	pub fn insert_gate(&mut self, gate: Gate) -> bool {
		if gate.id > MAX_GATE_ID || self.contains_gate(gate.id) {
			return false;
		}
		self.next_id = self.next_id.max(gate.id + 1);
		self.gates.push(gate);
		true
	}
	/// Removes the gate and every connection touching it, returns false if there was no such gate
	pub fn remove_gate(&mut self, id: GateId) -> bool {
		let count_before = self.gates.len();
		self.gates.retain(|gate| gate.id != id);
		if self.gates.len() == count_before {
			return false;
		}
		self.connections.retain(|conn| !conn.touches(id));
		true
	}
	/// Connects two ports in whichever order they were picked
	pub fn connect(&mut self, a: Endpoint, b: Endpoint) -> WireOutcome {
		let (from, to) = match (a.side, b.side) {
			(PortSide::Output, PortSide::Input) => (a, b),
			(PortSide::Input, PortSide::Output) => (b, a),
			_ => {
				if a.gate_id == b.gate_id {
					return WireOutcome::Rejected(WireRejection::SameGate);
				}
				return WireOutcome::Rejected(WireRejection::SamePortKind);
			}
		};
		self.add_connection(Connection::new(from.port_ref(), to.port_ref()))
	}
	/// Adds a wire, if the target input is already driven that wire is replaced
	pub fn add_connection(&mut self, conn: Connection) -> WireOutcome {
		if let Err(rejection) = self.validate_connection(&conn) {
			debug!("Rejected wire {:?}: {:?}", conn, rejection);
			return WireOutcome::Rejected(rejection);
		}
		let previous = self.connections.iter().position(|existing| existing.to == conn.to);
		match previous {
			Some(i) => {
				let replaced = self.connections.remove(i);
				self.connections.push(conn);
				WireOutcome::Replaced(replaced)
			},
			None => {
				self.connections.push(conn);
				WireOutcome::Added
			}
		}
	}
	fn validate_connection(&self, conn: &Connection) -> Result<(), WireRejection> {
		if conn.from.gate_id == conn.to.gate_id {
			return Err(WireRejection::SameGate);
		}
		let source = self.gate(conn.from.gate_id).ok_or(WireRejection::MissingGate(conn.from.gate_id))?;
		let target = self.gate(conn.to.gate_id).ok_or(WireRejection::MissingGate(conn.to.gate_id))?;
		if conn.from.port_index >= source.outputs.len() {
			return Err(WireRejection::PortOutOfRange(conn.from));
		}
		if conn.to.port_index >= target.inputs.len() {
			return Err(WireRejection::PortOutOfRange(conn.to));
		}
		Ok(())
	}
	pub fn remove_connection(&mut self, conn: &Connection) -> bool {
		match self.connections.iter().position(|existing| existing == conn) {
			Some(i) => {
				self.connections.remove(i);
				true
			},
			None => false
		}
	}
	/// The wire driving an input, if any
	pub fn driver_of(&self, input: PortRef) -> Option<&Connection> {
		self.connections.iter().find(|conn| conn.to == input)
	}
	pub fn connections_touching(&self, id: GateId) -> impl Iterator<Item = &Connection> + '_ {
		self.connections.iter().filter(move |conn| conn.touches(id))
	}
	/// Empties the circuit and restarts ID allocation
	pub fn clear(&mut self) {
		self.gates.clear();
		self.connections.clear();
		self.next_id = INITIAL_GATE_ID;
	}
	/// Sets the stored bit of an INPUT or CLOCK gate, does not propagate
	pub fn set_source_level(&mut self, id: GateId, value: bool) -> crate::error::Result<()> {
		let gate = self.gate_mut(id).ok_or(SimError::UnknownGate(id))?;
		if !gate.kind.is_source() {
			return Err(SimError::WrongGateKind {
				id,
				expected: "INPUT or CLOCK",
				actual: gate.kind
			});
		}
		gate.state = GateState::Level(LevelState {value});
		Ok(())
	}
	/// Flips every CLOCK gate's stored bit, returns how many there were
	pub fn toggle_clocks(&mut self) -> usize {
		let mut count = 0;
		for gate in self.gates.iter_mut().filter(|gate| gate.kind == GateKind::Clock) {
			let value = gate.state.level().unwrap_or(false);
			gate.state = GateState::Level(LevelState {value: !value});
			count += 1;
		}
		count
	}
	/// Bounding box of all gate bodies in world coordinates
	pub fn bounds(&self, grid_size: f32) -> Option<(V2, V2)> {
		merge_points_to_bb(self.gates.iter().flat_map(|gate| {
			let (min, max) = graphics::gate_bounds(gate, grid_size);
			[min, max]
		}).collect())
	}
	/// Settles the circuit by naive fixed-point iteration
	/// Every non-INPUT gate's inputs are zeroed first, then each round copies every wire's source output into its target input and evaluates every gate once in insertion order
	/// Stops at the first round where nothing changed, or after `max_rounds`
	pub fn propagate(&mut self, max_rounds: usize) -> PropagationReport {
		for gate in self.gates.iter_mut().filter(|gate| gate.kind != GateKind::Input) {
			gate.inputs.fill(false);
		}
		let index: HashMap<GateId, usize> = self.gates.iter().enumerate().map(|(i, gate)| (gate.id, i)).collect();
		let mut report = PropagationReport {
			rounds: 0,
			converged: false
		};
		while report.rounds < max_rounds {
			report.rounds += 1;
			let mut changed = false;
			for conn in self.connections.iter() {
				let (Some(&source_i), Some(&target_i)) = (index.get(&conn.from.gate_id), index.get(&conn.to.gate_id)) else {
					continue;
				};
				let value = self.gates[source_i].output(conn.from.port_index);
				if let Some(slot) = self.gates[target_i].inputs.get_mut(conn.to.port_index) {
					if *slot != value {
						*slot = value;
						changed = true;
					}
				}
			}
			for gate in self.gates.iter_mut() {
				changed |= gate.evaluate();
			}
			if !changed {
				report.converged = true;
				break;
			}
		}
		if report.converged {
			debug!("Propagation settled after {} rounds", report.rounds);
		}
		else {
			debug!("Propagation hit the {} round cap without settling", max_rounds);
		}
		report
	}
}

impl Default for Circuit {
	fn default() -> Self {
		Self::new()
	}
}
