//! The live editing session, owns the circuit and everything observing it
//! Every mutation runs propagation to completion before returning

use log::info;
use crate::prelude::*;
use crate::{cedar_xml, graphics, error::Result};

pub struct Session {
	circuit: Circuit,
	history: History,
	pub viewport: Viewport,
	pub scope: Oscilloscope,
	pub flow: FlowAnimator,
	timers: Timers,
	pub config: SimConfig,
	/// Whether `advance` flips CLOCK gates
	pub clock_running: bool,
	last_report: PropagationReport
}

impl Session {
	pub fn new(config: SimConfig) -> Self {
		let mut out = Self {
			circuit: Circuit::new(),
			history: History::new(config.history_limit),
			viewport: Viewport::new(config.min_zoom, config.max_zoom),
			scope: Oscilloscope::new(config.scope_capacity),
			flow: FlowAnimator::new(config.flow_packet_speed),
			timers: Timers::new(&config),
			config,
			clock_running: true,
			last_report: PropagationReport::default()
		};
		out.propagate();
		out.history.reset(&out.circuit);
		out
	}
	pub fn circuit(&self) -> &Circuit {
		&self.circuit
	}
	pub fn history(&self) -> &History {
		&self.history
	}
	pub fn last_report(&self) -> PropagationReport {
		self.last_report
	}
	pub fn propagate(&mut self) -> PropagationReport {
		self.last_report = self.circuit.propagate(self.config.max_propagation_rounds);
		self.last_report
	}
	/// Propagates and records the result as a new undo step
	fn commit(&mut self) {
		self.propagate();
		self.history.push(&self.circuit);
	}
	/// Swaps in a whole new circuit, undoable
	fn replace_circuit(&mut self, circuit: Circuit) {
		self.circuit = circuit;
		self.flow.clear();
		self.commit();
	}
	fn gate_of_kind(&mut self, id: GateId, kinds: &[GateKind], expected: &'static str) -> Result<&mut Gate> {
		let gate = self.circuit.gate_mut(id).ok_or(SimError::UnknownGate(id))?;
		if !kinds.contains(&gate.kind) {
			return Err(SimError::WrongGateKind {
				id,
				expected,
				actual: gate.kind
			});
		}
		Ok(gate)
	}
	pub fn add_gate(&mut self, kind: GateKind, position: V2) -> GateId {
		let id = self.circuit.add_gate(kind, position, self.config.grid_size);
		self.commit();
		id
	}
	pub fn remove_gate(&mut self, id: GateId) -> bool {
		let removed = self.circuit.remove_gate(id);
		if removed {
			self.commit();
		}
		removed
	}
	pub fn add_connection(&mut self, conn: Connection) -> WireOutcome {
		let outcome = self.circuit.add_connection(conn);
		if outcome.changed() {
			self.commit();
		}
		outcome
	}
	/// Wires two ports picked in either order
	pub fn connect(&mut self, a: Endpoint, b: Endpoint) -> WireOutcome {
		let outcome = self.circuit.connect(a, b);
		if outcome.changed() {
			self.commit();
		}
		outcome
	}
	pub fn remove_connection(&mut self, conn: &Connection) -> bool {
		let removed = self.circuit.remove_connection(conn);
		if removed {
			self.commit();
		}
		removed
	}
	/// Empties the canvas, undoable
	pub fn clear(&mut self) {
		self.circuit.clear();
		self.scope.clear();
		self.flow.clear();
		info!("Cleared circuit");
		self.commit();
	}
	/// Flips an INPUT gate, returns its new value
	pub fn toggle_input(&mut self, id: GateId) -> Result<bool> {
		let gate = self.gate_of_kind(id, &[GateKind::Input], "INPUT")?;
		let value = !gate.state.level().unwrap_or(false);
		self.set_input(id, value)?;
		Ok(value)
	}
	pub fn set_input(&mut self, id: GateId, value: bool) -> Result<()> {
		self.gate_of_kind(id, &[GateKind::Input], "INPUT")?;
		self.circuit.set_source_level(id, value)?;
		self.propagate();
		Ok(())
	}
	/// Replaces a ROM's contents from 8 hex digits, separators between them are ignored
	/// On any error the ROM is left as it was
	pub fn set_rom_contents(&mut self, id: GateId, text: &str) -> Result<()> {
		let words = parse_rom_hex(text)?;
		let gate = self.gate_of_kind(id, &[GateKind::Rom8x4], "ROM")?;
		match &mut gate.state {
			GateState::Memory(memory) => memory.memory = words,
			other => *other = GateState::Memory(MemoryState {
				memory: words,
				last_clk: false
			})
		}
		self.propagate();
		Ok(())
	}
	pub fn set_label_text(&mut self, id: GateId, text: &str) -> Result<()> {
		let gate = self.gate_of_kind(id, &[GateKind::Label], "LABEL")?;
		gate.state = GateState::Label(LabelState {text: text.to_owned()});
		self.commit();
		Ok(())
	}
	/// Moves a gate to a snapped position as one undo step, returns whether it actually moved
	pub fn move_gate(&mut self, id: GateId, position: V2) -> Result<bool> {
		let snapped = graphics::snap_to_grid(position, self.config.grid_size);
		let gate = self.circuit.gate_mut(id).ok_or(SimError::UnknownGate(id))?;
		if gate.position == snapped {
			return Ok(false);
		}
		gate.position = snapped;
		self.commit();
		Ok(true)
	}
	/// Unsnapped position while the pointer is dragging, not recorded
	pub fn drag_gate(&mut self, id: GateId, position: V2) -> Result<()> {
		let gate = self.circuit.gate_mut(id).ok_or(SimError::UnknownGate(id))?;
		gate.position = position;
		Ok(())
	}
	/// Snaps a dragged gate where it was dropped, recorded only if it ended up somewhere new
	pub fn finish_drag(&mut self, id: GateId, start_position: V2) -> Result<bool> {
		let grid_size = self.config.grid_size;
		let gate = self.circuit.gate_mut(id).ok_or(SimError::UnknownGate(id))?;
		gate.position = graphics::snap_to_grid(gate.position, grid_size);
		if gate.position == start_position {
			return Ok(false);
		}
		self.commit();
		Ok(true)
	}
	/// Flips every CLOCK and propagates
	pub fn tick_clock(&mut self) -> PropagationReport {
		self.circuit.toggle_clocks();
		self.propagate()
	}
	/// Runs the periodic sources for `dt` seconds of wall time
	pub fn advance(&mut self, dt: f32) {
		if self.clock_running {
			for _ in 0..self.timers.clock.poll(dt) {
				self.tick_clock();
			}
		}
		for _ in 0..self.timers.scope.poll(dt) {
			self.scope.sample(&self.circuit);
		}
		if self.flow.is_enabled() {
			for _ in 0..self.timers.flow_spawn.poll(dt) {
				self.flow.spawn(&self.circuit);
			}
		}
		self.flow.advance(&self.circuit, dt);
	}
	pub fn can_undo(&self) -> bool {
		self.history.can_undo()
	}
	pub fn can_redo(&self) -> bool {
		self.history.can_redo()
	}
	/// Reloads the previous snapshot wholesale
	pub fn undo(&mut self) -> bool {
		let Some(snapshot) = self.history.undo() else {
			return false;
		};
		self.circuit = snapshot.clone();
		self.propagate();
		true
	}
	pub fn redo(&mut self) -> bool {
		let Some(snapshot) = self.history.redo() else {
			return false;
		};
		self.circuit = snapshot.clone();
		self.propagate();
		true
	}
	pub fn save(&self) -> CircuitSave {
		CircuitSave::from_circuit(&self.circuit, Some(self.viewport.to_save()))
	}
	pub fn save_json(&self) -> Result<String> {
		self.save().to_json()
	}
	/// Replaces the circuit with a saved one, undoable
	pub fn load(&mut self, save: &CircuitSave) {
		let circuit = save.to_circuit();
		if let Some(view) = &save.view {
			self.viewport.apply_save(view);
		}
		self.replace_circuit(circuit);
	}
	/// A malformed file leaves everything untouched
	pub fn load_json(&mut self, raw: &str) -> Result<()> {
		let save = CircuitSave::from_json(raw)?;
		self.load(&save);
		Ok(())
	}
	pub fn export_cedar_xml(&self) -> Result<String> {
		cedar_xml::export(&self.circuit)
	}
	pub fn import_cedar_xml(&mut self, raw: &str) -> Result<ImportReport> {
		let (circuit, report) = cedar_xml::import(raw)?;
		self.replace_circuit(circuit);
		Ok(report)
	}
}

impl Default for Session {
	fn default() -> Self {
		Self::new(SimConfig::default())
	}
}

/// Exactly 8 hex digits, whitespace, commas and other separators between them are skipped
pub fn parse_rom_hex(text: &str) -> Result<[u8; MEMORY_WORDS]> {
	let mut words = [0_u8; MEMORY_WORDS];
	let mut count: usize = 0;
	for c in text.chars() {
		if c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '_' | '|') {
			continue;
		}
		let Some(digit) = c.to_digit(16) else {
			return Err(SimError::RomEdit(format!("'{}' is not a hex digit", c)));
		};
		if count >= MEMORY_WORDS {
			return Err(SimError::RomEdit(format!("expected {} digits, got more", MEMORY_WORDS)));
		}
		words[count] = digit as u8;
		count += 1;
	}
	if count != MEMORY_WORDS {
		return Err(SimError::RomEdit(format!("expected {} digits, got {}", MEMORY_WORDS, count)));
	}
	Ok(words)
}
