use std::cell::{Cell, RefCell};
use crate::prelude::*;
use crate::{builtin_components::decode_bits, cedar_xml, graphics::{self, DrawInterface}, interaction, session::parse_rom_hex};

fn eval(kind: GateKind, inputs: &[bool]) -> Vec<bool> {
	let mut state = GateState::for_kind(kind);
	kind.evaluate(inputs, &mut state).into_iter().map(|v| v.unwrap_or(false)).collect()
}

fn eval_with(kind: GateKind, inputs: &[bool], state: &mut GateState) -> Vec<bool> {
	kind.evaluate(inputs, state).into_iter().map(|v| v.unwrap_or(false)).collect()
}

/// LSB-first
fn bits(value: u8, count: usize) -> Vec<bool> {
	(0..count).map(|i| (value >> i) & 1 == 1).collect()
}

fn outputs_value(outputs: &[bool]) -> u8 {
	decode_bits(outputs, 0, outputs.len())
}

fn close(a: V2, b: V2) -> bool {
	(a - b).norm() < 1e-3
}

#[test]
fn catalog_is_indexed_by_kind() {
	for (i, kind) in GateKind::ALL.iter().enumerate() {
		assert_eq!(*kind as usize, i);
		assert_eq!(kind.def().kind, *kind);
		assert_eq!(GateKind::from_name(kind.name()), Some(*kind));
		if let PortLayout::Custom{inputs, outputs} = &kind.def().layout {
			assert_eq!(inputs.len(), kind.input_count());
			assert_eq!(outputs.len(), kind.output_count());
		}
	}
}

#[test]
fn port_counts() {
	assert_eq!((GateKind::And.input_count(), GateKind::And.output_count()), (2, 1));
	assert_eq!((GateKind::Not.input_count(), GateKind::Not.output_count()), (1, 1));
	assert_eq!((GateKind::FullAdder.input_count(), GateKind::FullAdder.output_count()), (3, 2));
	assert_eq!((GateKind::Mux4.input_count(), GateKind::Mux4.output_count()), (6, 1));
	assert_eq!((GateKind::Alu4.input_count(), GateKind::Alu4.output_count()), (10, 5));
	assert_eq!((GateKind::Ram8x4.input_count(), GateKind::Ram8x4.output_count()), (9, 4));
	assert_eq!((GateKind::Cpu.input_count(), GateKind::Cpu.output_count()), (6, 9));
	assert_eq!((GateKind::Probe.input_count(), GateKind::Probe.output_count()), (1, 0));
	assert_eq!((GateKind::Label.input_count(), GateKind::Label.output_count()), (0, 0));
	// Select lines sit on the bottom edge
	assert_eq!(GateKind::Mux4.def().port_offset(PortSide::Input, 4), Some(V2::new(1.5, 6.0)));
	assert_eq!(GateKind::And.def().port_offset(PortSide::Output, 0), Some(V2::new(3.0, 1.0)));
	assert_eq!(GateKind::And.def().port_offset(PortSide::Input, 2), None);
}

#[test]
fn gate_names_and_aliases() {
	assert_eq!(GateKind::from_name("and"), Some(GateKind::And));
	assert_eq!(GateKind::from_name("MUX_4_1"), Some(GateKind::Mux4));
	assert_eq!(GateKind::from_name("dff"), Some(GateKind::DFlipFlop));
	assert_eq!(GateKind::from_name("counter"), Some(GateKind::Counter4));
	assert_eq!(GateKind::from_name("WIDGET"), None);
}

#[test]
fn two_input_truth_tables() {
	for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
		assert_eq!(eval(GateKind::And, &[a, b]), vec![a && b]);
		assert_eq!(eval(GateKind::Or, &[a, b]), vec![a || b]);
		assert_eq!(eval(GateKind::Nand, &[a, b]), vec![!(a && b)]);
		assert_eq!(eval(GateKind::Nor, &[a, b]), vec![!(a || b)]);
		assert_eq!(eval(GateKind::Xor, &[a, b]), vec![a != b]);
		assert_eq!(eval(GateKind::Xnor, &[a, b]), vec![a == b]);
	}
	assert_eq!(eval(GateKind::Not, &[false]), vec![true]);
	assert_eq!(eval(GateKind::Not, &[true]), vec![false]);
	// Unconnected inputs read as 0
	assert_eq!(eval(GateKind::Nand, &[]), vec![true]);
}

#[test]
fn adders_match_integer_sum() {
	for a in 0..2_u8 {
		for b in 0..2_u8 {
			let out = eval(GateKind::HalfAdder, &[a == 1, b == 1]);
			assert_eq!(out[0] as u8 + 2 * out[1] as u8, a + b);
			for c in 0..2_u8 {
				let out = eval(GateKind::FullAdder, &[a == 1, b == 1, c == 1]);
				assert_eq!(out[0] as u8 + 2 * out[1] as u8, a + b + c);
			}
		}
	}
}

#[test]
fn d_flip_flop_latches_on_rising_edge_only() {
	let kind = GateKind::DFlipFlop;
	let mut state = GateState::for_kind(kind);
	assert_eq!(eval_with(kind, &[true, false], &mut state), vec![false, true]);
	assert_eq!(eval_with(kind, &[true, true], &mut state), vec![true, false]);
	// Clock held high, D changes: hold
	assert_eq!(eval_with(kind, &[false, true], &mut state), vec![true, false]);
	assert_eq!(eval_with(kind, &[false, true], &mut state), vec![true, false]);
	assert_eq!(eval_with(kind, &[false, false], &mut state), vec![true, false]);
	assert_eq!(eval_with(kind, &[false, true], &mut state), vec![false, true]);
}

#[test]
fn jk_flip_flop() {
	let kind = GateKind::JkFlipFlop;
	let mut state = GateState::for_kind(kind);
	let edge = |j: bool, k: bool, state: &mut GateState| {
		eval_with(kind, &[j, k, false], state);
		eval_with(kind, &[j, k, true], state)[0]
	};
	assert_eq!(edge(true, false, &mut state), true);
	assert_eq!(edge(false, false, &mut state), true);
	assert_eq!(edge(true, true, &mut state), false);
	assert_eq!(edge(true, true, &mut state), true);
	assert_eq!(edge(false, true, &mut state), false);
}

#[test]
fn counter_counts_and_resets() {
	let kind = GateKind::Counter4;
	let mut state = GateState::for_kind(kind);
	for n in 1..=20_u8 {
		eval_with(kind, &[false, false], &mut state);
		let out = eval_with(kind, &[true, false], &mut state);
		assert_eq!(outputs_value(&out), n % 16);
	}
	assert_eq!(outputs_value(&eval_with(kind, &[false, true], &mut state)), 0);
	assert_eq!(outputs_value(&eval_with(kind, &[true, true], &mut state)), 0);
	// Released while the clock is already high, no edge yet
	assert_eq!(outputs_value(&eval_with(kind, &[true, false], &mut state)), 0);
	assert_eq!(outputs_value(&eval_with(kind, &[false, false], &mut state)), 0);
	assert_eq!(outputs_value(&eval_with(kind, &[true, false], &mut state)), 1);
}

#[test]
fn mux_and_demux() {
	let data = [false, true, true, false];
	for select in 0..4_u8 {
		let mut inputs = data.to_vec();
		inputs.extend(bits(select, 2));
		assert_eq!(eval(GateKind::Mux4, &inputs), vec![data[select as usize]]);
		let mut inputs = vec![true];
		inputs.extend(bits(select, 2));
		let out = eval(GateKind::Demux4, &inputs);
		assert_eq!(out, (0..4).map(|i| i == select as usize).collect::<Vec<bool>>());
	}
}

fn alu(a: u8, b: u8, op: u8) -> (u8, bool) {
	let mut inputs = bits(a, 4);
	inputs.extend(bits(b, 4));
	inputs.extend(bits(op, 2));
	let out = eval(GateKind::Alu4, &inputs);
	(outputs_value(&out[0..4]), out[4])
}

#[test]
fn alu_operations() {
	assert_eq!(alu(3, 1, 0), (4, false));
	assert_eq!(alu(3, 1, 1), (2, false));
	assert_eq!(alu(15, 1, 0), (0, true));
	assert_eq!(alu(1, 3, 1), (14, false));
	assert_eq!(alu(0b1100, 0b1010, 2), (0b1000, false));
	assert_eq!(alu(0b1100, 0b1010, 3), (0b1110, false));
}

#[test]
fn ram_writes_on_clock_edge_and_reads_asynchronously() {
	let kind = GateKind::Ram8x4;
	let mut state = GateState::for_kind(kind);
	let ram_inputs = |address: u8, data: u8, we: bool, clk: bool| {
		let mut inputs = bits(address, 3);
		inputs.extend(bits(data, 4));
		inputs.push(we);
		inputs.push(clk);
		inputs
	};
	assert_eq!(outputs_value(&eval_with(kind, &ram_inputs(5, 0b1010, true, false), &mut state)), 0);
	assert_eq!(outputs_value(&eval_with(kind, &ram_inputs(5, 0b1010, true, true), &mut state)), 0b1010);
	// Write disabled
	eval_with(kind, &ram_inputs(5, 0b0001, false, false), &mut state);
	assert_eq!(outputs_value(&eval_with(kind, &ram_inputs(5, 0b0001, false, true), &mut state)), 0b1010);
	assert_eq!(outputs_value(&eval_with(kind, &ram_inputs(4, 0, false, true), &mut state)), 0);
	assert_eq!(state.memory().map(|m| m[5]), Some(0b1010));
}

#[test]
fn rom_default_contents() {
	for address in 0..8_u8 {
		assert_eq!(outputs_value(&eval(GateKind::Rom8x4, &bits(address, 3))), address);
	}
}

#[test]
fn register_latches_when_enabled() {
	let kind = GateKind::Register4;
	let mut state = GateState::for_kind(kind);
	let reg_inputs = |data: u8, clk: bool, en: bool| {
		let mut inputs = bits(data, 4);
		inputs.push(clk);
		inputs.push(en);
		inputs
	};
	eval_with(kind, &reg_inputs(9, true, false), &mut state);
	assert_eq!(outputs_value(&eval_with(kind, &reg_inputs(9, false, true), &mut state)), 0);
	assert_eq!(outputs_value(&eval_with(kind, &reg_inputs(9, true, true), &mut state)), 9);
	assert_eq!(outputs_value(&eval_with(kind, &reg_inputs(3, true, true), &mut state)), 9);
}

fn cpu_state(state: &GateState) -> CpuState {
	match state {
		GateState::Cpu(cpu) => cpu.clone(),
		other => panic!("expected CPU state, got {:?}", other)
	}
}

/// One full clock cycle with the data bus driven from `program` at the current address
fn cpu_edge(state: &mut GateState, program: &[u8; 16], rst: bool) -> Vec<bool> {
	let data_in = program[(cpu_state(state).address & NIBBLE_MASK) as usize];
	let mut inputs = bits(data_in, 4);
	inputs.extend([false, rst]);
	eval_with(GateKind::Cpu, &inputs, state);
	inputs[4] = true;
	eval_with(GateKind::Cpu, &inputs, state)
}

#[test]
fn cpu_runs_a_program() {
	// LDI 5, ADD 3, STA 9, JMP 0
	let program: [u8; 16] = [1, 5, 2, 3, 3, 9, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0];
	let mut state = GateState::for_kind(GateKind::Cpu);
	for _ in 0..3 {
		cpu_edge(&mut state, &program, false);
	}
	assert_eq!(cpu_state(&state).acc, 5);
	assert_eq!(cpu_state(&state).pc, 2);
	for _ in 0..3 {
		cpu_edge(&mut state, &program, false);
	}
	assert_eq!(cpu_state(&state).acc, 8);
	for _ in 0..2 {
		cpu_edge(&mut state, &program, false);
	}
	let out = cpu_edge(&mut state, &program, false);
	assert_eq!(outputs_value(&out[0..4]), 9);
	assert_eq!(outputs_value(&out[4..8]), 8);
	assert_eq!(out[8], true);
	assert_eq!(cpu_state(&state).phase, 3);
	let out = cpu_edge(&mut state, &program, false);
	assert_eq!(out[8], false);
	assert_eq!(cpu_state(&state).phase, 0);
	for _ in 0..3 {
		cpu_edge(&mut state, &program, false);
	}
	// Jumped back to 0
	assert_eq!(cpu_state(&state).pc, 0);
	assert_eq!(cpu_state(&state).phase, 0);
	cpu_edge(&mut state, &program, true);
	assert_eq!(cpu_state(&state), CpuState {last_clk: true, ..CpuState::default()});
}

#[test]
fn cpu_undefined_opcode_is_nop() {
	let program: [u8; 16] = [9, 7, 1, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
	let mut state = GateState::for_kind(GateKind::Cpu);
	for _ in 0..3 {
		cpu_edge(&mut state, &program, false);
	}
	assert_eq!(cpu_state(&state).acc, 0);
	assert_eq!(cpu_state(&state).pc, 2);
}

#[test]
fn hex_display_and_readouts() {
	let mut gate = Gate::new(1, GateKind::HexDisplay, V2::zeros());
	// Weights 8, 4, 2, 1
	gate.inputs = vec![true, false, true, false];
	gate.evaluate();
	assert_eq!(GateReadout::of(&gate), GateReadout::Nibble{value: 10, segments: 0x77});
	assert_eq!(GateReadout::of(&gate).to_text(), "A");
	let mut rom = Gate::new(2, GateKind::Rom8x4, V2::zeros());
	rom.inputs = bits(6, 3);
	assert_eq!(GateReadout::of(&rom), GateReadout::Word{address: 6, value: 6});
	let cpu = Gate::new(3, GateKind::Cpu, V2::zeros());
	assert_eq!(GateReadout::of(&cpu).to_text(), "PC:0 ACC:0 PH:0 OP:0");
	let mut label = Gate::new(4, GateKind::Label, V2::zeros());
	assert_eq!(label.evaluate(), false);
	assert_eq!(GateReadout::of(&label), GateReadout::Text(String::new()));
}

#[test]
fn saved_state_must_match_shape() {
	let restored = GateState::from_save(GateKind::Counter4, Some(&serde_json::json!({"count": 31, "lastClk": true})));
	assert_eq!(restored, GateState::Counter(CounterState{count: 15, last_clk: true}));
	let mismatched = GateState::from_save(GateKind::Counter4, Some(&serde_json::json!({"count": "nope"})));
	assert_eq!(mismatched, GateState::for_kind(GateKind::Counter4));
	assert_eq!(GateState::from_save(GateKind::Rom8x4, None).memory(), Some(&[0, 1, 2, 3, 4, 5, 6, 7]));
}

fn and_circuit() -> (Session, [GateId; 4]) {
	let mut session = Session::default();
	let a = session.add_gate(GateKind::Input, V2::new(0.0, 0.0));
	let b = session.add_gate(GateKind::Input, V2::new(0.0, 100.0));
	let and = session.add_gate(GateKind::And, V2::new(100.0, 0.0));
	let out = session.add_gate(GateKind::Output, V2::new(200.0, 0.0));
	session.add_connection(Connection::new(PortRef::new(a, 0), PortRef::new(and, 0)));
	session.add_connection(Connection::new(PortRef::new(b, 0), PortRef::new(and, 1)));
	session.add_connection(Connection::new(PortRef::new(and, 0), PortRef::new(out, 0)));
	(session, [a, b, and, out])
}

#[test]
fn and_gate_end_to_end() {
	let (mut session, [a, b, _, out]) = and_circuit();
	session.set_input(a, true).unwrap();
	session.set_input(b, true).unwrap();
	assert_eq!(session.circuit().gate(out).unwrap().state.level(), Some(true));
	assert_eq!(session.toggle_input(b).unwrap(), false);
	assert_eq!(session.circuit().gate(out).unwrap().state.level(), Some(false));
	assert!(session.last_report().converged);
	assert!(matches!(session.set_input(out, true), Err(SimError::WrongGateKind{..})));
	assert!(matches!(session.set_input(99, true), Err(SimError::UnknownGate(99))));
}

#[test]
fn sr_latch_settles() {
	let mut circuit = Circuit::new();
	let s = circuit.add_gate(GateKind::Input, V2::zeros(), 20.0);
	let r = circuit.add_gate(GateKind::Input, V2::zeros(), 20.0);
	let q = circuit.add_gate(GateKind::Nand, V2::zeros(), 20.0);
	let q_bar = circuit.add_gate(GateKind::Nand, V2::zeros(), 20.0);
	circuit.add_connection(Connection::new(PortRef::new(s, 0), PortRef::new(q, 0)));
	circuit.add_connection(Connection::new(PortRef::new(q_bar, 0), PortRef::new(q, 1)));
	circuit.add_connection(Connection::new(PortRef::new(r, 0), PortRef::new(q_bar, 0)));
	circuit.add_connection(Connection::new(PortRef::new(q, 0), PortRef::new(q_bar, 1)));
	let settle = |circuit: &mut Circuit, s_level: bool, r_level: bool| {
		circuit.set_source_level(s, s_level).unwrap();
		circuit.set_source_level(r, r_level).unwrap();
		let report = circuit.propagate(DEFAULT_MAX_PROPAGATION_ROUNDS);
		assert!(report.converged);
		(circuit.gate(q).unwrap().output(0), circuit.gate(q_bar).unwrap().output(0))
	};
	// Active-low set
	assert_eq!(settle(&mut circuit, false, true), (true, false));
	assert_eq!(settle(&mut circuit, true, true), (true, false));
	assert_eq!(settle(&mut circuit, true, false), (false, true));
	assert_eq!(settle(&mut circuit, true, true), (false, true));
	assert_eq!(settle(&mut circuit, false, false), (true, true));
}

#[test]
fn oscillator_hits_round_cap() {
	let mut circuit = Circuit::new();
	let ids: Vec<GateId> = (0..3).map(|_| circuit.add_gate(GateKind::Not, V2::zeros(), 20.0)).collect();
	for i in 0..3 {
		circuit.add_connection(Connection::new(PortRef::new(ids[i], 0), PortRef::new(ids[(i + 1) % 3], 0)));
	}
	assert_eq!(circuit.propagate(50), PropagationReport{rounds: 50, converged: false});
	assert_eq!(circuit.propagate(7), PropagationReport{rounds: 7, converged: false});
	assert_eq!(Circuit::new().propagate(50), PropagationReport{rounds: 1, converged: true});
}

#[test]
fn single_writer_per_input() {
	let mut circuit = Circuit::new();
	let a = circuit.add_gate(GateKind::Input, V2::zeros(), 20.0);
	let b = circuit.add_gate(GateKind::Input, V2::zeros(), 20.0);
	let and = circuit.add_gate(GateKind::And, V2::zeros(), 20.0);
	let first = Connection::new(PortRef::new(a, 0), PortRef::new(and, 0));
	assert_eq!(circuit.add_connection(first), WireOutcome::Added);
	assert_eq!(circuit.add_connection(Connection::new(PortRef::new(b, 0), PortRef::new(and, 0))), WireOutcome::Replaced(first));
	for source in [a, b, a, b] {
		for port in 0..2 {
			circuit.add_connection(Connection::new(PortRef::new(source, 0), PortRef::new(and, port)));
		}
	}
	let mut targets: Vec<PortRef> = circuit.connections.iter().map(|conn| conn.to).collect();
	let count = targets.len();
	targets.sort();
	targets.dedup();
	assert_eq!(targets.len(), count);
	assert_eq!(count, 2);
	assert_eq!(circuit.driver_of(PortRef::new(and, 0)).map(|conn| conn.from.gate_id), Some(b));
	assert_eq!(circuit.driver_of(PortRef::new(and, 1)).map(|conn| conn.from.gate_id), Some(b));
}

#[test]
fn invalid_wires_are_rejected() {
	let mut circuit = Circuit::new();
	let a = circuit.add_gate(GateKind::Input, V2::zeros(), 20.0);
	let and = circuit.add_gate(GateKind::And, V2::zeros(), 20.0);
	let not = circuit.add_gate(GateKind::Not, V2::zeros(), 20.0);
	assert_eq!(
		circuit.add_connection(Connection::new(PortRef::new(and, 0), PortRef::new(and, 1))),
		WireOutcome::Rejected(WireRejection::SameGate)
	);
	assert_eq!(
		circuit.connect(Endpoint::new(a, PortSide::Output, 0), Endpoint::new(not, PortSide::Output, 0)),
		WireOutcome::Rejected(WireRejection::SamePortKind)
	);
	assert_eq!(
		circuit.connect(Endpoint::new(and, PortSide::Input, 0), Endpoint::new(not, PortSide::Input, 0)),
		WireOutcome::Rejected(WireRejection::SamePortKind)
	);
	assert_eq!(
		circuit.add_connection(Connection::new(PortRef::new(a, 0), PortRef::new(and, 2))),
		WireOutcome::Rejected(WireRejection::PortOutOfRange(PortRef::new(and, 2)))
	);
	assert_eq!(
		circuit.add_connection(Connection::new(PortRef::new(a, 0), PortRef::new(42, 0))),
		WireOutcome::Rejected(WireRejection::MissingGate(42))
	);
	assert!(circuit.connections.is_empty());
	// Picked input first
	assert_eq!(circuit.connect(Endpoint::new(not, PortSide::Input, 0), Endpoint::new(a, PortSide::Output, 0)), WireOutcome::Added);
	assert_eq!(circuit.connections, vec![Connection::new(PortRef::new(a, 0), PortRef::new(not, 0))]);
}

#[test]
fn remove_gate_cascades() {
	let (mut session, [a, _, and, _]) = and_circuit();
	assert_eq!(session.circuit().connections_touching(and).count(), 3);
	assert_eq!(session.circuit().connections_touching(a).count(), 1);
	assert!(session.remove_gate(and));
	assert_eq!(session.circuit().connections_touching(and).count(), 0);
	assert!(session.circuit().connections.iter().all(|conn| !conn.touches(and)));
	assert!(session.circuit().connections.is_empty());
	assert!(!session.remove_gate(and));
	// IDs are never reused
	let next = session.add_gate(GateKind::Not, V2::zeros());
	assert_eq!(next, 5);
	assert!(session.circuit().contains_gate(a));
}

#[test]
fn undo_redo_round_trip() {
	let mut session = Session::default();
	let initial = session.circuit().clone();
	let a = session.add_gate(GateKind::Input, V2::new(0.0, 0.0));
	let not = session.add_gate(GateKind::Not, V2::new(100.0, 0.0));
	let out = session.add_gate(GateKind::Output, V2::new(200.0, 0.0));
	session.connect(Endpoint::new(a, PortSide::Output, 0), Endpoint::new(not, PortSide::Input, 0));
	session.connect(Endpoint::new(not, PortSide::Output, 0), Endpoint::new(out, PortSide::Input, 0));
	let after = session.circuit().clone();
	assert_eq!(after.gate(out).unwrap().state.level(), Some(true));
	for _ in 0..5 {
		assert!(session.undo());
	}
	assert!(!session.undo());
	assert_eq!(session.circuit(), &initial);
	for _ in 0..5 {
		assert!(session.redo());
	}
	assert!(!session.redo());
	assert_eq!(session.circuit(), &after);
	// A new action drops the redo branch
	session.undo();
	session.add_gate(GateKind::Probe, V2::zeros());
	assert!(!session.can_redo());
}

#[test]
fn history_evicts_oldest() {
	let mut history = History::new(3);
	let mut circuit = Circuit::new();
	for _ in 0..5 {
		circuit.add_gate(GateKind::And, V2::zeros(), 20.0);
		history.push(&circuit);
	}
	assert_eq!(history.len(), 3);
	assert_eq!(history.position(), 2);
	assert_eq!(history.current().map(|c| c.gates.len()), Some(5));
	assert_eq!(history.undo().map(|c| c.gates.len()), Some(4));
	assert_eq!(history.undo().map(|c| c.gates.len()), Some(3));
	assert!(history.undo().is_none());
	assert_eq!(history.redo().map(|c| c.gates.len()), Some(4));
	history.push(&Circuit::new());
	assert_eq!(history.len(), 3);
	assert!(!history.can_redo());
}

#[test]
fn clear_is_undoable() {
	let (mut session, _) = and_circuit();
	session.clear();
	assert!(session.circuit().gates.is_empty());
	assert_eq!(session.circuit().next_id, INITIAL_GATE_ID);
	assert!(session.undo());
	assert_eq!(session.circuit().gates.len(), 4);
	assert_eq!(session.circuit().connections.len(), 3);
}

#[test]
fn save_load_round_trip() {
	let mut session = Session::default();
	let input = session.add_gate(GateKind::Input, V2::new(0.0, 0.0));
	let clock = session.add_gate(GateKind::Clock, V2::new(0.0, 100.0));
	let ff = session.add_gate(GateKind::DFlipFlop, V2::new(100.0, 0.0));
	let rom = session.add_gate(GateKind::Rom8x4, V2::new(100.0, 200.0));
	let ram = session.add_gate(GateKind::Ram8x4, V2::new(200.0, 200.0));
	let out = session.add_gate(GateKind::Output, V2::new(200.0, 0.0));
	let xor = session.add_gate(GateKind::Xor, V2::new(300.0, 0.0));
	session.add_connection(Connection::new(PortRef::new(input, 0), PortRef::new(ff, 0)));
	session.add_connection(Connection::new(PortRef::new(input, 0), PortRef::new(xor, 0)));
	session.add_connection(Connection::new(PortRef::new(ff, 1), PortRef::new(xor, 1)));
	session.add_connection(Connection::new(PortRef::new(clock, 0), PortRef::new(ff, 1)));
	session.add_connection(Connection::new(PortRef::new(ff, 0), PortRef::new(out, 0)));
	session.add_connection(Connection::new(PortRef::new(rom, 0), PortRef::new(ram, 3)));
	session.set_rom_contents(rom, "FEDCBA98").unwrap();
	session.set_input(input, true).unwrap();
	let json = session.save_json().unwrap();
	let mut loaded = Session::default();
	loaded.load_json(&json).unwrap();
	let original = session.circuit();
	let copy = loaded.circuit();
	assert_eq!(copy.gates.len(), original.gates.len());
	for (a, b) in original.gates.iter().zip(copy.gates.iter()) {
		assert_eq!((a.id, a.kind, a.position), (b.id, b.kind, b.position));
	}
	assert_eq!(copy.connections, original.connections);
	assert_eq!(copy.next_id, original.next_id);
	assert_eq!(copy.gate(rom).unwrap().state.memory(), Some(&[15, 14, 13, 12, 11, 10, 9, 8]));
	assert_eq!(copy.gate(input).unwrap().state.level(), Some(true));
	assert_eq!(copy.gate(xor).unwrap().kind, GateKind::Xor);
	assert_eq!(copy.gate(xor).unwrap().outputs, original.gate(xor).unwrap().outputs);
}

#[test]
fn out_of_range_ids_are_rejected() {
	let (mut session, _) = and_circuit();
	let before = session.circuit().clone();
	let huge_gate = r#"{"gates": [{"id": 18446744073709551615, "type": "AND", "x": 0, "y": 0}], "connections": []}"#;
	assert!(matches!(session.load_json(huge_gate), Err(SimError::MalformedFile(_))));
	let huge_next = r#"{"gates": [], "connections": [], "nextId": 18446744073709551615}"#;
	assert!(matches!(session.load_json(huge_next), Err(SimError::MalformedFile(_))));
	assert_eq!(session.circuit(), &before);
	// Built in code rather than parsed, so only the circuit builder sees it
	let save = CircuitSave {
		gates: vec![
			GateSave::from_gate(&Gate::new(GateId::MAX, GateKind::And, V2::zeros())),
			GateSave::from_gate(&Gate::new(7, GateKind::Not, V2::zeros()))
		],
		connections: vec![Connection::new(PortRef::new(7, 0), PortRef::new(GateId::MAX, 0))],
		next_id: Some(GateId::MAX),
		view: None
	};
	session.load(&save);
	assert_eq!(session.circuit().gates.iter().map(|gate| gate.id).collect::<Vec<GateId>>(), vec![7]);
	assert!(session.circuit().connections.is_empty());
	assert_eq!(session.circuit().next_id, MAX_GATE_ID + 1);
}

#[test]
fn bundled_half_adder_circuit() {
	let mut session = Session::default();
	session.load_json(include_str!("../resources/circuits/half_adder.json")).unwrap();
	session.set_input(1, true).unwrap();
	session.set_input(2, true).unwrap();
	let level = |id: GateId| session.circuit().gate(id).unwrap().state.level();
	assert_eq!((level(4), level(5)), (Some(false), Some(true)));
	assert_eq!(session.circuit().next_id, 6);
}

#[test]
fn signals_saved_as_numbers() {
	let (mut session, [a, _, _, _]) = and_circuit();
	session.set_input(a, true).unwrap();
	let value = serde_json::to_value(session.save()).unwrap();
	assert_eq!(value["gates"][0]["type"], serde_json::json!("INPUT"));
	assert_eq!(value["gates"][0]["outputs"], serde_json::json!([1]));
	assert_eq!(value["gates"][2]["inputs"], serde_json::json!([1, 0]));
	assert_eq!(value["connections"][0]["from"], serde_json::json!({"gateId": 1, "portIndex": 0}));
	assert_eq!(value["nextId"], serde_json::json!(5));
}

#[test]
fn load_drops_unknown_gates_and_their_wires() {
	let raw = r#"{
		"gates": [
			{"id": 1, "type": "INPUT", "x": 0, "y": 0, "inputs": [], "outputs": [1], "state": {"value": true}},
			{"id": 2, "type": "WIDGET", "x": 0, "y": 0},
			{"id": 3, "type": "OUTPUT", "x": 100, "y": 0, "inputs": [true]}
		],
		"connections": [
			{"from": {"gateId": 1, "portIndex": 0}, "to": {"gateId": 2, "portIndex": 0}},
			{"from": {"gateId": 2, "portIndex": 0}, "to": {"gateId": 3, "portIndex": 0}},
			{"from": {"gateId": 1, "portIndex": 0}, "to": {"gateId": 3, "portIndex": 0}},
			{"from": {"gateId": 9, "portIndex": 0}, "to": {"gateId": 3, "portIndex": 0}}
		],
		"nextId": 2
	}"#;
	let mut session = Session::default();
	session.load_json(raw).unwrap();
	let circuit = session.circuit();
	assert_eq!(circuit.gates.iter().map(|gate| gate.id).collect::<Vec<GateId>>(), vec![1, 3]);
	assert_eq!(circuit.connections, vec![Connection::new(PortRef::new(1, 0), PortRef::new(3, 0))]);
	assert_eq!(circuit.next_id, 4);
	assert_eq!(circuit.gate(3).unwrap().state.level(), Some(true));
}

#[test]
fn malformed_file_leaves_session_untouched() {
	let (mut session, _) = and_circuit();
	let before = session.circuit().clone();
	assert!(matches!(session.load_json(r#"{"gates": []}"#), Err(SimError::MalformedFile(_))));
	assert!(matches!(session.load_json("not json"), Err(SimError::Json(_))));
	assert!(matches!(session.load_json(r#"{"gates": 3, "connections": []}"#), Err(SimError::MalformedFile(_))));
	assert_eq!(session.circuit(), &before);
}

#[test]
fn rom_edit() {
	assert_eq!(parse_rom_hex("7654 3210").unwrap(), [7, 6, 5, 4, 3, 2, 1, 0]);
	assert_eq!(parse_rom_hex("a,b,c,d,e,f,0,1").unwrap(), [10, 11, 12, 13, 14, 15, 0, 1]);
	let mut session = Session::default();
	let rom = session.add_gate(GateKind::Rom8x4, V2::zeros());
	let out = session.add_gate(GateKind::HexDisplay, V2::new(200.0, 0.0));
	for i in 0..4 {
		// HEX_DISPLAY input 0 has weight 8
		session.add_connection(Connection::new(PortRef::new(rom, i), PortRef::new(out, 3 - i)));
	}
	session.set_rom_contents(rom, "C0000000").unwrap();
	assert_eq!(GateReadout::of(session.circuit().gate(out).unwrap()), GateReadout::nibble(12));
	for bad in ["12345", "1234567G", "123456789"] {
		assert!(matches!(session.set_rom_contents(rom, bad), Err(SimError::RomEdit(_))));
	}
	assert_eq!(session.circuit().gate(rom).unwrap().state.memory(), Some(&[12, 0, 0, 0, 0, 0, 0, 0]));
	assert!(matches!(session.set_rom_contents(out, "00000000"), Err(SimError::WrongGateKind{..})));
}

#[test]
fn label_text() {
	let mut session = Session::default();
	let label = session.add_gate(GateKind::Label, V2::zeros());
	session.set_label_text(label, "adder").unwrap();
	assert_eq!(GateReadout::of(session.circuit().gate(label).unwrap()), GateReadout::Text("adder".to_owned()));
	assert!(session.undo());
	assert_eq!(GateReadout::of(session.circuit().gate(label).unwrap()), GateReadout::Text(String::new()));
}

#[test]
fn cedar_export_leaves_out_unsupported_types() {
	let mut circuit = Circuit::new();
	let input = circuit.add_gate(GateKind::Input, V2::new(0.0, 0.0), 20.0);
	let and = circuit.add_gate(GateKind::And, V2::new(100.0, 0.0), 20.0);
	let mux = circuit.add_gate(GateKind::Mux4, V2::new(100.0, 100.0), 20.0);
	circuit.add_connection(Connection::new(PortRef::new(input, 0), PortRef::new(and, 0)));
	circuit.add_connection(Connection::new(PortRef::new(input, 0), PortRef::new(mux, 0)));
	let xml = cedar_xml::export(&circuit).unwrap();
	assert!(xml.contains("<cedar-logic-circuit>"));
	assert!(xml.contains("type=\"AND2\""));
	assert!(xml.contains("type=\"TOGGLE\""));
	assert!(!xml.contains("MUX"));
	assert_eq!(xml.matches("<connection ").count(), 1);
	assert_eq!(xml.matches("<component ").count(), 2);
}

#[test]
fn cedar_import_renumbers_and_skips() {
	let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<cedar-logic-circuit>
  <component id="10" type="AND3" x="100" y="0"/>
  <component id="20" type="TOGGLE" x="0" y="0"/>
  <component id="30" type="LED" x="200" y="0"/>
  <component id="40" type="FOO" x="0" y="100"/>
  <connection from_gate="20" from_pin="0" to_gate="10" to_pin="0"/>
  <connection from_gate="10" from_pin="0" to_gate="30" to_pin="0"/>
  <connection from_gate="40" from_pin="0" to_gate="30" to_pin="0"/>
</cedar-logic-circuit>"#;
	let (circuit, report) = cedar_xml::import(xml).unwrap();
	assert_eq!(
		circuit.gates.iter().map(|gate| (gate.id, gate.kind)).collect::<Vec<_>>(),
		vec![(1, GateKind::And), (2, GateKind::Input), (3, GateKind::Output)]
	);
	assert_eq!(circuit.gate(1).unwrap().position, V2::new(100.0, 0.0));
	assert_eq!(circuit.connections, vec![
		Connection::new(PortRef::new(2, 0), PortRef::new(1, 0)),
		Connection::new(PortRef::new(1, 0), PortRef::new(3, 0))
	]);
	assert_eq!(circuit.next_id, 4);
	assert_eq!(report.gates_imported, 3);
	assert_eq!(report.connections_imported, 2);
	assert_eq!(report.warnings.len(), 2);
	assert!(matches!(cedar_xml::import("<something-else/>"), Err(SimError::MalformedFile(_))));
}

#[test]
fn cedar_import_skips_duplicate_ids() {
	let xml = r#"<cedar-logic-circuit>
  <component id="5" type="TOGGLE" x="0" y="0"/>
  <component id="5" type="LED" x="100" y="0"/>
  <component id="6" type="LED" x="100" y="100"/>
  <connection from_gate="5" from_pin="0" to_gate="6" to_pin="0"/>
</cedar-logic-circuit>"#;
	let (circuit, report) = cedar_xml::import(xml).unwrap();
	assert_eq!(
		circuit.gates.iter().map(|gate| (gate.id, gate.kind)).collect::<Vec<_>>(),
		vec![(1, GateKind::Input), (2, GateKind::Output)]
	);
	assert_eq!(circuit.connections, vec![Connection::new(PortRef::new(1, 0), PortRef::new(2, 0))]);
	assert_eq!(report.warnings.len(), 1);
}

#[test]
fn cedar_round_trip_through_session() {
	let (session, _) = and_circuit();
	let xml = session.export_cedar_xml().unwrap();
	let mut other = Session::default();
	let report = other.import_cedar_xml(&xml).unwrap();
	assert!(report.warnings.is_empty());
	let kinds = |s: &Session| s.circuit().gates.iter().map(|gate| gate.kind).collect::<Vec<GateKind>>();
	assert_eq!(kinds(&other), kinds(&session));
	assert_eq!(other.circuit().connections, session.circuit().connections);
	assert!(other.can_undo());
}

#[test]
fn viewport_pan_and_zoom() {
	let mut view = Viewport::new(0.1, 5.0);
	view.pan(V2::new(30.0, -10.0));
	let anchor = V2::new(200.0, 150.0);
	let world_before = view.screen_to_world(anchor);
	view.zoom_at(anchor, 2.0);
	assert!(close(view.screen_to_world(anchor), world_before));
	view.zoom_at(anchor, 100.0);
	assert_eq!(view.zoom, 5.0);
	view.zoom_at(anchor, 0.0001);
	assert_eq!(view.zoom, 0.1);
	assert!(close(view.screen_to_world(anchor), world_before));
	let p = V2::new(12.5, -40.0);
	assert!(close(view.screen_to_world(view.world_to_screen(p)), p));
	let mut restored = Viewport::new(0.1, 5.0);
	restored.apply_save(&view.to_save());
	assert_eq!(restored, view);
}

#[test]
fn fit_view_to_circuit() {
	let (session, _) = and_circuit();
	let bounds = session.circuit().bounds(session.config.grid_size).unwrap();
	assert_eq!(bounds, (V2::new(0.0, 0.0), V2::new(240.0, 140.0)));
	let mut view = Viewport::new(0.1, 5.0);
	view.fit_to(bounds, V2::new(500.0, 300.0), 10.0);
	assert!(close(view.world_to_screen((bounds.0 + bounds.1) / 2.0), V2::new(250.0, 150.0)));
}

#[test]
fn grid_snapping() {
	assert_eq!(graphics::snap_to_grid(V2::new(29.0, 11.0), 20.0), V2::new(20.0, 20.0));
	assert_eq!(graphics::snap_to_grid(V2::new(-29.0, 31.0), 20.0), V2::new(-20.0, 40.0));
	let mut session = Session::default();
	let id = session.add_gate(GateKind::And, V2::new(47.0, 52.0));
	assert_eq!(session.circuit().gate(id).unwrap().position, V2::new(40.0, 60.0));
	assert_eq!(session.move_gate(id, V2::new(41.0, 61.0)).unwrap(), false);
	assert_eq!(session.move_gate(id, V2::new(81.0, 61.0)).unwrap(), true);
	assert_eq!(session.circuit().gate(id).unwrap().position, V2::new(80.0, 60.0));
}

/// Input at (0, 0) with its output port at (40, 20), AND at (100, 0) with inputs at (100, 13.3) and (100, 26.7)
fn wiring_session() -> (Session, InteractionController, GateId, GateId) {
	let mut session = Session::default();
	let input = session.add_gate(GateKind::Input, V2::new(0.0, 0.0));
	let and = session.add_gate(GateKind::And, V2::new(100.0, 0.0));
	(session, InteractionController::new(), input, and)
}

#[test]
fn hit_testing() {
	let (session, _, input, and) = wiring_session();
	let circuit = session.circuit();
	assert_eq!(interaction::hit_test(circuit, V2::new(41.0, 19.0), 20.0, 8.0), Hit::Port(Endpoint::new(input, PortSide::Output, 0)));
	assert_eq!(interaction::hit_test(circuit, V2::new(101.0, 27.0), 20.0, 8.0), Hit::Port(Endpoint::new(and, PortSide::Input, 1)));
	assert_eq!(interaction::hit_test(circuit, V2::new(130.0, 20.0), 20.0, 8.0), Hit::Gate(and));
	assert_eq!(interaction::hit_test(circuit, V2::new(500.0, 500.0), 20.0, 8.0), Hit::Empty);
}

#[test]
fn drag_wiring() {
	let (mut session, mut controller, input, and) = wiring_session();
	controller.pointer_down(&mut session, V2::new(40.0, 20.0), PointerButton::Primary);
	controller.pointer_move(&mut session, V2::new(80.0, 15.0));
	assert_eq!(controller.pending_wire(&session), Some((V2::new(40.0, 20.0), V2::new(80.0, 15.0))));
	controller.pointer_up(&mut session, V2::new(100.0, 14.0));
	assert_eq!(controller.gesture, Gesture::Idle);
	assert_eq!(session.circuit().connections, vec![Connection::new(PortRef::new(input, 0), PortRef::new(and, 0))]);
	// Released over nothing after a real drag: abandoned
	controller.pointer_down(&mut session, V2::new(40.0, 20.0), PointerButton::Primary);
	controller.pointer_up(&mut session, V2::new(70.0, 80.0));
	assert_eq!(controller.gesture, Gesture::Idle);
	assert_eq!(session.circuit().connections.len(), 1);
}

#[test]
fn click_wiring() {
	let (mut session, mut controller, input, and) = wiring_session();
	controller.pointer_down(&mut session, V2::new(40.0, 20.0), PointerButton::Primary);
	controller.pointer_up(&mut session, V2::new(41.0, 20.0));
	assert!(matches!(controller.gesture, Gesture::Wiring{mode: WireMode::Click, ..}));
	controller.pointer_move(&mut session, V2::new(90.0, 30.0));
	controller.pointer_down(&mut session, V2::new(100.0, 27.0), PointerButton::Primary);
	controller.pointer_up(&mut session, V2::new(100.0, 27.0));
	assert_eq!(controller.gesture, Gesture::Idle);
	assert_eq!(session.circuit().connections, vec![Connection::new(PortRef::new(input, 0), PortRef::new(and, 1))]);
	// Clicking empty canvas cancels
	controller.pointer_down(&mut session, V2::new(40.0, 20.0), PointerButton::Primary);
	controller.pointer_up(&mut session, V2::new(40.0, 20.0));
	controller.pointer_down(&mut session, V2::new(500.0, 500.0), PointerButton::Primary);
	assert_eq!(controller.gesture, Gesture::Idle);
	assert_eq!(session.circuit().connections.len(), 1);
}

#[test]
fn drag_moves_gate_and_snaps_on_release() {
	let (mut session, mut controller, _, and) = wiring_session();
	let history_before = session.history().len();
	controller.pointer_down(&mut session, V2::new(130.0, 20.0), PointerButton::Primary);
	assert_eq!(controller.selected, Some(and));
	controller.pointer_move(&mut session, V2::new(171.0, 29.0));
	assert_eq!(session.circuit().gate(and).unwrap().position, V2::new(141.0, 9.0));
	assert_eq!(session.history().len(), history_before);
	controller.pointer_up(&mut session, V2::new(171.0, 29.0));
	assert_eq!(session.circuit().gate(and).unwrap().position, V2::new(140.0, 0.0));
	assert_eq!(session.history().len(), history_before + 1);
	assert!(session.undo());
	assert_eq!(session.circuit().gate(and).unwrap().position, V2::new(100.0, 0.0));
}

#[test]
fn clicking_input_toggles_it() {
	let (mut session, mut controller, input, _) = wiring_session();
	controller.pointer_down(&mut session, V2::new(10.0, 10.0), PointerButton::Primary);
	controller.pointer_up(&mut session, V2::new(10.0, 10.0));
	assert_eq!(session.circuit().gate(input).unwrap().state.level(), Some(true));
	assert_eq!(session.circuit().gate(input).unwrap().outputs, vec![true]);
}

#[test]
fn clicking_other_gates_changes_nothing() {
	let (mut session, mut controller, input, and) = wiring_session();
	let history_before = session.history().len();
	controller.pointer_down(&mut session, V2::new(130.0, 20.0), PointerButton::Primary);
	controller.pointer_up(&mut session, V2::new(130.0, 20.0));
	assert_eq!(controller.gesture, Gesture::Idle);
	assert_eq!(controller.selected, Some(and));
	assert_eq!(session.history().len(), history_before);
	assert_eq!(session.circuit().gate(input).unwrap().state.level(), Some(false));
	assert_eq!(session.circuit().gate(and).unwrap().position, V2::new(100.0, 0.0));
}

#[test]
fn place_pan_zoom_and_delete() {
	let (mut session, mut controller, _, _) = wiring_session();
	controller.placing = Some(GateKind::Probe);
	controller.pointer_down(&mut session, V2::new(320.0, 320.0), PointerButton::Primary);
	let probe = controller.selected.unwrap();
	assert_eq!(session.circuit().gate(probe).unwrap().kind, GateKind::Probe);
	assert_eq!(session.circuit().gate(probe).unwrap().position, V2::new(300.0, 300.0));
	assert!(controller.placing.is_none());
	assert!(controller.delete_selected(&mut session));
	assert!(!session.circuit().contains_gate(probe));
	controller.pointer_down(&mut session, V2::new(0.0, 0.0), PointerButton::Secondary);
	controller.pointer_move(&mut session, V2::new(10.0, 5.0));
	controller.pointer_up(&mut session, V2::new(10.0, 5.0));
	assert_eq!(session.viewport.offset, V2::new(10.0, 5.0));
	controller.scroll(&mut session, V2::new(10.0, 5.0), 100.0);
	assert_eq!(session.viewport.zoom, session.config.max_zoom);
}

#[test]
fn oscilloscope_ring_buffer() {
	let mut circuit = Circuit::new();
	let mut scope = Oscilloscope::new(3);
	scope.sample(&circuit);
	let input = circuit.add_gate(GateKind::Input, V2::zeros(), 20.0);
	let probe = circuit.add_gate(GateKind::Probe, V2::zeros(), 20.0);
	circuit.add_connection(Connection::new(PortRef::new(input, 0), PortRef::new(probe, 0)));
	circuit.propagate(50);
	scope.sample(&circuit);
	assert_eq!(scope.trace(probe), vec![None, Some(false)]);
	circuit.set_source_level(input, true).unwrap();
	circuit.propagate(50);
	for _ in 0..3 {
		scope.sample(&circuit);
	}
	assert_eq!(scope.len(), 3);
	assert_eq!(scope.trace(probe), vec![Some(true), Some(true), Some(true)]);
	scope.pause();
	assert!(!scope.sample(&circuit));
	assert_eq!(scope.len(), 3);
	scope.resume();
	scope.clear();
	assert!(scope.is_empty());
}

#[test]
fn clock_and_sampler_run_off_advance() {
	let mut session = Session::default();
	let clock = session.add_gate(GateKind::Clock, V2::zeros());
	let out = session.add_gate(GateKind::Output, V2::new(100.0, 0.0));
	let probe = session.add_gate(GateKind::Probe, V2::new(100.0, 100.0));
	session.add_connection(Connection::new(PortRef::new(clock, 0), PortRef::new(out, 0)));
	session.add_connection(Connection::new(PortRef::new(clock, 0), PortRef::new(probe, 0)));
	session.advance(0.5);
	assert_eq!(session.circuit().gate(out).unwrap().state.level(), Some(false));
	session.advance(0.5);
	assert_eq!(session.circuit().gate(out).unwrap().state.level(), Some(true));
	assert!(session.scope.len() >= 49 && session.scope.len() <= 50);
	assert_eq!(session.scope.trace(probe).last(), Some(&Some(true)));
	session.clock_running = false;
	session.advance(1.0);
	assert_eq!(session.circuit().gate(out).unwrap().state.level(), Some(true));
	session.tick_clock();
	assert_eq!(session.circuit().gate(out).unwrap().state.level(), Some(false));
}

#[test]
fn flow_packets() {
	let mut circuit = Circuit::new();
	let input = circuit.add_gate(GateKind::Input, V2::new(0.0, 0.0), 20.0);
	let out = circuit.add_gate(GateKind::Output, V2::new(100.0, 0.0), 20.0);
	circuit.add_connection(Connection::new(PortRef::new(input, 0), PortRef::new(out, 0)));
	circuit.propagate(50);
	let mut flow = FlowAnimator::new(1.5);
	assert_eq!(flow.spawn(&circuit), 0);
	flow.set_enabled(true);
	assert_eq!(flow.spawn(&circuit), 0);
	circuit.set_source_level(input, true).unwrap();
	circuit.propagate(50);
	assert_eq!(flow.spawn(&circuit), 1);
	flow.advance(&circuit, 0.5);
	let positions = flow.positions(&circuit, 20.0);
	assert_eq!(positions.len(), 1);
	// From (40, 20) to (100, 20)
	assert!(close(positions[0], V2::new(85.0, 20.0)));
	flow.advance(&circuit, 0.5);
	assert!(flow.packets().is_empty());
	flow.spawn(&circuit);
	circuit.remove_gate(out);
	flow.advance(&circuit, 0.01);
	assert!(flow.packets().is_empty());
}

#[test]
fn periodic_timer() {
	assert_eq!(PeriodicTimer::from_millis(0).poll(10.0), 0);
	let mut timer = PeriodicTimer::from_millis(250);
	assert_eq!(timer.poll(0.625), 2);
	assert_eq!(timer.poll(0.125), 1);
	assert_eq!(timer.poll(0.125), 0);
	assert_eq!(timer.poll(1000.0), TIMER_MAX_CATCH_UP_FIRES);
	assert_eq!(timer.poll(0.125), 0);
}

#[test]
fn config_defaults_fill_missing_fields() {
	let config = SimConfig::from_json(r#"{"grid_size": 10.0}"#).unwrap();
	assert_eq!(config.grid_size, 10.0);
	assert_eq!(config.max_propagation_rounds, 50);
	assert_eq!(config.history_limit, 50);
	assert_eq!(config.clock_period_ms, 1000);
	let mut session = Session::new(SimConfig {history_limit: 2, ..SimConfig::default()});
	for _ in 0..4 {
		session.add_gate(GateKind::And, V2::zeros());
	}
	assert!(session.undo());
	assert!(!session.undo());
	assert_eq!(session.circuit().gates.len(), 3);
}

#[cfg(feature = "using_filesystem")]
#[test]
fn bundled_resources_load() {
	assert_eq!(SimConfig::load().unwrap(), SimConfig::default());
	let styles = Styles::load().unwrap();
	assert_eq!(styles.color_wire_high, Styles::default().color_wire_high);
}

#[derive(Default)]
struct RecordingDraw {
	polylines: Cell<usize>,
	rects: Cell<usize>,
	circles: Cell<usize>,
	texts: RefCell<Vec<String>>
}

impl DrawInterface for RecordingDraw {
	fn draw_polyline(&self, _points: Vec<V2>, _stroke: [u8; 3], _width: f32) {
		self.polylines.set(self.polylines.get() + 1);
	}
	fn draw_rect(&self, _min: V2, _max: V2, _fill: [u8; 4], _border: [u8; 3]) {
		self.rects.set(self.rects.get() + 1);
	}
	fn draw_circle_filled(&self, _center: V2, _radius: f32, _color: [u8; 3]) {
		self.circles.set(self.circles.get() + 1);
	}
	fn text(&self, text: &str, _pos: V2, _color: [u8; 3], _size: f32) {
		self.texts.borrow_mut().push(text.to_owned());
	}
}

#[test]
fn draws_every_gate_wire_and_port() {
	let mut session = Session::default();
	let input = session.add_gate(GateKind::Input, V2::zeros());
	let out = session.add_gate(GateKind::Output, V2::new(100.0, 0.0));
	session.add_connection(Connection::new(PortRef::new(input, 0), PortRef::new(out, 0)));
	session.set_input(input, true).unwrap();
	let styles = Styles::default();
	let draw = RecordingDraw::default();
	graphics::draw_session(&session, &draw, &styles, Some(out), Some((V2::zeros(), V2::new(5.0, 5.0))));
	assert_eq!(draw.rects.get(), 2);
	// Wire plus the pending one
	assert_eq!(draw.polylines.get(), 2);
	assert_eq!(draw.circles.get(), 2);
	assert_eq!(*draw.texts.borrow(), vec!["Input".to_owned(), "1".to_owned(), "Output".to_owned(), "1".to_owned()]);
	assert_ne!(styles.color_from_signal(true), styles.color_from_signal(false));
}
