//! The fixed catalog of gate types
//! Every device the editor can place is a `GateKind` variant with an immutable `GateTypeDef` and an evaluation function

use std::fmt;
use crate::prelude::*;

/// Output values produced by one evaluation, indexed by output port, `None` leaves that output unchanged
pub type PortWrites = Vec<Option<bool>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateKind {
	And,
	Or,
	Not,
	Nand,
	Nor,
	Xor,
	Xnor,
	Buffer,
	HalfAdder,
	FullAdder,
	Input,
	Output,
	Clock,
	DFlipFlop,
	JkFlipFlop,
	Mux4,
	Demux4,
	Alu4,
	Ram8x4,
	Rom8x4,
	Counter4,
	Register4,
	Cpu,
	Probe,
	HexDisplay,
	Label
}

/// Used to group the palette
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateCategory {
	Combinational,
	Sequential,
	Memory,
	InputOutput,
	Display
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortSide {
	Input,
	Output
}

/// Where ports sit on the gate body, in grid units from the gate's top-left corner
#[derive(Debug)]
pub enum PortLayout {
	/// Inputs evenly spaced down the left edge, outputs down the right edge
	Even,
	Custom {
		inputs: &'static [(f32, f32)],
		outputs: &'static [(f32, f32)]
	}
}

/// Immutable catalog entry
#[derive(Debug)]
pub struct GateTypeDef {
	pub kind: GateKind,
	/// Identifier used in save files
	pub name: &'static str,
	pub display_name: &'static str,
	pub category: GateCategory,
	pub input_names: &'static [&'static str],
	pub output_names: &'static [&'static str],
	/// Body size in grid cells
	pub size: IntV2,
	pub layout: PortLayout
}

impl GateTypeDef {
	pub fn input_count(&self) -> usize {
		self.input_names.len()
	}
	pub fn output_count(&self) -> usize {
		self.output_names.len()
	}
	pub fn port_count(&self, side: PortSide) -> usize {
		match side {
			PortSide::Input => self.input_count(),
			PortSide::Output => self.output_count()
		}
	}
	pub fn port_name(&self, side: PortSide, index: usize) -> Option<&'static str> {
		match side {
			PortSide::Input => self.input_names.get(index).copied(),
			PortSide::Output => self.output_names.get(index).copied()
		}
	}
	/// Port position in grid units relative to the gate's top-left corner
	pub fn port_offset(&self, side: PortSide, index: usize) -> Option<V2> {
		let count = self.port_count(side);
		if index >= count {
			return None;
		}
		match &self.layout {
			PortLayout::Custom{inputs, outputs} => {
				let table = match side {
					PortSide::Input => inputs,
					PortSide::Output => outputs
				};
				table.get(index).map(|(x, y)| V2::new(*x, *y))
			},
			PortLayout::Even => {
				let size = self.size.to_v2();
				let y = size.y * (index + 1) as f32 / (count + 1) as f32;
				match side {
					PortSide::Input => Some(V2::new(0.0, y)),
					PortSide::Output => Some(V2::new(size.x, y))
				}
			}
		}
	}
}

const TWO_IN: &[&str] = &["A", "B"];
const ONE_IN: &[&str] = &["A"];
const ONE_OUT: &[&str] = &["Q"];
const NIBBLE_OUT: &[&str] = &["Q0", "Q1", "Q2", "Q3"];
const FLIP_FLOP_OUT: &[&str] = &["Q", "Q̅"];

/// Indexed by `GateKind as usize`
static CATALOG: [GateTypeDef; 26] = [
	GateTypeDef {kind: GateKind::And, name: "AND", display_name: "AND", category: GateCategory::Combinational, input_names: TWO_IN, output_names: ONE_OUT, size: IntV2(3, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Or, name: "OR", display_name: "OR", category: GateCategory::Combinational, input_names: TWO_IN, output_names: ONE_OUT, size: IntV2(3, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Not, name: "NOT", display_name: "NOT", category: GateCategory::Combinational, input_names: ONE_IN, output_names: ONE_OUT, size: IntV2(3, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Nand, name: "NAND", display_name: "NAND", category: GateCategory::Combinational, input_names: TWO_IN, output_names: ONE_OUT, size: IntV2(3, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Nor, name: "NOR", display_name: "NOR", category: GateCategory::Combinational, input_names: TWO_IN, output_names: ONE_OUT, size: IntV2(3, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Xor, name: "XOR", display_name: "XOR", category: GateCategory::Combinational, input_names: TWO_IN, output_names: ONE_OUT, size: IntV2(3, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Xnor, name: "XNOR", display_name: "XNOR", category: GateCategory::Combinational, input_names: TWO_IN, output_names: ONE_OUT, size: IntV2(3, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Buffer, name: "BUFFER", display_name: "Buffer", category: GateCategory::Combinational, input_names: ONE_IN, output_names: ONE_OUT, size: IntV2(3, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::HalfAdder, name: "HALF_ADDER", display_name: "Half adder", category: GateCategory::Combinational, input_names: TWO_IN, output_names: &["S", "C"], size: IntV2(3, 3), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::FullAdder, name: "FULL_ADDER", display_name: "Full adder", category: GateCategory::Combinational, input_names: &["A", "B", "Cin"], output_names: &["S", "Cout"], size: IntV2(3, 4), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Input, name: "INPUT", display_name: "Input", category: GateCategory::InputOutput, input_names: &[], output_names: ONE_OUT, size: IntV2(2, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Output, name: "OUTPUT", display_name: "Output", category: GateCategory::InputOutput, input_names: ONE_IN, output_names: &[], size: IntV2(2, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Clock, name: "CLOCK", display_name: "Clock", category: GateCategory::InputOutput, input_names: &[], output_names: &["CLK"], size: IntV2(2, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::DFlipFlop, name: "D_FF", display_name: "D flip-flop", category: GateCategory::Sequential, input_names: &["D", "CLK"], output_names: FLIP_FLOP_OUT, size: IntV2(3, 3), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::JkFlipFlop, name: "JK_FF", display_name: "JK flip-flop", category: GateCategory::Sequential, input_names: &["J", "K", "CLK"], output_names: FLIP_FLOP_OUT, size: IntV2(3, 4), layout: PortLayout::Even},
	GateTypeDef {
		kind: GateKind::Mux4,
		name: "MUX",
		display_name: "MUX 4:1",
		category: GateCategory::Combinational,
		input_names: &["I0", "I1", "I2", "I3", "S0", "S1"],
		output_names: &["Y"],
		size: IntV2(4, 6),
		layout: PortLayout::Custom {
			inputs: &[(0.0, 1.0), (0.0, 2.0), (0.0, 3.0), (0.0, 4.0), (1.5, 6.0), (2.5, 6.0)],
			outputs: &[(4.0, 2.5)]
		}
	},
	GateTypeDef {
		kind: GateKind::Demux4,
		name: "DEMUX",
		display_name: "DEMUX 1:4",
		category: GateCategory::Combinational,
		input_names: &["In", "S0", "S1"],
		output_names: &["Y0", "Y1", "Y2", "Y3"],
		size: IntV2(4, 6),
		layout: PortLayout::Custom {
			inputs: &[(0.0, 2.5), (1.5, 6.0), (2.5, 6.0)],
			outputs: &[(4.0, 1.0), (4.0, 2.0), (4.0, 3.0), (4.0, 4.0)]
		}
	},
	GateTypeDef {
		kind: GateKind::Alu4,
		name: "ALU",
		display_name: "ALU 4-bit",
		category: GateCategory::Combinational,
		input_names: &["A0", "A1", "A2", "A3", "B0", "B1", "B2", "B3", "Op0", "Op1"],
		output_names: &["R0", "R1", "R2", "R3", "Cout"],
		size: IntV2(4, 11),
		layout: PortLayout::Even
	},
	GateTypeDef {
		kind: GateKind::Ram8x4,
		name: "RAM",
		display_name: "RAM 8x4",
		category: GateCategory::Memory,
		input_names: &["A0", "A1", "A2", "D0", "D1", "D2", "D3", "WE", "CLK"],
		output_names: NIBBLE_OUT,
		size: IntV2(5, 9),
		layout: PortLayout::Custom {
			inputs: &[(0.0, 1.0), (0.0, 2.0), (0.0, 3.0), (0.0, 5.0), (0.0, 6.0), (0.0, 7.0), (0.0, 8.0), (2.0, 9.0), (3.0, 9.0)],
			outputs: &[(5.0, 3.0), (5.0, 4.0), (5.0, 5.0), (5.0, 6.0)]
		}
	},
	GateTypeDef {kind: GateKind::Rom8x4, name: "ROM", display_name: "ROM 8x4", category: GateCategory::Memory, input_names: &["A0", "A1", "A2"], output_names: &["D0", "D1", "D2", "D3"], size: IntV2(4, 5), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Counter4, name: "COUNTER_4BIT", display_name: "Counter 4-bit", category: GateCategory::Sequential, input_names: &["CLK", "RST"], output_names: NIBBLE_OUT, size: IntV2(4, 5), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Register4, name: "REGISTER_4BIT", display_name: "Register 4-bit", category: GateCategory::Memory, input_names: &["D0", "D1", "D2", "D3", "CLK", "EN"], output_names: NIBBLE_OUT, size: IntV2(4, 7), layout: PortLayout::Even},
	GateTypeDef {
		kind: GateKind::Cpu,
		name: "CPU",
		display_name: "CPU 4-bit",
		category: GateCategory::Memory,
		input_names: &["D0", "D1", "D2", "D3", "CLK", "RST"],
		output_names: &["A0", "A1", "A2", "A3", "O0", "O1", "O2", "O3", "WE"],
		size: IntV2(6, 10),
		layout: PortLayout::Custom {
			inputs: &[(0.0, 1.0), (0.0, 2.0), (0.0, 3.0), (0.0, 4.0), (0.0, 7.0), (0.0, 9.0)],
			outputs: &[(6.0, 1.0), (6.0, 2.0), (6.0, 3.0), (6.0, 4.0), (6.0, 5.0), (6.0, 6.0), (6.0, 7.0), (6.0, 8.0), (6.0, 9.0)]
		}
	},
	GateTypeDef {kind: GateKind::Probe, name: "PROBE", display_name: "Probe", category: GateCategory::Display, input_names: ONE_IN, output_names: &[], size: IntV2(2, 2), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::HexDisplay, name: "HEX_DISPLAY", display_name: "Hex display", category: GateCategory::Display, input_names: &["8", "4", "2", "1"], output_names: &[], size: IntV2(3, 5), layout: PortLayout::Even},
	GateTypeDef {kind: GateKind::Label, name: "LABEL", display_name: "Label", category: GateCategory::Display, input_names: &[], output_names: &[], size: IntV2(4, 1), layout: PortLayout::Even}
];

impl GateKind {
	pub const ALL: [GateKind; 26] = [
		Self::And,
		Self::Or,
		Self::Not,
		Self::Nand,
		Self::Nor,
		Self::Xor,
		Self::Xnor,
		Self::Buffer,
		Self::HalfAdder,
		Self::FullAdder,
		Self::Input,
		Self::Output,
		Self::Clock,
		Self::DFlipFlop,
		Self::JkFlipFlop,
		Self::Mux4,
		Self::Demux4,
		Self::Alu4,
		Self::Ram8x4,
		Self::Rom8x4,
		Self::Counter4,
		Self::Register4,
		Self::Cpu,
		Self::Probe,
		Self::HexDisplay,
		Self::Label
	];
	pub fn def(&self) -> &'static GateTypeDef {
		&CATALOG[*self as usize]
	}
	pub fn name(&self) -> &'static str {
		self.def().name
	}
	pub fn input_count(&self) -> usize {
		self.def().input_count()
	}
	pub fn output_count(&self) -> usize {
		self.def().output_count()
	}
	/// Case-insensitive, also accepts a few common spellings
	pub fn from_name(name: &str) -> Option<Self> {
		let normalized: String = name.trim().to_ascii_uppercase().replace([' ', '-', ':'], "_");
		let alias = match normalized.as_str() {
			"MUX_4_1" | "MUX4" | "MUX_4" => "MUX",
			"DEMUX_1_4" | "DEMUX4" | "DEMUX_4" => "DEMUX",
			"ALU4" | "ALU_4BIT" => "ALU",
			"RAM_8X4" | "RAM8X4" => "RAM",
			"ROM_8X4" | "ROM8X4" => "ROM",
			"COUNTER" | "COUNTER4" => "COUNTER_4BIT",
			"REGISTER" | "REGISTER4" => "REGISTER_4BIT",
			"DFF" | "D_FLIPFLOP" | "D_FLIP_FLOP" => "D_FF",
			"JKFF" | "JK_FLIPFLOP" | "JK_FLIP_FLOP" => "JK_FF",
			"HEX" | "HEXDISPLAY" => "HEX_DISPLAY",
			other => other
		};
		CATALOG.iter().find(|def| def.name == alias).map(|def| def.kind)
	}
	/// Whether the gate's value comes from stored state rather than inputs
	pub fn is_source(&self) -> bool {
		matches!(self, Self::Input | Self::Clock)
	}
	/// Evaluates one step given the current input levels, may update `state` for the bits the device remembers
	/// Reads past the end of `inputs` are 0
	pub fn evaluate(&self, inputs: &[bool], state: &mut GateState) -> PortWrites {
		if !state.fits(*self) {
			*state = GateState::for_kind(*self);
		}
		let pin = |i: usize| -> bool {inputs.get(i).copied().unwrap_or(false)};
		match (self, state) {
			(Self::And, _) => all_outputs(&[pin(0) && pin(1)]),
			(Self::Or, _) => all_outputs(&[pin(0) || pin(1)]),
			(Self::Not, _) => all_outputs(&[!pin(0)]),
			(Self::Nand, _) => all_outputs(&[!(pin(0) && pin(1))]),
			(Self::Nor, _) => all_outputs(&[!(pin(0) || pin(1))]),
			(Self::Xor, _) => all_outputs(&[pin(0) != pin(1)]),
			(Self::Xnor, _) => all_outputs(&[pin(0) == pin(1)]),
			(Self::HalfAdder, _) => {
				let (a, b) = (pin(0), pin(1));
				all_outputs(&[a ^ b, a && b])
			},
			(Self::FullAdder, _) => {
				let (a, b, carry_in) = (pin(0), pin(1), pin(2));
				all_outputs(&[a ^ b ^ carry_in, (a && b) || (carry_in && (a ^ b))])
			},
			(Self::Input | Self::Clock, GateState::Level(level)) => all_outputs(&[level.value]),
			(Self::Output | Self::Probe, GateState::Level(level)) => {
				level.value = pin(0);
				Vec::new()
			},
			(Self::Buffer, GateState::Level(level)) => {
				level.value = pin(0);
				all_outputs(&[level.value])
			},
			(Self::DFlipFlop, GateState::FlipFlop(ff)) => {
				if rising_edge(&mut ff.last_clk, pin(1)) {
					ff.q = pin(0);
				}
				all_outputs(&[ff.q, !ff.q])
			},
			(Self::JkFlipFlop, GateState::FlipFlop(ff)) => {
				if rising_edge(&mut ff.last_clk, pin(2)) {
					ff.q = match (pin(0), pin(1)) {
						(false, false) => ff.q,
						(false, true) => false,
						(true, false) => true,
						(true, true) => !ff.q
					};
				}
				all_outputs(&[ff.q, !ff.q])
			},
			(Self::Mux4, _) => {
				let select = decode_bits(inputs, 4, 2) as usize;
				all_outputs(&[pin(select)])
			},
			(Self::Demux4, _) => {
				let select = decode_bits(inputs, 1, 2) as usize;
				let value = pin(0);
				(0..4).map(|i| Some(i == select && value)).collect()
			},
			(Self::Alu4, _) => {
				let a = decode_bits(inputs, 0, 4);
				let b = decode_bits(inputs, 4, 4);
				let (result, carry) = match decode_bits(inputs, 8, 2) {
					0 => {
						let sum = a + b;
						(sum & NIBBLE_MASK, sum > NIBBLE_MASK)
					},
					1 => (a.wrapping_sub(b) & NIBBLE_MASK, false),
					2 => (a & b, false),
					_ => (a | b, false)
				};
				let mut out = encode_bits(result, 4);
				out.push(Some(carry));
				out
			},
			(Self::Ram8x4, GateState::Memory(ram)) => {
				let address = decode_bits(inputs, 0, 3) as usize;
				if rising_edge(&mut ram.last_clk, pin(8)) && pin(7) {
					ram.memory[address] = decode_bits(inputs, 3, 4);
				}
				encode_bits(ram.memory[address], 4)
			},
			(Self::Rom8x4, GateState::Memory(rom)) => {
				let address = decode_bits(inputs, 0, 3) as usize;
				encode_bits(rom.memory[address], 4)
			},
			(Self::Counter4, GateState::Counter(counter)) => {
				let clk_rising = rising_edge(&mut counter.last_clk, pin(0));
				if pin(1) {
					counter.count = 0;
				}
				else if clk_rising {
					counter.count = (counter.count + 1) & NIBBLE_MASK;
				}
				encode_bits(counter.count, 4)
			},
			(Self::Register4, GateState::Register(register)) => {
				if rising_edge(&mut register.last_clk, pin(4)) && pin(5) {
					register.value = decode_bits(inputs, 0, 4);
				}
				encode_bits(register.value, 4)
			},
			(Self::Cpu, GateState::Cpu(cpu)) => {
				cpu_step(cpu, decode_bits(inputs, 0, 4), pin(4), pin(5));
				let mut out = encode_bits(cpu.address, 4);
				out.extend(encode_bits(cpu.data_out, 4));
				out.push(Some(cpu.write_enable));
				out
			},
			(Self::HexDisplay, GateState::Nibble(nibble)) => {
				nibble.value = (pin(0) as u8) * 8 + (pin(1) as u8) * 4 + (pin(2) as u8) * 2 + pin(3) as u8;
				Vec::new()
			},
			// Labels and any state/kind mismatch leave everything unchanged
			_ => Vec::new()
		}
	}
}

impl fmt::Display for GateKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}

fn all_outputs(values: &[bool]) -> PortWrites {
	values.iter().map(|v| Some(*v)).collect()
}

/// Updates the remembered clock level and reports a 0 -> 1 transition
fn rising_edge(last_clk: &mut bool, clk: bool) -> bool {
	let rising = clk && !*last_clk;
	*last_clk = clk;
	rising
}

/// LSB-first
pub fn decode_bits(inputs: &[bool], start: usize, count: usize) -> u8 {
	let mut out: u8 = 0;
	for bit in 0..count {
		if inputs.get(start + bit).copied().unwrap_or(false) {
			out |= 1 << bit;
		}
	}
	out
}

/// LSB-first
pub fn encode_bits(value: u8, count: usize) -> PortWrites {
	(0..count).map(|bit| Some((value >> bit) & 1 == 1)).collect()
}

/// One evaluation of the fetch/decode/execute sequencer
fn cpu_step(cpu: &mut CpuState, data_in: u8, clk: bool, rst: bool) {
	if rst {
		*cpu = CpuState {
			last_clk: clk,
			..CpuState::default()
		};
		return;
	}
	if !rising_edge(&mut cpu.last_clk, clk) {
		return;
	}
	match cpu.phase {
		0 => {
			cpu.address = cpu.pc;
			cpu.phase = 1;
		},
		1 => {
			cpu.opcode = data_in;
			cpu.address = (cpu.pc + 1) & NIBBLE_MASK;
			cpu.phase = 2;
		},
		2 => {
			let operand = data_in;
			cpu.phase = 0;
			match cpu.opcode {
				CPU_OP_LDI => cpu.acc = operand,
				CPU_OP_ADD => cpu.acc = (cpu.acc + operand) & NIBBLE_MASK,
				CPU_OP_STA => {
					cpu.address = operand;
					cpu.data_out = cpu.acc;
					cpu.write_enable = true;
					cpu.phase = 3;
				},
				// Cancels out the +2 below
				CPU_OP_JMP => cpu.pc = (operand + 14) & NIBBLE_MASK,
				// NOP and every undefined opcode
				_ => {}
			}
			cpu.pc = (cpu.pc + 2) & NIBBLE_MASK;
		},
		_ => {
			cpu.write_enable = false;
			cpu.phase = 0;
		}
	}
}
