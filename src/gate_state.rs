//! Per-instance internal state of gates
//! Each device family owns a differently shaped state, the variant is picked by `GateKind`

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::prelude::*;

/// ROM contents when a ROM is first placed
pub const ROM_DEFAULT_CONTENTS: [u8; MEMORY_WORDS] = [0, 1, 2, 3, 4, 5, 6, 7];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyState {}

/// Single stored bit: INPUT toggle, CLOCK level, OUTPUT/BUFFER/PROBE displayed value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelState {
	pub value: bool
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlipFlopState {
	pub q: bool,
	pub last_clk: bool
}

/// 8 words of 4 bits, used by both RAM and ROM (ROM ignores `last_clk`)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryState {
	pub memory: [u8; MEMORY_WORDS],
	pub last_clk: bool
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CounterState {
	pub count: u8,
	pub last_clk: bool
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterState {
	pub value: u8,
	pub last_clk: bool
}

/// Registers and bus latches of the 4-bit CPU
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuState {
	pub pc: u8,
	pub acc: u8,
	/// 0 = fetch opcode, 1 = fetch operand, 2 = execute, 3 = store write-back
	pub phase: u8,
	pub opcode: u8,
	pub address: u8,
	pub data_out: u8,
	pub write_enable: bool,
	pub last_clk: bool
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NibbleState {
	pub value: u8
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelState {
	pub text: String
}

/// Serialized without a tag, the gate's `type` already says which shape to expect
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GateState {
	Stateless(EmptyState),
	Level(LevelState),
	FlipFlop(FlipFlopState),
	Memory(MemoryState),
	Counter(CounterState),
	Register(RegisterState),
	Cpu(CpuState),
	Nibble(NibbleState),
	Label(LabelState)
}

impl GateState {
	pub fn for_kind(kind: GateKind) -> Self {
		match kind {
			GateKind::Input | GateKind::Output | GateKind::Clock | GateKind::Buffer | GateKind::Probe => Self::Level(LevelState::default()),
			GateKind::DFlipFlop | GateKind::JkFlipFlop => Self::FlipFlop(FlipFlopState::default()),
			GateKind::Ram8x4 => Self::Memory(MemoryState::default()),
			GateKind::Rom8x4 => Self::Memory(MemoryState {
				memory: ROM_DEFAULT_CONTENTS,
				last_clk: false
			}),
			GateKind::Counter4 => Self::Counter(CounterState::default()),
			GateKind::Register4 => Self::Register(RegisterState::default()),
			GateKind::Cpu => Self::Cpu(CpuState::default()),
			GateKind::HexDisplay => Self::Nibble(NibbleState::default()),
			GateKind::Label => Self::Label(LabelState::default()),
			_ => Self::Stateless(EmptyState {})
		}
	}
	/// Whether this state has the shape `kind` expects
	pub fn fits(&self, kind: GateKind) -> bool {
		std::mem::discriminant(self) == std::mem::discriminant(&Self::for_kind(kind))
	}
	/// Restores saved state if it matches the shape `kind` expects, otherwise the default for `kind`
	pub fn from_save(kind: GateKind, saved: Option<&Value>) -> Self {
		let Some(value) = saved else {
			return Self::for_kind(kind);
		};
		let restored: Option<Self> = match Self::for_kind(kind) {
			Self::Stateless(_) => None,
			Self::Level(_) => serde_json::from_value(value.clone()).ok().map(Self::Level),
			Self::FlipFlop(_) => serde_json::from_value(value.clone()).ok().map(Self::FlipFlop),
			Self::Memory(_) => serde_json::from_value::<MemoryState>(value.clone()).ok().map(|mut memory| {
				for word in memory.memory.iter_mut() {
					*word &= NIBBLE_MASK;
				}
				Self::Memory(memory)
			}),
			Self::Counter(_) => serde_json::from_value::<CounterState>(value.clone()).ok().map(|mut counter| {
				counter.count &= NIBBLE_MASK;
				Self::Counter(counter)
			}),
			Self::Register(_) => serde_json::from_value::<RegisterState>(value.clone()).ok().map(|mut register| {
				register.value &= NIBBLE_MASK;
				Self::Register(register)
			}),
			Self::Cpu(_) => serde_json::from_value::<CpuState>(value.clone()).ok().map(|mut cpu| {
				cpu.pc &= NIBBLE_MASK;
				cpu.acc &= NIBBLE_MASK;
				cpu.phase &= 3;
				cpu.opcode &= NIBBLE_MASK;
				cpu.address &= NIBBLE_MASK;
				cpu.data_out &= NIBBLE_MASK;
				Self::Cpu(cpu)
			}),
			Self::Nibble(_) => serde_json::from_value::<NibbleState>(value.clone()).ok().map(|mut nibble| {
				nibble.value &= NIBBLE_MASK;
				Self::Nibble(nibble)
			}),
			Self::Label(_) => serde_json::from_value(value.clone()).ok().map(Self::Label)
		};
		restored.unwrap_or_else(|| Self::for_kind(kind))
	}
	/// Stored bit of level-type devices
	pub fn level(&self) -> Option<bool> {
		match self {
			Self::Level(level) => Some(level.value),
			_ => None
		}
	}
	pub fn memory(&self) -> Option<&[u8; MEMORY_WORDS]> {
		match self {
			Self::Memory(memory) => Some(&memory.memory),
			_ => None
		}
	}
}

impl Default for GateState {
	fn default() -> Self {
		Self::Stateless(EmptyState {})
	}
}
