//! Gate-level digital logic simulator, fixed-point propagation with undo/redo, an oscilloscope and circuit file interchange

use serde::{Serialize, Deserialize};
use nalgebra::Vector2;
#[cfg(feature = "using_egui")]
use eframe::emath;

pub mod builtin_components;
pub mod gate_state;
pub mod simulator;
pub mod history;
pub mod graphics;
pub mod interaction;
pub mod oscilloscope;
pub mod scheduler;
pub mod resource_interface;
pub mod cedar_xml;
pub mod session;
pub mod config;
pub mod error;
#[cfg(feature = "using_egui")]
pub mod ui;
#[cfg(test)]
pub mod tests;

#[allow(unused)]
pub mod prelude {
	use super::*;
	// Name of this app
	pub const APP_NAME: &str = "Logic Bench";
	/// Propagation rounds before giving up on a circuit that will not settle
	pub const DEFAULT_MAX_PROPAGATION_ROUNDS: usize = 50;
	pub const DEFAULT_HISTORY_LIMIT: usize = 50;
	/// First ID handed out after a clear
	pub const INITIAL_GATE_ID: u64 = 1;
	/// Largest gate ID a circuit file may carry, the range JSON numbers hold exactly
	pub const MAX_GATE_ID: u64 = (1 << 53) - 1;
	pub const UI_MAX_FRAME_SIMULATION_TIME: f32 = 0.033;
	/// A timer that fell far behind only fires this many times in one poll
	pub const TIMER_MAX_CATCH_UP_FIRES: u32 = 64;
	/// Words in RAM and ROM
	pub const MEMORY_WORDS: usize = 8;
	pub const NIBBLE_MASK: u8 = 0x0F;
	pub const CPU_OP_LDI: u8 = 1;
	pub const CPU_OP_ADD: u8 = 2;
	pub const CPU_OP_STA: u8 = 3;
	pub const CPU_OP_JMP: u8 = 4;
	/// Segment bits `gfedcba` for hex digits 0-F
	pub const SEVEN_SEGMENT_PATTERNS: [u8; 16] = [0x3F, 0x06, 0x5B, 0x4F, 0x66, 0x6D, 0x7D, 0x07, 0x7F, 0x6F, 0x77, 0x7C, 0x39, 0x5E, 0x79, 0x71];
	pub type V2 = Vector2<f32>;
	#[cfg(feature = "using_egui")]
	use eframe::egui::Color32;
	#[cfg(feature = "using_egui")]
	pub use ui::App;
	pub use builtin_components::{GateKind, GateTypeDef, GateCategory, PortSide, PortLayout, PortWrites};
	pub use gate_state::{GateState, EmptyState, LevelState, FlipFlopState, MemoryState, CounterState, RegisterState, CpuState, NibbleState, LabelState};
	pub use simulator::{GateId, Gate, PortRef, Endpoint, Connection, Circuit, WireOutcome, WireRejection, PropagationReport};
	pub use history::History;
	pub use graphics::{Viewport, ViewSave, GateReadout, Styles};
	pub use interaction::{InteractionController, Gesture, WireMode, PointerButton, Hit};
	pub use oscilloscope::{Oscilloscope, ScopeSample, FlowAnimator, FlowPacket};
	pub use scheduler::{PeriodicTimer, Timers};
	pub use resource_interface::{CircuitSave, GateSave};
	#[cfg(feature = "using_filesystem")]
	pub use resource_interface::load_file_with_better_error;
	pub use cedar_xml::ImportReport;
	pub use session::Session;
	pub use config::SimConfig;
	pub use error::SimError;
	#[cfg(feature = "using_egui")]
	pub fn u8_3_to_color32(in_: [u8; 3]) -> Color32 {
		Color32::from_rgb(in_[0], in_[1], in_[2])
	}
	#[cfg(feature = "using_egui")]
	pub fn emath_vec2_to_v2(in_: emath::Vec2) -> V2 {
		V2::new(in_.x, in_.y)
	}
	#[cfg(feature = "using_egui")]
	pub fn v2_to_emath_pos2(in_: V2) -> emath::Pos2 {
		emath::Pos2{x: in_.x, y: in_.y}
	}
	pub fn round_v2_to_intv2(in_: V2) -> IntV2 {
		IntV2(in_.x.round() as i32, in_.y.round() as i32)
	}
	pub fn merge_points_to_bb(points: Vec<V2>) -> Option<(V2, V2)> {
		let first = *points.first()?;
		let mut min = first;
		let mut max = first;
		for p in &points[1..] {
			min.x = min.x.min(p.x);
			min.y = min.y.min(p.y);
			max.x = max.x.max(p.x);
			max.y = max.y.max(p.y);
		}
		Some((min, max))
	}
	pub fn point_in_bb(point: V2, bb: (V2, V2)) -> bool {
		point.x >= bb.0.x && point.x <= bb.1.x && point.y >= bb.0.y && point.y <= bb.1.y
	}

	#[derive(Default, Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Eq, Hash)]
	pub struct IntV2(pub i32, pub i32);

	impl IntV2 {
		pub fn to_v2(&self) -> V2 {
			V2::new(self.0 as f32, self.1 as f32)
		}
	}
}

#[cfg(feature = "using_egui")]
use prelude::*;

#[cfg(feature = "using_egui")]
pub fn ui_main() -> eframe::Result {
	let native_options = eframe::NativeOptions::default();
	eframe::run_native(APP_NAME, native_options, Box::new(|_| Ok(Box::new(App::new()))))
}
