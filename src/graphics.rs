//! Graphics functionality that will be used regardless of whether egui is being used

use serde::{Serialize, Deserialize};
use crate::prelude::*;
#[cfg(feature = "using_filesystem")]
use crate::{error::Result, resource_interface};
use crate::builtin_components::decode_bits;

/// Style for the UI, loaded from /resources/styles.json
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Styles {
	/// Show a grid in the background
	pub show_grid: bool,
	/// Fraction of grid size that lines are drawn, 0.1 is probably good
	pub line_size_grid: f32,
	/// Fraction of grid size
	pub port_radius_grid: f32,
	pub color_wire_low: [u8; 3],
	pub color_wire_high: [u8; 3],
	pub color_wire_in_progress: [u8; 3],
	pub color_background: [u8; 3],
	pub color_foreground: [u8; 3],
	pub color_gate_body: [u8; 4],
	pub color_selected: [u8; 3],
	pub color_grid: [u8; 3],
	pub color_flow_packet: [u8; 3],
	pub color_segment_on: [u8; 3],
	pub color_segment_off: [u8; 3],
	pub text_size_grid: f32,
	pub text_color: [u8; 3],
	/// Pixels per oscilloscope sample
	pub scope_sample_px: f32,
	pub scope_trace_height_px: f32
}

impl Styles {
	#[cfg(feature = "using_filesystem")]
	pub fn load() -> Result<Self> {
		let raw_string: String = load_file_with_better_error(resource_interface::STYLES_FILE)?;
		let styles: Self = serde_json::from_str(&raw_string)?;
		Ok(styles)
	}
	pub fn color_from_signal(&self, value: bool) -> [u8; 3] {
		match value {
			true => self.color_wire_high,
			false => self.color_wire_low
		}
	}
}

impl Default for Styles {
	fn default() -> Self {
		Self {
			show_grid: true,
			line_size_grid: 0.1,
			port_radius_grid: 0.2,
			color_wire_low: [0, 0, 255],
			color_wire_high: [0, 255, 0],
			color_wire_in_progress: [2, 156, 99],
			color_background: [0, 0, 0],
			color_foreground: [255, 255, 255],
			color_gate_body: [40, 40, 48, 255],
			color_selected: [252, 7, 7],
			color_grid: [64, 64, 64],
			color_flow_packet: [255, 220, 60],
			color_segment_on: [255, 40, 40],
			color_segment_off: [60, 20, 20],
			text_size_grid: 0.7,
			text_color: [243, 118, 252],
			scope_sample_px: 2.0,
			scope_trace_height_px: 20.0
		}
	}
}

/// Rounds a world position to the nearest grid point
pub fn snap_to_grid(position: V2, grid_size: f32) -> V2 {
	if grid_size <= 0.0 {
		return position;
	}
	round_v2_to_intv2(position / grid_size).to_v2() * grid_size
}

/// World-space body rectangle (top-left, bottom-right)
pub fn gate_bounds(gate: &Gate, grid_size: f32) -> (V2, V2) {
	(gate.position, gate.position + gate.def().size.to_v2() * grid_size)
}

pub fn port_world_position(gate: &Gate, side: PortSide, index: usize, grid_size: f32) -> Option<V2> {
	gate.def().port_offset(side, index).map(|offset| gate.position + offset * grid_size)
}

/// World positions of both ends of a wire
pub fn connection_endpoints(circuit: &Circuit, conn: &Connection, grid_size: f32) -> Option<(V2, V2)> {
	let source = circuit.gate(conn.from.gate_id)?;
	let target = circuit.gate(conn.to.gate_id)?;
	Some((
		port_world_position(source, PortSide::Output, conn.from.port_index, grid_size)?,
		port_world_position(target, PortSide::Input, conn.to.port_index, grid_size)?
	))
}

/// Saved view transform
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewSave {
	pub x: f32,
	pub y: f32,
	pub zoom: f32
}

/// Pan/zoom transform between world and screen, never touches gate world coordinates
/// screen = world * zoom + offset
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
	/// Screen position of the world origin
	pub offset: V2,
	pub zoom: f32,
	pub min_zoom: f32,
	pub max_zoom: f32
}

impl Viewport {
	pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
		Self {
			offset: V2::zeros(),
			zoom: 1.0_f32.clamp(min_zoom, max_zoom),
			min_zoom,
			max_zoom
		}
	}
	pub fn world_to_screen(&self, world: V2) -> V2 {
		world * self.zoom + self.offset
	}
	pub fn screen_to_world(&self, screen: V2) -> V2 {
		(screen - self.offset) / self.zoom
	}
	pub fn pan(&mut self, delta_screen: V2) {
		self.offset += delta_screen;
	}
	pub fn set_zoom(&mut self, zoom: f32) {
		self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
	}
	/// Multiplies zoom by `factor`, keeping the world point under `anchor_screen` where it is
	pub fn zoom_at(&mut self, anchor_screen: V2, factor: f32) {
		let anchor_world = self.screen_to_world(anchor_screen);
		self.set_zoom(self.zoom * factor);
		self.offset = anchor_screen - anchor_world * self.zoom;
	}
	/// Zooms and pans so that `bounds` fills the screen with `margin_px` to spare
	pub fn fit_to(&mut self, bounds: (V2, V2), screen_size: V2, margin_px: f32) {
		let world_size = bounds.1 - bounds.0;
		let usable = V2::new((screen_size.x - 2.0 * margin_px).max(1.0), (screen_size.y - 2.0 * margin_px).max(1.0));
		if world_size.x > 0.0 && world_size.y > 0.0 {
			self.set_zoom((usable.x / world_size.x).min(usable.y / world_size.y));
		}
		let world_center = (bounds.0 + bounds.1) / 2.0;
		self.offset = screen_size / 2.0 - world_center * self.zoom;
	}
	pub fn to_save(&self) -> ViewSave {
		ViewSave {
			x: self.offset.x,
			y: self.offset.y,
			zoom: self.zoom
		}
	}
	pub fn apply_save(&mut self, save: &ViewSave) {
		self.offset = V2::new(save.x, save.y);
		self.set_zoom(save.zoom);
	}
}

/// What a gate shows on its body after propagation
#[derive(Clone, Debug, PartialEq)]
pub enum GateReadout {
	None,
	Bit(bool),
	/// Value and `gfedcba` segment mask
	Nibble {
		value: u8,
		segments: u8
	},
	Word {
		address: u8,
		value: u8
	},
	Cpu {
		pc: u8,
		acc: u8,
		phase: u8,
		opcode: u8
	},
	Text(String)
}

impl GateReadout {
	pub fn of(gate: &Gate) -> Self {
		match (&gate.kind, &gate.state) {
			(GateKind::Input | GateKind::Output | GateKind::Clock | GateKind::Buffer | GateKind::Probe, GateState::Level(level)) => Self::Bit(level.value),
			(GateKind::HexDisplay, GateState::Nibble(nibble)) => Self::nibble(nibble.value),
			(GateKind::Counter4, GateState::Counter(counter)) => Self::nibble(counter.count),
			(GateKind::Register4, GateState::Register(register)) => Self::nibble(register.value),
			(GateKind::Ram8x4 | GateKind::Rom8x4, GateState::Memory(memory)) => {
				let address = decode_bits(&gate.inputs, 0, 3);
				Self::Word {
					address,
					value: memory.memory[address as usize]
				}
			},
			(GateKind::Cpu, GateState::Cpu(cpu)) => Self::Cpu {
				pc: cpu.pc,
				acc: cpu.acc,
				phase: cpu.phase,
				opcode: cpu.opcode
			},
			(GateKind::Label, GateState::Label(label)) => Self::Text(label.text.clone()),
			_ => Self::None
		}
	}
	pub fn nibble(value: u8) -> Self {
		let value = value & NIBBLE_MASK;
		Self::Nibble {
			value,
			segments: SEVEN_SEGMENT_PATTERNS[value as usize]
		}
	}
	pub fn to_text(&self) -> String {
		match self {
			Self::None => String::new(),
			Self::Bit(value) => format!("{}", *value as u8),
			Self::Nibble{value, ..} => format!("{:X}", value),
			Self::Word{address, value} => format!("[{}] {:X}", address, value),
			Self::Cpu{pc, acc, phase, opcode} => format!("PC:{:X} ACC:{:X} PH:{} OP:{:X}", pc, acc, phase, opcode),
			Self::Text(text) => text.clone()
		}
	}
}

/// Whatever is painting, all coordinates are screen pixels
pub trait DrawInterface {
	fn draw_polyline(&self, points: Vec<V2>, stroke: [u8; 3], width: f32);
	fn draw_rect(&self, min: V2, max: V2, fill: [u8; 4], border: [u8; 3]);
	fn draw_circle_filled(&self, center: V2, radius: f32, color: [u8; 3]);
	fn text(&self, text: &str, pos: V2, color: [u8; 3], size: f32);
}

/// Segment endpoints in a 1x2 cell, order `abcdefg`
const SEGMENT_LINES: [((f32, f32), (f32, f32)); 7] = [
	((0.0, 0.0), (1.0, 0.0)),
	((1.0, 0.0), (1.0, 1.0)),
	((1.0, 1.0), (1.0, 2.0)),
	((0.0, 2.0), (1.0, 2.0)),
	((0.0, 1.0), (0.0, 2.0)),
	((0.0, 0.0), (0.0, 1.0)),
	((0.0, 1.0), (1.0, 1.0))
];

/// Draws every wire, gate, port, flow packet and the wire being dragged, if any
pub fn draw_session(session: &Session, draw: &dyn DrawInterface, styles: &Styles, selected: Option<GateId>, pending_wire: Option<(V2, V2)>) {
	let grid = session.config.grid_size;
	let view = &session.viewport;
	let px = |world: V2| view.world_to_screen(world);
	let line_width = (grid * styles.line_size_grid * view.zoom).max(1.0);
	let circuit = session.circuit();
	for conn in circuit.connections.iter() {
		let Some((start, end)) = connection_endpoints(circuit, conn, grid) else {
			continue;
		};
		let value = circuit.gate(conn.from.gate_id).map(|gate| gate.output(conn.from.port_index)).unwrap_or(false);
		draw.draw_polyline(vec![px(start), px(end)], styles.color_from_signal(value), line_width);
	}
	for gate in circuit.gates.iter() {
		let (min, max) = gate_bounds(gate, grid);
		let border = if selected == Some(gate.id) {styles.color_selected} else {styles.color_foreground};
		draw.draw_rect(px(min), px(max), styles.color_gate_body, border);
		let text_size = grid * styles.text_size_grid * view.zoom;
		draw.text(gate.def().display_name, px(min), styles.text_color, text_size);
		match GateReadout::of(gate) {
			GateReadout::Nibble{segments, ..} if gate.kind == GateKind::HexDisplay => {
				let origin = min + V2::new(grid, grid * 1.5);
				for (bit, ((x0, y0), (x1, y1))) in SEGMENT_LINES.iter().enumerate() {
					let color = if (segments >> bit) & 1 == 1 {styles.color_segment_on} else {styles.color_segment_off};
					let a = origin + V2::new(*x0, *y0) * grid;
					let b = origin + V2::new(*x1, *y1) * grid;
					draw.draw_polyline(vec![px(a), px(b)], color, line_width * 2.0);
				}
			},
			GateReadout::None => {},
			readout => draw.text(&readout.to_text(), px((min + max) / 2.0), styles.text_color, text_size)
		}
		for side in [PortSide::Input, PortSide::Output] {
			for index in 0..gate.def().port_count(side) {
				if let Some(pos) = port_world_position(gate, side, index, grid) {
					draw.draw_circle_filled(px(pos), grid * styles.port_radius_grid * view.zoom, styles.color_from_signal(gate.port_value(side, index)));
				}
			}
		}
	}
	for pos in session.flow.positions(circuit, grid) {
		draw.draw_circle_filled(px(pos), grid * styles.port_radius_grid * view.zoom, styles.color_flow_packet);
	}
	if let Some((start, end)) = pending_wire {
		draw.draw_polyline(vec![px(start), px(end)], styles.color_wire_in_progress, line_width);
	}
}
