//! Pointer gestures on the canvas turned into session mutations
//! Knows nothing about the windowing toolkit, the front-end feeds it screen positions

use log::warn;
use crate::prelude::*;
use crate::graphics;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
	Primary,
	Secondary,
	Middle
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireMode {
	/// Press on a port, release on another
	Drag,
	/// Second click on a port finishes the wire
	Click
}

/// What is under the pointer
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Hit {
	Port(Endpoint),
	Gate(GateId),
	Empty
}

#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
	Idle,
	Panning {
		last_screen: V2
	},
	MovingGate {
		gate_id: GateId,
		start_position: V2,
		/// World offset from the gate's corner to the grab point
		grab_offset: V2
	},
	Wiring {
		from: Endpoint,
		mode: WireMode,
		press_screen: V2,
		cursor_world: V2
	}
}

/// Ports win over gate bodies, later gates are drawn on top so they are checked first
pub fn hit_test(circuit: &Circuit, world: V2, grid_size: f32, port_radius: f32) -> Hit {
	let mut best: Option<(f32, Endpoint)> = None;
	for gate in circuit.gates.iter() {
		for side in [PortSide::Input, PortSide::Output] {
			for index in 0..gate.def().port_count(side) {
				let Some(pos) = graphics::port_world_position(gate, side, index, grid_size) else {
					continue;
				};
				let distance = (pos - world).norm();
				if distance <= port_radius && best.map(|(d, _)| distance < d).unwrap_or(true) {
					best = Some((distance, Endpoint::new(gate.id, side, index)));
				}
			}
		}
	}
	if let Some((_, endpoint)) = best {
		return Hit::Port(endpoint);
	}
	for gate in circuit.gates.iter().rev() {
		if point_in_bb(world, graphics::gate_bounds(gate, grid_size)) {
			return Hit::Gate(gate.id);
		}
	}
	Hit::Empty
}

pub struct InteractionController {
	pub gesture: Gesture,
	pub selected: Option<GateId>,
	/// Chosen in the palette, placed by the next primary press
	pub placing: Option<GateKind>
}

impl InteractionController {
	pub fn new() -> Self {
		Self {
			gesture: Gesture::Idle,
			selected: None,
			placing: None
		}
	}
	fn hit(&self, session: &Session, screen: V2) -> Hit {
		let world = session.viewport.screen_to_world(screen);
		hit_test(session.circuit(), world, session.config.grid_size, session.config.port_hit_radius)
	}
	pub fn pointer_down(&mut self, session: &mut Session, screen: V2, button: PointerButton) {
		let world = session.viewport.screen_to_world(screen);
		if button != PointerButton::Primary {
			if matches!(self.gesture, Gesture::Wiring{..}) || self.placing.is_some() {
				self.cancel();
				return;
			}
			self.gesture = Gesture::Panning {last_screen: screen};
			return;
		}
		let hit = self.hit(session, screen);
		if let Gesture::Wiring{from, mode: WireMode::Click, ..} = self.gesture {
			// Anything other than a port abandons the pending wire
			if let Hit::Port(to) = hit {
				session.connect(from, to);
			}
			self.gesture = Gesture::Idle;
			return;
		}
		if let Some(kind) = self.placing.take() {
			// Centered on the pointer
			let half_size = kind.def().size.to_v2() * session.config.grid_size / 2.0;
			self.selected = Some(session.add_gate(kind, world - half_size));
			return;
		}
		self.gesture = match hit {
			Hit::Port(from) => Gesture::Wiring {
				from,
				mode: WireMode::Drag,
				press_screen: screen,
				cursor_world: world
			},
			Hit::Gate(gate_id) => {
				self.selected = Some(gate_id);
				let start_position = session.circuit().gate(gate_id).map(|gate| gate.position).unwrap_or(world);
				Gesture::MovingGate {
					gate_id,
					start_position,
					grab_offset: world - start_position
				}
			},
			Hit::Empty => {
				self.selected = None;
				Gesture::Panning {last_screen: screen}
			}
		};
	}
	pub fn pointer_move(&mut self, session: &mut Session, screen: V2) {
		let world = session.viewport.screen_to_world(screen);
		match &mut self.gesture {
			Gesture::Idle => {},
			Gesture::Panning{last_screen} => {
				session.viewport.pan(screen - *last_screen);
				*last_screen = screen;
			},
			Gesture::MovingGate{gate_id, grab_offset, ..} => {
				// The gate may have been deleted by an undo mid-drag
				if session.drag_gate(*gate_id, world - *grab_offset).is_err() {
					self.gesture = Gesture::Idle;
				}
			},
			Gesture::Wiring{cursor_world, ..} => {
				*cursor_world = world;
			}
		}
	}
	pub fn pointer_up(&mut self, session: &mut Session, screen: V2) {
		let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
		match gesture {
			Gesture::MovingGate{gate_id, start_position, ..} => {
				// A click that did not move an INPUT toggles it
				if let Ok(false) = session.finish_drag(gate_id, start_position) {
					match session.toggle_input(gate_id) {
						Ok(_) | Err(SimError::WrongGateKind{..}) => {},
						Err(e) => warn!("Could not toggle gate {}: {}", gate_id, e)
					}
				}
			},
			Gesture::Wiring{from, mode: WireMode::Drag, press_screen, ..} => {
				match self.hit(session, screen) {
					Hit::Port(to) if to != from => {
						session.connect(from, to);
					},
					_ => {
						if (screen - press_screen).norm() <= session.config.click_wire_threshold {
							self.gesture = Gesture::Wiring {
								from,
								mode: WireMode::Click,
								press_screen,
								cursor_world: session.viewport.screen_to_world(screen)
							};
						}
					}
				}
			},
			// Still waiting for the second click
			wiring @ Gesture::Wiring{mode: WireMode::Click, ..} => self.gesture = wiring,
			Gesture::Panning{..} | Gesture::Idle => {}
		}
	}
	/// Scroll wheel, positive `steps` zoom in around the pointer
	pub fn scroll(&mut self, session: &mut Session, screen: V2, steps: f32) {
		session.viewport.zoom_at(screen, 1.1_f32.powf(steps));
	}
	pub fn delete_selected(&mut self, session: &mut Session) -> bool {
		match self.selected.take() {
			Some(id) => session.remove_gate(id),
			None => false
		}
	}
	/// Drops the pending wire and palette choice
	pub fn cancel(&mut self) {
		self.gesture = Gesture::Idle;
		self.placing = None;
	}
	/// World start and end of the wire being drawn
	pub fn pending_wire(&self, session: &Session) -> Option<(V2, V2)> {
		let Gesture::Wiring{from, cursor_world, ..} = &self.gesture else {
			return None;
		};
		let gate = session.circuit().gate(from.gate_id)?;
		let start = graphics::port_world_position(gate, from.side, from.index, session.config.grid_size)?;
		Some((start, *cursor_world))
	}
}

impl Default for InteractionController {
	fn default() -> Self {
		Self::new()
	}
}
