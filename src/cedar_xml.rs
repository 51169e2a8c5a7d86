//! Conversion to and from the Cedar Logic XML circuit format
//! Only a subset of the catalog has a Cedar counterpart, everything else is left out on export

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use common_macros::hash_map;
use quick_xml::{Reader, Writer, events::{BytesDecl, BytesEnd, BytesStart, Event}};
use log::{info, warn};
use crate::prelude::*;
use crate::error::Result;

pub const ROOT_ELEMENT: &str = "cedar-logic-circuit";

/// What an import had to leave out
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportReport {
	pub gates_imported: usize,
	pub connections_imported: usize,
	pub warnings: Vec<String>
}

impl ImportReport {
	fn warn(&mut self, message: String) {
		warn!("{}", message);
		self.warnings.push(message);
	}
}

/// Cedar name written on export, `None` for types Cedar has no equivalent of
pub fn export_name(kind: GateKind) -> Option<&'static str> {
	match kind {
		GateKind::And => Some("AND2"),
		GateKind::Or => Some("OR2"),
		GateKind::Nand => Some("NAND2"),
		GateKind::Nor => Some("NOR2"),
		GateKind::Xor => Some("XOR2"),
		GateKind::Xnor => Some("XNOR2"),
		GateKind::Not => Some("INVERTER"),
		GateKind::Buffer => Some("BUFFER"),
		GateKind::Input => Some("TOGGLE"),
		GateKind::Output => Some("LED"),
		GateKind::Clock => Some("CLOCK"),
		GateKind::DFlipFlop => Some("D_FLIPFLOP"),
		GateKind::JkFlipFlop => Some("JK_FLIPFLOP"),
		GateKind::HalfAdder => Some("HALF_ADDER"),
		GateKind::FullAdder => Some("FULL_ADDER"),
		_ => None
	}
}

/// Many Cedar names collapse onto one native type, wider AND/OR/etc. become the 2-input version
fn import_table() -> HashMap<&'static str, GateKind> {
	hash_map!{
		"AND2" => GateKind::And,
		"AND3" => GateKind::And,
		"AND4" => GateKind::And,
		"OR2" => GateKind::Or,
		"OR3" => GateKind::Or,
		"OR4" => GateKind::Or,
		"NAND2" => GateKind::Nand,
		"NAND3" => GateKind::Nand,
		"NAND4" => GateKind::Nand,
		"NOR2" => GateKind::Nor,
		"NOR3" => GateKind::Nor,
		"NOR4" => GateKind::Nor,
		"XOR2" => GateKind::Xor,
		"XOR3" => GateKind::Xor,
		"XOR4" => GateKind::Xor,
		"XNOR2" => GateKind::Xnor,
		"XNOR3" => GateKind::Xnor,
		"XNOR4" => GateKind::Xnor,
		"INVERTER" => GateKind::Not,
		"NOT" => GateKind::Not,
		"INV" => GateKind::Not,
		"BUFFER" => GateKind::Buffer,
		"TOGGLE" => GateKind::Input,
		"INPUT" => GateKind::Input,
		"LED" => GateKind::Output,
		"OUTPUT" => GateKind::Output,
		"CLOCK" => GateKind::Clock,
		"D_FLIPFLOP" => GateKind::DFlipFlop,
		"JK_FLIPFLOP" => GateKind::JkFlipFlop,
		"HALF_ADDER" => GateKind::HalfAdder,
		"FULL_ADDER" => GateKind::FullAdder
	}
}

pub fn import_name(cedar_type: &str) -> Option<GateKind> {
	import_table().get(cedar_type.trim().to_ascii_uppercase().as_str()).copied()
}

fn start_with_attributes<'a>(name: &'a str, attributes: &[(&str, String)]) -> BytesStart<'a> {
	let mut elem = BytesStart::new(name);
	for (key, value) in attributes {
		elem.push_attribute((*key, value.as_str()));
	}
	elem
}

fn xml_error<E: std::fmt::Display>(e: E) -> SimError {
	SimError::Xml(e.to_string())
}

/// Writes the Cedar-representable part of `circuit`, wires touching a left-out gate are left out too
pub fn export(circuit: &Circuit) -> Result<String> {
	let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
	writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None))).map_err(xml_error)?;
	writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT))).map_err(xml_error)?;
	let mut exported: HashSet<GateId> = HashSet::new();
	for gate in circuit.gates.iter() {
		let Some(cedar_type) = export_name(gate.kind) else {
			continue;
		};
		exported.insert(gate.id);
		let elem = start_with_attributes("component", &[
			("id", gate.id.to_string()),
			("type", cedar_type.to_owned()),
			("x", gate.position.x.to_string()),
			("y", gate.position.y.to_string())
		]);
		writer.write_event(Event::Empty(elem)).map_err(xml_error)?;
	}
	let mut connection_count: usize = 0;
	for conn in circuit.connections.iter() {
		if !(exported.contains(&conn.from.gate_id) && exported.contains(&conn.to.gate_id)) {
			continue;
		}
		let elem = start_with_attributes("connection", &[
			("from_gate", conn.from.gate_id.to_string()),
			("from_pin", conn.from.port_index.to_string()),
			("to_gate", conn.to.gate_id.to_string()),
			("to_pin", conn.to.port_index.to_string())
		]);
		writer.write_event(Event::Empty(elem)).map_err(xml_error)?;
		connection_count += 1;
	}
	writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT))).map_err(xml_error)?;
	let bytes = writer.into_inner().into_inner();
	info!("Exported {} gates and {} connections to Cedar XML", exported.len(), connection_count);
	String::from_utf8(bytes).map_err(xml_error)
}

/// Raw element attributes before any mapping
#[derive(Debug, Default)]
struct RawElement {
	attributes: HashMap<String, String>
}

impl RawElement {
	fn read(elem: &BytesStart) -> Result<Self> {
		let mut attributes = HashMap::new();
		for attr in elem.attributes() {
			let attr = attr?;
			let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
			let value = attr.unescape_value()?.into_owned();
			attributes.insert(key, value);
		}
		Ok(Self {attributes})
	}
	fn text(&self, key: &str) -> Option<&str> {
		self.attributes.get(key).map(|s| s.as_str())
	}
	fn number<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
		self.text(key)?.trim().parse().ok()
	}
}

/// Builds a new circuit from a Cedar document, gates get fresh IDs
/// Unknown component types and wires referring to them are skipped and reported
pub fn import(raw: &str) -> Result<(Circuit, ImportReport)> {
	let mut reader = Reader::from_str(raw);
	reader.config_mut().trim_text(true);
	let mut components: Vec<RawElement> = Vec::new();
	let mut connections: Vec<RawElement> = Vec::new();
	let mut found_root = false;
	loop {
		match reader.read_event()? {
			Event::Start(elem) | Event::Empty(elem) => {
				match elem.name().as_ref() {
					b"cedar-logic-circuit" => found_root = true,
					b"component" => components.push(RawElement::read(&elem)?),
					b"connection" => connections.push(RawElement::read(&elem)?),
					_ => {}
				}
			},
			Event::Eof => break,
			_ => {}
		}
	}
	if !found_root {
		return Err(SimError::MalformedFile(format!("no <{}> element", ROOT_ELEMENT)));
	}
	let mut circuit = Circuit::new();
	let mut report = ImportReport::default();
	// Cedar ID -> new ID
	let mut renumbered: HashMap<String, GateId> = HashMap::new();
	for component in components.iter() {
		let id = component.text("id").unwrap_or("?").to_owned();
		let cedar_type = component.text("type").unwrap_or("");
		let Some(kind) = import_name(cedar_type) else {
			report.warn(format!("Skipping component {} of unsupported type \"{}\"", id, cedar_type));
			continue;
		};
		if renumbered.contains_key(&id) {
			report.warn(format!("Skipping component {} with a duplicate ID", id));
			continue;
		}
		let position = V2::new(component.number("x").unwrap_or(0.0), component.number("y").unwrap_or(0.0));
		let new_id = circuit.next_id;
		circuit.next_id += 1;
		circuit.gates.push(Gate::new(new_id, kind, position));
		renumbered.insert(id, new_id);
	}
	for connection in connections.iter() {
		let endpoints = (
			connection.text("from_gate").and_then(|id| renumbered.get(id)),
			connection.number::<usize>("from_pin"),
			connection.text("to_gate").and_then(|id| renumbered.get(id)),
			connection.number::<usize>("to_pin")
		);
		let (Some(&from_gate), Some(from_pin), Some(&to_gate), Some(to_pin)) = endpoints else {
			report.warn(format!(
				"Skipping connection {} -> {} with a missing endpoint",
				connection.text("from_gate").unwrap_or("?"),
				connection.text("to_gate").unwrap_or("?")
			));
			continue;
		};
		let conn = Connection::new(PortRef::new(from_gate, from_pin), PortRef::new(to_gate, to_pin));
		if let WireOutcome::Rejected(rejection) = circuit.add_connection(conn) {
			report.warn(format!("Skipping invalid connection {:?}: {:?}", conn, rejection));
		}
	}
	report.gates_imported = circuit.gates.len();
	report.connections_imported = circuit.connections.len();
	info!("Imported {} gates and {} connections from Cedar XML, {} warnings", report.gates_imported, report.connections_imported, report.warnings.len());
	Ok((circuit, report))
}
