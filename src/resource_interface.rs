//! For loading and saving things using JSON

#[cfg(feature = "using_filesystem")]
use std::{fs, io, path::Path};
use std::collections::HashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use log::{info, warn};
use crate::prelude::*;
use crate::error::Result;

// STATICS
pub static CIRCUITS_DIR: &str = "resources/circuits/";
pub static STYLES_FILE: &str = "resources/styles.json";
pub static CONFIG_FILE: &str = "resources/config.json";

/// Like `Gate` but serializable, signal arrays are written as 0/1
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateSave {
	pub id: GateId,
	/// Catalog identifier
	#[serde(rename = "type")]
	pub type_name: String,
	pub x: f32,
	pub y: f32,
	#[serde(default, with = "signal_bits")]
	pub inputs: Vec<bool>,
	#[serde(default, with = "signal_bits")]
	pub outputs: Vec<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<Value>
}

impl GateSave {
	pub fn from_gate(gate: &Gate) -> Self {
		Self {
			id: gate.id,
			type_name: gate.kind.name().to_owned(),
			x: gate.position.x,
			y: gate.position.y,
			inputs: gate.inputs.clone(),
			outputs: gate.outputs.clone(),
			state: serde_json::to_value(&gate.state).ok()
		}
	}
	/// `None` if the type is not in the catalog
	pub fn to_gate(&self) -> Option<Gate> {
		let kind = GateKind::from_name(&self.type_name)?;
		let mut gate = Gate::new(self.id, kind, V2::new(self.x, self.y));
		for (slot, value) in gate.inputs.iter_mut().zip(self.inputs.iter()) {
			*slot = *value;
		}
		for (slot, value) in gate.outputs.iter_mut().zip(self.outputs.iter()) {
			*slot = *value;
		}
		gate.state = GateState::from_save(kind, self.state.as_ref());
		Some(gate)
	}
}

/// Like `Circuit` but serializable, the native file format
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitSave {
	pub gates: Vec<GateSave>,
	pub connections: Vec<Connection>,
	#[serde(default)]
	pub next_id: Option<GateId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub view: Option<ViewSave>
}

impl CircuitSave {
	pub fn from_circuit(circuit: &Circuit, view: Option<ViewSave>) -> Self {
		Self {
			gates: circuit.gates.iter().map(GateSave::from_gate).collect(),
			connections: circuit.connections.clone(),
			next_id: Some(circuit.next_id),
			view
		}
	}
	/// Parses and checks the top level shape, nothing is built yet
	pub fn from_json(raw: &str) -> Result<Self> {
		let value: Value = serde_json::from_str(raw)?;
		for key in ["gates", "connections"] {
			if value.get(key).is_none() {
				return Err(SimError::MalformedFile(format!("missing `{}`", key)));
			}
		}
		let save: Self = serde_json::from_value(value).map_err(|e| SimError::MalformedFile(e.to_string()))?;
		if let Some(gate) = save.gates.iter().find(|gate| gate.id > MAX_GATE_ID) {
			return Err(SimError::MalformedFile(format!("gate ID {} is out of range", gate.id)));
		}
		if let Some(next_id) = save.next_id.filter(|next_id| *next_id > MAX_GATE_ID + 1) {
			return Err(SimError::MalformedFile(format!("`nextId` {} is out of range", next_id)));
		}
		Ok(save)
	}
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
	/// Builds a fresh circuit
	/// Gates of unknown type or with a duplicate or out of range ID are dropped, and so is every connection that ends up dangling or invalid
	pub fn to_circuit(&self) -> Circuit {
		let mut circuit = Circuit::new();
		let mut dropped: HashSet<GateId> = HashSet::new();
		for gate_save in self.gates.iter() {
			match gate_save.to_gate() {
				Some(gate) => {
					if !circuit.insert_gate(gate) {
						warn!("Dropping gate with duplicate or out of range ID {}", gate_save.id);
					}
				},
				None => {
					warn!("Dropping gate {} of unknown type \"{}\"", gate_save.id, gate_save.type_name);
					dropped.insert(gate_save.id);
				}
			}
		}
		for conn in self.connections.iter() {
			if !(circuit.contains_gate(conn.from.gate_id) && circuit.contains_gate(conn.to.gate_id)) {
				if !(dropped.contains(&conn.from.gate_id) || dropped.contains(&conn.to.gate_id)) {
					warn!("Dropping connection {:?} to a gate that does not exist", conn);
				}
				continue;
			}
			if let WireOutcome::Rejected(rejection) = circuit.add_connection(*conn) {
				warn!("Dropping invalid connection {:?}: {:?}", conn, rejection);
			}
		}
		if let Some(saved_next_id) = self.next_id {
			circuit.next_id = circuit.next_id.max(saved_next_id.min(MAX_GATE_ID + 1));
		}
		info!("Loaded circuit with {} gates and {} connections", circuit.gates.len(), circuit.connections.len());
		circuit
	}
}

/// `Vec<bool>` as an array of 0/1, reading also accepts JSON booleans
mod signal_bits {
	use super::*;

	pub fn serialize<S: Serializer>(bits: &Vec<bool>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let numbers: Vec<u8> = bits.iter().map(|bit| *bit as u8).collect();
		numbers.serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<bool>, D::Error> {
		let raw: Vec<Value> = Vec::deserialize(deserializer)?;
		Ok(raw.iter().map(|value| match value {
			Value::Bool(b) => *b,
			Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
			_ => false
		}).collect())
	}
}

#[cfg(feature = "using_filesystem")]
pub fn get_circuit_file_path(circuit_rel_path: &str) -> String {
	CIRCUITS_DIR.to_owned() + circuit_rel_path + ".json"
}

#[cfg(feature = "using_filesystem")]
pub fn load_file_with_better_error(path: &str) -> Result<String> {
	fs::read_to_string(path).map_err(|err| SimError::Io(io::Error::new(err.kind(), format!("Error reading file '{}': {}", path, err))))
}

#[cfg(feature = "using_filesystem")]
pub fn read_circuit_file(path: &str) -> Result<CircuitSave> {
	CircuitSave::from_json(&load_file_with_better_error(path)?)
}

#[cfg(feature = "using_filesystem")]
pub fn write_circuit_file(path: &str, save: &CircuitSave) -> Result<()> {
	if let Some(parent) = Path::new(path).parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent)?;
		}
	}
	fs::write(path, save.to_json()?)?;
	info!("Saved circuit to {}", path);
	Ok(())
}
