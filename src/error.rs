//! Errors surfaced to the user, none of them leave the session unusable

use thiserror::Error;
use crate::prelude::*;

#[derive(Error, Debug)]
pub enum SimError {
	#[error("Malformed circuit file: {0}")]
	MalformedFile(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("XML error: {0}")]
	Xml(String),

	#[error("Invalid ROM contents: {0}")]
	RomEdit(String),

	#[error("No gate with ID {0}")]
	UnknownGate(GateId),

	#[error("Gate {id} is a {actual}, expected {expected}")]
	WrongGateKind {
		id: GateId,
		expected: &'static str,
		actual: GateKind
	},

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error)
}

impl From<quick_xml::Error> for SimError {
	fn from(e: quick_xml::Error) -> Self {
		SimError::Xml(e.to_string())
	}
}

impl From<quick_xml::events::attributes::AttrError> for SimError {
	fn from(e: quick_xml::events::attributes::AttrError) -> Self {
		SimError::Xml(e.to_string())
	}
}

pub type Result<T> = std::result::Result<T, SimError>;
