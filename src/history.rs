//! Snapshot-based undo/redo

use crate::prelude::*;

/// Bounded list of full circuit copies with a cursor at the one currently loaded
#[derive(Clone, Debug)]
pub struct History {
	snapshots: Vec<Circuit>,
	position: usize,
	limit: usize
}

impl History {
	pub fn new(limit: usize) -> Self {
		Self {
			snapshots: Vec::new(),
			position: 0,
			limit: limit.max(1)
		}
	}
	/// Records `circuit` as the newest state
	/// Anything after the cursor is discarded first, when over the limit the oldest snapshot goes and the cursor stays on the newest
	pub fn push(&mut self, circuit: &Circuit) {
		if !self.snapshots.is_empty() {
			self.snapshots.truncate(self.position + 1);
		}
		self.snapshots.push(circuit.clone());
		while self.snapshots.len() > self.limit {
			self.snapshots.remove(0);
		}
		self.position = self.snapshots.len() - 1;
	}
	/// Steps back, returns the snapshot to load
	pub fn undo(&mut self) -> Option<&Circuit> {
		if !self.can_undo() {
			return None;
		}
		self.position -= 1;
		self.snapshots.get(self.position)
	}
	pub fn redo(&mut self) -> Option<&Circuit> {
		if !self.can_redo() {
			return None;
		}
		self.position += 1;
		self.snapshots.get(self.position)
	}
	pub fn can_undo(&self) -> bool {
		self.position > 0
	}
	pub fn can_redo(&self) -> bool {
		self.position + 1 < self.snapshots.len()
	}
	pub fn current(&self) -> Option<&Circuit> {
		self.snapshots.get(self.position)
	}
	pub fn position(&self) -> usize {
		self.position
	}
	pub fn len(&self) -> usize {
		self.snapshots.len()
	}
	pub fn is_empty(&self) -> bool {
		self.snapshots.is_empty()
	}
	/// Forgets everything and starts over from `circuit`
	pub fn reset(&mut self, circuit: &Circuit) {
		self.snapshots.clear();
		self.position = 0;
		self.push(circuit);
	}
}
