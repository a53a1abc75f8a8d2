use super::{EditKind, MomentWriter, TransactionError, TransactionHandle, WriteStage};

use draw_api::{HistoryError, LayerId};

/// Reorders the visible layers. There is nothing to preview, the new order is only written on commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceEdit {
	/// The order when the transaction began or was last committed, oldest layer first.
	initial: Vec<LayerId>,
}

impl SequenceEdit {
	pub fn new(initial: Vec<LayerId>) -> Self {
		Self { initial }
	}
}

impl EditKind for SequenceEdit {
	type Buffer = Option<Vec<LayerId>>;

	fn write(&self, sequence: &Option<Vec<LayerId>>, writer: &mut MomentWriter<'_>) -> Result<(), HistoryError> {
		match (writer.stage(), sequence) {
			(WriteStage::Commit, Some(sequence)) => writer.session().set_layer_sequence(sequence.clone()),
			_ => Ok(()),
		}
	}

	fn committed(&mut self, sequence: &Option<Vec<LayerId>>) {
		if let Some(sequence) = sequence {
			self.initial = sequence.clone();
		}
	}
}

impl TransactionHandle<SequenceEdit> {
	/// The order that a commit would write now.
	pub fn layers(&self) -> Vec<LayerId> {
		let transaction = self.0.lock();
		transaction.buffer.as_ref().or(transaction.saved.as_ref()).unwrap_or(&transaction.kind.initial).clone()
	}

	fn reorder(&self, reorder: impl FnOnce(&mut Vec<LayerId>)) -> Result<&Self, TransactionError> {
		let mut layers = self.layers();
		reorder(&mut layers);
		self.edit(|transaction| transaction.buffer = Some(layers))?;
		Ok(self)
	}

	pub fn set_sequence(&self, sequence: Vec<LayerId>) -> Result<&Self, TransactionError> {
		self.reorder(|layers| *layers = sequence)
	}

	/// Exchanges the positions of two layers. Unknown layers leave the order unchanged.
	pub fn swap_layers(&self, first: LayerId, second: LayerId) -> Result<&Self, TransactionError> {
		self.reorder(|layers| {
			let first = layers.iter().position(|layer_id| *layer_id == first);
			let second = layers.iter().position(|layer_id| *layer_id == second);
			if let (Some(first), Some(second)) = (first, second) {
				layers.swap(first, second);
			}
		})
	}

	/// Moves a layer to `index`, clamped to the end of the order. Unknown layers leave the order unchanged.
	pub fn move_layer(&self, layer_id: LayerId, index: usize) -> Result<&Self, TransactionError> {
		self.reorder(|layers| {
			let Some(position) = layers.iter().position(|id| *id == layer_id) else { return };
			let layer_id = layers.remove(position);
			layers.insert(index.min(layers.len()), layer_id);
		})
	}
}
