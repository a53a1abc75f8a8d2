use super::{EditKind, MomentWriter, TransactionError, TransactionHandle};
use crate::affine;

use draw_api::{HistoryError, Transform};

/// Replaces a layer's transform. Every operation composes onto the layer's committed transform, so the latest call
/// decides the pending matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformEdit;

impl EditKind for TransformEdit {
	type Buffer = Option<Transform>;

	fn write(&self, matrix: &Option<Transform>, writer: &mut MomentWriter<'_>) -> Result<(), HistoryError> {
		let (Some(matrix), Some(builder)) = (*matrix, writer.builder()) else { return Ok(()) };

		builder.set_transform(matrix);
		builder.commit()
	}
}

impl TransactionHandle<TransformEdit> {
	fn compose(&self, operation: impl FnOnce(Transform) -> Transform) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let matrix = operation(transaction.layer_transform());
			transaction.buffer = Some(matrix);
		})?;
		Ok(self)
	}

	/// Pending matrix as it would be committed now, or `None` when nothing is pending.
	pub fn pending(&self) -> Option<Transform> {
		let transaction = self.0.lock();
		transaction.buffer.or(transaction.saved)
	}

	pub fn set_matrix(&self, matrix: Transform) -> Result<&Self, TransactionError> {
		self.compose(|_| matrix)
	}

	pub fn translate(&self, tx: f64, ty: f64) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::translate(committed, tx, ty))
	}

	pub fn scale_x(&self, scale_x: f64) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::scale_x(committed, scale_x))
	}

	pub fn scale_y(&self, scale_y: f64) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::scale_y(committed, scale_y))
	}

	pub fn scale(&self, scale_x: f64, scale_y: f64) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::scale(committed, scale_x, scale_y))
	}

	pub fn rotate(&self, rad: f64) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::rotate(committed, rad))
	}

	pub fn skew_x(&self, rad_x: f64) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::skew_x(committed, rad_x))
	}

	pub fn skew_y(&self, rad_y: f64) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::skew_y(committed, rad_y))
	}

	pub fn skew(&self, rad_x: f64, rad_y: f64) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::skew(committed, rad_x, rad_y))
	}

	pub fn concat(&self, matrix: Transform) -> Result<&Self, TransactionError> {
		self.compose(|committed| affine::concat(committed, matrix))
	}
}
