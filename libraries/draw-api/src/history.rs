use crate::LayerId;
use crate::structures::{Clip, Draw, Layer, Transform};

use futures::future::BoxFuture;
use thiserror::Error;

/// Identifies one recorded version of a [`DrawHistory`]. Numbers grow monotonically but need not be contiguous.
pub type HistoryNumber = u64;

/// A set of different errors that can occur when talking to a history.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HistoryError {
	#[error("The history lock could not be acquired: {0}")]
	LockUnavailable(String),

	#[error("Layer {0} does not exist in the current history")]
	UnknownLayer(LayerId),

	#[error("History number {0} is not recorded")]
	UnknownHistoryNumber(HistoryNumber),

	#[error("The edit session has already been released")]
	Released,
}

/// The change a single moment applied to one layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerMoment {
	/// The transform recorded by this moment, if it set one.
	pub transform: Option<Transform>,
	pub clip: Option<Clip>,
	pub draws: Vec<Draw>,
}

/// One recorded delta of a history, keyed by the layers it touched.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawMoment {
	pub history_number: HistoryNumber,
	layers: Vec<(LayerId, LayerMoment)>,
	sequence: Option<Vec<LayerId>>,
}

impl DrawMoment {
	pub fn new(history_number: HistoryNumber) -> Self {
		Self {
			history_number,
			layers: Vec::new(),
			sequence: None,
		}
	}

	pub fn with_layer(mut self, layer_id: LayerId, moment: LayerMoment) -> Self {
		self.layers.push((layer_id, moment));
		self
	}

	pub fn with_sequence(mut self, sequence: Vec<LayerId>) -> Self {
		self.sequence = Some(sequence);
		self
	}

	/// The layers touched by this moment, in the order they were recorded.
	pub fn keys(&self) -> impl Iterator<Item = LayerId> + '_ {
		self.layers.iter().map(|(id, _)| *id)
	}

	pub fn layer_moment(&self, layer_id: LayerId) -> Option<&LayerMoment> {
		self.layers.iter().find(|(id, _)| *id == layer_id).map(|(_, moment)| moment)
	}

	/// The complete layer ordering after this moment, when the moment changed it.
	pub fn sequence(&self) -> Option<&[LayerId]> {
		self.sequence.as_deref()
	}
}

/// Stages changes for one layer. [`commit`](DrawLayerMomentBuilder::commit) seals them into a layer moment, wraps that in a
/// draw moment, and appends it to the history. The builder stays usable afterwards with an empty stage.
pub trait DrawLayerMomentBuilder: Send {
	fn set_clip(&mut self, clip: Clip);
	fn add_draw(&mut self, draw: Draw);
	fn set_transform(&mut self, transform: Transform);
	fn commit(&mut self) -> Result<(), HistoryError>;
}

/// Exclusive write access to a history, obtained through [`DrawHistory::lock`].
///
/// Dropping a session releases the lock, so a session can never outlive the step that holds it.
pub trait DrawHistoryEditSession: Send {
	/// Creates a layer and returns the moment that recorded it. Transient layers are hidden from
	/// [`DrawHistory::layers`] when transient layers are excluded.
	fn add_layer(&mut self, layer: Layer, transient: bool) -> Result<DrawMoment, HistoryError>;
	fn remove_layer(&mut self, layer_id: LayerId) -> Result<(), HistoryError>;
	fn set_layer_sequence(&mut self, sequence: Vec<LayerId>) -> Result<(), HistoryError>;
	/// Moves the current-version pointer without discarding any recorded version.
	fn set_history_number_now(&mut self, history_number: HistoryNumber) -> Result<(), HistoryError>;
	fn layer_builder(&mut self, layer_id: LayerId) -> Box<dyn DrawLayerMomentBuilder>;

	fn release(self: Box<Self>) {}
}

/// Read access to a versioned drawing history.
pub trait DrawHistory: Send + Sync {
	fn lock(&self) -> BoxFuture<'static, Result<Box<dyn DrawHistoryEditSession>, HistoryError>>;

	/// `None` while nothing has been recorded.
	fn now_history_number(&self) -> Option<HistoryNumber>;
	fn first_history_number(&self) -> Option<HistoryNumber>;
	fn last_history_number(&self) -> Option<HistoryNumber>;
	/// All recorded versions, oldest first.
	fn history_numbers(&self) -> Vec<HistoryNumber>;
	/// The layer ordering as of `history_number`, oldest layer first.
	fn layers(&self, history_number: HistoryNumber, exclude_transient: bool) -> Vec<LayerId>;
	fn is_available(&self, history_number: HistoryNumber) -> bool;
	/// The moments recorded after `from_exclusive` (or from the very beginning when `None`) up to and including `to_inclusive`.
	fn moments(&self, from_exclusive: Option<HistoryNumber>, to_inclusive: HistoryNumber) -> Vec<DrawMoment>;
}
