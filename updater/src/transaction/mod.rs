//! Buffered, revertible edit transactions.
//!
//! A transaction collects edits for one layer in a live buffer. [`flush`](TransactionHandle::flush) previews the live
//! buffer on the editor layer, a save point folds the live buffer into the saved buffer, and a commit writes everything
//! to the target layer as a single moment.

pub mod clip;
pub mod path;
pub mod sequence;
pub mod text;
pub mod transform;

pub use clip::ClipEdit;
pub use path::PathEdit;
pub use sequence::SequenceEdit;
pub use text::TextEdit;
pub use transform::TransformEdit;

use crate::affine;
use crate::error::TransactionError;
use crate::transform_map::TransformMap;

use draw_api::{DrawHistoryEditSession, DrawLayerMomentBuilder, Fill, HistoryError, LayerId, PathItem, Transform};

use glam::DVec2;
use spin::Mutex;
use std::fmt;
use std::sync::Arc;

pub type PathTransaction = TransactionHandle<PathEdit>;
pub type ClipTransaction = TransactionHandle<ClipEdit>;
pub type TextTransaction = TransactionHandle<TextEdit>;
pub type TransformTransaction = TransactionHandle<TransformEdit>;
pub type ChangeSequenceTransaction = TransactionHandle<SequenceEdit>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
	New,
	Dirty,
	SavePoint,
	Committed,
	Cancelled,
}

impl TransactionState {
	pub fn is_alive(&self) -> bool {
		!matches!(self, TransactionState::Committed | TransactionState::Cancelled)
	}
}

/// Content collected by a transaction between two checkpoints.
pub trait EditBuffer: Default + Send + 'static {
	fn is_empty(&self) -> bool;
	/// Folds `later`, which was buffered after everything already in `self`.
	fn merge(&mut self, later: Self);
}

impl EditBuffer for Vec<PathItem> {
	fn is_empty(&self) -> bool {
		Vec::is_empty(self)
	}

	fn merge(&mut self, later: Self) {
		self.extend(later);
	}
}

impl EditBuffer for String {
	fn is_empty(&self) -> bool {
		str::is_empty(self)
	}

	fn merge(&mut self, later: Self) {
		self.push_str(&later);
	}
}

/// A replacing buffer: the latest value wins.
impl<T: Send + 'static> EditBuffer for Option<T> {
	fn is_empty(&self) -> bool {
		self.is_none()
	}

	fn merge(&mut self, later: Self) {
		if later.is_some() {
			*self = later;
		}
	}
}

/// What a transaction edits and how its buffered content turns into layer moments.
pub trait EditKind: Send + 'static {
	type Buffer: EditBuffer;

	/// Writes a non-empty `buffer` through `writer`.
	fn write(&self, buffer: &Self::Buffer, writer: &mut MomentWriter<'_>) -> Result<(), HistoryError>;

	/// Forgets the kind's own attributes when the transaction is cancelled.
	fn discard(&mut self) {}

	/// Runs after `content` was written to the target layer by a commit.
	fn committed(&mut self, _content: &Self::Buffer) {}
}

/// Where a [`MomentWriter`] sends its moments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
	/// The transient editor layer, shown while the transaction is still open.
	Preview,
	/// The transaction's target layer, recorded in the history.
	Commit,
}

/// Hands an [`EditKind`] the session and a lazily created layer builder for one write.
pub struct MomentWriter<'a> {
	stage: WriteStage,
	layer_id: Option<LayerId>,
	layer_transform: Transform,
	session: &'a mut Box<dyn DrawHistoryEditSession>,
	builder: &'a mut Option<Box<dyn DrawLayerMomentBuilder>>,
}

impl MomentWriter<'_> {
	pub fn stage(&self) -> WriteStage {
		self.stage
	}

	/// The committed transform of the transaction's target layer.
	pub fn layer_transform(&self) -> Transform {
		self.layer_transform
	}

	pub fn session(&mut self) -> &mut Box<dyn DrawHistoryEditSession> {
		self.session
	}

	/// The builder of the layer this stage writes to, created on first use and reused by later writes.
	pub fn builder(&mut self) -> Option<&mut Box<dyn DrawLayerMomentBuilder>> {
		let layer_id = self.layer_id?;
		let session = &mut *self.session;
		Some(self.builder.get_or_insert_with(|| session.layer_builder(layer_id)))
	}
}

/// What the coordinator hands a transaction when it begins.
pub(crate) struct TransactionContext {
	pub session: Option<Box<dyn DrawHistoryEditSession>>,
	pub editor_layer_id: Option<LayerId>,
	pub transform_map: Arc<Mutex<TransformMap>>,
}

pub struct Transaction<K: EditKind> {
	state: TransactionState,
	/// The state restored by [`Transaction::restore_save_point`].
	checkpoint: TransactionState,
	layer_id: Option<LayerId>,
	editor_layer_id: Option<LayerId>,
	session: Option<Box<dyn DrawHistoryEditSession>>,
	transform_map: Arc<Mutex<TransformMap>>,
	layer_builder: Option<Box<dyn DrawLayerMomentBuilder>>,
	editor_builder: Option<Box<dyn DrawLayerMomentBuilder>>,
	kind: K,
	buffer: K::Buffer,
	saved: K::Buffer,
}

impl<K: EditKind> Transaction<K> {
	pub(crate) fn new(context: TransactionContext, layer_id: Option<LayerId>, kind: K) -> Self {
		Self {
			state: TransactionState::New,
			checkpoint: TransactionState::New,
			layer_id,
			editor_layer_id: context.editor_layer_id,
			session: context.session,
			transform_map: context.transform_map,
			layer_builder: None,
			editor_builder: None,
			kind,
			buffer: Default::default(),
			saved: Default::default(),
		}
	}

	pub fn state(&self) -> TransactionState {
		self.state
	}

	pub fn is_alive(&self) -> bool {
		self.state.is_alive()
	}

	fn ensure_alive(&self) -> Result<(), TransactionError> {
		if self.is_alive() { Ok(()) } else { Err(TransactionError::Dead { state: self.state }) }
	}

	/// Runs before every change to the buffers or attributes.
	fn init(&mut self) -> Result<(), TransactionError> {
		self.ensure_alive()?;
		if self.state == TransactionState::New {
			self.state = TransactionState::Dirty;
		}
		Ok(())
	}

	/// The committed transform of the target layer as of the step that began this transaction or any later step.
	fn layer_transform(&self) -> Transform {
		self.layer_id.map(|layer_id| self.transform_map.lock().transform(layer_id)).unwrap_or_default()
	}

	/// Converts a world point into the target layer's local coordinates.
	fn to_local(&self, x: f64, y: f64) -> DVec2 {
		affine::apply(affine::invert(self.layer_transform()), x, y)
	}

	/// Converts the geometry of a gradient fill into the target layer's local coordinates. Radii are kept as given.
	fn to_local_fill(&self, mut fill: Fill) -> Fill {
		if let Some(gradient) = fill.linear_gradient.as_mut() {
			let start = self.to_local(gradient.x0, gradient.y0);
			let end = self.to_local(gradient.x1, gradient.y1);
			(gradient.x0, gradient.y0, gradient.x1, gradient.y1) = (start.x, start.y, end.x, end.y);
		}
		if let Some(gradient) = fill.radial_gradient.as_mut() {
			let start = self.to_local(gradient.x0, gradient.y0);
			let end = self.to_local(gradient.x1, gradient.y1);
			(gradient.x0, gradient.y0, gradient.x1, gradient.y1) = (start.x, start.y, end.x, end.y);
		}
		fill
	}

	pub fn flush(&mut self) -> Result<(), TransactionError> {
		self.init()?;
		if self.buffer.is_empty() {
			return Ok(());
		}

		let layer_transform = self.layer_transform();
		let Some(session) = self.session.as_mut() else { return Ok(()) };
		let mut writer = MomentWriter {
			stage: WriteStage::Preview,
			layer_id: self.editor_layer_id,
			layer_transform,
			session,
			builder: &mut self.editor_builder,
		};
		self.kind.write(&self.buffer, &mut writer)?;
		Ok(())
	}

	pub fn set_save_point(&mut self) -> Result<(), TransactionError> {
		self.ensure_alive()?;
		let live = std::mem::take(&mut self.buffer);
		self.saved.merge(live);
		self.state = TransactionState::SavePoint;
		self.checkpoint = TransactionState::SavePoint;
		Ok(())
	}

	pub fn restore_save_point(&mut self) -> Result<(), TransactionError> {
		self.ensure_alive()?;
		self.buffer = Default::default();
		self.state = self.checkpoint;
		Ok(())
	}

	/// Writes everything buffered since the last commit to the target layer as one moment, unless nothing was buffered.
	///
	/// With `duration` the transaction stays open for further edits and keeps its session. Otherwise it is finished and
	/// the session is released.
	pub fn commit(&mut self, duration: bool) -> Result<(), TransactionError> {
		self.ensure_alive()?;
		let live = std::mem::take(&mut self.buffer);
		self.saved.merge(live);
		let content = std::mem::take(&mut self.saved);

		let result = if content.is_empty() { Ok(()) } else { self.write_to_layer(&content) };
		if result.is_ok() && !content.is_empty() {
			self.kind.committed(&content);
		}
		self.checkpoint = TransactionState::SavePoint;

		if duration {
			self.state = TransactionState::SavePoint;
		} else {
			self.state = TransactionState::Committed;
			self.release();
		}
		result.map_err(Into::into)
	}

	/// Discards everything buffered since the last commit without writing it.
	pub fn cancel(&mut self, duration: bool) -> Result<(), TransactionError> {
		self.ensure_alive()?;
		self.buffer = Default::default();
		self.saved = Default::default();
		self.kind.discard();
		self.checkpoint = TransactionState::SavePoint;

		if duration {
			self.state = TransactionState::SavePoint;
		} else {
			self.state = TransactionState::Cancelled;
			self.release();
		}
		Ok(())
	}

	fn write_to_layer(&mut self, content: &K::Buffer) -> Result<(), HistoryError> {
		let layer_transform = self.layer_transform();
		let Some(session) = self.session.as_mut() else { return Ok(()) };
		let mut writer = MomentWriter {
			stage: WriteStage::Commit,
			layer_id: self.layer_id,
			layer_transform,
			session,
			builder: &mut self.layer_builder,
		};
		self.kind.write(content, &mut writer)
	}

	fn release(&mut self) {
		self.layer_builder = None;
		self.editor_builder = None;
		if let Some(session) = self.session.take() {
			session.release();
		}
	}
}

impl<K: EditKind> fmt::Debug for Transaction<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Transaction")
			.field("state", &self.state)
			.field("layer_id", &self.layer_id)
			.field("editor_layer_id", &self.editor_layer_id)
			.field("has_session", &self.session.is_some())
			.finish()
	}
}

/// A shareable handle on a [`Transaction`]. Clones refer to the same transaction.
pub struct TransactionHandle<K: EditKind>(Arc<Mutex<Transaction<K>>>);

impl<K: EditKind> Clone for TransactionHandle<K> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<K: EditKind> fmt::Debug for TransactionHandle<K> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.lock().fmt(f)
	}
}

impl<K: EditKind> TransactionHandle<K> {
	pub(crate) fn new(context: TransactionContext, layer_id: Option<LayerId>, kind: K) -> Self {
		Self(Arc::new(Mutex::new(Transaction::new(context, layer_id, kind))))
	}

	pub fn state(&self) -> TransactionState {
		self.0.lock().state()
	}

	pub fn is_alive(&self) -> bool {
		self.0.lock().is_alive()
	}

	pub fn layer_id(&self) -> Option<LayerId> {
		self.0.lock().layer_id
	}

	/// Shows the edits made since the last save point on the editor layer.
	pub fn flush(&self) -> Result<&Self, TransactionError> {
		self.0.lock().flush()?;
		Ok(self)
	}

	pub fn set_save_point(&self) -> Result<&Self, TransactionError> {
		self.0.lock().set_save_point()?;
		Ok(self)
	}

	/// Drops the edits made since the last save point.
	pub fn restore_save_point(&self) -> Result<&Self, TransactionError> {
		self.0.lock().restore_save_point()?;
		Ok(self)
	}

	pub fn commit(&self, duration: bool) -> Result<(), TransactionError> {
		self.0.lock().commit(duration)
	}

	pub fn cancel(&self, duration: bool) -> Result<(), TransactionError> {
		self.0.lock().cancel(duration)
	}

	/// Marks the transaction dirty and runs `edit` on it, refusing once the transaction is finished.
	fn edit<R>(&self, edit: impl FnOnce(&mut Transaction<K>) -> R) -> Result<R, TransactionError> {
		let mut transaction = self.0.lock();
		transaction.init()?;
		Ok(edit(&mut transaction))
	}
}

/// The transaction the coordinator resolves before its next step.
pub(crate) trait PendingTransaction: Send {
	fn is_alive(&self) -> bool;
	fn commit(&self) -> Result<(), TransactionError>;
	fn cancel(&self) -> Result<(), TransactionError>;
}

impl<K: EditKind> PendingTransaction for TransactionHandle<K> {
	fn is_alive(&self) -> bool {
		TransactionHandle::is_alive(self)
	}

	fn commit(&self) -> Result<(), TransactionError> {
		TransactionHandle::commit(self, false)
	}

	fn cancel(&self) -> Result<(), TransactionError> {
		TransactionHandle::cancel(self, false)
	}
}
