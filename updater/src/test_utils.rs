use crate::updater::{Updater, create_instance};

use draw_api::{Clip, Draw, DrawHistory, DrawHistoryEditSession, DrawLayerMomentBuilder, DrawMoment, HistoryError, HistoryNumber, Layer, LayerId, LayerMoment, Transform};

use async_mutex::{Mutex as AsyncMutex, MutexGuardArc};
use futures::FutureExt;
use futures::future::BoxFuture;
use spin::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Something observable the history did, recorded in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEvent {
	Locked,
	Released,
	LayerAdded(LayerId),
	LayerCommitted(LayerId),
	PreviewCommitted(LayerId),
	SequenceChanged,
	NowChanged(HistoryNumber),
}

/// A call made on a layer builder handed out by the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderCall {
	SetClip,
	AddDraw,
	SetTransform,
	Commit,
}

#[derive(Debug, Default)]
struct HistoryState {
	moments: Vec<DrawMoment>,
	now: Option<HistoryNumber>,
	next_history_number: HistoryNumber,
	next_layer_id: LayerId,
	transient: HashSet<LayerId>,
	previews: HashMap<LayerId, Vec<LayerMoment>>,
	builder_calls: HashMap<LayerId, Vec<BuilderCall>>,
	builders_created: usize,
	scanned_moments: usize,
	lock_failures: usize,
	events: Vec<HistoryEvent>,
}

impl HistoryState {
	/// Appends a moment after the current version, discarding every version that was undone.
	fn append(&mut self, moment: impl FnOnce(HistoryNumber) -> DrawMoment) -> DrawMoment {
		if let Some(now) = self.now {
			self.moments.retain(|moment| moment.history_number <= now);
		} else {
			self.moments.clear();
		}

		self.next_history_number += 1;
		let moment = moment(self.next_history_number);
		self.now = Some(moment.history_number);
		self.moments.push(moment.clone());
		moment
	}

	fn sequence_at(&self, history_number: HistoryNumber) -> Vec<LayerId> {
		self.moments
			.iter()
			.filter(|moment| moment.history_number <= history_number)
			.filter_map(|moment| moment.sequence())
			.next_back()
			.map(<[LayerId]>::to_vec)
			.unwrap_or_default()
	}

	fn current_sequence(&self) -> Vec<LayerId> {
		self.now.map(|now| self.sequence_at(now)).unwrap_or_default()
	}

	fn add_layer(&mut self, layer: Layer, transient: bool) -> DrawMoment {
		self.next_layer_id += 1;
		let layer_id = self.next_layer_id;
		if transient {
			self.transient.insert(layer_id);
		}

		let mut sequence = self.current_sequence();
		sequence.push(layer_id);
		let layer_moment = LayerMoment {
			transform: Some(layer.transform),
			clip: layer.clip,
			draws: layer.draws,
		};

		self.events.push(HistoryEvent::LayerAdded(layer_id));
		self.append(|history_number| DrawMoment::new(history_number).with_layer(layer_id, layer_moment).with_sequence(sequence))
	}
}

/// An in-memory [`DrawHistory`] used to exercise the updater. Clones share the same state.
///
/// Every layer creation, removal, reordering and committed non-transient layer moment appends a new version. Moments
/// committed to transient layers are kept aside as previews and do not create versions.
#[derive(Clone)]
pub struct MemoryHistory {
	state: Arc<Mutex<HistoryState>>,
	lock: Arc<AsyncMutex<()>>,
}

impl MemoryHistory {
	pub fn new() -> Self {
		Self {
			state: Default::default(),
			lock: Arc::new(AsyncMutex::new(())),
		}
	}

	/// Creates a permanent layer without going through a session.
	pub fn push_layer(&self) -> LayerId {
		let moment = self.state.lock().add_layer(Layer::default(), false);
		moment.keys().next().unwrap_or_default()
	}

	pub fn push_transform(&self, layer_id: LayerId, transform: Transform) {
		let layer_moment = LayerMoment {
			transform: Some(transform),
			..Default::default()
		};
		self.state.lock().append(|history_number| DrawMoment::new(history_number).with_layer(layer_id, layer_moment));
	}

	pub fn push_draw_only(&self, layer_id: LayerId) {
		let layer_moment = LayerMoment {
			draws: vec![Draw::Graphics(Default::default())],
			..Default::default()
		};
		self.state.lock().append(|history_number| DrawMoment::new(history_number).with_layer(layer_id, layer_moment));
	}

	/// Moves the current version without a session, as another client of the history would.
	pub fn rewind_to(&self, history_number: HistoryNumber) {
		self.state.lock().now = Some(history_number);
	}

	/// Makes the next `count` calls to [`DrawHistory::lock`] fail.
	pub fn fail_next_locks(&self, count: usize) {
		self.state.lock().lock_failures = count;
	}

	pub fn is_locked(&self) -> bool {
		self.lock.try_lock().is_none()
	}

	pub fn version_count(&self) -> usize {
		self.state.lock().moments.len()
	}

	pub fn scanned_moments(&self) -> usize {
		self.state.lock().scanned_moments
	}

	pub fn builders_created(&self) -> usize {
		self.state.lock().builders_created
	}

	pub fn builder_calls(&self, layer_id: LayerId) -> Vec<BuilderCall> {
		self.state.lock().builder_calls.get(&layer_id).cloned().unwrap_or_default()
	}

	pub fn events(&self) -> Vec<HistoryEvent> {
		self.state.lock().events.clone()
	}

	pub fn clear_events(&self) {
		self.state.lock().events.clear();
	}

	pub fn is_transient(&self, layer_id: LayerId) -> bool {
		self.state.lock().transient.contains(&layer_id)
	}

	/// The moments recorded for `layer_id` up to the current version, oldest first.
	pub fn layer_moments(&self, layer_id: LayerId) -> Vec<LayerMoment> {
		let state = self.state.lock();
		let Some(now) = state.now else { return Vec::new() };
		state
			.moments
			.iter()
			.filter(|moment| moment.history_number <= now)
			.filter_map(|moment| moment.layer_moment(layer_id).cloned())
			.collect()
	}

	/// The layer moments written after the layer was created.
	pub fn committed_moments(&self, layer_id: LayerId) -> Vec<LayerMoment> {
		self.layer_moments(layer_id).into_iter().skip(1).collect()
	}

	pub fn previews(&self, layer_id: LayerId) -> Vec<LayerMoment> {
		self.state.lock().previews.get(&layer_id).cloned().unwrap_or_default()
	}
}

impl DrawHistory for MemoryHistory {
	fn lock(&self) -> BoxFuture<'static, Result<Box<dyn DrawHistoryEditSession>, HistoryError>> {
		let state = self.state.clone();
		let lock = self.lock.clone();

		async move {
			let failing = {
				let mut state = state.lock();
				let failing = state.lock_failures > 0;
				state.lock_failures = state.lock_failures.saturating_sub(1);
				failing
			};
			if failing {
				return Err(HistoryError::LockUnavailable("the history is offline".to_string()));
			}

			let guard = lock.lock_arc().await;
			state.lock().events.push(HistoryEvent::Locked);
			Ok(Box::new(MemorySession { state, _guard: guard }) as Box<dyn DrawHistoryEditSession>)
		}
		.boxed()
	}

	fn now_history_number(&self) -> Option<HistoryNumber> {
		self.state.lock().now
	}

	fn first_history_number(&self) -> Option<HistoryNumber> {
		self.state.lock().moments.first().map(|moment| moment.history_number)
	}

	fn last_history_number(&self) -> Option<HistoryNumber> {
		self.state.lock().moments.last().map(|moment| moment.history_number)
	}

	fn history_numbers(&self) -> Vec<HistoryNumber> {
		self.state.lock().moments.iter().map(|moment| moment.history_number).collect()
	}

	fn layers(&self, history_number: HistoryNumber, exclude_transient: bool) -> Vec<LayerId> {
		let state = self.state.lock();
		let mut layers = state.sequence_at(history_number);
		if exclude_transient {
			layers.retain(|layer_id| !state.transient.contains(layer_id));
		}
		layers
	}

	fn is_available(&self, history_number: HistoryNumber) -> bool {
		self.state.lock().moments.iter().any(|moment| moment.history_number == history_number)
	}

	fn moments(&self, from_exclusive: Option<HistoryNumber>, to_inclusive: HistoryNumber) -> Vec<DrawMoment> {
		let mut state = self.state.lock();
		let moments: Vec<_> = state
			.moments
			.iter()
			.filter(|moment| from_exclusive.is_none_or(|from| moment.history_number > from) && moment.history_number <= to_inclusive)
			.cloned()
			.collect();
		state.scanned_moments += moments.len();
		moments
	}
}

struct MemorySession {
	state: Arc<Mutex<HistoryState>>,
	_guard: MutexGuardArc<()>,
}

impl Drop for MemorySession {
	fn drop(&mut self) {
		self.state.lock().events.push(HistoryEvent::Released);
	}
}

impl DrawHistoryEditSession for MemorySession {
	fn add_layer(&mut self, layer: Layer, transient: bool) -> Result<DrawMoment, HistoryError> {
		Ok(self.state.lock().add_layer(layer, transient))
	}

	fn remove_layer(&mut self, layer_id: LayerId) -> Result<(), HistoryError> {
		let mut state = self.state.lock();
		let mut sequence = state.current_sequence();
		if !sequence.contains(&layer_id) {
			return Err(HistoryError::UnknownLayer(layer_id));
		}
		sequence.retain(|id| *id != layer_id);
		state.append(|history_number| DrawMoment::new(history_number).with_sequence(sequence));
		Ok(())
	}

	fn set_layer_sequence(&mut self, sequence: Vec<LayerId>) -> Result<(), HistoryError> {
		let mut state = self.state.lock();
		let current = state.current_sequence();
		if let Some(unknown) = sequence.iter().find(|layer_id| !current.contains(layer_id)) {
			return Err(HistoryError::UnknownLayer(*unknown));
		}

		// Transient layers keep their place at the end of the ordering
		let transient: Vec<_> = current.into_iter().filter(|layer_id| state.transient.contains(layer_id) && !sequence.contains(layer_id)).collect();
		let mut sequence = sequence;
		sequence.extend(transient);
		state.events.push(HistoryEvent::SequenceChanged);
		state.append(|history_number| DrawMoment::new(history_number).with_sequence(sequence));
		Ok(())
	}

	fn set_history_number_now(&mut self, history_number: HistoryNumber) -> Result<(), HistoryError> {
		let mut state = self.state.lock();
		if !state.moments.iter().any(|moment| moment.history_number == history_number) {
			return Err(HistoryError::UnknownHistoryNumber(history_number));
		}
		state.now = Some(history_number);
		state.events.push(HistoryEvent::NowChanged(history_number));
		Ok(())
	}

	fn layer_builder(&mut self, layer_id: LayerId) -> Box<dyn DrawLayerMomentBuilder> {
		self.state.lock().builders_created += 1;
		Box::new(MemoryLayerBuilder {
			state: self.state.clone(),
			layer_id,
			staged: LayerMoment::default(),
		})
	}
}

struct MemoryLayerBuilder {
	state: Arc<Mutex<HistoryState>>,
	layer_id: LayerId,
	staged: LayerMoment,
}

impl MemoryLayerBuilder {
	fn record(&self, call: BuilderCall) {
		self.state.lock().builder_calls.entry(self.layer_id).or_default().push(call);
	}
}

impl DrawLayerMomentBuilder for MemoryLayerBuilder {
	fn set_clip(&mut self, clip: Clip) {
		self.record(BuilderCall::SetClip);
		self.staged.clip = Some(clip);
	}

	fn add_draw(&mut self, draw: Draw) {
		self.record(BuilderCall::AddDraw);
		self.staged.draws.push(draw);
	}

	fn set_transform(&mut self, transform: Transform) {
		self.record(BuilderCall::SetTransform);
		self.staged.transform = Some(transform);
	}

	fn commit(&mut self) -> Result<(), HistoryError> {
		self.record(BuilderCall::Commit);
		let layer_moment = std::mem::take(&mut self.staged);
		let layer_id = self.layer_id;

		let mut state = self.state.lock();
		if state.transient.contains(&layer_id) {
			state.previews.entry(layer_id).or_default().push(layer_moment);
			state.events.push(HistoryEvent::PreviewCommitted(layer_id));
			return Ok(());
		}
		if !state.current_sequence().contains(&layer_id) {
			return Err(HistoryError::UnknownLayer(layer_id));
		}

		state.events.push(HistoryEvent::LayerCommitted(layer_id));
		state.append(|history_number| DrawMoment::new(history_number).with_layer(layer_id, layer_moment));
		Ok(())
	}
}

/// Starts an updater over `history` with its runtime spawned on the current tokio runtime.
pub fn spawn_updater(history: &MemoryHistory, editor_layer_id: Option<LayerId>) -> Updater {
	let _ = env_logger::builder().is_test(true).try_init();

	let (updater, runtime) = create_instance(Arc::new(history.clone()), editor_layer_id);
	tokio::spawn(runtime.run());
	updater
}

pub mod test_prelude {
	pub use super::{BuilderCall, HistoryEvent, MemoryHistory, spawn_updater};
	pub use crate::transaction::TransactionState;
	pub use draw_api::{Draw, DrawHistory, PathItem, Transform};
	pub use glam::DVec2;
}
