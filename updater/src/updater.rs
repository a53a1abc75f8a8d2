use crate::error::UpdaterError;
use crate::preferences::UpdaterPreferences;
use crate::transaction::{
	ChangeSequenceTransaction, ClipEdit, ClipTransaction, EditKind, PathEdit, PathTransaction, PendingTransaction, SequenceEdit, TextEdit, TextTransaction, TransactionContext, TransactionHandle,
	TransformEdit, TransformTransaction,
};
use crate::transform_map::TransformMap;

use draw_api::{DrawHistory, DrawHistoryEditSession, HistoryError, HistoryNumber, Layer, LayerId};

use futures::channel::{mpsc, oneshot};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use spin::Mutex;
use std::fmt;
use std::sync::Arc;

/// A request queued for the [`UpdaterRuntime`], answered through its reply channel.
pub(crate) enum UpdaterMessage {
	AddLayer { reply: oneshot::Sender<Result<Option<LayerId>, HistoryError>> },
	RemoveLayer { layer_id: LayerId, reply: oneshot::Sender<Result<(), HistoryError>> },
	BeginTransform { layer_id: LayerId, reply: oneshot::Sender<TransformTransaction> },
	BeginPath { layer_id: LayerId, reply: oneshot::Sender<PathTransaction> },
	BeginText { layer_id: LayerId, reply: oneshot::Sender<TextTransaction> },
	BeginClip { layer_id: LayerId, reply: oneshot::Sender<ClipTransaction> },
	BeginChangeSequence { reply: oneshot::Sender<ChangeSequenceTransaction> },
	Undo { reply: oneshot::Sender<Result<(), HistoryError>> },
	Redo { reply: oneshot::Sender<Result<(), HistoryError>> },
}

impl UpdaterMessage {
	/// How the previous transaction is finished before this request runs.
	fn resolution(&self) -> Resolution {
		match self {
			UpdaterMessage::Undo { .. } | UpdaterMessage::Redo { .. } => Resolution::Cancel,
			_ => Resolution::Commit,
		}
	}
}

impl fmt::Display for UpdaterMessage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			UpdaterMessage::AddLayer { .. } => write!(f, "AddLayer"),
			UpdaterMessage::RemoveLayer { layer_id, .. } => write!(f, "RemoveLayer({layer_id})"),
			UpdaterMessage::BeginTransform { layer_id, .. } => write!(f, "BeginTransform({layer_id})"),
			UpdaterMessage::BeginPath { layer_id, .. } => write!(f, "BeginPath({layer_id})"),
			UpdaterMessage::BeginText { layer_id, .. } => write!(f, "BeginText({layer_id})"),
			UpdaterMessage::BeginClip { layer_id, .. } => write!(f, "BeginClip({layer_id})"),
			UpdaterMessage::BeginChangeSequence { .. } => write!(f, "BeginChangeSequence"),
			UpdaterMessage::Undo { .. } => write!(f, "Undo"),
			UpdaterMessage::Redo { .. } => write!(f, "Redo"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
	Commit,
	Cancel,
}

/// The editor layer shared between the handle and the runtime.
#[derive(Debug, Clone, Copy, Default)]
struct EditorLayer {
	layer_id: Option<LayerId>,
	/// Undo never steps back past this version. Set when the editor layer had to be created.
	undo_floor: Option<HistoryNumber>,
}

fn visible_layers(history: &dyn DrawHistory, editor_layer_id: Option<LayerId>) -> Vec<LayerId> {
	let Some(now) = history.now_history_number() else { return Vec::new() };
	history.layers(now, true).into_iter().filter(|layer_id| Some(*layer_id) != editor_layer_id).collect()
}

/// Creates an updater over `history` and the runtime that performs its requests.
///
/// The runtime does nothing until [`UpdaterRuntime::run`] is polled, typically by spawning it on an executor.
pub fn create_instance(history: Arc<dyn DrawHistory>, editor_layer_id: Option<LayerId>) -> (Updater, UpdaterRuntime) {
	let (sender, receiver) = mpsc::unbounded();
	let editor = Arc::new(Mutex::new(EditorLayer {
		layer_id: editor_layer_id,
		undo_floor: None,
	}));

	let updater = Updater {
		history: history.clone(),
		sender,
		editor: editor.clone(),
	};
	let runtime = UpdaterRuntime {
		history,
		receiver,
		editor,
		transform_map: Default::default(),
		current_transaction: None,
	};
	(updater, runtime)
}

/// Submits edits against a shared drawing history.
///
/// Requests are queued in call order and performed one at a time by the [`UpdaterRuntime`], each inside its own lock on
/// the history. Starting any request finishes the transaction handed out by the previous one: begin and layer requests
/// commit it, undo and redo cancel it.
#[derive(Clone)]
pub struct Updater {
	history: Arc<dyn DrawHistory>,
	sender: mpsc::UnboundedSender<UpdaterMessage>,
	editor: Arc<Mutex<EditorLayer>>,
}

impl fmt::Debug for Updater {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Updater").field("editor", &*self.editor.lock()).finish()
	}
}

impl Updater {
	pub fn with_preferences(history: Arc<dyn DrawHistory>, preferences: UpdaterPreferences) -> (Self, UpdaterRuntime) {
		create_instance(history, preferences.editor_layer_id)
	}

	/// Queues `message` now and resolves once the runtime has answered it.
	fn request<T: Send + 'static>(&self, message: impl FnOnce(oneshot::Sender<T>) -> UpdaterMessage) -> BoxFuture<'static, Result<T, UpdaterError>> {
		let (reply, response) = oneshot::channel();
		let submitted = self.sender.unbounded_send(message(reply)).map_err(|_| UpdaterError::RuntimeStopped);

		async move {
			submitted?;
			response.await.map_err(|_| UpdaterError::RuntimeStopped)
		}
		.boxed()
	}

	/// Creates a permanent layer. Resolves to `None` when the history could not be locked.
	pub fn add_layer(&self) -> BoxFuture<'static, Result<Option<LayerId>, UpdaterError>> {
		let response = self.request(|reply| UpdaterMessage::AddLayer { reply });
		async move { Ok(response.await??) }.boxed()
	}

	pub fn remove_layer(&self, layer_id: LayerId) -> BoxFuture<'static, Result<(), UpdaterError>> {
		let response = self.request(|reply| UpdaterMessage::RemoveLayer { layer_id, reply });
		async move { Ok(response.await??) }.boxed()
	}

	pub fn begin_transform(&self, layer_id: LayerId) -> BoxFuture<'static, Result<TransformTransaction, UpdaterError>> {
		self.request(|reply| UpdaterMessage::BeginTransform { layer_id, reply })
	}

	pub fn begin_path(&self, layer_id: LayerId) -> BoxFuture<'static, Result<PathTransaction, UpdaterError>> {
		self.request(|reply| UpdaterMessage::BeginPath { layer_id, reply })
	}

	pub fn begin_text(&self, layer_id: LayerId) -> BoxFuture<'static, Result<TextTransaction, UpdaterError>> {
		self.request(|reply| UpdaterMessage::BeginText { layer_id, reply })
	}

	pub fn begin_clip(&self, layer_id: LayerId) -> BoxFuture<'static, Result<ClipTransaction, UpdaterError>> {
		self.request(|reply| UpdaterMessage::BeginClip { layer_id, reply })
	}

	pub fn begin_change_sequence(&self) -> BoxFuture<'static, Result<ChangeSequenceTransaction, UpdaterError>> {
		self.request(|reply| UpdaterMessage::BeginChangeSequence { reply })
	}

	/// Steps the history back one version, unless that would cross the undo floor.
	pub fn undo(&self) -> BoxFuture<'static, Result<(), UpdaterError>> {
		let response = self.request(|reply| UpdaterMessage::Undo { reply });
		async move { Ok(response.await??) }.boxed()
	}

	pub fn redo(&self) -> BoxFuture<'static, Result<(), UpdaterError>> {
		let response = self.request(|reply| UpdaterMessage::Redo { reply });
		async move { Ok(response.await??) }.boxed()
	}

	pub fn can_undo(&self) -> bool {
		let (Some(now), Some(first)) = (self.history.now_history_number(), self.history.first_history_number()) else {
			return false;
		};
		let undo_floor = self.editor.lock().undo_floor;

		now > first && undo_floor.is_none_or(|floor| now > floor)
	}

	pub fn can_redo(&self) -> bool {
		matches!(
			(self.history.now_history_number(), self.history.last_history_number()),
			(Some(now), Some(last)) if now < last
		)
	}

	/// The visible layers at the current version, oldest first, without the editor layer.
	pub fn layers(&self) -> Vec<LayerId> {
		visible_layers(self.history.as_ref(), self.editor.lock().layer_id)
	}

	/// The layer previews are drawn on, once the runtime has settled on one.
	pub fn editor_layer_id(&self) -> Option<LayerId> {
		self.editor.lock().layer_id
	}
}

/// Performs the requests of an [`Updater`] strictly in the order they were submitted.
pub struct UpdaterRuntime {
	history: Arc<dyn DrawHistory>,
	receiver: mpsc::UnboundedReceiver<UpdaterMessage>,
	editor: Arc<Mutex<EditorLayer>>,
	transform_map: Arc<Mutex<TransformMap>>,
	current_transaction: Option<Box<dyn PendingTransaction>>,
}

impl UpdaterRuntime {
	/// Runs until every [`Updater`] handle has been dropped.
	pub async fn run(mut self) {
		while let Some(message) = self.receiver.next().await {
			self.process_message(message).await;
		}
		debug!("Every updater handle was dropped, stopping the runtime");
	}

	async fn process_message(&mut self, message: UpdaterMessage) {
		debug!("Processing {message}");
		let mut session = self.begin_step(message.resolution()).await;

		match message {
			UpdaterMessage::AddLayer { reply } => {
				let result = match session.as_mut() {
					Some(session) => session.add_layer(Layer::default(), false).map(|moment| moment.keys().next()),
					None => Ok(None),
				};
				Self::release(session);
				Self::reply(reply, result);
			}
			UpdaterMessage::RemoveLayer { layer_id, reply } => {
				let result = session.as_mut().map_or(Ok(()), |session| session.remove_layer(layer_id));
				Self::release(session);
				Self::reply(reply, result);
			}
			UpdaterMessage::BeginTransform { layer_id, reply } => {
				let transaction = self.begin_transaction(session, Some(layer_id), TransformEdit);
				Self::reply(reply, transaction);
			}
			UpdaterMessage::BeginPath { layer_id, reply } => {
				let transaction = self.begin_transaction(session, Some(layer_id), PathEdit::default());
				Self::reply(reply, transaction);
			}
			UpdaterMessage::BeginText { layer_id, reply } => {
				let transaction = self.begin_transaction(session, Some(layer_id), TextEdit::default());
				Self::reply(reply, transaction);
			}
			UpdaterMessage::BeginClip { layer_id, reply } => {
				let transaction = self.begin_transaction(session, Some(layer_id), ClipEdit);
				Self::reply(reply, transaction);
			}
			UpdaterMessage::BeginChangeSequence { reply } => {
				let kind = SequenceEdit::new(visible_layers(self.history.as_ref(), self.editor.lock().layer_id));
				let transaction = self.begin_transaction(session, None, kind);
				Self::reply(reply, transaction);
			}
			UpdaterMessage::Undo { reply } => {
				let result = Self::move_now(session.as_mut(), self.undo_target());
				Self::release(session);
				Self::reply(reply, result);
			}
			UpdaterMessage::Redo { reply } => {
				let result = Self::move_now(session.as_mut(), self.redo_target());
				Self::release(session);
				Self::reply(reply, result);
			}
		}
	}

	/// Finishes the previous transaction, locks the history, and brings the editor layer and transform cache up to date.
	/// A history that cannot be locked yields `None`, and every write in the step becomes a no-op.
	async fn begin_step(&mut self, resolution: Resolution) -> Option<Box<dyn DrawHistoryEditSession>> {
		self.resolve_current_transaction(resolution);

		let mut session = match self.history.lock().await {
			Ok(session) => Some(session),
			Err(error) => {
				warn!("Continuing without an edit session: {error}");
				None
			}
		};

		self.ensure_editor_layer(&mut session);
		self.transform_map.lock().update_map(self.history.as_ref());
		session
	}

	fn resolve_current_transaction(&mut self, resolution: Resolution) {
		let Some(transaction) = self.current_transaction.take() else { return };
		if !transaction.is_alive() {
			return;
		}

		let result = match resolution {
			Resolution::Commit => transaction.commit(),
			Resolution::Cancel => transaction.cancel(),
		};
		if let Err(error) = result {
			warn!("The previous transaction could not be resolved: {error}");
		}
	}

	fn ensure_editor_layer(&self, session: &mut Option<Box<dyn DrawHistoryEditSession>>) {
		let mut editor = self.editor.lock();
		if editor.layer_id.is_some() {
			return;
		}

		let existing = self.history.now_history_number().and_then(|now| self.history.layers(now, false).last().copied());
		if let Some(layer_id) = existing {
			debug!("Adopting layer {layer_id} as the editor layer");
			editor.layer_id = Some(layer_id);
			return;
		}

		let Some(session) = session.as_mut() else { return };
		match session.add_layer(Layer::default(), true) {
			Ok(moment) => {
				editor.layer_id = moment.keys().next();
				editor.undo_floor = self.history.now_history_number();
				debug!("Created editor layer {:?}, undo floor at {:?}", editor.layer_id, editor.undo_floor);
			}
			Err(error) => warn!("Failed to create the editor layer: {error}"),
		}
	}

	/// Hands `session` to a new transaction that becomes the one resolved by the next step.
	fn begin_transaction<K: EditKind>(&mut self, session: Option<Box<dyn DrawHistoryEditSession>>, layer_id: Option<LayerId>, kind: K) -> TransactionHandle<K> {
		let context = TransactionContext {
			session,
			editor_layer_id: self.editor.lock().layer_id,
			transform_map: self.transform_map.clone(),
		};
		let transaction = TransactionHandle::new(context, layer_id, kind);
		self.current_transaction = Some(Box::new(transaction.clone()));
		transaction
	}

	fn undo_target(&self) -> Option<HistoryNumber> {
		let now = self.history.now_history_number()?;
		if self.editor.lock().undo_floor.is_some_and(|floor| now <= floor) {
			return None;
		}

		let history_numbers = self.history.history_numbers();
		let index = history_numbers.iter().position(|history_number| *history_number == now)?;
		index.checked_sub(1).map(|previous| history_numbers[previous])
	}

	fn redo_target(&self) -> Option<HistoryNumber> {
		let now = self.history.now_history_number()?;
		let history_numbers = self.history.history_numbers();
		let index = history_numbers.iter().position(|history_number| *history_number == now)?;
		history_numbers.get(index + 1).copied()
	}

	fn move_now(session: Option<&mut Box<dyn DrawHistoryEditSession>>, target: Option<HistoryNumber>) -> Result<(), HistoryError> {
		match (session, target) {
			(Some(session), Some(target)) => session.set_history_number_now(target),
			_ => Ok(()),
		}
	}

	fn release(session: Option<Box<dyn DrawHistoryEditSession>>) {
		if let Some(session) = session {
			session.release();
		}
	}

	fn reply<T>(reply: oneshot::Sender<T>, response: T) {
		if reply.send(response).is_err() {
			trace!("The requester stopped waiting for its response");
		}
	}
}
