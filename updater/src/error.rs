use crate::transaction::TransactionState;

use draw_api::HistoryError;
use thiserror::Error;

/// Errors raised by a transaction's mutators and lifecycle calls.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransactionError {
	#[error("The transaction is {state:?} and no longer accepts changes")]
	Dead { state: TransactionState },

	#[error("The history rejected the transaction's write:\n{0}")]
	History(#[from] HistoryError),
}

/// Errors raised by the [`Updater`](crate::Updater) operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UpdaterError {
	#[error("The updater runtime stopped before the request was answered")]
	RuntimeStopped,

	#[error("The history rejected the operation:\n{0}")]
	History(#[from] HistoryError),
}
