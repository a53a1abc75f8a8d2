pub mod history;
pub mod structures;

#[doc(inline)]
pub use history::{DrawHistory, DrawHistoryEditSession, DrawLayerMomentBuilder, DrawMoment, HistoryError, HistoryNumber, LayerMoment};
#[doc(inline)]
pub use structures::*;

/// A number that identifies a layer within a history.
pub type LayerId = u64;
