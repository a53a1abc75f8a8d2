#[macro_use]
extern crate log;

pub mod affine;
pub mod consts;
pub mod error;
pub mod preferences;
pub mod transaction;
pub mod transform_map;
pub mod updater;

#[cfg(test)]
pub(crate) mod test_utils;

#[doc(inline)]
pub use draw_api::{LayerId, Transform};
#[doc(inline)]
pub use error::{TransactionError, UpdaterError};
#[doc(inline)]
pub use preferences::UpdaterPreferences;
#[doc(inline)]
pub use transaction::{ChangeSequenceTransaction, ClipTransaction, PathTransaction, TextTransaction, TransactionState, TransformTransaction};
#[doc(inline)]
pub use updater::{Updater, UpdaterRuntime, create_instance};
