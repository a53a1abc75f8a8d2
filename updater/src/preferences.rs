use draw_api::LayerId;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterPreferences {
	/// The layer used to preview uncommitted edits. When unset, the most recently created layer is adopted on the first
	/// step, or a transient layer is created if the history has none.
	pub editor_layer_id: Option<LayerId>,
}

impl UpdaterPreferences {
	pub fn with_editor_layer(editor_layer_id: LayerId) -> Self {
		Self { editor_layer_id: Some(editor_layer_id) }
	}
}
