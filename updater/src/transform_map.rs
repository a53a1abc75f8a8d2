use draw_api::{DrawHistory, DrawMoment, HistoryNumber, LayerId, Transform};

use std::collections::HashMap;

/// Remembers the last transform each layer recorded, refreshed from history deltas instead of rescanning every moment.
#[derive(Debug, Default, Clone)]
pub struct TransformMap {
	/// The history version the map reflects, `None` before the first refresh.
	history_number: Option<HistoryNumber>,
	layer_map: HashMap<LayerId, Transform>,
}

impl TransformMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// The last recorded transform of `layer_id`, or identity when it never recorded one.
	pub fn transform(&self, layer_id: LayerId) -> Transform {
		self.layer_map.get(&layer_id).copied().unwrap_or_default()
	}

	pub fn history_number(&self) -> Option<HistoryNumber> {
		self.history_number
	}

	/// Brings the map up to the history's current version. Must run before any lookup in a coordinator step.
	pub fn update_map(&mut self, history: &dyn DrawHistory) {
		let now = history.now_history_number();
		if self.history_number == now {
			return;
		}
		let Some(now) = now else {
			trace!("History is empty, clearing {} cached transforms", self.layer_map.len());
			self.layer_map.clear();
			self.history_number = None;
			return;
		};

		match self.history_number {
			Some(cached) if history.is_available(cached) && cached <= now => {
				trace!("Merging transforms from history {cached} to {now}");
				self.parse_moments(&history.moments(Some(cached), now));
			}
			_ => {
				trace!("Rebuilding transforms up to history {now}");
				self.layer_map.clear();
				self.parse_moments(&history.moments(None, now));
			}
		}

		self.history_number = Some(now);
	}

	fn parse_moments(&mut self, moments: &[DrawMoment]) {
		for moment in moments {
			for layer_id in moment.keys() {
				if let Some(transform) = moment.layer_moment(layer_id).and_then(|layer| layer.transform) {
					self.layer_map.insert(layer_id, transform);
				}
			}
		}
	}
}
