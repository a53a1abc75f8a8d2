use super::{EditKind, MomentWriter, WriteStage};

use draw_api::{Clip, HistoryError, PathItem};

/// Replaces a layer's clipping region with the buffered path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipEdit;

impl EditKind for ClipEdit {
	type Buffer = Vec<PathItem>;

	fn write(&self, path: &Vec<PathItem>, writer: &mut MomentWriter<'_>) -> Result<(), HistoryError> {
		let stage = writer.stage();
		let layer_transform = writer.layer_transform();
		let Some(builder) = writer.builder() else { return Ok(()) };

		if stage == WriteStage::Preview {
			builder.set_transform(layer_transform);
		}
		builder.set_clip(Clip { path: path.clone() });
		builder.commit()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test_utils::test_prelude::*;
	use crate::transaction::test::Fixture;
	use crate::transaction::{ClipTransaction, TransactionHandle};

	#[test]
	fn commit_replaces_the_clip() {
		let fixture = Fixture::new();
		let layer = fixture.layer(Transform::new(2., 0., 0., 2., 0., 0.));
		let clip: ClipTransaction = TransactionHandle::new(fixture.context(), Some(layer), ClipEdit);

		clip.move_to(4., 4.).unwrap().line_to(8., 4.).unwrap().flush().unwrap();
		clip.commit(false).unwrap();

		let moments = fixture.history.committed_moments(layer);
		let clip = moments.last().and_then(|moment| moment.clip.clone()).unwrap();
		assert_eq!(clip.path, vec![PathItem::MoveTo { x: 2., y: 2. }, PathItem::LineTo { x: 4., y: 2. }]);
		assert!(moments.last().unwrap().draws.is_empty());

		let previews = fixture.history.previews(fixture.editor_layer_id);
		assert_eq!(previews[0].transform, Some(Transform::new(2., 0., 0., 2., 0., 0.)));
		assert_eq!(fixture.history.builder_calls(layer), vec![BuilderCall::SetClip, BuilderCall::Commit]);
	}
}
