use super::{EditKind, MomentWriter, TransactionError, TransactionHandle, WriteStage};

use draw_api::{Dash, Draw, Fill, Graphic, GraphicsDraw, HistoryError, LinearGradient, PathItem, RadialGradient, Stroke, StrokeStyle, Transform};

/// Styling for a path drawn onto a layer. The segments themselves live in the transaction buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathEdit {
	fill: Option<Fill>,
	stroke_fill: Option<Fill>,
	dash: Option<Dash>,
	stroke_style: Option<StrokeStyle>,
	composite_operation: Option<u32>,
}

impl PathEdit {
	fn stroke(&self) -> Option<Stroke> {
		if self.stroke_fill.is_none() && self.dash.is_none() && self.stroke_style.is_none() {
			return None;
		}
		Some(Stroke {
			fill_style: self.stroke_fill.clone(),
			dash: self.dash.clone(),
			style: self.stroke_style,
		})
	}
}

impl EditKind for PathEdit {
	type Buffer = Vec<PathItem>;

	fn write(&self, path: &Vec<PathItem>, writer: &mut MomentWriter<'_>) -> Result<(), HistoryError> {
		let stage = writer.stage();
		let layer_transform = writer.layer_transform();
		let Some(builder) = writer.builder() else { return Ok(()) };

		// The editor layer has no transform of its own, so previews carry the target layer's
		if stage == WriteStage::Preview {
			builder.set_transform(layer_transform);
		}
		builder.add_draw(Draw::Graphics(GraphicsDraw {
			graphics: vec![Graphic {
				path: path.clone(),
				fill: self.fill.clone(),
				stroke: self.stroke(),
			}],
			transform: Transform::IDENTITY,
			composite_operation: self.composite_operation,
		}));
		builder.commit()
	}
}

/// Segment commands shared by every transaction that buffers a path. Coordinates are given in world space and stored
/// in the target layer's local space.
impl<K: EditKind<Buffer = Vec<PathItem>>> TransactionHandle<K> {
	pub fn move_to(&self, x: f64, y: f64) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let point = transaction.to_local(x, y);
			transaction.buffer.push(PathItem::MoveTo { x: point.x, y: point.y });
		})?;
		Ok(self)
	}

	pub fn line_to(&self, x: f64, y: f64) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let point = transaction.to_local(x, y);
			transaction.buffer.push(PathItem::LineTo { x: point.x, y: point.y });
		})?;
		Ok(self)
	}

	pub fn arc_to(&self, x1: f64, y1: f64, x2: f64, y2: f64, radius: f64) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let first = transaction.to_local(x1, y1);
			let second = transaction.to_local(x2, y2);
			transaction.buffer.push(PathItem::ArcTo {
				x1: first.x,
				y1: first.y,
				x2: second.x,
				y2: second.y,
				radius,
			});
		})?;
		Ok(self)
	}

	pub fn quadratic_curve_to(&self, cpx: f64, cpy: f64, x: f64, y: f64) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let control = transaction.to_local(cpx, cpy);
			let point = transaction.to_local(x, y);
			transaction.buffer.push(PathItem::QuadraticCurveTo {
				cpx: control.x,
				cpy: control.y,
				x: point.x,
				y: point.y,
			});
		})?;
		Ok(self)
	}

	pub fn bezier_curve_to(&self, cpx1: f64, cpy1: f64, cpx2: f64, cpy2: f64, x: f64, y: f64) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let first = transaction.to_local(cpx1, cpy1);
			let second = transaction.to_local(cpx2, cpy2);
			let point = transaction.to_local(x, y);
			transaction.buffer.push(PathItem::BezierCurveTo {
				cpx1: first.x,
				cpy1: first.y,
				cpx2: second.x,
				cpy2: second.y,
				x: point.x,
				y: point.y,
			});
		})?;
		Ok(self)
	}
}

impl TransactionHandle<PathEdit> {
	/// Gradient geometry is given in world space, like path points.
	pub fn set_fill(&self, fill: Fill) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let fill = transaction.to_local_fill(fill);
			transaction.kind.fill = Some(fill);
		})?;
		Ok(self)
	}

	pub fn set_fill_linear_gradient(&self, gradient: LinearGradient) -> Result<&Self, TransactionError> {
		self.set_fill(Fill::linear_gradient(gradient))
	}

	pub fn set_fill_radial_gradient(&self, gradient: RadialGradient) -> Result<&Self, TransactionError> {
		self.set_fill(Fill::radial_gradient(gradient))
	}

	pub fn set_stroke_color(&self, color: u32) -> Result<&Self, TransactionError> {
		self.set_stroke_fill(Fill::color(color))
	}

	pub fn set_stroke_fill(&self, fill: Fill) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let fill = transaction.to_local_fill(fill);
			transaction.kind.stroke_fill = Some(fill);
		})?;
		Ok(self)
	}

	pub fn set_stroke_dash(&self, dash: Dash) -> Result<&Self, TransactionError> {
		self.edit(|transaction| transaction.kind.dash = Some(dash))?;
		Ok(self)
	}

	pub fn set_stroke_style(&self, style: StrokeStyle) -> Result<&Self, TransactionError> {
		self.edit(|transaction| transaction.kind.stroke_style = Some(style))?;
		Ok(self)
	}

	/// Changes how the path blends with what is below it, and refreshes the preview to match.
	pub fn set_composite_operation(&self, composite_operation: u32) -> Result<&Self, TransactionError> {
		self.edit(|transaction| transaction.kind.composite_operation = Some(composite_operation))?;
		self.flush()
	}
}
