use super::{EditKind, MomentWriter, TransactionError, TransactionHandle, WriteStage};

use draw_api::{Draw, Fill, HistoryError, LinearGradient, RadialGradient, Stroke, Text, TextDraw};

/// Placement and styling for text drawn onto a layer. The characters live in the transaction buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextEdit {
	x: Option<f64>,
	y: Option<f64>,
	size: Option<f64>,
	fill: Option<Fill>,
	stroke: Option<Stroke>,
	font_family: Option<String>,
	weight: Option<u32>,
	style: Option<u32>,
	align: Option<String>,
	baseline: Option<String>,
	composite_operation: Option<u32>,
}

impl EditKind for TextEdit {
	type Buffer = String;

	fn write(&self, text: &String, writer: &mut MomentWriter<'_>) -> Result<(), HistoryError> {
		let stage = writer.stage();
		let layer_transform = writer.layer_transform();
		let Some(builder) = writer.builder() else { return Ok(()) };

		if stage == WriteStage::Preview {
			builder.set_transform(layer_transform);
		}
		builder.add_draw(Draw::Text(TextDraw {
			text: Text {
				text: text.clone(),
				x: self.x,
				y: self.y,
				size: self.size,
				fill: self.fill.clone(),
				stroke: self.stroke.clone(),
				font_family: self.font_family.clone(),
				weight: self.weight,
				style: self.style,
				align: self.align.clone(),
				baseline: self.baseline.clone(),
			},
			composite_operation: self.composite_operation,
		}));
		builder.commit()
	}

	fn discard(&mut self) {
		*self = Self::default();
	}
}

impl TransactionHandle<TextEdit> {
	pub fn push_text(&self, text: &str) -> Result<&Self, TransactionError> {
		self.edit(|transaction| transaction.buffer.push_str(text))?;
		Ok(self)
	}

	/// Anchors the text at a world point, stored in the target layer's local space.
	pub fn set_position(&self, x: f64, y: f64) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			let point = transaction.to_local(x, y);
			transaction.kind.x = Some(point.x);
			transaction.kind.y = Some(point.y);
		})?;
		Ok(self)
	}

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

	/// Outlines the text with a solid color.
	pub fn set_stroke_color(&self, color: u32) -> Result<&Self, TransactionError> {
		self.edit(|transaction| {
			transaction.kind.stroke = Some(Stroke {
				fill_style: Some(Fill::color(color)),
				..Default::default()
			})
		})?;
		Ok(self)
	}

	pub fn set_font_family(&self, font_family: impl Into<String>) -> Result<&Self, TransactionError> {
		let font_family = font_family.into();
		self.edit(|transaction| transaction.kind.font_family = Some(font_family))?;
		Ok(self)
	}

	pub fn set_size(&self, size: f64) -> Result<&Self, TransactionError> {
		self.edit(|transaction| transaction.kind.size = Some(size))?;
		Ok(self)
	}

	pub fn set_weight(&self, weight: u32) -> Result<&Self, TransactionError> {
		self.edit(|transaction| transaction.kind.weight = Some(weight))?;
		Ok(self)
	}

	pub fn set_style(&self, style: u32) -> Result<&Self, TransactionError> {
		self.edit(|transaction| transaction.kind.style = Some(style))?;
		Ok(self)
	}

	pub fn set_align(&self, align: impl Into<String>) -> Result<&Self, TransactionError> {
		let align = align.into();
		self.edit(|transaction| transaction.kind.align = Some(align))?;
		Ok(self)
	}

	pub fn set_baseline(&self, baseline: impl Into<String>) -> Result<&Self, TransactionError> {
		let baseline = baseline.into();
		self.edit(|transaction| transaction.kind.baseline = Some(baseline))?;
		Ok(self)
	}

	pub fn set_composite_operation(&self, composite_operation: u32) -> Result<&Self, TransactionError> {
		self.edit(|transaction| transaction.kind.composite_operation = Some(composite_operation))?;
		Ok(self)
	}
}
