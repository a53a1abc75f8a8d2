use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// A 2×3 affine matrix laid out like a canvas `setTransform` call.
///
/// ```text
/// | a c tx |
/// | b d ty |
/// | 0 0 1  |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
	pub a: f64,
	pub b: f64,
	pub c: f64,
	pub d: f64,
	pub tx: f64,
	pub ty: f64,
}

impl Transform {
	pub const IDENTITY: Self = Self::new(1., 0., 0., 1., 0., 0.);

	pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
		Self { a, b, c, d, tx, ty }
	}

	/// Exact comparison against [`Transform::IDENTITY`], no epsilon.
	pub fn is_identity(&self) -> bool {
		*self == Self::IDENTITY
	}

	pub fn to_cols_array(&self) -> [f64; 6] {
		[self.a, self.b, self.c, self.d, self.tx, self.ty]
	}

	pub fn from_cols_array(cols: &[f64; 6]) -> Self {
		Self::new(cols[0], cols[1], cols[2], cols[3], cols[4], cols[5])
	}

	pub fn translation(&self) -> DVec2 {
		DVec2::new(self.tx, self.ty)
	}
}

impl Default for Transform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl From<DAffine2> for Transform {
	fn from(affine: DAffine2) -> Self {
		Self::from_cols_array(&affine.to_cols_array())
	}
}

impl From<Transform> for DAffine2 {
	fn from(transform: Transform) -> Self {
		DAffine2::from_cols_array(&transform.to_cols_array())
	}
}

/// One segment of a path, in the coordinate space of the layer that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathItem {
	MoveTo { x: f64, y: f64 },
	ArcTo { x1: f64, y1: f64, x2: f64, y2: f64, radius: f64 },
	QuadraticCurveTo { cpx: f64, cpy: f64, x: f64, y: f64 },
	LineTo { x: f64, y: f64 },
	BezierCurveTo { cpx1: f64, cpy1: f64, cpx2: f64, cpy2: f64, x: f64, y: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
	pub offset: f64,
	pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearGradient {
	pub x0: f64,
	pub y0: f64,
	pub x1: f64,
	pub y1: f64,
	pub color_stops: Vec<ColorStop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadialGradient {
	pub x0: f64,
	pub y0: f64,
	pub r0: f64,
	pub x1: f64,
	pub y1: f64,
	pub r1: f64,
	pub color_stops: Vec<ColorStop>,
}

/// Paint for an area. At most one of the members is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fill {
	pub color: Option<u32>,
	pub linear_gradient: Option<LinearGradient>,
	pub radial_gradient: Option<RadialGradient>,
}

impl Fill {
	pub fn color(color: u32) -> Self {
		Self { color: Some(color), ..Default::default() }
	}

	pub fn linear_gradient(gradient: LinearGradient) -> Self {
		Self {
			linear_gradient: Some(gradient),
			..Default::default()
		}
	}

	pub fn radial_gradient(gradient: RadialGradient) -> Self {
		Self {
			radial_gradient: Some(gradient),
			..Default::default()
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dash {
	pub segments: Vec<f64>,
	pub offset: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
	pub thickness: Option<f64>,
	pub caps: Option<u32>,
	pub joints: Option<u32>,
	pub miter_limit: Option<f64>,
	pub ignore_scale: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
	pub fill_style: Option<Fill>,
	pub dash: Option<Dash>,
	pub style: Option<StrokeStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
	pub path: Vec<PathItem>,
	pub fill: Option<Fill>,
	pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsDraw {
	pub graphics: Vec<Graphic>,
	pub transform: Transform,
	pub composite_operation: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Text {
	pub text: String,
	pub x: Option<f64>,
	pub y: Option<f64>,
	pub size: Option<f64>,
	pub fill: Option<Fill>,
	pub stroke: Option<Stroke>,
	pub font_family: Option<String>,
	pub weight: Option<u32>,
	pub style: Option<u32>,
	pub align: Option<String>,
	pub baseline: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextDraw {
	pub text: Text,
	pub composite_operation: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Draw {
	Graphics(GraphicsDraw),
	Text(TextDraw),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clip {
	pub path: Vec<PathItem>,
}

/// The initial state handed to the history when a layer is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
	pub draws: Vec<Draw>,
	pub transform: Transform,
	pub clip: Option<Clip>,
}
