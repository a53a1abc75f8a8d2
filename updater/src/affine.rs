//! Affine algebra on [`Transform`] matrices.
//!
//! Composition and inversion combine translations additively: the translation of the right-hand matrix is added to the
//! translation of the left-hand one instead of being mapped through its linear part. Persisted drawings depend on this
//! convention, so it must not be replaced with canonical matrix products.

use crate::consts::{ROUND_NUMBER, SKEW_TANGENT_LIMIT};

use draw_api::Transform;
use glam::DVec2;

/// Rounds to [`ROUND_DIGITS`](crate::consts::ROUND_DIGITS) decimal digits. Halfway values round up, toward positive
/// infinity, on both sides of zero.
pub fn round(value: f64) -> f64 {
	(value * ROUND_NUMBER + 0.5).floor() / ROUND_NUMBER
}

pub fn identity() -> Transform {
	Transform::IDENTITY
}

pub fn translate(transform: Transform, tx: f64, ty: f64) -> Transform {
	concat(transform, Transform::new(1., 0., 0., 1., tx, ty))
}

pub fn scale_x(transform: Transform, scale_x: f64) -> Transform {
	scale(transform, scale_x, 1.)
}

pub fn scale_y(transform: Transform, scale_y: f64) -> Transform {
	scale(transform, 1., scale_y)
}

pub fn scale(transform: Transform, scale_x: f64, scale_y: f64) -> Transform {
	concat(transform, Transform::new(scale_x, 0., 0., scale_y, 0., 0.))
}

pub fn rotate(transform: Transform, rad: f64) -> Transform {
	let (sin, cos) = rad.sin_cos();
	concat(transform, Transform::new(cos, sin, -sin, cos, 0., 0.))
}

pub fn skew_x(transform: Transform, rad_x: f64) -> Transform {
	skew(transform, rad_x, 0.)
}

pub fn skew_y(transform: Transform, rad_y: f64) -> Transform {
	skew(transform, 0., rad_y)
}

/// Adds a skew. Angles are rounded before taking their tangent. A tangent that is not finite is replaced by
/// [`SKEW_TANGENT_LIMIT`], and one near an asymptote is clamped to it with its sign kept, so the matrix never holds NaN
/// or infinity.
pub fn skew(transform: Transform, rad_x: f64, rad_y: f64) -> Transform {
	let tan_x = bounded_tangent(rad_x);
	let tan_y = bounded_tangent(rad_y);
	concat(transform, Transform::new(1., tan_y, tan_x, 1., 0., 0.))
}

fn bounded_tangent(rad: f64) -> f64 {
	let tangent = round(rad).tan();
	if !tangent.is_finite() {
		SKEW_TANGENT_LIMIT
	} else if tangent.abs() > SKEW_TANGENT_LIMIT {
		SKEW_TANGENT_LIMIT.copysign(tangent)
	} else {
		tangent
	}
}

/// Composes `first` with `second`. An identity on either side returns the other operand untouched (and unrounded).
pub fn concat(first: Transform, second: Transform) -> Transform {
	if first.is_identity() {
		return second;
	}
	if second.is_identity() {
		return first;
	}

	let Transform { a, b, c, d, tx, ty } = first;

	Transform::new(
		round(a * second.a + c * second.b),
		round(b * second.a + d * second.b),
		round(a * second.c + c * second.d),
		round(b * second.c + d * second.d),
		round(second.tx + tx),
		round(second.ty + ty),
	)
}

/// Inverts the linear block through its determinant and negates the translation.
pub fn invert(transform: Transform) -> Transform {
	if transform.is_identity() {
		return transform;
	}

	let Transform { a, b, c, d, tx, ty } = transform;
	let determinant = b * c - a * d;

	Transform::new(
		round(-a / determinant),
		round(b / determinant),
		round(-c / -determinant),
		round(a / -determinant),
		round(-tx),
		round(-ty),
	)
}

/// Maps a point through `transform`. The result is not rounded.
pub fn apply(transform: Transform, x: f64, y: f64) -> DVec2 {
	DVec2::new(transform.a * x + transform.c * y + transform.tx, transform.b * x + transform.d * y + transform.ty)
}

pub fn apply_point(transform: Transform, point: DVec2) -> DVec2 {
	apply(transform, point.x, point.y)
}
