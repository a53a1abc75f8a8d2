// AFFINE
/// Every composed or inverted coefficient is rounded to this many decimal digits to bound drift across repeated composition.
pub const ROUND_DIGITS: i32 = 5;
pub const ROUND_NUMBER: f64 = 100_000.;
/// Replaces a skew tangent that is non-finite or lies this close to an asymptote.
pub const SKEW_TANGENT_LIMIT: f64 = 100_000.;
