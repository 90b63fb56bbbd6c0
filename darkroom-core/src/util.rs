//! Utility types, used throughout the crate.

/// A float which is neither NaN nor infinite.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
#[repr(transparent)]
pub struct FiniteF32(f32);
impl FiniteF32 {
    pub fn new(val: f32) -> Result<Self, FiniteF32Error> {
        if val.is_finite() {
            Ok(Self(val))
        } else {
            Err(FiniteF32Error::NotFinite)
        }
    }
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiniteF32Error {
    #[error("not finite")]
    NotFinite,
}

/// Check every element of a point, passing it through if all are finite.
pub fn finite_point(point: [f32; 2]) -> Result<[f32; 2], FiniteF32Error> {
    Ok([FiniteF32::new(point[0])?.get(), FiniteF32::new(point[1])?.get()])
}
