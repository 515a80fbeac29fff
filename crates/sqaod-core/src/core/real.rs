use nalgebra::RealField;
use rand::Rng;
use std::fmt::{Debug, Display};

/// Floating-point precision the solver and the linear-algebra engines are generic over.
///
/// Implemented for `f32` and `f64`. Everything the annealer needs from a scalar beyond
/// [`RealField`] (lossless constant conversion and uniform sampling) lives here, so that
/// the rest of the crate is written once for both precisions.
pub trait Real: RealField + Copy + Debug + Display + Send + Sync + 'static {
    /// Converts an `f64` constant into this precision (rounding for `f32`).
    fn from_constant(value: f64) -> Self;

    /// Widens this value to `f64`.
    fn into_f64(self) -> f64;

    /// Converts a count (replica or site number) into this precision.
    fn from_count(value: usize) -> Self {
        Self::from_constant(value as f64)
    }

    /// Draws a uniform sample in `[0, 1)`.
    fn sample_unit<G: Rng + ?Sized>(rng: &mut G) -> Self;
}

macro_rules! impl_real {
    ($t:ty) => {
        impl Real for $t {
            #[inline]
            fn from_constant(value: f64) -> Self {
                value as $t
            }

            #[inline]
            fn into_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn sample_unit<G: Rng + ?Sized>(rng: &mut G) -> Self {
                rng.r#gen::<$t>()
            }
        }
    };
}

impl_real!(f32);
impl_real!(f64);
