use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point on the complex plane with `f64` components.
///
/// Kept deliberately small: the kernel only ever needs `z² + c` and the
/// squared magnitude, so that is all this type offers beyond the usual
/// operators.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    #[inline]
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Returns `re² + im²` without taking the square root.
    #[inline]
    pub fn norm_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// One step of the quadratic recurrence: `self² + c`.
    #[inline]
    pub fn square_add(self, c: Complex) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im + c.re,
            im: 2.0 * self.re * self.im + c.im,
        }
    }
}

impl Add for Complex {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul<f64> for Complex {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.re * rhs, self.im * rhs)
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im >= 0.0 {
            write!(f, "{} + {}i", self.re, self.im)
        } else {
            write!(f, "{} - {}i", self.re, -self.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn square_add_matches_expanded_form() {
        // (1 + 2i)² + (0.5 - i) = (1 - 4 + 0.5) + (4 - 1)i
        let z = Complex::new(1.0, 2.0).square_add(Complex::new(0.5, -1.0));
        assert!(approx_eq(z.re, -2.5));
        assert!(approx_eq(z.im, 3.0));
    }

    #[test]
    fn square_add_from_zero_yields_c() {
        let c = Complex::new(-0.75, 0.1);
        assert_eq!(Complex::ZERO.square_add(c), c);
    }

    #[test]
    fn norm_sq() {
        assert!(approx_eq(Complex::new(3.0, 4.0).norm_sq(), 25.0));
    }

    #[test]
    fn arithmetic_operators() {
        let a = Complex::new(5.0, 3.0);
        let b = Complex::new(2.0, 1.0);
        assert_eq!(a + b, Complex::new(7.0, 4.0));
        assert_eq!(a - b, Complex::new(3.0, 2.0));
        assert_eq!(b * 2.0, Complex::new(4.0, 2.0));
    }

    #[test]
    fn display_shows_sign_of_imaginary_part() {
        assert_eq!(Complex::new(1.0, -2.0).to_string(), "1 - 2i");
        assert_eq!(Complex::new(-0.5, 0.0).to_string(), "-0.5 + 0i");
    }
}
