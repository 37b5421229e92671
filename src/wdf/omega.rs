//! Wright Omega function approximations.
//!
//! The Wright Omega function `w(x)` is the solution of `w + ln(w) = x`.
//! It turns the implicit antiparallel-diode wave equation into a closed
//! form, so the root element needs no iteration and has a fixed cost per
//! sample.
//!
//! Both approximations below are non-iterative. `omega3` is a piecewise
//! fit (cubic in the mid range, asymptotic `x - ln(x)` above it) accurate
//! to a few percent over the audio-relevant range; `omega1` is the crude
//! linear clamp, useful when the diode knee shape matters less than cost.

/// Strategy selector for the omega approximation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OmegaOrder {
    /// `max(x, 0)` — first-order asymptotic clamp.
    Order1,
    /// Piecewise cubic fit, the default.
    #[default]
    Order3,
}

impl OmegaOrder {
    /// Evaluate the selected approximation.
    #[inline]
    pub fn eval(self, x: f64) -> f64 {
        match self {
            OmegaOrder::Order1 => omega1(x),
            OmegaOrder::Order3 => omega3(x),
        }
    }
}

/// First-order approximation: `w(x) ~ max(x, 0)`.
#[inline]
pub fn omega1(x: f64) -> f64 {
    x.max(0.0)
}

/// Third-order approximation.
///
/// Below `x1` the function is effectively zero; between `x1` and 8 a cubic
/// fit is used; above 8 the asymptotic expansion `x - ln(x)` takes over.
/// The cubic meets both neighbours continuously.
#[inline]
pub fn omega3(x: f64) -> f64 {
    const X1: f64 = -3.341_459_552_768_620;
    const X2: f64 = 8.0;
    const A: f64 = -1.314_293_149_877_800e-3;
    const B: f64 = 4.775_931_364_975_583e-2;
    const C: f64 = 3.631_952_663_804_445e-1;
    const D: f64 = 6.313_183_464_296_682e-1;

    if x < X1 {
        0.0
    } else if x < X2 {
        D + x * (C + x * (B + x * A))
    } else {
        x - x.ln()
    }
}
