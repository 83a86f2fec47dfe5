//! Layout constraints and small geometry helpers

/// Content-box constraint. `None` (or a non-positive size) means "auto":
/// that axis is unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Constraint {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Constraint {
    pub const AUTO: Constraint = Constraint {
        width: None,
        height: None,
    };

    pub fn new(width: Option<f32>, height: Option<f32>) -> Self {
        Self {
            width: width.filter(|w| *w > 0.0),
            height: height.filter(|h| *h > 0.0),
        }
    }

    pub fn width(width: f32) -> Self {
        Self::new(Some(width), None)
    }

    pub fn height(height: f32) -> Self {
        Self::new(None, Some(height))
    }

    /// The limit along the main writing axis.
    pub fn main_axis(&self, vertical: bool) -> Option<f32> {
        if vertical {
            self.height.filter(|h| *h > 0.0)
        } else {
            self.width.filter(|w| *w > 0.0)
        }
    }
}

/// Number of equal tiles of roughly `unit` length that best fill `total`.
///
/// Always at least one tile. `unit` must be strictly positive; anything else
/// is a caller bug and panics.
pub fn closest_divisor(total: f32, unit: f32) -> usize {
    assert!(
        unit > 0.0 && unit.is_finite(),
        "closest_divisor: unit must be a positive finite length, got {}",
        unit
    );
    if total <= 0.0 || !total.is_finite() {
        return 1;
    }
    let estimate = total / unit;
    let lower = estimate.floor().max(1.0);
    let upper = estimate.ceil().max(1.0);
    // Pick the count whose tile length deviates least from `unit`.
    let deviation = |count: f32| (total / count - unit).abs();
    if deviation(lower) <= deviation(upper) {
        lower as usize
    } else {
        upper as usize
    }
}
