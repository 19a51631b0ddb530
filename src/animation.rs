//! Exponential smoothing of the gauge value.

/// Fraction of the remaining distance covered per step.
pub const GAIN: f64 = 0.15;

/// Distance below which the displayed value snaps onto the target.
pub const SNAP_THRESHOLD: f64 = 0.5;

/// Single-pole low-pass filter that eases the displayed value toward a
/// moving target.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationFilter {
    displayed: f64,
}

impl AnimationFilter {
    /// Create a filter resting at `value`.
    pub fn at(value: f64) -> Self {
        Self { displayed: sanitize(value) }
    }

    /// The value currently shown on the gauge.
    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    /// Jump straight to `value` without easing.
    pub fn snap_to(&mut self, value: f64) {
        self.displayed = sanitize(value);
    }

    /// Advance one frame toward `target` and return the new displayed value.
    pub fn step(&mut self, target: f64) -> f64 {
        let target = sanitize(target);
        let diff = target - self.displayed;

        if diff.abs() > SNAP_THRESHOLD {
            self.displayed += diff * GAIN;
        } else {
            self.displayed = target;
        }

        self.displayed
    }
}

/// Non-finite and negative inputs collapse to zero.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_step_moves_fifteen_percent() {
        let mut filter = AnimationFilter::default();
        assert!((filter.step(100.0) - 15.0).abs() < 1e-9);
        assert!((filter.step(100.0) - 27.75).abs() < 1e-9);
    }

    #[test]
    fn test_step_snaps_when_close() {
        let mut filter = AnimationFilter::at(10.0);
        assert_eq!(filter.step(10.4), 10.4);
        assert_eq!(filter.step(9.9), 9.9);
    }

    #[test]
    fn test_converges_in_bounded_steps() {
        let mut filter = AnimationFilter::default();
        let mut steps = 0;
        while filter.displayed() != 100.0 {
            filter.step(100.0);
            steps += 1;
            assert!(steps < 100, "filter did not converge");
        }
    }

    #[test]
    fn test_non_finite_target_is_treated_as_zero() {
        let mut filter = AnimationFilter::at(20.0);
        assert!((filter.step(f64::NAN) - 17.0).abs() < 1e-9);

        let mut filter = AnimationFilter::at(20.0);
        assert!((filter.step(f64::INFINITY) - 17.0).abs() < 1e-9);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// The filter never moves away from its target and never goes
        /// negative.
        #[test]
        fn prop_filter_never_diverges(
            start in 0.0f64..200.0,
            target in 0.0f64..200.0
        ) {
            let mut filter = AnimationFilter::at(start);
            let before = (filter.displayed() - target).abs();
            let after = (filter.step(target) - target).abs();

            prop_assert!(after <= before);
            prop_assert!(filter.displayed().is_finite());
            prop_assert!(filter.displayed() >= 0.0);
        }

        #[test]
        fn prop_filter_does_not_overshoot(
            start in 0.0f64..200.0,
            target in 0.0f64..200.0
        ) {
            let mut filter = AnimationFilter::at(start);
            let next = filter.step(target);
            let (low, high) = if start <= target { (start, target) } else { (target, start) };
            prop_assert!(next >= low && next <= high);
        }
    }
}
