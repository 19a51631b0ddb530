//! Synthetic speed signal generation.
//!
//! Produces plausible ramp-up-then-jitter curves for the download and
//! upload phases. No traffic is measured: every value is derived from the
//! elapsed run time and a seed drawn from a [`RandomSource`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of seeds for the signal generator and the fallback values.
pub trait RandomSource: Send {
    /// Draw the next seed.
    fn next_seed(&mut self) -> u64;
}

/// Seeds drawn from a [`StdRng`].
#[derive(Debug, Clone)]
pub struct RngSource {
    rng: StdRng,
}

impl RngSource {
    /// Create a source seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Create a reproducible source.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for RngSource {
    fn next_seed(&mut self) -> u64 {
        self.rng.gen()
    }
}

/// A source that returns the same seed forever.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedSeed(pub u64);

#[cfg(test)]
impl RandomSource for FixedSeed {
    fn next_seed(&mut self) -> u64 {
        self.0
    }
}

/// Open time interval, in seconds since the run started, during which a
/// profile recomputes its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Whether `t` lies strictly inside the window.
    pub fn contains(&self, t: f64) -> bool {
        t > self.start && t < self.end
    }

    /// Fraction of the window covered at `t`, clamped to `[0, 1]`.
    pub fn progress(&self, t: f64) -> f64 {
        ((t - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }
}

/// Shape of one synthetic transfer curve.
///
/// The target is `A * (ramp + (1 - ramp) * p) + wobble * sin(frequency * t)`
/// where `A = base + (seed mod spread)` and `p` is the window progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    /// Smallest amplitude in Mbps
    pub base: f64,
    /// Number of distinct amplitudes above `base`
    pub spread: u64,
    /// Share of the amplitude reached at the start of the window
    pub ramp: f64,
    /// Amplitude of the sinusoidal jitter in Mbps
    pub wobble: f64,
    /// Angular frequency of the jitter in radians per second
    pub frequency: f64,
    /// Value used when the curve dips below zero
    pub floor: f64,
    /// Active window
    pub window: Window,
}

/// Download curve: ramps from 20% to full amplitude between 2 s and 7 s.
pub const DOWNLOAD: Profile = Profile {
    base: 50.0,
    spread: 50,
    ramp: 0.2,
    wobble: 5.0,
    frequency: 2.0,
    floor: 5.0,
    window: Window::new(2.0, 7.0),
};

/// Upload curve: ramps from 30% to full amplitude between 7 s and 11 s.
pub const UPLOAD: Profile = Profile {
    base: 25.0,
    spread: 25,
    ramp: 0.3,
    wobble: 3.0,
    frequency: 3.0,
    floor: 8.0,
    window: Window::new(7.0, 11.0),
};

impl Profile {
    /// Peak speed for `seed`.
    pub fn amplitude(&self, seed: u64) -> f64 {
        self.base + (seed % self.spread) as f64
    }

    /// Target speed at `elapsed` seconds, or `None` outside the window,
    /// in which case the caller keeps its previous target.
    pub fn target(&self, elapsed: f64, seed: u64) -> Option<f64> {
        if !self.window.contains(elapsed) {
            return None;
        }

        let progress = self.window.progress(elapsed);
        let variation = (elapsed * self.frequency).sin() * self.wobble;
        let target = self.amplitude(seed)
            * (self.ramp + (1.0 - self.ramp) * progress)
            + variation;

        Some(if target < 0.0 { self.floor } else { target })
    }
}

/// Ping used when the ping collaborator fails.
pub fn fallback_ping(seed: u64) -> f64 {
    15.0 + (seed % 20) as f64
}

/// Download speed reported when the simulated transfer settles.
pub fn settled_download(seed: u64) -> f64 {
    15.0 + (seed % 80) as f64
}

/// Baseline speed reported when the upload stage starts.
pub fn upload_baseline(seed: u64) -> f64 {
    8.0 + (seed % 40) as f64
}

/// Final figures shown once the run completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalSample {
    pub download: f64,
    pub upload: f64,
    pub ping: f64,
}

impl FinalSample {
    /// Resample the final figures, one seed per figure.
    pub fn draw(random: &mut dyn RandomSource) -> Self {
        Self {
            download: DOWNLOAD.amplitude(random.next_seed()),
            upload: UPLOAD.amplitude(random.next_seed()),
            ping: fallback_ping(random.next_seed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_window_is_open_interval() {
        let window = Window::new(2.0, 7.0);
        assert!(!window.contains(2.0));
        assert!(window.contains(2.01));
        assert!(window.contains(6.99));
        assert!(!window.contains(7.0));
    }

    #[test]
    fn test_download_target_at_five_seconds() {
        let seed = 123;
        let amplitude = 50.0 + (123 % 50) as f64;
        let expected = amplitude * (0.2 + 0.8 * 0.6) + (10.0f64).sin() * 5.0;

        let target = DOWNLOAD.target(5.0, seed).unwrap();
        assert!((target - expected).abs() < 1e-9);
    }

    #[test]
    fn test_upload_target_at_nine_seconds() {
        let seed = 7;
        let expected = 32.0 * (0.3 + 0.7 * 0.5) + (27.0f64).sin() * 3.0;

        let target = UPLOAD.target(9.0, seed).unwrap();
        assert!((target - expected).abs() < 1e-9);
    }

    #[test]
    fn test_target_outside_window_is_held() {
        assert_eq!(DOWNLOAD.target(1.5, 10), None);
        assert_eq!(DOWNLOAD.target(7.5, 10), None);
        assert_eq!(UPLOAD.target(6.0, 10), None);
        assert_eq!(UPLOAD.target(11.0, 10), None);
    }

    #[test]
    fn test_fallback_values() {
        assert_eq!(fallback_ping(0), 15.0);
        assert_eq!(fallback_ping(39), 34.0);
        assert_eq!(settled_download(81), 16.0);
        assert_eq!(upload_baseline(45), 13.0);
    }

    #[test]
    fn test_final_sample_draws_each_figure() {
        let mut random = FixedSeed(73);
        let sample = FinalSample::draw(&mut random);
        assert_eq!(sample.download, 73.0);
        assert_eq!(sample.upload, 48.0);
        assert_eq!(sample.ping, 28.0);
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.next_seed(), b.next_seed());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Targets stay non-negative and within the amplitude plus jitter.
        #[test]
        fn prop_download_target_bounded(t in 2.001f64..6.999, seed in any::<u64>()) {
            let target = DOWNLOAD.target(t, seed).unwrap();
            prop_assert!(target.is_finite());
            prop_assert!(target >= 0.0);
            prop_assert!(target <= DOWNLOAD.amplitude(seed) + DOWNLOAD.wobble);
        }

        #[test]
        fn prop_upload_target_bounded(t in 7.001f64..10.999, seed in any::<u64>()) {
            let target = UPLOAD.target(t, seed).unwrap();
            prop_assert!(target.is_finite());
            prop_assert!(target >= 0.0);
            prop_assert!(target <= UPLOAD.amplitude(seed) + UPLOAD.wobble);
        }

        #[test]
        fn prop_amplitude_range(seed in any::<u64>()) {
            let download = DOWNLOAD.amplitude(seed);
            let upload = UPLOAD.amplitude(seed);
            prop_assert!((50.0..100.0).contains(&download));
            prop_assert!((25.0..50.0).contains(&upload));
        }
    }
}
