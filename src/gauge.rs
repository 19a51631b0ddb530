//! Polar rasterization of the speed dial.
//!
//! Every output cell is hit-tested against the dial geometry in polar
//! coordinates: rims, tick marks, the needle, the hub and a decorative band.
//! The rasterizer holds no state, so identical inputs always produce
//! identical frames.

use std::fmt;

/// Full-scale speed in Mbps.
pub const MAX_SPEED: f64 = 100.0;

/// Angular span of the dial in degrees.
pub const SWEEP: f64 = 270.0;

/// Needle angle for a zero reading, in degrees.
pub const ZERO_ANGLE: f64 = 240.0;

/// Number of text rows in a dial frame.
pub const ROWS: usize = 35;

/// Width of the single dial frame.
pub const SINGLE_COLUMNS: usize = 50;

/// Width of the dual dial frame.
pub const DUAL_COLUMNS: usize = 90;

/// Column at which the upload half of the dual frame starts.
pub const DUAL_SPLIT: usize = DUAL_COLUMNS / 2;

/// Lower and upper edge of the bottom gap, in degrees.
const GAP: (f64, f64) = (225.0, 315.0);

const HUB_RADIUS: f64 = 3.0;
const BAND: (f64, f64) = (8.0, 12.0);
const NEEDLE_WIDTH: f64 = 1.2;
const TICK_TOLERANCE: f64 = 4.0;
const TICK_LABELS: [char; 11] =
    ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'X'];

const SINGLE_SCALE: &str = "0   10   20   30   40   50   60   70   80   90  100";
const DUAL_SCALE: &str =
    "0   10   20   30   40   50   60   70   80   90  100     0   10   20   30   40   50   60   70   80   90  100";
const SINGLE_UNIT: &str = "                      Mbps";
const DUAL_UNIT: &str =
    "                      Mbps                                                 Mbps";

/// Color tier of a readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedTier {
    /// Below 30 Mbps
    Slow,
    /// 30 to 60 Mbps
    Moderate,
    /// 60 to 80 Mbps
    Fast,
    /// 80 Mbps and above
    Peak,
}

impl SpeedTier {
    pub fn of(speed: f64) -> Self {
        if speed >= 80.0 {
            SpeedTier::Peak
        } else if speed >= 60.0 {
            SpeedTier::Fast
        } else if speed >= 30.0 {
            SpeedTier::Moderate
        } else {
            SpeedTier::Slow
        }
    }
}

/// A labelled numeric reading printed under the dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub label: &'static str,
    pub value: f64,
    pub tier: SpeedTier,
}

impl Readout {
    pub fn new(label: &'static str, value: f64) -> Self {
        Self { label, value, tier: SpeedTier::of(value) }
    }
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.1} Mbps", self.label, self.value)
    }
}

/// Geometry of one dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dial {
    pub center_x: f64,
    pub center_y: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
    /// Whether tick marks and digit labels are drawn
    pub ticks: bool,
}

impl Dial {
    /// The large dial shown before the transfer phases.
    pub const SINGLE: Dial = Dial {
        center_x: 25.0,
        center_y: 20.0,
        outer_radius: 18.0,
        inner_radius: 14.0,
        ticks: true,
    };

    /// One half of the side-by-side download/upload frame.
    pub const HALF: Dial = Dial {
        center_x: 22.0,
        center_y: 18.0,
        outer_radius: 18.0,
        inner_radius: 14.0,
        ticks: false,
    };

    /// Length of the needle from the centre.
    pub fn needle_length(&self) -> f64 {
        self.inner_radius - 3.0
    }

    /// Position of the needle tip for `value`, in cell coordinates.
    #[cfg(test)]
    pub fn needle_tip(&self, value: f64) -> (f64, f64) {
        let angle = needle_angle(value).to_radians();
        let length = self.needle_length();
        (
            self.center_x + length * angle.cos(),
            self.center_y - length * angle.sin(),
        )
    }

    /// Glyph for the cell at column `x`, row `y` when the needle shows
    /// `value`.
    pub fn glyph(&self, x: f64, y: f64, value: f64) -> char {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        let distance = dx.hypot(dy);
        let angle = polar_angle(dx, dy);
        let in_arc = !(angle > GAP.0 && angle < GAP.1);

        if in_arc && (distance - self.outer_radius).abs() <= 1.0 {
            '█'
        } else if in_arc && (distance - self.inner_radius).abs() <= 0.8 {
            '░'
        } else if let Some(glyph) = self.tick_glyph(distance, angle) {
            glyph
        } else if self.on_needle(dx, dy, distance, value) {
            '━'
        } else if distance <= HUB_RADIUS {
            '●'
        } else if in_arc && distance >= BAND.0 && distance <= BAND.1 {
            band_glyph(angle)
        } else {
            ' '
        }
    }

    fn tick_glyph(&self, distance: f64, angle: f64) -> Option<char> {
        if !self.ticks {
            return None;
        }

        let mark = (self.outer_radius + 1.5)..=(self.outer_radius + 2.5);
        let label = (self.outer_radius + 2.8)..=(self.outer_radius + 4.0);
        if !mark.contains(&distance) && !label.contains(&distance) {
            return None;
        }

        TICK_LABELS.iter().enumerate().find_map(|(i, &digit)| {
            let tick_angle = needle_angle(i as f64 * MAX_SPEED / 10.0);
            if angular_distance(angle, tick_angle) >= TICK_TOLERANCE {
                None
            } else if mark.contains(&distance) {
                Some('│')
            } else {
                Some(digit)
            }
        })
    }

    fn on_needle(&self, dx: f64, dy: f64, distance: f64, value: f64) -> bool {
        if distance < HUB_RADIUS || distance > self.needle_length() {
            return false;
        }

        let angle = needle_angle(value).to_radians();
        // Unit vector along the needle; rows grow downward.
        let (ux, uy) = (angle.cos(), -angle.sin());
        let perpendicular = (dx * uy - dy * ux).abs();
        let forward = dx * ux + dy * uy;

        perpendicular < NEEDLE_WIDTH && forward > 0.0
    }
}

/// Needle angle in degrees, normalized to `[0, 360)`. Zero reads 240°, full
/// scale reads 330° (that is, −30°), sweeping clockwise.
pub fn needle_angle(value: f64) -> f64 {
    let value = if value.is_finite() {
        value.clamp(0.0, MAX_SPEED)
    } else {
        0.0
    };
    (ZERO_ANGLE - value / MAX_SPEED * SWEEP).rem_euclid(360.0)
}

/// Angle of a cell offset in degrees, counter-clockwise from +x, in
/// `[0, 360)`.
fn polar_angle(dx: f64, dy: f64) -> f64 {
    (-dy).atan2(dx).to_degrees().rem_euclid(360.0)
}

fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

fn band_glyph(angle: f64) -> char {
    if (135.0..=216.0).contains(&angle) {
        '▓'
    } else if (216.0..=297.0).contains(&angle) {
        '▒'
    } else if angle >= 297.0 || angle <= 18.0 {
        '░'
    } else if angle <= 45.0 {
        '▓'
    } else {
        ' '
    }
}

/// A rasterized dial with its scale and readouts.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeFrame {
    pub rows: Vec<String>,
    pub scale: &'static str,
    pub unit: &'static str,
    pub readouts: Vec<Readout>,
}

impl GaugeFrame {
    /// Rasterize the single dial showing `value`.
    pub fn single(value: f64) -> Self {
        let rows = (0..ROWS)
            .map(|row| {
                (0..SINGLE_COLUMNS)
                    .map(|col| Dial::SINGLE.glyph(col as f64, row as f64, value))
                    .collect()
            })
            .collect();

        Self {
            rows,
            scale: SINGLE_SCALE,
            unit: SINGLE_UNIT,
            readouts: vec![Readout::new("Speed", value)],
        }
    }

    /// Rasterize the download and upload dials side by side.
    pub fn dual(download: f64, upload: f64) -> Self {
        let rows = (0..ROWS)
            .map(|row| {
                (0..DUAL_COLUMNS)
                    .map(|col| {
                        if col < DUAL_SPLIT {
                            Dial::HALF.glyph(col as f64, row as f64, download)
                        } else {
                            Dial::HALF.glyph(
                                (col - DUAL_SPLIT) as f64,
                                row as f64,
                                upload,
                            )
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            rows,
            scale: DUAL_SCALE,
            unit: DUAL_UNIT,
            readouts: vec![
                Readout::new("Download", download),
                Readout::new("Upload", upload),
            ],
        }
    }
}

impl fmt::Display for GaugeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        writeln!(f, "{}", self.scale)?;
        writeln!(f, "{}", self.unit)?;

        let readouts: Vec<String> =
            self.readouts.iter().map(ToString::to_string).collect();
        write!(f, "{}", readouts.join("    "))
    }
}
