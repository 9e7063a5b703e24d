use super::units::TimeUnit;
use std::fmt::Display;

/// Upper bounds (exclusive, in ms) for picking the label unit.
const THRESHOLDS: [(f64, TimeUnit); 5] = [
  (6e3, TimeUnit::Seconds),
  (36e5, TimeUnit::Minutes),
  (864e5, TimeUnit::Hours),
  (2628e6, TimeUnit::Days),
  (31536e6, TimeUnit::Months),
];

/// A human scaled duration, e.g. `1.5 Minutes`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalLabel {
  pub unit: TimeUnit,
  /// Rounded to one decimal, carries the sign of the input delta.
  pub magnitude: f64,
}

impl Display for IntervalLabel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {}", self.magnitude, self.unit)
  }
}

/// Picks a unit from the absolute size of `millis` and expresses the delta in it.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn smart_interval_format(millis: i64) -> IntervalLabel {
  let diff = millis as f64;
  let abs_diff = diff.abs();
  let unit = THRESHOLDS
    .iter()
    .find(|(bound, _)| abs_diff < *bound)
    .map_or(TimeUnit::Years, |(_, unit)| *unit);

  // Rounding is symmetric so -d always labels as the negation of d.
  let tenths = (abs_diff / (unit.millis() / 10.0)).round() / 10.0;
  let magnitude = if tenths < f64::EPSILON {
    0.0
  } else {
    tenths.copysign(diff)
  };
  IntervalLabel { unit, magnitude }
}
