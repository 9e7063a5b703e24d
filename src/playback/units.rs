use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Coarse unit the clock steps in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
  Seconds,
  #[default]
  Minutes,
  Hours,
  Days,
  Months,
  Years,
}

/// Each rung converts from the previous unit (milliseconds for the first one).
const LADDER: [(TimeUnit, f64); 6] = [
  (TimeUnit::Seconds, 1000.0),
  (TimeUnit::Minutes, 60.0),
  (TimeUnit::Hours, 60.0),
  (TimeUnit::Days, 24.0),
  (TimeUnit::Months, 365.0 / 12.0),
  (TimeUnit::Years, 12.0),
];

impl TimeUnit {
  #[must_use]
  pub fn name(&self) -> &'static str {
    match self {
      TimeUnit::Seconds => "Seconds",
      TimeUnit::Minutes => "Minutes",
      TimeUnit::Hours => "Hours",
      TimeUnit::Days => "Days",
      TimeUnit::Months => "Months",
      TimeUnit::Years => "Years",
    }
  }

  #[must_use]
  pub fn all() -> &'static [TimeUnit] {
    &[
      TimeUnit::Seconds,
      TimeUnit::Minutes,
      TimeUnit::Hours,
      TimeUnit::Days,
      TimeUnit::Months,
      TimeUnit::Years,
    ]
  }

  /// Milliseconds in one unit, walking the ladder up to `self`.
  /// Months are (365/12) days and years are 12 such months.
  #[must_use]
  pub fn millis(self) -> f64 {
    let mut factor = 1.0;
    for (rung, ratio) in LADDER {
      factor *= ratio;
      if rung == self {
        break;
      }
    }
    factor
  }

  fn is_calendar(self) -> bool {
    matches!(self, TimeUnit::Months | TimeUnit::Years)
  }
}

impl Display for TimeUnit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl FromStr for TimeUnit {
  type Err = String;
  fn from_str(input: &str) -> Result<TimeUnit, Self::Err> {
    let lowercase = input.to_lowercase();
    match lowercase.trim_end_matches('s') {
      "second" => Ok(TimeUnit::Seconds),
      "minute" => Ok(TimeUnit::Minutes),
      "hour" => Ok(TimeUnit::Hours),
      "day" => Ok(TimeUnit::Days),
      "month" => Ok(TimeUnit::Months),
      "year" => Ok(TimeUnit::Years),
      _ => Err(format!("Unknown time unit: {input}")),
    }
  }
}

/// Moves `time` by `step` units. Months and years follow the calendar,
/// so the resulting duration depends on where `time` sits.
/// Returns `None` when the result is not representable.
#[must_use]
pub fn advance(time: DateTime<Utc>, step: i32, unit: TimeUnit) -> Option<DateTime<Utc>> {
  if unit.is_calendar() {
    let months = if unit == TimeUnit::Years {
      step.unsigned_abs().checked_mul(12)?
    } else {
      step.unsigned_abs()
    };
    return if step >= 0 {
      time.checked_add_months(Months::new(months))
    } else {
      time.checked_sub_months(Months::new(months))
    };
  }

  let step = i64::from(step);
  let delta = match unit {
    TimeUnit::Seconds => Duration::try_seconds(step),
    TimeUnit::Minutes => Duration::try_minutes(step),
    TimeUnit::Hours => Duration::try_hours(step),
    TimeUnit::Days => Duration::try_days(step),
    TimeUnit::Months | TimeUnit::Years => None,
  }?;
  time.checked_add_signed(delta)
}

/// Duration in milliseconds of one `step` of `unit` starting at `from`.
#[must_use]
pub fn step_millis(from: DateTime<Utc>, step: i32, unit: TimeUnit) -> Option<i64> {
  advance(from, step, unit).map(|to| to.signed_duration_since(from).num_milliseconds())
}

/// Converts a millisecond delta into a fractional count of `unit`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn millis_to_unit(millis: i64, unit: TimeUnit) -> f64 {
  millis as f64 / unit.millis()
}

/// Converts a count of `unit` back to milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn unit_to_millis(value: f64, unit: TimeUnit) -> Option<i64> {
  let millis = (value * unit.millis()).round();
  #[allow(clippy::cast_precision_loss)]
  let in_range = millis.is_finite() && millis.abs() < i64::MAX as f64;
  in_range.then_some(millis as i64)
}
