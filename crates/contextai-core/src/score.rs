//! Decay-based effective score.
//!
//! ```text
//! effective = quality_raw × (1 − decay_rate) ^ entry_distance
//! if confirmed_good: effective = min(effective + 0.1, 1.0)
//! ```
//!
//! `entry_distance` is an ordinal age (e.g. the number of intervening logs),
//! so a score is reproducible without any wall-clock bookkeeping. The
//! confirmation bonus is applied after decay and is not itself decayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Flat bonus added to confirmed-good entries.
pub const CONFIRMED_BONUS: f64 = 0.1;

/// Upper bound of a raw quality value and of a bonused score.
pub const SCORE_CEILING: f64 = 1.0;

/// Decay rate substituted when a log carries none.
pub const DEFAULT_DECAY_RATE: f64 = 0.05;

/// Entry distance substituted when a log carries none.
pub const DEFAULT_ENTRY_DISTANCE: i64 = 0;

/// Tag recorded on score audit rows produced by [`score`].
pub const DEFAULT_SCORING_METHOD: &str = "default";

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The four values an effective score is a pure function of.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInput {
  pub quality_raw:    f64,
  pub entry_distance: i64,
  pub decay_rate:     f64,
  pub confirmed_good: bool,
}

impl ScoreInput {
  /// Build an input from nullable stored columns, substituting defaults for
  /// a missing distance or decay rate.
  pub fn with_defaults(
    quality_raw: f64,
    entry_distance: Option<i64>,
    decay_rate: Option<f64>,
    confirmed_good: bool,
    defaults: &ScoreDefaults,
  ) -> Self {
    Self {
      quality_raw,
      entry_distance: entry_distance.unwrap_or(defaults.entry_distance),
      decay_rate: decay_rate.unwrap_or(defaults.decay_rate),
      confirmed_good,
    }
  }

  pub fn validate(&self) -> Result<()> {
    validate_quality(self.quality_raw)?;
    validate_decay_rate(self.decay_rate)?;
    validate_entry_distance(self.entry_distance)
  }

  pub fn effective_score(&self) -> Result<f64> {
    score(
      self.quality_raw,
      self.entry_distance,
      self.decay_rate,
      self.confirmed_good,
    )
  }
}

/// Values substituted for null per-row scoring inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDefaults {
  pub decay_rate:     f64,
  pub entry_distance: i64,
}

impl Default for ScoreDefaults {
  fn default() -> Self {
    Self {
      decay_rate:     DEFAULT_DECAY_RATE,
      entry_distance: DEFAULT_ENTRY_DISTANCE,
    }
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

pub fn validate_quality(quality_raw: f64) -> Result<()> {
  if quality_raw.is_finite() && (0.0..=SCORE_CEILING).contains(&quality_raw) {
    Ok(())
  } else {
    Err(Error::Validation {
      field:    "quality_raw",
      value:    quality_raw,
      expected: "a value in [0, 1]",
    })
  }
}

pub fn validate_decay_rate(decay_rate: f64) -> Result<()> {
  if decay_rate.is_finite() && (0.0..1.0).contains(&decay_rate) {
    Ok(())
  } else {
    Err(Error::Validation {
      field:    "decay_rate",
      value:    decay_rate,
      expected: "a value in [0, 1)",
    })
  }
}

pub fn validate_entry_distance(entry_distance: i64) -> Result<()> {
  if entry_distance >= 0 {
    Ok(())
  } else {
    Err(Error::Validation {
      field:    "entry_distance",
      value:    entry_distance as f64,
      expected: "a non-negative integer",
    })
  }
}

// ─── Scorer ──────────────────────────────────────────────────────────────────

/// Compute the effective score for one log.
///
/// Fails with [`Error::Validation`] instead of producing a growth curve when
/// the decay rate or distance is out of range.
pub fn score(
  quality_raw: f64,
  entry_distance: i64,
  decay_rate: f64,
  confirmed_good: bool,
) -> Result<f64> {
  validate_quality(quality_raw)?;
  validate_decay_rate(decay_rate)?;
  validate_entry_distance(entry_distance)?;

  let decayed = quality_raw * (1.0 - decay_rate).powf(entry_distance as f64);
  if confirmed_good {
    Ok((decayed + CONFIRMED_BONUS).min(SCORE_CEILING))
  } else {
    Ok(decayed)
  }
}

// ─── Audit record ────────────────────────────────────────────────────────────

/// One scoring operation, pairing every input with its output.
///
/// Append-only: rows in `log_scores` are never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
  pub log_id:          i64,
  pub timestamp:       DateTime<Utc>,
  pub quality_raw:     f64,
  pub decay_rate:      f64,
  pub entry_distance:  i64,
  pub effective_score: f64,
  pub confirmed_good:  bool,
  pub scoring_method:  String,
}

impl ScoreRecord {
  /// Score `input` with the default method, stamped with the current time.
  pub fn compute(log_id: i64, input: ScoreInput) -> Result<Self> {
    Self::compute_with_method(log_id, input, DEFAULT_SCORING_METHOD)
  }

  pub fn compute_with_method(
    log_id: i64,
    input: ScoreInput,
    method: impl Into<String>,
  ) -> Result<Self> {
    let effective_score = input.effective_score()?;
    Ok(Self {
      log_id,
      timestamp: Utc::now(),
      quality_raw: input.quality_raw,
      decay_rate: input.decay_rate,
      entry_distance: input.entry_distance,
      effective_score,
      confirmed_good: input.confirmed_good,
      scoring_method: method.into(),
    })
  }

  pub fn input(&self) -> ScoreInput {
    ScoreInput {
      quality_raw:    self.quality_raw,
      entry_distance: self.entry_distance,
      decay_rate:     self.decay_rate,
      confirmed_good: self.confirmed_good,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn approx(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

  #[test]
  fn decays_by_distance() {
    let s = score(0.8, 3, 0.05, false).unwrap();
    assert!(approx(s, 0.8 * 0.95_f64.powi(3)));
    assert!((s - 0.6859).abs() < 1e-4);
  }

  #[test]
  fn confirmed_adds_flat_bonus() {
    let s = score(0.8, 3, 0.05, true).unwrap();
    assert!((s - 0.7859).abs() < 1e-4);
  }

  #[test]
  fn bonus_is_clamped_to_ceiling() {
    assert_eq!(score(0.95, 0, 0.05, true).unwrap(), 1.0);
    assert_eq!(score(1.0, 0, 0.0, true).unwrap(), 1.0);
  }

  #[test]
  fn zero_distance_keeps_raw_quality() {
    assert!(approx(score(0.42, 0, 0.3, false).unwrap(), 0.42));
  }

  #[test]
  fn bonus_is_not_decayed() {
    let near = score(0.0, 0, 0.5, true).unwrap();
    let far = score(0.0, 50, 0.5, true).unwrap();
    assert!(approx(near, CONFIRMED_BONUS));
    assert!(approx(far, CONFIRMED_BONUS));
  }

  #[test]
  fn rejects_negative_decay_rate() {
    let err = score(0.5, 2, -0.1, false).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "decay_rate", .. }));
  }

  #[test]
  fn rejects_decay_rate_of_one() {
    assert!(score(0.5, 2, 1.0, false).is_err());
  }

  #[test]
  fn rejects_negative_distance() {
    let err = score(0.5, -1, 0.05, false).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "entry_distance", .. }));
  }

  #[test]
  fn rejects_out_of_range_quality() {
    assert!(score(1.5, 0, 0.05, false).is_err());
    assert!(score(f64::NAN, 0, 0.05, false).is_err());
  }

  #[test]
  fn defaults_fill_missing_inputs() {
    let input = ScoreInput::with_defaults(0.6, None, None, false, &ScoreDefaults::default());
    assert_eq!(input.decay_rate, DEFAULT_DECAY_RATE);
    assert_eq!(input.entry_distance, DEFAULT_ENTRY_DISTANCE);
    assert!(approx(input.effective_score().unwrap(), 0.6));
  }

  #[test]
  fn record_pairs_inputs_with_output() {
    let input = ScoreInput {
      quality_raw:    0.8,
      entry_distance: 3,
      decay_rate:     0.05,
      confirmed_good: true,
    };
    let record = ScoreRecord::compute(7, input).unwrap();
    assert_eq!(record.log_id, 7);
    assert_eq!(record.scoring_method, DEFAULT_SCORING_METHOD);
    assert_eq!(record.input(), input);
    assert!((record.effective_score - 0.7859).abs() < 1e-4);
  }
}
