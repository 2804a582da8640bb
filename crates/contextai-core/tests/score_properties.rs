//! Property tests for the effective-score formula.

use contextai_core::score::{SCORE_CEILING, score};
use proptest::prelude::*;

proptest! {
  #[test]
  fn non_increasing_in_distance(
    quality in 0.0f64..=1.0,
    rate in 0.0f64..0.999,
    distance in 0i64..500,
    step in 1i64..50,
    confirmed in any::<bool>(),
  ) {
    let near = score(quality, distance, rate, confirmed).unwrap();
    let far = score(quality, distance + step, rate, confirmed).unwrap();
    prop_assert!(far <= near + f64::EPSILON, "{far} > {near}");
  }

  #[test]
  fn non_increasing_in_decay_rate(
    quality in 0.0f64..=1.0,
    low in 0.0f64..0.5,
    delta in 0.0f64..0.49,
    distance in 0i64..200,
    confirmed in any::<bool>(),
  ) {
    let slow = score(quality, distance, low, confirmed).unwrap();
    let fast = score(quality, distance, low + delta, confirmed).unwrap();
    prop_assert!(fast <= slow + f64::EPSILON, "{fast} > {slow}");
  }

  #[test]
  fn confirmation_never_lowers_and_never_exceeds_ceiling(
    quality in 0.0f64..=1.0,
    rate in 0.0f64..0.999,
    distance in 0i64..500,
  ) {
    let plain = score(quality, distance, rate, false).unwrap();
    let confirmed = score(quality, distance, rate, true).unwrap();
    prop_assert!(confirmed >= plain);
    prop_assert!(confirmed <= SCORE_CEILING);
  }

  #[test]
  fn stays_within_unit_interval(
    quality in 0.0f64..=1.0,
    rate in 0.0f64..0.999,
    distance in 0i64..10_000,
    confirmed in any::<bool>(),
  ) {
    let s = score(quality, distance, rate, confirmed).unwrap();
    prop_assert!((0.0..=1.0).contains(&s));
  }

  #[test]
  fn out_of_range_rates_are_rejected(
    rate in prop_oneof![-10.0f64..0.0, 1.0f64..10.0],
  ) {
    prop_assert!(score(0.5, 1, rate, false).is_err());
  }
}
