//! Progress-preserving rescale of the remaining time in an interval

use std::time::Duration;

use tracing::warn;

/// Scale `old_remaining` so the same fraction of the interval is left after its
/// length changes from `old_total` to `new_total`.
///
/// The result is clamped to `[0, new_total]`. An `old_total` of zero counts as
/// a fully elapsed interval.
pub fn rescale_remaining(old_remaining: Duration, old_total: Duration, new_total: Duration) -> Duration {
    if old_total.is_zero() {
        warn!("Rescale requested against a zero-length interval, treating it as elapsed");
        return Duration::ZERO;
    }

    let remaining = if old_remaining > old_total {
        warn!(
            "Remaining time {:?} exceeded interval length {:?}, clamping before rescale",
            old_remaining, old_total
        );
        old_total
    } else {
        old_remaining
    };

    let scaled = new_total.as_nanos() * remaining.as_nanos() / old_total.as_nanos();
    let scaled = Duration::from_nanos(u64::try_from(scaled).unwrap_or(u64::MAX));
    scaled.min(new_total)
}

/// Fraction of the interval already elapsed, in `0.0..=1.0`
pub fn progress(remaining: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    let remaining = remaining.min(total);
    1.0 - remaining.as_secs_f64() / total.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn half_elapsed_stays_half_elapsed() {
        assert_eq!(rescale_remaining(secs(30), secs(60), secs(90)), secs(45));
        assert_eq!(rescale_remaining(secs(30), secs(60), secs(20)), secs(10));
    }

    #[test]
    fn untouched_and_finished_intervals_keep_their_ends() {
        assert_eq!(rescale_remaining(secs(60), secs(60), secs(90)), secs(90));
        assert_eq!(rescale_remaining(Duration::ZERO, secs(60), secs(90)), Duration::ZERO);
    }

    #[test]
    fn shrinking_to_zero_ends_the_interval() {
        assert_eq!(rescale_remaining(secs(5), secs(10), Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn zero_old_total_does_not_divide() {
        assert_eq!(rescale_remaining(secs(5), Duration::ZERO, secs(10)), Duration::ZERO);
    }

    #[test]
    fn overlong_remaining_is_clamped() {
        assert_eq!(rescale_remaining(secs(80), secs(60), secs(30)), secs(30));
    }

    #[test]
    fn sub_second_precision_survives() {
        let rescaled = rescale_remaining(Duration::from_millis(12_300), secs(20), secs(40));
        assert_eq!(rescaled, Duration::from_millis(24_600));
    }

    #[test]
    fn progress_is_fraction_elapsed() {
        assert_eq!(progress(secs(15), secs(60)), 0.75);
        assert_eq!(progress(secs(60), secs(60)), 0.0);
        assert_eq!(progress(secs(1), Duration::ZERO), 1.0);
    }
}
