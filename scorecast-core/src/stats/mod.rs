//! Statistics: descriptive measures for one series, pooled uncertainty
//! across subjects.

pub mod descriptive;
pub mod variance;

pub use descriptive::{calculate_trend, mean, standard_deviation, SubjectStats, Trend};
pub use variance::{pooled_sd, time_uncertainty, weighted_variance};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
