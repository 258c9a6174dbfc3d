//! Strategy-based job selection.
//!
//! `select` is a pure function: filter by minimum payment, order by the
//! active strategy, truncate to free capacity. It never mutates scheduler
//! state and never fails — invalid job data is filtered defensively.

use std::cmp::Ordering;

use gigpilot_core::types::{JobDescriptor, Strategy};

/// Weight of the normalised payment in the balanced composite score.
const W_PAYMENT: f64 = 0.35;
/// Weight of the success rate.
const W_SUCCESS: f64 = 0.25;
/// Weight of the inverse estimated time (shorter jobs score higher).
const W_TIME: f64 = 0.20;
/// Weight of the payout speed (instant scores highest).
const W_SPEED: f64 = 0.20;

/// Rank and truncate `catalog` under `strategy`.
///
/// Returns at most `free_slots` jobs, all paying at least `min_payment`,
/// ordered best-first. Jobs with non-finite or negative payment, a
/// non-positive time estimate, or a non-finite success rate are dropped.
pub fn select(
    catalog: &[JobDescriptor],
    strategy: Strategy,
    min_payment: f64,
    free_slots: usize,
) -> Vec<JobDescriptor> {
    if free_slots == 0 {
        return Vec::new();
    }

    let mut eligible: Vec<&JobDescriptor> = catalog
        .iter()
        .filter(|job| is_well_formed(job))
        .filter(|job| job.payment >= min_payment)
        .collect();

    match strategy {
        Strategy::QuickPayout => {
            eligible.sort_by(|a, b| {
                a.payout_speed
                    .rank()
                    .cmp(&b.payout_speed.rank())
                    .then_with(|| cmp_f64(b.success_rate, a.success_rate))
            });
        }
        Strategy::BigYield => {
            eligible.sort_by(|a, b| {
                cmp_f64(b.payment, a.payment)
                    .then_with(|| a.estimated_time_mins.cmp(&b.estimated_time_mins))
            });
        }
        Strategy::GuaranteedCompletion => {
            eligible.sort_by(|a, b| {
                a.difficulty
                    .rank()
                    .cmp(&b.difficulty.rank())
                    .then_with(|| cmp_f64(b.success_rate, a.success_rate))
            });
        }
        Strategy::Balanced => {
            let bounds = PaymentTimeBounds::over(&eligible);
            eligible.sort_by(|a, b| {
                cmp_f64(bounds.composite_score(b), bounds.composite_score(a))
                    .then_with(|| cmp_f64(b.payment, a.payment))
            });
        }
    }

    eligible.into_iter().take(free_slots).cloned().collect()
}

/// Defensive validation — malformed descriptors are dropped, not
/// propagated as errors.
fn is_well_formed(job: &JobDescriptor) -> bool {
    job.payment.is_finite()
        && job.payment >= 0.0
        && job.estimated_time_mins > 0
        && job.success_rate.is_finite()
}

/// Total order over f64 — NaN never reaches here (filtered above), so
/// incomparable pairs collapse to Equal.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Min/max payment and time over the eligible set, for normalisation.
struct PaymentTimeBounds {
    min_payment: f64,
    max_payment: f64,
    min_time: f64,
    max_time: f64,
}

impl PaymentTimeBounds {
    fn over(jobs: &[&JobDescriptor]) -> Self {
        let mut bounds = Self {
            min_payment: f64::INFINITY,
            max_payment: f64::NEG_INFINITY,
            min_time: f64::INFINITY,
            max_time: f64::NEG_INFINITY,
        };
        for job in jobs {
            bounds.min_payment = bounds.min_payment.min(job.payment);
            bounds.max_payment = bounds.max_payment.max(job.payment);
            let time = f64::from(job.estimated_time_mins);
            bounds.min_time = bounds.min_time.min(time);
            bounds.max_time = bounds.max_time.max(time);
        }
        bounds
    }

    /// Weighted composite in [0, 1]: payment and inverse time are min-max
    /// normalised over the eligible set, success rate is used as-is, and
    /// payout speed maps instant/weekly/monthly to 1.0/0.5/0.0.
    fn composite_score(&self, job: &JobDescriptor) -> f64 {
        let payment = normalise(job.payment, self.min_payment, self.max_payment);
        let time = 1.0 - normalise(f64::from(job.estimated_time_mins), self.min_time, self.max_time);
        let speed = f64::from(2 - job.payout_speed.rank()) / 2.0;

        W_PAYMENT * payment + W_SUCCESS * job.success_rate + W_TIME * time + W_SPEED * speed
    }
}

/// Min-max normalise into [0, 1]; a degenerate range scores 1.0 so a
/// single-value axis neither helps nor hurts any candidate.
fn normalise(value: f64, min: f64, max: f64) -> f64 {
    if max > min {
        (value - min) / (max - min)
    } else {
        1.0
    }
}
