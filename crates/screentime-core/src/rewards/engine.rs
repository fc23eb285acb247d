//! Reward engine.
//!
//! The allowance is a sum of independent terms, applied in this order:
//!
//! ```text
//! baseline
//!   - missing assignments x perMissing
//!   - D classes x classWithD
//!   - F classes x classWithF
//!   + zeroMissingAll          (no missing work, at least one class)
//!   + letter steps gained x classImproved   (vs. last grade before today)
//!   + A classes x classWithA
//! floored at minimumScreenTime
//! ```
//!
//! Only the trace order depends on the sequence; the numeric result does not.
//! Every term saturates at the `i64` bounds, so extreme settings clamp
//! instead of overflowing.

use chrono::{NaiveDate, Utc};

use crate::grade::{letter_rank, percentage_to_letter, Letter};
use crate::model::{ClassRecord, GradeHistoryEntry, ScreenTimeBreakdown, Settings};

/// Calculate today's (UTC) allowance. Inactive classes are ignored.
pub fn calculate_screen_time(
    classes: &[ClassRecord],
    history: &[GradeHistoryEntry],
    settings: &Settings,
) -> ScreenTimeBreakdown {
    calculate_screen_time_on(classes, history, settings, Utc::now().date_naive())
}

/// Calculate the allowance as of `today`.
///
/// History entries recorded on `today` (or later) never count as a
/// "previous" grade.
pub fn calculate_screen_time_on(
    classes: &[ClassRecord],
    history: &[GradeHistoryEntry],
    settings: &Settings,
    today: NaiveDate,
) -> ScreenTimeBreakdown {
    let active: Vec<&ClassRecord> = classes.iter().filter(|c| c.is_active).collect();
    let penalties = &settings.penalties;
    let bonuses = &settings.bonuses;
    let mut details = Vec::new();

    let baseline = settings.baseline;
    details.push(format!("Baseline: {baseline} min"));

    let total_missing: i64 = active
        .iter()
        .map(|c| i64::from(c.missing_assignments))
        .fold(0, i64::saturating_add);
    let missing_penalty = total_missing.saturating_mul(penalties.per_missing);
    if total_missing > 0 {
        details.push(format!(
            "Missing assignments ({total_missing} x -{}): -{missing_penalty} min",
            penalties.per_missing
        ));
    }

    let d_count = count_letter(&active, Letter::D);
    let d_grade_penalty = d_count.saturating_mul(penalties.class_with_d);
    if d_count > 0 {
        details.push(format!(
            "D grades ({d_count} x -{}): -{d_grade_penalty} min",
            penalties.class_with_d
        ));
    }

    let f_count = count_letter(&active, Letter::F);
    let f_grade_penalty = f_count.saturating_mul(penalties.class_with_f);
    if f_count > 0 {
        details.push(format!(
            "F grades ({f_count} x -{}): -{f_grade_penalty} min",
            penalties.class_with_f
        ));
    }

    let zero_missing_bonus = if total_missing == 0 && !active.is_empty() {
        bonuses.zero_missing_all
    } else {
        0
    };
    if zero_missing_bonus != 0 {
        details.push(format!("Zero missing assignments: +{zero_missing_bonus} min"));
    }

    let mut improvement_bonus: i64 = 0;
    for class in &active {
        let Some(prior) = previous_grade(&class.id, history, today) else {
            continue;
        };
        let current_letter = class.letter();
        let prior_letter = percentage_to_letter(prior);
        let steps = letter_rank(current_letter) - letter_rank(prior_letter);
        if steps > 0 {
            let bonus = steps.saturating_mul(bonuses.class_improved);
            improvement_bonus = improvement_bonus.saturating_add(bonus);
            details.push(format!(
                "{} improved {prior_letter} \u{2192} {current_letter}: +{bonus} min",
                class.name
            ));
        }
    }

    let a_count = count_letter(&active, Letter::A);
    let a_class_bonus = a_count.saturating_mul(bonuses.class_with_a);
    if a_count > 0 {
        details.push(format!(
            "A grades ({a_count} x +{}): +{a_class_bonus} min",
            bonuses.class_with_a
        ));
    }

    let mut breakdown = ScreenTimeBreakdown {
        baseline,
        missing_penalty,
        d_grade_penalty,
        f_grade_penalty,
        zero_missing_bonus,
        improvement_bonus,
        a_class_bonus,
        total: 0,
        details: Vec::new(),
    };
    breakdown.total = breakdown.raw_total().max(settings.minimum_screen_time);

    details.push(format!("Total: {} min", breakdown.total));
    breakdown.details = details;
    breakdown
}

/// Grade from the latest history entry for `class_id` recorded strictly
/// before `today`.
pub fn previous_grade(
    class_id: &str,
    history: &[GradeHistoryEntry],
    today: NaiveDate,
) -> Option<f64> {
    history
        .iter()
        .filter(|h| h.class_id == class_id && h.recorded_on() < today)
        .max_by_key(|h| h.recorded_at)
        .map(|h| h.grade)
}

fn count_letter(classes: &[&ClassRecord], letter: Letter) -> i64 {
    classes.iter().filter(|c| c.letter() == letter).count() as i64
}
