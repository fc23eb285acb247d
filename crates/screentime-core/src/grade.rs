//! Grade conversions: percentage, letter grade, GPA points.
//!
//! Every function here is total. Malformed input collapses to a safe default
//! (`0`, `F`, `0.0`) instead of producing an error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ClassRecord;

/// Letter grade on the fixed 10-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    F,
    D,
    C,
    B,
    A,
}

impl Letter {
    pub const ALL: [Letter; 5] = [Letter::A, Letter::B, Letter::C, Letter::D, Letter::F];

    /// Parse a single-letter label. Case-insensitive; anything else is `None`.
    pub fn parse(label: &str) -> Option<Letter> {
        match label.trim() {
            "A" | "a" => Some(Letter::A),
            "B" | "b" => Some(Letter::B),
            "C" | "c" => Some(Letter::C),
            "D" | "d" => Some(Letter::D),
            "F" | "f" => Some(Letter::F),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Letter::A => "A",
            Letter::B => "B",
            Letter::C => "C",
            Letter::D => "D",
            Letter::F => "F",
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (90+), B (80-89), C (70-79), D (60-69), F (<60).
pub fn percentage_to_letter(pct: f64) -> Letter {
    if pct >= 90.0 {
        Letter::A
    } else if pct >= 80.0 {
        Letter::B
    } else if pct >= 70.0 {
        Letter::C
    } else if pct >= 60.0 {
        Letter::D
    } else {
        Letter::F
    }
}

pub fn letter_to_gpa(letter: Letter) -> f64 {
    match letter {
        Letter::A => 4.0,
        Letter::B => 3.0,
        Letter::C => 2.0,
        Letter::D => 1.0,
        Letter::F => 0.0,
    }
}

/// GPA points for a free-text letter label; unknown labels are worth 0.0.
pub fn gpa_for_label(label: &str) -> f64 {
    Letter::parse(label).map(letter_to_gpa).unwrap_or(0.0)
}

pub fn percentage_to_gpa(pct: f64) -> f64 {
    letter_to_gpa(percentage_to_letter(pct))
}

/// Average GPA over active classes, or 0 when none are active.
pub fn calculate_gpa(classes: &[ClassRecord]) -> f64 {
    let points: Vec<f64> = classes
        .iter()
        .filter(|c| c.is_active)
        .map(|c| percentage_to_gpa(c.current_grade))
        .collect();

    if points.is_empty() {
        return 0.0;
    }
    points.iter().sum::<f64>() / points.len() as f64
}

/// Ordering rank used for improvement steps: F=0 .. A=4.
pub fn letter_rank(letter: Letter) -> i64 {
    match letter {
        Letter::F => 0,
        Letter::D => 1,
        Letter::C => 2,
        Letter::B => 3,
        Letter::A => 4,
    }
}

/// Parse a raw grade entry, round to 2 decimals, clamp to 0..=100.
pub fn validate_grade(raw: &str) -> f64 {
    match leading_float(raw) {
        Some(num) => normalize_grade(num),
        None => 0.0,
    }
}

/// Same rounding and clamping as [`validate_grade`] for an already-numeric grade.
pub fn normalize_grade(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    ((value * 100.0).round() / 100.0).clamp(0.0, 100.0)
}

/// Parse a raw missing-assignment count; negative or non-numeric input is 0.
pub fn validate_missing(raw: &str) -> u32 {
    match leading_int(raw) {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 0,
    }
}

/// Render minutes as `45m` or `1h 35m`.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 60 {
        return format!("{minutes}m");
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Longest numeric prefix (sign, digits, fraction, exponent) after leading whitespace.
fn leading_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    match s[..end].parse::<i64>() {
        Ok(n) => Some(n),
        // Overflowing digit runs saturate in the direction of their sign.
        Err(_) if bytes[0] == b'-' => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}
