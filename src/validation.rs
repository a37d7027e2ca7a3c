use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

/// Validates that a string is not blank (empty or whitespace-only).
/// Returns the trimmed string on success.
pub fn non_blank(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        Err(AppError::BlankField {
            field: field.to_string(),
        })
    } else {
        Ok(trimmed)
    }
}

/// Validates that the trimmed string has at least `min` characters.
pub fn min_length(value: &str, field: &str, min: usize) -> AppResult<String> {
    let trimmed = value.trim().to_string();
    if trimmed.chars().count() < min {
        Err(AppError::TooShort {
            field: field.to_string(),
            min,
        })
    } else {
        Ok(trimmed)
    }
}

/// Validates that an integer is positive (> 0).
pub fn positive(value: i64, field: &str) -> AppResult<i64> {
    if value <= 0 {
        Err(AppError::NonPositive {
            field: field.to_string(),
        })
    } else {
        Ok(value)
    }
}

pub fn non_negative(value: i64, field: &str) -> AppResult<i64> {
    if value < 0 {
        Err(AppError::Negative {
            field: field.to_string(),
        })
    } else {
        Ok(value)
    }
}

/// Validates `min <= value <= max`.
pub fn in_range(value: i64, field: &str, min: i64, max: i64) -> AppResult<i64> {
    if value < min || value > max {
        Err(AppError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        })
    } else {
        Ok(value)
    }
}

/// Validates that a set/vec is non-empty.
pub fn non_empty_set<T>(value: &[T], field: &str) -> AppResult<()> {
    if value.is_empty() {
        Err(AppError::EmptySet {
            field: field.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Both ages must be non-negative and ordered.
pub fn age_range(min_age: i32, max_age: i32) -> AppResult<()> {
    non_negative(min_age as i64, "min_age")?;
    non_negative(max_age as i64, "max_age")?;
    if min_age > max_age {
        return Err(AppError::InvalidAgeRange);
    }
    Ok(())
}

/// Only checked when both ends are known.
pub fn date_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    match (start, end) {
        (Some(s), Some(e)) if s >= e => Err(AppError::InvalidDateRange),
        _ => Ok(()),
    }
}

/// Trims an optional string, returning None if blank.
pub fn trim_optional(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
