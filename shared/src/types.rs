//! Common types used across the back office

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Message returned when a quantity or price computation leaves the decimal range
pub const AMOUNT_OVERFLOW: &str = "Valor do item excede o limite permitido";

text_enum! {
    /// Lifecycle of records that are soft deleted
    pub enum RecordStatus {
        Active => "active",
        Deleted => "deleted",
    }
}

/// Resolve a requested page size against a default and an upper bound.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested
        .filter(|limit| *limit > 0)
        .unwrap_or(default)
        .min(max)
}

/// Whole percentage of `part` in `total`, rounded half up. Zero when empty.
pub fn percent_of(part: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    ((part as i64) * 200 + total as i64) / (2 * total as i64)
}

/// `a * b`, rejecting results the decimal type cannot hold
pub fn checked_product(a: Decimal, b: Decimal) -> DomainResult<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| DomainError::validation(AMOUNT_OVERFLOW))
}

/// Sum of `values`, rejecting overflow
pub fn checked_total<I: IntoIterator<Item = Decimal>>(values: I) -> DomainResult<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| DomainError::validation(AMOUNT_OVERFLOW))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 50, 100), 50);
        assert_eq!(clamp_limit(Some(20), 50, 100), 20);
        assert_eq!(clamp_limit(Some(500), 50, 100), 100);
        assert_eq!(clamp_limit(Some(0), 50, 100), 50);
        assert_eq!(clamp_limit(Some(-3), 50, 100), 50);
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 0), 0);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(1, 2), 50);
        assert_eq!(percent_of(4, 4), 100);
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Decimal::from_str_exact("100000000000000000000").unwrap();
        assert_eq!(
            checked_product(big, big).unwrap_err().to_string(),
            AMOUNT_OVERFLOW
        );
        assert!(checked_total([Decimal::MAX, Decimal::ONE]).is_err());
        assert_eq!(
            checked_total([Decimal::ONE, Decimal::from(2)]).unwrap(),
            Decimal::from(3)
        );
    }

    #[test]
    fn test_record_status_text() {
        assert_eq!(RecordStatus::Deleted.as_str(), "deleted");
        assert_eq!("active".parse::<RecordStatus>(), Ok(RecordStatus::Active));
        assert!("archived".parse::<RecordStatus>().is_err());
    }
}
