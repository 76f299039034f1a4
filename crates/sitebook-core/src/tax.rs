//! Tax liability aggregation
//!
//! Sums three independent figures over a date window and derives the
//! company's position: VAT output (sales), VAT input (purchases) and
//! withholding tax retained from casual worker payments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An optionally bounded date window, end date inclusive
///
/// Dates are stored as `YYYY-MM-DD` DATE strings, so `date <= end`
/// covers the whole end day.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Parse optional `YYYY-MM-DD` bounds from query-string values
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| Error::InvalidData(format!("Invalid date (use YYYY-MM-DD): {}", s)))
        };
        Ok(Self {
            start: start.map(parse).transpose()?,
            end: end.map(parse).transpose()?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }

    /// Bounds as SQL-comparable DATE strings
    pub(crate) fn bound_strings(&self) -> (Option<String>, Option<String>) {
        (
            self.start.map(|d| d.to_string()),
            self.end.map(|d| d.to_string()),
        )
    }
}

/// The company's tax position over a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    /// VAT charged on sales
    pub vat_output: f64,
    /// VAT paid on purchases
    pub vat_input: f64,
    /// Withholding retained from casual payments
    pub withholding: f64,
    /// vat_output - vat_input, negative means a reclaim position
    pub vat_position: f64,
    /// vat_position + withholding; withholding is always owed regardless
    /// of the VAT position
    pub total_liability: f64,
}

/// Derive the position from the three sums
pub fn compute_liability(vat_output: f64, vat_input: f64, withholding: f64) -> TaxSummary {
    let vat_position = vat_output - vat_input;
    TaxSummary {
        vat_output,
        vat_input,
        withholding,
        vat_position,
        total_liability: vat_position + withholding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_compute_liability() {
        let summary = compute_liability(100.0, 40.0, 15.0);
        assert_eq!(summary.vat_position, 60.0);
        assert_eq!(summary.total_liability, 75.0);
    }

    #[test]
    fn test_negative_vat_position_keeps_withholding_additive() {
        let summary = compute_liability(100.0, 150.0, 15.0);
        assert_eq!(summary.vat_position, -50.0);
        assert_eq!(summary.total_liability, -35.0);
    }

    #[test]
    fn test_window_end_date_is_inclusive() {
        let window = DateWindow::parse(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        assert!(window.contains(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
    }

    #[test]
    fn test_unbounded_window_contains_everything() {
        let window = DateWindow::default();
        assert!(window.contains(NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()));
        assert!(window.contains(NaiveDate::from_ymd_opt(2099, 12, 31).unwrap()));
    }

    #[test]
    fn test_window_rejects_malformed_dates() {
        assert!(DateWindow::parse(Some("31/01/2024"), None).is_err());
        assert!(DateWindow::parse(None, Some("not-a-date")).is_err());
    }
}
