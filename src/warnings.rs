//! Non-fatal conditions surfaced to the user.
//!
//! Recoverable errors from journal operations are turned into warnings
//! instead of failing the command, and the store is checked against its
//! quota so users hear about it before saves start failing.

use crate::error::TripbookError;

/// Fraction of the storage quota above which a warning is shown.
pub const QUOTA_WARNING_RATIO: f64 = 0.8;

/// A warning about something the user should know but that did not stop
/// the command.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A save did not fit in the storage quota. The change is lost when the
    /// process exits.
    QuotaExceeded { key: String, needed: u64, quota: u64 },
    /// Stored documents are close to the quota.
    NearQuota { used: u64, quota: u64 },
    /// A photo could not be processed; the note is unchanged.
    ImageRejected { reason: String },
    /// Expense form input was rejected; nothing was recorded.
    ExpenseRejected { reason: String },
}

/// Map a recoverable error to a warning. Other errors return `None` and
/// should be reported as failures.
pub fn from_error(err: &TripbookError) -> Option<Warning> {
    match err {
        TripbookError::StorageQuotaExceeded { key, needed, quota } => {
            Some(Warning::QuotaExceeded {
                key: key.clone(),
                needed: *needed,
                quota: *quota,
            })
        }
        TripbookError::ImageDecode(reason) | TripbookError::ImageEncode(reason) => {
            Some(Warning::ImageRejected {
                reason: reason.clone(),
            })
        }
        TripbookError::InvalidExpenseInput(reason) => Some(Warning::ExpenseRejected {
            reason: reason.clone(),
        }),
        _ => None,
    }
}

/// Check storage usage and return any warnings.
pub fn check_thresholds(used: u64, quota: u64) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if quota > 0 && used as f64 > quota as f64 * QUOTA_WARNING_RATIO {
        warnings.push(Warning::NearQuota { used, quota });
    }

    warnings
}

/// Format a warning for display.
pub fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::QuotaExceeded { key, needed, quota } => {
            format!(
                "Warning: storage is full ({:.1}KB needed, {:.1}KB allowed) - '{}' was not saved",
                kib(*needed),
                kib(*quota),
                key
            )
        }
        Warning::NearQuota { used, quota } => {
            format!(
                "Warning: storage is {:.0}% full ({:.1}KB of {:.1}KB) - consider removing photos",
                *used as f64 / *quota as f64 * 100.0,
                kib(*used),
                kib(*quota)
            )
        }
        Warning::ImageRejected { reason } => {
            format!("Warning: image processing failed - {}", reason)
        }
        Warning::ExpenseRejected { reason } => {
            format!("Warning: expense not recorded - {}", reason)
        }
    }
}

fn kib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_warnings_under_threshold() {
        assert!(check_thresholds(1024, 5 * 1024 * 1024).is_empty());
        assert!(check_thresholds(0, 0).is_empty());
    }

    #[test]
    fn test_near_quota_warning() {
        let warnings = check_thresholds(900, 1000);
        assert_eq!(warnings, vec![Warning::NearQuota { used: 900, quota: 1000 }]);
    }

    #[test]
    fn test_recoverable_errors_become_warnings() {
        let quota = TripbookError::StorageQuotaExceeded {
            key: "notes".to_string(),
            needed: 10,
            quota: 5,
        };
        assert!(matches!(from_error(&quota), Some(Warning::QuotaExceeded { .. })));

        let image = TripbookError::ImageDecode("bad".to_string());
        assert!(matches!(from_error(&image), Some(Warning::ImageRejected { .. })));

        let expense = TripbookError::InvalidExpenseInput("empty".to_string());
        assert!(matches!(from_error(&expense), Some(Warning::ExpenseRejected { .. })));
    }

    #[test]
    fn test_fatal_errors_stay_errors() {
        assert!(from_error(&TripbookError::NotInitialized).is_none());
        assert!(from_error(&TripbookError::Storage("disk".to_string())).is_none());
    }

    #[test]
    fn test_format_quota_exceeded() {
        let msg = format_warning(&Warning::QuotaExceeded {
            key: "kyushu_trip_notes_v1".to_string(),
            needed: 6 * 1024,
            quota: 5 * 1024,
        });
        assert!(msg.starts_with("Warning:"));
        assert!(msg.contains("6.0KB"));
        assert!(msg.contains("kyushu_trip_notes_v1"));
    }

    #[test]
    fn test_format_near_quota() {
        let msg = format_warning(&Warning::NearQuota {
            used: 900,
            quota: 1000,
        });
        assert!(msg.contains("90%"));
    }
}
