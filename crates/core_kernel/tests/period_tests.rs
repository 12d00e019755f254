//! Tests for billing periods and timezone resolution

use core_kernel::{BillingPeriod, PeriodError, Timezone};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

mod construction {
    use super::*;

    #[test]
    fn test_new_accepts_calendar_months() {
        let period = BillingPeriod::new(3, 2025).unwrap();
        assert_eq!(period.month(), 3);
        assert_eq!(period.year(), 2025);
    }

    #[test]
    fn test_new_rejects_month_zero_and_thirteen() {
        assert_eq!(BillingPeriod::new(0, 2025), Err(PeriodError::InvalidMonth(0)));
        assert_eq!(BillingPeriod::new(13, 2025), Err(PeriodError::InvalidMonth(13)));
    }

    #[test]
    fn test_new_rejects_year_out_of_range() {
        assert_eq!(BillingPeriod::new(1, 0), Err(PeriodError::InvalidYear(0)));
        assert_eq!(BillingPeriod::new(1, 10_000), Err(PeriodError::InvalidYear(10_000)));
    }

    #[test]
    fn test_display_pads_month() {
        assert_eq!(BillingPeriod::new(7, 2024).unwrap().to_string(), "07/2024");
    }

    #[test]
    fn test_ordering_is_chronological() {
        let dec = BillingPeriod::new(12, 2024).unwrap();
        let jan = BillingPeriod::new(1, 2025).unwrap();
        assert!(dec < jan);
    }
}

mod timezone {
    use super::*;

    #[test]
    fn test_containing_uses_local_calendar() {
        // 17:30 UTC on the last day of January is already February in Jakarta (UTC+7).
        let instant = Utc.with_ymd_and_hms(2025, 1, 31, 17, 30, 0).unwrap();

        let jakarta = BillingPeriod::containing(instant, Timezone::default());
        let utc = BillingPeriod::containing(instant, Timezone::new(chrono_tz::UTC));

        assert_eq!(jakarta, BillingPeriod::new(2, 2025).unwrap());
        assert_eq!(utc, BillingPeriod::new(1, 2025).unwrap());
    }

    #[test]
    fn test_timezone_parse_and_serde() {
        let tz: Timezone = "Asia/Makassar".parse().unwrap();
        let json = serde_json::to_string(&tz).unwrap();
        assert_eq!(json, "\"Asia/Makassar\"");

        let back: Timezone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tz);
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let result = "Mars/Olympus".parse::<Timezone>();
        assert!(matches!(result, Err(PeriodError::UnknownTimezone(_))));
    }
}

proptest! {
    #[test]
    fn prop_valid_months_always_construct(month in 1u32..=12, year in 1i32..=9999) {
        let period = BillingPeriod::new(month, year).unwrap();
        prop_assert_eq!(period.month(), month);
        prop_assert_eq!(period.year(), year);
    }

    #[test]
    fn prop_invalid_months_never_construct(month in 13u32..1000, year in 1i32..=9999) {
        prop_assert!(BillingPeriod::new(month, year).is_err());
    }
}
