//! Conversion edge cases and properties.
//!
//! - Exact numeric canonicalization
//! - Datetime resolution and range
//! - Character set round trips

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, FixedOffset, TimeZone};
use proptest::prelude::*;
use sybase_types::datetime::{from_datetime, to_datetime};
use sybase_types::decode::decode_text;
use sybase_types::encode::encode_text;
use sybase_types::{FromValue, Number, NumericMode, Value, numeric_value};

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

// ============================================================================
// Numeric canonicalization
// ============================================================================

mod numeric {
    use super::*;

    #[test]
    fn test_trailing_zero_fraction_becomes_int() {
        for text in ["0.0", "1.000", "-15.00", "123456789012345678.0000"] {
            assert!(
                matches!(numeric_value(text, NumericMode::Optimal), Value::Int(_)),
                "{text}"
            );
        }
    }

    #[test]
    fn test_numeric_mode_never_ints() {
        assert_eq!(
            numeric_value("5", NumericMode::Numeric),
            Value::Number(Number::parse("5").unwrap())
        );
    }

    proptest! {
        #[test]
        fn prop_i64_text_downcasts(v in any::<i64>()) {
            prop_assert_eq!(numeric_value(&v.to_string(), NumericMode::Optimal), Value::Int(v));
        }

        #[test]
        fn prop_i64_with_zero_fraction_downcasts(v in any::<i64>(), zeros in 1usize..6) {
            let text = format!("{v}.{}", "0".repeat(zeros));
            prop_assert_eq!(numeric_value(&text, NumericMode::Optimal), Value::Int(v));
        }

        #[test]
        fn prop_beyond_i64_stays_number(extra in 1u64..1_000_000, neg in any::<bool>()) {
            let magnitude = u128::from(i64::MAX as u64) + 1 + u128::from(extra);
            let text = if neg { format!("-{magnitude}") } else { magnitude.to_string() };
            let is_number = matches!(numeric_value(&text, NumericMode::Optimal), Value::Number(_));
            prop_assert!(is_number);
        }

        #[test]
        fn prop_fraction_preserved(int in -1_000_000i64..1_000_000, frac in 1u32..1000) {
            let frac = frac.to_string().trim_end_matches('0').to_owned();
            let text = format!("{int}.{frac}");
            let value = numeric_value(&text, NumericMode::Optimal);
            prop_assert_eq!(value.as_number().map(Number::as_str), Some(text.as_str()));
        }
    }
}

// ============================================================================
// Datetime conversion
// ============================================================================

mod datetime {
    use super::*;

    fn at(secs: i64, millis: u32) -> DateTime<FixedOffset> {
        utc().timestamp_opt(secs, millis * 1_000_000).single().unwrap()
    }

    proptest! {
        #[test]
        fn prop_datetime_resolution(
            secs in -6_847_804_800i64..253_402_300_000,
            millis in 0u32..1000,
        ) {
            let value = at(secs, millis);
            let back = from_datetime(to_datetime(&value, utc()).unwrap(), utc()).unwrap();
            let diff = (back - value).num_milliseconds().abs();
            prop_assert!(diff <= 2, "{value} -> {back}");
        }

        #[test]
        fn prop_datetime_days_and_ticks_in_range(secs in -6_847_804_800i64..253_402_300_000) {
            let dt = to_datetime(&at(secs, 999), utc()).unwrap();
            prop_assert!(dt.days >= 0 || secs < -2_208_988_800);
            prop_assert!((0..86_400 * 300).contains(&dt.time));
        }
    }

    #[test]
    fn test_offset_timestamp_binds_in_connection_zone() {
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        let value = plus_one.with_ymd_and_hms(2020, 6, 1, 1, 0, 0).unwrap();
        let dt = to_datetime(&value, utc()).unwrap();
        assert_eq!(dt.time, 0);
    }
}

// ============================================================================
// Character sets
// ============================================================================

mod charset {
    use super::*;

    proptest! {
        #[test]
        fn prop_utf8_text_survives(s in "\\PC*") {
            let bytes = encode_text(&s, encoding_rs::UTF_8).unwrap();
            prop_assert_eq!(decode_text(&bytes, encoding_rs::UTF_8, false).unwrap(), s);
        }

        #[test]
        fn prop_latin1_text_survives(s in "[a-zA-Z0-9 àéîõü]{0,40}") {
            let bytes = encode_text(&s, encoding_rs::WINDOWS_1252).unwrap();
            prop_assert_eq!(decode_text(&bytes, encoding_rs::WINDOWS_1252, false).unwrap(), s);
        }
    }

    #[test]
    fn test_extraction() {
        let v = Value::from("abc");
        assert_eq!(String::from_value(&v).unwrap(), "abc");
        assert!(i64::from_value(&v).is_err());
    }
}
