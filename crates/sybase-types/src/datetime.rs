//! Conversions between server date/time encodings and timestamps.
//!
//! The server stores wall-clock time without a zone. Values read from a
//! result set are interpreted in the connection's time zone, and values
//! bound as parameters are first converted into that zone.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use ctlib_protocol::{CsDateTime, CsDateTime4};

use crate::error::TypeError;

/// Days from 1900-01-01 to 1970-01-01.
pub const SYB_DAYS_TO_EPOCH: i64 = 25567;
/// Seconds from 1900-01-01 to 1970-01-01.
pub const SYB_SECS_TO_EPOCH: i64 = SYB_DAYS_TO_EPOCH * SECS_PER_DAY;
/// Seconds from 0000-01-01 to 1970-01-01 (proleptic Gregorian).
pub const YEAR_ZERO_SECS: i64 = -62_167_219_200;
/// 9999-12-31 23:59:59 as epoch seconds.
pub const MAX_DATETIME_SECS: i64 = 253_402_300_799;
/// 1753-01-01 00:00:00 as epoch seconds.
pub const MIN_DATETIME_SECS: i64 = -6_847_804_800;

const SECS_PER_DAY: i64 = 86_400;
const TICKS_PER_SECOND: i64 = 300;
const MICROS_PER_TICK: f64 = 3_333.333_333_3;
const MILLIS_PER_TICK: f64 = 3.333_333_3;

/// The zone server wall-clock values are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerZone {
    /// A fixed UTC offset.
    Fixed(FixedOffset),
    /// A tz database region such as `Europe/Prague`.
    Region(Tz),
    /// The local zone of the client host.
    Local,
}

impl ServerZone {
    /// UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::Fixed(chrono::Utc.fix())
    }

    /// Parse an offset designator (see [`parse_offset`]) or a region name.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        if let Ok(offset) = parse_offset(text) {
            return Ok(Self::Fixed(offset));
        }
        text.trim()
            .parse::<Tz>()
            .map(Self::Region)
            .map_err(|_| TypeError::InvalidDateTime(format!("invalid time zone '{text}'")))
    }

    /// Attach this zone to a wall-clock time.
    ///
    /// An ambiguous time resolves to the earlier instant. A time inside a
    /// daylight-saving gap keeps its fields and takes the offset in force
    /// at the same UTC reading.
    pub fn localize(&self, naive: &NaiveDateTime) -> Result<DateTime<FixedOffset>, TypeError> {
        let resolved = match self {
            Self::Fixed(offset) => localize_in(offset, naive),
            Self::Region(tz) => localize_in(tz, naive),
            Self::Local => localize_in(&Local, naive),
        };
        resolved.ok_or_else(|| TypeError::InvalidDateTime(naive.to_string()))
    }

    /// Wall-clock fields of `ts` in this zone.
    #[must_use]
    pub fn wall_clock_of(&self, ts: &DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            Self::Fixed(offset) => ts.with_timezone(offset).naive_local(),
            Self::Region(tz) => ts.with_timezone(tz).naive_local(),
            Self::Local => ts.with_timezone(&Local).naive_local(),
        }
    }
}

impl From<FixedOffset> for ServerZone {
    fn from(offset: FixedOffset) -> Self {
        Self::Fixed(offset)
    }
}

impl From<Tz> for ServerZone {
    fn from(tz: Tz) -> Self {
        Self::Region(tz)
    }
}

impl fmt::Display for ServerZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(offset) => write!(f, "{offset}"),
            Self::Region(tz) => f.write_str(tz.name()),
            Self::Local => f.write_str("local"),
        }
    }
}

fn localize_in<Z: TimeZone>(tz: &Z, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            Some(dt.with_timezone(&dt.offset().fix()))
        }
        LocalResult::None => tz
            .offset_from_utc_datetime(naive)
            .fix()
            .from_local_datetime(naive)
            .single(),
    }
}

/// Build a timestamp whose wall-clock fields in `tz` are `secs` after the epoch.
pub fn wall_clock(
    tz: impl Into<ServerZone>,
    secs: i64,
    micros: u32,
) -> Result<DateTime<FixedOffset>, TypeError> {
    let naive = DateTime::from_timestamp(secs, micros * 1_000)
        .ok_or_else(|| TypeError::InvalidDateTime(format!("{secs} seconds out of range")))?
        .naive_utc();
    tz.into().localize(&naive)
}

fn split_ticks(ticks: i64) -> (i64, u32) {
    let secs = ticks / TICKS_PER_SECOND;
    let rem = ticks - secs * TICKS_PER_SECOND;
    let millis = (rem as f64 * MILLIS_PER_TICK).round() as u32;
    (secs, millis * 1_000)
}

/// `CS_DATETIME` to a timestamp.
pub fn from_datetime(dt: CsDateTime, tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    let (secs, micros) = split_ticks(i64::from(dt.time));
    let total = secs + i64::from(dt.days) * SECS_PER_DAY - SYB_SECS_TO_EPOCH;
    wall_clock(tz, total, micros)
}

/// `CS_DATETIME` carrying only a time of day, as 1970-01-01 at that time.
pub fn time_of_day(dt: CsDateTime, tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    let (secs, micros) = split_ticks(i64::from(dt.time));
    wall_clock(tz, secs, micros)
}

/// `CS_TIME` (1/300 second ticks since midnight) to 1970-01-01 at that time.
pub fn from_time(ticks: i32, tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    let (secs, micros) = split_ticks(i64::from(ticks));
    wall_clock(tz, secs, micros)
}

/// `CS_DATETIME4` to a timestamp.
pub fn from_datetime4(dt: CsDateTime4, tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    let total = i64::from(dt.minutes) * 60 + i64::from(dt.days) * SECS_PER_DAY - SYB_SECS_TO_EPOCH;
    wall_clock(tz, total, 0)
}

/// `CS_BIGDATETIME` (microseconds since 0000-01-01) to a timestamp.
pub fn from_bigdatetime(micros: u64, tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    let secs = i64::try_from(micros / 1_000_000).map_err(|_| TypeError::OutOfRange {
        target_type: "CS_BIGDATETIME",
    })?;
    wall_clock(tz, secs + YEAR_ZERO_SECS, (micros % 1_000_000) as u32)
}

/// `CS_BIGTIME` (microseconds since midnight) to 1970-01-01 at that time.
pub fn from_bigtime(micros: u64, tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    let secs = i64::try_from(micros / 1_000_000).map_err(|_| TypeError::OutOfRange {
        target_type: "CS_BIGTIME",
    })?;
    wall_clock(tz, secs, (micros % 1_000_000) as u32)
}

/// `CS_DATE` (days since 1900-01-01) to midnight of that day.
pub fn from_date(days: i32, tz: impl Into<ServerZone>) -> Result<DateTime<FixedOffset>, TypeError> {
    wall_clock(tz, i64::from(days) * SECS_PER_DAY - SYB_SECS_TO_EPOCH, 0)
}


/// Timestamp to `CS_DATETIME`, with the 1/300 second resolution of the type.
///
/// Fails for dates outside 1753-01-01 through 9999-12-31, judged after
/// rounding to the nearest tick.
pub fn to_datetime(
    ts: &DateTime<FixedOffset>,
    tz: impl Into<ServerZone>,
) -> Result<CsDateTime, TypeError> {
    let local = tz.into().wall_clock_of(ts);
    let utc = local.and_utc();
    let secs = utc.timestamp();

    let mut days = secs.div_euclid(SECS_PER_DAY);
    let mut ticks = secs.rem_euclid(SECS_PER_DAY) * TICKS_PER_SECOND
        + (f64::from(utc.timestamp_subsec_micros()) / MICROS_PER_TICK).round() as i64;
    if ticks >= SECS_PER_DAY * TICKS_PER_SECOND {
        days += 1;
        ticks -= SECS_PER_DAY * TICKS_PER_SECOND;
    }

    if days > MAX_DATETIME_SECS.div_euclid(SECS_PER_DAY) {
        return Err(TypeError::DateOutOfRange(format!(
            "maximum sybase datetime value is 9999-12-31, date passed: {}",
            local.format("%Y-%m-%d")
        )));
    }
    if days < MIN_DATETIME_SECS.div_euclid(SECS_PER_DAY) {
        return Err(TypeError::DateOutOfRange(format!(
            "minimum sybase datetime value is 1753-01-01, date passed: {}",
            local.format("%Y-%m-%d")
        )));
    }

    let days = i32::try_from(days + SYB_DAYS_TO_EPOCH).map_err(|_| TypeError::OutOfRange {
        target_type: "CS_DATETIME",
    })?;
    let time = i32::try_from(ticks).map_err(|_| TypeError::OutOfRange {
        target_type: "CS_DATETIME",
    })?;
    Ok(CsDateTime { days, time })
}

/// Parse a time zone designator: `UTC`, `Z`, `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH`.
pub fn parse_offset(text: &str) -> Result<FixedOffset, TypeError> {
    let invalid = || TypeError::InvalidDateTime(format!("invalid time zone '{text}'"));
    let t = text.trim();
    if t.eq_ignore_ascii_case("utc") || t.eq_ignore_ascii_case("z") || t.eq_ignore_ascii_case("gmt") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    let (sign, rest) = match t.as_bytes().first() {
        Some(b'+') => (1, &t[1..]),
        Some(b'-') => (-1, &t[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| invalid())?,
            digits[2..].parse::<i32>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, Timelike};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> DateTime<FixedOffset> {
        let naive = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap();
        utc().from_local_datetime(&naive).single().unwrap()
    }

    #[test]
    fn test_epoch() {
        let dt = CsDateTime {
            days: SYB_DAYS_TO_EPOCH as i32,
            time: 0,
        };
        assert_eq!(from_datetime(dt, utc()).unwrap().timestamp(), 0);
        assert_eq!(to_datetime(&ts(1970, 1, 1, 0, 0, 0, 0), utc()).unwrap(), dt);
    }

    #[test]
    fn test_datetime_ticks() {
        // 2024-02-29 12:34:56.500
        let value = ts(2024, 2, 29, 12, 34, 56, 500);
        let dt = to_datetime(&value, utc()).unwrap();
        assert_eq!(dt.time, (12 * 3600 + 34 * 60 + 56) * 300 + 150);
        assert_eq!(from_datetime(dt, utc()).unwrap(), value);
    }

    #[test]
    fn test_pre_epoch() {
        let value = ts(1900, 1, 1, 6, 0, 0, 0);
        let dt = to_datetime(&value, utc()).unwrap();
        assert_eq!(dt, CsDateTime { days: 0, time: 6 * 3600 * 300 });
        assert_eq!(from_datetime(dt, utc()).unwrap(), value);
    }

    #[test]
    fn test_rounds_into_next_day() {
        let naive = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_micro_opt(23, 59, 59, 999_900)
            .unwrap();
        let value = utc().from_local_datetime(&naive).single().unwrap();
        let dt = to_datetime(&value, utc()).unwrap();
        assert_eq!(dt.time, 0);
        assert_eq!(from_datetime(dt, utc()).unwrap().day(), 2);
    }

    #[test]
    fn test_range_limits() {
        let err = to_datetime(&ts(1752, 12, 31, 0, 0, 0, 0), utc()).unwrap_err();
        assert!(err.to_string().starts_with("minimum sybase datetime value is 1753-01-01"));
        assert!(to_datetime(&ts(1753, 1, 1, 0, 0, 0, 0), utc()).is_ok());
        assert!(to_datetime(&ts(9999, 12, 31, 23, 59, 59, 0), utc()).is_ok());
        assert_eq!(
            to_datetime(&ts(9999, 12, 31, 23, 59, 59, 997), utc()).unwrap().time,
            86_400 * 300 - 1
        );
    }

    #[test]
    fn test_rounding_past_maximum_is_rejected() {
        let naive = NaiveDate::from_ymd_opt(9999, 12, 31)
            .unwrap()
            .and_hms_micro_opt(23, 59, 59, 999_900)
            .unwrap();
        let value = utc().from_local_datetime(&naive).single().unwrap();
        let err = to_datetime(&value, utc()).unwrap_err();
        assert!(err.to_string().starts_with("maximum sybase datetime value is 9999-12-31"));
    }

    #[test]
    fn test_connection_time_zone() {
        let tz = parse_offset("+02:00").unwrap();
        let dt = CsDateTime {
            days: SYB_DAYS_TO_EPOCH as i32,
            time: 3600 * 300,
        };
        let value = from_datetime(dt, tz).unwrap();
        assert_eq!(value.hour(), 1);
        assert_eq!(value.offset(), &tz);
        assert_eq!(value.timestamp(), -3600);

        // a UTC timestamp binds as its wall-clock time in the connection zone
        let bound = to_datetime(&ts(1970, 1, 1, 0, 0, 0, 0), tz).unwrap();
        assert_eq!(bound.time, 2 * 3600 * 300);
    }

    #[test]
    fn test_other_encodings() {
        let t = time_of_day(CsDateTime { days: 40000, time: 300 * 61 }, utc()).unwrap();
        assert_eq!((t.year(), t.minute(), t.second()), (1970, 1, 1));

        let d4 = from_datetime4(
            CsDateTime4 {
                days: 25567,
                minutes: 90,
            },
            utc(),
        )
        .unwrap();
        assert_eq!(d4.timestamp(), 5400);

        let big = from_bigdatetime((-YEAR_ZERO_SECS as u64) * 1_000_000 + 7, utc()).unwrap();
        assert_eq!(big.timestamp(), 0);
        assert_eq!(big.timestamp_subsec_micros(), 7);

        assert_eq!(from_bigtime(1_500_000, utc()).unwrap().timestamp_subsec_millis(), 500);
        assert_eq!(from_date(25568, utc()).unwrap().timestamp(), 86_400);
        assert_eq!(from_time(300, utc()).unwrap().timestamp(), 1);
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_offset("-0530").unwrap().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(parse_offset("+01").unwrap().local_minus_utc(), 3600);
        assert!(parse_offset("Europe/Prague").is_err());
        assert!(parse_offset("+25:00").is_err());
    }

    #[test]
    fn test_server_zone_parse() {
        assert_eq!(ServerZone::parse("UTC").unwrap(), ServerZone::utc());
        assert_eq!(
            ServerZone::parse("+02:00").unwrap(),
            ServerZone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert_eq!(
            ServerZone::parse("Europe/Prague").unwrap(),
            ServerZone::Region(chrono_tz::Europe::Prague)
        );
        assert_eq!(ServerZone::parse(" Europe/Prague ").unwrap().to_string(), "Europe/Prague");
        assert!(ServerZone::parse("Mars/Olympus").is_err());
    }

    #[test]
    fn test_region_follows_daylight_saving() {
        let prague = ServerZone::Region(chrono_tz::Europe::Prague);

        // winter: UTC+1
        let winter = from_datetime(
            CsDateTime {
                days: SYB_DAYS_TO_EPOCH as i32 + 19_737, // 2024-01-15
                time: 12 * 3600 * 300,
            },
            prague,
        )
        .unwrap();
        assert_eq!(winter.offset().local_minus_utc(), 3600);
        assert_eq!(winter.hour(), 12);

        // summer: UTC+2
        let summer = from_datetime(
            CsDateTime {
                days: SYB_DAYS_TO_EPOCH as i32 + 19_919, // 2024-07-15
                time: 12 * 3600 * 300,
            },
            prague,
        )
        .unwrap();
        assert_eq!(summer.offset().local_minus_utc(), 7200);
        assert_eq!(to_datetime(&summer, prague).unwrap().time, 12 * 3600 * 300);

        // a UTC instant binds as Prague wall-clock time
        let bound = to_datetime(&ts(2024, 7, 15, 10, 0, 0, 0), prague).unwrap();
        assert_eq!(bound.time, 12 * 3600 * 300);
    }

    #[test]
    fn test_region_gap_and_overlap() {
        let prague = ServerZone::Region(chrono_tz::Europe::Prague);
        // 2024-03-31 02:30 does not exist in Prague
        let gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let value = prague.localize(&gap).unwrap();
        assert_eq!(value.naive_local(), gap);

        // 2024-10-27 02:30 happens twice; the earlier one wins
        let overlap = NaiveDate::from_ymd_opt(2024, 10, 27)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(prague.localize(&overlap).unwrap().offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_local_zone_round_trip() {
        let value = ts(2024, 3, 15, 12, 30, 45, 500);
        let dt = to_datetime(&value, ServerZone::Local).unwrap();
        assert_eq!(from_datetime(dt, ServerZone::Local).unwrap(), value);
    }
}
