//! Conversions between epoch seconds and wall-clock time in a timezone.

use chrono::{DateTime, NaiveDateTime, Offset, TimeDelta, TimeZone};
use rerun_core::EpochSeconds;

use crate::error::TimeExprError;

pub(crate) fn to_local<Tz: TimeZone>(
    tz: &Tz,
    instant: EpochSeconds,
) -> Result<DateTime<Tz>, TimeExprError> {
    tz.timestamp_opt(instant, 0)
        .single()
        .ok_or(TimeExprError::OutOfRange { instant })
}

/// Map a wall-clock time back to epoch seconds.
///
/// Ambiguous times (DST fold) take the earlier instant. Times that do not
/// exist (DST gap) are read with the offset in effect just before the gap,
/// so they land as far past the gap's end as they were past its start.
pub(crate) fn from_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> EpochSeconds {
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.timestamp(),
        None => {
            let offset = i64::from(pre_gap_offset(tz, naive));
            (naive - TimeDelta::seconds(offset)).and_utc().timestamp()
        }
    }
}

/// Clocks only jump forward into a gap, so the offset before it is the
/// smaller of the offsets a day either side.
fn pre_gap_offset<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> i32 {
    let offset_at = |t: Option<NaiveDateTime>| {
        tz.offset_from_utc_datetime(&t.unwrap_or(naive))
            .fix()
            .local_minus_utc()
    };
    let day = TimeDelta::days(1);
    offset_at(naive.checked_sub_signed(day)).min(offset_at(naive.checked_add_signed(day)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};

    #[test]
    fn round_trips_in_fixed_offset() {
        let tz = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let instant = 1_546_300_800; // 2019-01-01T00:00:00Z
        let local = to_local(&tz, instant).unwrap();
        assert_eq!(local.naive_local().to_string(), "2019-01-01 05:30:00");
        assert_eq!(from_local(&tz, local.naive_local()), instant);
    }

    #[test]
    fn utc_wall_clock_is_epoch() {
        let naive = NaiveDate::from_ymd_opt(1970, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(from_local(&Utc, naive), 86_400);
    }
}
