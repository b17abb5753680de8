//! Truncating an instant to the start of a unit.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use rerun_core::EpochSeconds;

use crate::calendar::{from_local, to_local};
use crate::error::TimeExprError;
use crate::unit::TimeUnit;

/// Snap `instant` down to the start of `unit` in `tz`. `None` leaves it as is.
pub fn apply_snap<Tz: TimeZone>(
    tz: &Tz,
    unit: Option<&str>,
    instant: EpochSeconds,
) -> Result<EpochSeconds, TimeExprError> {
    match unit {
        None => Ok(instant),
        Some(token) => snap_to(tz, TimeUnit::resolve_snap(token)?, instant),
    }
}

/// Snap to an already resolved unit.
///
/// Minutes and hours are trimmed as a delta from the local wall clock, so an
/// instant inside a repeated DST hour stays in that hour. Larger units go to
/// local midnight of the boundary date.
pub fn snap_to<Tz: TimeZone>(
    tz: &Tz,
    unit: TimeUnit,
    instant: EpochSeconds,
) -> Result<EpochSeconds, TimeExprError> {
    let local = to_local(tz, instant)?;
    let wall = local.naive_local();
    let date = wall.date();

    let midnight = |d: Option<NaiveDate>| -> Result<NaiveDateTime, TimeExprError> {
        d.and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or(TimeExprError::OutOfRange { instant })
    };

    let boundary = match unit {
        TimeUnit::Minute => return Ok(instant - i64::from(wall.second())),
        TimeUnit::Hour => {
            return Ok(instant - i64::from(wall.minute() * 60 + wall.second()));
        }
        TimeUnit::Day => midnight(Some(date))?,
        TimeUnit::Week => {
            let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
            midnight(date.checked_sub_days(back))?
        }
        TimeUnit::Month => midnight(date.with_day(1))?,
        TimeUnit::Year => midnight(NaiveDate::from_ymd_opt(date.year(), 1, 1))?,
        TimeUnit::Second => {
            return Err(TimeExprError::Unit {
                role: crate::error::UnitRole::Snap,
                token: unit.to_string(),
            });
        }
    };

    Ok(from_local(tz, boundary))
}
