//! Shifting an instant by a signed amount of some unit.

use chrono::TimeZone;
use rerun_core::EpochSeconds;

use crate::error::TimeExprError;
use crate::unit::TimeUnit;

/// Shift `instant` by `amount` units. If either is `None` it is returned as is.
pub fn apply_offset<Tz: TimeZone>(
    tz: &Tz,
    amount: Option<i64>,
    unit: Option<&str>,
    instant: EpochSeconds,
) -> Result<EpochSeconds, TimeExprError> {
    match (amount, unit) {
        (Some(amount), Some(token)) => shift(tz, amount, TimeUnit::resolve_offset(token)?, instant),
        _ => Ok(instant),
    }
}

/// Shift by an already resolved unit.
pub fn shift<Tz: TimeZone>(
    tz: &Tz,
    amount: i64,
    unit: TimeUnit,
    instant: EpochSeconds,
) -> Result<EpochSeconds, TimeExprError> {
    match unit.fixed_seconds() {
        Some(factor) => amount
            .checked_mul(factor)
            .and_then(|delta| instant.checked_add(delta))
            .ok_or(TimeExprError::OutOfRange { instant }),
        None => add_months(tz, amount, instant),
    }
}

/// Calendar month arithmetic on the local wall clock. Days past the end of
/// the target month clip to its last day (Jan 31 + 1 month = Feb 28/29).
#[cfg(feature = "calendar")]
fn add_months<Tz: TimeZone>(
    tz: &Tz,
    amount: i64,
    instant: EpochSeconds,
) -> Result<EpochSeconds, TimeExprError> {
    use chrono::Months;

    use crate::calendar::{from_local, to_local};

    let out_of_range = TimeExprError::OutOfRange { instant };
    let local = to_local(tz, instant)?;
    let months = u32::try_from(amount.unsigned_abs()).map_err(|_| out_of_range.clone())?;
    let wall = local.naive_local();
    let shifted = if amount >= 0 {
        wall.checked_add_months(Months::new(months))
    } else {
        wall.checked_sub_months(Months::new(months))
    }
    .ok_or(out_of_range)?;

    Ok(from_local(tz, shifted))
}

#[cfg(not(feature = "calendar"))]
fn add_months<Tz: TimeZone>(
    _tz: &Tz,
    _amount: i64,
    _instant: EpochSeconds,
) -> Result<EpochSeconds, TimeExprError> {
    Err(TimeExprError::CalendarUnsupported)
}
