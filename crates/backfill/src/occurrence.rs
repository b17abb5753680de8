//! Cron occurrence enumeration.
//!
//! Wraps the `cron` crate's schedule iterator behind the one primitive the
//! backfill loop needs: the next scheduled instant strictly after a cursor.

use std::str::FromStr;

use chrono::TimeZone;
use cron::Schedule;
use rerun_core::EpochSeconds;

/// Normalize a 5-field cron expression to the 6-field form the `cron` crate
/// expects.
///
/// Seconds `0` is prepended and numeric day-of-week values are moved from
/// POSIX numbering (`0`/`7` = Sunday) to the crate's (`1` = Sunday).
/// Anything else passes through trimmed.
pub(crate) fn normalize_cron(cron_5field: &str) -> String {
    let fields: Vec<&str> = cron_5field.split_whitespace().collect();
    if let [minute, hour, day_of_month, month, day_of_week] = fields[..] {
        format!(
            "0 {} {} {} {} {}",
            minute,
            hour,
            day_of_month,
            month,
            remap_day_of_week(day_of_week)
        )
    } else {
        // Already 6-field or non-standard; pass through as-is.
        fields.join(" ")
    }
}

fn remap_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(remap_day_item)
        .collect::<Vec<_>>()
        .join(",")
}

fn remap_day_item(item: &str) -> String {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step)),
        None => (item, None),
    };

    let remapped = match range.split_once('-') {
        Some((from, to)) => match (remap_day(from), remap_day(to)) {
            // `5-7` (Fri-Sun) becomes 6..=1 in crate numbering; split the wrap.
            (Some(a), Some(b)) if a > b && step.is_none() => {
                return if b == 1 { format!("{}-7,1", a) } else { format!("{}-7,1-{}", a, b) };
            }
            (a, b) => format!(
                "{}-{}",
                a.map_or_else(|| from.to_string(), |d| d.to_string()),
                b.map_or_else(|| to.to_string(), |d| d.to_string())
            ),
        },
        None => remap_day(range).map_or_else(|| range.to_string(), |d| d.to_string()),
    };

    match step {
        Some(step) => format!("{}/{}", remapped, step),
        None => remapped,
    }
}

fn remap_day(token: &str) -> Option<u8> {
    match token.parse::<u8>() {
        Ok(n) if n <= 7 => Some(n % 7 + 1),
        _ => None,
    }
}

/// Next-occurrence lookups for one job's cron schedule in a timezone.
#[derive(Debug, Clone)]
pub struct OccurrenceEnumerator<Tz: TimeZone> {
    schedule: Schedule,
    tz: Tz,
}

impl<Tz: TimeZone> OccurrenceEnumerator<Tz> {
    /// Parse a 5-field (or 6-field) cron expression.
    pub fn new(cron_schedule: &str, tz: Tz) -> Result<Self, cron::error::Error> {
        let schedule = Schedule::from_str(&normalize_cron(cron_schedule))?;
        Ok(Self { schedule, tz })
    }

    /// The first scheduled instant strictly after `from`.
    pub fn next_after(&self, from: EpochSeconds) -> Option<EpochSeconds> {
        let from = self.tz.timestamp_opt(from, 0).single()?;
        self.schedule.after(&from).next().map(|t| t.timestamp())
    }

    /// Seconds from `from` until the next scheduled instant.
    pub fn seconds_until_next(&self, from: EpochSeconds) -> Option<i64> {
        self.next_after(from).map(|next| next - from)
    }
}
