//! Unit tokens and how they resolve.
//!
//! Tokens are matched by containment, not equality: `mins`, `minute` and
//! `xminx` are all minutes, and any token containing `w` is a week.
//!
//! Snaps and offsets try the units in different orders, which only matters
//! for tokens that satisfy more than one rule (`monw` is a week as an offset
//! but a month as a snap). Snaps have no seconds unit.

use std::fmt;

use crate::error::{TimeExprError, UnitRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

use TimeUnit::*;

const SNAP_ORDER: [TimeUnit; 6] = [Minute, Hour, Day, Month, Year, Week];
const OFFSET_ORDER: [TimeUnit; 7] = [Second, Minute, Hour, Day, Week, Year, Month];

impl TimeUnit {
    /// Whether `token` is one of this unit's accepted spellings.
    pub fn matches(self, token: &str) -> bool {
        match self {
            Second => token == "s" || token.contains("sec"),
            Minute => token == "m" || token.contains("min"),
            Hour => token == "h" || token.contains("hr") || token.contains("hour"),
            Day => token == "d" || token.contains("day"),
            Week => token.contains('w'),
            Month => token.contains("mon"),
            Year => token == "y" || token.contains("yr") || token.contains("year"),
        }
    }

    /// Resolve the unit after an `@`.
    pub fn resolve_snap(token: &str) -> Result<Self, TimeExprError> {
        resolve(token, &SNAP_ORDER, UnitRole::Snap)
    }

    /// Resolve the unit of an offset.
    pub fn resolve_offset(token: &str) -> Result<Self, TimeExprError> {
        resolve(token, &OFFSET_ORDER, UnitRole::Offset)
    }

    /// Length in seconds for units added as a plain delta; `None` for months.
    ///
    /// A year is a flat 365 days. Months are the only calendar-aware offset.
    pub fn fixed_seconds(self) -> Option<i64> {
        match self {
            Second => Some(1),
            Minute => Some(60),
            Hour => Some(3_600),
            Day => Some(86_400),
            Week => Some(604_800),
            Year => Some(365 * 86_400),
            Month => None,
        }
    }
}

fn resolve(token: &str, order: &[TimeUnit], role: UnitRole) -> Result<TimeUnit, TimeExprError> {
    order
        .iter()
        .copied()
        .find(|unit| unit.matches(token))
        .ok_or_else(|| TimeExprError::Unit {
            role,
            token: token.to_string(),
        })
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Second => "s",
            Minute => "m",
            Hour => "h",
            Day => "d",
            Week => "w",
            Month => "mon",
            Year => "y",
        };
        f.write_str(token)
    }
}
