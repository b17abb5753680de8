//! Parsing relative-time strings into an [`Expression`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rerun_core::EpochSeconds;
use tracing::debug;

use crate::error::TimeExprError;

static GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<offset1>[+-]?\d+)(?P<unit1>[a-zA-Z]+)(?:(?P<offset2>[+-]?\d+)(?P<unit2>[a-zA-Z]+))?)?(?:@(?P<snap>[a-zA-Z]+)(?:(?P<snap_offset>[+-]?\d+)(?P<snap_unit>[a-zA-Z]+))?)?",
    )
    .expect("relative time grammar is a valid regex")
});

/// A signed amount of some unit. The unit stays a raw token until evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offset {
    pub amount: i64,
    pub unit: String,
}

/// Truncation to a unit boundary, optionally followed by its own offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snap {
    pub unit: String,
    pub offset: Option<Offset>,
}

/// The structured form of `[<offset1>][<offset2>][@<snap>[<snap offset>]]`.
///
/// Only the parser builds plans, so `second` is never set without `first`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OffsetPlan {
    snap: Option<Snap>,
    first: Option<Offset>,
    second: Option<Offset>,
}

impl OffsetPlan {
    pub fn snap(&self) -> Option<&Snap> {
        self.snap.as_ref()
    }

    pub fn snap_offset(&self) -> Option<&Offset> {
        self.snap.as_ref().and_then(|s| s.offset.as_ref())
    }

    pub fn first(&self) -> Option<&Offset> {
        self.first.as_ref()
    }

    pub fn second(&self) -> Option<&Offset> {
        self.second.as_ref()
    }
}

/// A parsed relative-time expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// All digits: an absolute epoch timestamp.
    Literal(EpochSeconds),
    /// `now`: the reference instant itself.
    Now,
    Relative(OffsetPlan),
}

/// Parse a relative-time expression.
///
/// Surrounding whitespace is ignored. The grammar is matched as a prefix:
/// whatever follows the longest matching prefix is dropped (`-7d@w0` reads
/// as `-7d@w`). Only a string where nothing matches is rejected.
pub fn parse(expr: &str) -> Result<Expression, TimeExprError> {
    let trimmed = expr.trim();
    let grammar_error = || TimeExprError::Grammar {
        expr: expr.to_string(),
    };

    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed
            .parse()
            .map(Expression::Literal)
            .map_err(|_| grammar_error());
    }
    if trimmed == "now" {
        return Ok(Expression::Now);
    }
    if trimmed.is_empty() {
        return Err(grammar_error());
    }

    let caps = GRAMMAR.captures(trimmed).ok_or_else(grammar_error)?;
    let matched = caps.get(0).map_or(0, |m| m.end());
    if matched == 0 {
        return Err(grammar_error());
    }
    if matched < trimmed.len() {
        debug!(expr = %trimmed, ignored = &trimmed[matched..], "ignoring unparsed suffix");
    }
    let offset = |amount: &str, unit: &str| -> Result<Option<Offset>, TimeExprError> {
        capture_offset(&caps, amount, unit).map_err(|_| grammar_error())
    };

    let first = offset("offset1", "unit1")?;
    let second = offset("offset2", "unit2")?;
    let snap = match caps.name("snap") {
        Some(unit) => Some(Snap {
            unit: unit.as_str().to_string(),
            offset: offset("snap_offset", "snap_unit")?,
        }),
        None => None,
    };

    Ok(Expression::Relative(OffsetPlan { snap, first, second }))
}

fn capture_offset(
    caps: &Captures<'_>,
    amount: &str,
    unit: &str,
) -> Result<Option<Offset>, std::num::ParseIntError> {
    match (caps.name(amount), caps.name(unit)) {
        (Some(a), Some(u)) => Ok(Some(Offset {
            amount: a.as_str().parse()?,
            unit: u.as_str().to_string(),
        })),
        _ => Ok(None),
    }
}

impl FromStr for Expression {
    type Err = TimeExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}{}", self.amount, self.unit)
    }
}

impl fmt::Display for OffsetPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for offset in [&self.first, &self.second].into_iter().flatten() {
            write!(f, "{}", offset)?;
        }
        if let Some(snap) = &self.snap {
            write!(f, "@{}", snap.unit)?;
            if let Some(offset) = &snap.offset {
                write!(f, "{}", offset)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(v) => write!(f, "{}", v),
            Expression::Now => write!(f, "now"),
            Expression::Relative(plan) => write!(f, "{}", plan),
        }
    }
}
