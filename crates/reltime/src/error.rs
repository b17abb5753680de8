use std::fmt;

use rerun_core::EpochSeconds;
use thiserror::Error;

/// Which part of an expression a unit token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitRole {
    Snap,
    Offset,
}

impl fmt::Display for UnitRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitRole::Snap => write!(f, "snap"),
            UnitRole::Offset => write!(f, "offset"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeExprError {
    /// The string is neither a literal, `now`, nor a full match of the grammar.
    #[error("cannot parse relative time expression {expr:?}")]
    Grammar { expr: String },

    /// A unit token matched none of the recognized spellings.
    #[error("no {role} unit matches {token:?}")]
    Unit { role: UnitRole, token: String },

    /// Month offsets need calendar arithmetic, which this build leaves out.
    #[error("month offsets are not supported in this build (enable the `calendar` feature)")]
    CalendarUnsupported,

    /// The arithmetic left chrono's representable range.
    #[error("instant {instant} is out of range for this operation")]
    OutOfRange { instant: EpochSeconds },
}
