//! Relative-time expressions for replaying scheduled jobs.
//!
//! An expression is either an absolute epoch literal (`1546300800`), the
//! token `now`, or a compact relative form evaluated against a reference
//! instant:
//!
//! ```text
//! [<offset1>][<offset2>][@<snap>[<snap offset>]]      e.g.  -15m+5s@d+1h
//! ```
//!
//! Evaluation always applies the snap first, then the snap's own offset,
//! then `offset1`, then `offset2`. That order is part of the contract: with
//! month or year components, reordering changes results near boundaries.
//!
//! Snapping happens in a caller-chosen [`chrono::TimeZone`] (normally
//! [`chrono::Local`]); fixed-length offsets are plain epoch-second deltas.

mod calendar;
pub mod error;
pub mod evaluator;
pub mod offset;
pub mod parser;
pub mod snap;
pub mod unit;

pub use error::{TimeExprError, UnitRole};
pub use evaluator::RelativeTimeEvaluator;
pub use offset::apply_offset;
pub use parser::{parse, Expression, Offset, OffsetPlan, Snap};
pub use snap::apply_snap;
pub use unit::TimeUnit;
