use chrono::{Local, TimeZone};
use rerun_core::EpochSeconds;
use tracing::debug;

use crate::error::TimeExprError;
use crate::offset::apply_offset;
use crate::parser::{parse, Expression, Offset, OffsetPlan};
use crate::snap::apply_snap;

/// Turns relative-time expressions into absolute instants.
///
/// Snap boundaries are computed in `Tz`; production code uses
/// [`RelativeTimeEvaluator::local`].
#[derive(Debug, Clone)]
pub struct RelativeTimeEvaluator<Tz: TimeZone = Local> {
    tz: Tz,
}

impl RelativeTimeEvaluator<Local> {
    /// Evaluate in the process's local timezone.
    pub fn local() -> Self {
        Self::new(Local)
    }
}

impl<Tz: TimeZone> RelativeTimeEvaluator<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// Parse `expr` and evaluate it against `reference`.
    pub fn evaluate(
        &self,
        expr: &str,
        reference: EpochSeconds,
    ) -> Result<EpochSeconds, TimeExprError> {
        self.evaluate_parsed(&parse(expr)?, reference)
    }

    /// Evaluate a pre-parsed expression.
    ///
    /// Literals ignore `reference`; `now` returns it unchanged.
    pub fn evaluate_parsed(
        &self,
        expr: &Expression,
        reference: EpochSeconds,
    ) -> Result<EpochSeconds, TimeExprError> {
        match expr {
            Expression::Literal(instant) => Ok(*instant),
            Expression::Now => Ok(reference),
            Expression::Relative(plan) => {
                let result = self.apply_plan(plan, reference)?;
                debug!(reference, expr = %plan, result, "evaluated relative time");
                Ok(result)
            }
        }
    }

    // Order: snap, snap offset, offset1, offset2. Month and year components
    // make this order observable, so it must not change.
    fn apply_plan(
        &self,
        plan: &OffsetPlan,
        reference: EpochSeconds,
    ) -> Result<EpochSeconds, TimeExprError> {
        let snapped = apply_snap(&self.tz, plan.snap().map(|s| s.unit.as_str()), reference)?;
        [plan.snap_offset(), plan.first(), plan.second()]
            .into_iter()
            .try_fold(snapped, |instant, offset| self.offset(offset, instant))
    }

    fn offset(
        &self,
        offset: Option<&Offset>,
        instant: EpochSeconds,
    ) -> Result<EpochSeconds, TimeExprError> {
        apply_offset(
            &self.tz,
            offset.map(|o| o.amount),
            offset.map(|o| o.unit.as_str()),
            instant,
        )
    }
}

impl Default for RelativeTimeEvaluator<Local> {
    fn default() -> Self {
        Self::local()
    }
}
