//! Missed-run replay over an outage window.
//!
//! A [`BackfillScheduler`] holds the collaborators for one backend session.
//! [`BackfillScheduler::start`] loads the matching jobs and returns a
//! [`BackfillRun`], a lazy and non-restartable sequence of
//! [`ReplayResult`](rerun_core::ReplayResult)s. Each call to
//! [`BackfillRun::next`] checks the control signal, advances the current
//! job's cron cursor, dispatches one replay and waits for it to finish.
//!
//! Jobs run strictly one after another in registry order, and a job's missed
//! runs are replayed in increasing time order.

mod core;
mod run;


pub use self::core::{BackfillRequest, BackfillScheduler};
pub use self::run::{BackfillRun, RunOutcome, RunStats};
