//! Daily scheduling of collection runs.
//!
//! A [`Trigger`] decides when the next run happens (or that there are no
//! more runs); [`run_scheduled`] awaits the trigger and invokes the job
//! callback, one run at a time.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone};
use tracing::{error, info};

use ordertrack_shared::{OrderTrackError, Result};

/// Longest single sleep while waiting; the wall clock is rechecked after each.
const MAX_SLEEP: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// DailySchedule
// ---------------------------------------------------------------------------

/// A fixed local wall-clock time, once per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    /// Parse `HH:MM`.
    pub fn parse(hhmm: &str) -> Result<Self> {
        let at = NaiveTime::parse_from_str(hhmm.trim(), "%H:%M").map_err(|e| {
            OrderTrackError::validation(format!("invalid run time '{hhmm}' (expected HH:MM): {e}"))
        })?;
        Ok(Self { at })
    }

    /// Time of day of each run.
    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// The first scheduled instant strictly after `now`.
    pub fn next_run_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let mut date = now.date_naive();

        for _ in 0..3 {
            if let Some(candidate) = local_instant(&tz, date.and_time(self.at)) {
                if candidate > *now {
                    return candidate;
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        now.clone() + chrono::Duration::days(1)
    }
}

/// Map a local wall-clock time to an instant. Ambiguous times take the
/// earlier instant; times skipped by a DST jump move forward one hour.
fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest().or_else(|| {
        tz.from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
    })
}

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// Source of run times for [`run_scheduled`].
#[allow(async_fn_in_trait)]
pub trait Trigger {
    /// Wait until the next run is due. Returns `false` when scheduling
    /// should end instead.
    async fn wait(&mut self) -> bool;
}

/// Fires once a day at the schedule's local time; stops on Ctrl-C.
pub struct DailyTrigger {
    schedule: DailySchedule,
}

impl DailyTrigger {
    pub fn new(schedule: DailySchedule) -> Self {
        Self { schedule }
    }
}

impl Trigger for DailyTrigger {
    async fn wait(&mut self) -> bool {
        let next = self.schedule.next_run_after(&Local::now());
        info!(next_run = %next, "waiting for next scheduled run");

        loop {
            let remaining = (next - Local::now()).to_std().unwrap_or_default();
            if remaining.is_zero() {
                return true;
            }

            tokio::select! {
                _ = tokio::time::sleep(remaining.min(MAX_SLEEP)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, stopping scheduler");
                    return false;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

/// Invoke `job` each time `trigger` fires, until the trigger ends.
///
/// Runs never overlap: the next wait begins only after the job returns.
/// A failed run is logged and does not end the loop. Returns the number of
/// runs performed.
pub async fn run_scheduled<T, F, Fut>(trigger: &mut T, mut job: F) -> usize
where
    T: Trigger,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut runs = 0;
    while trigger.wait().await {
        runs += 1;
        info!(run = runs, "scheduled run starting");
        if let Err(e) = job().await {
            error!(run = runs, error = %e, "scheduled run failed");
        }
    }
    info!(runs, "scheduler stopped");
    runs
}

/// Run `job` every day at `schedule` local time until interrupted.
pub async fn run_daily<F, Fut>(schedule: DailySchedule, job: F) -> usize
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    info!(at = %schedule.at().format("%H:%M"), "daily scheduler started");
    run_scheduled(&mut DailyTrigger::new(schedule), job).await
}
