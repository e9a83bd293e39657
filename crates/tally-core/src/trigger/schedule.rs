use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Fixed daily wall-clock time in a fixed UTC offset at which the unattended pass fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    run_at: NaiveTime,
    offset: FixedOffset,
}

impl DailySchedule {
    pub fn new(run_at: NaiveTime, offset: FixedOffset) -> Self {
        Self { run_at, offset }
    }

    pub fn run_at(&self) -> NaiveTime {
        self.run_at
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar date at `now` in the schedule's zone; this is the `today` a pass uses.
    pub fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        tally_domain::normalize(&now.with_timezone(&self.offset))
    }

    /// First firing instant strictly after `now`.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_now = now.with_timezone(&self.offset).naive_local();
        let mut candidate = local_now.date().and_time(self.run_at);
        if candidate <= local_now {
            candidate += Duration::days(1);
        }
        let utc = candidate - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }
}
