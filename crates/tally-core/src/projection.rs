//! Projection engine: walks a rule's cursor forward to `today`.

use chrono::NaiveDate;

use tally_domain::{is_due, Frequency, RecurrenceRule};

/// Occurrences owed by a rule and where its cursor lands once they are materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Due dates, oldest first.
    pub due_dates: Vec<NaiveDate>,
    /// Cursor after the walk. Equal to the starting cursor when nothing is due.
    pub new_cursor: NaiveDate,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.due_dates.is_empty()
    }
}

/// Computes every due date of `rule` from its cursor up to and including `today`.
///
/// Callers filter out paused rules. Pure and deterministic in `(rule, today)`.
pub fn project(rule: &RecurrenceRule, today: NaiveDate) -> Projection {
    project_from(rule.next_due_date, rule.frequency, today)
}

/// Cursor-level form of [`project`].
pub fn project_from(cursor: NaiveDate, frequency: Frequency, today: NaiveDate) -> Projection {
    let mut due_dates = Vec::new();
    let mut cursor = cursor;
    while is_due(cursor, today) {
        due_dates.push(cursor);
        match frequency.checked_advance(cursor) {
            Some(next) => cursor = next,
            // end of chrono's calendar
            None => {
                cursor = NaiveDate::MAX;
                break;
            }
        }
    }
    Projection {
        due_dates,
        new_cursor: cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn nothing_due_keeps_cursor() {
        let projection = project_from(date(2024, 6, 10), Frequency::Weekly, date(2024, 6, 9));
        assert!(projection.is_empty());
        assert_eq!(projection.new_cursor, date(2024, 6, 10));
    }

    #[test]
    fn cursor_equal_to_today_is_due() {
        let projection = project_from(date(2024, 6, 9), Frequency::Monthly, date(2024, 6, 9));
        assert_eq!(projection.due_dates, vec![date(2024, 6, 9)]);
        assert_eq!(projection.new_cursor, date(2024, 7, 9));
    }

    #[test]
    fn daily_catch_up_lists_each_day() {
        let projection = project_from(date(2024, 6, 1), Frequency::Daily, date(2024, 6, 4));
        assert_eq!(
            projection.due_dates,
            vec![
                date(2024, 6, 1),
                date(2024, 6, 2),
                date(2024, 6, 3),
                date(2024, 6, 4)
            ]
        );
        assert_eq!(projection.new_cursor, date(2024, 6, 5));
    }

    #[test]
    fn weekly_steps_by_seven_days() {
        let projection = project_from(date(2024, 5, 1), Frequency::Weekly, date(2024, 5, 22));
        assert_eq!(
            projection.due_dates,
            vec![
                date(2024, 5, 1),
                date(2024, 5, 8),
                date(2024, 5, 15),
                date(2024, 5, 22)
            ]
        );
        assert_eq!(projection.new_cursor, date(2024, 5, 29));
    }

    #[test]
    fn monthly_clamping_drifts_from_previous_date() {
        let projection = project_from(date(2024, 1, 31), Frequency::Monthly, date(2024, 4, 1));
        assert_eq!(
            projection.due_dates,
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 29)]
        );
        assert_eq!(projection.new_cursor, date(2024, 4, 29));
    }

    #[test]
    fn yearly_leap_day_clamps_to_feb_28() {
        let projection = project_from(date(2024, 2, 29), Frequency::Yearly, date(2025, 3, 1));
        assert_eq!(projection.due_dates, vec![date(2024, 2, 29)]);
        assert_eq!(projection.new_cursor, date(2025, 2, 28));
    }
}
