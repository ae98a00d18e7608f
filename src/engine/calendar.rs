use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate contribution count of a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub count: u32,
}

impl ActivityDay {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self { date, count }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarStreak {
    pub today_count: u32,
    pub streak_length: u32,
}

/// Computes today's count and the current streak from an activity calendar.
///
/// Days after `target_date` are ignored, they show up when the source's own notion of "today" is
/// ahead of the target timezone. A target day with no contributions yet doesn't break the streak,
/// any earlier empty (or missing) day does. The walk stops at the beginning of the calendar, so
/// the streak is bounded by the fetched window.
pub fn calculate_calendar_streak(days: &[ActivityDay], target_date: NaiveDate) -> CalendarStreak {
    let mut by_date = BTreeMap::<NaiveDate, u32>::new();
    for day in days.iter().filter(|d| d.date <= target_date) {
        *by_date.entry(day.date).or_default() += day.count;
    }

    let today_count = by_date.get(&target_date).copied().unwrap_or(0);

    let mut streak_length = 0;
    let mut expected = target_date;
    for (&date, &count) in by_date.iter().rev() {
        if date == target_date && count == 0 {
            expected = previous_day(target_date);
            continue;
        }
        if expected == target_date && date < target_date {
            // Calendar doesn't reach today yet, treat it like an empty today
            expected = previous_day(target_date);
        }
        if date != expected || count == 0 {
            break;
        }
        streak_length += 1;
        expected = previous_day(date);
    }

    CalendarStreak {
        today_count,
        streak_length,
    }
}

fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(NaiveDate::MIN)
}
