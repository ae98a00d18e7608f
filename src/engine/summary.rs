use chrono::NaiveDate;
use tracing::debug;

use super::{
    calendar::CalendarStreak,
    events::{rank_repositories, EventTally, RepositoryCount},
};

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub target_date: NaiveDate,
    /// Count used for display and for deciding between celebration and reminder.
    pub total_count: u32,
    /// Repositories in first-seen order.
    pub per_repository_counts: Vec<RepositoryCount>,
    pub streak_length: u32,
    /// Total computed from typed events alone.
    pub event_count: u32,
    pub unattributed_count: u32,
}

impl DaySummary {
    /// Merges both views of the day. Events provide the per repository breakdown. The calendar,
    /// when present, is trusted for the total since it includes contributions that the typed
    /// event feed can't enumerate.
    pub fn assemble(
        target_date: NaiveDate,
        tally: EventTally,
        calendar: Option<CalendarStreak>,
        streak_length: u32,
    ) -> Self {
        let total_count = match calendar {
            Some(calendar) => {
                if calendar.today_count != tally.total_count {
                    debug!(
                        "Calendar reports {} contributions, events add up to {}",
                        calendar.today_count, tally.total_count
                    );
                }
                calendar.today_count
            }
            None => tally.total_count,
        };

        Self {
            target_date,
            total_count,
            per_repository_counts: tally.repositories,
            streak_length,
            event_count: tally.total_count,
            unattributed_count: tally.unattributed_count,
        }
    }

    pub fn is_active(&self) -> bool {
        self.total_count > 0
    }

    pub fn ranked_repositories(&self) -> Vec<RepositoryCount> {
        rank_repositories(&self.per_repository_counts)
    }

    /// True when there was activity but none of it can be attributed to a named repository.
    /// Renderers must not show such a day as empty.
    pub fn needs_private_notice(&self) -> bool {
        self.is_active() && self.per_repository_counts.is_empty()
    }
}
