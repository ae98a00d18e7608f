use std::{fmt::Display, future::Future};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use tracing::{debug, error};

use super::{
    calendar::{calculate_calendar_streak, ActivityDay},
    ledger::LedgerStore,
};

/// Everything a streak strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct StreakInput<'a> {
    pub target_date: NaiveDate,
    /// Authoritative count for the target date.
    pub today_count: u32,
    pub calendar: Option<&'a [ActivityDay]>,
}

/// A way of turning the available data into the current streak length.
pub trait StreakStrategy {
    fn compute_streak(&self, input: &StreakInput<'_>) -> impl Future<Output = Result<u32>>;
}

/// Stateless strategy that recomputes the streak from the activity calendar.
pub struct CalendarStrategy;

impl StreakStrategy for CalendarStrategy {
    async fn compute_streak(&self, input: &StreakInput<'_>) -> Result<u32> {
        let calendar = input
            .calendar
            .ok_or_else(|| anyhow!("Calendar strategy needs an activity calendar"))?;
        Ok(calculate_calendar_streak(calendar, input.target_date).streak_length)
    }
}

/// Advances the persisted ledger by one observation. With `persist` turned off the ledger is
/// only read, which is used for previews.
pub struct LedgerStrategy<L> {
    store: L,
    persist: bool,
}

impl<L: LedgerStore> LedgerStrategy<L> {
    pub fn new(store: L, persist: bool) -> Self {
        Self { store, persist }
    }
}

impl<L: LedgerStore> StreakStrategy for LedgerStrategy<L> {
    async fn compute_streak(&self, input: &StreakInput<'_>) -> Result<u32> {
        let StreakInput {
            target_date,
            today_count,
            ..
        } = *input;

        if !self.persist {
            let record = self.store.load().await.advance(target_date, today_count);
            return Ok(record.current_streak);
        }

        match self
            .store
            .update(|record| record.advance(target_date, today_count))
            .await
        {
            Ok(record) => Ok(record.current_streak),
            Err(e) => {
                // The run can still report a streak, it just won't be remembered
                error!("Failed to persist ledger {e:?}");
                let record = self.store.load().await.advance(target_date, today_count);
                Ok(record.current_streak)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum StreakMode {
    /// Calendar when the source provides one, ledger otherwise.
    #[default]
    Auto,
    Calendar,
    Ledger,
}

impl Display for StreakMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreakMode::Auto => write!(f, "auto"),
            StreakMode::Calendar => write!(f, "calendar"),
            StreakMode::Ledger => write!(f, "ledger"),
        }
    }
}

impl StreakMode {
    pub fn needs_calendar(&self) -> bool {
        !matches!(self, StreakMode::Ledger)
    }
}

/// Strategy picked for a run. Dispatches to the wrapped implementation.
pub enum SelectedStrategy<L> {
    Calendar(CalendarStrategy),
    Ledger(LedgerStrategy<L>),
}

impl<L: LedgerStore> StreakStrategy for SelectedStrategy<L> {
    async fn compute_streak(&self, input: &StreakInput<'_>) -> Result<u32> {
        match self {
            SelectedStrategy::Calendar(v) => v.compute_streak(input).await,
            SelectedStrategy::Ledger(v) => v.compute_streak(input).await,
        }
    }
}

impl<L> SelectedStrategy<L> {
    pub fn name(&self) -> &'static str {
        match self {
            SelectedStrategy::Calendar(_) => "calendar",
            SelectedStrategy::Ledger(_) => "ledger",
        }
    }
}

/// Chooses a strategy based on the requested mode and on whether a calendar is available.
pub fn select_strategy<L: LedgerStore>(
    mode: StreakMode,
    calendar_available: bool,
    store: L,
    persist: bool,
) -> Result<SelectedStrategy<L>> {
    let selected = match (mode, calendar_available) {
        (StreakMode::Calendar, false) => {
            return Err(anyhow!(
                "Calendar strategy was requested but the source returned no calendar"
            ))
        }
        (StreakMode::Calendar, true) | (StreakMode::Auto, true) => {
            SelectedStrategy::Calendar(CalendarStrategy)
        }
        (StreakMode::Auto, false) | (StreakMode::Ledger, _) => {
            SelectedStrategy::Ledger(LedgerStrategy::new(store, persist))
        }
    };
    debug!("Using {} strategy for {mode} mode", selected.name());
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use crate::engine::{
        calendar::ActivityDay,
        ledger::{FileLedgerStore, LedgerStore, StreakLedgerRecord},
    };

    use super::{
        select_strategy, CalendarStrategy, LedgerStrategy, SelectedStrategy, StreakInput,
        StreakMode, StreakStrategy,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_store(dir: &std::path::Path) -> FileLedgerStore {
        let path = dir.join("streak.json");
        std::fs::write(
            &path,
            r#"{"current_streak": 5, "last_active_date": "2023-12-18"}"#,
        )
        .unwrap();
        FileLedgerStore::new(path)
    }

    #[tokio::test]
    async fn test_calendar_strategy() -> Result<()> {
        let days = [
            ActivityDay::new(date(2023, 12, 17), 3),
            ActivityDay::new(date(2023, 12, 18), 2),
            ActivityDay::new(date(2023, 12, 19), 0),
        ];
        let input = StreakInput {
            target_date: date(2023, 12, 19),
            today_count: 0,
            calendar: Some(&days[..]),
        };

        assert_eq!(CalendarStrategy.compute_streak(&input).await?, 2);

        let missing = StreakInput {
            calendar: None,
            ..input
        };
        assert!(CalendarStrategy.compute_streak(&missing).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_ledger_strategy_persists() -> Result<()> {
        let dir = tempdir()?;
        let strategy = LedgerStrategy::new(seeded_store(dir.path()), true);
        let input = StreakInput {
            target_date: date(2023, 12, 19),
            today_count: 4,
            calendar: None,
        };

        assert_eq!(strategy.compute_streak(&input).await?, 6);
        // Same day again doesn't count twice
        assert_eq!(strategy.compute_streak(&input).await?, 6);

        let stored = FileLedgerStore::new(dir.path().join("streak.json")).load().await;
        assert_eq!(
            stored,
            StreakLedgerRecord {
                current_streak: 6,
                last_active_date: Some(date(2023, 12, 19)),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_ledger_strategy_preview_leaves_store_alone() -> Result<()> {
        let dir = tempdir()?;
        let strategy = LedgerStrategy::new(seeded_store(dir.path()), false);
        let input = StreakInput {
            target_date: date(2023, 12, 19),
            today_count: 4,
            calendar: None,
        };

        assert_eq!(strategy.compute_streak(&input).await?, 6);

        let stored = FileLedgerStore::new(dir.path().join("streak.json")).load().await;
        assert_eq!(stored.current_streak, 5);
        Ok(())
    }

    #[test]
    fn test_select_strategy() -> Result<()> {
        let dir = tempdir()?;
        let store = || FileLedgerStore::new(dir.path().join("streak.json"));

        assert!(matches!(
            select_strategy(StreakMode::Auto, true, store(), true)?,
            SelectedStrategy::Calendar(_)
        ));
        assert!(matches!(
            select_strategy(StreakMode::Auto, false, store(), true)?,
            SelectedStrategy::Ledger(_)
        ));
        assert!(matches!(
            select_strategy(StreakMode::Ledger, true, store(), true)?,
            SelectedStrategy::Ledger(_)
        ));
        assert!(select_strategy(StreakMode::Calendar, false, store(), true).is_err());
        Ok(())
    }
}
