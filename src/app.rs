//! Represents a single check from fetching contributions to delivering the report.

use anyhow::Result;
use chrono::NaiveDate;
use rand::thread_rng;
use tracing::{error, info, instrument};

use crate::{
    config::Config,
    engine::{
        calendar::calculate_calendar_streak,
        events::aggregate_events,
        ledger::LedgerStore,
        strategy::{select_strategy, StreakInput, StreakStrategy},
        summary::DaySummary,
    },
    report::{build_report, notifier::Notifier, pick_quote, template::Renderer},
    source::ContributionSource,
    utils::{
        clock::Clock,
        time::{day_window, local_date},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub summary: DaySummary,
    pub delivered: bool,
}

/// Gathers everything known about the current local day. With `persist` turned off the ledger
/// is left as it was.
#[instrument(skip_all, fields(user = %config.username))]
pub async fn compute_summary(
    config: &Config,
    source: &impl ContributionSource,
    store: impl LedgerStore,
    clock: &impl Clock,
    persist: bool,
) -> Result<DaySummary> {
    let tz = &config.timezone;
    let target_date: NaiveDate = local_date(&clock.time(), tz);
    let window = day_window(target_date, tz);
    info!("Checking contributions for {target_date} in {tz}");

    let events = source.fetch_events(&config.username, &window).await?;
    let tally = aggregate_events(&events, tz, target_date);

    let calendar = if config.streak_mode.needs_calendar() {
        source.fetch_calendar(&config.username).await?
    } else {
        Vec::new()
    };
    let calendar_streak =
        (!calendar.is_empty()).then(|| calculate_calendar_streak(&calendar, target_date));

    let strategy = select_strategy(config.streak_mode, !calendar.is_empty(), store, persist)?;
    let input = StreakInput {
        target_date,
        today_count: calendar_streak.map_or(tally.total_count, |c| c.today_count),
        calendar: calendar_streak.map(|_| calendar.as_slice()),
    };
    let streak_length = strategy.compute_streak(&input).await?;

    let summary = DaySummary::assemble(target_date, tally, calendar_streak, streak_length);
    info!(
        "{} contributions on {target_date}, streak of {streak_length} using {} strategy",
        summary.total_count,
        strategy.name()
    );
    Ok(summary)
}

/// Runs a full check. Failing to reach the contribution source aborts the run before anything is
/// sent. Failing to deliver the report does not, it only shows up in the outcome.
pub async fn run_check(
    config: &Config,
    source: &impl ContributionSource,
    notifier: &impl Notifier,
    store: impl LedgerStore,
    clock: &impl Clock,
    renderer: &impl Renderer,
    persist: bool,
) -> Result<RunOutcome> {
    let summary = compute_summary(config, source, store, clock, persist).await?;

    let now = clock.time().with_timezone(&config.timezone);
    let report = build_report(&summary, &now, pick_quote(&mut thread_rng()));
    let body = renderer.render(&report);

    let delivered = match notifier.deliver(&report.subject, &body).await {
        Ok(()) => {
            info!("Delivered \"{}\"", report.subject);
            true
        }
        Err(e) => {
            error!("Failed to deliver report {e:?}");
            false
        }
    };

    Ok(RunOutcome { summary, delivered })
}
