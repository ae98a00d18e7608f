//! Contains logic for retrieving contribution data.
//! [github::GithubSource] is the main artifact of this module.

pub mod github;

use async_trait::async_trait;

use crate::{
    engine::{calendar::ActivityDay, events::ContributionEvent},
    errors::FetchError,
    utils::time::DayWindow,
};

/// Intended to serve as a contract any provider of contribution data must implement.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContributionSource: Send + Sync {
    /// Day indexed activity calendar for the source's default window, usually the last year.
    async fn fetch_calendar(&self, user: &str) -> Result<Vec<ActivityDay>, FetchError>;

    /// Typed contribution events inside `window`. The window is a hint, implementations may
    /// return events slightly outside of it.
    async fn fetch_events(
        &self,
        user: &str,
        window: &DayWindow,
    ) -> Result<Vec<ContributionEvent>, FetchError>;
}
