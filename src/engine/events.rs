use std::{collections::HashMap, fmt::Display};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use tracing::trace;

use crate::utils::time::local_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContributionKind {
    Commit,
    Issue,
    PullRequest,
    Review,
    RepositoryCreated,
}

impl Display for ContributionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContributionKind::Commit => write!(f, "commit"),
            ContributionKind::Issue => write!(f, "issue"),
            ContributionKind::PullRequest => write!(f, "pull request"),
            ContributionKind::Review => write!(f, "review"),
            ContributionKind::RepositoryCreated => write!(f, "repository"),
        }
    }
}

/// One discrete activity record. `repository_name` is absent for contributions that can't be
/// resolved to a repository, for example private ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionEvent {
    pub repository_name: Option<String>,
    pub occurred_at: DateTime<FixedOffset>,
    pub kind: ContributionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCount {
    pub repository_name: String,
    pub count: u32,
}

/// Counts for the target day. `repositories` keeps the order in which repositories were first
/// seen, use [EventTally::ranked] for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTally {
    pub total_count: u32,
    pub repositories: Vec<RepositoryCount>,
    /// Events that counted towards the total without a repository.
    pub unattributed_count: u32,
}

/// Orders repositories for display, most active first. Ties keep their input order.
pub fn rank_repositories(repositories: &[RepositoryCount]) -> Vec<RepositoryCount> {
    let mut ranked = repositories.to_vec();
    // sort_by is stable, which is what preserves first-seen order for ties
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}

/// Buckets events into the target day as seen in `tz`. The source may return a coarser window
/// than a single local day, so every event is checked again here.
pub fn aggregate_events<'a, Tz: TimeZone>(
    events: impl IntoIterator<Item = &'a ContributionEvent>,
    tz: &Tz,
    target_date: NaiveDate,
) -> EventTally {
    let mut tally = EventTally::default();
    let mut positions = HashMap::<&str, usize>::new();

    for event in events {
        if local_date(&event.occurred_at, tz) != target_date {
            trace!("Skipping {} at {} outside of {target_date}", event.kind, event.occurred_at);
            continue;
        }
        tally.total_count += 1;

        let Some(name) = event.repository_name.as_deref() else {
            tally.unattributed_count += 1;
            continue;
        };
        match positions.get(name) {
            Some(&index) => tally.repositories[index].count += 1,
            None => {
                positions.insert(name, tally.repositories.len());
                tally.repositories.push(RepositoryCount {
                    repository_name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    tally
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate};
    use chrono_tz::Asia::Kolkata;

    use super::{
        aggregate_events, rank_repositories, ContributionEvent, ContributionKind, RepositoryCount,
    };

    fn event(repository: Option<&str>, at: &str, kind: ContributionKind) -> ContributionEvent {
        ContributionEvent {
            repository_name: repository.map(String::from),
            occurred_at: DateTime::<FixedOffset>::parse_from_rfc3339(at).unwrap(),
            kind,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_aggregate_only_target_local_day() {
        // 23:50 IST on the 19th is 18:20 UTC, 00:05 IST on the 20th is 18:35 UTC.
        let events = [
            event(Some("api"), "2023-12-19T18:20:00Z", ContributionKind::Commit),
            event(Some("api"), "2023-12-19T23:50:00+05:30", ContributionKind::Commit),
            event(Some("api"), "2023-12-19T18:35:00Z", ContributionKind::Commit),
        ];

        let tally = aggregate_events(&events, &Kolkata, date(2023, 12, 19));

        assert_eq!(tally.total_count, 2);
        assert_eq!(
            tally.repositories,
            vec![RepositoryCount {
                repository_name: "api".into(),
                count: 2
            }]
        );
    }

    #[test]
    fn test_aggregate_early_utc_event_belongs_to_next_local_day() {
        let events = [event(
            Some("web"),
            "2023-12-19T20:00:00Z",
            ContributionKind::PullRequest,
        )];

        assert_eq!(aggregate_events(&events, &Kolkata, date(2023, 12, 19)).total_count, 0);
        assert_eq!(aggregate_events(&events, &Kolkata, date(2023, 12, 20)).total_count, 1);
    }

    #[test]
    fn test_aggregate_ranking_ties_keep_first_seen() {
        let events = [
            event(Some("b"), "2023-12-19T10:00:00+05:30", ContributionKind::Commit),
            event(Some("a"), "2023-12-19T10:01:00+05:30", ContributionKind::Issue),
            event(Some("c"), "2023-12-19T10:02:00+05:30", ContributionKind::Review),
            event(Some("c"), "2023-12-19T10:03:00+05:30", ContributionKind::Commit),
        ];

        let tally = aggregate_events(&events, &Kolkata, date(2023, 12, 19));
        let names = |v: Vec<RepositoryCount>| {
            v.into_iter().map(|r| r.repository_name).collect::<Vec<_>>()
        };

        assert_eq!(names(tally.repositories.clone()), vec!["b", "a", "c"]);
        assert_eq!(names(rank_repositories(&tally.repositories)), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_aggregate_repository_less_events() {
        let events = [
            event(None, "2023-12-19T09:00:00+05:30", ContributionKind::Commit),
            event(None, "2023-12-19T11:00:00+05:30", ContributionKind::RepositoryCreated),
        ];

        let tally = aggregate_events(&events, &Kolkata, date(2023, 12, 19));

        assert_eq!(tally.total_count, 2);
        assert_eq!(tally.unattributed_count, 2);
        assert!(tally.repositories.is_empty());
    }

    #[test]
    fn test_aggregate_total_matches_parts() {
        let kinds = [
            ContributionKind::Commit,
            ContributionKind::Issue,
            ContributionKind::PullRequest,
            ContributionKind::Review,
            ContributionKind::RepositoryCreated,
        ];
        let repositories = [Some("x"), None, Some("y"), Some("x"), None, Some("z")];
        let events = (0..60)
            .map(|i| {
                let at = format!("2023-12-19T{:02}:{:02}:00Z", (i * 7) % 24, i % 60);
                event(repositories[i % repositories.len()], &at, kinds[i % kinds.len()])
            })
            .collect::<Vec<_>>();

        for day in [date(2023, 12, 19), date(2023, 12, 20)] {
            let tally = aggregate_events(&events, &Kolkata, day);
            let attributed: u32 = tally.repositories.iter().map(|r| r.count).sum();
            assert_eq!(tally.total_count, attributed + tally.unattributed_count);
        }
    }

    #[test]
    fn test_aggregate_empty() {
        let tally = aggregate_events(&Vec::new(), &Kolkata, date(2023, 12, 19));
        assert_eq!(tally.total_count, 0);
        assert!(tally.repositories.is_empty());
    }
}
