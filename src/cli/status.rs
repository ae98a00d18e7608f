use std::fmt::Write;

use crate::{
    engine::{ledger::StreakLedgerRecord, summary::DaySummary},
    utils::time::format_date,
};

/// Plain text rendition of a summary for the terminal.
pub fn format_status(summary: &DaySummary) -> String {
    let mut result = String::new();
    let _ = writeln!(result, "Date:          {}", format_date(summary.target_date));
    let _ = writeln!(result, "Contributions: {}", summary.total_count);
    let _ = writeln!(result, "Streak:        {}", summary.streak_length);

    if summary.needs_private_notice() {
        let _ = writeln!(result, "All of today's contributions are in private repositories");
    } else if !summary.per_repository_counts.is_empty() {
        let _ = writeln!(result, "Repositories:");
        for repository in summary.ranked_repositories() {
            let _ = writeln!(
                result,
                "  {:<32} {}",
                repository.repository_name, repository.count
            );
        }
    }
    result
}

pub fn format_ledger(record: &StreakLedgerRecord) -> String {
    let last_active = record
        .last_active_date
        .map_or_else(|| "never".to_string(), format_date);
    format!(
        "Current streak:   {}\nLast active date: {last_active}\n",
        record.current_streak
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::engine::{events::RepositoryCount, ledger::StreakLedgerRecord, summary::DaySummary};

    use super::{format_ledger, format_status};

    fn summary(total_count: u32, repositories: &[(&str, u32)]) -> DaySummary {
        DaySummary {
            target_date: NaiveDate::from_ymd_opt(2023, 12, 19).unwrap(),
            total_count,
            per_repository_counts: repositories
                .iter()
                .map(|&(name, count)| RepositoryCount {
                    repository_name: name.into(),
                    count,
                })
                .collect(),
            streak_length: 5,
            event_count: total_count,
            unattributed_count: 0,
        }
    }

    #[test]
    fn test_status_lists_repositories_by_count() {
        let text = format_status(&summary(3, &[("tools", 1), ("api", 2)]));

        assert!(text.starts_with("Date:          2023-12-19\n"));
        assert!(text.contains("Streak:        5"));
        assert!(text.find("api").unwrap() < text.find("tools").unwrap());
    }

    #[test]
    fn test_status_private_notice() {
        let text = format_status(&summary(2, &[]));
        assert!(text.contains("private repositories"));

        let text = format_status(&summary(0, &[]));
        assert!(!text.contains("private repositories"));
        assert!(!text.contains("Repositories:"));
    }

    #[test]
    fn test_format_ledger() {
        assert_eq!(
            format_ledger(&StreakLedgerRecord::default()),
            "Current streak:   0\nLast active date: never\n"
        );
        assert_eq!(
            format_ledger(&StreakLedgerRecord {
                current_streak: 4,
                last_active_date: NaiveDate::from_ymd_opt(2023, 12, 19),
            }),
            "Current streak:   4\nLast active date: 2023-12-19\n"
        );
    }
}
