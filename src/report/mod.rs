//! Turns a [DaySummary] into a notification. The summary decides between a celebration and a
//! reminder, [template] renders it and [notifier] delivers it.

pub mod notifier;
pub mod template;

use chrono::{DateTime, TimeZone};
use rand::{seq::SliceRandom, Rng};

use crate::engine::summary::DaySummary;

use self::template::escape_html;

const MOTIVATIONAL_QUOTES: &[&str] = &[
    "Code is like humor. When you have to explain it, it’s bad. – Cory House",
    "First, solve the problem. Then, write the code. – John Johnson",
    "Experience is the name everyone gives to their mistakes. – Oscar Wilde",
    "In order to be irreplaceable, one must always be different. – Coco Chanel",
    "Java is to JavaScript what car is to Carpet. – Chris Heilmann",
    "Knowledge is power. – Francis Bacon",
    "Sometimes it pays to stay in bed on Monday, rather than spending the rest of the week debugging Monday’s code. – Dan Salomon",
    "Perfection is achieved not when there is nothing more to add, but rather when there is nothing more to take away. – Antoine de Saint-Exupery",
    "Ruby is rubbish! PHP is phpantastic! – Nikita Popov",
    "Code never lies, comments sometimes do. – Ron Jeffries",
];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

pub fn pick_quote(rng: &mut impl Rng) -> &'static str {
    MOTIVATIONAL_QUOTES.choose(rng).copied().unwrap_or_default()
}

/// Named values a template can refer to, plus the subject line of the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub subject: String,
    pub title: String,
    pub message: String,
    pub stats_section: String,
    pub quote: String,
    pub timestamp: String,
}

impl ReportContext {
    /// Placeholder names with their values, in the order they are substituted.
    pub fn placeholders(&self) -> [(&'static str, &str); 5] {
        [
            ("title", self.title.as_str()),
            ("message", self.message.as_str()),
            ("stats_section", self.stats_section.as_str()),
            ("quote", self.quote.as_str()),
            ("timestamp", self.timestamp.as_str()),
        ]
    }
}

/// Builds either a celebration or a reminder, depending on whether anything was contributed
/// today. `now` is expected to be in the target timezone.
pub fn build_report<Tz: TimeZone>(
    summary: &DaySummary,
    now: &DateTime<Tz>,
    quote: &str,
) -> ReportContext
where
    Tz::Offset: std::fmt::Display,
{
    let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
    let streak = summary.streak_length;
    let total = summary.total_count;

    if summary.is_active() {
        let repositories = if summary.needs_private_notice() {
            r#"<div class="repo-item notice">Today's contributions went to private or restricted repositories.</div>"#
                .to_string()
        } else {
            summary
                .ranked_repositories()
                .into_iter()
                .map(|r| {
                    format!(
                        r#"<div class="repo-item"><span class="repo-icon">📂</span> {} <span class="repo-count">{}</span></div>"#,
                        escape_html(&r.repository_name),
                        r.count
                    )
                })
                .collect::<String>()
        };

        ReportContext {
            subject: format!("✅ GitHub Daily Update: {total} {}!", plural(total)),
            title: "🎉 Great Job! Contributions Detected".into(),
            message: format!(
                "You've made <strong>{total}</strong> {} today. Keep up the momentum!",
                plural(total).to_lowercase()
            ),
            stats_section: format!(
                r#"<div class="streak-hero">
    <div class="streak-count-big">{streak}</div>
    <div class="streak-subtext">🔥 On Fire!</div>
</div>
<div class="repo-section-title">Repositories Contributed To</div>
<div class="repo-list">{repositories}</div>"#
            ),
            quote: quote.to_string(),
            timestamp,
        }
    } else {
        ReportContext {
            subject: "⚠️ GitHub Daily Reminder: No Contributions Yet!".into(),
            title: "⚠️ Reminder: Keep the Streak Alive!".into(),
            message: "Warning: You haven't contributed yet today! Push some code to maintain your streak.".into(),
            stats_section: format!(
                r#"<div class="streak-hero">
    <div class="streak-count-big">{streak}</div>
    <div class="streak-subtext warning">⚠️ Don't let it break!</div>
</div>
<div class="stat-row">
    <span class="stat-label">Contributions Today</span>
    <span class="stat-value warning">0</span>
</div>"#
            ),
            quote: quote.to_string(),
            timestamp,
        }
    }
}

fn plural(count: u32) -> &'static str {
    if count == 1 {
        "Contribution"
    } else {
        "Contributions"
    }
}
