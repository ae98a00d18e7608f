use std::path::PathBuf;

use chrono_tz::Tz;

use crate::engine::strategy::StreakMode;

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const LEDGER_FILE_NAME: &str = "streak.json";

/// Everything a check needs to know. Built once by the cli and passed down explicitly, nothing
/// below the cli reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub username: String,
    pub token: String,
    pub timezone: Tz,
    pub streak_mode: StreakMode,
    pub ledger_path: PathBuf,
    pub template: Option<PathBuf>,
}

/// Credentials and addresses used by [SmtpNotifier](crate::report::notifier::SmtpNotifier).
#[derive(Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
    pub password: String,
    pub recipient: String,
}

impl std::fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}
