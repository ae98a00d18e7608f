use std::path::PathBuf;

use anyhow::Result;
use chrono_tz::Tz;
use clap::{CommandFactory, Parser};

use crate::{
    config::{
        Config, MailSettings, DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT, DEFAULT_TIMEZONE,
        LEDGER_FILE_NAME,
    },
    engine::strategy::StreakMode,
    utils::dir::{create_application_default_path, ensure_dir},
};

use super::Args;

fn parse_timezone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|e| format!("Unknown timezone {value}: {e}"))
}

/// Options shared by every command. Anything sensitive can come from the environment instead.
#[derive(Debug, Parser)]
pub struct Settings {
    #[arg(long = "user", env = "GH_USERNAME", global = true, help = "GitHub login to check")]
    username: Option<String>,
    #[arg(
        long,
        env = "GH_TOKEN",
        global = true,
        hide_env_values = true,
        help = "Token used for the GraphQL API"
    )]
    token: Option<String>,
    #[arg(
        long,
        env = "STREAK_TIMEZONE",
        global = true,
        default_value = DEFAULT_TIMEZONE,
        value_parser = parse_timezone,
        help = "IANA timezone that decides where a day starts and ends"
    )]
    timezone: Tz,
    #[arg(long, global = true, default_value_t = StreakMode::Auto, help = "How the streak is computed")]
    strategy: StreakMode,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Ledger file. Defaults to streak.json in the application directory")]
    ledger: Option<PathBuf>,
    #[arg(long, global = true, help = "HTML template used for the email")]
    template: Option<PathBuf>,

    #[arg(long, env = "SMTP_HOST", global = true, default_value = DEFAULT_SMTP_HOST)]
    smtp_host: String,
    #[arg(long, env = "SMTP_PORT", global = true, default_value_t = DEFAULT_SMTP_PORT)]
    smtp_port: u16,
    #[arg(long, env = "EMAIL_SENDER", global = true, help = "Address the email is sent from")]
    sender: Option<String>,
    #[arg(
        long,
        env = "EMAIL_PASSWORD",
        global = true,
        hide_env_values = true,
        help = "Password or app password of the sender"
    )]
    password: Option<String>,
    #[arg(long, env = "EMAIL_RECIPIENT", global = true, help = "Address the email is sent to")]
    recipient: Option<String>,
}

fn missing(name: &str) -> anyhow::Error {
    Args::command()
        .error(
            clap::error::ErrorKind::MissingRequiredArgument,
            format!("{name} is required for this command"),
        )
        .into()
}

impl Settings {
    pub fn application_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => ensure_dir(dir.clone()),
            None => create_application_default_path(),
        }
    }

    pub fn ledger_path(&self) -> Result<PathBuf> {
        match &self.ledger {
            Some(ledger) => Ok(ledger.clone()),
            None => Ok(self.application_dir()?.join(LEDGER_FILE_NAME)),
        }
    }

    pub fn config(&self) -> Result<Config> {
        Ok(Config {
            username: self.username.clone().ok_or_else(|| missing("--user"))?,
            token: self.token.clone().ok_or_else(|| missing("--token"))?,
            timezone: self.timezone,
            streak_mode: self.strategy,
            ledger_path: self.ledger_path()?,
            template: self.template.clone(),
        })
    }

    pub fn mail(&self) -> Result<MailSettings> {
        Ok(MailSettings {
            smtp_host: self.smtp_host.clone(),
            smtp_port: self.smtp_port,
            sender: self.sender.clone().ok_or_else(|| missing("--sender"))?,
            password: self.password.clone().ok_or_else(|| missing("--password"))?,
            recipient: self.recipient.clone().ok_or_else(|| missing("--recipient"))?,
        })
    }
}
