pub mod settings;
pub mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};
use settings::Settings;
use status::{format_ledger, format_status};
use tracing::level_filters::LevelFilter;

use crate::{
    app::{compute_summary, run_check},
    engine::ledger::{FileLedgerStore, LedgerStore, StreakLedgerRecord},
    report::{
        notifier::{ConsoleNotifier, SmtpNotifier},
        template::TemplateRenderer,
    },
    source::github::GithubSource,
    utils::{
        clock::DefaultClock,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "commitstreak", version, long_about = None)]
#[command(about = "Checks today's GitHub contributions and keeps track of your streak", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Check today's contributions and send a report by email")]
    Check {
        #[arg(long, help = "Print the email instead of sending it. The ledger is left untouched")]
        dry_run: bool,
    },
    #[command(about = "Print today's contributions and streak")]
    Status {},
    #[command(about = "Inspect or reset the local streak ledger")]
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    #[command(about = "Print the stored streak")]
    Show {},
    #[command(about = "Forget the stored streak")]
    Reset {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let app_dir = args.settings.application_dir()?;
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let settings = args.settings;
    match args.commands {
        Commands::Check { dry_run } => {
            let config = settings.config()?;
            let source = GithubSource::new(config.token.clone())?;
            let store = FileLedgerStore::new(config.ledger_path.clone());
            let renderer = match &config.template {
                Some(path) => TemplateRenderer::from_file(path)?,
                None => TemplateRenderer::default(),
            };

            let outcome = if dry_run {
                run_check(
                    &config,
                    &source,
                    &ConsoleNotifier,
                    store,
                    &DefaultClock,
                    &renderer,
                    false,
                )
                .await?
            } else {
                let notifier = SmtpNotifier::new(settings.mail()?);
                run_check(
                    &config, &source, &notifier, store, &DefaultClock, &renderer, true,
                )
                .await?
            };

            if !outcome.delivered {
                println!("Report for {} was not delivered, see logs", outcome.summary.target_date);
            }
            Ok(())
        }
        Commands::Status {} => {
            let config = settings.config()?;
            let source = GithubSource::new(config.token.clone())?;
            let store = FileLedgerStore::new(config.ledger_path.clone());
            let summary = compute_summary(&config, &source, store, &DefaultClock, false).await?;
            print!("{}", format_status(&summary));
            Ok(())
        }
        Commands::Ledger { command } => {
            let store = FileLedgerStore::new(settings.ledger_path()?);
            match command {
                LedgerCommand::Show {} => {
                    print!("{}", format_ledger(&store.load().await));
                }
                LedgerCommand::Reset {} => {
                    store.update(|_| StreakLedgerRecord::default()).await?;
                    println!("Ledger at {:?} was reset", store.path());
                }
            }
            Ok(())
        }
    }
}
