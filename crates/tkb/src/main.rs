use std::{future::Future, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use tkb_core::{
    bot::BotContext,
    config::Config,
    messaging::throttled::{ThrottleConfig, ThrottledMessenger},
};
use tkb_redmine::RedmineClient;
use tkb_slack::SlackMessenger;

/// Relay Slack chat commands to a Redmine issue tracker.
#[derive(Debug, Parser)]
#[command(name = "tkb", version)]
struct Args {
    /// Verbose logging for the bot crates.
    #[arg(short, long)]
    debug: bool,

    /// JSON file of tracker users (`{"name": id}`), merged over REDMINE_USERS.
    users_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tkb_core::logging::init("tkb", args.debug)?;

    let cfg = Arc::new(Config::load(args.users_file.as_deref()).context("loading configuration")?);

    let tracker = Arc::new(RedmineClient::from_config(&cfg).context("creating redmine client")?);
    let slack = SlackMessenger::connect(&cfg)
        .await
        .context("connecting to slack")?;
    let messenger = Arc::new(ThrottledMessenger::new(
        Arc::new(slack),
        ThrottleConfig::default(),
    ));

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(shutdown.clone(), tokio::signal::ctrl_c()));

    tracing::info!(
        redmine = %cfg.redmine_url,
        users = cfg.redmine_users.len(),
        "ticket bot running"
    );
    let mut bot = BotContext::new(&cfg, messenger, tracker);
    bot.run(shutdown).await.context("poll loop stopped")?;

    tracing::info!("stopped");
    Ok(())
}

/// Cancel `shutdown` once `interrupt` fires. A failed signal listener leaves the bot running.
async fn cancel_on_interrupt<F>(shutdown: CancellationToken, interrupt: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => {
            tracing::info!("interrupt received, shutting down");
            shutdown.cancel();
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for ctrl-c; stop the process with a signal");
        }
    }
}
