//! The poll loop: poll transport -> filter events -> match -> handle -> reply.
//!
//! Sequential by construction: one event is fully handled (including every tracker
//! round trip) before the next is looked at.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    commands::match_command,
    config::Config,
    directory::{ProfileCache, UserDirectory},
    domain::{ChannelId, ChatUserId},
    handler::CommandHandler,
    messaging::{
        port::MessagingPort,
        types::{IncomingEvent, IncomingMessage},
    },
    tracker::port::IssueTracker,
    utils::truncate_text,
    Result,
};

/// Everything the loop and the handlers need, passed explicitly.
pub struct BotContext {
    messenger: Arc<dyn MessagingPort>,
    handler: CommandHandler,
    profiles: ProfileCache,
    bot_user: Option<ChatUserId>,
    poll_interval: Duration,
}

/// What happened to one polled event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// Not a plain message from someone else.
    Skipped,
    /// A message that matched no command.
    Ignored,
    Replied,
    /// Handling failed; the error was logged (and reported to the channel when useful).
    Failed,
}

impl BotContext {
    pub fn new(
        cfg: &Config,
        messenger: Arc<dyn MessagingPort>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Self {
        let directory = UserDirectory::new(cfg.redmine_users.clone());
        Self::with_parts(messenger, tracker, directory, cfg.poll_interval)
    }

    pub fn with_parts(
        messenger: Arc<dyn MessagingPort>,
        tracker: Arc<dyn IssueTracker>,
        directory: UserDirectory,
        poll_interval: Duration,
    ) -> Self {
        let bot_user = messenger.bot_user_id();
        Self {
            messenger,
            handler: CommandHandler::new(tracker, directory),
            profiles: ProfileCache::default(),
            bot_user,
            poll_interval,
        }
    }

    /// Run until `shutdown` is cancelled (Ok) or the transport disconnects (Err).
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "listening for messages"
        );

        loop {
            let batch = tokio::select! {
                _ = shutdown.cancelled() => break,
                batch = self.messenger.poll() => batch,
            };

            match batch {
                Ok(events) if !events.is_empty() => {
                    for event in &events {
                        self.process_event(event).await;
                    }
                    continue;
                }
                Ok(_) => {}
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "transport lost, stopping");
                    return Err(e);
                }
                Err(e) => warn!(error = %e, "poll failed"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!("shutdown requested, stopping");
        Ok(())
    }

    /// Handle one event. Never fails: errors are logged here so the loop keeps going.
    pub async fn process_event(&mut self, event: &IncomingEvent) -> EventOutcome {
        debug!(?event, "processing event");

        let Some(msg) = event.as_message() else {
            return EventOutcome::Skipped;
        };
        if self.bot_user.as_ref() == Some(&msg.sender) {
            return EventOutcome::Skipped;
        }

        match self.process_message(&msg).await {
            Ok(true) => EventOutcome::Replied,
            Ok(false) => EventOutcome::Ignored,
            Err(e) => {
                error!(
                    channel = %msg.channel,
                    sender = %msg.sender,
                    error = %e,
                    "failed to handle message"
                );
                if let Some(text) = e.user_message() {
                    if let Err(send_err) = self.reply(&msg.channel, &text).await {
                        warn!(error = %send_err, "failed to report error to channel");
                    }
                }
                EventOutcome::Failed
            }
        }
    }

    async fn process_message(&mut self, msg: &IncomingMessage) -> Result<bool> {
        let Some(command) = match_command(&msg.text) else {
            return Ok(false);
        };
        debug!(?command, sender = %msg.sender, "matched command");

        let caller = self
            .profiles
            .resolve(self.messenger.as_ref(), &msg.sender)
            .await?;
        let reply = self.handler.handle(command, &caller).await?;
        self.reply(&msg.channel, &reply).await?;
        Ok(true)
    }

    async fn reply(&self, channel: &ChannelId, text: &str) -> Result<()> {
        let max = self.messenger.capabilities().max_message_len;
        self.messenger
            .send_text(channel, &truncate_text(text, max))
            .await
    }
}
