use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::Datelike as _;
use serenity::all::{ChannelId, GatewayIntents, Http, Message, MessageId, Ready};
use serenity::async_trait;
use serenity::client::Context as SerenityContext;
use serenity::prelude::*;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::embed;
use crate::publish::{DiscordSink, Publisher};
use crate::schedule::{InvalidTimeFormat, TimeWindow};
use crate::status::{self, StreamState};
use crate::twitch::TwitchClient;

const COMMAND_PREFIX: char = '!';
const REFRESH_INTERVAL: Duration = Duration::from_secs(60);
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Owns every piece of mutable state: the stream state, the Twitch client
/// with its cached token, and the publisher with its message handle. All
/// refreshes go through the one mutex around this, so a command-triggered
/// update can never interleave with a periodic tick.
struct Updater {
    state: StreamState,
    twitch: TwitchClient,
    publisher: Publisher<DiscordSink>,
}

impl Updater {
    /// The full pipeline: fetch the live signal, evaluate the display
    /// status, rebuild the embed and publish it.
    async fn refresh(&mut self) -> Result<()> {
        let online = self
            .twitch
            .is_live()
            .await
            .context("Failed to query live status")?;

        let now = status::now_montevideo();
        let current = status::evaluate(online, self.state.cancelled_today, now.weekday());
        let payload = embed::status_embed(current, online, self.state.window, now);

        self.publisher
            .publish(payload)
            .await
            .context("Failed to publish status message")?;
        Ok(())
    }
}

struct Handler {
    updater: Arc<Mutex<Updater>>,
    refresh_loop_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: SerenityContext, ready: Ready) {
        info!(user = %ready.user.name, "Bot connected");

        // ready fires again on gateway reconnects; the loop survives those
        if self.refresh_loop_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let updater = self.updater.clone();
        tokio::spawn(async move {
            run_refresh_loop(updater).await;
        });
    }

    async fn message(&self, ctx: SerenityContext, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(line) = msg.content.strip_prefix(COMMAND_PREFIX) else {
            return;
        };
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return;
        };
        if !matches!(command, "cancelar" | "horario" | "reset") {
            return;
        }
        let args: Vec<&str> = parts.collect();

        match self.authorized(&ctx, &msg).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user = %msg.author.name, command, "Unauthorized command ignored");
                return;
            }
            Err(e) => {
                error!(error = %e, command, "Permission check failed");
                return;
            }
        }

        if let Err(e) = self.handle_command(&ctx, &msg, command, &args).await {
            error!(error = %e, command = %msg.content, "Command error");
        }
    }
}

impl Handler {
    /// Operator commands require Manage Messages in the channel they were
    /// issued from. DMs never qualify.
    async fn authorized(&self, ctx: &SerenityContext, msg: &Message) -> Result<bool> {
        let Some(guild_id) = msg.guild_id else {
            return Ok(false);
        };
        let member = guild_id
            .member(ctx, msg.author.id)
            .await
            .context("Failed to resolve command author")?;

        let authorized = match msg.guild(&ctx.cache) {
            Some(guild) => guild
                .channels
                .get(&msg.channel_id)
                .map(|channel| {
                    guild
                        .user_permissions_in(channel, &member)
                        .manage_messages()
                })
                .unwrap_or(false),
            None => false,
        };
        Ok(authorized)
    }

    async fn handle_command(
        &self,
        ctx: &SerenityContext,
        msg: &Message,
        command: &str,
        args: &[&str],
    ) -> Result<()> {
        match command {
            "cancelar" => self.handle_cancelar(ctx, msg).await,
            "horario" => self.handle_horario(ctx, msg, args).await,
            "reset" => self.handle_reset(ctx, msg).await,
            _ => Ok(()),
        }
    }

    async fn handle_cancelar(&self, ctx: &SerenityContext, msg: &Message) -> Result<()> {
        let mut updater = self.updater.lock().await;
        updater.state.cancelled_today = true;
        info!(user = %msg.author.name, "Stream cancelled for today");

        cleanup_invocation(ctx, msg).await;
        send_transient_notice(
            ctx,
            msg.channel_id,
            "✅ El stream de hoy ha sido cancelado.".to_string(),
        )
        .await;

        updater.refresh().await
    }

    async fn handle_horario(
        &self,
        ctx: &SerenityContext,
        msg: &Message,
        args: &[&str],
    ) -> Result<()> {
        let window = match args {
            [start, end] => match parse_window(start, end) {
                Ok(window) => window,
                Err(e) => {
                    cleanup_invocation(ctx, msg).await;
                    send_transient_notice(ctx, msg.channel_id, format!("⚠️ {e}")).await;
                    return Ok(());
                }
            },
            _ => {
                cleanup_invocation(ctx, msg).await;
                send_transient_notice(
                    ctx,
                    msg.channel_id,
                    "⚠️ Uso: !horario <inicio> <fin> (HH:MM)".to_string(),
                )
                .await;
                return Ok(());
            }
        };

        let mut updater = self.updater.lock().await;
        updater.state.window = window;
        info!(user = %msg.author.name, window = %window, "Schedule updated");

        cleanup_invocation(ctx, msg).await;
        send_transient_notice(
            ctx,
            msg.channel_id,
            format!("✅ Horario actualizado a 🇺🇾 {window}"),
        )
        .await;

        updater.refresh().await
    }

    async fn handle_reset(&self, ctx: &SerenityContext, msg: &Message) -> Result<()> {
        let mut updater = self.updater.lock().await;
        updater.state.reset();
        info!(user = %msg.author.name, "State and schedule reset to defaults");

        cleanup_invocation(ctx, msg).await;
        send_transient_notice(
            ctx,
            msg.channel_id,
            "✅ Estado y horario reseteados a valores por defecto.".to_string(),
        )
        .await;

        updater.refresh().await
    }
}

fn parse_window(start: &str, end: &str) -> Result<TimeWindow, InvalidTimeFormat> {
    Ok(TimeWindow::new(start.parse()?, end.parse()?))
}

/// Remove the invoking command message; losing it is not worth failing the
/// command over.
async fn cleanup_invocation(ctx: &SerenityContext, msg: &Message) {
    if let Err(e) = msg.delete(&ctx.http).await {
        warn!(error = %e, "Failed to delete command message");
    }
}

/// Post a confirmation and remove it shortly after, keeping the channel
/// clean.
async fn send_transient_notice(ctx: &SerenityContext, channel_id: ChannelId, text: String) {
    let notice = match channel_id.say(&ctx.http, text).await {
        Ok(notice) => notice,
        Err(e) => {
            warn!(error = %e, "Failed to send confirmation notice");
            return;
        }
    };

    let http = ctx.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(NOTICE_TTL).await;
        if let Err(e) = notice.delete(&http).await {
            warn!(error = %e, "Failed to delete confirmation notice");
        }
    });
}

async fn run_refresh_loop(updater: Arc<Mutex<Updater>>) {
    info!(interval = ?REFRESH_INTERVAL, "Starting status refresh loop");

    // the first tick fires immediately, publishing right after connect
    let mut interval = tokio::time::interval(REFRESH_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = updater.lock().await.refresh().await {
            error!(error = %e, "Refresh failed");
        }
    }
}

pub async fn run(config: Config) -> Result<()> {
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let channel_id = ChannelId::new(config.discord.channel_id);
    let adopted = config.discord.message_id.map(MessageId::new);
    if let Some(id) = adopted {
        info!(message_id = id.get(), "Adopting existing status message");
    }

    let http = Arc::new(Http::new(&config.discord.token));
    let publisher = Publisher::new(DiscordSink::new(http, channel_id), adopted);
    let twitch = TwitchClient::new(&config.twitch).context("Failed to create Twitch client")?;

    let handler = Handler {
        updater: Arc::new(Mutex::new(Updater {
            state: StreamState::default(),
            twitch,
            publisher,
        })),
        refresh_loop_started: AtomicBool::new(false),
    };

    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(handler)
        .await
        .context("Failed to create client")?;

    info!("Starting bot");
    client.start().await.context("Client error")?;

    Ok(())
}
