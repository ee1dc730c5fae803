#![forbid(unsafe_code)]

mod commands;
mod conversation;
mod messenger;
mod models;
mod notifications;
mod pairing;
mod poise_error_handler;
mod repository;
mod utils;

use std::{process::exit, sync::Arc, time::Duration};

use conversation::ConversationStore;
use messenger::{DiscordMessenger, Messenger};
use notifications::{DiscordPairNotifier, ReminderService};
use pairing::{PairingService, PairingStore};
use poise::{serenity_prelude::*, Framework};
use poise_error_handler::handle_error;
use repository::{
    EventRepository, FeedbackRepository, GiftRepository, MessageRepository, PairRepository,
    ParticipantRepository,
};
use serde::Deserialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::{select, signal};
use tracing::{error, info, info_span, warn, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize)]
struct AppConfig {
    discord_bot_token: String,
    database_url: String,
    register_commands_globally: Option<bool>,
    register_commands_in_guilds: Option<Vec<u64>>,
    reminder_interval_minutes: Option<u64>,
}

impl AppConfig {
    fn reminder_interval(&self) -> Duration {
        match self.reminder_interval_minutes {
            Some(minutes) if minutes > 0 => Duration::from_secs(minutes * 60),
            _ => notifications::DEFAULT_INTERVAL,
        }
    }
}

pub struct BotState {
    pub event_repository: Arc<EventRepository>,
    pub participant_repository: Arc<ParticipantRepository>,
    pub pair_repository: Arc<PairRepository>,
    pub message_repository: Arc<MessageRepository>,
    pub gift_repository: Arc<GiftRepository>,
    pub feedback_repository: Arc<FeedbackRepository>,
    pub pairing_service: Arc<PairingService>,
    pub messenger: Arc<dyn Messenger>,
    pub conversations: ConversationStore,
}

#[tracing::instrument]
#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        warn!("Could not load config from .env file: {err}");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(
                    "secret_santa_bot=info"
                        .parse()
                        .expect("Hard-coded default directive should be correct"),
                )
                .from_env_lossy(),
        )
        .init();

    let app_config = match envy::from_env::<AppConfig>() {
        Ok(config) => config,
        Err(err) => {
            error!("Could not load app config: {err}");
            exit(255);
        }
    };

    let db_pool = match setup_database(&app_config.database_url).await {
        Ok(pool) => pool,
        Err(err) => {
            error!("Could not setup database: {err}");
            exit(255);
        }
    };

    let http = Arc::new(Http::new(&app_config.discord_bot_token));
    let messenger: Arc<dyn Messenger> = Arc::new(DiscordMessenger::new(http));

    let event_repository = Arc::new(EventRepository::new(db_pool.clone()));
    let participant_repository = Arc::new(ParticipantRepository::new(db_pool.clone()));
    let pair_repository = Arc::new(PairRepository::new(db_pool.clone()));

    let pairing_service = Arc::new(PairingService::new(
        pair_repository.clone() as Arc<dyn PairingStore>,
        Arc::new(DiscordPairNotifier::new(
            messenger.clone(),
            participant_repository.clone(),
        )),
    ));

    let reminders = ReminderService::new(
        messenger.clone(),
        event_repository.clone(),
        participant_repository.clone(),
        pair_repository.clone(),
        app_config.reminder_interval(),
    )
    .start();

    let app_state = BotState {
        event_repository,
        participant_repository,
        pair_repository,
        message_repository: Arc::new(MessageRepository::new(db_pool.clone())),
        gift_repository: Arc::new(GiftRepository::new(db_pool.clone())),
        feedback_repository: Arc::new(FeedbackRepository::new(db_pool.clone())),
        pairing_service,
        messenger,
        conversations: ConversationStore::default(),
    };

    let token = app_config.discord_bot_token.clone();

    let framework = Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::event(),
                commands::register(),
                commands::profile(),
                commands::profile_edit(),
                commands::recipient(),
                commands::message(),
                commands::history(),
                commands::gift_sent(),
                commands::gifts(),
                commands::feedback(),
                commands::help(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(conversation::handle_event(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(handle_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(
                async move {
                    let commands = &framework.options().commands;

                    if let Some(true) = app_config.register_commands_globally {
                        info!("Registering commands globally");
                        poise::builtins::register_globally(ctx, commands).await?;
                    }

                    if let Some(guilds) = app_config.register_commands_in_guilds {
                        for guild in guilds.iter().map(|g| GuildId::new(*g)) {
                            let guild_name = ctx
                                .http()
                                .get_guild(guild)
                                .await
                                .map(|g| g.name)
                                .unwrap_or("???".to_string());

                            info!("Registering commands in guild {guild} ({guild_name})");

                            poise::builtins::register_in_guild(ctx, commands, guild).await?;
                        }
                    }

                    Ok(app_state)
                }
                .instrument(info_span!("bot_setup")),
            )
        })
        .build();

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = match ClientBuilder::new(token, intents)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to create the client: {err}");
            reminders.stop().await;
            exit(255);
        }
    };

    select! {
        _ = signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        },

        result = client.start() => {
            if let Err(err) = result {
                error!("Failed to start the client: {err}");
            }
        },
    };

    reminders.stop().await;
    client.shard_manager.shutdown_all().await;
    db_pool.close().await;
}

#[tracing::instrument(skip(url))]
async fn setup_database(url: &str) -> anyhow::Result<SqlitePool> {
    info!("Connecting to SQLite database at {url}");
    let pool = SqlitePoolOptions::new().connect(url).await?;
    info!("Running migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Done!");
    Ok(pool)
}
