use std::collections::HashSet;

use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use sqlx::{query, query_as, query_scalar, FromRow, Pool, Sqlite};
use tokio::sync::broadcast::{Receiver, Sender};
use tracing::warn;

use crate::models::{types::UtcDateTime, Event, EventId, EventStatus, NewEvent, ReminderKind};

use super::conversion::{DBConvertible, DBFromConversionError, DBToConversionError};

pub(super) const EVENT_COLUMNS: &str = r#"
    id,
    guild,
    channel,
    organizer,
    slug,
    title,
    budget,
    status,
    registration_end,
    shipping_deadline,
    created_at
"#;

#[derive(Debug)]
pub struct EventRepository {
    pool: Pool<Sqlite>,
    events: Sender<EventStorageEvent>,
}

#[derive(Clone, Copy, Debug)]
pub enum EventStorageEvent {
    EventsUpdated,
}

impl EventRepository {
    pub fn new(pool: Pool<Sqlite>) -> EventRepository {
        EventRepository {
            pool,
            events: tokio::sync::broadcast::channel(128).0,
        }
    }

    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event, anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let event = {
            let guild = new_event.guild.to_db()?;
            let channel = new_event.channel.to_db()?;
            let organizer = new_event.organizer.to_db()?;
            let budget = new_event.budget.map(|b| b.to_db()).transpose()?;
            let status = EventStatus::Registration.to_db()?;
            let registration_end = new_event.registration_end.to_db()?;
            let shipping_deadline = new_event.shipping_deadline.to_db()?;
            let created_at = UtcDateTime::now().to_db()?;

            query_as::<_, SqlEvent>(&format!(
                r#"
                INSERT INTO events (
                    guild,
                    channel,
                    organizer,
                    slug,
                    title,
                    budget,
                    status,
                    registration_end,
                    shipping_deadline,
                    created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING {EVENT_COLUMNS}
                "#
            ))
            .bind(guild)
            .bind(channel)
            .bind(organizer)
            .bind(&new_event.slug)
            .bind(&new_event.title)
            .bind(budget)
            .bind(status)
            .bind(registration_end)
            .bind(shipping_deadline)
            .bind(created_at)
            .fetch_one(&mut *transaction)
            .await?
        };

        transaction.commit().await?;

        let _ = self.events.send(EventStorageEvent::EventsUpdated); // Don't care if it actually gets received

        Ok(Event::from_db(&event)?)
    }

    pub async fn get_event(&self, id: EventId) -> Result<Option<Event>, anyhow::Error> {
        let event = query_as::<_, SqlEvent>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"
        ))
        .bind(id.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match event {
            Some(event) => Ok(Some(Event::from_db(&event)?)),
            None => Ok(None),
        }
    }

    pub async fn get_event_by_slug(
        &self,
        guild: GuildId,
        slug: &str,
    ) -> Result<Option<Event>, anyhow::Error> {
        let event = query_as::<_, SqlEvent>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE guild = ? AND slug = ?"
        ))
        .bind(guild.to_db()?)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        match event {
            Some(event) => Ok(Some(Event::from_db(&event)?)),
            None => Ok(None),
        }
    }

    pub async fn get_guild_events(&self, guild: GuildId) -> Result<Vec<Event>, anyhow::Error> {
        let events = query_as::<_, SqlEvent>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE guild = ?
            ORDER BY registration_end DESC, title
            "#
        ))
        .bind(guild.to_db()?)
        .fetch_all(&self.pool)
        .await?;

        events
            .iter()
            .map(|event| Event::from_db(event).map_err(anyhow::Error::from))
            .collect()
    }

    /// Events with the given slug that `user` takes part in, across all guilds.
    pub async fn get_user_events_by_slug(
        &self,
        user: UserId,
        slug: &str,
    ) -> Result<Vec<Event>, anyhow::Error> {
        let events = query_as::<_, SqlEvent>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE slug = ?
                AND EXISTS (
                    SELECT 1 FROM participants
                    WHERE participants.event_id = events.id AND participants.discord_user = ?)
            ORDER BY id
            "#
        ))
        .bind(slug)
        .bind(user.to_db()?)
        .fetch_all(&self.pool)
        .await?;

        events
            .iter()
            .map(|event| Event::from_db(event).map_err(anyhow::Error::from))
            .collect()
    }

    /// Events the reminder service still has to look after.
    pub async fn get_unfinished_events(&self) -> Result<Vec<Event>, anyhow::Error> {
        let events = query_as::<_, SqlEvent>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE status <> ? ORDER BY id"
        ))
        .bind(EventStatus::Completed.to_db()?)
        .fetch_all(&self.pool)
        .await?;

        events
            .iter()
            .map(|event| Event::from_db(event).map_err(anyhow::Error::from))
            .collect()
    }

    /// Moves an in-progress event to `Completed`. Returns `false` if the event was in another state.
    pub async fn complete_event(&self, id: EventId) -> Result<bool, anyhow::Error> {
        let result = query("UPDATE events SET status = ? WHERE id = ? AND status = ?")
            .bind(EventStatus::Completed.to_db()?)
            .bind(id.to_db()?)
            .bind(EventStatus::InProgress.to_db()?)
            .execute(&self.pool)
            .await?;

        let completed = result.rows_affected() > 0;
        if completed {
            let _ = self.events.send(EventStorageEvent::EventsUpdated);
        }

        Ok(completed)
    }

    pub async fn delete_event(&self, guild: GuildId, slug: &str) -> Result<bool, anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let guild_db = guild.to_db()?;
        let query_result = query("DELETE FROM events WHERE guild = ? AND slug = ?")
            .bind(guild_db)
            .bind(slug)
            .execute(&mut *transaction)
            .await?;

        transaction.commit().await?;

        let _ = self.events.send(EventStorageEvent::EventsUpdated);

        let events_deleted = query_result.rows_affected();

        if events_deleted > 1 {
            warn!("Deleted more than one event. Guild: {guild}, slug: {slug}");
        }

        Ok(events_deleted > 0)
    }

    pub async fn get_sent_reminders(
        &self,
        id: EventId,
    ) -> Result<HashSet<ReminderKind>, anyhow::Error> {
        let kinds = query_scalar::<_, String>("SELECT kind FROM sent_reminders WHERE event_id = ?")
            .bind(id.to_db()?)
            .fetch_all(&self.pool)
            .await?;

        kinds
            .iter()
            .map(|kind| ReminderKind::from_db(kind).map_err(anyhow::Error::from))
            .collect()
    }

    /// Claims a reminder for sending. Returns `false` if it has already been claimed.
    pub async fn mark_reminder_sent(
        &self,
        id: EventId,
        kind: ReminderKind,
    ) -> Result<bool, anyhow::Error> {
        let result = query(
            r#"
            INSERT INTO sent_reminders (event_id, kind, sent_at)
            VALUES (?, ?, ?)
            ON CONFLICT (event_id, kind) DO NOTHING
            "#,
        )
        .bind(id.to_db()?)
        .bind(kind.to_db()?)
        .bind(UtcDateTime::now().to_db()?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn subscribe(&self) -> Receiver<EventStorageEvent> {
        self.events.subscribe()
    }
}

#[derive(Debug, FromRow)]
pub struct SqlEvent {
    id: i64,
    guild: i64,
    channel: i64,
    organizer: i64,
    slug: String,
    title: String,
    budget: Option<i64>,
    status: String,
    registration_end: String,
    shipping_deadline: String,
    created_at: String,
}

impl DBConvertible for Event {
    type DBType = SqlEvent;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlEvent {
            id: self.id.to_db()?,
            guild: self.guild.to_db()?,
            channel: self.channel.to_db()?,
            organizer: self.organizer.to_db()?,
            slug: self.slug.clone(),
            title: self.title.clone(),
            budget: self.budget.map(|b| b.to_db()).transpose()?,
            status: self.status.to_db()?,
            registration_end: self.registration_end.to_db()?,
            shipping_deadline: self.shipping_deadline.to_db()?,
            created_at: self.created_at.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(Event {
            id: EventId::from_db(&value.id)?,
            guild: GuildId::from_db(&value.guild)?,
            channel: ChannelId::from_db(&value.channel)?,
            organizer: UserId::from_db(&value.organizer)?,
            slug: value.slug.clone(),
            title: value.title.clone(),
            budget: value.budget.as_ref().map(u32::from_db).transpose()?,
            status: EventStatus::from_db(&value.status)?,
            registration_end: UtcDateTime::from_db(&value.registration_end)?,
            shipping_deadline: UtcDateTime::from_db(&value.shipping_deadline)?,
            created_at: UtcDateTime::from_db(&value.created_at)?,
        })
    }
}
