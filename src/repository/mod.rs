mod conversion;
mod event_repository;
mod feedback_repository;
mod gift_repository;
mod message_repository;
mod pair_repository;
mod participant_repository;

pub use event_repository::{EventRepository, EventStorageEvent};
pub use feedback_repository::FeedbackRepository;
pub use gift_repository::GiftRepository;
pub use message_repository::MessageRepository;
pub use pair_repository::PairRepository;
pub use participant_repository::ParticipantRepository;

#[cfg(test)]
pub mod test_util {
    use poise::serenity_prelude::{ChannelId, GuildId, UserId};
    use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
    use time::Duration;

    use crate::{
        models::{
            types::UtcDateTime, Event, EventId, EventStatus, NewEvent, NewParticipant, Pair,
        },
        pairing::{Assignment, PairingStore},
    };

    use super::{EventRepository, PairRepository, ParticipantRepository};

    /// A fresh in-memory database with all migrations applied.
    ///
    /// Every connection to `sqlite::memory:` gets its own database, so the pool
    /// is pinned to a single connection that never expires.
    pub async fn memory_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        pool
    }

    pub fn new_event(slug: &str) -> NewEvent {
        let now = UtcDateTime::now();

        NewEvent {
            guild: GuildId::new(1),
            channel: ChannelId::new(2),
            organizer: UserId::new(3),
            slug: slug.to_string(),
            title: format!("{slug} gift exchange"),
            budget: Some(20),
            registration_end: now + Duration::days(7),
            shipping_deadline: now + Duration::days(21),
        }
    }

    pub fn new_participant(event_id: EventId, user: u64) -> NewParticipant {
        NewParticipant {
            event_id,
            discord_user: UserId::new(user),
            display_name: format!("Member {user}"),
            username: format!("member{user}"),
            wishes: Some("Anything cozy".to_string()),
            address: Some(format!("{user} Main Street")),
            delivery_methods: None,
        }
    }

    pub async fn set_status(pool: &Pool<Sqlite>, event_id: EventId, status: EventStatus) {
        let status = match status {
            EventStatus::Registration => "Registration",
            EventStatus::InProgress => "InProgress",
            EventStatus::Completed => "Completed",
        };

        sqlx::query("UPDATE events SET status = ? WHERE id = ?")
            .bind(status)
            .bind(event_id.0 as i64)
            .execute(pool)
            .await
            .unwrap();
    }

    /// An event with `count` participants (users 101, 102, ...) paired in a
    /// simple cycle.
    pub async fn paired_event(pool: &Pool<Sqlite>, count: u64) -> (Event, Vec<Pair>) {
        let events = EventRepository::new(pool.clone());
        let participants = ParticipantRepository::new(pool.clone());
        let pairs = PairRepository::new(pool.clone());

        let event = events.create_event(new_event("Paired")).await.unwrap();

        let mut ids = vec![];
        for user in 1..=count {
            ids.push(
                participants
                    .register(&new_participant(event.id, 100 + user))
                    .await
                    .unwrap()
                    .unwrap()
                    .id,
            );
        }

        let assignment = ids
            .iter()
            .enumerate()
            .map(|(i, giver)| Assignment {
                giver: *giver,
                receiver: ids[(i + 1) % ids.len()],
            })
            .collect::<Vec<_>>();

        let pairs = pairs
            .persist_pairs_and_activate(event.id, &assignment)
            .await
            .unwrap();

        let event = events.get_event(event.id).await.unwrap().unwrap();

        (event, pairs)
    }
}
