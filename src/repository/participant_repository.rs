use poise::serenity_prelude::UserId;
use sqlx::{query, query_as, query_scalar, FromRow, Pool, Sqlite};

use crate::models::{
    types::UtcDateTime, EventId, EventStatus, NewParticipant, Participant, ParticipantId,
    ProfileField,
};

use super::conversion::{DBConvertible, DBFromConversionError, DBToConversionError};

const PARTICIPANT_COLUMNS: &str = r#"
    id,
    event_id,
    discord_user,
    display_name,
    username,
    wishes,
    address,
    delivery_methods,
    registered_at
"#;

pub struct ParticipantRepository {
    pool: Pool<Sqlite>,
}

impl ParticipantRepository {
    pub fn new(pool: Pool<Sqlite>) -> ParticipantRepository {
        ParticipantRepository { pool }
    }

    /// Registers a participant while the event is still accepting registrations.
    ///
    /// Returns `None` if the member is already registered or the event has left
    /// the registration stage. The status check runs in the same statement as
    /// the insert, so nobody can slip in after the event has been paired.
    pub async fn register(
        &self,
        participant: &NewParticipant,
    ) -> Result<Option<Participant>, anyhow::Error> {
        let mut transaction = self.pool.begin().await?;

        let registered = {
            let event_id = participant.event_id.to_db()?;
            let discord_user = participant.discord_user.to_db()?;
            let registered_at = UtcDateTime::now().to_db()?;
            let registration = EventStatus::Registration.to_db()?;

            query_as::<_, SqlParticipant>(&format!(
                r#"
                INSERT INTO participants (
                    event_id,
                    discord_user,
                    display_name,
                    username,
                    wishes,
                    address,
                    delivery_methods,
                    registered_at)
                SELECT ?, ?, ?, ?, ?, ?, ?, ?
                WHERE EXISTS (SELECT 1 FROM events WHERE id = ? AND status = ?)
                ON CONFLICT (event_id, discord_user) DO NOTHING
                RETURNING {PARTICIPANT_COLUMNS}
                "#
            ))
            .bind(event_id)
            .bind(discord_user)
            .bind(&participant.display_name)
            .bind(&participant.username)
            .bind(&participant.wishes)
            .bind(&participant.address)
            .bind(&participant.delivery_methods)
            .bind(registered_at)
            .bind(event_id)
            .bind(registration)
            .fetch_optional(&mut *transaction)
            .await?
        };

        transaction.commit().await?;

        match registered {
            Some(participant) => Ok(Some(Participant::from_db(&participant)?)),
            None => Ok(None),
        }
    }

    pub async fn get_participant(
        &self,
        id: ParticipantId,
    ) -> Result<Option<Participant>, anyhow::Error> {
        let participant = query_as::<_, SqlParticipant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = ?"
        ))
        .bind(id.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match participant {
            Some(participant) => Ok(Some(Participant::from_db(&participant)?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_user(
        &self,
        event_id: EventId,
        user: UserId,
    ) -> Result<Option<Participant>, anyhow::Error> {
        let participant = query_as::<_, SqlParticipant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = ? AND discord_user = ?"
        ))
        .bind(event_id.to_db()?)
        .bind(user.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match participant {
            Some(participant) => Ok(Some(Participant::from_db(&participant)?)),
            None => Ok(None),
        }
    }

    pub async fn list_participants(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Participant>, anyhow::Error> {
        let participants = query_as::<_, SqlParticipant>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = ? ORDER BY id"
        ))
        .bind(event_id.to_db()?)
        .fetch_all(&self.pool)
        .await?;

        participants
            .iter()
            .map(|p| Participant::from_db(p).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn count_participants(&self, event_id: EventId) -> Result<u64, anyhow::Error> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM participants WHERE event_id = ?")
            .bind(event_id.to_db()?)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as _)
    }

    /// Updates one profile field. Only allowed before the event is paired, since
    /// santas copy the receiver's details from the pairing message.
    pub async fn update_profile(
        &self,
        event_id: EventId,
        user: UserId,
        field: ProfileField,
        value: Option<&str>,
    ) -> Result<bool, anyhow::Error> {
        let result = query(&format!(
            r#"
            UPDATE participants SET {column} = ?
            WHERE event_id = ? AND discord_user = ?
                AND EXISTS (SELECT 1 FROM events WHERE id = ? AND status = ?)
            "#,
            column = field.column(),
        ))
        .bind(value)
        .bind(event_id.to_db()?)
        .bind(user.to_db()?)
        .bind(event_id.to_db()?)
        .bind(EventStatus::Registration.to_db()?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, FromRow)]
pub struct SqlParticipant {
    id: i64,
    event_id: i64,
    discord_user: i64,
    display_name: String,
    username: String,
    wishes: Option<String>,
    address: Option<String>,
    delivery_methods: Option<String>,
    registered_at: String,
}

impl DBConvertible for Participant {
    type DBType = SqlParticipant;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlParticipant {
            id: self.id.to_db()?,
            event_id: self.event_id.to_db()?,
            discord_user: self.discord_user.to_db()?,
            display_name: self.display_name.clone(),
            username: self.username.clone(),
            wishes: self.wishes.clone(),
            address: self.address.clone(),
            delivery_methods: self.delivery_methods.clone(),
            registered_at: self.registered_at.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(Participant {
            id: ParticipantId::from_db(&value.id)?,
            event_id: EventId::from_db(&value.event_id)?,
            discord_user: UserId::from_db(&value.discord_user)?,
            display_name: value.display_name.clone(),
            username: value.username.clone(),
            wishes: value.wishes.clone(),
            address: value.address.clone(),
            delivery_methods: value.delivery_methods.clone(),
            registered_at: UtcDateTime::from_db(&value.registered_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude::UserId;

    use crate::{
        models::{EventStatus, ProfileField},
        repository::{
            test_util::{memory_pool, new_event, new_participant, set_status},
            EventRepository,
        },
    };

    use super::ParticipantRepository;

    #[test_log::test(tokio::test)]
    async fn registering_twice_is_a_no_op() {
        let pool = memory_pool().await;
        let events = EventRepository::new(pool.clone());
        let participants = ParticipantRepository::new(pool);
        let event = events.create_event(new_event("Office")).await.unwrap();

        let first = participants
            .register(&new_participant(event.id, 10))
            .await
            .unwrap();
        let second = participants
            .register(&new_participant(event.id, 10))
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(participants.count_participants(event.id).await.unwrap(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn registration_is_closed_once_paired() {
        let pool = memory_pool().await;
        let events = EventRepository::new(pool.clone());
        let participants = ParticipantRepository::new(pool.clone());
        let event = events.create_event(new_event("Office")).await.unwrap();

        set_status(&pool, event.id, EventStatus::InProgress).await;

        assert!(participants
            .register(&new_participant(event.id, 10))
            .await
            .unwrap()
            .is_none());
    }

    #[test_log::test(tokio::test)]
    async fn profile_edits_stop_after_pairing() {
        let pool = memory_pool().await;
        let events = EventRepository::new(pool.clone());
        let participants = ParticipantRepository::new(pool.clone());
        let event = events.create_event(new_event("Office")).await.unwrap();
        participants
            .register(&new_participant(event.id, 10))
            .await
            .unwrap();

        assert!(participants
            .update_profile(event.id, UserId::new(10), ProfileField::Address, Some("Elm St 1"))
            .await
            .unwrap());
        let updated = participants
            .get_by_user(event.id, UserId::new(10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.address.as_deref(), Some("Elm St 1"));

        set_status(&pool, event.id, EventStatus::InProgress).await;

        assert!(!participants
            .update_profile(event.id, UserId::new(10), ProfileField::Wishes, None)
            .await
            .unwrap());
    }
}
