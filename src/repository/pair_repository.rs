use std::collections::HashSet;

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{query, query_as, query_scalar, FromRow, Pool, Sqlite};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    models::{Event, EventId, EventStatus, Pair, PairId, ParticipantId},
    pairing::{Assignment, PairingStore, PersistError},
};

use super::{
    conversion::{DBConvertible, DBFromConversionError, DBToConversionError},
    event_repository::{SqlEvent, EVENT_COLUMNS},
};

pub struct PairRepository {
    pool: Pool<Sqlite>,
    /// Serializes draws within this process. The conditional status update in
    /// the transaction still decides the winner if another process is involved.
    pairing_lock: Mutex<()>,
}

impl PairRepository {
    pub fn new(pool: Pool<Sqlite>) -> PairRepository {
        PairRepository {
            pool,
            pairing_lock: Mutex::new(()),
        }
    }

    pub async fn get_pair(&self, id: PairId) -> Result<Option<Pair>, anyhow::Error> {
        let pair = query_as::<_, SqlPair>(
            "SELECT id, event_id, giver_id, receiver_id FROM pairs WHERE id = ?",
        )
        .bind(id.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match pair {
            Some(pair) => Ok(Some(Pair::from_db(&pair)?)),
            None => Ok(None),
        }
    }

    pub async fn get_pairs(&self, event_id: EventId) -> Result<Vec<Pair>, anyhow::Error> {
        let pairs = query_as::<_, SqlPair>(
            "SELECT id, event_id, giver_id, receiver_id FROM pairs WHERE event_id = ? ORDER BY id",
        )
        .bind(event_id.to_db()?)
        .fetch_all(&self.pool)
        .await?;

        pairs
            .iter()
            .map(|pair| Pair::from_db(pair).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn count_pairs(&self, event_id: EventId) -> Result<u64, anyhow::Error> {
        let count = query_scalar::<_, i64>("SELECT COUNT(*) FROM pairs WHERE event_id = ?")
            .bind(event_id.to_db()?)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as _)
    }

    /// The pair in which `giver` is the santa.
    pub async fn get_pair_by_giver(
        &self,
        event_id: EventId,
        giver: ParticipantId,
    ) -> Result<Option<Pair>, anyhow::Error> {
        let pair = query_as::<_, SqlPair>(
            r#"
            SELECT id, event_id, giver_id, receiver_id FROM pairs
            WHERE event_id = ? AND giver_id = ?
            "#,
        )
        .bind(event_id.to_db()?)
        .bind(giver.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match pair {
            Some(pair) => Ok(Some(Pair::from_db(&pair)?)),
            None => Ok(None),
        }
    }

    /// The pair in which `receiver` gets the gift.
    pub async fn get_pair_by_receiver(
        &self,
        event_id: EventId,
        receiver: ParticipantId,
    ) -> Result<Option<Pair>, anyhow::Error> {
        let pair = query_as::<_, SqlPair>(
            r#"
            SELECT id, event_id, giver_id, receiver_id FROM pairs
            WHERE event_id = ? AND receiver_id = ?
            "#,
        )
        .bind(event_id.to_db()?)
        .bind(receiver.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match pair {
            Some(pair) => Ok(Some(Pair::from_db(&pair)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PairingStore for PairRepository {
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, anyhow::Error> {
        let event = query_as::<_, SqlEvent>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"
        ))
        .bind(event_id.to_db()?)
        .fetch_optional(&self.pool)
        .await?;

        match event {
            Some(event) => Ok(Some(Event::from_db(&event)?)),
            None => Ok(None),
        }
    }

    async fn list_participant_ids(
        &self,
        event_id: EventId,
    ) -> Result<Vec<ParticipantId>, anyhow::Error> {
        let ids = query_scalar::<_, i64>(
            "SELECT id FROM participants WHERE event_id = ? ORDER BY id",
        )
        .bind(event_id.to_db()?)
        .fetch_all(&self.pool)
        .await?;

        ids.iter()
            .map(|id| ParticipantId::from_db(id).map_err(anyhow::Error::from))
            .collect()
    }

    async fn count_existing_pairs(&self, event_id: EventId) -> Result<u64, anyhow::Error> {
        self.count_pairs(event_id).await
    }

    async fn persist_pairs_and_activate(
        &self,
        event_id: EventId,
        assignment: &[Assignment<ParticipantId>],
    ) -> Result<Vec<Pair>, PersistError> {
        let _guard = self.pairing_lock.lock().await;

        let event_db = event_id.to_db().map_err(anyhow::Error::from)?;

        let mut transaction = self.pool.begin().await.map_err(anyhow::Error::from)?;

        // Taking the event out of registration is the first write, so whoever
        // gets here second sees zero affected rows and backs off.
        let activated = query("UPDATE events SET status = ? WHERE id = ? AND status = ?")
            .bind(EventStatus::InProgress.to_db().map_err(anyhow::Error::from)?)
            .bind(event_db)
            .bind(EventStatus::Registration.to_db().map_err(anyhow::Error::from)?)
            .execute(&mut *transaction)
            .await
            .map_err(anyhow::Error::from)?;

        if activated.rows_affected() == 0 {
            debug!("Event {event_id:?} is no longer in registration");
            return Err(PersistError::AlreadyPaired);
        }

        let existing = query_scalar::<_, i64>("SELECT COUNT(*) FROM pairs WHERE event_id = ?")
            .bind(event_db)
            .fetch_one(&mut *transaction)
            .await
            .map_err(anyhow::Error::from)?;

        if existing > 0 {
            warn!("Event {event_id:?} was in registration but already had {existing} pairs");
            return Err(PersistError::AlreadyPaired);
        }

        let registered = query_scalar::<_, i64>("SELECT id FROM participants WHERE event_id = ?")
            .bind(event_db)
            .fetch_all(&mut *transaction)
            .await
            .map_err(anyhow::Error::from)?
            .into_iter()
            .collect::<HashSet<_>>();

        let mut givers = HashSet::with_capacity(assignment.len());
        for edge in assignment {
            givers.insert(edge.giver.to_db().map_err(anyhow::Error::from)?);
        }

        if registered != givers {
            return Err(PersistError::Other(anyhow!(
                "The participant list changed during the draw"
            )));
        }

        let mut pairs = Vec::with_capacity(assignment.len());
        for edge in assignment {
            let pair = query_as::<_, SqlPair>(
                r#"
                INSERT INTO pairs (event_id, giver_id, receiver_id)
                VALUES (?, ?, ?)
                RETURNING id, event_id, giver_id, receiver_id
                "#,
            )
            .bind(event_db)
            .bind(edge.giver.to_db().map_err(anyhow::Error::from)?)
            .bind(edge.receiver.to_db().map_err(anyhow::Error::from)?)
            .fetch_one(&mut *transaction)
            .await
            .map_err(anyhow::Error::from)?;

            pairs.push(Pair::from_db(&pair).map_err(anyhow::Error::from)?);
        }

        transaction.commit().await.map_err(anyhow::Error::from)?;

        Ok(pairs)
    }
}

#[derive(Debug, FromRow)]
pub struct SqlPair {
    id: i64,
    event_id: i64,
    giver_id: i64,
    receiver_id: i64,
}

impl DBConvertible for Pair {
    type DBType = SqlPair;

    fn to_db(&self) -> Result<Self::DBType, DBToConversionError> {
        Ok(SqlPair {
            id: self.id.to_db()?,
            event_id: self.event_id.to_db()?,
            giver_id: self.giver_id.to_db()?,
            receiver_id: self.receiver_id.to_db()?,
        })
    }

    fn from_db(value: &Self::DBType) -> Result<Self, DBFromConversionError> {
        Ok(Pair {
            id: PairId::from_db(&value.id)?,
            event_id: EventId::from_db(&value.event_id)?,
            giver_id: ParticipantId::from_db(&value.giver_id)?,
            receiver_id: ParticipantId::from_db(&value.receiver_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        models::{Event, EventStatus, ParticipantId},
        pairing::{Assignment, PairingStore, PersistError},
        repository::{
            test_util::{memory_pool, new_event, new_participant},
            EventRepository, ParticipantRepository,
        },
    };

    use super::PairRepository;

    async fn registered(
        count: u64,
    ) -> (PairRepository, EventRepository, Event, Vec<ParticipantId>) {
        let pool = memory_pool().await;
        let events = EventRepository::new(pool.clone());
        let participants = ParticipantRepository::new(pool.clone());
        let event = events.create_event(new_event("Office")).await.unwrap();

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

        (PairRepository::new(pool), events, event, ids)
    }

    fn cycle(ids: &[ParticipantId]) -> Vec<Assignment<ParticipantId>> {
        ids.iter()
            .enumerate()
            .map(|(i, giver)| Assignment {
                giver: *giver,
                receiver: ids[(i + 1) % ids.len()],
            })
            .collect()
    }

    #[test_log::test(tokio::test)]
    async fn persisting_activates_the_event() {
        let (pairs, events, event, ids) = registered(3).await;

        let stored = pairs
            .persist_pairs_and_activate(event.id, &cycle(&ids))
            .await
            .unwrap();

        assert_eq!(stored.len(), 3);
        assert_eq!(
            events.get_event(event.id).await.unwrap().unwrap().status,
            EventStatus::InProgress
        );

        let by_giver = pairs
            .get_pair_by_giver(event.id, ids[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_giver.receiver_id, ids[1]);

        let by_receiver = pairs
            .get_pair_by_receiver(event.id, ids[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_receiver.giver_id, ids[2]);

        assert_eq!(pairs.get_pair(by_giver.id).await.unwrap(), Some(by_giver));
    }

    #[test_log::test(tokio::test)]
    async fn second_persist_is_refused() {
        let (pairs, _events, event, ids) = registered(3).await;

        pairs
            .persist_pairs_and_activate(event.id, &cycle(&ids))
            .await
            .unwrap();

        let reversed = ids.iter().rev().copied().collect::<Vec<_>>();
        let second = pairs
            .persist_pairs_and_activate(event.id, &cycle(&reversed))
            .await;

        assert!(matches!(second, Err(PersistError::AlreadyPaired)));
        assert_eq!(pairs.count_pairs(event.id).await.unwrap(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn stale_participant_list_rolls_back() {
        let (pairs, events, event, ids) = registered(4).await;

        let result = pairs
            .persist_pairs_and_activate(event.id, &cycle(&ids[..3]))
            .await;

        assert!(matches!(result, Err(PersistError::Other(_))));
        assert_eq!(pairs.count_pairs(event.id).await.unwrap(), 0);
        assert_eq!(
            events.get_event(event.id).await.unwrap().unwrap().status,
            EventStatus::Registration
        );
    }

    #[test_log::test(tokio::test)]
    async fn self_pairs_are_rejected_by_the_database() {
        let (pairs, events, event, ids) = registered(3).await;

        let broken = vec![
            Assignment { giver: ids[0], receiver: ids[0] },
            Assignment { giver: ids[1], receiver: ids[2] },
            Assignment { giver: ids[2], receiver: ids[1] },
        ];

        assert!(pairs
            .persist_pairs_and_activate(event.id, &broken)
            .await
            .is_err());
        assert_eq!(pairs.count_pairs(event.id).await.unwrap(), 0);
        assert_eq!(
            events.get_event(event.id).await.unwrap().unwrap().status,
            EventStatus::Registration
        );
    }
}
