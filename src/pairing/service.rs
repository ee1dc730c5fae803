use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::{Event, EventId, EventStatus, Pair, ParticipantId};

use super::engine::{compute_assignment, Assignment, EngineError, MIN_PARTICIPANTS};

/// Storage the pairing service works against.
#[async_trait]
pub trait PairingStore: Send + Sync {
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, anyhow::Error>;

    async fn list_participant_ids(
        &self,
        event_id: EventId,
    ) -> Result<Vec<ParticipantId>, anyhow::Error>;

    async fn count_existing_pairs(&self, event_id: EventId) -> Result<u64, anyhow::Error>;

    /// Stores the whole assignment and moves the event to `InProgress` in one
    /// transaction. Must fail with [`PersistError::AlreadyPaired`] if another
    /// pairing of the same event committed first.
    async fn persist_pairs_and_activate(
        &self,
        event_id: EventId,
        assignment: &[Assignment<ParticipantId>],
    ) -> Result<Vec<Pair>, PersistError>;
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("The event has already been paired")]
    AlreadyPaired,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Tells a giver who they are giving to.
#[async_trait]
pub trait PairNotifier: Send + Sync {
    async fn notify_giver(&self, event: &Event, pair: &Pair) -> Result<(), anyhow::Error>;
}

#[derive(Debug, Error)]
pub enum PairingError {
    #[error("Event {0:?} does not exist")]
    EventNotFound(EventId),
    #[error("At least {} participants are needed for the draw, but only {count} registered", MIN_PARTICIPANTS)]
    InsufficientParticipants { count: usize },
    #[error("The draw for this event has already been held")]
    AlreadyPaired(EventId),
    #[error("Participant {0:?} is listed twice")]
    DuplicateParticipant(ParticipantId),
    #[error("Could not generate pairs after {attempts} attempts, please try again")]
    PairingGenerationFailed { attempts: u32 },
    #[error("Could not save the pairs: {0}")]
    Persistence(anyhow::Error),
}

impl From<EngineError<ParticipantId>> for PairingError {
    fn from(value: EngineError<ParticipantId>) -> Self {
        match value {
            EngineError::InsufficientParticipants { count } => {
                PairingError::InsufficientParticipants { count }
            }
            EngineError::DuplicateParticipant(id) => PairingError::DuplicateParticipant(id),
            EngineError::GenerationFailed { attempts } => {
                PairingError::PairingGenerationFailed { attempts }
            }
        }
    }
}

#[derive(Debug)]
pub struct PairingOutcome {
    pub event: Event,
    pub pairs: Vec<Pair>,
    pub notified: usize,
    pub failed_notifications: usize,
}

impl PairingOutcome {
    pub fn message(&self) -> String {
        let mut message = format!(
            "The draw for **{}** is done: {} pairs created.",
            self.event.title,
            self.pairs.len()
        );

        if self.failed_notifications > 0 {
            message += &format!(
                "\n{} of {} santas could not be reached by DM. They can still use `/recipient {}`.",
                self.failed_notifications,
                self.pairs.len(),
                self.event.slug,
            );
        } else {
            message += "\nEvery santa has received their recipient in the DMs.";
        }

        message
    }
}

pub struct PairingService {
    store: Arc<dyn PairingStore>,
    notifier: Arc<dyn PairNotifier>,
    rng: Mutex<StdRng>,
}

impl PairingService {
    pub fn new(store: Arc<dyn PairingStore>, notifier: Arc<dyn PairNotifier>) -> PairingService {
        PairingService::with_rng(store, notifier, StdRng::from_os_rng())
    }

    pub fn with_rng(
        store: Arc<dyn PairingStore>,
        notifier: Arc<dyn PairNotifier>,
        rng: StdRng,
    ) -> PairingService {
        PairingService {
            store,
            notifier,
            rng: Mutex::new(rng),
        }
    }

    /// Holds the draw for an event.
    ///
    /// The pair count check below only rejects obvious repeats early; the store's
    /// transaction decides which of several concurrent attempts wins.
    #[tracing::instrument(skip(self))]
    pub async fn run_pairing(&self, event_id: EventId) -> Result<PairingOutcome, PairingError> {
        let event = self
            .store
            .get_event(event_id)
            .await
            .map_err(PairingError::Persistence)?
            .ok_or(PairingError::EventNotFound(event_id))?;

        let participants = self
            .store
            .list_participant_ids(event_id)
            .await
            .map_err(PairingError::Persistence)?;

        if participants.len() < MIN_PARTICIPANTS {
            return Err(PairingError::InsufficientParticipants {
                count: participants.len(),
            });
        }

        let existing_pairs = self
            .store
            .count_existing_pairs(event_id)
            .await
            .map_err(PairingError::Persistence)?;

        if existing_pairs > 0 || event.status != EventStatus::Registration {
            info!("Event {event_id:?} has already been paired");
            return Err(PairingError::AlreadyPaired(event_id));
        }

        let assignment = {
            let mut rng = match self.rng.lock() {
                Ok(rng) => rng,
                Err(poisoned) => poisoned.into_inner(),
            };
            compute_assignment(&participants, &mut *rng)?
        };

        let pairs = match self
            .store
            .persist_pairs_and_activate(event_id, &assignment)
            .await
        {
            Ok(pairs) => pairs,
            Err(PersistError::AlreadyPaired) => {
                info!("Another draw for {event_id:?} committed first");
                return Err(PairingError::AlreadyPaired(event_id));
            }
            Err(PersistError::Other(err)) => {
                error!("Could not persist pairs for {event_id:?}: {err}");
                return Err(PairingError::Persistence(err));
            }
        };

        info!("Created {} pairs for {event_id:?}", pairs.len());

        let event = Event {
            status: EventStatus::InProgress,
            ..event
        };

        let mut notified = 0;
        let mut failed_notifications = 0;
        for pair in &pairs {
            match self.notifier.notify_giver(&event, pair).await {
                Ok(()) => notified += 1,
                Err(err) => {
                    failed_notifications += 1;
                    warn!(
                        "Could not notify giver {:?} of pair {:?}: {err}",
                        pair.giver_id, pair.id
                    );
                }
            }
        }

        Ok(PairingOutcome {
            event,
            pairs,
            notified,
            failed_notifications,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;
    use rand::{rngs::StdRng, SeedableRng};
    use sqlx::{Pool, Sqlite};

    use crate::{
        models::{Event, EventId, EventStatus, Pair, ParticipantId},
        repository::{
            test_util::{memory_pool, new_event, new_participant},
            EventRepository, PairRepository, ParticipantRepository,
        },
    };

    use super::{PairNotifier, PairingError, PairingService};

    #[derive(Default)]
    struct RecordingNotifier {
        notified: Mutex<Vec<ParticipantId>>,
        unreachable: HashSet<ParticipantId>,
    }

    #[async_trait]
    impl PairNotifier for RecordingNotifier {
        async fn notify_giver(&self, _event: &Event, pair: &Pair) -> Result<(), anyhow::Error> {
            if self.unreachable.contains(&pair.giver_id) {
                anyhow::bail!("DMs are closed");
            }
            self.notified.lock().unwrap().push(pair.giver_id);
            Ok(())
        }
    }

    struct Fixture {
        pool: Pool<Sqlite>,
        events: EventRepository,
        pairs: Arc<PairRepository>,
        event: Event,
        participants: Vec<ParticipantId>,
    }

    async fn fixture(participant_count: u64) -> Fixture {
        let pool = memory_pool().await;
        let events = EventRepository::new(pool.clone());
        let participant_repository = ParticipantRepository::new(pool.clone());
        let event = events.create_event(new_event("Office")).await.unwrap();

        let mut participants = vec![];
        for user in 1..=participant_count {
            let participant = participant_repository
                .register(&new_participant(event.id, 100 + user))
                .await
                .unwrap()
                .unwrap();
            participants.push(participant.id);
        }

        Fixture {
            pairs: Arc::new(PairRepository::new(pool.clone())),
            pool,
            events,
            event,
            participants,
        }
    }

    fn service(pairs: Arc<PairRepository>, notifier: Arc<RecordingNotifier>) -> PairingService {
        PairingService::with_rng(pairs, notifier, StdRng::seed_from_u64(42))
    }

    async fn status(fixture: &Fixture) -> EventStatus {
        fixture
            .events
            .get_event(fixture.event.id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[test_log::test(tokio::test)]
    async fn five_participants_are_paired() {
        let fixture = fixture(5).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let service = service(fixture.pairs.clone(), notifier.clone());

        let outcome = service.run_pairing(fixture.event.id).await.unwrap();

        assert_eq!(outcome.pairs.len(), 5);
        let expected = fixture.participants.iter().copied().collect::<HashSet<_>>();
        let givers = outcome.pairs.iter().map(|p| p.giver_id).collect::<HashSet<_>>();
        let receivers = outcome.pairs.iter().map(|p| p.receiver_id).collect::<HashSet<_>>();
        assert_eq!(givers, expected);
        assert_eq!(receivers, expected);
        assert!(outcome.pairs.iter().all(|p| p.giver_id != p.receiver_id));

        assert_eq!(status(&fixture).await, EventStatus::InProgress);
        assert_eq!(outcome.notified, 5);
        assert_eq!(notifier.notified.lock().unwrap().len(), 5);
    }

    #[test_log::test(tokio::test)]
    async fn second_draw_is_rejected_and_changes_nothing() {
        let fixture = fixture(4).await;
        let service = service(fixture.pairs.clone(), Arc::new(RecordingNotifier::default()));

        service.run_pairing(fixture.event.id).await.unwrap();
        let before = fixture.pairs.get_pairs(fixture.event.id).await.unwrap();

        let second = service.run_pairing(fixture.event.id).await;

        assert!(matches!(second, Err(PairingError::AlreadyPaired(id)) if id == fixture.event.id));
        let after = fixture.pairs.get_pairs(fixture.event.id).await.unwrap();
        assert_eq!(before, after);
    }

    #[test_log::test(tokio::test)]
    async fn too_few_participants_persist_nothing() {
        for count in 0..=2 {
            let fixture = fixture(count).await;
            let service =
                service(fixture.pairs.clone(), Arc::new(RecordingNotifier::default()));

            let result = service.run_pairing(fixture.event.id).await;

            assert!(
                matches!(result, Err(PairingError::InsufficientParticipants { count: c }) if c == count as usize)
            );
            assert_eq!(status(&fixture).await, EventStatus::Registration);
            assert!(fixture
                .pairs
                .get_pairs(fixture.event.id)
                .await
                .unwrap()
                .is_empty());
        }
    }

    #[test_log::test(tokio::test)]
    async fn unknown_event() {
        let fixture = fixture(3).await;
        let service = service(fixture.pairs.clone(), Arc::new(RecordingNotifier::default()));

        assert!(matches!(
            service.run_pairing(EventId(404)).await,
            Err(PairingError::EventNotFound(EventId(404)))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn failed_commit_leaves_no_trace() {
        let fixture = fixture(5).await;
        let service = service(fixture.pairs.clone(), Arc::new(RecordingNotifier::default()));

        sqlx::query(
            r#"
            CREATE TRIGGER fail_third_pair BEFORE INSERT ON pairs
            WHEN (SELECT COUNT(*) FROM pairs WHERE event_id = NEW.event_id) >= 2
            BEGIN
                SELECT RAISE(ABORT, 'injected fault');
            END
            "#,
        )
        .execute(&fixture.pool)
        .await
        .unwrap();

        let result = service.run_pairing(fixture.event.id).await;

        assert!(matches!(result, Err(PairingError::Persistence(_))));
        assert_eq!(status(&fixture).await, EventStatus::Registration);
        assert_eq!(
            fixture
                .pairs
                .count_pairs(fixture.event.id)
                .await
                .unwrap(),
            0
        );

        sqlx::query("DROP TRIGGER fail_third_pair")
            .execute(&fixture.pool)
            .await
            .unwrap();

        let retried = service.run_pairing(fixture.event.id).await.unwrap();
        assert_eq!(retried.pairs.len(), 5);
    }

    #[test_log::test(tokio::test)]
    async fn concurrent_draws_have_one_winner() {
        let fixture = fixture(4).await;
        let service = service(fixture.pairs.clone(), Arc::new(RecordingNotifier::default()));

        let (first, second) = tokio::join!(
            service.run_pairing(fixture.event.id),
            service.run_pairing(fixture.event.id)
        );

        let results = [first, second];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let rejections = results
            .iter()
            .filter(|r| matches!(r, Err(PairingError::AlreadyPaired(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(rejections, 1);
        assert_eq!(
            fixture
                .pairs
                .count_pairs(fixture.event.id)
                .await
                .unwrap(),
            4
        );
    }

    #[test_log::test(tokio::test)]
    async fn unreachable_santas_do_not_fail_the_draw() {
        let fixture = fixture(3).await;
        let notifier = Arc::new(RecordingNotifier {
            unreachable: [fixture.participants[0]].into_iter().collect(),
            ..Default::default()
        });
        let service = service(fixture.pairs.clone(), notifier);

        let outcome = service.run_pairing(fixture.event.id).await.unwrap();

        assert_eq!(outcome.pairs.len(), 3);
        assert_eq!(outcome.notified, 2);
        assert_eq!(outcome.failed_notifications, 1);
        assert_eq!(status(&fixture).await, EventStatus::InProgress);
    }
}
