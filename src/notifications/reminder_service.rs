use std::{collections::HashSet, sync::Arc};

use indoc::formatdoc;
use time::Duration;
use tokio::{select, sync::broadcast::error::RecvError, sync::Notify, task::JoinHandle};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    messenger::Messenger,
    models::{types::UtcDateTime, Event, EventStatus, ReminderKind},
    repository::{EventRepository, EventStorageEvent, PairRepository, ParticipantRepository},
    utils::{timestamp, TimestampStyle},
};

use super::recipient_card;

pub const DEFAULT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(30 * 60);

const REGISTRATION_DAY_WINDOW: Duration = Duration::hours(24);
const REGISTRATION_HOUR_WINDOW: Duration = Duration::hours(1);
const SHIPPING_THREE_DAYS_WINDOW: Duration = Duration::days(3);
const SHIPPING_DAY_WINDOW: Duration = Duration::days(1);

/// Reminders that should go out for `event` at `now`, minus the ones already sent.
///
/// Each window only covers the time until the next, tighter one opens, so a
/// reminder that was missed entirely is skipped instead of sent late.
pub fn due_reminders(
    event: &Event,
    now: UtcDateTime,
    sent: &HashSet<ReminderKind>,
) -> Vec<ReminderKind> {
    let mut due = vec![];

    match event.status {
        EventStatus::Registration => {
            let left = event.registration_end - now;

            if left <= Duration::ZERO {
                due.push(ReminderKind::RegistrationClosed);
            } else if left <= REGISTRATION_HOUR_WINDOW {
                due.push(ReminderKind::RegistrationClosesInHour);
            } else if left <= REGISTRATION_DAY_WINDOW {
                due.push(ReminderKind::RegistrationClosesInDay);
            }
        }
        EventStatus::InProgress => {
            let left = event.shipping_deadline - now;

            if left <= Duration::ZERO {
                due.push(ReminderKind::EventCompleted);
            } else if left <= SHIPPING_DAY_WINDOW {
                due.push(ReminderKind::ShippingDeadlineInDay);
            } else if left <= SHIPPING_THREE_DAYS_WINDOW {
                due.push(ReminderKind::ShippingDeadlineInThreeDays);
            }
        }
        EventStatus::Completed => {}
    }

    due.retain(|kind| !sent.contains(kind));
    due
}

pub struct ReminderService {
    messenger: Arc<dyn Messenger>,
    event_repository: Arc<EventRepository>,
    participant_repository: Arc<ParticipantRepository>,
    pair_repository: Arc<PairRepository>,
    interval: std::time::Duration,
}

pub struct ReminderServiceHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ReminderServiceHandle {
    pub async fn stop(self) {
        self.shutdown.notify_one();

        if let Err(err) = self.task.await {
            error!("Reminder service task failed: {err}");
        }
    }
}

impl ReminderService {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        event_repository: Arc<EventRepository>,
        participant_repository: Arc<ParticipantRepository>,
        pair_repository: Arc<PairRepository>,
        interval: std::time::Duration,
    ) -> ReminderService {
        ReminderService {
            messenger,
            event_repository,
            participant_repository,
            pair_repository,
            interval,
        }
    }

    pub fn start(self) -> ReminderServiceHandle {
        let shutdown = Arc::new(Notify::new());
        let stop_signal = shutdown.clone();

        let task = tokio::spawn(
            async move {
                let mut event_updates = self.event_repository.subscribe();

                info!("Checking reminders every {:?}", self.interval);

                loop {
                    if let Err(err) = self.run_once(UtcDateTime::now()).await {
                        error!("Could not send reminders: {err}");
                    }

                    select! {
                        _ = tokio::time::sleep(self.interval) => {}

                        _ = stop_signal.notified() => {
                            info!("Reminder service is shutting down");
                            break;
                        }

                        update = event_updates.recv() => {
                            match update {
                                Ok(EventStorageEvent::EventsUpdated) => {
                                    debug!("Events updated, checking reminders early");
                                }
                                Err(RecvError::Lagged(skipped)) => {
                                    warn!("Missed {skipped} event updates");
                                }
                                Err(RecvError::Closed) => {
                                    error!("Event updates channel closed");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            .instrument(info_span!("reminder_loop")),
        );

        ReminderServiceHandle { shutdown, task }
    }

    /// Sends everything that is due at `now`. Reminders are claimed in the
    /// database before they are sent, so a failed send is not retried.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self, now: UtcDateTime) -> Result<(), anyhow::Error> {
        let events = self.event_repository.get_unfinished_events().await?;

        for event in events {
            let sent = self.event_repository.get_sent_reminders(event.id).await?;

            for kind in due_reminders(&event, now, &sent) {
                if kind == ReminderKind::EventCompleted
                    && !self.event_repository.complete_event(event.id).await?
                {
                    continue;
                }

                if !self
                    .event_repository
                    .mark_reminder_sent(event.id, kind)
                    .await?
                {
                    debug!("{kind:?} for {:?} was already sent", event.id);
                    continue;
                }

                info!("Sending {kind:?} for event {}", event.slug);

                if let Err(err) = self.send(&event, kind).await {
                    warn!("Could not send {kind:?} for event {}: {err}", event.slug);
                }
            }
        }

        Ok(())
    }

    async fn send(&self, event: &Event, kind: ReminderKind) -> Result<(), anyhow::Error> {
        match kind {
            ReminderKind::RegistrationClosesInDay | ReminderKind::RegistrationClosesInHour => {
                let message = formatdoc! {
                    r#"
                        Registration for **{title}** closes {closes}.

                        Check your details with `/profile {slug}` and fix anything with `/profile_edit {slug}` while you still can.
                    "#,
                    title = event.title,
                    closes = timestamp(event.registration_end, TimestampStyle::RelativeTime),
                    slug = event.slug,
                };

                self.dm_participants(event, &message).await
            }
            ReminderKind::RegistrationClosed => {
                let count = self
                    .participant_repository
                    .count_participants(event.id)
                    .await?;

                let message = formatdoc! {
                    r#"
                        # Registration for {title} is closed!

                        {count} members have signed up. <@{organizer}>, hold the draw with `/event pair {slug}`.
                    "#,
                    title = event.title,
                    count = count,
                    organizer = event.organizer,
                    slug = event.slug,
                };

                self.messenger.send_to_channel(event.channel, message).await
            }
            ReminderKind::ShippingDeadlineInThreeDays | ReminderKind::ShippingDeadlineInDay => {
                self.remind_givers(event).await
            }
            ReminderKind::EventCompleted => {
                let message = formatdoc! {
                    r#"
                        # {title} is over!

                        Thank you all for taking part. If your gift has arrived, tell your santa what you think with `/feedback {slug}`.
                    "#,
                    title = event.title,
                    slug = event.slug,
                };

                self.messenger.send_to_channel(event.channel, message).await
            }
        }
    }

    async fn dm_participants(&self, event: &Event, message: &str) -> Result<(), anyhow::Error> {
        let participants = self
            .participant_repository
            .list_participants(event.id)
            .await?;

        let mut failed = 0;
        for participant in &participants {
            if let Err(err) = self
                .messenger
                .send_direct(participant.discord_user, message.to_string())
                .await
            {
                failed += 1;
                warn!("Could not DM {}: {err}", participant.discord_user);
            }
        }

        info!(
            "Reminded {} of {} participants",
            participants.len() - failed,
            participants.len()
        );

        Ok(())
    }

    /// Every santa gets their own receiver's details again.
    async fn remind_givers(&self, event: &Event) -> Result<(), anyhow::Error> {
        let pairs = self.pair_repository.get_pairs(event.id).await?;

        for pair in pairs {
            let giver = self
                .participant_repository
                .get_participant(pair.giver_id)
                .await?;
            let receiver = self
                .participant_repository
                .get_participant(pair.receiver_id)
                .await?;

            let (Some(giver), Some(receiver)) = (giver, receiver) else {
                warn!("Pair {:?} refers to a missing participant", pair.id);
                continue;
            };

            let message = format!(
                "# Don't forget to send your gift!\n{}",
                recipient_card(event, &receiver)
            );

            if let Err(err) = self.messenger.send_direct(giver.discord_user, message).await {
                warn!("Could not remind santa {}: {err}", giver.discord_user);
            }
        }

        Ok(())
    }
}
