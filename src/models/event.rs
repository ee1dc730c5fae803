use poise::serenity_prelude::{ChannelId, GuildId, UserId};

use super::types::UtcDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub guild: GuildId,
    /// Announcements about the event are posted here.
    pub channel: ChannelId,
    pub organizer: UserId,
    pub slug: String,
    pub title: String,
    pub budget: Option<u32>,
    pub status: EventStatus,
    pub registration_end: UtcDateTime,
    pub shipping_deadline: UtcDateTime,
    pub created_at: UtcDateTime,
}

#[derive(Debug)]
pub struct NewEvent {
    pub guild: GuildId,
    pub channel: ChannelId,
    pub organizer: UserId,
    pub slug: String,
    pub title: String,
    pub budget: Option<u32>,
    pub registration_end: UtcDateTime,
    pub shipping_deadline: UtcDateTime,
}

/// Pairing is the only transition from `Registration` to `InProgress`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventStatus {
    Registration,
    InProgress,
    Completed,
}

impl EventStatus {
    pub fn describe(&self) -> &'static str {
        match self {
            EventStatus::Registration => "registration open",
            EventStatus::InProgress => "gifts on the way",
            EventStatus::Completed => "completed",
        }
    }
}

impl Event {
    pub fn is_accepting_registrations(&self, now: UtcDateTime) -> bool {
        self.status == EventStatus::Registration && now < self.registration_end
    }
}
