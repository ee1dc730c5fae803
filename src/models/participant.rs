use poise::serenity_prelude::UserId;

use super::{event::EventId, types::UtcDateTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub event_id: EventId,
    pub discord_user: UserId,
    pub display_name: String,
    pub username: String,
    pub wishes: Option<String>,
    pub address: Option<String>,
    pub delivery_methods: Option<String>,
    pub registered_at: UtcDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewParticipant {
    pub event_id: EventId,
    pub discord_user: UserId,
    pub display_name: String,
    pub username: String,
    pub wishes: Option<String>,
    pub address: Option<String>,
    pub delivery_methods: Option<String>,
}

/// Profile fields a participant can edit until the event is paired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ProfileField {
    #[name = "Wishes"]
    Wishes,
    #[name = "Address"]
    Address,
    #[name = "Delivery methods"]
    DeliveryMethods,
}

impl ProfileField {
    pub fn column(&self) -> &'static str {
        match self {
            ProfileField::Wishes => "wishes",
            ProfileField::Address => "address",
            ProfileField::DeliveryMethods => "delivery_methods",
        }
    }
}
