use super::{event::EventId, participant::ParticipantId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PairId(pub u64);

/// A persisted giver → receiver edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pair {
    pub id: PairId,
    pub event_id: EventId,
    pub giver_id: ParticipantId,
    pub receiver_id: ParticipantId,
}

impl Pair {
    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.giver_id == participant || self.receiver_id == participant
    }
}
