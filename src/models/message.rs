use super::{pair::PairId, types::UtcDateTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnonymousMessage {
    pub id: MessageId,
    pub pair_id: PairId,
    /// `true` when the giver wrote to the receiver.
    pub from_santa: bool,
    pub text: String,
    pub created_at: UtcDateTime,
}
