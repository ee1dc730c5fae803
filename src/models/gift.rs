use super::{pair::PairId, types::UtcDateTime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GiftConfirmationId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GiftConfirmation {
    pub id: GiftConfirmationId,
    pub pair_id: PairId,
    pub tracking_number: Option<String>,
    pub message: Option<String>,
    pub sent_at: UtcDateTime,
}

#[derive(Debug)]
pub struct NewGiftConfirmation {
    pub pair_id: PairId,
    pub tracking_number: Option<String>,
    pub message: Option<String>,
}
