use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::{
    messenger::Messenger,
    models::{Event, Pair},
    pairing::PairNotifier,
    repository::ParticipantRepository,
};

use super::recipient_card;

/// DMs every santa their receiver's details right after the draw.
pub struct DiscordPairNotifier {
    messenger: Arc<dyn Messenger>,
    participant_repository: Arc<ParticipantRepository>,
}

impl DiscordPairNotifier {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        participant_repository: Arc<ParticipantRepository>,
    ) -> DiscordPairNotifier {
        DiscordPairNotifier {
            messenger,
            participant_repository,
        }
    }
}

#[async_trait]
impl PairNotifier for DiscordPairNotifier {
    async fn notify_giver(&self, event: &Event, pair: &Pair) -> Result<(), anyhow::Error> {
        let giver = self
            .participant_repository
            .get_participant(pair.giver_id)
            .await?
            .ok_or_else(|| anyhow!("Giver {:?} does not exist", pair.giver_id))?;
        let receiver = self
            .participant_repository
            .get_participant(pair.receiver_id)
            .await?
            .ok_or_else(|| anyhow!("Receiver {:?} does not exist", pair.receiver_id))?;

        let message = format!(
            "# The Secret Santa draw is done!\n{}",
            recipient_card(event, &receiver)
        );

        self.messenger
            .send_direct(giver.discord_user, message)
            .await
    }
}
