use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, Http, UserId};

/// Outgoing Discord messages.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_direct(&self, user: UserId, content: String) -> Result<(), anyhow::Error>;

    async fn send_to_channel(&self, channel: ChannelId, content: String)
        -> Result<(), anyhow::Error>;
}

pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> DiscordMessenger {
        DiscordMessenger { http }
    }

    /// Opens (or reuses) the DM channel with a user.
    pub async fn direct_channel(&self, user: UserId) -> Result<ChannelId, anyhow::Error> {
        let channel = user.create_dm_channel(&self.http).await?;
        Ok(channel.id)
    }
}

#[async_trait]
impl Messenger for DiscordMessenger {
    async fn send_direct(&self, user: UserId, content: String) -> Result<(), anyhow::Error> {
        let channel = self.direct_channel(user).await?;
        channel.say(&self.http, content).await?;
        Ok(())
    }

    async fn send_to_channel(
        &self,
        channel: ChannelId,
        content: String,
    ) -> Result<(), anyhow::Error> {
        channel.say(&self.http, content).await?;
        Ok(())
    }
}
