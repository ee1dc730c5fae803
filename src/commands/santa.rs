use poise::CreateReply;

use crate::{
    commands::{
        arguments::EventSlug, find_event, get_participant, giver_pair, require_participant,
        CommandResult, Context,
    },
    notifications::recipient_card,
};

/// Show who you are giving a gift to.
#[poise::command(slash_command, ephemeral)]
pub async fn recipient(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;
    let participant = require_participant(ctx, &event).await?;
    let pair = giver_pair(ctx, &event, &participant).await?;
    let receiver = get_participant(ctx, pair.receiver_id).await?;

    ctx.send(
        CreateReply::default()
            .content(recipient_card(&event, &receiver))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
