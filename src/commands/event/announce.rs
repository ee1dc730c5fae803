use poise::CreateReply;
use tracing::warn;

use crate::commands::{
    arguments::{EventSlug, TrimmedString},
    find_event, internal_err, user_err, CommandResult, Context,
};

/// Post an announcement in the event channel and DM it to every participant.
#[poise::command(slash_command, rename = "announce")]
pub async fn announce(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
    #[description = "The announcement text"] text: TrimmedString,
) -> CommandResult {
    if text.is_empty() {
        return Err(user_err("The announcement can't be empty."));
    }

    let event = find_event(ctx, slug.as_ref()).await?;
    let message = format!("# {}\n{text}", event.title);

    ctx.defer_ephemeral().await?;

    ctx.data()
        .messenger
        .send_to_channel(event.channel, message.clone())
        .await
        .map_err(|err| internal_err(format!("Could not post the announcement: {err}")))?;

    let participants = ctx
        .data()
        .participant_repository
        .list_participants(event.id)
        .await
        .map_err(|err| internal_err(format!("Could not get the participants: {err}")))?;

    let mut failed = 0;
    for participant in &participants {
        if let Err(err) = ctx
            .data()
            .messenger
            .send_direct(participant.discord_user, message.clone())
            .await
        {
            failed += 1;
            warn!("Could not DM the announcement to {}: {err}", participant.discord_user);
        }
    }

    let content = if failed == 0 {
        format!("Announced and sent to all {} participants.", participants.len())
    } else {
        format!(
            "Announced. {} of {} participants could not be reached by DM.",
            failed,
            participants.len()
        )
    };

    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;

    Ok(())
}
