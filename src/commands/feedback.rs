use poise::CreateReply;
use tracing::warn;

use crate::{
    commands::{
        arguments::{EventSlug, TrimmedString},
        find_event, get_participant, internal_err, receiver_pair, require_participant,
        user_err, CommandResult, Context,
    },
    models::Rating,
};

/// Thank your santa and tell them how you liked the gift.
#[poise::command(slash_command, ephemeral)]
pub async fn feedback(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
    #[description = "Your message to your santa"] message: TrimmedString,
    #[description = "How much you liked the gift"]
    #[min = 1]
    #[max = 5]
    rating: Option<u8>,
) -> CommandResult {
    if message.is_empty() {
        return Err(user_err("The feedback can't be empty."));
    }

    let rating = rating
        .map(|r| Rating::new(r as i64))
        .transpose()
        .map_err(|err| user_err(err.to_string()))?;

    let event = find_event(ctx, slug.as_ref()).await?;
    let participant = require_participant(ctx, &event).await?;
    let pair = receiver_pair(ctx, &event, &participant).await?;

    let feedback = ctx
        .data()
        .feedback_repository
        .add_feedback(pair.id, message.as_ref(), rating)
        .await
        .map_err(|err| internal_err(format!("Could not save the feedback: {err}")))?
        .ok_or_else(|| {
            user_err(format!(
                "You have already left feedback for your santa in **{}**.",
                event.title
            ))
        })?;

    let santa = get_participant(ctx, pair.giver_id).await?;

    let stars = feedback
        .rating
        .map(|rating| format!("\n{rating}"))
        .unwrap_or_default();
    let notice = format!(
        "# {} left feedback on your gift in {}{stars}\n>>> {}",
        participant.display_name, event.title, feedback.message
    );

    if let Err(err) = ctx
        .data()
        .messenger
        .send_direct(santa.discord_user, notice)
        .await
    {
        warn!("Could not DM feedback on pair {:?}: {err}", pair.id);
    }

    ctx.send(
        CreateReply::default()
            .content("Thank you! Your santa has received your feedback.")
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
