use poise::CreateReply;

use crate::commands::{
    arguments::EventSlug, internal_err, user_err, CommandResult, Context,
};

/// Delete an event together with its registrations, pairs and messages.
#[poise::command(slash_command, rename = "delete")]
pub async fn delete(ctx: Context<'_>, #[description = "Event slug"] slug: EventSlug) -> CommandResult {
    let deletion_result = ctx
        .data()
        .event_repository
        .delete_event(
            ctx.guild_id().ok_or(internal_err(
                "This command should be executed only in a guild",
            ))?,
            slug.as_ref(),
        )
        .await;

    match deletion_result {
        Ok(true) => {
            ctx.send(
                CreateReply::default()
                    .content(format!("# Event `{slug}` deleted"))
                    .ephemeral(true),
            )
            .await?;
        }

        Ok(false) => {
            return Err(user_err(format!("Event with slug `{slug}` does not exist")));
        }

        Err(err) => {
            return Err(internal_err(format!("Could not delete the event: {err}")));
        }
    }

    Ok(())
}
