use poise::CreateReply;

use crate::commands::{
    arguments::EventSlug, find_event, internal_err, CommandResult, Context,
};

/// List the participants of an event.
#[poise::command(slash_command, rename = "participants")]
pub async fn participants(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;

    let participants = ctx
        .data()
        .participant_repository
        .list_participants(event.id)
        .await
        .map_err(|err| internal_err(format!("Could not get the participants: {err}")))?;

    let content = if participants.is_empty() {
        format!("# Nobody has registered for {} yet", event.title)
    } else {
        let list = participants.iter().fold(String::new(), |acc, participant| {
            let missing_address = if participant.address.is_none() {
                " (no address)"
            } else {
                ""
            };

            acc + &format!(
                " - {} (@{}){missing_address}\n",
                participant.display_name, participant.username
            )
        });

        format!(
            "# {} participants of {}:\n{list}",
            participants.len(),
            event.title
        )
    };

    ctx.send(CreateReply::default().content(content).ephemeral(true))
        .await?;

    Ok(())
}
