use poise::CreateReply;

use crate::{
    commands::{internal_err, CommandResult, Context},
    utils::formatting::format_utc,
};

/// List the events of this server.
#[poise::command(slash_command, rename = "list")]
pub async fn list(ctx: Context<'_>) -> CommandResult {
    let guild = ctx.guild_id().ok_or(internal_err(
        "This command should be executed only in a guild",
    ))?;

    let events = ctx
        .data()
        .event_repository
        .get_guild_events(guild)
        .await
        .map_err(|err| internal_err(format!("Could not get the events: {err}")))?;

    if events.is_empty() {
        ctx.send(
            CreateReply::default()
                .content("# There are no events yet")
                .ephemeral(true),
        )
        .await?;

        return Ok(());
    }

    let mut list = String::new();
    for event in &events {
        let participants = ctx
            .data()
            .participant_repository
            .count_participants(event.id)
            .await
            .map_err(|err| internal_err(format!("Could not count participants: {err}")))?;

        list += &format!(
            " - **{}** (slug: `{}`) - {}, {} participants, registration until {} UTC\n",
            event.title,
            event.slug,
            event.status.describe(),
            participants,
            format_utc(event.registration_end),
        );
    }

    ctx.send(
        CreateReply::default()
            .content(format!("# Events:\n{list}"))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
