use indoc::formatdoc;
use poise::{ChoiceParameter, CreateReply};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    commands::{
        arguments::{EventSlug, TrimmedString},
        find_event, find_participant, internal_err, require_participant, user_err,
        CommandResult, Context,
    },
    conversation::{wishes_question, RegistrationState},
    models::{types::UtcDateTime, EventStatus, NewParticipant, ProfileField},
    utils::formatting::{format_local, format_utc},
};

/// Sign up for a Secret Santa event. The bot asks a few questions in the DMs.
#[poise::command(slash_command, guild_only, ephemeral)]
pub async fn register(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;

    let now = UtcDateTime::from(OffsetDateTime::now_utc());
    if !event.is_accepting_registrations(now) {
        return Err(user_err(format!(
            "Registration for **{}** is closed.",
            event.title
        )));
    }

    if find_participant(ctx, &event, ctx.author().id).await?.is_some() {
        return Err(user_err(format!(
            "You are already registered for **{}**. Use `/profile {}` to see your details.",
            event.title, event.slug
        )));
    }

    let display_name = match ctx.author_member().await {
        Some(member) => member.display_name().to_string(),
        None => ctx.author().name.clone(),
    };

    let dm = ctx.author().create_dm_channel(ctx).await?;

    ctx.data().conversations.begin(
        ctx.author().id,
        dm.id,
        RegistrationState::AwaitingWishes(NewParticipant {
            event_id: event.id,
            discord_user: ctx.author().id,
            display_name,
            username: ctx.author().name.clone(),
            wishes: None,
            address: None,
            delivery_methods: None,
        }),
    );

    if let Err(err) = dm.say(ctx, wishes_question(&event.title)).await {
        info!("Could not start registration in DMs of {}: {err}", ctx.author().id);
        return Err(user_err(
            "I can't send you DMs. Please allow direct messages from server members and try again.",
        ));
    }

    ctx.say("Check your DMs to finish the registration.").await?;

    Ok(())
}

/// Show your registration for an event.
#[poise::command(slash_command, ephemeral)]
pub async fn profile(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;
    let participant = require_participant(ctx, &event).await?;

    let rating = ctx
        .data()
        .feedback_repository
        .average_rating(participant.discord_user)
        .await
        .map_err(|err| internal_err(format!("Could not get the rating: {err}")))?
        .map(|average| format!("\n**Santa rating:** {average:.1} / 5"))
        .unwrap_or_default();

    let editable = if event.status == EventStatus::Registration {
        format!(
            "You can change these with `/profile_edit {}` until the draw.",
            event.slug
        )
    } else {
        "The draw has happened, so these can no longer be changed.".to_string()
    };

    let message = formatdoc! {
        r#"
            # Your registration for {title}

            **Name:** {name} (@{username})
            **Wishes:** {wishes}
            **Address:** {address}
            **Delivery methods:** {delivery}
            **Registered:** {registered_local}{rating}

            {editable}
        "#,
        title = event.title,
        name = participant.display_name,
        username = participant.username,
        wishes = participant.wishes.as_deref().unwrap_or("not specified"),
        address = participant.address.as_deref().unwrap_or("not specified"),
        delivery = participant.delivery_methods.as_deref().unwrap_or("not specified"),
        registered_local = format_local(participant.registered_at),
        rating = rating,
        editable = editable,
    };

    ctx.send(CreateReply::default().content(message).ephemeral(true))
        .await?;

    Ok(())
}

/// Change your wishes, address or delivery methods before the draw.
#[poise::command(slash_command, ephemeral)]
pub async fn profile_edit(
    ctx: Context<'_>,
    #[description = "Event slug"] slug: EventSlug,
    #[description = "What to change"] field: ProfileField,
    #[description = "The new value, or `-` to clear it"] value: TrimmedString,
) -> CommandResult {
    let event = find_event(ctx, slug.as_ref()).await?;
    let participant = require_participant(ctx, &event).await?;

    let updated = ctx
        .data()
        .participant_repository
        .update_profile(
            event.id,
            participant.discord_user,
            field,
            value.into_optional().as_deref(),
        )
        .await
        .map_err(|err| internal_err(format!("Could not update the profile: {err}")))?;

    if !updated {
        return Err(user_err(format!(
            "The draw for **{}** has happened, so your details can no longer be changed. Registration closed on {} UTC.",
            event.title,
            format_utc(event.registration_end),
        )));
    }

    ctx.say(format!("Updated your {} for **{}**.", field.name(), event.title))
        .await?;

    Ok(())
}
